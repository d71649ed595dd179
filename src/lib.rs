//! HAY Property - backend for a real-estate website
//!
//! Listings, a buyer portal with purchase progress tracking, a blog, and
//! the back office that manages them.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod storage;
