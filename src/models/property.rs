//! Property model
//!
//! This module provides:
//! - `Property` entity representing a listing
//! - `PropertyType` and `PropertyStatus` enums
//! - Input and filter types for creating, updating and searching listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Property entity (a listing shown to visitors when published)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    /// URL-friendly slug (unique)
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Street address or estate name
    pub location: String,
    pub city: String,
    /// Asking price in whole currency units
    pub price: i64,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub size_sqm: Option<f64>,
    /// Amenity bullet points
    #[serde(default)]
    pub features: Vec<String>,
    /// Image URLs, first one is the cover
    #[serde(default)]
    pub images: Vec<String>,
    pub is_featured: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// Cover image (first image)
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Kind of property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Land,
    Apartment,
    Bungalow,
    Duplex,
    Terrace,
    Commercial,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyType::Land => "land",
            PropertyType::Apartment => "apartment",
            PropertyType::Bungalow => "bungalow",
            PropertyType::Duplex => "duplex",
            PropertyType::Terrace => "terrace",
            PropertyType::Commercial => "commercial",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PropertyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "land" => Ok(PropertyType::Land),
            "apartment" => Ok(PropertyType::Apartment),
            "bungalow" => Ok(PropertyType::Bungalow),
            "duplex" => Ok(PropertyType::Duplex),
            "terrace" => Ok(PropertyType::Terrace),
            "commercial" => Ok(PropertyType::Commercial),
            _ => Err(anyhow::anyhow!("Invalid property type: {}", s)),
        }
    }
}

/// Sale status of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    /// Open for purchase
    #[default]
    Available,
    /// An active purchase exists
    Reserved,
    /// A purchase was completed
    Sold,
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyStatus::Available => write!(f, "available"),
            PropertyStatus::Reserved => write!(f, "reserved"),
            PropertyStatus::Sold => write!(f, "sold"),
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(PropertyStatus::Available),
            "reserved" => Ok(PropertyStatus::Reserved),
            "sold" => Ok(PropertyStatus::Sold),
            _ => Err(anyhow::anyhow!("Invalid property status: {}", s)),
        }
    }
}

/// Input for creating a property
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePropertyInput {
    pub title: String,
    /// Explicit slug; generated from the title when absent
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub city: String,
    pub price: i64,
    pub property_type: PropertyType,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub bedrooms: Option<i32>,
    #[serde(default)]
    pub bathrooms: Option<i32>,
    #[serde(default)]
    pub size_sqm: Option<f64>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

fn default_true() -> bool {
    true
}

/// Input for updating a property; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePropertyInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub price: Option<i64>,
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub size_sqm: Option<f64>,
    pub features: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
}

/// Listing sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertySort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

impl PropertySort {
    /// SQL ORDER BY clause
    pub fn order_by(&self) -> &'static str {
        match self {
            PropertySort::Newest => "created_at DESC, id DESC",
            PropertySort::PriceAsc => "price ASC, id DESC",
            PropertySort::PriceDesc => "price DESC, id DESC",
        }
    }
}

/// Search filters for listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyFilter {
    /// Substring match on title, location or city
    pub q: Option<String>,
    pub property_type: Option<PropertyType>,
    pub status: Option<PropertyStatus>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Minimum number of bedrooms
    pub bedrooms: Option<i32>,
    pub featured: Option<bool>,
    /// Restrict to published listings
    #[serde(skip)]
    pub published_only: bool,
    #[serde(default)]
    pub sort: PropertySort,
}
