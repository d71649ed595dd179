//! Data models
//!
//! This module contains all data structures used throughout HAY Property.
//! Models represent:
//! - Database entities (User, Admin, Property, Blog, Purchase, Inquiry, ...)
//! - API request/response types
//! - Pagination containers

mod admin;
mod blog;
mod inquiry;
mod newsletter;
mod pagination;
mod password_reset;
mod property;
mod purchase;
mod user;

pub use admin::{Admin, AdminRole};
pub use blog::{
    Blog, BlogCategory, BlogCategoryInput, BlogCategorySummary, BlogCategoryWithCount, BlogFilter,
    BlogStatus, BlogWithMeta, CreateBlogInput, UpdateBlogInput,
};
pub use inquiry::{CreateInquiryInput, Inquiry, InquiryStatus};
pub use newsletter::NewsletterSubscriber;
pub use pagination::{total_pages, ListParams, PagedResult, MAX_PER_PAGE};
pub use password_reset::{PasswordResetToken, RESET_TOKEN_TTL_MINUTES};
pub use property::{
    CreatePropertyInput, Property, PropertyFilter, PropertySort, PropertyStatus, PropertyType,
    UpdatePropertyInput,
};
pub use purchase::{
    payment_progress, CreatePurchaseInput, Phase, PhaseFlags, PhaseView, PropertySummary, Purchase,
    PurchaseFilter, PurchaseStatus, PurchaseView, UpdatePurchaseInput,
};
pub use user::{UpdateUserInput, User, UserStatus};
