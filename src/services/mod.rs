//! Services layer - Business logic
//!
//! Services implement the business rules on top of the repositories and
//! coordinate cache invalidation, mail and validation. Every service
//! returns [`ServiceError`] so the API layer can map failures uniformly.

pub mod admin;
pub mod blog;
pub mod email;
pub mod error;
pub mod inquiry;
pub mod markdown;
pub mod newsletter;
pub mod password;
pub mod property;
pub mod purchase;
pub mod rate_limiter;
pub mod slug;
pub mod stats;
pub mod token;
pub mod user;
pub mod validation;
pub mod wishlist;

pub use admin::{AdminService, CreateAdminInput};
pub use blog::BlogService;
pub use email::EmailService;
pub use error::{ServiceError, ServiceResult};
pub use inquiry::InquiryService;
pub use markdown::MarkdownRenderer;
pub use newsletter::NewsletterService;
pub use password::{hash_password, verify_password};
pub use property::PropertyService;
pub use purchase::PurchaseService;
pub use rate_limiter::LoginRateLimiter;
pub use slug::generate_slug;
pub use stats::{DashboardStats, StatsService};
pub use token::{Claims, SessionKind, TokenError, TokenService};
pub use user::{RegisterInput, UpdateProfileInput, UserService};
pub use wishlist::WishlistService;
