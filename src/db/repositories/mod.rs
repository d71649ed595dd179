//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod admin;
pub mod blog;
pub mod blog_category;
pub mod inquiry;
pub mod newsletter;
pub mod password_reset;
pub mod property;
pub mod purchase;
pub mod user;
pub mod wishlist;

pub use admin::{AdminRepository, SqlxAdminRepository};
pub use blog::{BlogRepository, SqlxBlogRepository};
pub use blog_category::{BlogCategoryRepository, SqlxBlogCategoryRepository};
pub use inquiry::{InquiryRepository, SqlxInquiryRepository};
pub use newsletter::{NewsletterRepository, SqlxNewsletterRepository};
pub use password_reset::{PasswordResetRepository, SqlxPasswordResetRepository};
pub use property::{PropertyRepository, SqlxPropertyRepository};
pub use purchase::{PurchaseRepository, SqlxPurchaseRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use wishlist::{SqlxWishlistRepository, WishlistRepository};

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// Positional bind value for queries whose WHERE clause is built at runtime
#[derive(Debug, Clone)]
pub(crate) enum SqlArg {
    Text(String),
    Int(i64),
}

impl SqlArg {
    pub(crate) fn bind_to<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlArg::Text(s) => query.bind(s.as_str()),
            SqlArg::Int(i) => query.bind(*i),
        }
    }
}

/// `LIKE` pattern matching `term` anywhere, for use with `ESCAPE '\'`
///
/// Wildcards typed by the user match themselves.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("lekki"), "%lekki%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\x"), "%c:\\\\x%");
    }
}
