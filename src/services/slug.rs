//! URL slugs
//!
//! Slugs contain only lowercase ASCII letters, digits and single hyphens,
//! never at either end.

use std::future::Future;

/// Highest numeric suffix tried before falling back to a random one
pub const MAX_SLUG_SUFFIX: u32 = 50;

/// Generate a URL-friendly slug from a title
pub fn generate_slug(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen && !result.is_empty() {
            result.push('-');
            prev_hyphen = true;
        }
    }

    result.trim_end_matches('-').to_string()
}

/// Slug for `title`, or `fallback` when the title has no usable characters
pub fn slug_or(title: &str, fallback: &str) -> String {
    let slug = generate_slug(title);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Find a free slug starting from `base`.
///
/// Tries `base`, `base-2` .. `base-50`, then `base-<8 hex>`. `is_taken`
/// reports whether a candidate is already in use.
pub async fn unique_slug<F, Fut>(base: &str, mut is_taken: F) -> anyhow::Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<bool>>,
{
    if !is_taken(base.to_string()).await? {
        return Ok(base.to_string());
    }

    for n in 2..=MAX_SLUG_SUFFIX {
        let candidate = format!("{}-{}", base, n);
        if !is_taken(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    loop {
        let candidate = format!("{}-{}", base, random_suffix());
        if !is_taken(candidate.clone()).await? {
            return Ok(candidate);
        }
    }
}

fn random_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
