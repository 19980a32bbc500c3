//! URL slugs for blog posts
//!
//! Slugs are lowercase ASCII kebab-case. Uniqueness is not checked here; the
//! blog service resolves collisions.

/// Derive a slug from a title.
///
/// The title is lowercased, every character other than `a-z`, `0-9`,
/// whitespace and `-` is dropped, and each remaining run of whitespace and
/// hyphens becomes a single `-`. Leading and trailing hyphens are trimmed.
///
/// A title with no ASCII letters or digits yields an empty string.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else if c == '-' || c.is_whitespace() {
            pending_hyphen = true;
        }
    }

    slug
}

/// Whether `slug` is non-empty lowercase kebab-case with no stray hyphens
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// `base` with a numeric suffix, used when `base` is already taken
pub fn with_suffix(base: &str, n: u32) -> String {
    format!("{}-{}", base, n)
}
