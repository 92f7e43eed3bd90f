//! Utility functions shared across the crate.

mod secret;

pub use secret::SecretString;

/// Number of characters kept visible at each end of a masked secret.
const MASK_VISIBLE_CHARS: usize = 4;

/// Mask a secret for display, keeping a short prefix and suffix.
///
/// Values of eight characters or fewer are fully hidden as `****`.
///
/// # Example
/// ```ignore
/// assert_eq!(mask_secret("abcd1234wxyz"), "abcd...wxyz");
/// assert_eq!(mask_secret("short"), "****");
/// ```
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= MASK_VISIBLE_CHARS * 2 {
        return "****".to_string();
    }

    let prefix: String = chars[..MASK_VISIBLE_CHARS].iter().collect();
    let suffix: String = chars[chars.len() - MASK_VISIBLE_CHARS..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Strip every trailing `/` from a URL.
pub fn trim_trailing_separators(url: &str) -> &str {
    url.trim_end_matches('/')
}
