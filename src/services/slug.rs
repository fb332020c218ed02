/// Slug derivation for post URLs.
///
/// A slug is the sanitized title plus a random base-36 suffix, which makes
/// collisions practically impossible. Uniqueness is still owned by the
/// post store's unique index: creation never pre-checks, a collision
/// surfaces as a conflict at write time.
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Length of the random base-36 suffix
pub const SLUG_SUFFIX_LEN: usize = 7;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-]").expect("valid regex"));
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").expect("valid regex"));

/// Sanitize a title into a URI-safe stem: trim, collapse whitespace to a
/// single separator, strip everything outside `[\w-]`.
pub fn sanitize_title(title: &str) -> String {
    let collapsed = WHITESPACE.replace_all(title.trim(), "_");
    let stripped = NON_WORD.replace_all(&collapsed, "");
    UNDERSCORES.replace_all(&stripped, "_").into_owned()
}

/// Derive a fresh slug for a post title.
pub fn generate_slug(title: &str) -> String {
    let stem = sanitize_title(title);
    let stem = if stem.is_empty() { "post" } else { &stem };

    let mut rng = rand::thread_rng();
    let suffix: String = (0..SLUG_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();

    format!("{}-{}", stem, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_whitespace_and_punctuation() {
        assert_eq!(sanitize_title("  Chess   Club Meetup!  "), "Chess_Club_Meetup");
        assert_eq!(sanitize_title("a - b"), "a_-_b");
        assert_eq!(sanitize_title("semi;colon:title"), "semicolontitle");
    }

    #[test]
    fn collapses_runs_of_separators() {
        assert_eq!(sanitize_title("a !! b"), "a_b");
    }

    #[test]
    fn slug_carries_fixed_length_suffix() {
        let slug = generate_slug("Hello World");
        let (stem, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(stem, "Hello_World");
        assert_eq!(suffix.len(), SLUG_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn empty_titles_fall_back_to_a_stem() {
        let slug = generate_slug("???");
        assert!(slug.starts_with("post-"));
    }

    #[test]
    fn identical_titles_get_distinct_slugs() {
        let a = generate_slug("Same Title");
        let b = generate_slug("Same Title");
        assert_ne!(a, b);
    }
}
