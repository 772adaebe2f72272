//! # Filename Sanitization Module
//!
//! Converte titoli arbitrari dei post in nomi file sicuri per il filesystem.

/// Characters that are invalid in filenames on at least one supported platform.
const INVALID_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Sanitize a post title into a filesystem-safe filename.
///
/// Invalid characters are replaced with `_`, spaces optionally too, and the
/// result is truncated to `max_length` characters. Sanitizing an already
/// sanitized string is a no-op.
pub fn sanitize_filename(title: &str, replace_spaces: bool, max_length: usize) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || (replace_spaces && c == ' ') {
                '_'
            } else {
                c
            }
        })
        .collect();

    if sanitized.chars().count() > max_length {
        sanitized.chars().take(max_length).collect()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_invalid_characters() {
        let result = sanitize_filename(r#"a\b/c*d?e:f"g<h>i|j"#, false, 100);
        assert_eq!(result, "a_b_c_d_e_f_g_h_i_j");
        for c in INVALID_CHARS {
            assert!(!result.contains(*c));
        }
    }

    #[test]
    fn test_replaces_spaces_when_enabled() {
        assert_eq!(sanitize_filename("my cat video", true, 100), "my_cat_video");
        assert_eq!(sanitize_filename("my cat video", false, 100), "my cat video");
    }

    #[test]
    fn test_truncates_to_max_length() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_filename(&long, true, 100).chars().count(), 100);
    }

    #[test]
    fn test_truncation_respects_multibyte_characters() {
        let title = "è".repeat(10);
        let result = sanitize_filename(&title, true, 5);
        assert_eq!(result, "è".repeat(5));
    }

    #[test]
    fn test_idempotent() {
        let inputs = ["clean_title", "dirty: title?", "spaced out title", ""];
        for input in inputs {
            let once = sanitize_filename(input, true, 100);
            let twice = sanitize_filename(&once, true, 100);
            assert_eq!(once, twice);
        }
    }
}
