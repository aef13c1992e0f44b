//! Folder-name normalization for artists and songs.

/// Slug used when a name has no usable characters.
pub const PLACEHOLDER_SLUG: &str = "song";

/// Turns a display name into a filesystem-safe directory name.
///
/// Only ASCII letters, digits, `_` and `-` survive; whitespace and every
/// other character become `_`, runs of `_` collapse to one, and leading or
/// trailing `_` are trimmed.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_underscore = false;

    for c in input.trim().chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' => {
                slug.push(c);
                last_underscore = false;
            }
            _ => {
                if !last_underscore {
                    slug.push('_');
                    last_underscore = true;
                }
            }
        }
    }

    let trimmed = slug.trim_matches('_');
    if trimmed.is_empty() {
        PLACEHOLDER_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Readable label for a slug: underscores become spaces and each word is
/// title-cased. Lossy; `unsanitize_name(slugify(x))` is not `x` in general.
pub fn unsanitize_name(slug: &str) -> String {
    slug.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("Foo  Bar!"), "Foo_Bar");
        assert_eq!(slugify("  Bohemian Rhapsody  "), "Bohemian_Rhapsody");
        assert_eq!(slugify("AC/DC"), "AC_DC");
    }

    #[test]
    fn test_slugify_keeps_hyphens_and_underscores() {
        assert_eq!(slugify("Jay-Z"), "Jay-Z");
        assert_eq!(slugify("a__b"), "a_b");
        assert_eq!(slugify("_leading_and_trailing_"), "leading_and_trailing");
    }

    #[test]
    fn test_slugify_placeholder() {
        assert_eq!(slugify("!!!"), PLACEHOLDER_SLUG);
        assert_eq!(slugify(""), PLACEHOLDER_SLUG);
        assert_eq!(slugify("   "), PLACEHOLDER_SLUG);
    }

    #[test]
    fn test_slugify_non_ascii_becomes_separator() {
        assert_eq!(slugify("Sigur Rós"), "Sigur_R_s");
        assert_eq!(slugify("Beyoncé"), "Beyonc");
    }

    #[test]
    fn test_unsanitize_name() {
        assert_eq!(unsanitize_name("Bohemian_Rhapsody"), "Bohemian Rhapsody");
        assert_eq!(unsanitize_name("the_BEATLES"), "The Beatles");
        assert_eq!(unsanitize_name(""), "");
    }

    proptest! {
        #[test]
        fn prop_slugify_is_idempotent(input in "\\PC{0,40}") {
            let once = slugify(&input);
            prop_assert_eq!(slugify(&once), once.clone());
        }

        #[test]
        fn prop_slugify_charset(input in "\\PC{0,40}") {
            let slug = slugify(&input);
            prop_assert!(!slug.is_empty());
            prop_assert!(slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
            prop_assert!(!slug.contains("__"));
            prop_assert!(!slug.starts_with('_') && !slug.ends_with('_'));
        }
    }
}
