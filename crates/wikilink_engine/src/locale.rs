//! Localized strings for composed replies.
//!
//! The real deployment feeds translations in from an external catalog;
//! the built-in one covers the reply header and separator for the bundled
//! languages. Unknown keys are never fatal: the key itself is returned so
//! a missing translation degrades visibly instead of dropping the reply.

/// Keys used by the composer.
pub const LINKS_HEADER: &str = "linking-links";
pub const LINKS_SEPARATOR: &str = "linking-separator";

pub trait MessageCatalog: Send + Sync {
    /// Fetches a localized message; `count` drives pluralization.
    fn message(&self, key: &str, lang: &str, count: usize) -> String;
}

/// Built-in `en`/`ru` catalog. Unknown languages fall back to English.
#[derive(Debug, Default)]
pub struct BuiltinCatalog;

impl MessageCatalog for BuiltinCatalog {
    fn message(&self, key: &str, lang: &str, count: usize) -> String {
        let lang = match lang {
            "ru" => "ru",
            _ => "en",
        };
        match (key, lang) {
            (LINKS_HEADER, "en") => {
                if count == 1 { "Link:" } else { "Links:" }.to_owned()
            }
            (LINKS_HEADER, "ru") => {
                if count % 10 == 1 && count % 100 != 11 {
                    "Ссылка:"
                } else {
                    "Ссылки:"
                }
                .to_owned()
            }
            (LINKS_SEPARATOR, _) => ", ".to_owned(),
            _ => key.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_pluralization() {
        let catalog = BuiltinCatalog;
        assert_eq!(catalog.message(LINKS_HEADER, "en", 1), "Link:");
        assert_eq!(catalog.message(LINKS_HEADER, "en", 2), "Links:");
    }

    #[test]
    fn test_russian_pluralization() {
        let catalog = BuiltinCatalog;
        assert_eq!(catalog.message(LINKS_HEADER, "ru", 1), "Ссылка:");
        assert_eq!(catalog.message(LINKS_HEADER, "ru", 3), "Ссылки:");
        assert_eq!(catalog.message(LINKS_HEADER, "ru", 11), "Ссылки:");
        assert_eq!(catalog.message(LINKS_HEADER, "ru", 21), "Ссылка:");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let catalog = BuiltinCatalog;
        assert_eq!(catalog.message(LINKS_HEADER, "de", 1), "Link:");
    }

    #[test]
    fn test_unknown_key_returns_key() {
        let catalog = BuiltinCatalog;
        assert_eq!(catalog.message("no-such-key", "en", 0), "no-such-key");
    }
}
