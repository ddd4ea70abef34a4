//! Immutable per-wiki metadata snapshots.
//!
//! A [`SiteDescriptor`] is assembled once from a successful siteinfo fetch
//! and never mutated afterwards; refreshing a site replaces the whole
//! descriptor. All lookup helpers used by prefix resolution live here so the
//! resolver only deals in domain terms, never in raw siteinfo JSON.

use crate::types::NamespaceId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Magic words whose `name:`-style prefix denotes substitution or a
/// namespace cue rather than a parser function. These never block
/// transclusion resolution.
pub const NAMESPACE_CUE_WORDS: &[&str] =
    &["subst", "safesubst", "raw", "msg", "int", "special", "invoke"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceInfo {
    pub id: NamespaceId,
    /// Canonical English name (`User`, `Template`, ...); `None` for the
    /// main namespace.
    pub canonical: Option<String>,
    /// Localized display name.
    pub name: String,
    /// Additional localized aliases, including gendered forms.
    pub aliases: Vec<String>,
    /// Per-namespace title case sensitivity.
    pub case_sensitive: bool,
}

impl NamespaceInfo {
    /// The name used in dedup keys and page URLs.
    pub fn canonical_name(&self) -> &str {
        self.canonical.as_deref().unwrap_or(&self.name)
    }

    fn matches(&self, normalized_prefix: &str) -> bool {
        let eq = |name: &str| !name.is_empty() && name.to_lowercase() == normalized_prefix;
        eq(&self.name)
            || self.canonical.as_deref().is_some_and(eq)
            || self.aliases.iter().any(|a| eq(a))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicWord {
    pub name: String,
    pub case_sensitive: bool,
    /// Aliases as reported by the wiki; parser-function aliases carry a
    /// trailing `:`, variables and behavior switches do not.
    pub aliases: Vec<String>,
}

impl MagicWord {
    fn alias_eq(&self, alias: &str, candidate: &str) -> bool {
        if self.case_sensitive {
            alias == candidate
        } else {
            alias.to_lowercase() == candidate.to_lowercase()
        }
    }

    /// True if `text` invokes this magic word: either a whole-text match
    /// (variables, behavior switches) or a `name:`-prefix match (parser
    /// functions, whose aliases end in `:`).
    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim();
        for alias in &self.aliases {
            if let Some(stem) = alias.strip_suffix(':') {
                if let Some((head, _)) = text.split_once(':') {
                    if self.alias_eq(stem, head.trim()) {
                        return true;
                    }
                }
            } else if self.alias_eq(alias, text) {
                return true;
            }
        }
        false
    }

    /// Strips a `alias:` prefix from `text`, returning the remainder.
    pub fn strip_colon_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        let (head, rest) = text.split_once(':')?;
        let head = head.trim();
        for alias in &self.aliases {
            let stem = alias.strip_suffix(':').unwrap_or(alias);
            if self.alias_eq(stem, head) {
                return Some(rest.trim_start());
            }
        }
        None
    }
}

/// Per-wiki immutable metadata snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    /// Article URL pattern, e.g. `https://ru.wikipedia.org/wiki/$1`.
    pub url_pattern: String,
    /// API endpoint the metadata was fetched from.
    pub api_url: String,
    pub namespaces: Vec<NamespaceInfo>,
    /// Interwiki prefix (lowercase) → target URL pattern, insertion-ordered.
    pub interwiki: IndexMap<String, String>,
    pub magic_words: Vec<MagicWord>,
    /// Site-wide `titlesCaseSensitive` flag (`case: "case-sensitive"`).
    pub case_sensitive: bool,
    /// Main page title, substituted for bare cross-wiki links.
    pub main_page: String,
    pub lang: String,
}

impl SiteDescriptor {
    pub fn namespace_by_id(&self, id: NamespaceId) -> Option<&NamespaceInfo> {
        self.namespaces.iter().find(|ns| ns.id == id)
    }

    /// Resolves a `prefix:` against namespace names, canonical names, and
    /// aliases. The prefix must already be decoded; comparison is
    /// case-insensitive with underscores treated as spaces.
    pub fn resolve_namespace(&self, prefix: &str) -> Option<&NamespaceInfo> {
        let normalized = prefix.trim().replace('_', " ").to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.namespaces.iter().find(|ns| ns.matches(&normalized))
    }

    pub fn interwiki_target(&self, prefix: &str) -> Option<&str> {
        self.interwiki
            .get(&prefix.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn magic_word(&self, name: &str) -> Option<&MagicWord> {
        self.magic_words.iter().find(|mw| mw.name == name)
    }

    /// Strips a `subst:`-family or other named magic-word prefix.
    pub fn strip_magic_prefix<'a>(&self, text: &'a str, name: &str) -> Option<&'a str> {
        self.magic_word(name)?.strip_colon_prefix(text)
    }

    /// True if `text` invokes any magic word that is not a namespace cue.
    /// Such text is a variable, behavior switch, or parser function, never
    /// a template link.
    pub fn matches_other_magic_word(&self, text: &str) -> bool {
        self.magic_words
            .iter()
            .filter(|mw| !NAMESPACE_CUE_WORDS.contains(&mw.name.as_str()))
            .any(|mw| mw.matches(text))
    }

    pub fn has_module_namespace(&self) -> bool {
        self.namespace_by_id(NamespaceId::MODULE).is_some()
    }
}
