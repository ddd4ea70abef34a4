use crate::site::{NamespaceInfo, SiteDescriptor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamespaceId(pub i32);

impl NamespaceId {
    pub const MEDIA: Self = Self(-2);
    pub const SPECIAL: Self = Self(-1);
    pub const MAIN: Self = Self(0);
    pub const TALK: Self = Self(1);
    pub const USER: Self = Self(2);
    pub const USER_TALK: Self = Self(3);
    pub const PROJECT: Self = Self(4);
    pub const FILE: Self = Self(6);
    pub const FILE_TALK: Self = Self(7);
    pub const MEDIAWIKI: Self = Self(8);
    pub const MEDIAWIKI_TALK: Self = Self(9);
    pub const TEMPLATE: Self = Self(10);
    pub const TEMPLATE_TALK: Self = Self(11);
    pub const MODULE: Self = Self(828);

    /// Namespaces whose titles MediaWiki always capitalizes, even on
    /// otherwise case-sensitive wikis.
    pub fn forces_capitalization(self) -> bool {
        matches!(
            self,
            Self::SPECIAL | Self::USER | Self::USER_TALK | Self::MEDIAWIKI | Self::MEDIAWIKI_TALK
        )
    }
}

/// One scanned `[[...]]` / `{{...}}` occurrence, prior to resolution.
///
/// Bracket runs are kept verbatim so the resolver can reject mismatched
/// opening/closing kinds and `{{{parameter}}}` syntax itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMatch {
    /// Opening bracket run: `[[`, `{{`, `{{{`, ...
    pub open: String,
    /// Raw text between the brackets, before any `|`.
    pub inner: String,
    /// Piped remainder (`|...`), unused for resolution but part of the span.
    pub piped: Option<String>,
    /// Closing bracket run: `]]`, `}}`, `}}}`, ...
    pub close: String,
    /// The full matched substring, used for the spoiler-visibility check.
    pub raw: String,
    /// Candidate was inside a `||...||` spoiler region.
    pub hidden: bool,
}

impl CandidateMatch {
    pub fn is_transclusion(&self) -> bool {
        self.open.starts_with('{')
    }
}

/// Output of the prefix resolver for one candidate.
#[derive(Debug, Clone)]
pub struct ResolvedTitle {
    /// Site the title finally resolved against (after interwiki hops).
    pub site: Arc<SiteDescriptor>,
    /// Resolved namespace; `None` means main namespace.
    pub namespace: Option<NamespaceInfo>,
    /// Localized display override for the namespace (gendered forms).
    pub display_namespace: Option<String>,
    /// Decoded, capitalized title text.
    pub title: String,
    /// Interwiki prefixes traversed, in order.
    pub interwiki_chain: Vec<String>,
    pub is_transclusion: bool,
    /// False once an interwiki hop resolved to a target that could not be
    /// confirmed as a MediaWiki site.
    pub is_mediawiki: bool,
    /// Whether first-letter capitalization was applied.
    pub capitalized: bool,
    /// URL pattern (`...$1`) of the last hop, valid even when `site`
    /// metadata could not be fetched for it.
    pub url_pattern: String,
}

/// Final per-candidate artifact consumed by the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLink {
    /// Canonical dedup key: interwiki chain + canonical namespace + title.
    pub key: String,
    /// Markdown `[label](<url>)` fragment.
    pub markdown: String,
    /// Candidate was inside a spoiler region.
    pub hidden: bool,
}

/// Outcome of preparing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// No resolvable links; the caller sends nothing.
    Empty,
    /// Composed reply text.
    Text(String),
    /// The composed reply would exceed the platform message limit; the
    /// caller substitutes a localized notice.
    TooLong,
}

impl Reply {
    pub fn is_empty(&self) -> bool {
        matches!(self, Reply::Empty)
    }
}
