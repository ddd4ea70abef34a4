//! Per-message orchestration: scan, resolve, deduplicate, compose.

use crate::locale::{BuiltinCatalog, LINKS_HEADER, LINKS_SEPARATOR, MessageCatalog};
use crate::resolver::{self, TitleResolver};
use crate::scanner::MessageScanner;
use std::collections::HashSet;
use std::sync::Arc;
use wikilink_domain::types::{RenderedLink, Reply};
use wikilink_siteinfo::SiteProvider;

/// Platform hard limit on one message, in characters.
const MAX_REPLY_CHARS: usize = 2000;

pub struct LinkEngine {
    scanner: MessageScanner,
    resolver: TitleResolver,
    provider: Arc<dyn SiteProvider>,
    catalog: Box<dyn MessageCatalog>,
}

impl LinkEngine {
    pub fn new(provider: Arc<dyn SiteProvider>) -> Self {
        Self::with_catalog(provider, Box::new(BuiltinCatalog))
    }

    pub fn with_catalog(provider: Arc<dyn SiteProvider>, catalog: Box<dyn MessageCatalog>) -> Self {
        Self {
            scanner: MessageScanner::new(),
            resolver: TitleResolver::new(Arc::clone(&provider)),
            provider,
            catalog,
        }
    }

    /// Turns one chat message into a reply.
    ///
    /// Per-candidate failures are dropped silently and never abort the
    /// message; an unreachable default wiki yields `Reply::Empty`.
    pub async fn prepare_message(
        &self,
        content: &str,
        lang: &str,
        default_wiki_url_pattern: &str,
    ) -> Reply {
        if content.trim().is_empty() {
            return Reply::Empty;
        }
        let Some(site) = self.provider.get_site(default_wiki_url_pattern).await else {
            tracing::warn!(default_wiki_url_pattern, "default wiki is unreachable");
            return Reply::Empty;
        };

        let candidates = self.scanner.scan(content, &site);
        if candidates.is_empty() {
            return Reply::Empty;
        }
        tracing::debug!(count = candidates.len(), "scanned link candidates");

        let mut seen: HashSet<String> = HashSet::new();
        let mut links: Vec<String> = Vec::new();
        for candidate in &candidates {
            let Some(resolved) = self.resolver.resolve(candidate, &site).await else {
                continue;
            };
            let RenderedLink { key, markdown, hidden } = resolver::render(&resolved, candidate.hidden);
            // First occurrence wins; later duplicates keep its formatting.
            if !seen.insert(key) {
                continue;
            }
            links.push(if hidden {
                format!("||{markdown}||")
            } else {
                markdown
            });
        }

        if links.is_empty() {
            return Reply::Empty;
        }

        let header = self.catalog.message(LINKS_HEADER, lang, links.len());
        let separator = self.catalog.message(LINKS_SEPARATOR, lang, links.len());
        let reply = format!("{header} {}", links.join(&separator));

        if reply.chars().count() > MAX_REPLY_CHARS {
            return Reply::TooLong;
        }
        Reply::Text(reply)
    }
}
