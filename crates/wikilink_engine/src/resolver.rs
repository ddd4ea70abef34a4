//! Iterative prefix resolution for scanned candidates.
//!
//! A candidate's inner text may chain through namespace aliases and several
//! interwiki hops before settling on a target site and title. The loop is
//! bounded by the number of `:`-delimited segments; namespace matches take
//! priority over interwiki matches and end the chain, and the first
//! unreachable interwiki hop halts further resolution.

use crate::{normalizer, validator};
use std::sync::Arc;
use wikilink_domain::site::{NamespaceInfo, SiteDescriptor};
use wikilink_domain::types::{CandidateMatch, NamespaceId, RenderedLink, ResolvedTitle};
use wikilink_siteinfo::SiteProvider;

pub struct TitleResolver {
    provider: Arc<dyn SiteProvider>,
}

enum TransclusionKind {
    /// `{{:Page}}` — a main-namespace page transclusion.
    Page,
    /// `{{int:...}}` / `{{special:...}}` / `{{#invoke:...}}` namespace cue.
    Namespaced(NamespaceId),
    /// A variable, behavior switch, or parser function; not a link at all.
    Blocked,
    /// Ordinary `{{Template}}` transclusion.
    Template,
}

impl TitleResolver {
    pub fn new(provider: Arc<dyn SiteProvider>) -> Self {
        Self { provider }
    }

    /// Resolves one candidate against the default site, following namespace
    /// and interwiki prefixes. `None` means the candidate contributes
    /// nothing to the reply; that is never an error.
    pub async fn resolve(
        &self,
        candidate: &CandidateMatch,
        default_site: &Arc<SiteDescriptor>,
    ) -> Option<ResolvedTitle> {
        let open = candidate.open.trim();
        let close = candidate.close.trim();
        let mut text = candidate.inner.trim().to_owned();
        let is_transclusion = candidate.is_transclusion();

        // Mismatched bracket kinds were deliberately accepted by the
        // scanner; reject them here, along with {{{parameter}}} syntax.
        if is_transclusion {
            if !close.starts_with('}') {
                return None;
            }
            if open.len() >= 3 && close.len() >= 3 {
                return None;
            }
        } else if !close.starts_with(']') {
            return None;
        }

        // Early legality pass, before any length accounting.
        if text.is_empty() || validator::is_invalid(&text, false, true, true) {
            return None;
        }
        if !is_transclusion && text.starts_with('#') {
            return None;
        }
        // Subpage transclusions are relative to the current page, which a
        // chat message does not have.
        if is_transclusion && text.starts_with('/') {
            return None;
        }

        let mut site = Arc::clone(default_site);
        let mut url_pattern = site.url_pattern.clone();
        let mut is_mediawiki = true;
        let mut capitalized = !site.case_sensitive;
        let mut namespace: Option<NamespaceInfo> = None;
        let mut display_namespace: Option<String> = None;
        let mut chain: Vec<String> = Vec::new();
        let mut run_prefix_loop = true;

        if is_transclusion {
            let (kind, remainder) = classify_transclusion(&text, &site);
            text = remainder;
            match kind {
                TransclusionKind::Blocked => return None,
                TransclusionKind::Page => {}
                TransclusionKind::Template => {
                    namespace = Some(lookup_namespace(&site, NamespaceId::TEMPLATE));
                }
                TransclusionKind::Namespaced(id) => {
                    namespace = Some(lookup_namespace(&site, id));
                    run_prefix_loop = false;
                }
            }
        }

        while run_prefix_loop {
            let Some((head, rest)) = text
                .split_once(':')
                .map(|(head, rest)| (head.to_owned(), rest.to_owned()))
            else {
                break;
            };
            let prefix = normalizer::decode(&head).to_lowercase();
            if prefix.is_empty() {
                break;
            }

            // Namespace lookup has priority over interwiki.
            if let Some(ns) = site.resolve_namespace(&prefix) {
                let mut ns = ns.clone();
                let gendered = matches!(ns.id, NamespaceId::USER | NamespaceId::USER_TALK)
                    && !ns.aliases.is_empty();
                if gendered {
                    // Round-trip through the wiki's own normalization to
                    // pick the gendered display form.
                    let normalized = self.provider.get_normalized_title(&text, &site).await;
                    if let Some((ns_display, title)) = normalized.split_once(':') {
                        display_namespace = Some(ns_display.trim().to_owned());
                        text = title.trim_start().to_owned();
                    } else {
                        text = rest.trim_start().to_owned();
                    }
                } else {
                    text = rest.trim_start().to_owned();
                }
                if ns.id == NamespaceId::MEDIA {
                    if let Some(file) = site.namespace_by_id(NamespaceId::FILE) {
                        ns = file.clone();
                    }
                }
                if ns.case_sensitive {
                    capitalized = false;
                }
                namespace = Some(ns);
                break;
            }

            if !is_transclusion {
                if let Some(target) = site.interwiki_target(&prefix) {
                    let target = target.to_owned();
                    chain.push(prefix);
                    text = rest.trim_start().to_owned();
                    url_pattern = target.clone();
                    match self.provider.get_site(&target).await {
                        Some(next) => {
                            capitalized = !next.case_sensitive;
                            site = next;
                            continue;
                        }
                        None => {
                            tracing::warn!(
                                target,
                                "interwiki target is not a reachable MediaWiki site"
                            );
                            is_mediawiki = false;
                            capitalized = false;
                            break;
                        }
                    }
                }
            }

            break;
        }

        if namespace.is_some() && text.trim().is_empty() {
            // Namespace-only link, e.g. [[User:]].
            return None;
        }

        if let Some(ns) = &namespace {
            if ns.id.forces_capitalization() {
                capitalized = true;
            }
        }

        let is_different_wiki = url_pattern != default_site.url_pattern;
        if is_different_wiki && text.trim().is_empty() {
            if !is_mediawiki {
                return None;
            }
            // Bare interwiki link: point at the target's main page.
            text = site.main_page.clone();
        }

        let decoded = normalizer::decode(&text);
        if decoded.is_empty() {
            return None;
        }

        let checked = if namespace
            .as_ref()
            .is_some_and(|ns| ns.id == NamespaceId::SPECIAL)
        {
            format!("-1:{decoded}")
        } else {
            decoded.clone()
        };
        if validator::is_invalid(&checked, true, is_mediawiki, !is_different_wiki) {
            return None;
        }

        let title = normalizer::capitalise(&decoded, capitalized);

        Some(ResolvedTitle {
            site,
            namespace,
            display_namespace,
            title,
            interwiki_chain: chain,
            is_transclusion,
            is_mediawiki,
            capitalized,
            url_pattern,
        })
    }
}

/// Builds the dedup key and Markdown fragment for a resolved title.
pub fn render(resolved: &ResolvedTitle, hidden: bool) -> RenderedLink {
    let chain_part: String = resolved
        .interwiki_chain
        .iter()
        .map(|prefix| format!("{prefix}:"))
        .collect();

    let ns_display = resolved
        .display_namespace
        .clone()
        .or_else(|| resolved.namespace.as_ref().map(|ns| ns.name.clone()))
        .filter(|name| !name.is_empty());
    let ns_part = ns_display.map(|name| format!("{name}:")).unwrap_or_default();

    let canonical_part = resolved
        .namespace
        .as_ref()
        .map(|ns| ns.canonical_name())
        .filter(|name| !name.is_empty())
        .map(|name| format!("{name}:"))
        .unwrap_or_default();

    let label = format!("[[{chain_part}{ns_part}{}]]", resolved.title);
    let key = format!("{chain_part}{canonical_part}{}", resolved.title);
    let target = format!("{ns_part}{}", resolved.title);
    let url = resolved
        .url_pattern
        .replace("$1", &normalizer::encode(&target));

    RenderedLink {
        key,
        markdown: format!("[{}](<{url}>)", code_span(&label)),
        hidden,
    }
}

/// Wraps a link label in a Markdown code span, widening the delimiter when
/// the label itself contains backticks.
fn code_span(text: &str) -> String {
    let longest_run = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    if longest_run == 0 {
        return format!("`{text}`");
    }
    let delim = "`".repeat(longest_run + 1);
    let pad_start = if text.starts_with('`') { " " } else { "" };
    let pad_end = if text.ends_with('`') { " " } else { "" };
    format!("{delim}{pad_start}{text}{pad_end}{delim}")
}

fn classify_transclusion(text: &str, site: &SiteDescriptor) -> (TransclusionKind, String) {
    if let Some(rest) = text.strip_prefix(':') {
        return (TransclusionKind::Page, rest.trim_start().to_owned());
    }

    // Substitution prefixes denote how the template is expanded, not a
    // distinct namespace; strip and continue classifying.
    let mut text = text.to_owned();
    for name in ["subst", "safesubst", "raw", "msg"] {
        if let Some(rest) = site.strip_magic_prefix(&text, name) {
            text = rest.to_owned();
            break;
        }
    }

    if let Some(rest) = site.strip_magic_prefix(&text, "int") {
        return (
            TransclusionKind::Namespaced(NamespaceId::MEDIAWIKI),
            rest.to_owned(),
        );
    }
    if let Some(rest) = site.strip_magic_prefix(&text, "special") {
        return (
            TransclusionKind::Namespaced(NamespaceId::SPECIAL),
            rest.to_owned(),
        );
    }
    if site.has_module_namespace() {
        if let Some(rest) = site.strip_magic_prefix(&text, "invoke") {
            return (
                TransclusionKind::Namespaced(NamespaceId::MODULE),
                rest.to_owned(),
            );
        }
    }

    if site.matches_other_magic_word(&text) {
        return (TransclusionKind::Blocked, text);
    }

    (TransclusionKind::Template, text)
}

/// Namespace lookup with a canonical fallback for wikis whose siteinfo
/// omits an entry the classifier can still name.
fn lookup_namespace(site: &SiteDescriptor, id: NamespaceId) -> NamespaceInfo {
    site.namespace_by_id(id).cloned().unwrap_or_else(|| {
        let canonical = match id {
            NamespaceId::SPECIAL => "Special",
            NamespaceId::MEDIAWIKI => "MediaWiki",
            NamespaceId::MODULE => "Module",
            _ => "Template",
        };
        NamespaceInfo {
            id,
            canonical: Some(canonical.to_owned()),
            name: canonical.to_owned(),
            aliases: Vec::new(),
            case_sensitive: false,
        }
    })
}
