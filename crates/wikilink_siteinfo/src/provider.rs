use async_trait::async_trait;
use std::sync::Arc;
use wikilink_domain::site::SiteDescriptor;

/// Read-only access to per-wiki metadata snapshots.
///
/// Implementations must degrade to absence rather than error: an
/// unreachable or non-MediaWiki target is `None`, and a failed title
/// normalization returns the input unchanged. The resolution engine only
/// branches on presence.
#[async_trait]
pub trait SiteProvider: Send + Sync {
    /// Resolves a wiki URL (either `.../wiki/$1` or `.../api.php` form) to
    /// its metadata snapshot. `None` signals "not a reachable MediaWiki
    /// site".
    async fn get_site(&self, url_pattern: &str) -> Option<Arc<SiteDescriptor>>;

    /// Round-trips a title through the site's own normalization, used to
    /// resolve gendered namespace display names. On failure the input is
    /// returned unchanged, with any `#anchor` suffix preserved.
    async fn get_normalized_title(&self, title: &str, site: &SiteDescriptor) -> String;
}
