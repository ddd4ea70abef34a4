//! Reqwest-backed [`SiteProvider`] implementation.
//!
//! Fetches `action=query&meta=siteinfo` from a wiki's API endpoint and
//! assembles an immutable [`SiteDescriptor`]. Endpoint discovery tries the
//! conventional `/w/api.php` path first, then bare `/api.php`.

use crate::cache::SiteCache;
use crate::error::SiteInfoError;
use crate::provider::SiteProvider;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use wikilink_domain::site::{MagicWord, NamespaceInfo, SiteDescriptor};
use wikilink_domain::types::NamespaceId;

const SITEINFO_PROPS: &str = "general|namespaces|namespacealiases|interwikimap|magicwords";

#[derive(Debug, Deserialize)]
struct SiteInfoResponse {
    query: SiteInfoQuery,
}

#[derive(Debug, Deserialize)]
struct SiteInfoQuery {
    general: GeneralInfo,
    namespaces: HashMap<String, NamespaceEntry>,
    #[serde(rename = "namespacealiases", default)]
    namespace_aliases: Vec<NamespaceAlias>,
    #[serde(default)]
    interwikimap: Vec<InterwikiEntry>,
    #[serde(default)]
    magicwords: Vec<MagicWordEntry>,
}

#[derive(Debug, Deserialize)]
struct GeneralInfo {
    mainpage: String,
    server: String,
    articlepath: String,
    lang: String,
    case: String,
}

#[derive(Debug, Deserialize)]
struct NamespaceEntry {
    id: i32,
    name: String,
    #[serde(default)]
    canonical: Option<String>,
    case: String,
}

#[derive(Debug, Deserialize)]
struct NamespaceAlias {
    id: i32,
    alias: String,
}

#[derive(Debug, Deserialize)]
struct InterwikiEntry {
    prefix: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct MagicWordEntry {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(rename = "case-sensitive", default)]
    case_sensitive: bool,
}

pub struct HttpSiteProvider {
    http: reqwest::Client,
    cache: SiteCache,
}

impl HttpSiteProvider {
    pub fn new() -> Self {
        let http = reqwest::ClientBuilder::new()
            .user_agent(concat!("wikilink-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            http,
            cache: SiteCache::new(),
        }
    }

    /// Re-fetches a site's metadata, replacing the cached entry whole.
    pub async fn refresh_site(&self, url_pattern: &str) -> Option<Arc<SiteDescriptor>> {
        self.cache
            .refresh(url_pattern, || self.fetch_site_option(url_pattern))
            .await
    }

    async fn fetch_site_option(&self, url_pattern: &str) -> Option<Arc<SiteDescriptor>> {
        match self.fetch_site(url_pattern).await {
            Ok(descriptor) => Some(Arc::new(descriptor)),
            Err(err) => {
                tracing::warn!(url_pattern, %err, "site metadata unavailable");
                None
            }
        }
    }

    async fn fetch_site(&self, url_pattern: &str) -> Result<SiteDescriptor, SiteInfoError> {
        for api_url in candidate_endpoints(url_pattern)? {
            match self.fetch_siteinfo(&api_url).await {
                Ok(descriptor) => return Ok(descriptor),
                Err(err) => {
                    tracing::debug!(%api_url, %err, "siteinfo endpoint failed");
                }
            }
        }
        Err(SiteInfoError::NotAWiki {
            url: url_pattern.to_owned(),
        })
    }

    async fn fetch_siteinfo(&self, api_url: &str) -> Result<SiteDescriptor, SiteInfoError> {
        let resp = self
            .http
            .get(api_url)
            .query(&[
                ("action", "query"),
                ("meta", "siteinfo"),
                ("siprop", SITEINFO_PROPS),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SiteInfoError::Http {
                status: status.as_u16(),
                url: api_url.to_owned(),
            });
        }

        let body: SiteInfoResponse = resp.json().await?;
        Ok(build_descriptor(api_url, body.query))
    }

    async fn normalized_title(
        &self,
        title: &str,
        site: &SiteDescriptor,
    ) -> Result<String, SiteInfoError> {
        let (base, anchor) = split_anchor(title);
        let resp = self
            .http
            .get(&site.api_url)
            .query(&[
                ("action", "query"),
                ("titles", base),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SiteInfoError::Http {
                status: status.as_u16(),
                url: site.api_url.clone(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        let normalized = body["query"]["normalized"][0]["to"]
            .as_str()
            .or_else(|| body["query"]["pages"][0]["title"].as_str())
            .ok_or_else(|| SiteInfoError::BadResponse("no normalized title".into()))?;

        Ok(match anchor {
            Some(anchor) => format!("{normalized}#{anchor}"),
            None => normalized.to_owned(),
        })
    }
}

impl Default for HttpSiteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SiteProvider for HttpSiteProvider {
    async fn get_site(&self, url_pattern: &str) -> Option<Arc<SiteDescriptor>> {
        self.cache
            .get_or_fetch(url_pattern, || self.fetch_site_option(url_pattern))
            .await
    }

    async fn get_normalized_title(&self, title: &str, site: &SiteDescriptor) -> String {
        match self.normalized_title(title, site).await {
            Ok(normalized) => normalized,
            Err(err) => {
                tracing::debug!(title, %err, "title normalization failed");
                title.to_owned()
            }
        }
    }
}

fn split_anchor(title: &str) -> (&str, Option<&str>) {
    match title.split_once('#') {
        Some((base, anchor)) => (base, Some(anchor)),
        None => (title, None),
    }
}

/// API endpoints to probe for a wiki URL pattern, in order.
fn candidate_endpoints(url_pattern: &str) -> Result<Vec<String>, SiteInfoError> {
    if url_pattern.ends_with("api.php") {
        return Ok(vec![url_pattern.to_owned()]);
    }
    let parsed = url::Url::parse(&url_pattern.replace("$1", ""))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| SiteInfoError::InvalidPattern(url_pattern.to_owned()))?;
    let mut origin = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        origin.push_str(&format!(":{port}"));
    }
    Ok(vec![
        format!("{origin}/w/api.php"),
        format!("{origin}/api.php"),
    ])
}

fn build_descriptor(api_url: &str, query: SiteInfoQuery) -> SiteDescriptor {
    let scheme = api_url.split("://").next().unwrap_or("https");
    let server = if query.general.server.starts_with("//") {
        format!("{}:{}", scheme, query.general.server)
    } else {
        query.general.server.clone()
    };
    let url_pattern = format!("{}{}", server, query.general.articlepath);

    let mut aliases_by_id: HashMap<i32, Vec<String>> = HashMap::new();
    for alias in query.namespace_aliases {
        aliases_by_id.entry(alias.id).or_default().push(alias.alias);
    }

    let mut namespaces: Vec<NamespaceInfo> = query
        .namespaces
        .into_values()
        .map(|entry| NamespaceInfo {
            id: NamespaceId(entry.id),
            canonical: entry.canonical,
            name: entry.name,
            aliases: aliases_by_id.remove(&entry.id).unwrap_or_default(),
            case_sensitive: entry.case == "case-sensitive",
        })
        .collect();
    namespaces.sort_by_key(|ns| ns.id.0);

    let mut interwiki = IndexMap::new();
    for entry in query.interwikimap {
        interwiki.insert(entry.prefix.to_lowercase(), entry.url);
    }

    let magic_words = query
        .magicwords
        .into_iter()
        .map(|entry| MagicWord {
            name: entry.name,
            case_sensitive: entry.case_sensitive,
            aliases: entry.aliases,
        })
        .collect();

    SiteDescriptor {
        url_pattern,
        api_url: api_url.to_owned(),
        namespaces,
        interwiki,
        magic_words,
        case_sensitive: query.general.case == "case-sensitive",
        main_page: query.general.mainpage,
        lang: query.general.lang,
    }
}
