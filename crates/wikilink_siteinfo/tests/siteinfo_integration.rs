//! Integration tests for the HTTP site provider against a mock MediaWiki
//! API.

use wikilink_siteinfo::{HttpSiteProvider, SiteProvider};
use wikilink_domain::types::NamespaceId;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn siteinfo_body(server: &str) -> serde_json::Value {
    serde_json::json!({
        "batchcomplete": true,
        "query": {
            "general": {
                "mainpage": "Заглавная страница",
                "server": server,
                "articlepath": "/wiki/$1",
                "lang": "ru",
                "case": "first-letter"
            },
            "namespaces": {
                "0": {"id": 0, "case": "first-letter", "name": "", "content": true},
                "2": {"id": 2, "case": "first-letter", "name": "Участник", "canonical": "User", "content": false},
                "10": {"id": 10, "case": "first-letter", "name": "Шаблон", "canonical": "Template", "content": false}
            },
            "namespacealiases": [
                {"id": 2, "alias": "Участница"},
                {"id": 10, "alias": "Ш"}
            ],
            "interwikimap": [
                {"prefix": "EN", "url": "https://en.wikipedia.org/wiki/$1"}
            ],
            "magicwords": [
                {"name": "subst", "aliases": ["ПОДСТ:", "SUBST:"], "case-sensitive": false},
                {"name": "pagename", "aliases": ["PAGENAME"], "case-sensitive": true}
            ]
        }
    })
}

#[tokio::test]
async fn test_descriptor_assembled_from_siteinfo() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("meta", "siteinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(siteinfo_body(&server.uri())))
        .mount(&server)
        .await;

    let provider = HttpSiteProvider::new();
    let pattern = format!("{}/wiki/$1", server.uri());
    let site = provider.get_site(&pattern).await.expect("site should resolve");

    assert_eq!(site.url_pattern, pattern);
    assert!(site.api_url.ends_with("/w/api.php"));
    assert!(!site.case_sensitive);
    assert_eq!(site.main_page, "Заглавная страница");
    assert_eq!(site.lang, "ru");

    let user = site.resolve_namespace("Участница").expect("gendered alias");
    assert_eq!(user.id, NamespaceId::USER);
    assert_eq!(user.canonical.as_deref(), Some("User"));
    assert_eq!(user.aliases, vec!["Участница".to_string()]);

    // Interwiki prefixes are lowercased on assembly.
    assert_eq!(
        site.interwiki_target("en"),
        Some("https://en.wikipedia.org/wiki/$1")
    );

    let pagename = site.magic_word("pagename").expect("magic word");
    assert!(pagename.case_sensitive);
}

#[tokio::test]
async fn test_api_endpoint_fallback_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("meta", "siteinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(siteinfo_body(&server.uri())))
        .mount(&server)
        .await;

    let provider = HttpSiteProvider::new();
    let pattern = format!("{}/wiki/$1", server.uri());
    let site = provider.get_site(&pattern).await.expect("fallback should work");
    assert!(site.api_url.ends_with("/api.php"));
    assert!(!site.api_url.ends_with("/w/api.php"));
}

#[tokio::test]
async fn test_non_wiki_site_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = HttpSiteProvider::new();
    let pattern = format!("{}/wiki/$1", server.uri());
    assert!(provider.get_site(&pattern).await.is_none());
}

#[tokio::test]
async fn test_single_flight_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("meta", "siteinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(siteinfo_body(&server.uri())))
        .expect(1)
        .mount(&server)
        .await;

    let provider = HttpSiteProvider::new();
    let pattern = format!("{}/wiki/$1", server.uri());
    let (a, b) = tokio::join!(provider.get_site(&pattern), provider.get_site(&pattern));
    assert!(a.is_some());
    assert!(b.is_some());
    // A later call hits the cache, not the network.
    assert!(provider.get_site(&pattern).await.is_some());
    server.verify().await;
}

#[tokio::test]
async fn test_refresh_replaces_cached_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("meta", "siteinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(siteinfo_body(&server.uri())))
        .expect(2)
        .mount(&server)
        .await;

    let provider = HttpSiteProvider::new();
    let pattern = format!("{}/wiki/$1", server.uri());
    assert!(provider.get_site(&pattern).await.is_some());
    assert!(provider.refresh_site(&pattern).await.is_some());
    server.verify().await;
}

#[tokio::test]
async fn test_normalized_title_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("meta", "siteinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(siteinfo_body(&server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", "участница:iluvatar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "query": {
                "normalized": [
                    {"from": "участница:iluvatar", "to": "Участница:Iluvatar"}
                ],
                "pages": [{"title": "Участница:Iluvatar", "missing": true}]
            }
        })))
        .mount(&server)
        .await;

    let provider = HttpSiteProvider::new();
    let pattern = format!("{}/wiki/$1", server.uri());
    let site = provider.get_site(&pattern).await.expect("site");

    let normalized = provider
        .get_normalized_title("участница:iluvatar#Якорь", &site)
        .await;
    assert_eq!(normalized, "Участница:Iluvatar#Якорь");
}

#[tokio::test]
async fn test_normalized_title_failure_returns_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("meta", "siteinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(siteinfo_body(&server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "query"))
        .and(query_param("titles", "Whatever"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = HttpSiteProvider::new();
    let pattern = format!("{}/wiki/$1", server.uri());
    let site = provider.get_site(&pattern).await.expect("site");

    let normalized = provider.get_normalized_title("Whatever#Anchor", &site).await;
    assert_eq!(normalized, "Whatever#Anchor");
}
