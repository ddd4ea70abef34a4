use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiteInfoError {
    #[error("HTTP error: {status} {url}")]
    Http { status: u16, url: String },

    #[error("URL pattern has no host: {0}")]
    InvalidPattern(String),

    #[error("No MediaWiki API endpoint found for {url}")]
    NotAWiki { url: String },

    #[error("Unexpected API response shape: {0}")]
    BadResponse(String),

    #[error("URL parse: {0}")]
    Url(#[from] url::ParseError),

    #[error("Deserialization: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Network: {0}")]
    Network(#[from] reqwest::Error),
}
