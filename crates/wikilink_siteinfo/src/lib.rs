pub mod cache;
pub mod client;
pub mod error;
pub mod provider;

pub use client::HttpSiteProvider;
pub use error::SiteInfoError;
pub use provider::SiteProvider;
