pub mod composer;
pub mod locale;
pub mod normalizer;
pub mod resolver;
pub mod scanner;
pub mod validator;

pub use composer::LinkEngine;
pub use wikilink_domain::types::Reply;
