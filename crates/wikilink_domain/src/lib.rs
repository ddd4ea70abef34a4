pub mod site;
pub mod types;
