pub mod app;
pub mod domain;
pub mod error;
pub mod feed;
pub mod github;
pub mod parser;
pub mod store;
