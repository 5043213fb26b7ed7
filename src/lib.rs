pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod flags;
pub mod namespace;
pub mod notice;
pub mod query;
pub mod record;
pub mod reference;
pub mod source;
pub mod tokenize;

