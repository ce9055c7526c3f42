#![forbid(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod logging;
pub mod model;
pub mod openai;
pub mod query;
pub mod render;
pub mod server;
pub mod summarize;
pub mod transcript;
