//! # riskvault
//!
//! HTTP server and CLI around `riskvault-core`.
//!
//! - `api`: axum router, handlers and the response envelope
//! - `cli`: clap commands
//! - `config`: layered TOML / environment / flag settings
//! - `extract`: PDF and plain text extraction for uploads

pub mod api;
pub mod cli;
pub mod config;
pub mod extract;
