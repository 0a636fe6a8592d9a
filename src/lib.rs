//! # scrapegate
//!
//! HTTP gateway that scrapes public sites and JSON APIs into normalised
//! records. Extraction lives in the `scrapegate-extract` crate; this crate
//! owns the axum routes, the TOML configuration and the optional keep-alive
//! pinger.

pub mod config;
pub mod error;
pub mod keepalive;
pub mod server;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use server::{AppState, router, serve};
