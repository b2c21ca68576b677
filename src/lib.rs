//! Locale-aware view rendering for axum services.
//!
//! Negotiates a locale per request from `Accept-Language`, translates messages
//! with plural support and renders templates with localized-view, suffix and
//! fingerprinted-asset resolution.

pub mod app;
pub mod config;
pub mod error;
pub mod i18n;
pub mod render;
pub mod store;

pub use error::{Error, Result};
