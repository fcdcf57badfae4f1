//! monday.com date sync service.
//!
//! This crate provides:
//! - GraphQL client for the monday.com API
//! - Webhook payload parsing and event classification
//! - Parent → subitem date synchronization
//! - HTTP server for webhook handling (standalone service)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Every remote call can fail

pub mod client;
pub mod columns;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod sync;
pub mod webhooks;

pub use client::MondayClient;
pub use columns::{PARENT_DATE_COLUMN_ID, SUBITEM_DATE_COLUMN_ID};
pub use config::Config;
pub use error::ApiError;
pub use models::*;
pub use sync::{SkipReason, SyncOutcome};
pub use webhooks::{classify, Inbound};
