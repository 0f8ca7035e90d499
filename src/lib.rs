//! # bluepreset - HTTP requests from preset directories
//!
//! A preset is a directory of small TOML documents (request, headers, query,
//! body, variables). Commands edit those documents, resolve `{@hard}` and
//! `{?soft}` placeholders, assemble one HTTP request from them and keep a
//! bounded history of responses.
//!
//! ```text
//! cmd_args ──► commands ──► workspace ──► store
//!                 │             │
//!                 ├─► variables ┘
//!                 ├─► request ──► http
//!                 └─► history
//! ```

pub mod cmd_args;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod logging;
pub mod request;
pub mod store;
pub mod variables;
pub mod workspace;

pub use error::{Error, Result};
