//! # Config Store
//!
//! Typed TOML documents addressed by dotted paths, plus the atomic write
//! primitives every on-disk mutation goes through.

pub mod atomic;
pub mod document;
pub mod value;

pub use atomic::{atomic_write, batch_rename, RenameOp, StagedWrite};
pub use document::Document;
pub use value::{infer_value, Table, Value};
