//! Gremco Core - Shared types and catalog logic.
//!
//! This crate provides the pieces shared by every Gremco component:
//! - `storefront` - Catalog, admin console and authentication web app
//! - `cli` - Command-line tools for migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Anything that needs a collection of
//! records receives it as an iterator or slice.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for numeric ids, document keys, prices and emails
//! - [`sequence`] - Sequential numeric id allocation (`max + 1`)
//! - [`search`] - Case-insensitive substring filtering across record fields

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod search;
pub mod sequence;
pub mod types;

pub use search::{Searchable, filter_records, matches_query};
pub use sequence::{SequenceError, next_sequential_id};
pub use types::*;
