//! Core types for Gremco.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod document_key;
pub mod email;
pub mod id;
pub mod price;

pub use document_key::{DocumentKey, DocumentKeyError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
