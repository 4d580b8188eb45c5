//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Account registration and password login
//! - `oauth` - Google and GitHub sign-in (authorization-code flow)

pub mod auth;
pub mod oauth;
