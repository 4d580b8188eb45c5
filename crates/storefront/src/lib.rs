//! Gremco storefront library.
//!
//! The public catalog, the admin console and the sign-in flows, packaged as
//! a library so the binary, the CLI and the tests share one router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
