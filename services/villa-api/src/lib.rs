//! Villa resource API.
//!
//! This crate primarily ships a `villa-api` binary, but we expose the
//! library surface to enable integration testing and reuse.

pub mod allocator;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod patch;
pub mod service;
pub mod state;
pub mod store;
pub mod validation;
