//! Backend data access
//!
//! Read accessors substitute an empty payload on any failure so the
//! dashboard always renders. Write accessors return `ApiError`.

pub mod client;

pub use client::*;
