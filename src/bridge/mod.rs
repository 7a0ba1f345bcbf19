//! # Bridge
//!
//! bridges to the external services used by the application

pub mod content_store;
