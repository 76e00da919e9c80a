//! Storage module
//!
//! Inline encoding for attachment bytes.

pub mod data_uri;
