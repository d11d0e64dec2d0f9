//! Orchestration layer for artifact publishing
//!
//! This module provides the high-level publisher that sequences grouping,
//! metadata merging and uploading.

pub mod generic_publisher;

pub use generic_publisher::GenericPublisher;
