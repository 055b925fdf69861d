//! State module for tracking extraction progress
//!
//! Each adapter invocation moves through a fixed set of stages. The stage a
//! failure happened in is reported alongside the error, so a crawl summary can
//! tell a render timeout apart from a rejected write.
//!
//! # Components
//!
//! - `ExtractionState`: the stages of one invocation (idle, rendering, extracting, persisting, done, failed)
//! - `ExtractionProgress`: walks one invocation through those stages

mod extraction_state;

pub use extraction_state::{ExtractionProgress, ExtractionState};
