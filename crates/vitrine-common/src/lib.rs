//! Common utilities for the Vitrine page composer.
//!
//! This crate provides shared infrastructure used by all composer components:
//! - **Warning System** - deduplicated `tracing` warnings for content problems
//! - **URL joining** - absolutizing canonical document URLs against a site base

pub mod url;
pub mod warning;
