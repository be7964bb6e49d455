//! Build-time generator for strongly-typed analytics tracking bindings.
//!
//! Event schemas (YAML or JSON) are loaded, their base parameter groups
//! resolved and merged, and two Kotlin sources are emitted: an abstract API
//! with one method per event and an implementation that forwards every call
//! to the registered trackers supporting the event's platforms.
pub mod cli;
pub mod codegen;
pub mod config;
pub mod definition;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod ir;
pub mod loader;
pub mod lower;
pub mod merge;
pub mod output;
pub mod path_de;
pub mod pipeline;
pub mod resolve;

pub use error::{GenError, Result};
