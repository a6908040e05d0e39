//! # Engine Module
//!
//! The stateful machinery the workflows are assembled from.
//!
//! - **Configuration** ([`config`]) - Pipeline settings, tool locations and build requests
//! - **Tool Invocation** ([`runner`]) - The [`runner::ToolRunner`] seam and its process-backed implementation
//! - **Tool Wrappers** ([`tools`]) - Argument construction and output checks per external program
//! - **State Tracking** ([`state`]) - Mapping and system-creation stages
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Tool, pipeline and workflow errors

pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
pub mod state;
pub mod tools;
