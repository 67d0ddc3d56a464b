//! Defect dataset construction from a git history and a Jira-compatible
//! issue tracker.
//!
//! Tickets are linked to the commits that reference them, every ticket gets
//! Opening and Fix Versions resolved against the release timeline, and
//! missing Injected Versions are derived from affected versions or estimated
//! with the proportion method.

pub mod app;
pub mod cli;
pub mod config;
pub mod git;
pub mod linker;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod proportion;
pub mod resolver;
pub mod timeline;
pub mod tracker;
