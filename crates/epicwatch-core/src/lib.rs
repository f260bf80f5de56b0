//! Core traits, types, and error handling for epicwatch.
//!
//! This crate provides the foundational abstractions used across all epicwatch
//! components: the EPIC update data model, the [`IssueSource`] trait that
//! fetching backends implement, configuration, and input validation.

pub mod config;
pub mod error;
pub mod input;
pub mod provider;
pub mod types;

pub use error::{Error, ParseError, Result};
pub use provider::IssueSource;
pub use types::{
    DateFilter, EpicCollection, EpicUpdateRecord, IssueFailure, IssueSummary, ParsedFields,
    RawComment, RepoRef,
};
