//! EPIC update handling.
//!
//! - **Template matching**: tell genuine EPIC update comments apart from
//!   trigger comments and noise
//! - **Parsing**: reduce a matched comment to [`ParsedFields`]
//! - **Collection**: walk issues through an [`IssueSource`] and gather the
//!   parsed updates into an [`EpicCollection`], either for given issue
//!   numbers or for every issue a repository updated in a date window
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use epicwatch_epic::{CollectRequest, EpicCollector};
//! use epicwatch_github::GitHubClient;
//!
//! let source = Arc::new(GitHubClient::new(token)?);
//! let collection = EpicCollector::new(source)
//!     .collect(&CollectRequest {
//!         repo: "LDFLK/launch".parse()?,
//!         issue_numbers: vec![151, 152],
//!         filter: DateFilter::On("2025-08-07".into()),
//!     })
//!     .await;
//! ```
//!
//! [`ParsedFields`]: epicwatch_core::ParsedFields
//! [`IssueSource`]: epicwatch_core::IssueSource
//! [`EpicCollection`]: epicwatch_core::EpicCollection

pub mod collector;
pub mod parser;
pub mod template;

pub use collector::{CollectRequest, CrawlRequest, EpicCollector};
pub use parser::{normalize_date, parse_epic_update};
pub use template::{is_epic_update, TemplateMatcher, DEFAULT_MIN_BODY_LEN};
