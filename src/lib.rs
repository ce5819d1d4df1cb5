//! # Azure DevOps Work Item Client
//!
//! A client library for the Azure DevOps work item tracking REST API,
//! focused on user stories and test cases. This library provides:
//!
//! - Authenticated HTTPS access with retry and exponential backoff
//! - WIQL query construction for listing, search, and state filtering
//! - Typed work item and test case models parsed from raw payloads
//! - Update and create operations via JSON-patch documents
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use azdo_workitems::{Settings, WorkItemClient, WorkItem};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a client (or use Settings::from_env())
//! let settings = Settings::new("my-org", "my-project", "my-pat");
//! let client = WorkItemClient::new(settings)?;
//!
//! // Fetch the 25 most recently changed user stories
//! let stories: Vec<WorkItem> = client.get_work_items("User Story", 25).await?;
//! println!("Found {} stories", stories.len());
//! # Ok(())
//! # }
//! ```
//!
//! The [`tools`] module layers kind-specific operations (limit clamping,
//! type guards, create defaults) over the generic client.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod tools;

// Re-export commonly used types for convenience
pub use api::{ParsePayload, WiqlQuery, WorkItemClient, parse_test_case, parse_work_item};
pub use config::Settings;
pub use error::{Error, Result};
pub use models::{FieldUpdates, TestCase, WorkItem};
pub use tools::{StoryTools, TestCaseTools};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
