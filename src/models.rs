//! Record models for Azure DevOps work items.
//!
//! Two related shapes are modeled: [`WorkItem`] (the generic tracked record)
//! and [`TestCase`] (a work item carrying test-specific fields). Both are
//! short-lived values: every client call produces fresh instances from the
//! service payload, with no caching or cross-call aliasing.
//!
//! The models carry shape validation only — non-empty title, positive id
//! when present — and perform no I/O.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};

/// Service field paths for the work item tracking "fields" bag.
///
/// The remote payload is a flat dictionary keyed by these dotted names; the
/// parsers map them onto model attributes through this fixed table rather
/// than dynamic attribute assignment, so additions to the service schema are
/// ignored instead of breaking the client.
pub mod fields {
    pub const TITLE: &str = "System.Title";
    pub const WORK_ITEM_TYPE: &str = "System.WorkItemType";
    pub const STATE: &str = "System.State";
    pub const ASSIGNED_TO: &str = "System.AssignedTo";
    pub const AREA_PATH: &str = "System.AreaPath";
    pub const ITERATION_PATH: &str = "System.IterationPath";
    pub const DESCRIPTION: &str = "System.Description";
    pub const CREATED_DATE: &str = "System.CreatedDate";
    pub const CHANGED_DATE: &str = "System.ChangedDate";
    pub const TAGS: &str = "System.Tags";
    pub const STORY_POINTS: &str = "Microsoft.VSTS.Scheduling.StoryPoints";
    pub const TEST_STEPS: &str = "Microsoft.VSTS.TCM.Steps";
    pub const PRIORITY: &str = "Microsoft.VSTS.Common.Priority";
    pub const AUTOMATION_STATUS: &str = "Microsoft.VSTS.TCM.AutomationStatus";
}

/// Mapping of service field path to new value, as sent in update and create
/// requests. Ordered so patch documents are deterministic.
pub type FieldUpdates = BTreeMap<String, serde_json::Value>;

/// A tracked unit of work (user story, task, etc.).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItem {
    /// Stable identity assigned by the service. `None` only for a record
    /// that has not been persisted yet; immutable once assigned.
    pub id: Option<i32>,
    /// Work item title. Never empty.
    pub title: String,
    /// Type discriminator, e.g. "User Story" or "Test Case".
    pub work_item_type: String,
    /// Current state from the service-defined vocabulary.
    pub state: String,
    /// Display name of the assignee, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// Backslash-delimited area path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_path: Option<String>,
    /// Backslash-delimited iteration path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_date: Option<DateTime<Utc>>,
    /// Semicolon-separated tags string, as the service stores it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Canonical resource link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl WorkItem {
    /// Checks the shape invariants: non-empty title and, when present, a
    /// positive id.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::validation("work item title must not be empty"));
        }
        if let Some(id) = self.id
            && id <= 0
        {
            return Err(Error::validation(format!(
                "work item id must be positive, got {id}"
            )));
        }
        Ok(())
    }
}

/// A test case: a work item with test-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    /// The underlying work item record.
    #[serde(flatten)]
    pub work_item: WorkItem,
    /// Test steps in the service's HTML-ish micro-format, kept raw.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
    /// Priority 1-4, where 1 is highest. Absent means low significance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    /// Automation status, e.g. "Automated" / "Not Automated" / "Planned".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_status: Option<String>,
}

impl TestCase {
    /// Checks the shape invariants of the underlying work item.
    pub fn validate(&self) -> Result<()> {
        self.work_item.validate()
    }

    /// Stable identity, when persisted.
    pub fn id(&self) -> Option<i32> {
        self.work_item.id
    }
}
