//! Test case operations.
//!
//! Same shape as the story layer, with two kind-specific rules: detail and
//! update operations verify the addressed work item really is a test case,
//! and creation defaults the state to "Design" (the entry state of the test
//! case workflow).

use serde_json::json;
use tracing::debug;

use super::{MAX_LIST_LIMIT, MAX_SEARCH_LIMIT, clamp_limit};
use crate::api::WorkItemClient;
use crate::error::{Error, Result};
use crate::models::{FieldUpdates, TestCase, fields};

/// Work item type discriminator for test cases.
pub const TEST_CASE_TYPE: &str = "Test Case";

/// Field changes for [`TestCaseTools::update_test_case`]. Unset fields are
/// left untouched on the service.
#[derive(Debug, Clone, Default)]
pub struct TestCaseUpdate {
    pub title: Option<String>,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
    pub description: Option<String>,
    /// Steps in the service's HTML-ish micro-format, passed through raw.
    pub test_steps: Option<String>,
    /// Priority 1-4, where 1 is highest.
    pub priority: Option<i32>,
    /// "Automated", "Not Automated", or "Planned".
    pub automation_status: Option<String>,
    /// Semicolon-separated tags string.
    pub tags: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
}

impl TestCaseUpdate {
    fn into_field_updates(self) -> FieldUpdates {
        let mut updates = FieldUpdates::new();
        if let Some(v) = self.title {
            updates.insert(fields::TITLE.to_string(), json!(v));
        }
        if let Some(v) = self.state {
            updates.insert(fields::STATE.to_string(), json!(v));
        }
        if let Some(v) = self.assigned_to {
            updates.insert(fields::ASSIGNED_TO.to_string(), json!(v));
        }
        if let Some(v) = self.description {
            updates.insert(fields::DESCRIPTION.to_string(), json!(v));
        }
        if let Some(v) = self.test_steps {
            updates.insert(fields::TEST_STEPS.to_string(), json!(v));
        }
        if let Some(v) = self.priority {
            updates.insert(fields::PRIORITY.to_string(), json!(v));
        }
        if let Some(v) = self.automation_status {
            updates.insert(fields::AUTOMATION_STATUS.to_string(), json!(v));
        }
        if let Some(v) = self.tags {
            updates.insert(fields::TAGS.to_string(), json!(v));
        }
        if let Some(v) = self.area_path {
            updates.insert(fields::AREA_PATH.to_string(), json!(v));
        }
        if let Some(v) = self.iteration_path {
            updates.insert(fields::ITERATION_PATH.to_string(), json!(v));
        }
        updates
    }
}

/// Initial fields for [`TestCaseTools::create_test_case`]. Only the title is
/// mandatory; an unset state defaults to "Design".
#[derive(Debug, Clone, Default)]
pub struct TestCaseDraft {
    pub title: String,
    pub description: Option<String>,
    pub test_steps: Option<String>,
    pub priority: Option<i32>,
    pub assigned_to: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    pub automation_status: Option<String>,
    pub tags: Option<String>,
    pub state: Option<String>,
}

impl TestCaseDraft {
    /// Starts a draft with the mandatory title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    fn into_field_updates(self) -> FieldUpdates {
        let mut updates = FieldUpdates::new();
        updates.insert(fields::TITLE.to_string(), json!(self.title));
        updates.insert(
            fields::STATE.to_string(),
            json!(self.state.unwrap_or_else(|| "Design".to_string())),
        );
        if let Some(v) = self.description {
            updates.insert(fields::DESCRIPTION.to_string(), json!(v));
        }
        if let Some(v) = self.test_steps {
            updates.insert(fields::TEST_STEPS.to_string(), json!(v));
        }
        if let Some(v) = self.priority {
            updates.insert(fields::PRIORITY.to_string(), json!(v));
        }
        if let Some(v) = self.assigned_to {
            updates.insert(fields::ASSIGNED_TO.to_string(), json!(v));
        }
        if let Some(v) = self.area_path {
            updates.insert(fields::AREA_PATH.to_string(), json!(v));
        }
        if let Some(v) = self.iteration_path {
            updates.insert(fields::ITERATION_PATH.to_string(), json!(v));
        }
        if let Some(v) = self.automation_status {
            updates.insert(fields::AUTOMATION_STATUS.to_string(), json!(v));
        }
        if let Some(v) = self.tags {
            updates.insert(fields::TAGS.to_string(), json!(v));
        }
        updates
    }
}

/// Test case operations over a shared [`WorkItemClient`].
#[derive(Clone)]
pub struct TestCaseTools {
    client: WorkItemClient,
}

impl TestCaseTools {
    pub fn new(client: WorkItemClient) -> Self {
        Self { client }
    }

    /// Lists the most recently changed test cases, up to `limit` (clamped
    /// to 1..=200).
    pub async fn get_test_cases(&self, limit: usize) -> Result<Vec<TestCase>> {
        let limit = clamp_limit(limit, MAX_LIST_LIMIT);
        self.client.get_work_items(TEST_CASE_TYPE, limit).await
    }

    /// Fetches one test case by id. A missing id is a not-found error; a
    /// work item of another type is a validation error naming that type.
    pub async fn get_test_case_details(&self, id: i32) -> Result<TestCase> {
        let test_case: TestCase = self.client.get_work_item_by_id(id).await?;
        ensure_test_case(id, &test_case)?;
        Ok(test_case)
    }

    /// Searches test cases whose title contains `term`, up to `limit`
    /// (clamped to 1..=100).
    pub async fn search_test_cases_by_title(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<TestCase>> {
        let limit = clamp_limit(limit, MAX_SEARCH_LIMIT);
        self.client
            .search_work_items_by_title(TEST_CASE_TYPE, term, limit)
            .await
    }

    /// Lists test cases in an exact state, up to `limit` (clamped to
    /// 1..=200).
    pub async fn get_test_cases_by_state(
        &self,
        state: &str,
        limit: usize,
    ) -> Result<Vec<TestCase>> {
        let limit = clamp_limit(limit, MAX_LIST_LIMIT);
        self.client
            .get_work_items_by_state(TEST_CASE_TYPE, state, limit)
            .await
    }

    /// Applies the set fields of `update` to an existing test case and
    /// returns the test case as confirmed by the service.
    ///
    /// The item is fetched first to verify it exists and is a test case;
    /// an update with no fields set is a validation error.
    pub async fn update_test_case(&self, id: i32, update: TestCaseUpdate) -> Result<TestCase> {
        let existing: TestCase = self.client.get_work_item_by_id(id).await?;
        ensure_test_case(id, &existing)?;

        let updates = update.into_field_updates();
        if updates.is_empty() {
            return Err(Error::validation(
                "no fields provided for update; set at least one field",
            ));
        }
        debug!(id, fields = updates.len(), "updating test case");
        self.client.update_work_item(id, &updates).await
    }

    /// Creates a test case from the draft and returns it with its new id.
    pub async fn create_test_case(&self, draft: TestCaseDraft) -> Result<TestCase> {
        let updates = draft.into_field_updates();
        debug!("creating test case");
        self.client.create_work_item(TEST_CASE_TYPE, &updates).await
    }
}

fn ensure_test_case(id: i32, test_case: &TestCase) -> Result<()> {
    if test_case.work_item.work_item_type != TEST_CASE_TYPE {
        return Err(Error::validation(format!(
            "work item {id} is not a test case (it's a {})",
            test_case.work_item.work_item_type
        )));
    }
    Ok(())
}
