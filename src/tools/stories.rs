//! User story operations.

use serde_json::json;
use tracing::debug;

use super::{MAX_LIST_LIMIT, MAX_SEARCH_LIMIT, clamp_limit};
use crate::api::WorkItemClient;
use crate::error::{Error, Result};
use crate::models::{FieldUpdates, WorkItem, fields};

/// Work item type discriminator for user stories.
pub const USER_STORY_TYPE: &str = "User Story";

/// Field changes for [`StoryTools::update_user_story`]. Unset fields are
/// left untouched on the service.
#[derive(Debug, Clone, Default)]
pub struct StoryUpdate {
    pub title: Option<String>,
    pub state: Option<String>,
    pub assigned_to: Option<String>,
    pub description: Option<String>,
    /// Priority 1-4, where 1 is highest.
    pub priority: Option<i32>,
    pub story_points: Option<i32>,
    /// Semicolon-separated tags string.
    pub tags: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
}

impl StoryUpdate {
    /// Maps the set fields onto service field paths.
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
        if let Some(v) = self.priority {
            updates.insert(fields::PRIORITY.to_string(), json!(v));
        }
        if let Some(v) = self.story_points {
            updates.insert(fields::STORY_POINTS.to_string(), json!(v));
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

/// Initial fields for [`StoryTools::create_user_story`]. Only the title is
/// mandatory; an unset state defaults to "New".
#[derive(Debug, Clone, Default)]
pub struct StoryDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub story_points: Option<i32>,
    pub assigned_to: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    pub tags: Option<String>,
    pub state: Option<String>,
}

impl StoryDraft {
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
            json!(self.state.unwrap_or_else(|| "New".to_string())),
        );
        if let Some(v) = self.description {
            updates.insert(fields::DESCRIPTION.to_string(), json!(v));
        }
        if let Some(v) = self.priority {
            updates.insert(fields::PRIORITY.to_string(), json!(v));
        }
        if let Some(v) = self.story_points {
            updates.insert(fields::STORY_POINTS.to_string(), json!(v));
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
        if let Some(v) = self.tags {
            updates.insert(fields::TAGS.to_string(), json!(v));
        }
        updates
    }
}

/// User story operations over a shared [`WorkItemClient`].
#[derive(Clone)]
pub struct StoryTools {
    client: WorkItemClient,
}

impl StoryTools {
    pub fn new(client: WorkItemClient) -> Self {
        Self { client }
    }

    /// Lists the most recently changed user stories, up to `limit`
    /// (clamped to 1..=200).
    pub async fn get_user_stories(&self, limit: usize) -> Result<Vec<WorkItem>> {
        let limit = clamp_limit(limit, MAX_LIST_LIMIT);
        self.client.get_work_items(USER_STORY_TYPE, limit).await
    }

    /// Fetches one user story by id. A missing id is a not-found error; a
    /// work item of another type is a validation error naming that type.
    pub async fn get_story_details(&self, id: i32) -> Result<WorkItem> {
        let item: WorkItem = self.client.get_work_item_by_id(id).await?;
        ensure_story(id, &item)?;
        Ok(item)
    }

    /// Searches user stories whose title contains `term`, up to `limit`
    /// (clamped to 1..=100).
    pub async fn search_stories_by_title(
        &self,
        term: &str,
        limit: usize,
    ) -> Result<Vec<WorkItem>> {
        let limit = clamp_limit(limit, MAX_SEARCH_LIMIT);
        self.client
            .search_work_items_by_title(USER_STORY_TYPE, term, limit)
            .await
    }

    /// Lists user stories in an exact state, up to `limit` (clamped to
    /// 1..=200).
    pub async fn get_stories_by_state(&self, state: &str, limit: usize) -> Result<Vec<WorkItem>> {
        let limit = clamp_limit(limit, MAX_LIST_LIMIT);
        self.client
            .get_work_items_by_state(USER_STORY_TYPE, state, limit)
            .await
    }

    /// Applies the set fields of `update` to an existing user story and
    /// returns the story as confirmed by the service.
    ///
    /// The item is fetched first to verify it exists and is a user story;
    /// an update with no fields set is a validation error.
    pub async fn update_user_story(&self, id: i32, update: StoryUpdate) -> Result<WorkItem> {
        let existing: WorkItem = self.client.get_work_item_by_id(id).await?;
        ensure_story(id, &existing)?;

        let updates = update.into_field_updates();
        if updates.is_empty() {
            return Err(Error::validation(
                "no fields provided for update; set at least one field",
            ));
        }
        debug!(id, fields = updates.len(), "updating user story");
        self.client.update_work_item(id, &updates).await
    }

    /// Creates a user story from the draft and returns it with its new id.
    pub async fn create_user_story(&self, draft: StoryDraft) -> Result<WorkItem> {
        let updates = draft.into_field_updates();
        debug!("creating user story");
        self.client.create_work_item(USER_STORY_TYPE, &updates).await
    }
}

fn ensure_story(id: i32, item: &WorkItem) -> Result<()> {
    if item.work_item_type != USER_STORY_TYPE {
        return Err(Error::validation(format!(
            "work item {id} is not a user story (it's a {})",
            item.work_item_type
        )));
    }
    Ok(())
}
