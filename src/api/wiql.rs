//! WIQL query construction.
//!
//! The client never concatenates caller input into query syntax directly;
//! every value is inserted as an escaped string literal through
//! [`WiqlQuery`], which covers the fixed filter vocabulary the client
//! supports: work item type, title substring, and exact state.

use crate::models::fields;

/// Builder for the WIQL id-selection query used by the listing and search
/// operations.
///
/// Produces `SELECT TOP n [System.Id]` queries scoped to one project and one
/// work item type, ordered by last change (newest first) to match the
/// service's listing behavior.
#[derive(Debug, Clone)]
pub struct WiqlQuery {
    project: String,
    item_type: String,
    title_contains: Option<String>,
    state: Option<String>,
    top: usize,
}

impl WiqlQuery {
    /// Starts a query for all items of `item_type` in `project`.
    pub fn for_type(project: impl Into<String>, item_type: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            item_type: item_type.into(),
            title_contains: None,
            state: None,
            top: 100,
        }
    }

    /// Adds a substring predicate on the title field. The term is treated as
    /// a literal operand, never as query syntax.
    #[must_use]
    pub fn title_contains(mut self, term: impl Into<String>) -> Self {
        self.title_contains = Some(term.into());
        self
    }

    /// Adds an exact-match predicate on the state field.
    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Caps the number of ids the query returns.
    #[must_use]
    pub fn top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// Renders the query text.
    pub fn build(&self) -> String {
        let mut query = format!(
            "SELECT TOP {top} [System.Id] FROM WorkItems \
             WHERE [System.TeamProject] = '{project}' \
             AND [{type_field}] = '{item_type}'",
            top = self.top,
            project = escape_literal(&self.project),
            type_field = fields::WORK_ITEM_TYPE,
            item_type = escape_literal(&self.item_type),
        );

        if let Some(term) = &self.title_contains {
            query.push_str(&format!(
                " AND [{}] CONTAINS '{}'",
                fields::TITLE,
                escape_literal(term)
            ));
        }
        if let Some(state) = &self.state {
            query.push_str(&format!(
                " AND [{}] = '{}'",
                fields::STATE,
                escape_literal(state)
            ));
        }

        query.push_str(&format!(" ORDER BY [{}] DESC", fields::CHANGED_DATE));
        query
    }
}

/// Escapes a string literal for embedding in WIQL: single quotes double up,
/// the only escaping the language defines.
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
