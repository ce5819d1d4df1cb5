//! Per-kind convenience layers over the generic client.
//!
//! [`StoryTools`] and [`TestCaseTools`] bind the generic client operations to
//! one work item kind each, clamp caller-supplied limits, shape update and
//! create arguments into field maps, and enforce kind-specific rules (the
//! test case type guard, the "Design" default state). No retry or query
//! logic lives here; everything funnels through
//! [`WorkItemClient`](crate::WorkItemClient).

pub mod stories;
pub mod test_cases;

pub use stories::{StoryDraft, StoryTools, StoryUpdate};
pub use test_cases::{TestCaseDraft, TestCaseTools, TestCaseUpdate};

/// Upper bound for listing and state-filter operations.
pub const MAX_LIST_LIMIT: usize = 200;
/// Upper bound for title search operations.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Clamps a caller-supplied limit into 1..=max. Zero becomes one; excess is
/// capped rather than rejected.
pub(crate) fn clamp_limit(limit: usize, max: usize) -> usize {
    limit.clamp(1, max)
}
