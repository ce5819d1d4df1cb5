//! Pure transforms from raw work item payloads to record models.
//!
//! The service returns work items as an envelope with a top-level `id` and
//! `url` plus a flat `fields` dictionary keyed by dotted field paths. The
//! parsers here map that shape onto [`WorkItem`] and [`TestCase`] through
//! the fixed table in [`crate::models::fields`]. Optional fields map to
//! `None` when absent; unknown extra fields are ignored; a payload missing
//! the mandatory `id` or `System.Title` is rejected with a validation error
//! naming the missing field. No other error kind ever originates here.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{TestCase, WorkItem, fields};

/// Conversion from a raw work item payload, implemented by both record
/// models. This is the seam that lets one generic client serve both kinds.
pub trait ParsePayload: Sized {
    fn parse(raw: &Value) -> Result<Self>;
}

impl ParsePayload for WorkItem {
    fn parse(raw: &Value) -> Result<Self> {
        parse_work_item(raw)
    }
}

impl ParsePayload for TestCase {
    fn parse(raw: &Value) -> Result<Self> {
        parse_test_case(raw)
    }
}

/// Parses a raw work item payload into a [`WorkItem`].
pub fn parse_work_item(raw: &Value) -> Result<WorkItem> {
    let id = require_id(raw)?;
    let title = require_title(raw)?;

    let item = WorkItem {
        id: Some(id),
        title,
        work_item_type: string_field(raw, fields::WORK_ITEM_TYPE).unwrap_or_default(),
        state: string_field(raw, fields::STATE).unwrap_or_default(),
        assigned_to: identity_field(raw, fields::ASSIGNED_TO),
        area_path: string_field(raw, fields::AREA_PATH),
        iteration_path: string_field(raw, fields::ITERATION_PATH),
        description: string_field(raw, fields::DESCRIPTION),
        created_date: date_field(raw, fields::CREATED_DATE),
        changed_date: date_field(raw, fields::CHANGED_DATE),
        tags: string_field(raw, fields::TAGS),
        url: raw.get("url").and_then(Value::as_str).map(str::to_string),
    };
    item.validate()?;
    Ok(item)
}

/// Parses a raw work item payload into a [`TestCase`].
pub fn parse_test_case(raw: &Value) -> Result<TestCase> {
    let test_case = TestCase {
        work_item: parse_work_item(raw)?,
        steps: string_field(raw, fields::TEST_STEPS),
        priority: field(raw, fields::PRIORITY)
            .and_then(Value::as_i64)
            .map(|p| p as i32),
        automation_status: string_field(raw, fields::AUTOMATION_STATUS),
    };
    Ok(test_case)
}

fn require_id(raw: &Value) -> Result<i32> {
    raw.get("id")
        .and_then(Value::as_i64)
        .map(|id| id as i32)
        .ok_or_else(|| Error::validation("work item payload is missing mandatory field: id"))
}

fn require_title(raw: &Value) -> Result<String> {
    string_field(raw, fields::TITLE).ok_or_else(|| {
        Error::validation(format!(
            "work item payload is missing mandatory field: {}",
            fields::TITLE
        ))
    })
}

fn field<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    raw.get("fields").and_then(|bag| bag.get(path))
}

fn string_field(raw: &Value, path: &str) -> Option<String> {
    field(raw, path).and_then(Value::as_str).map(str::to_string)
}

/// Identity fields arrive as either an object with a `displayName` or a
/// plain string, depending on API version.
fn identity_field(raw: &Value, path: &str) -> Option<String> {
    match field(raw, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj
            .get("displayName")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Timestamps the service emits are RFC 3339; anything else degrades to
/// `None` rather than failing the whole record.
fn date_field(raw: &Value, path: &str) -> Option<DateTime<Utc>> {
    field(raw, path)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
