//! Library-level integration tests: public surface, construction, and the
//! wiring between settings, client, and tool layers.

use azdo_workitems::tools::{StoryTools, TestCaseTools};
use azdo_workitems::{Error, Settings, VERSION, WiqlQuery, WorkItemClient, parse_work_item};
use serde_json::json;

/// # Version Export
///
/// Tests that the library exposes its version.
///
/// ## Test Scenario
/// - Reads the VERSION constant
///
/// ## Expected Outcome
/// - A non-empty dotted version string
#[test]
fn test_version_export() {
    assert!(!VERSION.is_empty());
    assert!(VERSION.contains('.'));
}

/// # Client Construction From Settings
///
/// Tests the public construction path and the tool layers over it.
///
/// ## Test Scenario
/// - Builds a client from explicit settings, then both tool layers
///
/// ## Expected Outcome
/// - Construction succeeds; identity accessors echo the settings
#[test]
fn test_client_construction_from_settings() {
    let settings = Settings::new("contoso", "Widgets", "pat");
    let client = WorkItemClient::new(settings).unwrap();
    assert_eq!(client.organization(), "contoso");
    assert_eq!(client.project(), "Widgets");

    let _stories = StoryTools::new(client.clone());
    let _test_cases = TestCaseTools::new(client);
}

/// # Construction Rejects Missing Credential
///
/// Tests the fail-fast configuration error from the public surface.
///
/// ## Test Scenario
/// - Builds a client with a blank token
///
/// ## Expected Outcome
/// - A configuration error before any request is issued
#[test]
fn test_construction_rejects_missing_credential() {
    let err = WorkItemClient::new(Settings::new("contoso", "Widgets", " ")).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

/// # Public Parser And Query Surface
///
/// Tests that the parser and query builder compose from the crate root.
///
/// ## Test Scenario
/// - Builds a WIQL query and parses a minimal payload through the
///   re-exported functions
///
/// ## Expected Outcome
/// - Both succeed with the expected values
#[test]
fn test_public_parser_and_query_surface() {
    let query = WiqlQuery::for_type("Widgets", "User Story")
        .state("Active")
        .top(5)
        .build();
    assert!(query.contains("TOP 5"));
    assert!(query.contains("[System.State] = 'Active'"));

    let item = parse_work_item(&json!({
        "id": 1,
        "fields": { "System.Title": "Smoke" }
    }))
    .unwrap();
    assert_eq!(item.id, Some(1));
    assert_eq!(item.title, "Smoke");
}
