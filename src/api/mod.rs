//! Azure DevOps work item tracking API.
//!
//! Split into three layers: [`client`] owns the HTTP session and retry
//! policy, [`wiql`] renders id-selection queries, and [`parsers`] turns raw
//! payloads into record models. Only the client performs I/O.

pub mod client;
pub mod parsers;
pub mod wiql;

pub use client::WorkItemClient;
pub use parsers::{ParsePayload, parse_test_case, parse_work_item};
pub use wiql::WiqlQuery;
