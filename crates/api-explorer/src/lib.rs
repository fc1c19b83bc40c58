//! # api-explorer
//!
//! Browse the endpoints of an OpenAPI document (live or the built-in
//! Comlink catalog), inspect request and response schemas, and send test
//! requests from a terminal.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod history;
pub mod render;
pub mod session;
pub mod settings;

pub use catalog::{CatalogSource, EndpointCatalog};
pub use error::{ExplorerError, Result};
pub use executor::{build_url, ExecutedResponse, PreparedRequest, RequestExecutor, ResponseBody, TestRequest};
pub use history::{HistoryEntry, RequestHistory, HISTORY_LIMIT};
pub use session::{Command, Session};
pub use settings::{ExplorerSettings, SettingsOverrides};
