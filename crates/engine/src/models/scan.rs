use serde::{Deserialize, Serialize};

/// A pending proposal to analyze a job page. At most one live request exists
/// at a time; created by the tab monitor, consumed (cleared) once acted upon
/// or dismissed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoScanRequest {
    pub tab_id: i64,
    pub url: String,
    pub site_name: String,
    /// Epoch milliseconds. Consumers track the last processed timestamp to
    /// drop duplicate change notifications.
    pub timestamp: i64,
}
