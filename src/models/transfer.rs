//! Bulk operations and import/export payloads shared by every entity

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// `{ "ids": [...] }` body of every bulk-delete endpoint
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkDeleteResult {
    pub deleted: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    pub format: Option<ExportFormat>,
}

/// Failure of a single CSV row; `row` is 1-based and excludes the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportRowError {
    pub row: usize,
    pub message: String,
}

/// Outcome of a best-effort CSV import
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    pub fn record_success(&mut self) {
        self.imported += 1;
    }

    pub fn record_failure(&mut self, row: usize, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(ImportRowError {
            row,
            message: message.into(),
        });
    }
}
