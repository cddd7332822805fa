//! Public request/response DTOs for the HTTP API (serde ready).
//! Persisted domain types are returned as-is; only envelopes live here.

use serde::{Deserialize, Serialize};

use crate::domain::{SetupField, Toast};

/// PUT /api/v1/setup: one field at a time, like the setup form edits it.
#[derive(Debug, Deserialize)]
pub struct SetupUpdateIn {
    pub field: SetupField,
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateAdminIn {
    #[serde(rename = "typeId")]
    pub type_id: String,
}

#[derive(Serialize)]
pub struct OutlineOut {
    pub outline: String,
}

#[derive(Serialize)]
pub struct StatusOut {
    #[serde(rename = "isLoading")]
    pub is_loading: bool,
    pub toasts: Vec<Toast>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOut {
    pub documents: usize,
    pub questions: usize,
    pub admin_documents: usize,
    pub setup_complete: bool,
}

#[derive(Serialize)]
pub struct ClearedOut {
    pub removed: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub model: Option<String>,
}
