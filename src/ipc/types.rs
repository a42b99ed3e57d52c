use serde::Deserialize;

use crate::client::ApiClient;
use crate::predict::PredictClient;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Per-process session state. Nothing here persists: the sidecar holds the
/// connected service clients and the faculty code override, all primed by
/// `service.connect`.
pub struct AppState {
    pub api: Option<ApiClient>,
    pub predictor: Option<PredictClient>,
    pub faculty_code: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api: None,
            predictor: None,
            faculty_code: None,
        }
    }
}
