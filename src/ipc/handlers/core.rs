use crate::client::ApiClient;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::optional_str;
use crate::ipc::types::{AppState, Request};
use crate::predict::PredictClient;
use serde_json::json;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "baseUrl": state.api.as_ref().map(|a| a.base_url().to_string()),
            "predictorConfigured": state.predictor.is_some()
        }),
    )
}

/// Prime the session: the Data Service base URL is required (param or
/// `API_BASE_URL`), the prediction endpoint and faculty code are optional
/// (`PREDICT_API_URL`, `FACULTY_ACCESS_CODE`).
fn handle_service_connect(state: &mut AppState, req: &Request) -> serde_json::Value {
    let base_url = optional_str(req, "baseUrl").or_else(|| env_var("API_BASE_URL"));
    let Some(base_url) = base_url else {
        return err(
            &req.id,
            "bad_params",
            "missing params.baseUrl and API_BASE_URL is unset",
            None,
        );
    };

    let api = match ApiClient::new(&base_url) {
        Ok(api) => api,
        Err(e) => return err(&req.id, "connect_failed", format!("{e:?}"), None),
    };

    let predict_url = optional_str(req, "predictUrl").or_else(|| env_var("PREDICT_API_URL"));
    let predictor = match predict_url {
        Some(url) => match PredictClient::new(&url) {
            Ok(client) => Some(client),
            Err(e) => return err(&req.id, "connect_failed", format!("{e:?}"), None),
        },
        None => None,
    };

    if let Some(code) = optional_str(req, "facultyCode").or_else(|| env_var("FACULTY_ACCESS_CODE"))
    {
        state.faculty_code = Some(code);
    }

    let base = api.base_url().to_string();
    let predictor_configured = predictor.is_some();
    state.api = Some(api);
    state.predictor = predictor;
    log::info!("connected to attendance service at {base}");

    ok(
        &req.id,
        json!({
            "baseUrl": base,
            "predictorConfigured": predictor_configured
        }),
    )
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "service.connect" => Some(handle_service_connect(state, req)),
        _ => None,
    }
}
