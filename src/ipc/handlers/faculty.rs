use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use serde_json::json;

/// Static shared access code the faculty pages compare against. Not a
/// security boundary.
const FACULTY_ACCESS_CODE: &str = "Attend@IEC@ieccollege.com";

fn expected_code(state: &AppState) -> String {
    state
        .faculty_code
        .clone()
        .or_else(|| std::env::var("FACULTY_ACCESS_CODE").ok())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| FACULTY_ACCESS_CODE.to_string())
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let code = match required_str(req, "code") {
        Ok(code) => code,
        Err(resp) => return resp,
    };
    if code == expected_code(state) {
        ok(&req.id, json!({ "granted": true }))
    } else {
        err(
            &req.id,
            "access_denied",
            "The provided security code is incorrect.",
            None,
        )
    }
}

/// The Excel export is delegated to the Data Service; the sidecar only
/// builds the download URL for the shell to open.
fn handle_export_url(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| {
        let class_id = required_str(req, "classId")?;
        let date = match optional_str(req, "date") {
            Some(date) => {
                if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
                    return Err(err(&req.id, "bad_params", "date must be YYYY-MM-DD", None));
                }
                date
            }
            None => chrono::Local::now().format("%Y-%m-%d").to_string(),
        };
        let api = api_client(state, req)?;
        Ok(json!({
            "classId": class_id,
            "date": date,
            "url": api.day_excel_url(&class_id, &date)
        }))
    })();
    match result {
        Ok(value) => ok(&req.id, value),
        Err(resp) => resp,
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "faculty.login" => Some(handle_login(state, req)),
        "faculty.exportUrl" => Some(handle_export_url(state, req)),
        _ => None,
    }
}
