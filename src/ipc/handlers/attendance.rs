use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, optional_str, required_str};
use crate::ipc::types::{AppState, Request};
use crate::marking::{self, MarkingPolicy, RawMarking};
use serde_json::json;

fn parse_entries(req: &Request) -> Result<Vec<serde_json::Value>, serde_json::Value> {
    let entries = req
        .params
        .get("entries")
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or_else(|| err(&req.id, "bad_params", "missing entries", None))?;
    if entries.is_empty() {
        return Err(err(
            &req.id,
            "bad_params",
            "entries must be a non-empty array",
            None,
        ));
    }
    Ok(entries)
}

fn entry_str(entry: &serde_json::Value, key: &str) -> String {
    entry
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Validate, normalize, and submit a marking batch. The whole batch is
/// rejected before any upstream call when one entry fails validation.
/// `requireSubject` defaults to the subject-level workflow; the AI-prepared
/// class sheet passes `false`.
fn handle_mark(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| {
        let class_id = required_str(req, "classId")?;
        let subject_code = optional_str(req, "subjectCode").unwrap_or_default();
        let require_subject = req
            .params
            .get("requireSubject")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let entries = parse_entries(req)?;

        let batch: Vec<RawMarking> = entries
            .iter()
            .map(|entry| RawMarking {
                roll_number: entry_str(entry, "rollNumber"),
                name: entry_str(entry, "name"),
                status: entry_str(entry, "status"),
                subject_code: subject_code.clone(),
                class_number: class_id.clone(),
            })
            .collect();

        let marks = marking::validate_batch(&batch, MarkingPolicy { require_subject })
            .map_err(|e| err(&req.id, "validation_failed", e.message, e.details))?;

        let api = api_client(state, req)?;
        match api.mark_attendance(&marks) {
            Ok(message) => Ok(json!({
                "submitted": marks.len(),
                "message": message
            })),
            Err(e) => Err(err(&req.id, "upstream_failed", format!("{e:#}"), None)),
        }
    })();
    match result {
        Ok(value) => ok(&req.id, value),
        Err(resp) => resp,
    }
}

/// Build the suggested marking sheet for a class from the external
/// prediction service. Suggestions are defaults for the faculty to review,
/// nothing is submitted here.
fn handle_prepare(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| {
        let class_id = required_str(req, "classId")?;
        let external_factors = optional_str(req, "externalFactors");
        let api = api_client(state, req)?;
        let Some(predictor) = state.predictor.as_ref() else {
            return Err(err(
                &req.id,
                "not_connected",
                "connect a prediction service first",
                None,
            ));
        };

        let roster = api.students_by_class(&class_id);
        if roster.is_empty() {
            return Err(err(
                &req.id,
                "not_found",
                "No students found for this class.",
                None,
            ));
        }

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let suggestions = predictor
            .prepare(&roster, &today, external_factors.as_deref())
            .map_err(|e| err(&req.id, "upstream_failed", format!("{e:#}"), None))?;

        Ok(json!({
            "classId": class_id,
            "date": today,
            "suggestions": suggestions
                .iter()
                .map(|s| json!({
                    "rollNumber": s.roll_number,
                    "name": s.name,
                    "suggestedStatus": s.status.as_str(),
                    "confidence": s.confidence
                }))
                .collect::<Vec<_>>()
        }))
    })();
    match result {
        Ok(value) => ok(&req.id, value),
        Err(resp) => resp,
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.mark" => Some(handle_mark(state, req)),
        "attendance.prepare" => Some(handle_prepare(state, req)),
        _ => None,
    }
}
