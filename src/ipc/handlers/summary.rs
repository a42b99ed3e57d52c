use crate::calc::{self, GoalOutcome, RecordRow};
use crate::client::Student;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

use super::students::student_json;

/// Fetch both feeds for one student and consolidate them. The summary feed
/// is authoritative for identity and the overall tallies; the details feed
/// contributes row-level columns and wins field collisions (it is the
/// later-merged, richer source). Either feed alone is enough to answer.
fn load_student(
    state: &AppState,
    req: &Request,
    roll_number: &str,
) -> Result<(Student, Option<calc::OverallTally>, Vec<RecordRow>), serde_json::Value> {
    let api = api_client(state, req)?;
    let summary = api.attendance_summary(roll_number);
    let details = api.attendance_details(roll_number);

    let (student, overall, summary_records, detail_records) = match (summary, details) {
        (Some(s), Some(d)) => (s.student, s.overall, s.records, d.records),
        (Some(s), None) => (s.student, s.overall, s.records, Vec::new()),
        (None, Some(d)) => (d.student, None, Vec::new(), d.records),
        (None, None) => {
            return Err(err(
                &req.id,
                "not_found",
                "Student not found or could not fetch attendance summary.",
                None,
            ))
        }
    };

    let records = calc::consolidate_records(&[&summary_records, &detail_records]);
    Ok((student, overall, records))
}

fn summary_json(summary: &calc::AttendanceSummary) -> serde_json::Value {
    let mut subjects = serde_json::Map::new();
    for subject in &summary.subjects {
        subjects.insert(
            subject.subject_code.clone(),
            json!({
                "totalClasses": subject.total_classes,
                "present": subject.present,
                "percentage": subject.percentage
            }),
        );
    }
    json!({
        "totalDays": summary.total_days,
        "presentDays": summary.present_days,
        "overallPercentage": summary.overall_percentage,
        "subjects": subjects
    })
}

fn records_json(records: &[RecordRow]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            obj.insert("date".to_string(), json!(row.date));
            for (subject, status) in &row.subjects {
                obj.insert(subject.clone(), json!(status));
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    json!(rows)
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| {
        let roll_number = required_str(req, "rollNumber")?;
        if roll_number.trim().is_empty() {
            return Err(err(&req.id, "bad_params", "rollNumber must not be empty", None));
        }
        let (student, overall, records) = load_student(state, req, &roll_number)?;
        let summary = calc::aggregate_summary(&records, overall);
        Ok(json!({
            "student": student_json(&student),
            "summary": summary_json(&summary),
            "attendanceRecords": records_json(&records)
        }))
    })();
    match result {
        Ok(value) => ok(&req.id, value),
        Err(resp) => resp,
    }
}

fn handle_goal(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| {
        let roll_number = required_str(req, "rollNumber")?;
        let target = req
            .params
            .get("targetPercent")
            .and_then(|v| v.as_f64())
            .ok_or_else(|| err(&req.id, "bad_params", "missing targetPercent", None))?;
        if !target.is_finite() || target <= 0.0 {
            return Err(err(
                &req.id,
                "bad_params",
                "targetPercent must be a positive number",
                None,
            ));
        }

        let (student, overall, records) = load_student(state, req, &roll_number)?;
        let summary = calc::aggregate_summary(&records, overall);
        let projections: Vec<serde_json::Value> = calc::project_goals(&summary.subjects, target)
            .iter()
            .zip(&summary.subjects)
            .map(|(projection, subject)| {
                let required = match projection.outcome {
                    GoalOutcome::Required(n) => json!(n),
                    GoalOutcome::Infeasible => serde_json::Value::Null,
                };
                json!({
                    "subjectCode": projection.subject_code,
                    "present": subject.present,
                    "totalClasses": subject.total_classes,
                    "currentPercentage": round2(projection.current_percentage),
                    "requiredClasses": required,
                    "infeasible": projection.outcome == GoalOutcome::Infeasible
                })
            })
            .collect();

        Ok(json!({
            "student": student_json(&student),
            "targetPercent": target,
            "subjects": projections
        }))
    })();
    match result {
        Ok(value) => ok(&req.id, value),
        Err(resp) => resp,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "summary.open" => Some(handle_open(state, req)),
        "summary.goal" => Some(handle_goal(state, req)),
        _ => None,
    }
}
