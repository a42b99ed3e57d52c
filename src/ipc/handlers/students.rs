use crate::client::{NewStudent, Student};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{api_client, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

pub fn student_json(student: &Student) -> serde_json::Value {
    json!({
        "name": student.name,
        "rollNumber": student.roll_number,
        "classNumber": student.class_number,
        "mobileNumber": student.mobile_number
    })
}

fn handle_list_by_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| {
        let class_id = required_str(req, "classId")?;
        let api = api_client(state, req)?;
        let students = api.students_by_class(&class_id);
        if students.is_empty() {
            return Err(err(
                &req.id,
                "not_found",
                "No students found for this class.",
                None,
            ));
        }
        Ok(json!({
            "classId": class_id,
            "students": students.iter().map(student_json).collect::<Vec<_>>()
        }))
    })();
    match result {
        Ok(value) => ok(&req.id, value),
        Err(resp) => resp,
    }
}

fn handle_register(state: &mut AppState, req: &Request) -> serde_json::Value {
    let result = (|| {
        let new = NewStudent {
            name: required_str(req, "name")?,
            class_number: required_str(req, "classNumber")?,
            roll_number: required_str(req, "rollNumber")?,
            mobile_number: required_str(req, "mobileNumber")?,
        };
        let api = api_client(state, req)?;
        match api.register_student(&new) {
            Ok(student) => Ok(json!({ "student": student_json(&student) })),
            Err(e) => Err(err(&req.id, "upstream_failed", format!("{e:#}"), None)),
        }
    })();
    match result {
        Ok(value) => ok(&req.id, value),
        Err(resp) => resp,
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.listByClass" => Some(handle_list_by_class(state, req)),
        "students.register" => Some(handle_register(state, req)),
        _ => None,
    }
}
