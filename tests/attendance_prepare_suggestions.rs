mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, Route, StubServer};

fn roster_route() -> Route {
    Route::get(
        "/students/2C",
        json!([
            { "Name": "Aarav Sharma", "Roll_Number": "2400101", "Class_Number": "2C", "Mobile_Number": "9876500011" },
            { "Name": "Diya Patel", "Roll_Number": "2400102", "Class_Number": "2C", "Mobile_Number": "9876500012" },
            { "Name": "Rohan Gupta", "Roll_Number": "2400103", "Class_Number": "2C", "Mobile_Number": "9876500013" }
        ]),
    )
}

#[test]
fn prepare_normalizes_suggested_statuses_like_any_other_input() {
    let stub = StubServer::start(vec![
        roster_route(),
        Route::post(
            "/prepare-attendance",
            json!([
                { "studentId": "2400101", "studentName": "Aarav Sharma", "predictedStatus": "PRESENT", "confidence": 0.92 },
                { "studentId": "2400102", "studentName": "Diya Patel", "predictedStatus": "late", "confidence": 0.8 },
                { "studentId": "2400103", "studentName": "Rohan Gupta", "predictedStatus": "absent", "confidence": 1.5 }
            ]),
        ),
    ]);

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "connect",
        "service.connect",
        json!({ "baseUrl": stub.base_url(), "predictUrl": stub.base_url() }),
    );

    let result = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.prepare",
        json!({ "classId": "2C", "externalFactors": "Public transport strike" }),
    );

    let date = result["date"].as_str().expect("date");
    assert_eq!(date.len(), 10);
    assert_eq!(&date[4..5], "-");

    let suggestions = result["suggestions"].as_array().expect("suggestions");
    assert_eq!(suggestions.len(), 3);

    assert_eq!(suggestions[0]["rollNumber"], "2400101");
    assert_eq!(suggestions[0]["suggestedStatus"], "Present");
    assert_eq!(suggestions[0]["confidence"], 0.92);

    // Unrecognized suggestion degrades to Present with zero confidence.
    assert_eq!(suggestions[1]["suggestedStatus"], "Present");
    assert_eq!(suggestions[1]["confidence"], 0.0);

    // Case folding and confidence clamping.
    assert_eq!(suggestions[2]["suggestedStatus"], "Absent");
    assert_eq!(suggestions[2]["confidence"], 1.0);

    // The roster and the external factors went out on the wire.
    let recorded = stub.recorded();
    let prepare = recorded
        .iter()
        .find(|r| r.method == "POST" && r.path == "/prepare-attendance")
        .expect("prediction request");
    let body: serde_json::Value = serde_json::from_str(&prepare.body).expect("json body");
    assert_eq!(body["externalFactors"], "Public transport strike");
    let wire_roster = body["classRoster"].as_array().expect("classRoster");
    assert_eq!(wire_roster.len(), 3);
    assert_eq!(wire_roster[0]["studentId"], "2400101");
    assert_eq!(wire_roster[0]["studentName"], "Aarav Sharma");
    assert_eq!(body["currentDate"], result["date"]);
}

#[test]
fn prepare_requires_a_configured_prediction_service() {
    let stub = StubServer::start(vec![roster_route()]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "connect",
        "service.connect",
        json!({ "baseUrl": stub.base_url() }),
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.prepare",
        json!({ "classId": "2C" }),
    );
    assert_eq!(error["code"], "not_connected");
}

#[test]
fn prepare_needs_a_roster_to_suggest_against() {
    let stub = StubServer::start(vec![Route::post("/prepare-attendance", json!([]))]);
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    request_ok(
        &mut stdin,
        &mut reader,
        "connect",
        "service.connect",
        json!({ "baseUrl": stub.base_url(), "predictUrl": stub.base_url() }),
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.prepare",
        json!({ "classId": "2C" }),
    );
    assert_eq!(error["code"], "not_found");
}
