use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::calc::{OverallTally, RecordRow};
use crate::marking::AttendanceMark;

/// HTTP adapter for the remote attendance Data Service. This is the only
/// module that speaks the service's wire casing (`Roll_Number`,
/// `Class_Number`, ...); everything inland uses the canonical shapes.
///
/// Read paths degrade on upstream failure (empty roster / `None`) so the
/// caller can render a zero-state; write paths surface errors.
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub name: String,
    pub roll_number: String,
    pub class_number: String,
    pub mobile_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub name: String,
    pub class_number: String,
    pub roll_number: String,
    pub mobile_number: String,
}

/// The `attendance-summary` endpoint: identity, the service's own overall
/// tallies, and its record rows.
#[derive(Debug, Clone)]
pub struct SummaryFeed {
    pub student: Student,
    pub overall: Option<OverallTally>,
    pub records: Vec<RecordRow>,
}

/// The row-level `attendance` endpoint.
#[derive(Debug, Clone)]
pub struct DetailsFeed {
    pub student: Student,
    pub records: Vec<RecordRow>,
}

#[derive(Debug, Deserialize)]
struct StudentWire {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Roll_Number")]
    roll_number: String,
    #[serde(rename = "Class_Number", default)]
    class_number: String,
    #[serde(rename = "Mobile_Number", default)]
    mobile_number: String,
}

impl From<StudentWire> for Student {
    fn from(w: StudentWire) -> Self {
        Self {
            name: w.name,
            roll_number: w.roll_number,
            class_number: w.class_number,
            mobile_number: w.mobile_number,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OverallWire {
    #[serde(rename = "totalDays", default)]
    total_days: u32,
    #[serde(rename = "presentDays", default)]
    present_days: u32,
    #[serde(rename = "overallPercentage", default)]
    overall_percentage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SummaryFeedWire {
    student: StudentWire,
    #[serde(default)]
    summary: Option<OverallWire>,
    #[serde(rename = "attendanceRecords", default)]
    attendance_records: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct DetailsFeedWire {
    student: StudentWire,
    #[serde(rename = "attendanceRecords", default)]
    attendance_records: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Serialize)]
struct MarkingWire<'a> {
    #[serde(rename = "Roll_Number")]
    roll_number: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "Subject_Code")]
    subject_code: &'a str,
    #[serde(rename = "Class_Number")]
    class_number: &'a str,
}

#[derive(Serialize)]
struct NewStudentWire<'a> {
    name: &'a str,
    class: &'a str,
    roll_number: &'a str,
    mobile_number: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponseWire {
    #[serde(default)]
    students: Vec<StudentWire>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckWire {
    #[serde(default)]
    message: Option<String>,
}

/// Wire record rows are objects with a "Date" key plus arbitrary subject
/// columns. Rows without a usable date and non-string columns are skipped;
/// column order is kept as sent.
fn record_rows(rows: Vec<serde_json::Map<String, serde_json::Value>>) -> Vec<RecordRow> {
    let mut out = Vec::with_capacity(rows.len());
    for raw in rows {
        let Some(date) = raw.get("Date").and_then(|v| v.as_str()) else {
            log::warn!("dropping attendance record without a Date field");
            continue;
        };
        let mut row = RecordRow::new(date);
        for (key, value) in &raw {
            if key == "Date" {
                continue;
            }
            if let Some(status) = value.as_str() {
                row.set(key.clone(), status.to_string());
            }
        }
        out.push(row);
    }
    out
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /students/{class}`. Any upstream failure degrades to an empty
    /// roster; "no students" is the caller's judgement, not a transport one.
    pub fn students_by_class(&self, class_id: &str) -> Vec<Student> {
        if class_id.is_empty() {
            return Vec::new();
        }
        let url = format!("{}/students/{}", self.base_url, class_id);
        let resp = match self.http.get(&url).send() {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("roster fetch for class {class_id} failed: {e}");
                return Vec::new();
            }
        };
        if !resp.status().is_success() {
            log::warn!(
                "roster fetch for class {class_id} returned {}",
                resp.status()
            );
            return Vec::new();
        }
        match resp.json::<Vec<StudentWire>>() {
            Ok(students) => students.into_iter().map(Student::from).collect(),
            Err(e) => {
                log::warn!("roster for class {class_id} was not a student array: {e}");
                Vec::new()
            }
        }
    }

    /// `GET /students/{roll}/attendance-summary`. `None` on any upstream
    /// failure.
    pub fn attendance_summary(&self, roll_number: &str) -> Option<SummaryFeed> {
        let url = format!("{}/students/{}/attendance-summary", self.base_url, roll_number);
        let wire: SummaryFeedWire = self.fetch_json(&url, "attendance summary", roll_number)?;
        Some(SummaryFeed {
            student: wire.student.into(),
            overall: wire.summary.map(|s| OverallTally {
                total_days: s.total_days,
                present_days: s.present_days,
                overall_percentage: s.overall_percentage,
            }),
            records: record_rows(wire.attendance_records),
        })
    }

    /// `GET /students/{roll}/attendance`. `None` on any upstream failure.
    pub fn attendance_details(&self, roll_number: &str) -> Option<DetailsFeed> {
        let url = format!("{}/students/{}/attendance", self.base_url, roll_number);
        let wire: DetailsFeedWire = self.fetch_json(&url, "attendance details", roll_number)?;
        Some(DetailsFeed {
            student: wire.student.into(),
            records: record_rows(wire.attendance_records),
        })
    }

    fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
        roll_number: &str,
    ) -> Option<T> {
        let resp = match self.http.get(url).send() {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("{what} fetch for {roll_number} failed: {e}");
                return None;
            }
        };
        if !resp.status().is_success() {
            log::warn!("{what} fetch for {roll_number} returned {}", resp.status());
            return None;
        }
        match resp.json::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("{what} for {roll_number} had an unexpected shape: {e}");
                None
            }
        }
    }

    /// `POST /faculty/mark_attendance` with a validated batch. Returns the
    /// service acknowledgement message.
    pub fn mark_attendance(&self, marks: &[AttendanceMark]) -> anyhow::Result<String> {
        let payload: Vec<MarkingWire> = marks
            .iter()
            .map(|m| MarkingWire {
                roll_number: &m.roll_number,
                name: &m.name,
                status: m.status.as_str(),
                subject_code: &m.subject_code,
                class_number: &m.class_number,
            })
            .collect();

        let url = format!("{}/faculty/mark_attendance", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .context("mark attendance request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("mark attendance rejected with {status}: {body}"));
        }
        let ack: AckWire = resp.json().unwrap_or(AckWire { message: None });
        Ok(ack
            .message
            .unwrap_or_else(|| "Attendance marked successfully!".to_string()))
    }

    /// `POST /students` to register a new student.
    pub fn register_student(&self, new: &NewStudent) -> anyhow::Result<Student> {
        let url = format!("{}/students", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&NewStudentWire {
                name: &new.name,
                class: &new.class_number,
                roll_number: &new.roll_number,
                mobile_number: &new.mobile_number,
            })
            .send()
            .context("register student request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("register student rejected with {status}: {body}"));
        }
        let body: RegisterResponseWire = resp
            .json()
            .context("register student response was not json")?;
        body.students
            .into_iter()
            .next()
            .map(Student::from)
            .ok_or_else(|| {
                anyhow!(body
                    .message
                    .unwrap_or_else(|| "Failed to add student.".to_string()))
            })
    }

    /// The day export is delegated entirely to the Data Service; the sidecar
    /// only hands the URL back to the shell.
    pub fn day_excel_url(&self, class_id: &str, date: &str) -> String {
        format!("{}/faculty/dayExcel/{}?date={}", self.base_url, class_id, date)
    }
}
