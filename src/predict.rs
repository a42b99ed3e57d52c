use std::time::Duration;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use crate::client::Student;
use crate::marking::MarkStatus;

/// Adapter for the external prompt-driven prediction service. Its output is
/// advisory only: every suggestion is normalized with the same status rules
/// as human input before the faculty sheet ever sees it.
pub struct PredictClient {
    url: String,
    http: reqwest::blocking::Client,
}

/// A suggested default status for one student on the marking sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub roll_number: String,
    pub name: String,
    pub status: MarkStatus,
    pub confidence: f64,
}

#[derive(Serialize)]
struct RosterEntryWire<'a> {
    #[serde(rename = "studentId")]
    student_id: &'a str,
    #[serde(rename = "studentName")]
    student_name: &'a str,
}

#[derive(Serialize)]
struct PrepareRequestWire<'a> {
    #[serde(rename = "classRoster")]
    class_roster: Vec<RosterEntryWire<'a>>,
    #[serde(rename = "currentDate")]
    current_date: &'a str,
    #[serde(rename = "externalFactors", skip_serializing_if = "Option::is_none")]
    external_factors: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PredictionWire {
    #[serde(rename = "studentId")]
    student_id: String,
    #[serde(rename = "studentName", default)]
    student_name: String,
    #[serde(rename = "predictedStatus", default)]
    predicted_status: String,
    #[serde(default)]
    confidence: f64,
}

impl PredictClient {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            url: url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// `POST {url}/prepare-attendance` with the roster and the marking date.
    ///
    /// An unrecognized suggested status degrades to Present with confidence
    /// zero; suggestions are advisory input for the sheet, never rejected.
    /// Confidence is clamped to [0, 1].
    pub fn prepare(
        &self,
        roster: &[Student],
        current_date: &str,
        external_factors: Option<&str>,
    ) -> anyhow::Result<Vec<Suggestion>> {
        let request = PrepareRequestWire {
            class_roster: roster
                .iter()
                .map(|s| RosterEntryWire {
                    student_id: &s.roll_number,
                    student_name: &s.name,
                })
                .collect(),
            current_date,
            external_factors,
        };

        let url = format!("{}/prepare-attendance", self.url);
        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .context("prediction request failed")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("prediction service rejected with {status}: {body}"));
        }
        let predictions: Vec<PredictionWire> = resp
            .json()
            .context("prediction response was not a prediction array")?;

        Ok(predictions.into_iter().map(normalize).collect())
    }
}

fn normalize(wire: PredictionWire) -> Suggestion {
    let (status, confidence) = match MarkStatus::parse(&wire.predicted_status) {
        Some(status) => (status, clamp_confidence(wire.confidence)),
        None => {
            log::warn!(
                "prediction for {} had unrecognized status {:?}; defaulting to Present",
                wire.student_id,
                wire.predicted_status
            );
            (MarkStatus::Present, 0.0)
        }
    };
    Suggestion {
        roll_number: wire.student_id,
        name: wire.student_name,
        status,
        confidence,
    }
}

fn clamp_confidence(raw: f64) -> f64 {
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
