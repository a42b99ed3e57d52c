use serde::Serialize;

/// Canonical attendance status for a marking submission. Input parsing is
/// ASCII case-insensitive; output casing is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkStatus {
    Present,
    Absent,
}

impl MarkStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Some(Self::Present),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }
}

/// Which marking workflow is submitting the batch. The subject-level form
/// requires a subject code; the class-level sheet (AI-prepared) does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkingPolicy {
    pub require_subject: bool,
}

/// One unvalidated marking entry as the UI hands it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMarking {
    pub roll_number: String,
    pub name: String,
    pub status: String,
    pub subject_code: String,
    pub class_number: String,
}

/// A validated, normalized mark ready for the Data Service. Immutable once
/// built; the store stamps the date and owns overwrite-by-date semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    pub roll_number: String,
    pub name: String,
    pub status: MarkStatus,
    pub subject_code: String,
    pub class_number: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ValidationError {
    fn at(index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Some(serde_json::json!({ "index": index, "field": field })),
        }
    }
}

/// Validate and normalize a marking batch before any upstream call.
///
/// Rejects on the first bad entry: empty roll number, unrecognized status,
/// empty class number, or an empty subject when the policy requires one.
/// Normalization trims whitespace, canonicalizes status casing, and
/// upper-cases subject codes. Pure; nothing is submitted here.
pub fn validate_batch(
    batch: &[RawMarking],
    policy: MarkingPolicy,
) -> Result<Vec<AttendanceMark>, ValidationError> {
    let mut marks = Vec::with_capacity(batch.len());

    for (index, raw) in batch.iter().enumerate() {
        let roll_number = raw.roll_number.trim();
        if roll_number.is_empty() {
            return Err(ValidationError::at(
                index,
                "rollNumber",
                "roll number must not be empty",
            ));
        }

        let Some(status) = MarkStatus::parse(&raw.status) else {
            return Err(ValidationError::at(
                index,
                "status",
                format!("status must be Present or Absent, got {:?}", raw.status),
            ));
        };

        let class_number = raw.class_number.trim();
        if class_number.is_empty() {
            return Err(ValidationError::at(
                index,
                "classNumber",
                "class number must not be empty",
            ));
        }

        let subject_code = raw.subject_code.trim().to_ascii_uppercase();
        if policy.require_subject && subject_code.is_empty() {
            return Err(ValidationError::at(
                index,
                "subjectCode",
                "subject code is required for subject-level marking",
            ));
        }

        marks.push(AttendanceMark {
            roll_number: roll_number.to_string(),
            name: raw.name.trim().to_string(),
            status,
            subject_code,
            class_number: class_number.to_string(),
        });
    }

    Ok(marks)
}
