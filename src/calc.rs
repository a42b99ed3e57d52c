use serde::Serialize;
use std::collections::HashMap;

/// Status text a subject column must carry to count as attended.
pub const PRESENT: &str = "Present";
/// Placeholder for a subject that held no class on a given date.
pub const NOT_APPLICABLE: &str = "N/A";

/// One per-date row: the date key plus subject columns in first-occurrence
/// order. Dates are opaque strings; grouping is by equality only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub date: String,
    pub subjects: Vec<(String, String)>,
}

impl RecordRow {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            subjects: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn with_subjects<I, K, V>(date: impl Into<String>, subjects: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new(date);
        for (k, v) in subjects {
            row.set(k.into(), v.into());
        }
        row
    }

    /// Field-level last-write-wins: an existing column is overwritten in
    /// place, a new column appends at the end.
    pub fn set(&mut self, subject: String, status: String) {
        match self.subjects.iter_mut().find(|(k, _)| *k == subject) {
            Some((_, v)) => *v = status,
            None => self.subjects.push((subject, status)),
        }
    }

    pub fn get(&self, subject: &str) -> Option<&str> {
        self.subjects
            .iter()
            .find(|(k, _)| k == subject)
            .map(|(_, v)| v.as_str())
    }

    /// Unknown subjects resolve to "N/A"; they are never fabricated into the
    /// row itself.
    #[allow(dead_code)]
    pub fn status_or_na(&self, subject: &str) -> &str {
        self.get(subject).unwrap_or(NOT_APPLICABLE)
    }

    fn merge_from(&mut self, other: &RecordRow) {
        for (subject, status) in &other.subjects {
            self.set(subject.clone(), status.clone());
        }
    }
}

/// Merge any number of record feeds into one row per date.
///
/// Rows are grouped by exact date-string equality. A date seen again
/// shallow-merges its columns into the accumulated row (new fields win per
/// field, not per row). Output keeps first-seen-date order; nothing is
/// sorted. Empty feeds yield an empty result, never an error.
pub fn consolidate_records(feeds: &[&[RecordRow]]) -> Vec<RecordRow> {
    let mut rows: Vec<RecordRow> = Vec::new();
    let mut by_date: HashMap<String, usize> = HashMap::new();

    for feed in feeds {
        for record in *feed {
            match by_date.get(&record.date) {
                Some(&idx) => rows[idx].merge_from(record),
                None => {
                    by_date.insert(record.date.clone(), rows.len());
                    rows.push(record.clone());
                }
            }
        }
    }

    rows
}

/// Fixed percentage format contract: two decimals plus `%`, e.g. "80.00%".
/// Zero classes held renders as "100.00%" (no classes counts as fully
/// attended; see DESIGN.md).
pub fn format_percentage(present: u32, total: u32) -> String {
    if total == 0 {
        return "100.00%".to_string();
    }
    format!("{:.2}%", f64::from(present) / f64::from(total) * 100.0)
}

pub fn current_percentage(present: u32, total: u32) -> f64 {
    if total == 0 {
        100.0
    } else {
        f64::from(present) / f64::from(total) * 100.0
    }
}

/// Overall tallies as reported by the Data Service's summary endpoint.
/// Taken at face value when present; the aggregator never second-guesses
/// them against the row-level data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallTally {
    pub total_days: u32,
    pub present_days: u32,
    pub overall_percentage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub subject_code: String,
    pub total_classes: u32,
    pub present: u32,
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub total_days: u32,
    pub present_days: u32,
    pub overall_percentage: String,
    /// First-occurrence order of the input rows; not alphabetized.
    pub subjects: Vec<SubjectSummary>,
}

/// Compute the overall summary and the per-subject breakdown from
/// consolidated rows.
///
/// The subject table is always derived locally: a row contributes to a
/// subject when the column exists and is not "N/A", and counts as present on
/// exact canonical "Present" (case folding happens upstream in the marking
/// validator). Overall day tallies come from `overall` when the summary feed
/// supplied them; otherwise `total_days` falls back to the distinct-date
/// count and a day is present when any subject that day is "Present".
pub fn aggregate_summary(records: &[RecordRow], overall: Option<OverallTally>) -> AttendanceSummary {
    let mut subjects: Vec<SubjectSummary> = Vec::new();
    let mut by_code: HashMap<String, usize> = HashMap::new();

    for row in records {
        for (code, status) in &row.subjects {
            if status == NOT_APPLICABLE {
                continue;
            }
            let idx = match by_code.get(code) {
                Some(&idx) => idx,
                None => {
                    by_code.insert(code.clone(), subjects.len());
                    subjects.push(SubjectSummary {
                        subject_code: code.clone(),
                        total_classes: 0,
                        present: 0,
                        percentage: String::new(),
                    });
                    subjects.len() - 1
                }
            };
            subjects[idx].total_classes += 1;
            if status == PRESENT {
                subjects[idx].present += 1;
            }
        }
    }
    for subject in &mut subjects {
        subject.percentage = format_percentage(subject.present, subject.total_classes);
    }

    let (total_days, present_days, overall_percentage) = match overall {
        Some(tally) => {
            let pct = tally
                .overall_percentage
                .unwrap_or_else(|| format_percentage(tally.present_days, tally.total_days));
            (tally.total_days, tally.present_days, pct)
        }
        None => {
            let total = records.len() as u32;
            let present = records
                .iter()
                .filter(|row| row.subjects.iter().any(|(_, status)| status == PRESENT))
                .count() as u32;
            (total, present, format_percentage(present, total))
        }
    };

    AttendanceSummary {
        total_days,
        present_days,
        overall_percentage,
        subjects,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalOutcome {
    /// Attend this many consecutive future classes to reach the target.
    /// Zero means the goal is already met.
    Required(u32),
    /// No finite number of future attendances can reach the target.
    Infeasible,
}

/// Minimum additional consecutive present classes needed to reach
/// `target_percent`, assuming every one of them is attended (best case).
///
/// A target at or above 100 is infeasible once any absence exists: each
/// future class grows the denominator too, so the ceiling stays below 100.
pub fn required_additional_classes(present: u32, total: u32, target_percent: f64) -> GoalOutcome {
    if current_percentage(present, total) >= target_percent {
        return GoalOutcome::Required(0);
    }
    if target_percent >= 100.0 {
        return GoalOutcome::Infeasible;
    }
    // Smallest x with (present + x) / (total + x) * 100 >= target:
    // x >= (target*total - 100*present) / (100 - target)
    let required = (target_percent * f64::from(total) - 100.0 * f64::from(present))
        / (100.0 - target_percent);
    GoalOutcome::Required(required.ceil().max(0.0) as u32)
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoalProjection {
    pub subject_code: String,
    pub current_percentage: f64,
    pub outcome: GoalOutcome,
}

pub fn project_goals(subjects: &[SubjectSummary], target_percent: f64) -> Vec<GoalProjection> {
    subjects
        .iter()
        .map(|s| GoalProjection {
            subject_code: s.subject_code.clone(),
            current_percentage: current_percentage(s.present, s.total_classes),
            outcome: required_additional_classes(s.present, s.total_classes, target_percent),
        })
        .collect()
}
