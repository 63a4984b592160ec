use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AssessmentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StudentStatus {
    Active,
    AtRisk,
    DroppedOut,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::AtRisk => "at-risk",
            StudentStatus::DroppedOut => "dropped-out",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = AssessmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(StudentStatus::Active),
            "at-risk" => Ok(StudentStatus::AtRisk),
            "dropped-out" => Ok(StudentStatus::DroppedOut),
            other => Err(AssessmentError::InvalidRecord(format!(
                "unknown student status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = AssessmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "excused" => Ok(AttendanceStatus::Excused),
            other => Err(AssessmentError::InvalidRecord(format!(
                "unknown attendance status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentType {
    Positive,
    Negative,
}

impl IncidentType {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentType::Positive => "positive",
            IncidentType::Negative => "negative",
        }
    }
}

impl FromStr for IncidentType {
    type Err = AssessmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "positive" => Ok(IncidentType::Positive),
            "negative" => Ok(IncidentType::Negative),
            other => Err(AssessmentError::InvalidRecord(format!(
                "unknown incident type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

impl FromStr for Severity {
    type Err = AssessmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(AssessmentError::InvalidRecord(format!(
                "unknown severity '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterventionStatus {
    Planned,
    InProgress,
    Completed,
}

impl InterventionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InterventionStatus::Planned => "planned",
            InterventionStatus::InProgress => "in-progress",
            InterventionStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for InterventionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterventionStatus {
    type Err = AssessmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "planned" => Ok(InterventionStatus::Planned),
            "in-progress" => Ok(InterventionStatus::InProgress),
            "completed" => Ok(InterventionStatus::Completed),
            other => Err(AssessmentError::InvalidRecord(format!(
                "unknown intervention status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub grade_level: i32,
    pub date_of_birth: Option<NaiveDate>,
    pub enrollment_date: NaiveDate,
    pub risk_score: i32,
    pub status: StudentStatus,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub subject: String,
    pub term: String,
    /// GPA-style grade, nominally 0.0 to 4.0. Not validated.
    pub grade: f64,
    pub recorded_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralIncident {
    pub id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub description: String,
    pub resolved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    pub id: Uuid,
    pub student_id: Uuid,
    pub kind: String,
    pub status: InterventionStatus,
    pub started_on: NaiveDate,
    pub notes: String,
}

/// Points contributed by each scoring category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RiskBreakdown {
    pub academic: i32,
    pub attendance: i32,
    pub behavioral: i32,
    pub other: i32,
    pub total: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub student_id: Uuid,
    pub student_name: String,
    pub previous_score: i32,
    pub previous_status: StudentStatus,
    pub breakdown: RiskBreakdown,
    pub status: StudentStatus,
}

impl Assessment {
    pub fn score(&self) -> i32 {
        self.breakdown.total
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssessmentFailure {
    pub student_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub assessed: Vec<Assessment>,
    pub failed: Vec<AssessmentFailure>,
}

impl BulkReport {
    pub fn newly_at_risk(&self) -> usize {
        self.assessed
            .iter()
            .filter(|a| a.status == StudentStatus::AtRisk && a.previous_status != StudentStatus::AtRisk)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub at_risk: usize,
    pub dropped_out: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            StudentStatus::Active,
            StudentStatus::AtRisk,
            StudentStatus::DroppedOut,
        ] {
            assert_eq!(status.as_str().parse::<StudentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_enum_text_is_rejected() {
        assert!(matches!(
            "tardy".parse::<AttendanceStatus>(),
            Err(AssessmentError::InvalidRecord(_))
        ));
        assert!(matches!(
            "neutral".parse::<IncidentType>(),
            Err(AssessmentError::InvalidRecord(_))
        ));
    }

    #[test]
    fn intervention_status_parses_known_text_only() {
        assert_eq!(
            "in-progress".parse::<InterventionStatus>().unwrap(),
            InterventionStatus::InProgress
        );
        assert_eq!(
            "completed".parse::<InterventionStatus>().unwrap(),
            InterventionStatus::Completed
        );
        assert!(matches!(
            "paused".parse::<InterventionStatus>(),
            Err(AssessmentError::InvalidRecord(_))
        ));
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&StudentStatus::AtRisk).unwrap();
        assert_eq!(json, "\"at-risk\"");
    }
}
