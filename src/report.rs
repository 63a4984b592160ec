use std::fmt::Write;

use clap::ValueEnum;

use crate::models::{BulkReport, StatusCounts, Student, StudentStatus};

#[derive(Debug, Clone, Default)]
pub struct RosterFilter {
    pub status: Option<StudentStatus>,
    pub min_score: Option<i32>,
    pub search: Option<String>,
}

impl RosterFilter {
    fn matches(&self, student: &Student) -> bool {
        if self.status.is_some_and(|status| status != student.status) {
            return false;
        }
        if self.min_score.is_some_and(|min| student.risk_score < min) {
            return false;
        }
        match self.search.as_deref() {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                student.full_name().to_lowercase().contains(&needle)
                    || student.email.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum RosterSort {
    /// Highest risk first
    #[default]
    Risk,
    /// Last name, then first name
    Name,
    GradeLevel,
}

pub fn filter_roster(students: &[Student], filter: &RosterFilter, sort: RosterSort) -> Vec<Student> {
    let mut roster: Vec<Student> = students
        .iter()
        .filter(|student| filter.matches(student))
        .cloned()
        .collect();

    match sort {
        RosterSort::Risk => roster.sort_by(|a, b| {
            b.risk_score
                .cmp(&a.risk_score)
                .then_with(|| a.last_name.cmp(&b.last_name))
        }),
        RosterSort::Name => roster.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        }),
        RosterSort::GradeLevel => roster.sort_by(|a, b| {
            a.grade_level
                .cmp(&b.grade_level)
                .then_with(|| a.last_name.cmp(&b.last_name))
        }),
    }
    roster
}

pub fn status_distribution(students: &[Student]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for student in students {
        match student.status {
            StudentStatus::Active => counts.active += 1,
            StudentStatus::AtRisk => counts.at_risk += 1,
            StudentStatus::DroppedOut => counts.dropped_out += 1,
        }
    }
    counts
}

pub fn build_report(students: &[Student], run: Option<&BulkReport>) -> String {
    let counts = status_distribution(students);
    let ranked = filter_roster(students, &RosterFilter::default(), RosterSort::Risk);

    let mut output = String::new();
    let _ = writeln!(output, "# EduGuard Risk Report");
    let _ = writeln!(output, "Students on roll: {}", students.len());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    let _ = writeln!(output, "- active: {}", counts.active);
    let _ = writeln!(output, "- at-risk: {}", counts.at_risk);
    let _ = writeln!(output, "- dropped-out: {}", counts.dropped_out);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Risk Students");

    if ranked.is_empty() {
        let _ = writeln!(output, "No students recorded.");
    } else {
        for student in ranked.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}, grade {}) score {} [{}]",
                student.full_name(),
                student.email,
                student.grade_level,
                student.risk_score,
                student.status
            );
        }
    }

    if let Some(run) = run {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Latest Assessment Run");
        let _ = writeln!(
            output,
            "Assessed {} students, {} newly at risk, {} failed.",
            run.assessed.len(),
            run.newly_at_risk(),
            run.failed.len()
        );
        for failure in &run.failed {
            let _ = writeln!(output, "- {}: {}", failure.student_id, failure.reason);
        }
    }

    output
}
