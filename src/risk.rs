use crate::models::{
    AcademicRecord, AttendanceRecord, AttendanceStatus, BehavioralIncident, IncidentType,
    RiskBreakdown, StudentStatus,
};

pub const MAX_SCORE: i32 = 100;
pub const AT_RISK_THRESHOLD: i32 = 70;

pub fn score_student(
    academic: &[AcademicRecord],
    attendance: &[AttendanceRecord],
    behavioral: &[BehavioralIncident],
) -> RiskBreakdown {
    let academic_points = academic_points(academic);
    let attendance_points = attendance_points(attendance);
    let behavioral_points = behavioral_points(behavioral);
    let other = other_points();

    RiskBreakdown {
        academic: academic_points,
        attendance: attendance_points,
        behavioral: behavioral_points,
        other,
        total: (academic_points + attendance_points + behavioral_points + other).min(MAX_SCORE),
    }
}

pub fn academic_points(records: &[AcademicRecord]) -> i32 {
    if records.is_empty() {
        return 0;
    }
    let mean = records.iter().map(|r| r.grade).sum::<f64>() / records.len() as f64;
    grade_band(mean)
}

pub fn grade_band(mean: f64) -> i32 {
    if mean < 2.0 {
        40
    } else if mean < 2.5 {
        25
    } else if mean < 3.0 {
        15
    } else {
        0
    }
}

pub fn attendance_points(records: &[AttendanceRecord]) -> i32 {
    if records.is_empty() {
        return 0;
    }
    let present = records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .count();
    presence_band(present as f64 / records.len() as f64)
}

pub fn presence_band(present_rate: f64) -> i32 {
    if present_rate < 0.70 {
        30
    } else if present_rate < 0.80 {
        20
    } else if present_rate < 0.90 {
        10
    } else {
        0
    }
}

pub fn behavioral_points(incidents: &[BehavioralIncident]) -> i32 {
    let negative = incidents
        .iter()
        .filter(|i| i.incident_type == IncidentType::Negative)
        .count();
    incident_band(negative)
}

pub fn incident_band(negative_count: usize) -> i32 {
    match negative_count {
        0 => 0,
        1..=2 => 10,
        3..=5 => 15,
        _ => 20,
    }
}

/// Reserved 10 points for factors not modelled yet (socioeconomic, family
/// engagement). Always zero.
pub fn other_points() -> i32 {
    0
}

pub fn derive_status(score: i32) -> StudentStatus {
    if score >= AT_RISK_THRESHOLD {
        StudentStatus::AtRisk
    } else {
        StudentStatus::Active
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::Severity;
    use uuid::Uuid;

    #[test]
    fn no_records_scores_zero_and_stays_active() {
        let breakdown = score_student(&[], &[], &[]);
        assert_eq!(breakdown, RiskBreakdown::default());
        assert_eq!(derive_status(breakdown.total), StudentStatus::Active);
    }

    #[test]
    fn grade_bands_are_lower_inclusive() {
        let id = Uuid::new_v4();
        assert_eq!(academic_points(&grades(id, &[1.5])), 40);
        assert_eq!(academic_points(&grades(id, &[1.0, 2.0])), 40);
        assert_eq!(academic_points(&grades(id, &[2.0])), 25);
        assert_eq!(academic_points(&grades(id, &[2.5])), 15);
        assert_eq!(academic_points(&grades(id, &[3.0])), 0);
        assert_eq!(academic_points(&grades(id, &[4.0, 3.0])), 0);
    }

    #[test]
    fn out_of_range_grades_are_scored_as_given() {
        let id = Uuid::new_v4();
        assert_eq!(academic_points(&grades(id, &[-1.0])), 40);
        assert_eq!(academic_points(&grades(id, &[7.5])), 0);
    }

    #[test]
    fn attendance_bands_are_lower_inclusive() {
        let id = Uuid::new_v4();
        assert_eq!(attendance_points(&attendance(id, 5, 5)), 30);
        assert_eq!(attendance_points(&attendance(id, 7, 3)), 20);
        assert_eq!(attendance_points(&attendance(id, 8, 2)), 10);
        assert_eq!(attendance_points(&attendance(id, 9, 1)), 0);
        assert_eq!(attendance_points(&attendance(id, 0, 4)), 30);
    }

    #[test]
    fn only_present_counts_toward_attendance() {
        let id = Uuid::new_v4();
        let mut records = attendance(id, 9, 0);
        records.push(AttendanceRecord {
            id: Uuid::new_v4(),
            student_id: id,
            date: chrono::NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(),
            status: AttendanceStatus::Excused,
            note: Some("doctor".to_string()),
        });
        // 9 of 10 present
        assert_eq!(attendance_points(&records), 0);
        records[0].status = AttendanceStatus::Late;
        assert_eq!(attendance_points(&records), 10);
    }

    #[test]
    fn incident_bands_count_negatives_only() {
        let id = Uuid::new_v4();
        assert_eq!(behavioral_points(&incidents(id, 6, 0)), 20);
        assert_eq!(behavioral_points(&incidents(id, 5, 0)), 15);
        assert_eq!(behavioral_points(&incidents(id, 3, 2)), 15);
        assert_eq!(behavioral_points(&incidents(id, 2, 0)), 10);
        assert_eq!(behavioral_points(&incidents(id, 1, 0)), 10);
        assert_eq!(behavioral_points(&incidents(id, 0, 4)), 0);
    }

    #[test]
    fn severity_and_resolution_do_not_change_points() {
        let id = Uuid::new_v4();
        let mut records = incidents(id, 3, 0);
        records[0].severity = Severity::High;
        records[1].resolved = true;
        assert_eq!(behavioral_points(&records), 15);
    }

    #[test]
    fn combined_components_sum() {
        let id = Uuid::new_v4();
        let academic = grades(id, &[1.6, 2.0]);
        let presence = attendance(id, 13, 7);

        let breakdown = score_student(&academic, &presence, &incidents(id, 2, 0));
        assert_eq!(breakdown.academic, 40);
        assert_eq!(breakdown.attendance, 30);
        assert_eq!(breakdown.behavioral, 10);
        assert_eq!(breakdown.total, 80);
        assert_eq!(derive_status(breakdown.total), StudentStatus::AtRisk);

        let breakdown = score_student(&academic, &presence, &incidents(id, 3, 0));
        assert_eq!(breakdown.total, 85);
    }

    #[test]
    fn threshold_is_inclusive() {
        let id = Uuid::new_v4();
        let breakdown = score_student(
            &grades(id, &[1.5]),
            &attendance(id, 7, 3),
            &incidents(id, 1, 0),
        );
        assert_eq!(breakdown.total, 70);
        assert_eq!(derive_status(breakdown.total), StudentStatus::AtRisk);
        assert_eq!(derive_status(69), StudentStatus::Active);
        assert_eq!(derive_status(0), StudentStatus::Active);
    }

    #[test]
    fn worst_case_stays_within_bounds() {
        let id = Uuid::new_v4();
        let breakdown = score_student(
            &grades(id, &[0.0]),
            &attendance(id, 0, 10),
            &incidents(id, 40, 0),
        );
        assert_eq!(breakdown.total, 90);
        assert!((0..=MAX_SCORE).contains(&breakdown.total));
        assert_eq!(breakdown.other, 0);
    }
}
