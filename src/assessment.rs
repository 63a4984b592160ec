use uuid::Uuid;

use crate::error::{AssessmentError, Result};
use crate::models::{Assessment, AssessmentFailure, BulkReport, Student};
use crate::risk;
use crate::store::RecordStore;

pub async fn assess_student<S: RecordStore>(store: &S, student_id: Uuid) -> Result<Assessment> {
    let student = store
        .get_student(student_id)
        .await?
        .ok_or(AssessmentError::NotFound(student_id))?;
    assess(store, student).await
}

async fn assess<S: RecordStore>(store: &S, student: Student) -> Result<Assessment> {
    let (academic, attendance, behavioral) = tokio::try_join!(
        store.academic_records(student.id),
        store.attendance_records(student.id),
        store.behavioral_incidents(student.id),
    )?;

    let breakdown = risk::score_student(&academic, &attendance, &behavioral);
    let status = risk::derive_status(breakdown.total);

    store
        .update_risk(student.id, breakdown.total, status)
        .await?;

    tracing::debug!(
        student_id = %student.id,
        academic = breakdown.academic,
        attendance = breakdown.attendance,
        behavioral = breakdown.behavioral,
        score = breakdown.total,
        %status,
        "student assessed"
    );

    Ok(Assessment {
        student_id: student.id,
        student_name: student.full_name(),
        previous_score: student.risk_score,
        previous_status: student.status,
        breakdown,
        status,
    })
}

/// Scores every student one at a time. A failure is recorded in the report
/// and the run moves on to the next student.
pub async fn assess_all<S: RecordStore>(store: &S) -> Result<BulkReport> {
    let students = store.list_students().await?;
    tracing::info!(count = students.len(), "starting bulk risk assessment");

    let mut report = BulkReport::default();
    for student in students {
        let student_id = student.id;
        match assess(store, student).await {
            Ok(assessment) => report.assessed.push(assessment),
            Err(err) => {
                tracing::warn!(%student_id, error = %err, "risk assessment failed");
                report.failed.push(AssessmentFailure {
                    student_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    tracing::info!(
        assessed = report.assessed.len(),
        failed = report.failed.len(),
        newly_at_risk = report.newly_at_risk(),
        "bulk risk assessment finished"
    );
    Ok(report)
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use uuid::Uuid;

    use crate::error::{AssessmentError, Result};
    use crate::models::{
        AcademicRecord, AttendanceRecord, BehavioralIncident, Student, StudentStatus,
    };
    use crate::store::RecordStore;

    #[derive(Default)]
    pub struct MemoryStore {
        pub students: Mutex<Vec<Student>>,
        pub academic: HashMap<Uuid, Vec<AcademicRecord>>,
        pub attendance: HashMap<Uuid, Vec<AttendanceRecord>>,
        pub behavioral: HashMap<Uuid, Vec<BehavioralIncident>>,
        pub failing_reads: HashSet<Uuid>,
        /// Listed by `list_students` but gone by the time of the write.
        pub removed: Vec<Student>,
        pub writes: Mutex<usize>,
    }

    impl MemoryStore {
        pub fn student(&self, id: Uuid) -> Option<Student> {
            self.students
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned()
        }
    }

    impl RecordStore for MemoryStore {
        async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
            Ok(self.student(id))
        }

        async fn list_students(&self) -> Result<Vec<Student>> {
            let mut students = self.students.lock().unwrap().clone();
            students.extend(self.removed.iter().cloned());
            Ok(students)
        }

        async fn academic_records(&self, student_id: Uuid) -> Result<Vec<AcademicRecord>> {
            if self.failing_reads.contains(&student_id) {
                return Err(AssessmentError::Storage(sqlx::Error::PoolTimedOut));
            }
            Ok(self.academic.get(&student_id).cloned().unwrap_or_default())
        }

        async fn attendance_records(&self, student_id: Uuid) -> Result<Vec<AttendanceRecord>> {
            Ok(self.attendance.get(&student_id).cloned().unwrap_or_default())
        }

        async fn behavioral_incidents(&self, student_id: Uuid) -> Result<Vec<BehavioralIncident>> {
            Ok(self.behavioral.get(&student_id).cloned().unwrap_or_default())
        }

        async fn update_risk(
            &self,
            student_id: Uuid,
            score: i32,
            status: StudentStatus,
        ) -> Result<()> {
            let mut students = self.students.lock().unwrap();
            let student = students
                .iter_mut()
                .find(|s| s.id == student_id)
                .ok_or(AssessmentError::NotFound(student_id))?;
            student.risk_score = score;
            student.status = status;
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }
    }
}
