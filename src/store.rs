use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AcademicRecord, AttendanceRecord, BehavioralIncident, Student, StudentStatus,
};

/// Typed access to the student records the assessment reads, and the one
/// write it performs.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn get_student(&self, id: Uuid) -> Result<Option<Student>>;

    async fn list_students(&self) -> Result<Vec<Student>>;

    async fn academic_records(&self, student_id: Uuid) -> Result<Vec<AcademicRecord>>;

    async fn attendance_records(&self, student_id: Uuid) -> Result<Vec<AttendanceRecord>>;

    async fn behavioral_incidents(&self, student_id: Uuid) -> Result<Vec<BehavioralIncident>>;

    /// Writes `risk_score` and `status` and nothing else.
    async fn update_risk(&self, student_id: Uuid, score: i32, status: StudentStatus)
        -> Result<()>;
}
