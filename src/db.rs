use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{AssessmentError, Result};
use crate::models::{
    AcademicRecord, AttendanceRecord, BehavioralIncident, Intervention, InterventionStatus,
    Student, StudentStatus,
};
use crate::store::RecordStore;

const STUDENT_COLUMNS: &str = "id, first_name, last_name, email, grade_level, date_of_birth, \
     enrollment_date, risk_score, status";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list_interventions(&self, student_id: Uuid) -> Result<Vec<Intervention>> {
        let rows = sqlx::query(
            "SELECT id, student_id, kind, status, started_on, notes \
             FROM eduguard.interventions WHERE student_id = $1 ORDER BY started_on DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let mut interventions = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status")?;
            interventions.push(Intervention {
                id: row.try_get("id")?,
                student_id: row.try_get("student_id")?,
                kind: row.try_get("kind")?,
                status: status.parse()?,
                started_on: row.try_get("started_on")?,
                notes: row.try_get("notes")?,
            });
        }
        Ok(interventions)
    }
}

fn student_from_row(row: &PgRow) -> Result<Student> {
    let status: String = row.try_get("status")?;
    Ok(Student {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        grade_level: row.try_get("grade_level")?,
        date_of_birth: row.try_get("date_of_birth")?,
        enrollment_date: row.try_get("enrollment_date")?,
        risk_score: row.try_get("risk_score")?,
        status: status.parse()?,
    })
}

impl RecordStore for PgStore {
    async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM eduguard.students WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(student_from_row).transpose()
    }

    async fn list_students(&self) -> Result<Vec<Student>> {
        let query =
            format!("SELECT {STUDENT_COLUMNS} FROM eduguard.students ORDER BY last_name, first_name");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;
        rows.iter().map(student_from_row).collect()
    }

    async fn academic_records(&self, student_id: Uuid) -> Result<Vec<AcademicRecord>> {
        let rows = sqlx::query(
            "SELECT id, student_id, subject, term, grade, recorded_on \
             FROM eduguard.academic_records WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(AcademicRecord {
                id: row.try_get("id")?,
                student_id: row.try_get("student_id")?,
                subject: row.try_get("subject")?,
                term: row.try_get("term")?,
                grade: row.try_get("grade")?,
                recorded_on: row.try_get("recorded_on")?,
            });
        }
        Ok(records)
    }

    async fn attendance_records(&self, student_id: Uuid) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            "SELECT id, student_id, date, status, note \
             FROM eduguard.attendance_records WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status")?;
            records.push(AttendanceRecord {
                id: row.try_get("id")?,
                student_id: row.try_get("student_id")?,
                date: row.try_get("date")?,
                status: status.parse()?,
                note: row.try_get("note")?,
            });
        }
        Ok(records)
    }

    async fn behavioral_incidents(&self, student_id: Uuid) -> Result<Vec<BehavioralIncident>> {
        let rows = sqlx::query(
            "SELECT id, student_id, date, incident_type, severity, description, resolved \
             FROM eduguard.behavioral_incidents WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let mut incidents = Vec::with_capacity(rows.len());
        for row in rows {
            let incident_type: String = row.try_get("incident_type")?;
            let severity: String = row.try_get("severity")?;
            incidents.push(BehavioralIncident {
                id: row.try_get("id")?,
                student_id: row.try_get("student_id")?,
                date: row.try_get("date")?,
                incident_type: incident_type.parse()?,
                severity: severity.parse()?,
                description: row.try_get("description")?,
                resolved: row.try_get("resolved")?,
            });
        }
        Ok(incidents)
    }

    async fn update_risk(
        &self,
        student_id: Uuid,
        score: i32,
        status: StudentStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE eduguard.students SET risk_score = $2, status = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(student_id)
        .bind(score)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        // deleted since it was listed
        if result.rows_affected() == 0 {
            return Err(AssessmentError::NotFound(student_id));
        }
        Ok(())
    }
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

async fn upsert_student(
    pool: &PgPool,
    first_name: &str,
    last_name: &str,
    email: &str,
    grade_level: i32,
    enrollment_date: NaiveDate,
) -> anyhow::Result<(Uuid, bool)> {
    // xmax is zero only for a freshly inserted row
    let row = sqlx::query(
        r#"
        INSERT INTO eduguard.students
        (id, first_name, last_name, email, grade_level, enrollment_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (email) DO UPDATE
        SET first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            grade_level = EXCLUDED.grade_level
        RETURNING id, (xmax = 0) AS inserted
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(first_name)
    .bind(last_name)
    .bind(email)
    .bind(grade_level)
    .bind(enrollment_date)
    .fetch_one(pool)
    .await?;
    Ok((row.get("id"), row.get("inserted")))
}

async fn student_id_by_email(pool: &PgPool, email: &str) -> anyhow::Result<Uuid> {
    let row = sqlx::query("SELECT id FROM eduguard.students WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("no student with email {email}"))?;
    Ok(row.get("id"))
}

async fn insert_academic(
    pool: &PgPool,
    student_id: Uuid,
    subject: &str,
    term: &str,
    grade: f64,
    recorded_on: NaiveDate,
    source_key: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO eduguard.academic_records
        (id, student_id, subject, term, grade, recorded_on, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(subject)
    .bind(term)
    .bind(grade)
    .bind(recorded_on)
    .bind(source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

async fn insert_attendance(
    pool: &PgPool,
    student_id: Uuid,
    date: NaiveDate,
    status: &str,
    note: Option<&str>,
    source_key: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO eduguard.attendance_records
        (id, student_id, date, status, note, source_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(date)
    .bind(status)
    .bind(note)
    .bind(source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[allow(clippy::too_many_arguments)]
async fn insert_incident(
    pool: &PgPool,
    student_id: Uuid,
    date: NaiveDate,
    incident_type: &str,
    severity: &str,
    description: &str,
    resolved: bool,
    source_key: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO eduguard.behavioral_incidents
        (id, student_id, date, incident_type, severity, description, resolved, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(date)
    .bind(incident_type)
    .bind(severity)
    .bind(description)
    .bind(resolved)
    .bind(source_key)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let enrolled = date(2024, 9, 3)?;
    let (avery, _) =
        upsert_student(pool, "Avery", "Lee", "avery.lee@eduguard.school", 10, enrolled).await?;
    let (jules, _) =
        upsert_student(pool, "Jules", "Moreno", "jules.moreno@eduguard.school", 11, enrolled).await?;
    let (kiara, _) =
        upsert_student(pool, "Kiara", "Patel", "kiara.patel@eduguard.school", 9, enrolled).await?;

    let grades = [
        (avery, "avery", [1.7, 1.9, 2.1]),
        (jules, "jules", [2.3, 2.6, 2.8]),
        (kiara, "kiara", [3.4, 3.8, 3.6]),
    ];
    for (student_id, key, values) in grades {
        for (index, (subject, grade)) in ["Algebra", "Biology", "English"]
            .into_iter()
            .zip(values)
            .enumerate()
        {
            insert_academic(
                pool,
                student_id,
                subject,
                "2026-spring",
                grade,
                date(2026, 2, 27)?,
                &format!("seed-{key}-grade-{index}"),
            )
            .await?;
        }
    }

    // ten school days each; present counts give 60%, 80%, 100%
    let presence = [(avery, "avery", 6), (jules, "jules", 8), (kiara, "kiara", 10)];
    for (student_id, key, present) in presence {
        for day in 0..10u32 {
            let status = if day < present { "present" } else { "absent" };
            insert_attendance(
                pool,
                student_id,
                date(2026, 3, 2 + day)?,
                status,
                None,
                &format!("seed-{key}-attendance-{day}"),
            )
            .await?;
        }
    }

    let incidents = [
        (avery, "negative", "high", "Left campus without permission", false, "seed-avery-incident-0"),
        (avery, "negative", "medium", "Disrupted lab session", true, "seed-avery-incident-1"),
        (avery, "negative", "low", "Late to homeroom repeatedly", false, "seed-avery-incident-2"),
        (jules, "negative", "low", "Phone use during exam review", true, "seed-jules-incident-0"),
        (kiara, "positive", "low", "Peer tutoring volunteer", true, "seed-kiara-incident-0"),
    ];
    for (student_id, incident_type, severity, description, resolved, source_key) in incidents {
        insert_incident(
            pool,
            student_id,
            date(2026, 3, 5)?,
            incident_type,
            severity,
            description,
            resolved,
            source_key,
        )
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO eduguard.interventions (id, student_id, kind, status, started_on, notes, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(avery)
    .bind("mentoring")
    .bind(InterventionStatus::InProgress.as_str())
    .bind(date(2026, 3, 9)?)
    .bind("Weekly check-in with counselor")
    .bind("seed-avery-intervention-0")
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Debug, serde::Deserialize)]
pub struct CsvRow {
    pub kind: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub grade_level: Option<i32>,
    pub date: NaiveDate,
    pub subject: Option<String>,
    pub term: Option<String>,
    pub grade: Option<f64>,
    pub status: Option<String>,
    pub incident_type: Option<String>,
    pub severity: Option<String>,
    pub description: Option<String>,
    pub resolved: Option<bool>,
    pub source_key: Option<String>,
}

fn required<'a>(value: &'a Option<String>, field: &str, line: usize) -> anyhow::Result<&'a str> {
    value
        .as_deref()
        .with_context(|| format!("row {line}: missing {field}"))
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("row {line}: malformed"))?;
        let source_key = row
            .source_key
            .clone()
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let affected = match row.kind.as_str() {
            "student" => {
                let (_, created) = upsert_student(
                    pool,
                    required(&row.first_name, "first_name", line)?,
                    required(&row.last_name, "last_name", line)?,
                    &row.email,
                    row.grade_level.unwrap_or_default(),
                    row.date,
                )
                .await?;
                u64::from(created)
            }
            "academic" => {
                let student_id = student_id_by_email(pool, &row.email).await?;
                let grade = row
                    .grade
                    .with_context(|| format!("row {line}: missing grade"))?;
                insert_academic(
                    pool,
                    student_id,
                    required(&row.subject, "subject", line)?,
                    row.term.as_deref().unwrap_or(""),
                    grade,
                    row.date,
                    &source_key,
                )
                .await?
            }
            "attendance" => {
                let student_id = student_id_by_email(pool, &row.email).await?;
                let status: crate::models::AttendanceStatus =
                    required(&row.status, "status", line)?.parse()?;
                insert_attendance(
                    pool,
                    student_id,
                    row.date,
                    status.as_str(),
                    row.description.as_deref(),
                    &source_key,
                )
                .await?
            }
            "behavioral" => {
                let student_id = student_id_by_email(pool, &row.email).await?;
                let incident_type: crate::models::IncidentType =
                    required(&row.incident_type, "incident_type", line)?.parse()?;
                let severity: crate::models::Severity =
                    row.severity.as_deref().unwrap_or("low").parse()?;
                insert_incident(
                    pool,
                    student_id,
                    row.date,
                    incident_type.as_str(),
                    severity.as_str(),
                    row.description.as_deref().unwrap_or(""),
                    row.resolved.unwrap_or(false),
                    &source_key,
                )
                .await?
            }
            other => anyhow::bail!("row {line}: unknown record kind '{other}'"),
        };

        if affected > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
