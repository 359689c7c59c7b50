use sqlx::PgPool;

use crate::db::models::Classroom;
use crate::db::types::ClassroomStatus;

const CLASSROOM_COLUMNS: &str = "class_code, created_at, teacher_id, question, status";

pub(crate) struct CreateClassroom<'a> {
    pub(crate) class_code: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) question: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

/// Insert a classroom. Returns false when the code is already taken; the
/// caller regenerates and retries. The conflict check and the insert are one
/// statement, so a concurrent create can never overwrite an existing row.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateClassroom<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO classrooms (class_code, created_at, teacher_id, question, status)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (class_code) DO NOTHING",
    )
    .bind(params.class_code)
    .bind(params.created_at)
    .bind(params.teacher_id)
    .bind(params.question)
    .bind(ClassroomStatus::Active)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn find_by_code(
    pool: &PgPool,
    class_code: &str,
) -> Result<Option<Classroom>, sqlx::Error> {
    sqlx::query_as::<_, Classroom>(&format!(
        "SELECT {CLASSROOM_COLUMNS} FROM classrooms WHERE class_code = $1"
    ))
    .bind(class_code)
    .fetch_optional(pool)
    .await
}

/// Overwrite the mirrored current question. Idempotent; false when no
/// classroom matched.
pub(crate) async fn update_question(
    pool: &PgPool,
    class_code: &str,
    question: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE classrooms SET question = $1 WHERE class_code = $2")
        .bind(question)
        .bind(class_code)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Terminal for joins; answer history stays readable.
pub(crate) async fn close(pool: &PgPool, class_code: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE classrooms SET status = $1 WHERE class_code = $2")
        .bind(ClassroomStatus::Closed)
        .bind(class_code)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
