use sqlx::PgPool;

use crate::db::models::Student;
use crate::db::types::ClassroomStatus;

pub(crate) struct AddStudent<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) class_code: &'a str,
    pub(crate) joined_at: time::PrimitiveDateTime,
}

/// Join a classroom. The existence/status check is folded into the insert
/// statement, so the row can only land against a classroom that was active at
/// write time. Returns false when the classroom is missing, not active, or an
/// integrity constraint rejects the row.
pub(crate) async fn add(pool: &PgPool, params: AddStudent<'_>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO students (student_id, class_code, joined_at)
         SELECT $1, $2, $3
         WHERE EXISTS (
             SELECT 1 FROM classrooms WHERE class_code = $2 AND status = $4
         )",
    )
    .bind(params.student_id)
    .bind(params.class_code)
    .bind(params.joined_at)
    .bind(ClassroomStatus::Active)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.rows_affected() == 1),
        Err(err) if is_integrity_violation(&err) => {
            tracing::warn!(error = %err, class_code = params.class_code, "Join rejected by constraint");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

pub(crate) async fn list_for_classroom(
    pool: &PgPool,
    class_code: &str,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(
        "SELECT student_id, class_code, joined_at
         FROM students
         WHERE class_code = $1
         ORDER BY joined_at",
    )
    .bind(class_code)
    .fetch_all(pool)
    .await
}

fn is_integrity_violation(error: &sqlx::Error) -> bool {
    match error {
        // 23503 foreign key, 23505 unique
        sqlx::Error::Database(db_error) => {
            matches!(db_error.code().as_deref(), Some("23503") | Some("23505"))
        }
        _ => false,
    }
}
