use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Answer;
use crate::services::evaluation;

pub(crate) struct InsertAnswer<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) class_code: &'a str,
    pub(crate) question: &'a str,
    pub(crate) answer: &'a str,
    pub(crate) score: f64,
    pub(crate) feedback: &'a str,
    pub(crate) suggestions: serde_json::Value,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// A stored answer with its suggestions re-validated for display. Suggestions
/// pass through the same filter rules as fresh AI output; malformed payloads
/// come back as an empty list instead of a parse failure.
#[derive(Debug, Clone)]
pub(crate) struct AnswerView {
    pub(crate) student_id: String,
    pub(crate) answer: String,
    pub(crate) score: f64,
    pub(crate) feedback: String,
    pub(crate) suggestions: Vec<String>,
    pub(crate) submitted_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct ExportRow {
    pub(crate) student_id: String,
    pub(crate) question: String,
    pub(crate) answer: String,
    pub(crate) score: f64,
    pub(crate) feedback: String,
    pub(crate) suggestions: Json<serde_json::Value>,
    pub(crate) submitted_at: PrimitiveDateTime,
}

/// Append-only: a resubmission inserts a new row, never an update.
pub(crate) async fn insert(pool: &PgPool, params: InsertAnswer<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO answers
            (student_id, class_code, question, answer, score, feedback, suggestions, submitted_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(params.student_id)
    .bind(params.class_code)
    .bind(params.question)
    .bind(params.answer)
    .bind(params.score)
    .bind(params.feedback)
    .bind(Json(params.suggestions))
    .bind(params.submitted_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn list_for_question(
    pool: &PgPool,
    class_code: &str,
    question: &str,
) -> Result<Vec<AnswerView>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Answer>(
        "SELECT id, student_id, class_code, question, answer, score, feedback, suggestions, submitted_at
         FROM answers
         WHERE class_code = $1 AND question = $2
         ORDER BY submitted_at DESC",
    )
    .bind(class_code)
    .bind(question)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| AnswerView {
            suggestions: evaluation::filter_stored_suggestions(&row.suggestions.0),
            student_id: row.student_id,
            answer: row.answer,
            score: row.score,
            feedback: row.feedback,
            submitted_at: row.submitted_at,
        })
        .collect())
}

/// Tabular snapshot for export: students joined to their answers, oldest
/// first. Empty when the classroom has no data.
pub(crate) async fn export_rows(
    pool: &PgPool,
    class_code: &str,
) -> Result<Vec<ExportRow>, sqlx::Error> {
    sqlx::query_as::<_, ExportRow>(
        "SELECT s.student_id, a.question, a.answer, a.score, a.feedback, a.suggestions, a.submitted_at
         FROM answers a
         JOIN students s ON a.student_id = s.student_id
         WHERE a.class_code = $1
         ORDER BY a.submitted_at",
    )
    .bind(class_code)
    .fetch_all(pool)
    .await
}
