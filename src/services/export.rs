use anyhow::{Context, Result};

use crate::core::time::format_primitive;
use crate::repositories::answers::ExportRow;
use crate::services::evaluation;

/// Render the classroom snapshot as CSV. Stored suggestions are re-validated
/// through the shared filter before serialization, the same as the answer
/// listing path.
pub(crate) fn render_csv(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer
        .write_record([
            "student_id",
            "question",
            "answer",
            "score",
            "feedback",
            "suggestions",
            "submitted_at",
        ])
        .context("Failed to write CSV header")?;

    for row in rows {
        let suggestions = evaluation::filter_stored_suggestions(&row.suggestions.0);
        let suggestions_json =
            serde_json::to_string(&suggestions).unwrap_or_else(|_| "[]".to_string());

        writer
            .write_record([
                row.student_id.as_str(),
                row.question.as_str(),
                row.answer.as_str(),
                &row.score.to_string(),
                row.feedback.as_str(),
                &suggestions_json,
                &format_primitive(row.submitted_at),
            ])
            .context("Failed to write CSV row")?;
    }

    writer.into_inner().context("Failed to finish CSV output")
}
