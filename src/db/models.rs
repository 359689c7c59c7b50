use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::ClassroomStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Classroom {
    pub(crate) class_code: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) teacher_id: String,
    pub(crate) question: Option<String>,
    pub(crate) status: ClassroomStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) student_id: String,
    pub(crate) class_code: String,
    pub(crate) joined_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Answer {
    pub(crate) id: i64,
    pub(crate) student_id: String,
    pub(crate) class_code: String,
    pub(crate) question: String,
    pub(crate) answer: String,
    pub(crate) score: f64,
    pub(crate) feedback: String,
    pub(crate) suggestions: Json<serde_json::Value>,
    pub(crate) submitted_at: PrimitiveDateTime,
}
