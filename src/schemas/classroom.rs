use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Classroom;
use crate::db::types::ClassroomStatus;
use crate::repositories::answers::AnswerView;
use crate::session::teacher::{TeacherAction, TeacherSession};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassroomCreate {
    #[serde(default)]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    pub(crate) question: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassroomResponse {
    pub(crate) class_code: String,
    pub(crate) created_at: String,
    pub(crate) teacher_id: String,
    pub(crate) question: Option<String>,
    pub(crate) status: ClassroomStatus,
}

impl ClassroomResponse {
    pub(crate) fn from_db(classroom: Classroom) -> Self {
        Self {
            class_code: classroom.class_code,
            created_at: format_primitive(classroom.created_at),
            teacher_id: classroom.teacher_id,
            question: classroom.question,
            status: classroom.status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionUpdate {
    pub(crate) question: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NavigateRequest {
    pub(crate) session: TeacherSession,
    pub(crate) action: TeacherAction,
}

#[derive(Debug, Serialize)]
pub(crate) struct NavigateResponse {
    pub(crate) session: TeacherSession,
    /// Whether the mirrored classroom question was pushed by this step.
    pub(crate) pushed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentListEntry {
    pub(crate) student_id: String,
    pub(crate) joined_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswersQuery {
    pub(crate) question: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) student_id: String,
    pub(crate) answer: String,
    pub(crate) score: f64,
    pub(crate) feedback: String,
    pub(crate) suggestions: Vec<String>,
    pub(crate) submitted_at: String,
}

impl AnswerResponse {
    pub(crate) fn from_view(view: AnswerView) -> Self {
        Self {
            student_id: view.student_id,
            answer: view.answer,
            score: view.score,
            feedback: view.feedback,
            suggestions: view.suggestions,
            submitted_at: format_primitive(view.submitted_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateQuestionRequest {
    pub(crate) subject: String,
    pub(crate) difficulty: String,
    #[serde(default)]
    pub(crate) keywords: Vec<String>,
    #[serde(default)]
    pub(crate) regenerate: bool,
    #[serde(default)]
    pub(crate) previous_question: Option<String>,
    #[serde(default = "default_attempt")]
    pub(crate) attempt: u32,
}

fn default_attempt() -> u32 {
    1
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateQuestionResponse {
    pub(crate) question: String,
}
