use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::api::errors::ApiError;
use crate::api::validation::{validate_class_code, validate_question_text};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::classroom::{
    AnswerResponse, AnswersQuery, ClassroomCreate, ClassroomResponse, GenerateQuestionRequest,
    GenerateQuestionResponse, NavigateRequest, NavigateResponse, QuestionUpdate, StudentListEntry,
};
use crate::services::ai_feedback::QuestionPrompt;
use crate::services::{codes, export};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_classroom))
        .route("/questions/generate", post(generate_question))
        .route("/:class_code", get(get_classroom))
        .route("/:class_code/question", put(update_question))
        .route("/:class_code/close", post(close_classroom))
        .route("/:class_code/navigate", post(navigate))
        .route("/:class_code/students", get(list_students))
        .route("/:class_code/answers", get(list_answers))
        .route("/:class_code/export", get(export_data))
}

async fn create_classroom(
    state: axum::extract::State<AppState>,
    Json(payload): Json<ClassroomCreate>,
) -> Result<(StatusCode, Json<ClassroomResponse>), ApiError> {
    let question = match payload.question.as_deref() {
        Some(text) => Some(validate_question_text(text)?),
        None => None,
    };
    let teacher_id = payload
        .teacher_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(codes::generate_teacher_id);

    let now = primitive_now_utc();
    for _ in 0..state.settings().classroom().code_retry_attempts {
        let class_code = codes::generate_class_code();
        let created = repositories::classrooms::create(
            state.db(),
            repositories::classrooms::CreateClassroom {
                class_code: &class_code,
                teacher_id: &teacher_id,
                question,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create class, please try again."))?;

        if !created {
            tracing::warn!(class_code = %class_code, "Class code collision; regenerating");
            continue;
        }

        metrics::counter!("classrooms_created_total").increment(1);
        tracing::info!(class_code = %class_code, teacher_id = %teacher_id, "Classroom created");

        let classroom = repositories::classrooms::find_by_code(state.db(), &class_code)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch created classroom"))?
            .ok_or_else(|| ApiError::Internal("Classroom missing after create".to_string()))?;

        return Ok((StatusCode::CREATED, Json(ClassroomResponse::from_db(classroom))));
    }

    Err(ApiError::ServiceUnavailable(
        "Could not allocate a class code. Please try again.".to_string(),
    ))
}

/// Snapshot of a classroom row; this is also the primitive students poll to
/// detect a new question.
async fn get_classroom(
    axum::extract::Path(class_code): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let class_code = validate_class_code(&class_code)?;
    let classroom = repositories::classrooms::find_by_code(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up the class. Please try again."))?
        .ok_or_else(|| ApiError::NotFound("Class not found. Check the code.".to_string()))?;

    Ok(Json(ClassroomResponse::from_db(classroom)))
}

async fn update_question(
    axum::extract::Path(class_code): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let class_code = validate_class_code(&class_code)?;
    let question = validate_question_text(&payload.question)?;

    let updated = repositories::classrooms::update_question(state.db(), &class_code, question)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update the question. Please try again."))?;

    if !updated {
        return Err(ApiError::NotFound("Class not found. Check the code.".to_string()));
    }

    let classroom = repositories::classrooms::find_by_code(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated classroom"))?
        .ok_or_else(|| ApiError::Internal("Classroom missing after update".to_string()))?;

    Ok(Json(ClassroomResponse::from_db(classroom)))
}

async fn close_classroom(
    axum::extract::Path(class_code): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let class_code = validate_class_code(&class_code)?;
    let closed = repositories::classrooms::close(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close the class. Please try again."))?;

    if !closed {
        return Err(ApiError::NotFound("Class not found. Check the code.".to_string()));
    }

    tracing::info!(class_code = %class_code, "Classroom closed");

    let classroom = repositories::classrooms::find_by_code(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch closed classroom"))?
        .ok_or_else(|| ApiError::Internal("Classroom missing after close".to_string()))?;

    Ok(Json(ClassroomResponse::from_db(classroom)))
}

/// One authoring step: apply the action to the teacher's session and mirror
/// the active question into the classroom row when the step changed it.
async fn navigate(
    axum::extract::Path(class_code): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
    Json(payload): Json<NavigateRequest>,
) -> Result<Json<NavigateResponse>, ApiError> {
    let class_code = validate_class_code(&class_code)?;
    let transition = payload.session.apply(payload.action);

    let mut pushed = false;
    if transition.active_changed {
        if let Some(question) = transition.session.active_question() {
            let updated =
                repositories::classrooms::update_question(state.db(), &class_code, question)
                    .await
                    .map_err(|e| {
                        ApiError::internal(e, "Failed to update the question. Please try again.")
                    })?;

            if !updated {
                return Err(ApiError::NotFound("Class not found. Check the code.".to_string()));
            }
            pushed = true;
        }
    }

    Ok(Json(NavigateResponse { session: transition.session, pushed }))
}

async fn list_students(
    axum::extract::Path(class_code): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<StudentListEntry>>, ApiError> {
    let class_code = validate_class_code(&class_code)?;
    let students = repositories::students::list_for_classroom(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students. Please try again."))?;

    let response = students
        .into_iter()
        .map(|student| StudentListEntry {
            student_id: student.student_id,
            joined_at: format_primitive(student.joined_at),
        })
        .collect();

    Ok(Json(response))
}

async fn list_answers(
    axum::extract::Path(class_code): axum::extract::Path<String>,
    axum::extract::Query(query): axum::extract::Query<AnswersQuery>,
    state: axum::extract::State<AppState>,
) -> Result<Json<Vec<AnswerResponse>>, ApiError> {
    let class_code = validate_class_code(&class_code)?;
    let answers =
        repositories::answers::list_for_question(state.db(), &class_code, &query.question)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list answers. Please try again."))?;

    Ok(Json(answers.into_iter().map(AnswerResponse::from_view).collect()))
}

async fn export_data(
    axum::extract::Path(class_code): axum::extract::Path<String>,
    state: axum::extract::State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let class_code = validate_class_code(&class_code)?;
    let rows = repositories::answers::export_rows(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to export class data. Please try again."))?;

    let body = export::render_csv(&rows)
        .map_err(|e| ApiError::internal(e, "Failed to render class data export"))?;

    let timestamp = OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day][hour][minute][second]"))
        .unwrap_or_default();
    let disposition =
        format!("attachment; filename=\"classroom_{class_code}_{timestamp}.csv\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

async fn generate_question(
    state: axum::extract::State<AppState>,
    Json(payload): Json<GenerateQuestionRequest>,
) -> Result<Json<GenerateQuestionResponse>, ApiError> {
    let prompt = QuestionPrompt {
        subject: payload.subject,
        difficulty: payload.difficulty,
        keywords: payload.keywords,
        regenerate: payload.regenerate,
        previous_question: payload.previous_question,
        attempt: payload.attempt,
    };

    let question = state.ai().generate_question(&prompt).await.map_err(|err| {
        tracing::error!(error = %err, "AI question generation failed");
        ApiError::BadGateway("Failed to generate a question. Please try again.".to_string())
    })?;

    Ok(Json(GenerateQuestionResponse { question }))
}

#[cfg(test)]
mod tests;
