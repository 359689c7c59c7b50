use axum::routing::post;
use axum::{Json, Router};

use crate::api::errors::ApiError;
use crate::api::validation::{validate_answer_text, validate_class_code, validate_image_url};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::student::{
    JoinRequest, LeaveRequest, SessionResponse, SubmitAnswerRequest, SyncRequest, SyncResponse,
    VideoCreateRequest, VideoPollRequest, VideoSessionResponse,
};
use crate::services::codes;
use crate::services::video::{VideoTaskStatus, DEFAULT_VOICE_ID};
use crate::session::student::{StudentEvent, StudentSession};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/join", post(join))
        .route("/sync", post(sync))
        .route("/answers", post(submit_answer))
        .route("/video", post(create_video))
        .route("/video/poll", post(poll_video))
        .route("/leave", post(leave))
}

async fn join(
    state: axum::extract::State<AppState>,
    Json(payload): Json<JoinRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let class_code = validate_class_code(&payload.class_code)?;

    let classroom = repositories::classrooms::find_by_code(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up the class. Please try again."))?
        .ok_or_else(|| ApiError::NotFound("Class not found. Check the code.".to_string()))?;

    if !classroom.status.is_active() {
        return Err(ApiError::Conflict(
            "This class is no longer accepting new students.".to_string(),
        ));
    }

    let student_id = codes::generate_student_id();
    let joined = repositories::students::add(
        state.db(),
        repositories::students::AddStudent {
            student_id: &student_id,
            class_code: &class_code,
            joined_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to join the class. Please try again."))?;

    if !joined {
        // Closed between the read above and the insert, or an id collision.
        return Err(ApiError::Conflict("Could not join this class. Please try again.".to_string()));
    }

    metrics::counter!("students_joined_total").increment(1);
    tracing::info!(student_id = %student_id, class_code = %class_code, "Student joined classroom");

    let session =
        StudentSession::default().apply(StudentEvent::Joined { student_id, class_code });
    Ok(Json(SessionResponse::new(session)))
}

/// Reconciliation poll: compare the cached question against the store and
/// transition. A second call with no intervening teacher update is a no-op.
async fn sync(
    state: axum::extract::State<AppState>,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let session = payload.session;
    let Some(class_code) = session.class_code.clone() else {
        return Err(ApiError::BadRequest("Join a class before syncing.".to_string()));
    };

    let classroom = repositories::classrooms::find_by_code(state.db(), &class_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to look up the class. Please try again."))?
        .ok_or_else(|| ApiError::NotFound("Class not found. Check the code.".to_string()))?;

    let cached = session.current_question.clone();
    let session = session.apply(StudentEvent::QuestionFetched { question: classroom.question });
    let changed = session.current_question != cached;

    Ok(Json(SyncResponse { phase: session.phase(), changed, session }))
}

async fn submit_answer(
    state: axum::extract::State<AppState>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let answer = validate_answer_text(&payload.answer)?.to_string();
    let session = payload.session;

    let (Some(student_id), Some(class_code)) =
        (session.student_id.clone(), session.class_code.clone())
    else {
        return Err(ApiError::BadRequest("Join a class before submitting.".to_string()));
    };
    let Some(question) = session.current_question.clone() else {
        return Err(ApiError::BadRequest("No question available at the moment.".to_string()));
    };
    if session.answer_submitted {
        return Err(ApiError::Conflict(
            "You already submitted your answer for this question.".to_string(),
        ));
    }

    let normalized = state.ai().evaluate_answer(&question, &answer).await;
    let evaluation = normalized.evaluation;

    repositories::answers::insert(
        state.db(),
        repositories::answers::InsertAnswer {
            student_id: &student_id,
            class_code: &class_code,
            question: &question,
            answer: &answer,
            score: evaluation.score,
            feedback: &evaluation.feedback,
            suggestions: serde_json::json!(&evaluation.suggestions),
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save your answer. Please try again."))?;

    metrics::counter!("answers_submitted_total").increment(1);
    tracing::info!(student_id = %student_id, class_code = %class_code, "Answer submitted");

    let session = session.apply(StudentEvent::AnswerAccepted { answer, evaluation });
    Ok(Json(SessionResponse::new(session)))
}

async fn create_video(
    state: axum::extract::State<AppState>,
    Json(payload): Json<VideoCreateRequest>,
) -> Result<Json<VideoSessionResponse>, ApiError> {
    let session = payload.session;
    if !session.answer_submitted {
        return Err(ApiError::Conflict(
            "Submit your answer before requesting a video.".to_string(),
        ));
    }

    let image_url = validate_image_url(&payload.image_url)?;
    let voice_id = payload.voice_id.as_deref().unwrap_or(DEFAULT_VOICE_ID);
    let script = match payload.script.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => default_video_script(&session),
    };

    let task_id = state.video().create_talk(image_url, &script, voice_id).await.map_err(
        |err| {
            tracing::error!(error = %err, "Video task creation failed");
            ApiError::BadGateway("Failed to create the video. Please try again.".to_string())
        },
    )?;

    metrics::counter!("videos_created_total").increment(1);
    tracing::info!(task_id = %task_id, "Video task created");

    let session = session.apply(StudentEvent::VideoTaskCreated { task_id });
    Ok(Json(VideoSessionResponse {
        phase: session.phase(),
        retry_after_seconds: Some(state.video().poll_interval_seconds()),
        session,
    }))
}

/// One provider status poll. Terminal failure lands in the session (back to
/// AnswerSubmitted with the error flag); a transport failure is a 502 the
/// client can retry.
async fn poll_video(
    state: axum::extract::State<AppState>,
    Json(payload): Json<VideoPollRequest>,
) -> Result<Json<VideoSessionResponse>, ApiError> {
    let session = payload.session;
    let Some(task_id) = session.video.task_id.clone() else {
        return Err(ApiError::BadRequest("No video task in progress.".to_string()));
    };

    let status = state.video().fetch_status(&task_id).await.map_err(|err| {
        tracing::error!(error = %err, task_id = %task_id, "Video status check failed");
        ApiError::BadGateway("Failed to check video status. Please try again.".to_string())
    })?;

    if status == VideoTaskStatus::Failed {
        tracing::warn!(task_id = %task_id, "Video generation failed");
    }

    let session = session.apply(StudentEvent::VideoPolled {
        status,
        poll_cap: state.video().max_session_polls(),
    });

    let retry_after_seconds = (session.video.task_id.is_some() && session.video.url.is_none())
        .then(|| state.video().poll_interval_seconds());

    Ok(Json(VideoSessionResponse { phase: session.phase(), retry_after_seconds, session }))
}

async fn leave(Json(payload): Json<LeaveRequest>) -> Json<SessionResponse> {
    let session = payload.session.apply(StudentEvent::Left);
    Json(SessionResponse::new(session))
}

fn default_video_script(session: &StudentSession) -> String {
    let defaults = crate::services::evaluation::DEFAULT_SUGGESTIONS;
    let suggestions: Vec<&str> = match &session.evaluation {
        Some(evaluation) if evaluation.suggestions.len() >= 3 => {
            evaluation.suggestions.iter().map(String::as_str).collect()
        }
        _ => defaults.to_vec(),
    };

    format!(
        "Hello! I've reviewed your answer to the discussion question.\n\n\
         Here are three suggestions to improve your response:\n\n\
         First, {}\n\nSecond, {}\n\nAnd finally, {}\n\n\
         Implementing these suggestions will strengthen your answer and make it more effective!",
        suggestions[0], suggestions[1], suggestions[2]
    )
}
