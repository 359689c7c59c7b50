use serde::{Deserialize, Serialize};

use crate::session::student::{StudentPhase, StudentSession};

#[derive(Debug, Deserialize)]
pub(crate) struct JoinRequest {
    pub(crate) class_code: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) session: StudentSession,
    pub(crate) phase: StudentPhase,
}

impl SessionResponse {
    pub(crate) fn new(session: StudentSession) -> Self {
        let phase = session.phase();
        Self { session, phase }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SyncRequest {
    pub(crate) session: StudentSession,
}

#[derive(Debug, Serialize)]
pub(crate) struct SyncResponse {
    pub(crate) session: StudentSession,
    pub(crate) phase: StudentPhase,
    /// True when this poll observed a different question than the cache.
    pub(crate) changed: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitAnswerRequest {
    pub(crate) session: StudentSession,
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoCreateRequest {
    pub(crate) session: StudentSession,
    pub(crate) image_url: String,
    #[serde(default)]
    pub(crate) voice_id: Option<String>,
    #[serde(default)]
    pub(crate) script: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoSessionResponse {
    pub(crate) session: StudentSession,
    pub(crate) phase: StudentPhase,
    /// Suggested delay before the next status poll, when one is expected.
    pub(crate) retry_after_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoPollRequest {
    pub(crate) session: StudentSession,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeaveRequest {
    pub(crate) session: StudentSession,
}
