use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::ai_feedback::AiFeedbackService;
use crate::services::video::VideoService;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    ai: AiFeedbackService,
    video: VideoService,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        ai: AiFeedbackService,
        video: VideoService,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, ai, video }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn ai(&self) -> &AiFeedbackService {
        &self.inner.ai
    }

    pub(crate) fn video(&self) -> &VideoService {
        &self.inner.video
    }
}
