use serde::{Deserialize, Serialize};

use crate::services::evaluation::Evaluation;
use crate::services::video::VideoTaskStatus;

/// Everything a student client caches between interactions. The service holds
/// nothing; the client posts this back with each request and the handlers
/// apply pure transitions against the store's authoritative state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct StudentSession {
    #[serde(default)]
    pub(crate) student_id: Option<String>,
    #[serde(default)]
    pub(crate) class_code: Option<String>,
    #[serde(default)]
    pub(crate) current_question: Option<String>,
    #[serde(default)]
    pub(crate) answer_submitted: bool,
    #[serde(default)]
    pub(crate) answer_text: Option<String>,
    #[serde(default)]
    pub(crate) evaluation: Option<Evaluation>,
    #[serde(default)]
    pub(crate) video: VideoState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct VideoState {
    #[serde(default)]
    pub(crate) task_id: Option<String>,
    #[serde(default)]
    pub(crate) url: Option<String>,
    #[serde(default)]
    pub(crate) error: bool,
    #[serde(default)]
    pub(crate) polls: u32,
}

#[derive(Debug, Clone)]
pub(crate) enum StudentEvent {
    Joined { student_id: String, class_code: String },
    /// Result of polling the classroom's mirrored question.
    QuestionFetched { question: Option<String> },
    AnswerAccepted { answer: String, evaluation: Evaluation },
    VideoTaskCreated { task_id: String },
    /// One provider status poll; `poll_cap` bounds the busy-poll.
    VideoPolled { status: VideoTaskStatus, poll_cap: u32 },
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum StudentPhase {
    Idle,
    QuestionPosted,
    AnswerSubmitted,
    VideoRequested,
    VideoReady,
}

impl StudentSession {
    pub(crate) fn apply(mut self, event: StudentEvent) -> Self {
        match event {
            StudentEvent::Joined { student_id, class_code } => StudentSession {
                student_id: Some(student_id),
                class_code: Some(class_code),
                ..StudentSession::default()
            },
            StudentEvent::QuestionFetched { question } => {
                // Compare by value: a new question unconditionally invalidates
                // all downstream answer and video state.
                if question == self.current_question {
                    return self;
                }
                StudentSession {
                    student_id: self.student_id,
                    class_code: self.class_code,
                    current_question: question,
                    ..StudentSession::default()
                }
            }
            StudentEvent::AnswerAccepted { answer, evaluation } => {
                self.answer_submitted = true;
                self.answer_text = Some(answer);
                self.evaluation = Some(evaluation);
                self
            }
            StudentEvent::VideoTaskCreated { task_id } => {
                self.video = VideoState { task_id: Some(task_id), ..VideoState::default() };
                self
            }
            StudentEvent::VideoPolled { status, poll_cap } => {
                if self.video.task_id.is_none() {
                    return self;
                }
                self.video.polls = self.video.polls.saturating_add(1);
                match status {
                    VideoTaskStatus::Done(url) => {
                        self.video.url = Some(url);
                        self.video.error = false;
                    }
                    VideoTaskStatus::Failed => {
                        // Back to AnswerSubmitted with the error surfaced.
                        self.video = VideoState { error: true, ..VideoState::default() };
                    }
                    VideoTaskStatus::Pending(_) => {
                        if self.video.polls >= poll_cap {
                            self.video = VideoState { error: true, ..VideoState::default() };
                        }
                    }
                }
                self
            }
            StudentEvent::Left => StudentSession::default(),
        }
    }

    pub(crate) fn phase(&self) -> StudentPhase {
        if self.video.url.is_some() {
            StudentPhase::VideoReady
        } else if self.video.task_id.is_some() {
            StudentPhase::VideoRequested
        } else if self.answer_submitted {
            StudentPhase::AnswerSubmitted
        } else if self.current_question.is_some() {
            StudentPhase::QuestionPosted
        } else {
            StudentPhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined() -> StudentSession {
        StudentSession::default().apply(StudentEvent::Joined {
            student_id: "S-TEST".to_string(),
            class_code: "AB12".to_string(),
        })
    }

    fn evaluation() -> Evaluation {
        Evaluation {
            score: 0.7,
            feedback: "Solid.".to_string(),
            suggestions: vec!["a".to_string(), "b".to_string(), "c".to_string()],
        }
    }

    #[test]
    fn join_starts_idle() {
        let session = joined();
        assert_eq!(session.phase(), StudentPhase::Idle);
        assert_eq!(session.class_code.as_deref(), Some("AB12"));
    }

    #[test]
    fn fetched_question_posts_and_refetch_is_noop() {
        let session = joined()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) });
        assert_eq!(session.phase(), StudentPhase::QuestionPosted);

        let again = session
            .clone()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) });
        assert_eq!(again, session, "same question must leave the session unchanged");
    }

    #[test]
    fn new_question_hard_resets_answer_and_video_state() {
        let mut session = joined()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) })
            .apply(StudentEvent::AnswerAccepted {
                answer: "Because.".to_string(),
                evaluation: evaluation(),
            })
            .apply(StudentEvent::VideoTaskCreated { task_id: "talk-1".to_string() });
        session.video.url = Some("https://cdn/video.mp4".to_string());

        let reset = session
            .apply(StudentEvent::QuestionFetched { question: Some("Why is Y?".to_string()) });

        assert_eq!(reset.phase(), StudentPhase::QuestionPosted);
        assert_eq!(reset.current_question.as_deref(), Some("Why is Y?"));
        assert!(!reset.answer_submitted);
        assert!(reset.evaluation.is_none());
        assert!(reset.answer_text.is_none());
        assert_eq!(reset.video, VideoState::default());
        assert_eq!(reset.student_id.as_deref(), Some("S-TEST"), "identity survives the reset");
    }

    #[test]
    fn question_cleared_by_teacher_resets_to_idle() {
        let session = joined()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) })
            .apply(StudentEvent::QuestionFetched { question: None });
        assert_eq!(session.phase(), StudentPhase::Idle);
    }

    #[test]
    fn answer_then_video_happy_path() {
        let session = joined()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) })
            .apply(StudentEvent::AnswerAccepted {
                answer: "Because.".to_string(),
                evaluation: evaluation(),
            });
        assert_eq!(session.phase(), StudentPhase::AnswerSubmitted);

        let session = session.apply(StudentEvent::VideoTaskCreated { task_id: "talk-1".to_string() });
        assert_eq!(session.phase(), StudentPhase::VideoRequested);

        let session = session.apply(StudentEvent::VideoPolled {
            status: VideoTaskStatus::Pending("started".to_string()),
            poll_cap: 150,
        });
        assert_eq!(session.phase(), StudentPhase::VideoRequested);
        assert_eq!(session.video.polls, 1);

        let session = session.apply(StudentEvent::VideoPolled {
            status: VideoTaskStatus::Done("https://cdn/video.mp4".to_string()),
            poll_cap: 150,
        });
        assert_eq!(session.phase(), StudentPhase::VideoReady);
        assert_eq!(session.video.url.as_deref(), Some("https://cdn/video.mp4"));
    }

    #[test]
    fn video_error_falls_back_to_answer_submitted_with_flag() {
        let session = joined()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) })
            .apply(StudentEvent::AnswerAccepted {
                answer: "Because.".to_string(),
                evaluation: evaluation(),
            })
            .apply(StudentEvent::VideoTaskCreated { task_id: "talk-1".to_string() })
            .apply(StudentEvent::VideoPolled { status: VideoTaskStatus::Failed, poll_cap: 150 });

        assert_eq!(session.phase(), StudentPhase::AnswerSubmitted);
        assert!(session.video.error);
        assert!(session.video.url.is_none());
        assert!(session.video.task_id.is_none());
    }

    #[test]
    fn pending_polls_past_cap_give_up() {
        let mut session = joined()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) })
            .apply(StudentEvent::AnswerAccepted {
                answer: "Because.".to_string(),
                evaluation: evaluation(),
            })
            .apply(StudentEvent::VideoTaskCreated { task_id: "talk-1".to_string() });

        for _ in 0..3 {
            session = session.apply(StudentEvent::VideoPolled {
                status: VideoTaskStatus::Pending("started".to_string()),
                poll_cap: 3,
            });
        }

        assert_eq!(session.phase(), StudentPhase::AnswerSubmitted);
        assert!(session.video.error);
    }

    #[test]
    fn leave_discards_everything() {
        let session = joined()
            .apply(StudentEvent::QuestionFetched { question: Some("Why is X?".to_string()) })
            .apply(StudentEvent::Left);
        assert_eq!(session, StudentSession::default());
        assert_eq!(session.phase(), StudentPhase::Idle);
    }
}
