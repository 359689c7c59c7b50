use serde::{Deserialize, Serialize};

/// The teacher's authoring state: an ordered list of drafted questions and a
/// pointer to the active one. Only the pointed-to text is mirrored into the
/// classroom row, and only when a transition reports `active_changed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TeacherSession {
    #[serde(default)]
    pub(crate) teacher_id: Option<String>,
    #[serde(default)]
    pub(crate) class_code: Option<String>,
    #[serde(default)]
    pub(crate) questions: Vec<String>,
    #[serde(default)]
    pub(crate) active_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum TeacherAction {
    Add { text: String },
    Edit { index: usize, text: String },
    Delete { index: usize },
    MoveUp { index: usize },
    MoveDown { index: usize },
    Select { index: usize },
    Next,
    Previous,
    ClassCreated { class_code: String },
    ClassEnded,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TeacherTransition {
    pub(crate) session: TeacherSession,
    /// True when the active question's text changed and should be pushed to
    /// the persistence gateway.
    pub(crate) active_changed: bool,
}

impl TeacherSession {
    pub(crate) fn active_question(&self) -> Option<&str> {
        self.active_index.and_then(|index| self.questions.get(index)).map(String::as_str)
    }

    pub(crate) fn apply(mut self, action: TeacherAction) -> TeacherTransition {
        match action {
            TeacherAction::Add { text } => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return unchanged(self);
                }
                self.questions.push(text);
                if self.active_index.is_none() {
                    self.active_index = Some(self.questions.len() - 1);
                    return changed(self);
                }
                unchanged(self)
            }
            TeacherAction::Edit { index, text } => {
                let text = text.trim().to_string();
                if text.is_empty() || index >= self.questions.len() {
                    return unchanged(self);
                }
                let is_active = self.active_index == Some(index);
                self.questions[index] = text;
                if is_active {
                    changed(self)
                } else {
                    unchanged(self)
                }
            }
            TeacherAction::Delete { index } => {
                if index >= self.questions.len() {
                    return unchanged(self);
                }
                self.questions.remove(index);
                match self.active_index {
                    Some(active) if active == index => {
                        if self.questions.is_empty() {
                            self.active_index = None;
                        } else {
                            // Prefer the same slot, else the new last one.
                            self.active_index = Some(index.min(self.questions.len() - 1));
                        }
                        changed(self)
                    }
                    Some(active) if active > index => {
                        self.active_index = Some(active - 1);
                        unchanged(self)
                    }
                    _ => unchanged(self),
                }
            }
            TeacherAction::MoveUp { index } => {
                if index == 0 || index >= self.questions.len() {
                    return unchanged(self);
                }
                self.questions.swap(index, index - 1);
                self.active_index = self.active_index.map(|active| {
                    if active == index {
                        index - 1
                    } else if active == index - 1 {
                        index
                    } else {
                        active
                    }
                });
                unchanged(self)
            }
            TeacherAction::MoveDown { index } => {
                if index + 1 >= self.questions.len() {
                    return unchanged(self);
                }
                self.questions.swap(index, index + 1);
                self.active_index = self.active_index.map(|active| {
                    if active == index {
                        index + 1
                    } else if active == index + 1 {
                        index
                    } else {
                        active
                    }
                });
                unchanged(self)
            }
            TeacherAction::Select { index } => {
                if index >= self.questions.len() || self.active_index == Some(index) {
                    return unchanged(self);
                }
                self.active_index = Some(index);
                changed(self)
            }
            TeacherAction::Next => {
                match self.active_index {
                    Some(active) if active + 1 < self.questions.len() => {
                        self.active_index = Some(active + 1);
                        changed(self)
                    }
                    _ => unchanged(self),
                }
            }
            TeacherAction::Previous => {
                match self.active_index {
                    Some(active) if active > 0 => {
                        self.active_index = Some(active - 1);
                        changed(self)
                    }
                    _ => unchanged(self),
                }
            }
            TeacherAction::ClassCreated { class_code } => {
                self.class_code = Some(class_code);
                unchanged(self)
            }
            TeacherAction::ClassEnded => {
                self.class_code = None;
                unchanged(self)
            }
        }
    }
}

fn changed(session: TeacherSession) -> TeacherTransition {
    TeacherTransition { session, active_changed: true }
}

fn unchanged(session: TeacherSession) -> TeacherTransition {
    TeacherTransition { session, active_changed: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(questions: &[&str], active: Option<usize>) -> TeacherSession {
        TeacherSession {
            teacher_id: Some("T-TEST".to_string()),
            class_code: Some("AB12".to_string()),
            questions: questions.iter().map(ToString::to_string).collect(),
            active_index: active,
        }
    }

    #[test]
    fn first_add_activates_the_question() {
        let transition =
            TeacherSession::default().apply(TeacherAction::Add { text: "Why is X?".to_string() });
        assert!(transition.active_changed);
        assert_eq!(transition.session.active_question(), Some("Why is X?"));
    }

    #[test]
    fn later_adds_do_not_steal_the_pointer() {
        let transition = session_with(&["q1"], Some(0))
            .apply(TeacherAction::Add { text: "q2".to_string() });
        assert!(!transition.active_changed);
        assert_eq!(transition.session.active_question(), Some("q1"));
    }

    #[test]
    fn blank_add_is_rejected() {
        let transition =
            TeacherSession::default().apply(TeacherAction::Add { text: "   ".to_string() });
        assert!(transition.session.questions.is_empty());
        assert!(!transition.active_changed);
    }

    #[test]
    fn editing_the_active_question_pushes() {
        let transition = session_with(&["q1", "q2"], Some(1))
            .apply(TeacherAction::Edit { index: 1, text: "q2 revised".to_string() });
        assert!(transition.active_changed);
        assert_eq!(transition.session.active_question(), Some("q2 revised"));

        let transition = transition
            .session
            .apply(TeacherAction::Edit { index: 0, text: "q1 revised".to_string() });
        assert!(!transition.active_changed);
    }

    #[test]
    fn deleting_the_active_question_selects_a_neighbor() {
        // Same index preferred.
        let transition =
            session_with(&["q1", "q2", "q3"], Some(1)).apply(TeacherAction::Delete { index: 1 });
        assert!(transition.active_changed);
        assert_eq!(transition.session.active_question(), Some("q3"));

        // Deleting the last falls back to the new last index.
        let transition =
            session_with(&["q1", "q2"], Some(1)).apply(TeacherAction::Delete { index: 1 });
        assert!(transition.active_changed);
        assert_eq!(transition.session.active_question(), Some("q1"));
    }

    #[test]
    fn deleting_before_the_pointer_shifts_it_without_pushing() {
        let transition =
            session_with(&["q1", "q2", "q3"], Some(2)).apply(TeacherAction::Delete { index: 0 });
        assert!(!transition.active_changed);
        assert_eq!(transition.session.active_question(), Some("q3"));
    }

    #[test]
    fn deleting_the_only_question_clears_the_pointer() {
        let transition = session_with(&["q1"], Some(0)).apply(TeacherAction::Delete { index: 0 });
        assert!(transition.active_changed);
        assert_eq!(transition.session.active_question(), None);
        assert_eq!(transition.session.active_index, None);
    }

    #[test]
    fn move_up_keeps_the_pointer_on_the_moved_question() {
        let transition =
            session_with(&["q1", "q2", "q3"], Some(1)).apply(TeacherAction::MoveUp { index: 1 });
        assert!(!transition.active_changed);
        assert_eq!(transition.session.questions, vec!["q2", "q1", "q3"]);
        assert_eq!(transition.session.active_question(), Some("q2"));
    }

    #[test]
    fn move_down_follows_a_displaced_pointer() {
        let transition =
            session_with(&["q1", "q2", "q3"], Some(2)).apply(TeacherAction::MoveDown { index: 1 });
        assert!(!transition.active_changed);
        assert_eq!(transition.session.questions, vec!["q1", "q3", "q2"]);
        assert_eq!(transition.session.active_question(), Some("q3"));
    }

    #[test]
    fn navigation_pushes_only_within_bounds() {
        let transition = session_with(&["q1", "q2"], Some(0)).apply(TeacherAction::Next);
        assert!(transition.active_changed);
        assert_eq!(transition.session.active_question(), Some("q2"));

        let transition = transition.session.apply(TeacherAction::Next);
        assert!(!transition.active_changed, "next past the end is a no-op");

        let transition = session_with(&["q1", "q2"], Some(0)).apply(TeacherAction::Previous);
        assert!(!transition.active_changed, "previous before the start is a no-op");
    }

    #[test]
    fn select_same_index_is_noop() {
        let transition = session_with(&["q1", "q2"], Some(1)).apply(TeacherAction::Select { index: 1 });
        assert!(!transition.active_changed);

        let transition = session_with(&["q1", "q2"], Some(1)).apply(TeacherAction::Select { index: 0 });
        assert!(transition.active_changed);
    }

    #[test]
    fn out_of_range_indices_are_noops() {
        let base = session_with(&["q1"], Some(0));
        for action in [
            TeacherAction::Edit { index: 5, text: "x".to_string() },
            TeacherAction::Delete { index: 5 },
            TeacherAction::MoveUp { index: 5 },
            TeacherAction::MoveDown { index: 0 },
            TeacherAction::Select { index: 5 },
        ] {
            let transition = base.clone().apply(action.clone());
            assert_eq!(transition.session, base, "action {action:?} mutated the session");
            assert!(!transition.active_changed);
        }
    }

    #[test]
    fn class_lifecycle_updates_only_the_code() {
        let transition = session_with(&["q1"], Some(0))
            .apply(TeacherAction::ClassEnded);
        assert!(!transition.active_changed);
        assert_eq!(transition.session.class_code, None);
        assert_eq!(transition.session.active_question(), Some("q1"));

        let transition =
            transition.session.apply(TeacherAction::ClassCreated { class_code: "ZZ99".to_string() });
        assert_eq!(transition.session.class_code.as_deref(), Some("ZZ99"));
    }
}
