use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "classroomstatus", rename_all = "lowercase")]
pub(crate) enum ClassroomStatus {
    Active,
    Closed,
}

impl ClassroomStatus {
    pub(crate) fn is_active(self) -> bool {
        matches!(self, ClassroomStatus::Active)
    }
}
