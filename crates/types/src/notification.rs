use serde::{Deserialize, Serialize};

/// Event handed to the notification collaborator when an item registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub title: String,
    pub description: String,
}

impl NotificationEvent {
    pub fn successful_enrollment(course_title: impl Into<String>) -> Self {
        Self {
            title: "Successful Enrollment".to_string(),
            description: course_title.into(),
        }
    }
}
