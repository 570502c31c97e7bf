//! User and course directory entries returned by the host platform

use serde::{Deserialize, Serialize};

/// A user as listed by the identity provider's directory search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub display_name: String,
    pub email: String,
}

/// A published course as listed by the catalog search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: i64,
    pub title: String,
}

/// Option shown in a search picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub text: String,
}

impl From<UserSummary> for SearchResult {
    fn from(user: UserSummary) -> Self {
        Self {
            id: user.id,
            text: format!("{} ({})", user.display_name, user.email),
        }
    }
}

impl From<CourseSummary> for SearchResult {
    fn from(course: CourseSummary) -> Self {
        Self {
            id: course.id,
            text: course.title,
        }
    }
}
