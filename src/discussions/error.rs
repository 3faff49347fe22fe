//! Error types for the Discussions module

use crate::types::{CourseKey, UsageKey};

/// Errors raised while validating settings or deriving contexts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscussionsError {
    #[error("course key cannot be empty")]
    EmptyCourseKey,

    /// Topic declared without a provider id
    #[error("discussion topic '{title}' is missing an id")]
    MissingTopicId { title: String },

    #[error("discussion topic title cannot be empty")]
    EmptyTopicTitle,

    #[error("discussion topic '{0}' is declared more than once")]
    DuplicateTopic(String),

    #[error("outline block '{display_name}' has an empty usage key")]
    BlankUsageKey { display_name: String },

    #[error("usage key '{0}' appears more than once in the outline")]
    DuplicateUsageKey(UsageKey),

    #[error("outline belongs to {actual}, expected {expected}")]
    CourseKeyMismatch {
        expected: CourseKey,
        actual: CourseKey,
    },

    #[error("no course outline stored for {0}")]
    OutlineNotFound(CourseKey),
}
