//! Error types for the Learner Home module

use candid::Principal;

use crate::types::CourseKey;

/// Errors raised while assembling the dashboard or recording learner data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    #[error("no account registered for {0}")]
    UnknownUser(Principal),

    /// An enrollment points at a course the catalog does not know
    #[error("course overview missing for {0}")]
    CourseOverviewMissing(CourseKey),

    #[error("course key cannot be empty")]
    EmptyCourseKey,

    #[error("course mode slug cannot be empty")]
    EmptyModeSlug,

    #[error("course mode '{0}' is declared more than once")]
    DuplicateCourseMode(String),

    #[error("entitlement uuid cannot be empty")]
    EmptyEntitlementUuid,

    #[error("entitlement {0} belongs to another user")]
    EntitlementOwnerMismatch(String),
}
