//! Course Discussions Configuration Module
//!
//! Derives the discussion contexts of a course (course-wide topics plus
//! units that can host in-context discussions) from a resolved outline and
//! the course's discussions settings.
//!
//! Key Features:
//! - Pure derivation over an immutable outline + settings snapshot
//! - Fail-fast validation of topics and outline structure
//! - Partial settings updates merged into per-course defaults
//! - Fingerprinted configuration so no-op refreshes are detectable

pub mod api;
pub mod error;
pub mod hash;
pub mod state;
pub mod types;
pub mod validation;

// Re-export types for external use
pub use types::{
    CourseDiscussionConfigurationData, CourseOutline, DiscussionSettings,
    DiscussionSettingsUpdate, DiscussionTopicContext,
};
