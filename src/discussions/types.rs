//! Type definitions for the Discussions module
//!
//! Outline records are a resolved snapshot of the course structure; settings
//! are the per-course discussions configuration. Both are plain data.

use candid::CandidType;
use serde::{Deserialize, Serialize};

use crate::types::{CourseKey, Timestamp, UsageKey};

// =============================================================================
// Course Outline
// =============================================================================

/// Resolved course outline: sections → subsections → units
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CourseOutline {
    pub course_key: CourseKey,
    pub sections: Vec<OutlineSection>,
}

/// Top-level chapter of a course
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OutlineSection {
    pub usage_key: UsageKey,
    pub display_name: String,
    pub subsections: Vec<OutlineSubsection>,
}

/// Sequence inside a section. Grading is decided here and applies to every unit below.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OutlineSubsection {
    pub usage_key: UsageKey,
    pub display_name: String,
    pub graded: bool,
    pub units: Vec<OutlineUnit>,
}

/// Leaf of the outline where an in-context discussion can be anchored
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct OutlineUnit {
    pub usage_key: UsageKey,
    pub display_name: String,
    pub discussion_enabled: bool,
}

impl OutlineUnit {
    /// Units allow discussions unless an author turns them off
    pub fn new(usage_key: impl Into<UsageKey>, display_name: impl Into<String>) -> Self {
        Self {
            usage_key: usage_key.into(),
            display_name: display_name.into(),
            discussion_enabled: true,
        }
    }

    pub fn with_discussion_enabled(mut self, enabled: bool) -> Self {
        self.discussion_enabled = enabled;
        self
    }
}

// =============================================================================
// Discussion Settings
// =============================================================================

/// Course-wide discussion topic declared in course settings
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DiscussionTopic {
    pub title: String,
    /// Provider-side identifier. Required; kept optional so that incomplete
    /// settings can be stored and rejected at derivation time.
    pub id: Option<String>,
}

impl DiscussionTopic {
    pub fn new(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: Some(id.into()),
        }
    }
}

/// Effective discussions configuration for a course.
/// Built once per derivation and never mutated in place.
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct DiscussionSettings {
    pub provider_type: String,
    /// Master switch for unit-anchored contexts
    pub enable_in_context: bool,
    /// Whether units in graded subsections may carry discussions
    pub enable_graded_units: bool,
    /// Whether ungraded units are listed individually
    pub unit_level_visibility: bool,
    /// Course-wide topics, in display order
    pub topics: Vec<DiscussionTopic>,
    /// Provider-specific options, passed through untouched
    pub plugin_configuration: Vec<(String, String)>,
}

impl Default for DiscussionSettings {
    fn default() -> Self {
        Self {
            provider_type: DEFAULT_PROVIDER_TYPE.to_string(),
            enable_in_context: true,
            enable_graded_units: false,
            unit_level_visibility: true,
            topics: vec![DiscussionTopic::new(DEFAULT_TOPIC_TITLE, DEFAULT_TOPIC_ID)],
            plugin_configuration: Vec::new(),
        }
    }
}

impl DiscussionSettings {
    /// Apply a partial update, producing a new settings value
    pub fn merged(&self, update: DiscussionSettingsUpdate) -> Self {
        Self {
            provider_type: update
                .provider_type
                .unwrap_or_else(|| self.provider_type.clone()),
            enable_in_context: update.enable_in_context.unwrap_or(self.enable_in_context),
            enable_graded_units: update
                .enable_graded_units
                .unwrap_or(self.enable_graded_units),
            unit_level_visibility: update
                .unit_level_visibility
                .unwrap_or(self.unit_level_visibility),
            topics: update.topics.unwrap_or_else(|| self.topics.clone()),
            plugin_configuration: update
                .plugin_configuration
                .unwrap_or_else(|| self.plugin_configuration.clone()),
        }
    }
}

/// Partial settings update; `None` keeps the current value
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, Default)]
pub struct DiscussionSettingsUpdate {
    pub provider_type: Option<String>,
    pub enable_in_context: Option<bool>,
    pub enable_graded_units: Option<bool>,
    pub unit_level_visibility: Option<bool>,
    pub topics: Option<Vec<DiscussionTopic>>,
    pub plugin_configuration: Option<Vec<(String, String)>>,
}

// =============================================================================
// Derived Contexts
// =============================================================================

/// Ancestry of a unit-anchored context
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextAncestry {
    pub section: String,
    pub subsection: String,
    pub unit: String,
}

/// One place where discussion threads can be anchored
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DiscussionTopicContext {
    pub title: String,
    /// Set for unit contexts only
    pub usage_key: Option<UsageKey>,
    pub group_id: Option<u64>,
    /// Set for course-wide topics only
    pub external_id: Option<String>,
    pub ordering: u32,
    pub context: Option<ContextAncestry>,
}

/// Result of refreshing a course's discussions configuration
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CourseDiscussionConfigurationData {
    pub course_key: CourseKey,
    pub provider_type: String,
    pub enable_in_context: bool,
    pub enable_graded_units: bool,
    pub unit_level_visibility: bool,
    pub plugin_configuration: Vec<(String, String)>,
    pub contexts: Vec<DiscussionTopicContext>,
    /// Hex SHA-256 over the ordered contexts
    pub contexts_fingerprint: String,
    /// False when the contexts match the previously stored configuration
    pub changed: bool,
    pub derived_at: Timestamp,
}

impl CourseDiscussionConfigurationData {
    /// Same contexts and settings, ignoring `changed` and `derived_at`
    pub fn same_content_as(&self, other: &Self) -> bool {
        self.course_key == other.course_key
            && self.contexts_fingerprint == other.contexts_fingerprint
            && self.provider_type == other.provider_type
            && self.enable_in_context == other.enable_in_context
            && self.enable_graded_units == other.enable_graded_units
            && self.unit_level_visibility == other.unit_level_visibility
            && self.plugin_configuration == other.plugin_configuration
    }
}

// =============================================================================
// Constants
// =============================================================================

/// Ordering shared by every unit context so they sort after all topics.
///
/// Topics take orderings `0..n`, so with 100 or more topics the later ones
/// reach this value and sort together with or after the units.
pub const UNIT_CONTEXT_ORDERING: u32 = 100;

pub const DEFAULT_PROVIDER_TYPE: &str = "legacy";

pub const DEFAULT_TOPIC_TITLE: &str = "General";

pub const DEFAULT_TOPIC_ID: &str = "course";
