//! State management for the Discussions module

use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;

use super::types::*;
use crate::types::CourseKey;

/// Per-course outlines, settings and last derived configuration
#[derive(Default)]
pub struct DiscussionsState {
    /// Resolved outlines by course
    pub outlines: BTreeMap<CourseKey, CourseOutline>,
    /// Stored settings by course (absent means defaults)
    pub settings: BTreeMap<CourseKey, DiscussionSettings>,
    /// Last derived configuration by course
    pub configurations: BTreeMap<CourseKey, CourseDiscussionConfigurationData>,
}

impl DiscussionsState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_outline(&self, course_key: &str) -> Option<&CourseOutline> {
        self.outlines.get(course_key)
    }

    /// Effective settings for a course, defaults when none are stored
    pub fn effective_settings(&self, course_key: &str) -> DiscussionSettings {
        self.settings.get(course_key).cloned().unwrap_or_default()
    }

    pub fn get_configuration(&self, course_key: &str) -> Option<&CourseDiscussionConfigurationData> {
        self.configurations.get(course_key)
    }
}

thread_local! {
    pub static DISCUSSIONS_STATE: RefCell<DiscussionsState> = RefCell::new(DiscussionsState::new());
}

/// Helper function to access discussions state
pub fn with_discussions_state<F, R>(f: F) -> R
where
    F: FnOnce(&DiscussionsState) -> R,
{
    DISCUSSIONS_STATE.with(|state| f(&state.borrow()))
}

/// Helper function to mutably access discussions state
pub fn with_discussions_state_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut DiscussionsState) -> R,
{
    DISCUSSIONS_STATE.with(|state| f(&mut state.borrow_mut()))
}

// =============================================================================
// Stable Storage Types
// =============================================================================

/// Serializable state for canister upgrades
#[derive(CandidType, Deserialize, Serialize, Clone, Default)]
pub struct StableDiscussionsState {
    pub outlines: Vec<(CourseKey, CourseOutline)>,
    pub settings: Vec<(CourseKey, DiscussionSettings)>,
    pub configurations: Vec<(CourseKey, CourseDiscussionConfigurationData)>,
}

impl From<&DiscussionsState> for StableDiscussionsState {
    fn from(state: &DiscussionsState) -> Self {
        StableDiscussionsState {
            outlines: state.outlines.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            settings: state.settings.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            configurations: state
                .configurations
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

impl From<StableDiscussionsState> for DiscussionsState {
    fn from(stable: StableDiscussionsState) -> Self {
        DiscussionsState {
            outlines: stable.outlines.into_iter().collect(),
            settings: stable.settings.into_iter().collect(),
            configurations: stable.configurations.into_iter().collect(),
        }
    }
}
