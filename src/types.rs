use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};

// =============================================================================
// Common Types
// =============================================================================

/// Course run identifier, e.g. `course-v1:edX+DemoX+2024`
pub type CourseKey = String;
/// Identifier of a block inside a course outline
pub type UsageKey = String;
/// Nanoseconds since the Unix epoch (same clock as `ic_cdk::api::time`)
pub type Timestamp = u64;

/// Learner account as known to this canister
#[derive(Clone, Debug, CandidType, Deserialize, Serialize, PartialEq)]
pub struct UserAccount {
    pub principal: Principal,
    pub username: String,
    pub email: String,
    /// False until the learner confirms their email address
    pub is_active: bool,
    pub date_joined: Timestamp,
}

// =============================================================================
// Platform Configuration
// =============================================================================

/// Site-wide settings used by the learner dashboard.
/// Replaced wholesale by `set_platform_config`.
#[derive(Clone, Debug, CandidType, Deserialize, Serialize, PartialEq)]
pub struct PlatformConfig {
    /// Contact address shown for general support
    pub support_email: String,
    /// Contact address shown for payment questions
    pub billing_email: String,
    /// Marketing page listing the course catalog
    pub course_search_url: String,
    /// Support page for account activation problems, if the site has one
    pub activation_email_support_link: Option<String>,
    /// Generic support site, used when no activation link is configured
    pub support_site_link: String,
    pub ecommerce_enabled: bool,
    pub ecommerce_payment_page_url: Option<String>,
    /// When non-empty, only courses from these orgs are shown
    pub org_allow_list: Vec<String>,
    /// Orgs hidden from the dashboard (ignored if an allow list is set)
    pub org_block_list: Vec<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            support_email: "support@example.com".to_string(),
            billing_email: "billing@example.com".to_string(),
            course_search_url: "/courses".to_string(),
            activation_email_support_link: None,
            support_site_link: "/support".to_string(),
            ecommerce_enabled: false,
            ecommerce_payment_page_url: None,
            org_allow_list: Vec::new(),
            org_block_list: Vec::new(),
        }
    }
}

impl PlatformConfig {
    /// Whether courses from `org` are visible under the site's org lists
    pub fn org_is_visible(&self, org: &str) -> bool {
        if !self.org_allow_list.is_empty() {
            return self.org_allow_list.iter().any(|o| o == org);
        }
        !self.org_block_list.iter().any(|o| o == org)
    }
}

// =============================================================================
// Health & Stats
// =============================================================================

#[derive(Clone, Debug, CandidType, Deserialize, Serialize, Default, PartialEq)]
pub struct Stats {
    pub total_users: u64,
    pub total_course_overviews: u64,
    pub total_enrollments: u64,
    pub total_entitlements: u64,
    pub total_course_outlines: u64,
    pub total_discussion_configurations: u64,
}
