//! Type definitions for the Learner Home module

use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{CourseKey, Timestamp};

// =============================================================================
// ID Type Aliases
// =============================================================================

pub type EnrollmentId = u64;
/// Catalog-level identifier shared by all runs of a course
pub type CatalogCourseUuid = String;
pub type EntitlementUuid = String;

// =============================================================================
// Course Records
// =============================================================================

/// Summary of a course run
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CourseOverview {
    pub id: CourseKey,
    pub display_name: String,
    pub org: String,
    /// Catalog course this run belongs to, used to offer entitlement sessions
    pub catalog_course_uuid: Option<CatalogCourseUuid>,
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    /// Courses that must be completed before this one can be viewed
    pub pre_requisite_courses: Vec<CourseKey>,
    pub bulk_email_enabled: bool,
}

impl CourseOverview {
    pub fn has_ended(&self, now: Timestamp) -> bool {
        self.end.map(|end| end <= now).unwrap_or(false)
    }

    pub fn has_started(&self, now: Timestamp) -> bool {
        self.start.map(|start| start <= now).unwrap_or(true)
    }
}

/// Purchasable or free track of a course run
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CourseMode {
    pub slug: String,
    pub name: String,
    /// Minimum price in the smallest currency unit
    pub min_price: u64,
    pub currency: String,
    pub expiration_datetime: Option<Timestamp>,
    pub sku: Option<String>,
    pub bulk_sku: Option<String>,
}

impl CourseMode {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration_datetime
            .map(|expires| expires <= now)
            .unwrap_or(false)
    }
}

pub const MODE_AUDIT: &str = "audit";
pub const MODE_HONOR: &str = "honor";
pub const MODE_VERIFIED: &str = "verified";

/// Modes from which a learner can still upgrade to verified
pub const UPSELL_TO_VERIFIED_MODES: &[&str] = &[MODE_AUDIT, MODE_HONOR];

// =============================================================================
// Learner Records
// =============================================================================

/// A learner's registration in a course run
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user: Principal,
    pub course_id: CourseKey,
    pub mode: String,
    pub is_active: bool,
    pub created: Timestamp,
}

/// Request to create or update an enrollment
#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct RecordEnrollmentRequest {
    pub user: Principal,
    pub course_id: CourseKey,
    pub mode: String,
    pub is_active: bool,
}

/// A learner's right to enroll in some run of a catalog course
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Entitlement {
    pub uuid: EntitlementUuid,
    pub user: Principal,
    pub course_uuid: CatalogCourseUuid,
    pub org: String,
    pub mode: String,
    /// Run the entitlement was redeemed for, if any
    pub enrollment_course_run: Option<CourseKey>,
    pub expired_at: Option<Timestamp>,
    pub created: Timestamp,
}

/// Certificate lifecycle state as shown on the dashboard
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum CertificateStatus {
    /// No certificate yet; grading has not produced one
    Processing,
    /// Enrolled in a mode that does not award certificates
    Auditing,
    Generating,
    Downloadable,
    NotPassing,
    Restricted,
    Unverified,
}

/// Certificate as stored by the certificates service
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CertificateRecord {
    pub user: Principal,
    pub course_id: CourseKey,
    pub status: CertificateStatus,
    pub download_url: Option<String>,
    pub grade: Option<String>,
}

/// Organisation sponsoring a learner's account
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct EnterpriseCustomer {
    pub uuid: String,
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Dashboard Output
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PlatformSettings {
    pub support_email: String,
    pub billing_email: String,
    pub course_search_url: String,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct EmailConfirmation {
    pub is_needed: bool,
    pub send_email_url: String,
}

/// Mode metadata for one enrolled course
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Default)]
pub struct CourseModeInfo {
    /// Unexpired modes keyed by slug
    pub modes: BTreeMap<String, CourseMode>,
    pub show_upsell: bool,
    pub verified_sku: Option<String>,
    pub verified_bulk_sku: Option<String>,
    /// Whole days left to upgrade, when the verified mode expires
    pub days_for_upsell: Option<u64>,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CertInfo {
    pub status: CertificateStatus,
    pub download_url: Option<String>,
    pub grade: Option<String>,
    pub can_unenroll: bool,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct CourseAccessCheck {
    pub has_unmet_prerequisites: bool,
    pub is_too_early_to_view: bool,
    pub user_has_staff_access: bool,
}

/// Everything the learner dashboard page needs in one response
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct LearnerDashboard {
    pub email_confirmation: EmailConfirmation,
    pub enterprise_dashboard: Option<EnterpriseCustomer>,
    pub platform_settings: PlatformSettings,
    /// Active enrollments, newest first
    pub enrollments: Vec<Enrollment>,
    pub unfulfilled_entitlements: Vec<Entitlement>,
    pub suggested_courses: Vec<CourseOverview>,

    pub ecommerce_payment_page: Option<String>,
    pub cert_statuses: BTreeMap<CourseKey, CertInfo>,
    pub course_mode_info: BTreeMap<CourseKey, CourseModeInfo>,
    pub course_optouts: Vec<CourseKey>,
    pub course_access_checks: BTreeMap<CourseKey, CourseAccessCheck>,
    pub resume_course_urls: BTreeMap<CourseKey, String>,
    pub show_email_settings_for: Vec<CourseKey>,
    pub fulfilled_entitlements: BTreeMap<CourseKey, Entitlement>,
    pub course_entitlement_available_sessions: BTreeMap<EntitlementUuid, Vec<CourseOverview>>,
    pub unfulfilled_entitlement_pseudo_sessions: BTreeMap<EntitlementUuid, CourseKey>,
    pub pseudo_session_course_overviews: BTreeMap<CourseKey, CourseOverview>,
    /// Overviews of the enrolled courses
    pub course_overviews: BTreeMap<CourseKey, CourseOverview>,
}

/// Nanoseconds per day (for upsell countdowns)
pub const NS_PER_DAY: u64 = 24 * 60 * 60 * 1_000_000_000;
