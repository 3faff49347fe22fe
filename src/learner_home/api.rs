//! API functions for the Learner Home module
//!
//! Each loader reads one slice of learner data; `build_learner_dashboard`
//! calls them all and assembles the response. Loaders never skip a record
//! they cannot resolve: a dangling course reference is an error.

use candid::Principal;
use std::collections::{BTreeMap, BTreeSet};

use super::error::DashboardError;
use super::state::{with_learner_home_state, LearnerHomeState};
use super::types::*;
use crate::types::{CourseKey, PlatformConfig, Timestamp, UserAccount};

// =============================================================================
// Platform & Account
// =============================================================================

/// Settings used for platform-level links on the page
pub fn get_platform_settings(config: &PlatformConfig) -> PlatformSettings {
    PlatformSettings {
        support_email: config.support_email.clone(),
        billing_email: config.billing_email.clone(),
        course_search_url: config.course_search_url.clone(),
    }
}

/// Whether the learner still has to confirm their email, and where to get help
pub fn get_user_account_confirmation_info(
    config: &PlatformConfig,
    account: &UserAccount,
) -> EmailConfirmation {
    let send_email_url = config
        .activation_email_support_link
        .as_ref()
        .filter(|link| !link.is_empty())
        .cloned()
        .unwrap_or_else(|| config.support_site_link.clone());

    EmailConfirmation {
        is_needed: !account.is_active,
        send_email_url,
    }
}

/// Payment page URL if ecommerce is available to this learner
pub fn get_ecommerce_payment_page(config: &PlatformConfig, account: &UserAccount) -> Option<String> {
    if config.ecommerce_enabled && account.is_active {
        config.ecommerce_payment_page_url.clone()
    } else {
        None
    }
}

// =============================================================================
// Enrollments
// =============================================================================

/// Active, org-visible enrollments (newest first) with mode info per course
pub fn get_enrollments(
    state: &LearnerHomeState,
    config: &PlatformConfig,
    user: &Principal,
    now: Timestamp,
) -> Result<(Vec<Enrollment>, BTreeMap<CourseKey, CourseModeInfo>), DashboardError> {
    let mut enrollments = Vec::new();
    for enrollment in state.get_user_enrollments(user) {
        if !enrollment.is_active {
            continue;
        }
        let overview = state
            .get_course_overview(&enrollment.course_id)
            .ok_or_else(|| DashboardError::CourseOverviewMissing(enrollment.course_id.clone()))?;
        if config.org_is_visible(&overview.org) {
            enrollments.push(enrollment);
        }
    }

    // Newest first; ID breaks ties so the order is stable
    enrollments.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));

    let course_mode_info = enrollments
        .iter()
        .map(|enrollment| {
            let modes = state.unexpired_modes(&enrollment.course_id, now);
            (
                enrollment.course_id.clone(),
                complete_course_mode_info(enrollment, modes, now),
            )
        })
        .collect();

    Ok((enrollments, course_mode_info))
}

/// Upsell details for one enrollment given the course's unexpired modes
pub fn complete_course_mode_info(
    enrollment: &Enrollment,
    modes: BTreeMap<String, CourseMode>,
    now: Timestamp,
) -> CourseModeInfo {
    let mut info = CourseModeInfo::default();

    if let Some(verified) = modes.get(MODE_VERIFIED) {
        if UPSELL_TO_VERIFIED_MODES.contains(&enrollment.mode.as_str()) {
            info.show_upsell = true;
            info.verified_sku = verified.sku.clone();
            info.verified_bulk_sku = verified.bulk_sku.clone();
            info.days_for_upsell = verified
                .expiration_datetime
                .map(|expires| expires.saturating_sub(now) / NS_PER_DAY);
        }
    }

    info.modes = modes;
    info
}

/// Overviews of the enrolled courses
pub fn get_enrolled_course_overviews(
    state: &LearnerHomeState,
    enrollments: &[Enrollment],
) -> Result<BTreeMap<CourseKey, CourseOverview>, DashboardError> {
    enrollments
        .iter()
        .map(|enrollment| {
            state
                .get_course_overview(&enrollment.course_id)
                .map(|o| (o.id.clone(), o.clone()))
                .ok_or_else(|| DashboardError::CourseOverviewMissing(enrollment.course_id.clone()))
        })
        .collect()
}

// =============================================================================
// Entitlements
// =============================================================================

/// Entitlements split for the dashboard
#[derive(Debug, Default, PartialEq)]
pub struct EntitlementsInfo {
    pub fulfilled_by_course_key: BTreeMap<CourseKey, Entitlement>,
    pub unfulfilled: Vec<Entitlement>,
    pub available_sessions: BTreeMap<EntitlementUuid, Vec<CourseOverview>>,
    pub pseudo_sessions: BTreeMap<EntitlementUuid, CourseKey>,
}

/// Fulfilled entitlements keyed by course, unfulfilled ones with their
/// enrollable sessions and a pseudo session to display
pub fn get_entitlements(
    state: &LearnerHomeState,
    config: &PlatformConfig,
    user: &Principal,
    now: Timestamp,
) -> EntitlementsInfo {
    let mut info = EntitlementsInfo::default();

    for entitlement in state.get_user_entitlements(user) {
        if !config.org_is_visible(&entitlement.org) {
            continue;
        }

        let sessions = available_sessions(state, &entitlement, now);
        match entitlement.enrollment_course_run.clone() {
            Some(course_id) => {
                info.available_sessions.insert(entitlement.uuid.clone(), sessions);
                info.fulfilled_by_course_key.insert(course_id, entitlement);
            }
            None => {
                // Expired and never redeemed: nothing left to offer
                if entitlement.expired_at.map(|at| at <= now).unwrap_or(false) {
                    continue;
                }
                if let Some(first) = sessions.first() {
                    info.pseudo_sessions
                        .insert(entitlement.uuid.clone(), first.id.clone());
                }
                info.available_sessions.insert(entitlement.uuid.clone(), sessions);
                info.unfulfilled.push(entitlement);
            }
        }
    }

    info
}

/// Runs of the entitlement's course that have not ended, plus the run it
/// was redeemed for even if that one has ended
fn available_sessions(
    state: &LearnerHomeState,
    entitlement: &Entitlement,
    now: Timestamp,
) -> Vec<CourseOverview> {
    state
        .course_runs_for(&entitlement.course_uuid)
        .into_iter()
        .filter(|run| {
            !run.has_ended(now)
                || entitlement.enrollment_course_run.as_deref() == Some(run.id.as_str())
        })
        .cloned()
        .collect()
}

/// Overviews for the pseudo sessions of unfulfilled entitlements
pub fn get_course_overviews_for_pseudo_sessions(
    state: &LearnerHomeState,
    pseudo_sessions: &BTreeMap<EntitlementUuid, CourseKey>,
) -> Result<BTreeMap<CourseKey, CourseOverview>, DashboardError> {
    pseudo_sessions
        .values()
        .map(|course_id| {
            state
                .get_course_overview(course_id)
                .map(|o| (course_id.clone(), o.clone()))
                .ok_or_else(|| DashboardError::CourseOverviewMissing(course_id.clone()))
        })
        .collect()
}

// =============================================================================
// Email, Certificates, Access
// =============================================================================

/// Courses with bulk email turned on, and the courses the learner opted out of
pub fn get_email_settings_info(
    state: &LearnerHomeState,
    user: &Principal,
    enrollments: &[Enrollment],
) -> (Vec<CourseKey>, Vec<CourseKey>) {
    let show_email_settings_for: BTreeSet<CourseKey> = enrollments
        .iter()
        .filter(|e| {
            state
                .get_course_overview(&e.course_id)
                .map(|o| o.bulk_email_enabled)
                .unwrap_or(false)
        })
        .map(|e| e.course_id.clone())
        .collect();

    (
        show_email_settings_for.into_iter().collect(),
        state.get_optouts(user),
    )
}

/// Certificate display info for one enrollment
pub fn cert_info(enrollment: &Enrollment, record: Option<&CertificateRecord>) -> CertInfo {
    let audit = enrollment.mode == MODE_AUDIT;

    let status = match record {
        Some(r) if r.status == CertificateStatus::Downloadable => CertificateStatus::Downloadable,
        _ if audit => CertificateStatus::Auditing,
        Some(r) => r.status.clone(),
        None => CertificateStatus::Processing,
    };

    let download_url = match (&status, record) {
        (CertificateStatus::Downloadable, Some(r)) => r.download_url.clone(),
        _ => None,
    };

    CertInfo {
        can_unenroll: !matches!(
            status,
            CertificateStatus::Generating | CertificateStatus::Downloadable
        ),
        grade: record.and_then(|r| r.grade.clone()),
        download_url,
        status,
    }
}

/// Certificate info per enrolled course
pub fn get_cert_statuses(
    state: &LearnerHomeState,
    user: &Principal,
    enrollments: &[Enrollment],
) -> BTreeMap<CourseKey, CertInfo> {
    enrollments
        .iter()
        .map(|enrollment| {
            let record = state.get_certificate(user, &enrollment.course_id);
            (enrollment.course_id.clone(), cert_info(enrollment, record))
        })
        .collect()
}

/// Courses whose declared prerequisites the learner has not completed.
/// Courses without prerequisites are absent from the result.
pub fn get_courses_with_unmet_prerequisites(
    state: &LearnerHomeState,
    user: &Principal,
    enrollments: &[Enrollment],
) -> BTreeMap<CourseKey, Vec<CourseKey>> {
    enrollments
        .iter()
        .filter_map(|enrollment| {
            let overview = state.get_course_overview(&enrollment.course_id)?;
            let unmet: Vec<CourseKey> = overview
                .pre_requisite_courses
                .iter()
                .filter(|prereq| !state.has_completed(user, prereq))
                .cloned()
                .collect();
            if unmet.is_empty() {
                None
            } else {
                Some((enrollment.course_id.clone(), unmet))
            }
        })
        .collect()
}

/// Courseware access flags per enrolled course
pub fn check_course_access(
    state: &LearnerHomeState,
    user: &Principal,
    enrollments: &[Enrollment],
    now: Timestamp,
) -> Result<BTreeMap<CourseKey, CourseAccessCheck>, DashboardError> {
    let unmet = get_courses_with_unmet_prerequisites(state, user, enrollments);

    enrollments
        .iter()
        .map(|enrollment| -> Result<(CourseKey, CourseAccessCheck), DashboardError> {
            let overview = state
                .get_course_overview(&enrollment.course_id)
                .ok_or_else(|| DashboardError::CourseOverviewMissing(enrollment.course_id.clone()))?;
            let staff = state.has_staff_access(user, &enrollment.course_id);
            Ok((
                enrollment.course_id.clone(),
                CourseAccessCheck {
                    has_unmet_prerequisites: unmet.contains_key(&enrollment.course_id),
                    is_too_early_to_view: !staff && !overview.has_started(now),
                    user_has_staff_access: staff,
                },
            ))
        })
        .collect()
}

/// Resume button targets per enrolled course; empty when never visited
pub fn get_resume_urls_for_enrollments(
    state: &LearnerHomeState,
    user: &Principal,
    enrollments: &[Enrollment],
) -> BTreeMap<CourseKey, String> {
    enrollments
        .iter()
        .map(|enrollment| {
            let url = state
                .last_visited
                .get(&(*user, enrollment.course_id.clone()))
                .cloned()
                .unwrap_or_default();
            (enrollment.course_id.clone(), url)
        })
        .collect()
}

// =============================================================================
// Assembly
// =============================================================================

/// Assemble the full dashboard for a learner
pub fn build_learner_dashboard(
    state: &LearnerHomeState,
    config: &PlatformConfig,
    user: &Principal,
    now: Timestamp,
) -> Result<LearnerDashboard, DashboardError> {
    let account = state
        .get_account(user)
        .ok_or(DashboardError::UnknownUser(*user))?;

    let entitlements = get_entitlements(state, config, user, now);
    let pseudo_session_course_overviews =
        get_course_overviews_for_pseudo_sessions(state, &entitlements.pseudo_sessions)?;

    let (enrollments, course_mode_info) = get_enrollments(state, config, user, now)?;
    let course_overviews = get_enrolled_course_overviews(state, &enrollments)?;
    let (show_email_settings_for, course_optouts) =
        get_email_settings_info(state, user, &enrollments);
    let cert_statuses = get_cert_statuses(state, user, &enrollments);
    let course_access_checks = check_course_access(state, user, &enrollments, now)?;
    let resume_course_urls = get_resume_urls_for_enrollments(state, user, &enrollments);

    Ok(LearnerDashboard {
        email_confirmation: get_user_account_confirmation_info(config, account),
        enterprise_dashboard: state.enterprise_customers.get(user).cloned(),
        platform_settings: get_platform_settings(config),
        enrollments,
        unfulfilled_entitlements: entitlements.unfulfilled,
        suggested_courses: Vec::new(),
        ecommerce_payment_page: get_ecommerce_payment_page(config, account),
        cert_statuses,
        course_mode_info,
        course_optouts,
        course_access_checks,
        resume_course_urls,
        show_email_settings_for,
        fulfilled_entitlements: entitlements.fulfilled_by_course_key,
        course_entitlement_available_sessions: entitlements.available_sessions,
        unfulfilled_entitlement_pseudo_sessions: entitlements.pseudo_sessions,
        pseudo_session_course_overviews,
        course_overviews,
    })
}

/// Dashboard for a learner from the module state
pub fn initialize_learner_dashboard(
    config: &PlatformConfig,
    user: &Principal,
    now: Timestamp,
) -> Result<LearnerDashboard, DashboardError> {
    with_learner_home_state(|state| build_learner_dashboard(state, config, user, now))
}
