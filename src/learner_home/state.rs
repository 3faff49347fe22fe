//! State management for the Learner Home module
//!
//! Holds the learner records the dashboard reads: accounts, the course
//! catalog, enrollments, entitlements, certificates and access data.

use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use super::error::DashboardError;
use super::types::*;
use crate::types::{CourseKey, Timestamp, UserAccount};

/// State structure for learner records
#[derive(Default)]
pub struct LearnerHomeState {
    /// Registered learner accounts
    pub accounts: BTreeMap<Principal, UserAccount>,
    /// Course catalog by run
    pub course_overviews: BTreeMap<CourseKey, CourseOverview>,
    /// Modes offered per run
    pub course_modes: BTreeMap<CourseKey, Vec<CourseMode>>,
    /// All enrollments by ID
    pub enrollments: BTreeMap<EnrollmentId, Enrollment>,
    /// User -> enrollment IDs
    pub user_enrollments: BTreeMap<Principal, Vec<EnrollmentId>>,
    /// All entitlements by UUID
    pub entitlements: BTreeMap<EntitlementUuid, Entitlement>,
    /// User -> entitlement UUIDs
    pub user_entitlements: BTreeMap<Principal, Vec<EntitlementUuid>>,
    /// (User, course) -> certificate
    pub certificates: BTreeMap<(Principal, CourseKey), CertificateRecord>,
    /// User -> courses whose completion milestone was fulfilled
    pub completed_courses: BTreeMap<Principal, BTreeSet<CourseKey>>,
    /// Course -> staff and instructors
    pub course_staff: BTreeMap<CourseKey, BTreeSet<Principal>>,
    /// Platform-wide staff
    pub global_staff: BTreeSet<Principal>,
    /// User -> courses opted out of bulk email
    pub optouts: BTreeMap<Principal, BTreeSet<CourseKey>>,
    /// User -> sponsoring enterprise
    pub enterprise_customers: BTreeMap<Principal, EnterpriseCustomer>,
    /// (User, course) -> last visited courseware URL
    pub last_visited: BTreeMap<(Principal, CourseKey), String>,
    /// Next enrollment ID counter
    pub next_enrollment_id: EnrollmentId,
}

impl LearnerHomeState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self {
            next_enrollment_id: 1,
            ..Self::default()
        }
    }

    // =========================================================================
    // Accounts & Catalog
    // =========================================================================

    pub fn upsert_account(&mut self, account: UserAccount) {
        self.accounts.insert(account.principal, account);
    }

    pub fn get_account(&self, user: &Principal) -> Option<&UserAccount> {
        self.accounts.get(user)
    }

    pub fn upsert_course_overview(&mut self, overview: CourseOverview) -> Result<(), DashboardError> {
        if overview.id.trim().is_empty() {
            return Err(DashboardError::EmptyCourseKey);
        }
        self.course_overviews.insert(overview.id.clone(), overview);
        Ok(())
    }

    pub fn get_course_overview(&self, course_id: &str) -> Option<&CourseOverview> {
        self.course_overviews.get(course_id)
    }

    /// Replace the modes offered by a course run
    pub fn set_course_modes(
        &mut self,
        course_id: &str,
        modes: Vec<CourseMode>,
    ) -> Result<(), DashboardError> {
        if course_id.trim().is_empty() {
            return Err(DashboardError::EmptyCourseKey);
        }
        let mut seen = BTreeSet::new();
        for mode in &modes {
            if mode.slug.trim().is_empty() {
                return Err(DashboardError::EmptyModeSlug);
            }
            if !seen.insert(mode.slug.as_str()) {
                return Err(DashboardError::DuplicateCourseMode(mode.slug.clone()));
            }
        }
        self.course_modes.insert(course_id.to_string(), modes);
        Ok(())
    }

    /// Unexpired modes of a course keyed by slug
    pub fn unexpired_modes(&self, course_id: &str, now: Timestamp) -> BTreeMap<String, CourseMode> {
        self.course_modes
            .get(course_id)
            .map(|modes| {
                modes
                    .iter()
                    .filter(|m| !m.is_expired(now))
                    .map(|m| (m.slug.clone(), m.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Runs of a catalog course, ordered by start date
    pub fn course_runs_for(&self, course_uuid: &str) -> Vec<&CourseOverview> {
        let mut runs: Vec<&CourseOverview> = self
            .course_overviews
            .values()
            .filter(|o| o.catalog_course_uuid.as_deref() == Some(course_uuid))
            .collect();
        runs.sort_by_key(|o| (o.start.unwrap_or(0), o.id.clone()));
        runs
    }

    // =========================================================================
    // Enrollments & Entitlements
    // =========================================================================

    /// Create an enrollment, or update mode and activity of the existing one
    pub fn record_enrollment(
        &mut self,
        request: RecordEnrollmentRequest,
        now: Timestamp,
    ) -> Result<Enrollment, DashboardError> {
        if request.course_id.trim().is_empty() {
            return Err(DashboardError::EmptyCourseKey);
        }

        let existing = self.user_enrollments.get(&request.user).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|id| {
                    self.enrollments
                        .get(id)
                        .map(|e| e.course_id == request.course_id)
                        .unwrap_or(false)
                })
        });

        if let Some(enrollment) = existing.and_then(|id| self.enrollments.get_mut(&id)) {
            enrollment.mode = request.mode;
            enrollment.is_active = request.is_active;
            return Ok(enrollment.clone());
        }

        let id = self.next_enrollment_id;
        self.next_enrollment_id += 1;

        let enrollment = Enrollment {
            id,
            user: request.user,
            course_id: request.course_id,
            mode: request.mode,
            is_active: request.is_active,
            created: now,
        };

        self.enrollments.insert(id, enrollment.clone());
        self.user_enrollments.entry(request.user).or_default().push(id);

        Ok(enrollment)
    }

    /// All enrollments of a user, active or not
    pub fn get_user_enrollments(&self, user: &Principal) -> Vec<Enrollment> {
        self.user_enrollments
            .get(user)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.enrollments.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Create or replace an entitlement
    pub fn record_entitlement(&mut self, entitlement: Entitlement) -> Result<(), DashboardError> {
        if entitlement.uuid.trim().is_empty() {
            return Err(DashboardError::EmptyEntitlementUuid);
        }
        if let Some(existing) = self.entitlements.get(&entitlement.uuid) {
            if existing.user != entitlement.user {
                return Err(DashboardError::EntitlementOwnerMismatch(entitlement.uuid));
            }
        } else {
            self.user_entitlements
                .entry(entitlement.user)
                .or_default()
                .push(entitlement.uuid.clone());
        }
        self.entitlements.insert(entitlement.uuid.clone(), entitlement);
        Ok(())
    }

    pub fn get_user_entitlements(&self, user: &Principal) -> Vec<Entitlement> {
        self.user_entitlements
            .get(user)
            .map(|uuids| {
                uuids
                    .iter()
                    .filter_map(|uuid| self.entitlements.get(uuid))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // Certificates, Milestones & Access
    // =========================================================================

    pub fn record_certificate(&mut self, certificate: CertificateRecord) {
        self.certificates.insert(
            (certificate.user, certificate.course_id.clone()),
            certificate,
        );
    }

    pub fn get_certificate(&self, user: &Principal, course_id: &str) -> Option<&CertificateRecord> {
        self.certificates.get(&(*user, course_id.to_string()))
    }

    pub fn record_course_completion(&mut self, user: Principal, course_id: CourseKey) {
        self.completed_courses.entry(user).or_default().insert(course_id);
    }

    pub fn has_completed(&self, user: &Principal, course_id: &str) -> bool {
        self.completed_courses
            .get(user)
            .map(|courses| courses.contains(course_id))
            .unwrap_or(false)
    }

    pub fn grant_course_staff(&mut self, course_id: CourseKey, user: Principal) {
        self.course_staff.entry(course_id).or_default().insert(user);
    }

    /// Whether the user holds any administrative role for the course
    pub fn has_staff_access(&self, user: &Principal, course_id: &str) -> bool {
        self.global_staff.contains(user)
            || self
                .course_staff
                .get(course_id)
                .map(|staff| staff.contains(user))
                .unwrap_or(false)
    }

    pub fn set_bulk_email_optout(&mut self, user: Principal, course_id: CourseKey, opted_out: bool) {
        let optouts = self.optouts.entry(user).or_default();
        if opted_out {
            optouts.insert(course_id);
        } else {
            optouts.remove(&course_id);
        }
    }

    pub fn get_optouts(&self, user: &Principal) -> Vec<CourseKey> {
        self.optouts
            .get(user)
            .map(|courses| courses.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record_last_visited(&mut self, user: Principal, course_id: CourseKey, url: String) {
        self.last_visited.insert((user, course_id), url);
    }
}

thread_local! {
    pub static LEARNER_HOME_STATE: RefCell<LearnerHomeState> = RefCell::new(LearnerHomeState::new());
}

/// Helper function to access learner home state
pub fn with_learner_home_state<F, R>(f: F) -> R
where
    F: FnOnce(&LearnerHomeState) -> R,
{
    LEARNER_HOME_STATE.with(|state| f(&state.borrow()))
}

/// Helper function to mutably access learner home state
pub fn with_learner_home_state_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut LearnerHomeState) -> R,
{
    LEARNER_HOME_STATE.with(|state| f(&mut state.borrow_mut()))
}

// =============================================================================
// Stable Storage Types
// =============================================================================

/// Serializable state for canister upgrades
#[derive(CandidType, Deserialize, Serialize, Clone, Default)]
pub struct StableLearnerHomeState {
    pub accounts: Vec<(Principal, UserAccount)>,
    pub course_overviews: Vec<(CourseKey, CourseOverview)>,
    pub course_modes: Vec<(CourseKey, Vec<CourseMode>)>,
    pub enrollments: Vec<(EnrollmentId, Enrollment)>,
    pub user_enrollments: Vec<(Principal, Vec<EnrollmentId>)>,
    pub entitlements: Vec<(EntitlementUuid, Entitlement)>,
    pub user_entitlements: Vec<(Principal, Vec<EntitlementUuid>)>,
    pub certificates: Vec<CertificateRecord>,
    pub completed_courses: Vec<(Principal, Vec<CourseKey>)>,
    pub course_staff: Vec<(CourseKey, Vec<Principal>)>,
    pub global_staff: Vec<Principal>,
    pub optouts: Vec<(Principal, Vec<CourseKey>)>,
    pub enterprise_customers: Vec<(Principal, EnterpriseCustomer)>,
    pub last_visited: Vec<((Principal, CourseKey), String)>,
    pub next_enrollment_id: EnrollmentId,
}

impl From<&LearnerHomeState> for StableLearnerHomeState {
    fn from(state: &LearnerHomeState) -> Self {
        StableLearnerHomeState {
            accounts: state.accounts.iter().map(|(k, v)| (*k, v.clone())).collect(),
            course_overviews: state
                .course_overviews
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            course_modes: state
                .course_modes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            enrollments: state.enrollments.iter().map(|(k, v)| (*k, v.clone())).collect(),
            user_enrollments: state
                .user_enrollments
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            entitlements: state
                .entitlements
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            user_entitlements: state
                .user_entitlements
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            certificates: state.certificates.values().cloned().collect(),
            completed_courses: state
                .completed_courses
                .iter()
                .map(|(k, v)| (*k, v.iter().cloned().collect()))
                .collect(),
            course_staff: state
                .course_staff
                .iter()
                .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
                .collect(),
            global_staff: state.global_staff.iter().cloned().collect(),
            optouts: state
                .optouts
                .iter()
                .map(|(k, v)| (*k, v.iter().cloned().collect()))
                .collect(),
            enterprise_customers: state
                .enterprise_customers
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
            last_visited: state
                .last_visited
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            next_enrollment_id: state.next_enrollment_id,
        }
    }
}

impl From<StableLearnerHomeState> for LearnerHomeState {
    fn from(stable: StableLearnerHomeState) -> Self {
        LearnerHomeState {
            accounts: stable.accounts.into_iter().collect(),
            course_overviews: stable.course_overviews.into_iter().collect(),
            course_modes: stable.course_modes.into_iter().collect(),
            enrollments: stable.enrollments.into_iter().collect(),
            user_enrollments: stable.user_enrollments.into_iter().collect(),
            entitlements: stable.entitlements.into_iter().collect(),
            user_entitlements: stable.user_entitlements.into_iter().collect(),
            certificates: stable
                .certificates
                .into_iter()
                .map(|c| ((c.user, c.course_id.clone()), c))
                .collect(),
            completed_courses: stable
                .completed_courses
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            course_staff: stable
                .course_staff
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            global_staff: stable.global_staff.into_iter().collect(),
            optouts: stable
                .optouts
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            enterprise_customers: stable.enterprise_customers.into_iter().collect(),
            last_visited: stable.last_visited.into_iter().collect(),
            next_enrollment_id: stable.next_enrollment_id,
        }
    }
}
