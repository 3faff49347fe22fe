mod authorization;
mod discussions;
mod learner_home;
mod state;
mod types;

use candid::Principal;
use ic_cdk_macros::{init, post_upgrade, pre_upgrade, query, update};

use discussions::{
    CourseDiscussionConfigurationData, CourseOutline, DiscussionSettings,
    DiscussionSettingsUpdate, DiscussionTopicContext,
};
use learner_home::state::{with_learner_home_state, with_learner_home_state_mut};
use learner_home::{
    CertificateRecord, CourseMode, CourseOverview, Enrollment, EnterpriseCustomer, Entitlement,
    LearnerDashboard, RecordEnrollmentRequest,
};

pub use state::{State, StableState, STATE};
pub use types::*;

// =============================================================================
// Canister Lifecycle
// =============================================================================

#[init]
fn init(controllers: Option<Vec<Principal>>) {
    let effective_controllers = controllers.unwrap_or_else(|| vec![ic_cdk::caller()]);
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        for controller in effective_controllers {
            s.add_controller(controller);
        }
    });

    ic_cdk::println!("===========================================");
    ic_cdk::println!("Learner Home Core Initialization Complete");
    ic_cdk::println!("===========================================");
}

#[pre_upgrade]
fn pre_upgrade() {
    STATE.with(|state| {
        let s = state.borrow();
        let stable: StableState = (&*s).into();
        if let Err(e) = ic_cdk::storage::stable_save((stable,)) {
            ic_cdk::trap(&format!("Failed to save state to stable storage: {}", e));
        }
    });
}

#[post_upgrade]
fn post_upgrade() {
    let restored_state = match ic_cdk::storage::stable_restore::<(StableState,)>() {
        Ok((saved_state,)) => {
            ic_cdk::println!("Restored state from stable storage");
            State::from(saved_state)
        }
        Err(e) => {
            ic_cdk::println!("No previous state found ({}), using default state", e);
            State::new()
        }
    };

    STATE.with(|state| {
        *state.borrow_mut() = restored_state;
    });

    ic_cdk::println!("===========================================");
    ic_cdk::println!("Learner Home Core Upgrade Complete");
    ic_cdk::println!("===========================================");
}

// =============================================================================
// Configuration
// =============================================================================

#[update]
async fn set_platform_config(config: PlatformConfig) -> Result<(), String> {
    require_controller().await?;

    STATE.with(|state| {
        state.borrow_mut().platform_config = config;
    });

    ic_cdk::println!("Platform config updated");
    Ok(())
}

#[query]
fn get_platform_config() -> PlatformConfig {
    STATE.with(|state| state.borrow().platform_config.clone())
}

#[query]
fn get_controllers() -> Vec<Principal> {
    STATE.with(|state| state.borrow().get_controllers())
}

// =============================================================================
// Access Control
// =============================================================================

async fn require_controller() -> Result<(), String> {
    let caller = ic_cdk::caller();

    let is_authorized = STATE.with(|state| state.borrow().is_controller(&caller));

    if !is_authorized {
        use ic_cdk::api::management_canister::main::{canister_status, CanisterIdRecord};

        let status = canister_status(CanisterIdRecord {
            canister_id: ic_cdk::id(),
        })
        .await
        .map_err(|(code, msg)| format!("Failed to query canister status: {:?}: {}", code, msg))?
        .0;

        if !status.settings.controllers.contains(&caller) {
            return Err(authorization::CONTROLLER_REQUIRED_ERROR.to_string());
        }

        STATE.with(|state| {
            state.borrow_mut().controllers = status.settings.controllers;
        });
    }

    Ok(())
}

fn require_authenticated() -> Result<Principal, String> {
    authorization::require_not_anonymous(ic_cdk::caller())
}

/// Controllers and global staff count as staff for every learner
fn caller_is_staff(caller: &Principal) -> bool {
    STATE.with(|state| state.borrow().is_controller(caller))
        || with_learner_home_state(|s| s.global_staff.contains(caller))
}

// =============================================================================
// Discussions API
// =============================================================================

#[update]
async fn set_course_outline(outline: CourseOutline) -> Result<(), String> {
    require_controller().await?;

    let course_key = outline.course_key.clone();
    discussions::api::set_course_outline(outline).map_err(|e| e.to_string())?;

    ic_cdk::println!("Stored outline for {}", course_key);
    Ok(())
}

#[update]
async fn update_course_discussion_settings(
    course_key: String,
    update: DiscussionSettingsUpdate,
) -> Result<DiscussionSettings, String> {
    require_controller().await?;

    let settings = discussions::api::update_course_discussion_settings(&course_key, update)
        .map_err(|e| e.to_string())?;

    ic_cdk::println!(
        "Updated discussion settings for {} (provider {})",
        course_key,
        settings.provider_type
    );
    Ok(settings)
}

#[query]
fn get_course_discussion_settings(course_key: String) -> DiscussionSettings {
    discussions::api::get_course_discussion_settings(&course_key)
}

#[update]
async fn update_discussions_settings_from_course(
    course_key: String,
) -> Result<CourseDiscussionConfigurationData, String> {
    require_controller().await?;

    let now = ic_cdk::api::time();
    let data = discussions::api::update_discussions_settings_from_course(&course_key, now)
        .map_err(|e| e.to_string())?;

    ic_cdk::println!(
        "Derived {} discussion contexts for {} (changed: {})",
        data.contexts.len(),
        course_key,
        data.changed
    );
    Ok(data)
}

#[query]
fn get_discussions_configuration(course_key: String) -> Option<CourseDiscussionConfigurationData> {
    discussions::api::get_discussions_configuration(&course_key)
}

/// Run the derivation without storing anything
#[query]
fn preview_discussion_contexts(
    outline: CourseOutline,
    settings: DiscussionSettings,
) -> Result<Vec<DiscussionTopicContext>, String> {
    discussions::api::derive_contexts(&outline, &settings).map_err(|e| e.to_string())
}

// =============================================================================
// Learner Records API (controller seeding)
// =============================================================================

#[update]
async fn upsert_user_account(account: UserAccount) -> Result<(), String> {
    require_controller().await?;

    let principal = account.principal;
    with_learner_home_state_mut(|s| s.upsert_account(account));

    ic_cdk::println!("Upserted account for {}", principal);
    Ok(())
}

#[update]
async fn upsert_course_overview(overview: CourseOverview) -> Result<(), String> {
    require_controller().await?;

    let course_id = overview.id.clone();
    with_learner_home_state_mut(|s| s.upsert_course_overview(overview))
        .map_err(|e| e.to_string())?;

    ic_cdk::println!("Upserted course overview {}", course_id);
    Ok(())
}

#[update]
async fn set_course_modes(course_id: String, modes: Vec<CourseMode>) -> Result<(), String> {
    require_controller().await?;

    let count = modes.len();
    with_learner_home_state_mut(|s| s.set_course_modes(&course_id, modes))
        .map_err(|e| e.to_string())?;

    ic_cdk::println!("Set {} course modes for {}", count, course_id);
    Ok(())
}

#[update]
async fn record_enrollment(request: RecordEnrollmentRequest) -> Result<Enrollment, String> {
    require_controller().await?;

    let now = ic_cdk::api::time();
    let enrollment = with_learner_home_state_mut(|s| s.record_enrollment(request, now))
        .map_err(|e| e.to_string())?;

    ic_cdk::println!(
        "Recorded enrollment {} of {} in {} ({})",
        enrollment.id,
        enrollment.user,
        enrollment.course_id,
        enrollment.mode
    );
    Ok(enrollment)
}

#[update]
async fn record_entitlement(entitlement: Entitlement) -> Result<(), String> {
    require_controller().await?;

    let uuid = entitlement.uuid.clone();
    with_learner_home_state_mut(|s| s.record_entitlement(entitlement))
        .map_err(|e| e.to_string())?;

    ic_cdk::println!("Recorded entitlement {}", uuid);
    Ok(())
}

#[update]
async fn record_certificate(certificate: CertificateRecord) -> Result<(), String> {
    require_controller().await?;

    ic_cdk::println!(
        "Recorded certificate for {} in {}: {:?}",
        certificate.user,
        certificate.course_id,
        certificate.status
    );
    with_learner_home_state_mut(|s| s.record_certificate(certificate));
    Ok(())
}

/// Mark a course's completion milestone as fulfilled for a learner
#[update]
async fn record_milestone_completion(user: Principal, course_id: String) -> Result<(), String> {
    require_controller().await?;

    ic_cdk::println!("Recorded completion of {} by {}", course_id, user);
    with_learner_home_state_mut(|s| s.record_course_completion(user, course_id));
    Ok(())
}

#[update]
async fn grant_course_staff(course_id: String, user: Principal) -> Result<(), String> {
    require_controller().await?;

    ic_cdk::println!("Granted staff on {} to {}", course_id, user);
    with_learner_home_state_mut(|s| s.grant_course_staff(course_id, user));
    Ok(())
}

#[update]
async fn grant_global_staff(user: Principal) -> Result<(), String> {
    require_controller().await?;

    with_learner_home_state_mut(|s| s.global_staff.insert(user));
    ic_cdk::println!("Granted global staff to {}", user);
    Ok(())
}

#[update]
async fn set_bulk_email_optout(
    user: Principal,
    course_id: String,
    opted_out: bool,
) -> Result<(), String> {
    require_controller().await?;

    ic_cdk::println!("Bulk email opt-out for {} in {}: {}", user, course_id, opted_out);
    with_learner_home_state_mut(|s| s.set_bulk_email_optout(user, course_id, opted_out));
    Ok(())
}

/// Link a learner to an enterprise customer, or unlink with `None`
#[update]
async fn set_enterprise_customer(
    user: Principal,
    customer: Option<EnterpriseCustomer>,
) -> Result<(), String> {
    require_controller().await?;

    with_learner_home_state_mut(|s| match customer {
        Some(c) => {
            s.enterprise_customers.insert(user, c);
        }
        None => {
            s.enterprise_customers.remove(&user);
        }
    });

    ic_cdk::println!("Updated enterprise customer for {}", user);
    Ok(())
}

#[update]
async fn record_last_visited(user: Principal, course_id: String, url: String) -> Result<(), String> {
    require_controller().await?;

    with_learner_home_state_mut(|s| s.record_last_visited(user, course_id, url));
    Ok(())
}

// =============================================================================
// Learner Dashboard API
// =============================================================================

/// Dashboard of the calling learner
#[query]
fn initialize_learner_dashboard() -> Result<LearnerDashboard, String> {
    let caller = require_authenticated()?;
    dashboard_for(caller)
}

/// Dashboard of another learner, for the learner themself or staff
#[query]
fn get_learner_dashboard_for(user: Principal) -> Result<LearnerDashboard, String> {
    let caller = ic_cdk::caller();
    authorization::require_self_or_staff(caller, user, caller_is_staff(&caller))?;
    dashboard_for(user)
}

fn dashboard_for(user: Principal) -> Result<LearnerDashboard, String> {
    let config = STATE.with(|state| state.borrow().platform_config.clone());
    let now = ic_cdk::api::time();
    learner_home::api::initialize_learner_dashboard(&config, &user, now).map_err(|e| e.to_string())
}

// =============================================================================
// Stats & Health
// =============================================================================

#[query]
fn get_stats() -> Stats {
    let (total_course_outlines, total_discussion_configurations) =
        discussions::state::with_discussions_state(|s| {
            (s.outlines.len() as u64, s.configurations.len() as u64)
        });

    with_learner_home_state(|s| Stats {
        total_users: s.accounts.len() as u64,
        total_course_overviews: s.course_overviews.len() as u64,
        total_enrollments: s.enrollments.len() as u64,
        total_entitlements: s.entitlements.len() as u64,
        total_course_outlines,
        total_discussion_configurations,
    })
}

#[query]
fn health() -> String {
    "ok".to_string()
}

// Export candid interface
ic_cdk::export_candid!();
