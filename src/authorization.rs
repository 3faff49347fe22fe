//! Authorization Module for Learner Home Core
//!
//! Caller checks shared by the canister endpoints. The functions take the
//! caller explicitly so they can be unit tested off-chain; `lib.rs` passes
//! `ic_cdk::caller()`.
//!
//! Error messages never say whether the requested learner exists.

use candid::Principal;

/// Unauthorized access error message.
/// Generic so a rejected caller learns nothing about the target learner.
pub const UNAUTHORIZED_ERROR: &str = "Unauthorized: You do not have access to this resource";

/// Returned to anonymous callers of endpoints that need an identity
pub const AUTHENTICATION_REQUIRED_ERROR: &str = "Authentication required";

/// Returned when a non-controller calls an administrative endpoint
pub const CONTROLLER_REQUIRED_ERROR: &str = "Unauthorized: Only controllers can perform this action";

/// Verify that the caller is not anonymous.
///
/// # Returns
/// * `Ok(Principal)` with the caller's principal if authenticated
/// * `Err(String)` if caller is anonymous
pub fn require_not_anonymous(caller: Principal) -> Result<Principal, String> {
    if caller == Principal::anonymous() {
        return Err(AUTHENTICATION_REQUIRED_ERROR.to_string());
    }
    Ok(caller)
}

/// Verify that the caller may read the dashboard of `learner`.
///
/// Learners see their own dashboard; controllers and global staff may
/// masquerade as any learner.
pub fn require_self_or_staff(
    caller: Principal,
    learner: Principal,
    caller_is_staff: bool,
) -> Result<(), String> {
    require_not_anonymous(caller)?;
    if caller == learner || caller_is_staff {
        return Ok(());
    }
    Err(UNAUTHORIZED_ERROR.to_string())
}
