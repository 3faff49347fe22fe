use crate::discussions::state::{StableDiscussionsState, DISCUSSIONS_STATE};
use crate::learner_home::state::{StableLearnerHomeState, LEARNER_HOME_STATE};
use crate::types::*;
use candid::Principal;
use std::cell::RefCell;

/// State structure for the Learner Home Core canister
#[derive(Default)]
pub struct State {
    // Access control
    pub controllers: Vec<Principal>,

    // Site-wide dashboard settings
    pub platform_config: PlatformConfig,
}

impl State {
    pub fn new() -> Self {
        Self {
            controllers: Vec::new(),
            platform_config: PlatformConfig::default(),
        }
    }

    /// Check if a principal is a controller
    pub fn is_controller(&self, principal: &Principal) -> bool {
        self.controllers.contains(principal)
    }

    /// Add a controller
    pub fn add_controller(&mut self, principal: Principal) {
        if !self.controllers.contains(&principal) {
            self.controllers.push(principal);
        }
    }

    /// Get list of controllers
    pub fn get_controllers(&self) -> Vec<Principal> {
        self.controllers.clone()
    }
}

thread_local! {
    pub static STATE: RefCell<State> = RefCell::new(State::new());
}

/// Serializable state for upgrades
#[derive(candid::CandidType, serde::Deserialize, Clone)]
pub struct StableState {
    pub controllers: Vec<Principal>,
    #[serde(default)]
    pub platform_config: PlatformConfig,
    #[serde(default)]
    pub discussions_state: Option<StableDiscussionsState>,
    #[serde(default)]
    pub learner_home_state: Option<StableLearnerHomeState>,
}

impl From<&State> for StableState {
    fn from(state: &State) -> Self {
        // Module state lives in its own thread-locals
        let discussions_state =
            DISCUSSIONS_STATE.with(|ds| Some(StableDiscussionsState::from(&*ds.borrow())));
        let learner_home_state =
            LEARNER_HOME_STATE.with(|ls| Some(StableLearnerHomeState::from(&*ls.borrow())));

        StableState {
            controllers: state.controllers.clone(),
            platform_config: state.platform_config.clone(),
            discussions_state,
            learner_home_state,
        }
    }
}

impl From<StableState> for State {
    fn from(stable: StableState) -> Self {
        if let Some(ds) = stable.discussions_state {
            DISCUSSIONS_STATE.with(|state| {
                *state.borrow_mut() = ds.into();
            });
        }
        if let Some(ls) = stable.learner_home_state {
            LEARNER_HOME_STATE.with(|state| {
                *state.borrow_mut() = ls.into();
            });
        }

        State {
            controllers: stable.controllers,
            platform_config: stable.platform_config,
        }
    }
}
