//! Per-scenario journey state.

use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a scenario is in its journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// Fresh session, no account
    #[default]
    Unauthenticated,
    /// Signed up and signed in
    Authenticated,
    /// On a listing page with the product grid visible
    Navigated,
    /// A requisition-list action was taken on the listing
    ActionTaken,
    /// The expected outcome was observed
    OutcomeVerified,
    /// A step failed
    Failed,
}

impl ScenarioState {
    /// Whether no further transitions are possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::OutcomeVerified | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        use ScenarioState::{
            ActionTaken, Authenticated, Failed, Navigated, OutcomeVerified, Unauthenticated,
        };
        match (self, next) {
            (OutcomeVerified | Failed, _) => false,
            (_, Failed)
            | (Unauthenticated, Authenticated)
            | (Authenticated | Navigated | ActionTaken, Navigated)
            | (Navigated, ActionTaken)
            | (ActionTaken, OutcomeVerified) => true,
            _ => false,
        }
    }

    /// Transition to `next` or report an invalid state change
    pub fn advance(self, next: Self) -> E2eResult<Self> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(E2eError::InvalidState {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Navigated => "navigated",
            Self::ActionTaken => "action_taken",
            Self::OutcomeVerified => "outcome_verified",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
