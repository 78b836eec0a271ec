//! Domain services: pure business logic with no persistence concerns.

pub mod audit;
pub mod cascade;
pub mod depreciation;
pub mod status_machine;

pub use cascade::{
    plan_assignment_creation, plan_device_loss, plan_device_retirement, plan_letter_signature,
    plan_return_creation, AssignmentCascade, FinalizeAssignment, LifecycleError, LossCascade,
    RetirementCascade, ReturnCascade, ReturnContext,
};
pub use status_machine::{
    is_transition_allowed, plan_status_change, StatusTransition, TransitionError,
};
