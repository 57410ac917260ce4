//! Internal utilities for the messaging core

pub mod permissions;
pub mod validation;

pub use permissions::{Access, Decision, DenyReason, MembershipGuard, NOT_A_MEMBER};
pub use validation::{Validator, MAX_MESSAGE_LENGTH};
