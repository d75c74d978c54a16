//! # wallarm-rules
//!
//! Reconciliation of locally declared rules with the rules stored in a
//! Wallarm account.
//!
//! [`match_rules`] is the pure matching step: expected fingerprints and
//! normalized conditions against the candidate list. [`RuleManager`] wraps
//! it in the create/read/delete/import lifecycle over any [`wallarm_api::RulesApi`].

pub mod error;
pub mod lifecycle;
pub mod matcher;
pub mod state;

pub use error::{Result, RuleError};
pub use lifecycle::{RuleManager, spec_from_record};
pub use matcher::{MatchOutcome, match_rules};
pub use state::RuleState;
