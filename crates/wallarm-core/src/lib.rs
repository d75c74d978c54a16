pub mod compare;
pub mod condition;
pub mod error;
pub mod id;
pub mod point;
pub mod rule;
pub mod serde_util;

pub use compare::{conditions_equal, points_equal};
pub use condition::{
    Condition, ConditionSpec, Locator, MatchType, PointElement, normalize_conditions,
};
pub use error::{CoreError, ErrorCategory, Result};
pub use id::ResourceId;
pub use point::{align_point, expand_points, flatten_points, wrap_point};
pub use rule::{RuleField, RuleFingerprint, RuleRecord, RuleSpec, RuleType};
