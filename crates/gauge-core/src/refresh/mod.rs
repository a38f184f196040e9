//! Poll interval selection: the adaptive controller and the smart/fixed policy
//! wrapped around it.

pub mod controller;
pub mod mode;
pub mod policy;

pub use controller::{
    AdaptiveRefreshController, CHANGE_EPSILON, EscalationThresholds, MonitoringState, Observation,
};
pub use mode::MonitoringMode;
pub use policy::RefreshPolicy;
