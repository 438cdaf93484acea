//! Optional observability helpers for interceptor flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_interceptor.flow` with the `flow`
//!   and `stage` (call site) fields, plus events for refresh start/join/settle.
//! - Enable `metrics` to increment the `bearer_interceptor_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the interceptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// A request passing through [`Interceptor::intercept`](crate::interceptor::Interceptor::intercept).
	Intercept,
	/// The shared refresh call started by the coordinator.
	Refresh,
	/// A proactive refresh requested by the caller.
	ManualRefresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Intercept => "intercept",
			FlowKind::Refresh => "refresh",
			FlowKind::ManualRefresh => "manual_refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an interceptor helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller or converted into an unauthenticated signal.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
