// self
use crate::{
	_prelude::*,
	error::RefreshError,
	obs::FlowKind,
	store::StoreError,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by interceptor flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("bearer_interceptor.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn refresh_started() {
	#[cfg(feature = "tracing")]
	tracing::info!("Refreshing bearer credential.");
}

pub(crate) fn refresh_joined() {
	#[cfg(feature = "tracing")]
	tracing::debug!("Joining in-flight credential refresh.");
}

pub(crate) fn refresh_succeeded(expires_at: Option<OffsetDateTime>) {
	#[cfg(feature = "tracing")]
	tracing::info!(?expires_at, "Bearer credential refreshed.");
	#[cfg(not(feature = "tracing"))]
	let _ = expires_at;
}

pub(crate) fn refresh_failed(err: &RefreshError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(error = %err, "Bearer credential refresh failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = err;
}

pub(crate) fn unauthenticated(location: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(location, "Credential rejected; signalling re-authentication.");
	#[cfg(not(feature = "tracing"))]
	let _ = location;
}

pub(crate) fn store_failed(operation: &'static str, err: &StoreError) {
	#[cfg(feature = "tracing")]
	tracing::warn!(operation, error = %err, "Credential store operation failed.");
	#[cfg(not(feature = "tracing"))]
	let _ = (operation, err);
}

pub(crate) fn interceptor_toggled(installed: bool) {
	#[cfg(feature = "tracing")]
	{
		if installed {
			tracing::info!("Bearer interceptor installed.");
		} else {
			tracing::info!("Bearer interceptor removed.");
		}
	}
	#[cfg(not(feature = "tracing"))]
	let _ = installed;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrumented_flow_yields_inner_output() {
		let output = FlowSpan::new(FlowKind::Intercept, "test").instrument(async { 7 }).await;

		assert_eq!(output, 7);
	}

	#[test]
	fn event_helpers_accept_all_inputs() {
		refresh_started();
		refresh_joined();
		refresh_succeeded(None);
		refresh_failed(&RefreshError::Status { status: 500 });
		unauthenticated("/c/1?x=y");
		store_failed("clear", &StoreError::Backend { message: "locked".into() });
		interceptor_toggled(true);
		interceptor_toggled(false);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
