//! Single-flight credential refresh.
//!
//! [`RefreshCoordinator::refresh`] is the only way the crate obtains a new credential. The
//! first caller marks a refresh as in flight and issues the refresh call; every caller that
//! arrives while it is outstanding joins the same operation and receives a clone of its
//! outcome. The in-flight slot is checked and set under a synchronous lock, so two callers can
//! never both observe "nothing in flight" and start two refresh calls. Once the call settles
//! the slot is cleared, and the next caller starts a fresh refresh.

pub mod http;

mod metrics;

pub use self::http::HttpRefresher;
pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::RefreshError,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::CredentialStore,
};

/// Settled result shared with every caller joined to one refresh.
pub type RefreshOutcome = Result<Credential, RefreshError>;
/// Boxed future returned by [`Refresher::refresh`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = RefreshOutcome> + 'a + Send>>;

/// Performs the actual refresh call that exchanges a session signal for a new credential.
///
/// Implementations only talk to the refresh endpoint; persisting the credential and
/// de-duplicating concurrent callers is the coordinator's job.
pub trait Refresher
where
	Self: 'static + Send + Sync,
{
	/// Requests a new credential.
	fn refresh(&self) -> RefreshFuture<'_>;
}

/// Observer notified after a refreshed credential has been stored.
pub trait RefreshListener
where
	Self: 'static + Send + Sync,
{
	/// Called once per successful refresh, before joined callers are released.
	fn on_refreshed(&self, credential: &Credential);
}
impl<F> RefreshListener for F
where
	F: 'static + Send + Sync + Fn(&Credential),
{
	fn on_refreshed(&self, credential: &Credential) {
		self(credential)
	}
}

/// Shared refresh operation; initialized exactly once by whichever joined caller drives it.
#[derive(Default)]
struct InFlight {
	outcome: AsyncOnceCell<RefreshOutcome>,
}

/// Clears the in-flight slot once the refresh call settles.
///
/// A drop without settling means the driving caller was cancelled or the refresh panicked. The
/// slot is left in place so joined and later callers re-drive the same operation instead of
/// starting a second one.
struct SettleGuard<'a> {
	slot: &'a Mutex<Option<Arc<InFlight>>>,
	flight: &'a Arc<InFlight>,
	settled: bool,
}
impl Drop for SettleGuard<'_> {
	fn drop(&mut self) {
		if !self.settled {
			return;
		}

		let mut slot = self.slot.lock();

		if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, self.flight)) {
			slot.take();
		}
	}
}

/// De-duplicates refresh calls across every request that shares this coordinator.
///
/// One coordinator should back every interceptor that shares a credential store; give each
/// independent store its own coordinator.
pub struct RefreshCoordinator {
	refresher: Arc<dyn Refresher>,
	store: Arc<dyn CredentialStore>,
	listener: Option<Arc<dyn RefreshListener>>,
	/// Counters for issued, joined, and settled refresh calls.
	pub metrics: Arc<RefreshMetrics>,
	in_flight: Mutex<Option<Arc<InFlight>>>,
}
impl RefreshCoordinator {
	/// Creates a coordinator that refreshes through `refresher` and persists into `store`.
	pub fn new(refresher: Arc<dyn Refresher>, store: Arc<dyn CredentialStore>) -> Self {
		Self {
			refresher,
			store,
			listener: None,
			metrics: Default::default(),
			in_flight: Mutex::new(None),
		}
	}

	/// Registers a listener notified after every successful refresh.
	pub fn with_listener(mut self, listener: impl RefreshListener) -> Self {
		self.listener = Some(Arc::new(listener));

		self
	}

	/// Returns `true` while a refresh call is outstanding.
	pub fn is_in_flight(&self) -> bool {
		self.in_flight.lock().is_some()
	}

	/// Returns the outcome of the in-flight refresh, starting one if none is outstanding.
	///
	/// On success the new credential has already been written to the store when this resolves.
	pub async fn refresh(&self) -> RefreshOutcome {
		let flight = self.join_or_start();
		let outcome = flight.outcome.get_or_init(|| self.drive(&flight)).await;

		outcome.clone()
	}

	fn join_or_start(&self) -> Arc<InFlight> {
		let mut slot = self.in_flight.lock();

		if let Some(flight) = slot.as_ref() {
			self.metrics.record_join();
			obs::refresh_joined();

			return Arc::clone(flight);
		}

		let flight = Arc::new(InFlight::default());

		*slot = Some(Arc::clone(&flight));

		flight
	}

	async fn drive(&self, flight: &Arc<InFlight>) -> RefreshOutcome {
		const KIND: FlowKind = FlowKind::Refresh;

		let mut guard = SettleGuard { slot: &self.in_flight, flight, settled: false };
		let span = FlowSpan::new(KIND, "refresh");

		self.metrics.record_attempt();
		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		obs::refresh_started();

		let outcome = span.instrument(self.refresh_and_store()).await;

		match &outcome {
			Ok(credential) => {
				self.metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				obs::refresh_succeeded(credential.expires_at);
			},
			Err(err) => {
				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::refresh_failed(err);
			},
		}

		guard.settled = true;

		outcome
	}

	async fn refresh_and_store(&self) -> RefreshOutcome {
		let credential = self.refresher.refresh().await?;

		self.store.set(credential.clone()).await.map_err(RefreshError::Storage)?;

		if let Some(listener) = self.listener.as_ref() {
			listener.on_refreshed(&credential);
		}

		Ok(credential)
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("in_flight", &self.is_in_flight())
			.field("listener_set", &self.listener.is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}
