//! Per-visitor wizard sessions.
//!
//! Each session owns a private [`OrderState`] behind its own lock, so events
//! for one order are applied one at a time while different visitors never
//! contend. A submission holds the lock only to flip the state to Submitting
//! and again to record the outcome; the write itself runs unlocked, and a
//! second submit in the meantime sees Submitting and is refused.

use crate::state::{OrderState, WizardError, WizardEvent};
use crate::wizard::Wizard;
use dashmap::DashMap;
use ornament_types::{truncate_id, SubmissionStatus};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("Session not found: {0}")]
	NotFound(String),
	#[error(transparent)]
	Wizard(#[from] WizardError),
}

struct Session {
	state: OrderState,
	last_seen: Instant,
}

impl Session {
	fn touch(&mut self) {
		self.last_seen = Instant::now();
	}

	/// In-flight submissions are never evicted.
	fn is_expired(&self, idle_timeout: Duration) -> bool {
		self.state.submission() != SubmissionStatus::Submitting
			&& self.last_seen.elapsed() >= idle_timeout
	}
}

pub struct SessionRegistry {
	wizard: Arc<Wizard>,
	sessions: DashMap<String, Arc<Mutex<Session>>>,
	idle_timeout: Duration,
}

impl SessionRegistry {
	pub fn new(wizard: Arc<Wizard>, idle_timeout: Duration) -> Self {
		Self {
			wizard,
			sessions: DashMap::new(),
			idle_timeout,
		}
	}

	pub fn wizard(&self) -> &Arc<Wizard> {
		&self.wizard
	}

	/// Number of live sessions.
	pub fn active_count(&self) -> usize {
		self.sessions.len()
	}

	/// Starts a new order and returns its session id.
	pub fn create(&self) -> Result<(String, OrderState), SessionError> {
		let state = self.wizard.start()?;
		let session_id = Uuid::new_v4().to_string();
		self.sessions.insert(
			session_id.clone(),
			Arc::new(Mutex::new(Session {
				state: state.clone(),
				last_seen: Instant::now(),
			})),
		);
		tracing::debug!(session_id = %truncate_id(&session_id), "Session started");
		Ok((session_id, state))
	}

	fn session(&self, session_id: &str) -> Result<Arc<Mutex<Session>>, SessionError> {
		self.sessions
			.get(session_id)
			.map(|entry| Arc::clone(entry.value()))
			.ok_or_else(|| SessionError::NotFound(session_id.to_string()))
	}

	/// Current state of a session.
	pub async fn get(&self, session_id: &str) -> Result<OrderState, SessionError> {
		let session = self.session(session_id)?;
		let mut guard = session.lock().await;
		guard.touch();
		Ok(guard.state.clone())
	}

	/// Applies an event to a session and returns the new state.
	pub async fn apply(
		&self,
		session_id: &str,
		event: WizardEvent,
	) -> Result<OrderState, SessionError> {
		let session = self.session(session_id)?;
		let mut guard = session.lock().await;
		guard.touch();
		let next = self.wizard.apply(&guard.state, event)?;
		guard.state = next.clone();
		Ok(next)
	}

	/// Submits a session's order.
	///
	/// The write and the recording of its outcome run on their own task, so
	/// the session settles even if the caller stops waiting.
	pub async fn submit(&self, session_id: &str) -> Result<OrderState, SessionError> {
		let session = self.session(session_id)?;

		let (submitting, record) = {
			let mut guard = session.lock().await;
			guard.touch();
			match self.wizard.prepare_submission(&guard.state)? {
				Some((submitting, record)) => {
					guard.state = submitting.clone();
					(submitting, record)
				},
				None => return Ok(guard.state.clone()),
			}
		};

		tracing::debug!(session_id = %truncate_id(session_id), "Submitting order");
		let wizard = Arc::clone(&self.wizard);
		let task_session = Arc::clone(&session);
		let write = tokio::spawn(async move {
			let outcome = wizard.complete_submission(&submitting, &record).await;
			let mut guard = task_session.lock().await;
			guard.touch();
			guard.state = outcome.clone();
			outcome
		});

		match write.await {
			Ok(outcome) => Ok(outcome),
			Err(e) => {
				tracing::error!(
					session_id = %truncate_id(session_id),
					error = %e,
					"Submission task failed"
				);
				let mut guard = session.lock().await;
				guard.state = guard.state.finish_submission::<String>(Err(e.to_string()));
				Ok(guard.state.clone())
			},
		}
	}

	/// Drops sessions idle for longer than the timeout. Returns how many were removed.
	///
	/// Sessions that are locked are in use and skipped.
	pub fn cleanup_idle(&self) -> usize {
		let idle_timeout = self.idle_timeout;
		let expired: Vec<String> = self
			.sessions
			.iter()
			.filter(|entry| {
				entry
					.value()
					.try_lock()
					.is_ok_and(|session| session.is_expired(idle_timeout))
			})
			.map(|entry| entry.key().clone())
			.collect();

		expired
			.into_iter()
			.filter(|id| {
				self.sessions
					.remove_if(id, |_, session| {
						session
							.try_lock()
							.is_ok_and(|session| session.is_expired(idle_timeout))
					})
					.is_some()
			})
			.count()
	}

	/// Runs [`cleanup_idle`](Self::cleanup_idle) on a fixed interval.
	pub fn spawn_cleanup(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
		let registry = Arc::clone(self);
		tokio::spawn(async move {
			let mut interval = tokio::time::interval(every);
			loop {
				interval.tick().await;
				let removed = registry.cleanup_idle();
				if removed > 0 {
					tracing::debug!(
						"Session cleanup: removed {} idle sessions, {} active",
						removed,
						registry.active_count()
					);
				}
			}
		})
	}
}
