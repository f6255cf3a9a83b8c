//! The assembled order service.
//!
//! Holds the wizard, the session registry and the order store built from one
//! configuration, and owns the background session cleanup.

use crate::session::SessionRegistry;
use crate::view;
use crate::wizard::Wizard;
use crate::writer::OrderStore;
use ornament_config::Config;
use ornament_types::FormResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct OrderEngine {
	config: Config,
	wizard: Arc<Wizard>,
	sessions: Arc<SessionRegistry>,
	orders: Arc<OrderStore>,
}

impl OrderEngine {
	pub fn new(
		config: Config,
		wizard: Arc<Wizard>,
		sessions: Arc<SessionRegistry>,
		orders: Arc<OrderStore>,
	) -> Self {
		Self {
			config,
			wizard,
			sessions,
			orders,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn wizard(&self) -> &Arc<Wizard> {
		&self.wizard
	}

	pub fn sessions(&self) -> &Arc<SessionRegistry> {
		&self.sessions
	}

	pub fn orders(&self) -> &Arc<OrderStore> {
		&self.orders
	}

	/// Form description for the configured variant.
	pub fn form(&self) -> FormResponse {
		view::form_response(
			&self.wizard,
			&self.config.form.title,
			self.config.form.variant.as_str(),
			&self.config.sale.closed_message,
		)
	}

	/// Starts evicting idle sessions in the background.
	///
	/// The task runs until the returned handle is aborted.
	pub fn start_session_cleanup(&self) -> JoinHandle<()> {
		let every = Duration::from_secs(self.config.sessions.cleanup_interval_seconds);
		tracing::info!(
			interval_seconds = self.config.sessions.cleanup_interval_seconds,
			idle_timeout_seconds = self.config.sessions.idle_timeout_seconds,
			"Session cleanup started"
		);
		self.sessions.spawn_cleanup(every)
	}
}
