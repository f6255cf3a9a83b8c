//! Wizard session endpoints.
//!
//! Each operation applies one interaction to a visitor's session and returns
//! the resulting [`SessionView`]. Gated interactions succeed and return the
//! unchanged view; only malformed or conflicting requests are errors.

use ornament_core::{
	view::{session_view, SUBMIT_FAILED_NOTICE},
	OrderEngine, SessionError, WizardError, WizardEvent,
};
use ornament_types::{
	truncate_id, APIError, LineId, LineUpdate, SessionView, SubmissionStatus,
};

/// Maps session failures to API errors.
pub fn api_error(err: SessionError) -> APIError {
	match err {
		SessionError::NotFound(id) => APIError::NotFound {
			error_type: "SESSION_NOT_FOUND".to_string(),
			message: format!("Session not found: {}", id),
		},
		SessionError::Wizard(err) => {
			let message = err.to_string();
			match err {
				WizardError::UnknownField(_) => APIError::BadRequest {
					error_type: "UNKNOWN_FIELD".to_string(),
					message,
				},
				WizardError::UnknownConsent(_) => APIError::BadRequest {
					error_type: "UNKNOWN_CONSENT".to_string(),
					message,
				},
				WizardError::AlreadySubmitted => APIError::Conflict {
					error_type: "ORDER_ALREADY_SUBMITTED".to_string(),
					message,
				},
				WizardError::SubmissionInProgress => APIError::Conflict {
					error_type: "SUBMISSION_IN_PROGRESS".to_string(),
					message,
				},
				WizardError::SaleClosed => APIError::UnprocessableEntity {
					error_type: "SALE_CLOSED".to_string(),
					message,
				},
			}
		},
	}
}

/// POST /api/sessions
pub fn create_session(engine: &OrderEngine) -> Result<SessionView, APIError> {
	let (session_id, state) = engine.sessions().create().map_err(api_error)?;
	tracing::info!(session_id = %truncate_id(&session_id), "Order session created");
	Ok(session_view(engine.wizard(), &session_id, &state))
}

/// GET /api/sessions/{id}
pub async fn get_session(engine: &OrderEngine, session_id: &str) -> Result<SessionView, APIError> {
	let state = engine.sessions().get(session_id).await.map_err(api_error)?;
	Ok(session_view(engine.wizard(), session_id, &state))
}

async fn apply(
	engine: &OrderEngine,
	session_id: &str,
	event: WizardEvent,
) -> Result<SessionView, APIError> {
	let state = engine
		.sessions()
		.apply(session_id, event)
		.await
		.map_err(api_error)?;
	Ok(session_view(engine.wizard(), session_id, &state))
}

/// PUT /api/sessions/{id}/buyer/{field}
pub async fn set_buyer_field(
	engine: &OrderEngine,
	session_id: &str,
	key: String,
	value: String,
) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::SetBuyerField { key, value }).await
}

/// POST /api/sessions/{id}/lines
pub async fn add_line(engine: &OrderEngine, session_id: &str) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::AddLine).await
}

/// PATCH /api/sessions/{id}/lines/{line}
pub async fn update_line(
	engine: &OrderEngine,
	session_id: &str,
	line: u64,
	update: LineUpdate,
) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::UpdateLine(LineId(line), update)).await
}

/// DELETE /api/sessions/{id}/lines/{line}
pub async fn remove_line(
	engine: &OrderEngine,
	session_id: &str,
	line: u64,
) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::RemoveLine(LineId(line))).await
}

/// POST /api/sessions/{id}/next
pub async fn next_step(engine: &OrderEngine, session_id: &str) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::Next).await
}

/// POST /api/sessions/{id}/back
pub async fn previous_step(engine: &OrderEngine, session_id: &str) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::Back).await
}

/// PUT /api/sessions/{id}/consents/{flag}
pub async fn set_consent(
	engine: &OrderEngine,
	session_id: &str,
	key: String,
	checked: bool,
) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::SetConsent { key, checked }).await
}

/// POST /api/sessions/{id}/dismiss-error
pub async fn dismiss_error(engine: &OrderEngine, session_id: &str) -> Result<SessionView, APIError> {
	apply(engine, session_id, WizardEvent::DismissError).await
}

/// POST /api/sessions/{id}/submit
///
/// A failed write is reported as 503; the session keeps its data and the
/// order can be submitted again.
pub async fn submit(engine: &OrderEngine, session_id: &str) -> Result<SessionView, APIError> {
	let state = engine
		.sessions()
		.submit(session_id)
		.await
		.map_err(api_error)?;

	if state.submission() == SubmissionStatus::Failed {
		return Err(APIError::ServiceUnavailable {
			error_type: "SUBMISSION_FAILED".to_string(),
			message: SUBMIT_FAILED_NOTICE.to_string(),
			retry_after: None,
		});
	}

	Ok(session_view(engine.wizard(), session_id, &state))
}
