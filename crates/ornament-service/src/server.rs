//! HTTP server for the ornament order API.
//!
//! Routes live under `/api`: the form description, the wizard session
//! endpoints that drive one visitor's order, and order lookup.

use crate::apis;
use axum::{
	extract::{DefaultBodyLimit, Path, State},
	http::{HeaderValue, StatusCode},
	response::{IntoResponse, Json},
	routing::{get, patch, post, put},
	Router,
};
use ornament_config::CorsConfig;
use ornament_core::OrderEngine;
use ornament_types::{
	APIError, FormResponse, GetOrderResponse, SessionView, SetBuyerFieldRequest,
	SetConsentRequest, UpdateLineRequest,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<OrderEngine>,
}

/// Builds the router with all routes and middleware.
///
/// Submission is not subject to the request timeout: a started write runs to
/// completion and its outcome is returned to the caller.
pub fn build_router(engine: Arc<OrderEngine>) -> Router {
	let api = engine.config().api.clone();

	let api_routes = Router::new()
		.route("/form", get(handle_get_form))
		.route("/sessions", post(handle_create_session))
		.route("/sessions/{id}", get(handle_get_session))
		.route("/sessions/{id}/buyer/{field}", put(handle_set_buyer_field))
		.route("/sessions/{id}/lines", post(handle_add_line))
		.route(
			"/sessions/{id}/lines/{line}",
			patch(handle_update_line).delete(handle_remove_line),
		)
		.route("/sessions/{id}/next", post(handle_next))
		.route("/sessions/{id}/back", post(handle_back))
		.route("/sessions/{id}/consents/{flag}", put(handle_set_consent))
		.route("/sessions/{id}/dismiss-error", post(handle_dismiss_error))
		.route("/orders/{id}", get(handle_get_order_by_id))
		.layer(TimeoutLayer::new(Duration::from_secs(api.timeout_seconds)))
		.route("/sessions/{id}/submit", post(handle_submit));

	Router::new()
		.nest("/api", api_routes)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(cors_layer(api.cors.as_ref()))
				.layer(DefaultBodyLimit::max(api.max_request_size)),
		)
		.with_state(AppState { engine })
}

/// Permissive unless origins are configured.
fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	let Some(cors) = cors else {
		return CorsLayer::permissive();
	};

	let origins: Vec<HeaderValue> = cors
		.allowed_origins
		.iter()
		.filter_map(|origin| match origin.parse::<HeaderValue>() {
			Ok(value) => Some(value),
			Err(e) => {
				tracing::warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
				None
			},
		})
		.collect();

	CorsLayer::new()
		.allow_origin(AllowOrigin::list(origins))
		.allow_methods(Any)
		.allow_headers(Any)
}

/// Starts the HTTP server and runs until Ctrl+C.
pub async fn start_server(engine: Arc<OrderEngine>) -> Result<(), Box<dyn std::error::Error>> {
	let bind_address = format!(
		"{}:{}",
		engine.config().api.host,
		engine.config().api.port
	);
	let app = build_router(engine);

	let listener = TcpListener::bind(&bind_address).await?;
	tracing::info!("Ornament order API server starting on {}", bind_address);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::warn!("Failed to listen for shutdown signal: {}", e);
	}
}

/// Handles GET /api/form requests.
async fn handle_get_form(State(state): State<AppState>) -> Json<FormResponse> {
	Json(state.engine.form())
}

/// Handles POST /api/sessions requests.
async fn handle_create_session(
	State(state): State<AppState>,
) -> Result<impl IntoResponse, APIError> {
	let view = apis::session::create_session(&state.engine)?;
	Ok((StatusCode::CREATED, Json(view)))
}

async fn handle_get_session(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::get_session(&state.engine, &id).await.map(Json)
}

async fn handle_set_buyer_field(
	Path((id, field)): Path<(String, String)>,
	State(state): State<AppState>,
	Json(request): Json<SetBuyerFieldRequest>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::set_buyer_field(&state.engine, &id, field, request.value)
		.await
		.map(Json)
}

async fn handle_add_line(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::add_line(&state.engine, &id).await.map(Json)
}

async fn handle_update_line(
	Path((id, line)): Path<(String, u64)>,
	State(state): State<AppState>,
	Json(request): Json<UpdateLineRequest>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::update_line(&state.engine, &id, line, request.0)
		.await
		.map(Json)
}

async fn handle_remove_line(
	Path((id, line)): Path<(String, u64)>,
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::remove_line(&state.engine, &id, line)
		.await
		.map(Json)
}

async fn handle_next(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::next_step(&state.engine, &id).await.map(Json)
}

async fn handle_back(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::previous_step(&state.engine, &id)
		.await
		.map(Json)
}

async fn handle_set_consent(
	Path((id, flag)): Path<(String, String)>,
	State(state): State<AppState>,
	Json(request): Json<SetConsentRequest>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::set_consent(&state.engine, &id, flag, request.checked)
		.await
		.map(Json)
}

/// Handles POST /api/sessions/{id}/submit requests.
async fn handle_submit(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	match apis::session::submit(&state.engine, &id).await {
		Ok(view) => Ok(Json(view)),
		Err(e) => {
			tracing::warn!("Order submission request failed: {}", e);
			Err(e)
		},
	}
}

async fn handle_dismiss_error(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<SessionView>, APIError> {
	apis::session::dismiss_error(&state.engine, &id)
		.await
		.map(Json)
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order_by_id(
	Path(id): Path<String>,
	State(state): State<AppState>,
) -> Result<Json<GetOrderResponse>, APIError> {
	match apis::order::get_order_by_id(&state.engine, &id).await {
		Ok(response) => Ok(Json(response)),
		Err(e) => {
			tracing::warn!("Order retrieval failed: {}", e);
			Err(APIError::from(e))
		},
	}
}
