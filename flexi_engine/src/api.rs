//! HTTP API for the Flexi Engine.
//!
//! This module exposes a small REST API around the balance engine using
//! the [`axum`](https://crates.io/crates/axum) framework.  Clients read
//! and edit their days off, payouts and preferences, import raw time
//! entries and fetch the computed flexi account.  A stateless endpoint
//! computes a summary for a snapshot posted in full.

use crate::engine::{compute_summary, Snapshot};
use crate::entries::{aggregate_by_week, sample_entries, TimeEntry};
use crate::error::Error as FlexiError;
use crate::format::format_minutes;
use crate::models::{ComputedResult, Config, DaysOffMap, PayoutsMap, Preferences, WeekKey, WorkWeek};
use crate::sanitize::{sanitize_day_indices, sanitize_payout_minutes};
use crate::settings::Settings;
use crate::store::{AccountData, Store};
use crate::week::start_of_week;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Application state shared across requests.
pub struct AppState {
    /// Configuration from the environment, before user preferences.
    pub config: Config,
    pub store: Store,
}

impl AppState {
    /// The engine configuration with stored preferences applied.
    fn effective_config(&self, data: &AccountData) -> Config {
        match &data.preferences {
            Some(prefs) => self.config.with_preferences(prefs),
            None => self.config.clone(),
        }
    }

    /// Week totals for the account.  Test mode serves the built-in
    /// sample data, which is laid out in UTC, instead of imported entries.
    fn work_weeks(&self, data: &AccountData) -> Vec<WorkWeek> {
        if self.config.test_mode {
            aggregate_by_week(&sample_entries(), &Utc)
        } else {
            aggregate_by_week(&data.entries, &Local)
        }
    }
}

/// Errors returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Flexi(#[from] FlexiError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Flexi(err) if err.is_invalid_input() => StatusCode::BAD_REQUEST,
            ApiError::Flexi(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Open the store named in `settings` (or an in-memory one) and wrap it
/// into shared state.
pub async fn build_state(settings: &Settings) -> Arc<AppState> {
    let store = match &settings.data_file {
        Some(path) => Store::open(path.clone()).await,
        None => Store::in_memory(),
    };
    Arc::new(AppState {
        config: settings.config.clone(),
        store,
    })
}

/// Build the API router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/config", get(config_handler))
        .route("/api/days-off", get(get_days_off).put(put_days_off))
        .route("/api/payouts", get(get_payouts).put(put_payout))
        .route("/api/preferences", put(put_preferences))
        .route("/api/hours", get(hours_handler))
        .route("/api/time-entries", post(import_entries))
        .route("/api/summary", get(summary_handler))
        .route("/api/calculate", post(calculate_handler))
        .with_state(state)
}

/// Handler for GET /api/config
async fn config_handler(State(state): State<Arc<AppState>>) -> Json<Config> {
    let data = state.store.read().await;
    Json(state.effective_config(&data))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DaysOffBody {
    days_off: DaysOffMap,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DaysOffUpdate {
    week_start: String,
    days_off: Vec<i64>,
}

async fn get_days_off(State(state): State<Arc<AppState>>) -> Json<DaysOffBody> {
    let data = state.store.read().await;
    Json(DaysOffBody { days_off: data.days_off })
}

/// Handler for PUT /api/days-off
async fn put_days_off(
    State(state): State<Arc<AppState>>,
    Json(update): Json<DaysOffUpdate>,
) -> ApiResult<DaysOffBody> {
    let week: WeekKey = update.week_start.parse()?;
    let days = sanitize_day_indices(&update.days_off);
    info!(%week, ?days, "saving days off");
    let days_off = state.store.set_days_off(week, days).await?;
    Ok(Json(DaysOffBody { days_off }))
}

#[derive(Debug, Serialize)]
struct PayoutsBody {
    payouts: PayoutsMap,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PayoutUpdate {
    week_start: String,
    minutes: i64,
}

async fn get_payouts(State(state): State<Arc<AppState>>) -> Json<PayoutsBody> {
    let data = state.store.read().await;
    Json(PayoutsBody { payouts: data.payouts })
}

/// Handler for PUT /api/payouts
async fn put_payout(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PayoutUpdate>,
) -> ApiResult<PayoutsBody> {
    let week: WeekKey = update.week_start.parse()?;
    let minutes = sanitize_payout_minutes(update.minutes)?;
    info!(%week, minutes, "saving payout");
    let payouts = state.store.set_payout(week, minutes).await?;
    Ok(Json(PayoutsBody { payouts }))
}

/// Handler for PUT /api/preferences
async fn put_preferences(
    State(state): State<Arc<AppState>>,
    Json(prefs): Json<Preferences>,
) -> ApiResult<Preferences> {
    let saved = state.store.set_preferences(prefs).await?;
    info!(?saved, "saved preferences");
    Ok(Json(saved))
}

#[derive(Debug, Serialize)]
struct HoursBody {
    weeks: Vec<WorkWeek>,
}

/// Handler for GET /api/hours
async fn hours_handler(State(state): State<Arc<AppState>>) -> Json<HoursBody> {
    let data = state.store.read().await;
    Json(HoursBody {
        weeks: state.work_weeks(&data),
    })
}

/// Handler for POST /api/time-entries.  Replaces all imported entries.
async fn import_entries(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<TimeEntry>>,
) -> ApiResult<serde_json::Value> {
    let imported = state.store.replace_entries(entries).await?;
    info!(imported, "imported time entries");
    Ok(Json(json!({ "imported": imported })))
}

/// Handler for GET /api/summary
async fn summary_handler(State(state): State<Arc<AppState>>) -> Json<ComputedResult> {
    let data = state.store.read().await;
    let config = state.effective_config(&data);
    let weeks = state.work_weeks(&data);
    let summary = compute_summary(&weeks, &data.days_off, &data.payouts, &config, None);
    debug!(balance = %format_minutes(summary.plus_account_minutes as f64), "served summary");
    Json(summary)
}

/// Longest account history `/api/calculate` accepts, roughly two centuries.
const MAX_CALCULATE_WEEKS: i64 = 10_000;

/// Handler for POST /api/calculate.  The posted configuration is clamped
/// like stored preferences before it reaches the engine.
async fn calculate_handler(Json(mut snapshot): Json<Snapshot>) -> ApiResult<ComputedResult> {
    let prefs = snapshot.config.preferences().clamped();
    snapshot.config = snapshot.config.with_preferences(&prefs);

    let first = start_of_week(snapshot.config.start_date).date();
    let last = snapshot.current_week().date();
    let weeks = (last - first).num_weeks();
    if weeks > MAX_CALCULATE_WEEKS {
        return Err(FlexiError::RangeTooLong {
            weeks,
            max: MAX_CALCULATE_WEEKS,
        }
        .into());
    }
    Ok(Json(snapshot.compute()))
}

/// Launch the API server.  This function opens the store, binds to the
/// configured address and blocks until the server terminates.
pub async fn serve(settings: Settings) -> Result<()> {
    let state = build_state(&settings).await;
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
