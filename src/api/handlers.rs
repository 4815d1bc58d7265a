// SPDX-License-Identifier: MPL-2.0

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::Json;
use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound as _};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::parse::parse_timestamp;
use crate::records::{Database, Entry, Records};
use crate::report::ProjectTotals;

#[derive(Deserialize, Debug)]
pub struct StartTimerRequest {
    pub project: String,
}

#[derive(Deserialize, Debug)]
pub struct AddEntryRequest {
    pub project: String,
    pub start_time: String,
    /// Missing, null and blank all mean the entry is still running.
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize, Debug)]
pub struct StartTimerResponse {
    pub message: &'static str,
    pub project_id: i32,
}

type JsonBody<T> = Result<Json<T>, JsonRejection>;

pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "healthy" }))
}

pub async fn start_timer(
    State(database): State<Database>,
    payload: JsonBody<StartTimerRequest>,
) -> Result<(StatusCode, Json<StartTimerResponse>), ApiError> {
    let Json(request) = payload?;
    let project = project_name(&request.project)?.to_owned();

    let started = with_records(&database, move |recs| recs.start_timer(&project, now())).await?;
    if started.stopped > 0 {
        log::info!(
            "Stopped {} running timer(s) at {}",
            started.stopped,
            started.entry.start_time
        );
    }
    log::info!(
        "Started timer for {} at {}",
        started.project.name,
        started.entry.start_time
    );

    Ok((
        StatusCode::CREATED,
        Json(StartTimerResponse {
            message: "Timer started",
            project_id: started.project.id,
        }),
    ))
}

pub async fn stop_timer(
    State(database): State<Database>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let end = now();
    let stopped = with_records(&database, move |recs| recs.stop_timer(end)).await?;
    if stopped > 0 {
        log::info!("Stopped {stopped} running timer(s) at {end}");
    } else {
        log::warn!("No running timer found to be stopped at {end}");
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Timer stopped",
        }),
    ))
}

pub async fn add_entry(
    State(database): State<Database>,
    payload: JsonBody<AddEntryRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(request) = payload?;
    let project = project_name(&request.project)?.to_owned();
    let now = now();
    let today = now.date();
    let start_time = timestamp("start_time", &request.start_time, today)?;
    let end_time = request
        .end_time
        .as_deref()
        .filter(|end| !end.trim().is_empty())
        .map(|end| timestamp("end_time", end, today))
        .transpose()?;

    let entry = with_records(&database, move |recs| {
        recs.add_entry(&project, start_time, end_time, now)
    })
    .await?;
    match entry.end_time {
        None => log::info!(
            "Added entry for {} starting at {}",
            entry.project_name,
            entry.start_time
        ),
        Some(end_time) => log::info!(
            "Added entry for {} starting at {} and ending at {end_time}",
            entry.project_name,
            entry.start_time
        ),
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Entry added",
        }),
    ))
}

pub async fn timeline(State(database): State<Database>) -> Result<Json<Vec<Entry>>, ApiError> {
    let entries = with_records(&database, |recs| recs.timeline()).await?;
    Ok(Json(entries))
}

pub async fn analytics(State(database): State<Database>) -> Result<Json<ProjectTotals>, ApiError> {
    let now = now();
    let totals = with_records(&database, move |recs| recs.weekly_totals(now)).await?;
    Ok(Json(totals))
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {uri}"))
}

/// Runs `f` against a connection opened for this request only.
///
/// Diesel's SQLite connection is blocking, so the work happens on tokio's blocking pool.
/// The connection is dropped (and closed) as soon as `f` returns.
async fn with_records<T, F>(database: &Database, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut Records<'_>) -> anyhow::Result<T> + Send + 'static,
{
    let database = database.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut conn = database.connect()?;
        let mut recs = Records::new(&mut conn);
        f(&mut recs)
    })
    .await
    .map_err(|err| ApiError::Storage(anyhow::anyhow!("database task failed: {err}")))?;
    Ok(result?)
}

/// Names are kept exactly as sent; `" Alpha"` and `"Alpha"` are different projects.
fn project_name(project: &str) -> Result<&str, ApiError> {
    if project.trim().is_empty() {
        return Err(ApiError::Validation(
            "project name must not be empty".to_owned(),
        ));
    }
    Ok(project)
}

fn timestamp(field: &str, value: &str, today: NaiveDate) -> Result<NaiveDateTime, ApiError> {
    parse_timestamp(value, today)
        .ok_or_else(|| ApiError::Validation(format!("could not parse {field} {value:?}")))
}

/// The server's local wall clock, at the precision timestamps are stored with.
fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}
