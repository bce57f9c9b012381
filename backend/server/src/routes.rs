use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State as AxumState, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use crate::{
    error::AppError,
    models::{InteractionsRequest, UidQuery},
    state::State,
    utils::{get_lookup, get_uid},
};

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "History backend running" })))
}

pub async fn interactions_handler(
    AxumState(state): AxumState<Arc<State>>,
    payload: Result<Json<InteractionsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::MalformedPayload(e.body_text()))?;
    let lookup = get_lookup(payload)?;

    let interactions = state
        .aggregator
        .aggregate(&lookup.drugs, &lookup.foods)
        .await?;

    let record = state.store.create(&lookup.uid, interactions).await?;
    info!(
        "Saved {} interactions for {} as {}",
        record.interactions.len(),
        record.uid,
        record.id
    );

    Ok((StatusCode::OK, Json(record)))
}

pub async fn history_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<UidQuery>,
) -> Result<impl IntoResponse, AppError> {
    let uid = get_uid(query.uid)?;
    let records = state.store.list_by_user(&uid).await?;

    if records.is_empty() {
        return Ok((
            StatusCode::OK,
            Json(json!({
                "message": "No history found for this user",
                "data": []
            })),
        ));
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "count": records.len(),
            "data": records
        })),
    ))
}

pub async fn delete_single_handler(
    AxumState(state): AxumState<Arc<State>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete_by_id(&id).await?;
    info!("Deleted history record {id}");

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "History deleted successfully",
            "deletedId": id
        })),
    ))
}

pub async fn clear_history_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<UidQuery>,
) -> Result<impl IntoResponse, AppError> {
    let uid = get_uid(query.uid)?;
    let deleted = state.store.delete_all_by_user(&uid).await?;
    info!("Cleared {deleted} history records for {uid}");

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "History cleared successfully",
            "deletedCount": deleted
        })),
    ))
}
