use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use uuid::Uuid;

use gather_core::notifications;
use gather_types::api::{Claims, Empty, Envelope, NotificationQuery, NotificationsResponse};

use crate::auth::{AppState, run};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct MarkedResponse {
    pub marked: usize,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<NotificationQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<NotificationsResponse>>, ApiError> {
    let notifications = run(&state, move |db| {
        notifications::list(db, claims.sub, query.unread_only)
    })
    .await?;
    Ok(Json(Envelope::ok(
        "notifications",
        NotificationsResponse { notifications },
    )))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| {
        notifications::mark_read(db, claims.sub, notification_id)
    })
    .await?;
    Ok(Json(Envelope::ok("marked as read", Empty {})))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<MarkedResponse>>, ApiError> {
    let marked = run(&state, move |db| notifications::mark_all_read(db, claims.sub)).await?;
    Ok(Json(Envelope::ok("marked all as read", MarkedResponse { marked })))
}
