use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use gather_core::relationships;
use gather_types::api::{Claims, Empty, Envelope, FriendRequestsResponse, FriendsResponse};

use crate::auth::{AppState, run};
use crate::error::ApiError;

pub async fn list_friends(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<FriendsResponse>>, ApiError> {
    let friends = run(&state, move |db| relationships::list_friends(db, claims.sub)).await?;
    Ok(Json(Envelope::ok("friends", FriendsResponse { friends })))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| relationships::remove_friend(db, claims.sub, user_id)).await?;
    Ok(Json(Envelope::ok("friend removed", Empty {})))
}

pub async fn list_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<FriendRequestsResponse>>, ApiError> {
    let (incoming, outgoing) = run(&state, move |db| {
        Ok((
            relationships::list_incoming_requests(db, claims.sub)?,
            relationships::list_outgoing_requests(db, claims.sub)?,
        ))
    })
    .await?;
    Ok(Json(Envelope::ok(
        "friend requests",
        FriendRequestsResponse { incoming, outgoing },
    )))
}

pub async fn send_request(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<(StatusCode, Json<Envelope<Empty>>), ApiError> {
    run(&state, move |db| relationships::send_friend_request(db, claims.sub, user_id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("friend request sent", Empty {})),
    ))
}

/// Withdraws a request the caller sent to `user_id`.
pub async fn cancel_request(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| relationships::cancel_friend_request(db, claims.sub, user_id)).await?;
    Ok(Json(Envelope::ok("friend request cancelled", Empty {})))
}

pub async fn accept_request(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| relationships::accept_friend_request(db, claims.sub, user_id)).await?;
    Ok(Json(Envelope::ok("friend request accepted", Empty {})))
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| relationships::reject_friend_request(db, claims.sub, user_id)).await?;
    Ok(Json(Envelope::ok("friend request rejected", Empty {})))
}
