use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use tracing::info;
use uuid::Uuid;

use gather_core::{accounts, posts};
use gather_types::api::{
    Claims, Empty, Envelope, PostsResponse, ProfileResponse, SearchQuery, UpdateProfileRequest,
    UsersResponse,
};
use gather_types::models::UserSummary;

use crate::auth::{AppState, run};
use crate::error::ApiError;

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<ProfileResponse>>, ApiError> {
    let profile = run(&state, move |db| accounts::get_profile(db, claims.sub, claims.sub)).await?;
    Ok(Json(Envelope::ok("profile", ProfileResponse { profile })))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Envelope<UserSummary>>, ApiError> {
    let user = run(&state, move |db| {
        accounts::update_profile(
            db,
            claims.sub,
            req.display_name.as_deref(),
            req.profile_picture.as_deref(),
        )
    })
    .await?;
    Ok(Json(Envelope::ok("profile updated", user)))
}

pub async fn delete_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| accounts::delete_account(db, claims.sub)).await?;
    info!("{} deleted their account", claims.username);
    Ok(Json(Envelope::ok("account deleted", Empty {})))
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Envelope<UsersResponse>>, ApiError> {
    let users = run(&state, move |db| accounts::search_users(db, &query.q)).await?;
    Ok(Json(Envelope::ok("users", UsersResponse { users })))
}

pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<ProfileResponse>>, ApiError> {
    let profile = run(&state, move |db| accounts::get_profile(db, claims.sub, user_id)).await?;
    Ok(Json(Envelope::ok("profile", ProfileResponse { profile })))
}

pub async fn user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<PostsResponse>>, ApiError> {
    let posts = run(&state, move |db| posts::user_posts(db, claims.sub, user_id)).await?;
    Ok(Json(Envelope::ok("posts", PostsResponse { posts })))
}
