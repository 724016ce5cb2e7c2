use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use uuid::Uuid;

use gather_core::posts;
use gather_types::api::{
    Claims, CommentRequest, CommentResponse, CommentsResponse, CreatePostRequest, Empty, Envelope,
    PostResponse, PostsResponse,
};

use crate::auth::{AppState, run};
use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct LikesResponse {
    pub like_count: usize,
}

pub async fn feed(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<PostsResponse>>, ApiError> {
    let posts = run(&state, move |db| posts::feed(db, claims.sub)).await?;
    Ok(Json(Envelope::ok("feed", PostsResponse { posts })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Envelope<PostResponse>>), ApiError> {
    let post = run(&state, move |db| {
        posts::create_post(db, claims.sub, &req.body, req.community_id)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("post created", PostResponse { post })),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<PostResponse>>, ApiError> {
    let post = run(&state, move |db| posts::get_post(db, claims.sub, post_id)).await?;
    Ok(Json(Envelope::ok("post", PostResponse { post })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| posts::delete_post(db, claims.sub, post_id)).await?;
    Ok(Json(Envelope::ok("post deleted", Empty {})))
}

pub async fn community_posts(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<PostsResponse>>, ApiError> {
    let posts = run(&state, move |db| {
        posts::community_posts(db, claims.sub, community_id)
    })
    .await?;
    Ok(Json(Envelope::ok("posts", PostsResponse { posts })))
}

pub async fn like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<LikesResponse>>, ApiError> {
    let like_count = run(&state, move |db| posts::like_post(db, claims.sub, post_id)).await?;
    Ok(Json(Envelope::ok("post liked", LikesResponse { like_count })))
}

pub async fn unlike(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<LikesResponse>>, ApiError> {
    let like_count = run(&state, move |db| posts::unlike_post(db, claims.sub, post_id)).await?;
    Ok(Json(Envelope::ok("like removed", LikesResponse { like_count })))
}

pub async fn comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<CommentsResponse>>, ApiError> {
    let comments = run(&state, move |db| posts::list_comments(db, claims.sub, post_id)).await?;
    Ok(Json(Envelope::ok("comments", CommentsResponse { comments })))
}

pub async fn comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Envelope<CommentResponse>>), ApiError> {
    let comment = run(&state, move |db| {
        posts::comment_post(db, claims.sub, post_id, &req.body)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("comment added", CommentResponse { comment })),
    ))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| posts::delete_comment(db, claims.sub, comment_id)).await?;
    Ok(Json(Envelope::ok("comment deleted", Empty {})))
}
