use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use gather_core::outings::{self, OutingChanges, OutingDetails};
use gather_core::polls;
use gather_types::api::{
    AttendeesResponse, Claims, CommentRequest, CommentResponse, CommentsResponse,
    CreateOutingRequest, CreatePollRequest, Empty, Envelope, OutingResponse, OutingsResponse,
    PollResponse, PollsResponse, UpdateOutingRequest, VoteRequest,
};

use crate::auth::{AppState, run};
use crate::error::ApiError;

pub async fn list(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<OutingsResponse>>, ApiError> {
    let outings = run(&state, move |db| {
        outings::list_outings(db, claims.sub, community_id)
    })
    .await?;
    Ok(Json(Envelope::ok("outings", OutingsResponse { outings })))
}

pub async fn create(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateOutingRequest>,
) -> Result<(StatusCode, Json<Envelope<OutingResponse>>), ApiError> {
    let outing = run(&state, move |db| {
        outings::create_outing(
            db,
            claims.sub,
            community_id,
            &OutingDetails {
                title: &req.title,
                description: &req.description,
                location: req.location.as_deref(),
                starts_at: req.starts_at,
            },
        )
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("outing created", OutingResponse { outing })),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<OutingResponse>>, ApiError> {
    let outing = run(&state, move |db| outings::get_outing(db, claims.sub, outing_id)).await?;
    Ok(Json(Envelope::ok("outing", OutingResponse { outing })))
}

pub async fn update(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateOutingRequest>,
) -> Result<Json<Envelope<OutingResponse>>, ApiError> {
    let outing = run(&state, move |db| {
        outings::update_outing(
            db,
            claims.sub,
            outing_id,
            &OutingChanges {
                title: req.title.as_deref(),
                description: req.description.as_deref(),
                location: req.location.as_deref(),
                starts_at: req.starts_at,
            },
        )
    })
    .await?;
    Ok(Json(Envelope::ok("outing updated", OutingResponse { outing })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| outings::delete_outing(db, claims.sub, outing_id)).await?;
    Ok(Json(Envelope::ok("outing deleted", Empty {})))
}

pub async fn attendees(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<AttendeesResponse>>, ApiError> {
    let (attending, interested) = run(&state, move |db| {
        outings::list_rsvps(db, claims.sub, outing_id)
    })
    .await?;
    Ok(Json(Envelope::ok(
        "attendees",
        AttendeesResponse {
            attending,
            interested,
        },
    )))
}

pub async fn attend(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| outings::attend(db, claims.sub, outing_id)).await?;
    Ok(Json(Envelope::ok("attending", Empty {})))
}

pub async fn unattend(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| outings::unattend(db, claims.sub, outing_id)).await?;
    Ok(Json(Envelope::ok("no longer attending", Empty {})))
}

pub async fn interested(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| outings::mark_interested(db, claims.sub, outing_id)).await?;
    Ok(Json(Envelope::ok("marked interested", Empty {})))
}

pub async fn uninterested(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| outings::unmark_interested(db, claims.sub, outing_id)).await?;
    Ok(Json(Envelope::ok("no longer interested", Empty {})))
}

pub async fn comments(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<CommentsResponse>>, ApiError> {
    let comments = run(&state, move |db| {
        outings::list_outing_comments(db, claims.sub, outing_id)
    })
    .await?;
    Ok(Json(Envelope::ok("comments", CommentsResponse { comments })))
}

pub async fn comment(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Envelope<CommentResponse>>), ApiError> {
    let comment = run(&state, move |db| {
        outings::comment_outing(db, claims.sub, outing_id, &req.body)
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
    run(&state, move |db| {
        outings::delete_outing_comment(db, claims.sub, comment_id)
    })
    .await?;
    Ok(Json(Envelope::ok("comment deleted", Empty {})))
}

// -- Polls --

pub async fn polls(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<PollsResponse>>, ApiError> {
    let polls = run(&state, move |db| polls::list_polls(db, claims.sub, outing_id)).await?;
    Ok(Json(Envelope::ok("polls", PollsResponse { polls })))
}

pub async fn create_poll(
    State(state): State<AppState>,
    Path(outing_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<Envelope<PollResponse>>), ApiError> {
    let poll = run(&state, move |db| {
        polls::create_poll(db, claims.sub, outing_id, &req.question, &req.options)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("poll created", PollResponse { poll })),
    ))
}

pub async fn poll(
    State(state): State<AppState>,
    Path(poll_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<PollResponse>>, ApiError> {
    let poll = run(&state, move |db| polls::poll_results(db, claims.sub, poll_id)).await?;
    Ok(Json(Envelope::ok("poll", PollResponse { poll })))
}

pub async fn vote(
    State(state): State<AppState>,
    Path(poll_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Envelope<PollResponse>>, ApiError> {
    let poll = run(&state, move |db| {
        polls::vote(db, claims.sub, poll_id, req.option_id)
    })
    .await?;
    Ok(Json(Envelope::ok("vote recorded", PollResponse { poll })))
}
