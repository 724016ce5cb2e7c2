use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;
use uuid::Uuid;

use gather_core::membership::{self, CommunityChanges, NewCommunity};
use gather_types::api::{
    Claims, CommunitiesResponse, CommunityResponse, CreateCommunityRequest, Empty, Envelope,
    MembersResponse, MembershipResponse, UpdateCommunityRequest, UsersResponse,
};
use gather_types::models::Membership;

use crate::auth::{AppState, run};
use crate::error::ApiError;

fn membership_msg(state: Membership) -> &'static str {
    match state {
        Membership::PendingRequest => "join request sent",
        Membership::PendingInvite => "invite sent",
        _ => "joined community",
    }
}

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<CommunitiesResponse>>, ApiError> {
    let communities = run(&state, move |db| membership::list_communities(db, claims.sub)).await?;
    Ok(Json(Envelope::ok("communities", CommunitiesResponse { communities })))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<CommunitiesResponse>>, ApiError> {
    let communities = run(&state, move |db| membership::my_communities(db, claims.sub)).await?;
    Ok(Json(Envelope::ok("communities", CommunitiesResponse { communities })))
}

pub async fn invites(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<CommunitiesResponse>>, ApiError> {
    let communities = run(&state, move |db| membership::list_invites(db, claims.sub)).await?;
    Ok(Json(Envelope::ok("invites", CommunitiesResponse { communities })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<Envelope<CommunityResponse>>), ApiError> {
    let community = run(&state, move |db| {
        membership::create_community(
            db,
            claims.sub,
            &NewCommunity {
                name: &req.name,
                description: &req.description,
                is_open: req.is_open,
                is_hidden: req.is_hidden,
            },
        )
    })
    .await?;
    info!("{} created community {}", claims.username, community.name);
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(
            "community created",
            CommunityResponse {
                community,
                membership: Membership::Owner,
            },
        )),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<CommunityResponse>>, ApiError> {
    let (community, membership) = run(&state, move |db| {
        membership::get_community(db, claims.sub, community_id)
    })
    .await?;
    Ok(Json(Envelope::ok(
        "community",
        CommunityResponse {
            community,
            membership,
        },
    )))
}

pub async fn update(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommunityRequest>,
) -> Result<Json<Envelope<CommunityResponse>>, ApiError> {
    let community = run(&state, move |db| {
        membership::update_community(
            db,
            claims.sub,
            community_id,
            &CommunityChanges {
                description: req.description.as_deref(),
                is_open: req.is_open,
                is_hidden: req.is_hidden,
            },
        )
    })
    .await?;
    Ok(Json(Envelope::ok(
        "community updated",
        CommunityResponse {
            community,
            membership: Membership::Owner,
        },
    )))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| membership::delete_community(db, claims.sub, community_id)).await?;
    info!("{} deleted community {}", claims.username, community_id);
    Ok(Json(Envelope::ok("community deleted", Empty {})))
}

pub async fn join(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<MembershipResponse>>, ApiError> {
    let membership = run(&state, move |db| {
        membership::join_community(db, claims.sub, community_id)
    })
    .await?;
    Ok(Json(Envelope::ok(
        membership_msg(membership),
        MembershipResponse { membership },
    )))
}

/// Withdraws the caller's pending join request.
pub async fn cancel_join(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| {
        membership::cancel_join_request(db, claims.sub, community_id)
    })
    .await?;
    Ok(Json(Envelope::ok("join request cancelled", Empty {})))
}

pub async fn leave(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| membership::leave_community(db, claims.sub, community_id)).await?;
    Ok(Json(Envelope::ok("left community", Empty {})))
}

pub async fn members(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<MembersResponse>>, ApiError> {
    let (owners, members) = run(&state, move |db| {
        membership::list_members(db, claims.sub, community_id)
    })
    .await?;
    Ok(Json(Envelope::ok("members", MembersResponse { owners, members })))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| {
        membership::remove_member(db, claims.sub, community_id, user_id)
    })
    .await?;
    Ok(Json(Envelope::ok("member removed", Empty {})))
}

pub async fn join_requests(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<UsersResponse>>, ApiError> {
    let users = run(&state, move |db| {
        membership::list_join_requests(db, claims.sub, community_id)
    })
    .await?;
    Ok(Json(Envelope::ok("join requests", UsersResponse { users })))
}

pub async fn accept_join_request(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| {
        membership::accept_join_request(db, claims.sub, community_id, user_id)
    })
    .await?;
    Ok(Json(Envelope::ok("join request accepted", Empty {})))
}

pub async fn reject_join_request(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| {
        membership::reject_join_request(db, claims.sub, community_id, user_id)
    })
    .await?;
    Ok(Json(Envelope::ok("join request rejected", Empty {})))
}

pub async fn invite(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<MembershipResponse>>, ApiError> {
    let membership = run(&state, move |db| {
        membership::invite_user(db, claims.sub, community_id, user_id)
    })
    .await?;
    Ok(Json(Envelope::ok(
        membership_msg(membership),
        MembershipResponse { membership },
    )))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| membership::accept_invite(db, claims.sub, community_id)).await?;
    Ok(Json(Envelope::ok("invite accepted", Empty {})))
}

pub async fn decline_invite(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| membership::decline_invite(db, claims.sub, community_id)).await?;
    Ok(Json(Envelope::ok("invite declined", Empty {})))
}

pub async fn add_owner(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| {
        membership::add_owner(db, claims.sub, community_id, user_id)
    })
    .await?;
    Ok(Json(Envelope::ok("owner added", Empty {})))
}

pub async fn step_down(
    State(state): State<AppState>,
    Path(community_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Envelope<Empty>>, ApiError> {
    run(&state, move |db| membership::step_down(db, claims.sub, community_id)).await?;
    Ok(Json(Envelope::ok("stepped down as owner", Empty {})))
}
