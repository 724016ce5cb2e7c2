use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{communities, friends, notifications, outings, posts, users};

/// The full API. Everything but register and login sits behind
/// [`require_auth`].
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let protected_routes = Router::new()
        // Users
        .route(
            "/api/users/me",
            get(users::me).patch(users::update_me).delete(users::delete_me),
        )
        .route("/api/users/search", get(users::search))
        .route("/api/users/{user_id}", get(users::profile))
        .route("/api/users/{user_id}/posts", get(users::user_posts))
        // Friends
        .route("/api/friends", get(friends::list_friends))
        .route("/api/friends/{user_id}", delete(friends::remove_friend))
        .route("/api/friends/requests", get(friends::list_requests))
        .route(
            "/api/friends/requests/{user_id}",
            post(friends::send_request).delete(friends::cancel_request),
        )
        .route("/api/friends/requests/{user_id}/accept", post(friends::accept_request))
        .route("/api/friends/requests/{user_id}/reject", post(friends::reject_request))
        // Communities
        .route(
            "/api/communities",
            get(communities::list).post(communities::create),
        )
        .route("/api/communities/mine", get(communities::mine))
        .route("/api/communities/invites", get(communities::invites))
        .route(
            "/api/communities/{community_id}",
            get(communities::get)
                .patch(communities::update)
                .delete(communities::delete),
        )
        .route(
            "/api/communities/{community_id}/join",
            post(communities::join).delete(communities::cancel_join),
        )
        .route("/api/communities/{community_id}/leave", post(communities::leave))
        .route("/api/communities/{community_id}/members", get(communities::members))
        .route(
            "/api/communities/{community_id}/members/{user_id}",
            delete(communities::remove_member),
        )
        .route(
            "/api/communities/{community_id}/requests",
            get(communities::join_requests),
        )
        .route(
            "/api/communities/{community_id}/requests/{user_id}/accept",
            post(communities::accept_join_request),
        )
        .route(
            "/api/communities/{community_id}/requests/{user_id}/reject",
            post(communities::reject_join_request),
        )
        .route(
            "/api/communities/{community_id}/invites/{user_id}",
            post(communities::invite),
        )
        .route(
            "/api/communities/{community_id}/invite/accept",
            post(communities::accept_invite),
        )
        .route(
            "/api/communities/{community_id}/invite/decline",
            post(communities::decline_invite),
        )
        .route(
            "/api/communities/{community_id}/owners/{user_id}",
            post(communities::add_owner),
        )
        .route(
            "/api/communities/{community_id}/step-down",
            post(communities::step_down),
        )
        .route(
            "/api/communities/{community_id}/posts",
            get(posts::community_posts),
        )
        .route(
            "/api/communities/{community_id}/outings",
            get(outings::list).post(outings::create),
        )
        // Posts
        .route("/api/posts", post(posts::create))
        .route("/api/posts/feed", get(posts::feed))
        .route("/api/posts/{post_id}", get(posts::get).delete(posts::delete))
        .route(
            "/api/posts/{post_id}/like",
            post(posts::like).delete(posts::unlike),
        )
        .route(
            "/api/posts/{post_id}/comments",
            get(posts::comments).post(posts::comment),
        )
        .route(
            "/api/comments/{comment_id}",
            delete(posts::delete_comment),
        )
        // Outings
        .route(
            "/api/outings/{outing_id}",
            get(outings::get).patch(outings::update).delete(outings::delete),
        )
        .route(
            "/api/outings/{outing_id}/attend",
            post(outings::attend).delete(outings::unattend),
        )
        .route(
            "/api/outings/{outing_id}/interested",
            post(outings::interested).delete(outings::uninterested),
        )
        .route("/api/outings/{outing_id}/attendees", get(outings::attendees))
        .route(
            "/api/outings/{outing_id}/comments",
            get(outings::comments).post(outings::comment),
        )
        .route(
            "/api/outing-comments/{comment_id}",
            delete(outings::delete_comment),
        )
        .route(
            "/api/outings/{outing_id}/polls",
            get(outings::polls).post(outings::create_poll),
        )
        .route("/api/polls/{poll_id}", get(outings::poll))
        .route("/api/polls/{poll_id}/vote", post(outings::vote))
        // Notifications
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route(
            "/api/notifications/{notification_id}/read",
            post(notifications::mark_read),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
