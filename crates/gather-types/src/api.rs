use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, Community, Membership, Notification, Outing, Poll, Post, Profile, UserSummary};

// -- JWT Claims --

/// JWT claims issued at login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Envelope --

/// Every response body is `{ "success": .., "msg": .., ...data }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub msg: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(msg: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            msg: msg.into(),
            data,
        }
    }
}

/// Payload for responses that carry nothing beyond the message.
#[derive(Debug, Serialize)]
pub struct Empty {}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub country_code: String,
    pub phone_number: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

// -- Friends --

#[derive(Debug, Serialize)]
pub struct FriendsResponse {
    pub friends: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct FriendRequestsResponse {
    pub incoming: Vec<UserSummary>,
    pub outgoing: Vec<UserSummary>,
}

// -- Communities --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommunityRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_open: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommunityRequest {
    pub description: Option<String>,
    pub is_open: Option<bool>,
    pub is_hidden: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct CommunityResponse {
    pub community: Community,
    pub membership: Membership,
}

#[derive(Debug, Serialize)]
pub struct CommunitiesResponse {
    pub communities: Vec<Community>,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub membership: Membership,
}

#[derive(Debug, Serialize)]
pub struct MembersResponse {
    pub owners: Vec<UserSummary>,
    pub members: Vec<UserSummary>,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub body: String,
    pub community_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

// -- Outings --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOutingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOutingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct OutingResponse {
    pub outing: Outing,
}

#[derive(Debug, Serialize)]
pub struct OutingsResponse {
    pub outings: Vec<Outing>,
}

#[derive(Debug, Serialize)]
pub struct AttendeesResponse {
    pub attending: Vec<UserSummary>,
    pub interested: Vec<UserSummary>,
}

// -- Polls --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub option_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub poll: Poll,
}

#[derive(Debug, Serialize)]
pub struct PollsResponse {
    pub polls: Vec<Poll>,
}

// -- Notifications --

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}
