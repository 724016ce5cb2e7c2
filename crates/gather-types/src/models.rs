use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The public face of a user: what other users get to see in lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserSummary,
    pub friend_count: usize,
    pub is_friend: bool,
    /// Only populated for the user themselves and their friends.
    pub friends: Option<Vec<UserSummary>>,
    pub created_at: DateTime<Utc>,
}

/// Where a user stands with respect to a community.
///
/// `Owner` is a privileged form of `Member`; the two pending states are
/// distinct edges (an invite lives on the user, a join request lives on
/// the community) and never coexist with membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    NonMember,
    PendingInvite,
    PendingRequest,
    Member,
    Owner,
}

impl Membership {
    pub fn is_member(self) -> bool {
        matches!(self, Self::Member | Self::Owner)
    }

    pub fn is_owner(self) -> bool {
        self == Self::Owner
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub is_open: bool,
    pub is_hidden: bool,
    pub owner_ids: Vec<Uuid>,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner: UserSummary,
    pub community_id: Option<Uuid>,
    pub body: String,
    pub like_count: usize,
    pub comment_count: usize,
    pub liked_by_viewer: bool,
    pub created_at: DateTime<Utc>,
}

/// A comment on either a post or an outing; `parent_id` is the id of whichever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub author: UserSummary,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outing {
    pub id: Uuid,
    pub community_id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub attendee_count: usize,
    pub interested_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollOption {
    pub id: Uuid,
    pub label: String,
    pub votes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: Uuid,
    pub outing_id: Uuid,
    pub question: String,
    pub created_by: Uuid,
    pub options: Vec<PollOption>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: crate::events::NotificationKind,
    pub actor_id: Uuid,
    pub entity_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
