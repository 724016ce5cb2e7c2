use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relationship and membership transitions worth telling someone about.
///
/// Notifications are informational only: the edges in the database are the
/// source of truth, and losing a notification never changes who is friends
/// with whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// `entity_id` is the sender.
    FriendRequest,
    /// `entity_id` is the user who accepted.
    FriendAccept,
    /// `entity_id` is the community.
    CommunityInvite,
    CommunityJoinRequest,
    CommunityJoinAccept,
    CommunityInviteAccept,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 6] = [
        Self::FriendRequest,
        Self::FriendAccept,
        Self::CommunityInvite,
        Self::CommunityJoinRequest,
        Self::CommunityJoinAccept,
        Self::CommunityInviteAccept,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FriendRequest => "friend_request",
            Self::FriendAccept => "friend_accept",
            Self::CommunityInvite => "community_invite",
            Self::CommunityJoinRequest => "community_join_request",
            Self::CommunityJoinAccept => "community_join_accept",
            Self::CommunityInviteAccept => "community_invite_accept",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNotificationKind(pub String);

impl fmt::Display for UnknownNotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown notification kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownNotificationKind {}

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownNotificationKind(s.to_string()))
    }
}
