//! Access-control predicates.
//!
//! These are pure: every fact they need (friendship, membership) is
//! resolved by the caller and handed in, so the rules can be read and
//! tested without a database. Callers turn a `false` into
//! `CoreError::Forbidden` (or `NotFound` where existence itself is private)
//! through [`ensure`].

use gather_db::models::{CommentRow, CommunityRow, OutingRow, PostRow};
use gather_types::models::Membership;
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// What the caller knows about the viewer's relationship to a resource's
/// owner and the community it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Standing {
    pub friends_with_owner: bool,
    pub membership: Membership,
}

impl Standing {
    pub fn stranger() -> Self {
        Self {
            friends_with_owner: false,
            membership: Membership::NonMember,
        }
    }
}

pub fn ensure(allowed: bool, err: CoreError) -> Result<()> {
    if allowed { Ok(()) } else { Err(err) }
}

/// Personal posts are visible to their owner and the owner's friends.
/// Community posts are visible to their owner and the community's members.
pub fn can_view_post(viewer: Uuid, post: &PostRow, standing: &Standing) -> bool {
    if viewer == post.owner_id {
        return true;
    }
    match post.community_id {
        None => standing.friends_with_owner,
        Some(_) => standing.membership.is_member(),
    }
}

/// Liking and commenting follow viewing.
pub fn can_interact_with_post(viewer: Uuid, post: &PostRow, standing: &Standing) -> bool {
    can_view_post(viewer, post, standing)
}

pub fn can_modify_post(actor: Uuid, post: &PostRow) -> bool {
    actor == post.owner_id
}

/// A comment may be removed by whoever wrote it or by whoever owns the
/// thing it was written on.
pub fn can_delete_comment(actor: Uuid, comment: &CommentRow, parent_owner: Uuid) -> bool {
    actor == comment.author_id || actor == parent_owner
}

pub fn can_view_outing(membership: Membership) -> bool {
    membership.is_member()
}

pub fn can_comment_outing(membership: Membership) -> bool {
    membership.is_member()
}

pub fn can_attend_outing(membership: Membership) -> bool {
    membership.is_member()
}

/// Outings are edited by whoever proposed them or by a community owner.
pub fn can_modify_outing(actor: Uuid, outing: &OutingRow, membership: Membership) -> bool {
    actor == outing.owner_id || membership.is_owner()
}

/// Editing, deleting, inviting, accepting requests, managing owners.
pub fn can_manage_community(membership: Membership) -> bool {
    membership.is_owner()
}

/// Hidden communities only exist for people already connected to them.
pub fn can_view_community(community: &CommunityRow, membership: Membership) -> bool {
    !community.is_hidden || membership != Membership::NonMember
}

pub fn can_post_in_community(membership: Membership) -> bool {
    membership.is_member()
}

pub fn can_see_friend_list(viewer: Uuid, user: Uuid, are_friends: bool) -> bool {
    viewer == user || are_friends
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(owner: Uuid, community: Option<Uuid>) -> PostRow {
        PostRow {
            id: Uuid::new_v4(),
            owner_id: owner,
            community_id: community,
            body: "hi".into(),
            created_at: Utc::now(),
        }
    }

    fn standing(friends: bool, membership: Membership) -> Standing {
        Standing {
            friends_with_owner: friends,
            membership,
        }
    }

    #[test]
    fn test_personal_post_visibility() {
        let (owner, viewer) = (Uuid::new_v4(), Uuid::new_v4());
        let p = post(owner, None);

        assert!(can_view_post(owner, &p, &Standing::stranger()));
        assert!(can_view_post(viewer, &p, &standing(true, Membership::NonMember)));
        assert!(!can_view_post(viewer, &p, &Standing::stranger()));
        // Sharing a community does not expose personal posts.
        assert!(!can_view_post(viewer, &p, &standing(false, Membership::Member)));
    }

    #[test]
    fn test_community_post_visibility() {
        let (owner, viewer) = (Uuid::new_v4(), Uuid::new_v4());
        let p = post(owner, Some(Uuid::new_v4()));

        assert!(can_view_post(viewer, &p, &standing(false, Membership::Member)));
        assert!(can_view_post(viewer, &p, &standing(false, Membership::Owner)));
        assert!(!can_view_post(viewer, &p, &standing(false, Membership::PendingRequest)));
        assert!(!can_view_post(viewer, &p, &standing(true, Membership::PendingInvite)));
    }

    #[test]
    fn test_outing_rules_require_membership() {
        for m in [Membership::NonMember, Membership::PendingInvite, Membership::PendingRequest] {
            assert!(!can_view_outing(m));
            assert!(!can_comment_outing(m));
            assert!(!can_attend_outing(m));
        }
        for m in [Membership::Member, Membership::Owner] {
            assert!(can_view_outing(m));
            assert!(can_attend_outing(m));
        }
    }

    #[test]
    fn test_outing_modification() {
        let (proposer, other) = (Uuid::new_v4(), Uuid::new_v4());
        let outing = OutingRow {
            id: Uuid::new_v4(),
            community_id: Uuid::new_v4(),
            owner_id: proposer,
            title: "Picnic".into(),
            description: String::new(),
            location: None,
            starts_at: None,
            created_at: Utc::now(),
        };
        assert!(can_modify_outing(proposer, &outing, Membership::Member));
        assert!(can_modify_outing(other, &outing, Membership::Owner));
        assert!(!can_modify_outing(other, &outing, Membership::Member));
    }

    #[test]
    fn test_comment_deletion() {
        let (author, parent_owner, other) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let comment = CommentRow {
            id: Uuid::new_v4(),
            parent_id: Uuid::new_v4(),
            author_id: author,
            body: "nice".into(),
            created_at: Utc::now(),
        };
        assert!(can_delete_comment(author, &comment, parent_owner));
        assert!(can_delete_comment(parent_owner, &comment, parent_owner));
        assert!(!can_delete_comment(other, &comment, parent_owner));
    }

    #[test]
    fn test_hidden_community_visibility() {
        let mut community = CommunityRow {
            id: Uuid::new_v4(),
            name: "secret".into(),
            description: String::new(),
            is_open: false,
            is_hidden: true,
            created_at: Utc::now(),
        };
        assert!(!can_view_community(&community, Membership::NonMember));
        assert!(can_view_community(&community, Membership::PendingInvite));
        community.is_hidden = false;
        assert!(can_view_community(&community, Membership::NonMember));
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, CoreError::Forbidden("no")).is_ok());
        assert!(matches!(
            ensure(false, CoreError::Forbidden("no")),
            Err(CoreError::Forbidden("no"))
        ));
    }
}
