//! Community rosters and the (user, community) membership state machine:
//! `NonMember -> PendingInvite | PendingRequest -> Member`, with `Owner` a
//! privileged member.
//!
//! Owners are always members: creation enrolls the creator in both
//! rosters, only members can be promoted, and stepping down keeps the
//! membership. An owner cannot leave, and the last owner cannot step down,
//! so every community keeps at least one owner for as long as it exists.

use gather_db::Database;
use gather_db::models::CommunityRow;
use gather_db::queries::communities::{self as q, Roster};
use gather_types::events::NotificationKind;
use gather_types::models::{Community, Membership, UserSummary};
use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use crate::access::{self, ensure};
use crate::accounts::require_user;
use crate::error::{CoreError, Result};
use crate::notifications::notify;
use crate::{validate, views};

pub struct NewCommunity<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub is_open: bool,
    pub is_hidden: bool,
}

#[derive(Debug, Default)]
pub struct CommunityChanges<'a> {
    pub description: Option<&'a str>,
    pub is_open: Option<bool>,
    pub is_hidden: Option<bool>,
}

/// Resolves where `user` stands. Membership takes precedence over any
/// pending edge; the repair pass removes pending edges that coexist with it.
pub(crate) fn membership_of(conn: &Connection, user: Uuid, community: Uuid) -> Result<Membership> {
    if q::on_roster(conn, Roster::Owners, community, user)? {
        return Ok(Membership::Owner);
    }
    if q::on_roster(conn, Roster::Members, community, user)? {
        return Ok(Membership::Member);
    }
    if q::on_roster(conn, Roster::Requests, community, user)? {
        return Ok(Membership::PendingRequest);
    }
    if q::has_invite(conn, user, community)? {
        return Ok(Membership::PendingInvite);
    }
    Ok(Membership::NonMember)
}

/// Loads a community `user` is allowed to know about. Hidden communities
/// are reported as missing to outsiders.
pub(crate) fn visible_community(
    conn: &Connection,
    user: Uuid,
    community: Uuid,
) -> Result<(CommunityRow, Membership)> {
    let row = q::community_by_id(conn, community)?.ok_or(CoreError::NotFound("community"))?;
    let membership = membership_of(conn, user, community)?;
    ensure(
        access::can_view_community(&row, membership),
        CoreError::NotFound("community"),
    )?;
    Ok((row, membership))
}

fn require_owner(conn: &Connection, user: Uuid, community: Uuid) -> Result<Membership> {
    let (_, membership) = visible_community(conn, user, community)?;
    ensure(
        access::can_manage_community(membership),
        CoreError::Forbidden("only community owners can do that"),
    )?;
    Ok(membership)
}

fn enroll(conn: &Connection, user: Uuid, community: Uuid) -> Result<()> {
    q::remove_from_roster(conn, Roster::Requests, community, user)?;
    q::delete_invite(conn, user, community)?;
    q::add_to_roster(conn, Roster::Members, community, user)?;
    Ok(())
}

fn notify_owners(
    conn: &Connection,
    community: Uuid,
    actor: Uuid,
    kind: NotificationKind,
) -> Result<()> {
    for owner in q::roster_ids(conn, Roster::Owners, community)? {
        notify(conn, owner, actor, kind, community)?;
    }
    Ok(())
}

pub fn create_community(db: &Database, creator: Uuid, new: &NewCommunity<'_>) -> Result<Community> {
    let name = validate::text("name", new.name, 1, 64)?;
    let description = validate::text("description", new.description, 0, 2000)?;
    let id = Uuid::new_v4();

    let community = db.transaction(|tx| {
        require_user(tx, creator)?;
        if q::name_taken(tx, name)? {
            return Err(CoreError::NameTaken);
        }
        q::insert_community(tx, id, name, description, new.is_open, new.is_hidden)?;
        q::add_to_roster(tx, Roster::Owners, id, creator)?;
        q::add_to_roster(tx, Roster::Members, id, creator)?;
        let row = q::community_by_id(tx, id)?.ok_or(CoreError::NotFound("community"))?;
        views::community(tx, row)
    })?;
    debug!("{} created community {} ({})", creator, community.name, id);
    Ok(community)
}

pub fn get_community(db: &Database, viewer: Uuid, community: Uuid) -> Result<(Community, Membership)> {
    db.with_conn(|conn| {
        let (row, membership) = visible_community(conn, viewer, community)?;
        Ok((views::community(conn, row)?, membership))
    })
}

pub fn membership(db: &Database, user: Uuid, community: Uuid) -> Result<Membership> {
    db.with_conn(|conn| {
        let (_, membership) = visible_community(conn, user, community)?;
        Ok(membership)
    })
}

/// Every community `viewer` may discover.
pub fn list_communities(db: &Database, viewer: Uuid) -> Result<Vec<Community>> {
    db.with_conn(|conn| {
        let rows = q::discoverable(conn, viewer)?;
        views::communities(conn, rows)
    })
}

pub fn my_communities(db: &Database, user: Uuid) -> Result<Vec<Community>> {
    db.with_conn(|conn| {
        let rows = q::communities_of(conn, user)?;
        views::communities(conn, rows)
    })
}

/// Communities `user` has been invited into and not yet answered.
pub fn list_invites(db: &Database, user: Uuid) -> Result<Vec<Community>> {
    db.with_conn(|conn| {
        let rows = q::invites_for(conn, user)?;
        views::communities(conn, rows)
    })
}

/// Open communities admit immediately; closed ones record a request for
/// the owners. A pending invite counts as the community's consent, so
/// joining with one admits directly.
pub fn join_community(db: &Database, user: Uuid, community: Uuid) -> Result<Membership> {
    let state = db.transaction(|tx| {
        require_user(tx, user)?;
        let (row, membership) = visible_community(tx, user, community)?;
        match membership {
            Membership::Member | Membership::Owner => Err(CoreError::AlreadyMember),
            Membership::PendingRequest => Err(CoreError::DuplicateRequest),
            Membership::PendingInvite => {
                let inviter = q::inviter_of(tx, user, community)?;
                enroll(tx, user, community)?;
                if let Some(inviter) = inviter {
                    notify(tx, inviter, user, NotificationKind::CommunityInviteAccept, community)?;
                }
                Ok(Membership::Member)
            }
            Membership::NonMember if row.is_open => {
                enroll(tx, user, community)?;
                Ok(Membership::Member)
            }
            Membership::NonMember => {
                q::add_to_roster(tx, Roster::Requests, community, user)?;
                notify_owners(tx, community, user, NotificationKind::CommunityJoinRequest)?;
                Ok(Membership::PendingRequest)
            }
        }
    })?;
    debug!("{} joined community {}: {:?}", user, community, state);
    Ok(state)
}

/// An owner invites someone in. If that person has already asked to join,
/// the two intents meet and they become a member straight away.
pub fn invite_user(db: &Database, owner: Uuid, community: Uuid, invitee: Uuid) -> Result<Membership> {
    if owner == invitee {
        return Err(CoreError::SelfReferenceNotAllowed);
    }
    let state = db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        require_user(tx, invitee)?;
        match membership_of(tx, invitee, community)? {
            Membership::Member | Membership::Owner => Err(CoreError::AlreadyMember),
            Membership::PendingInvite => Err(CoreError::DuplicateInvite),
            Membership::PendingRequest => {
                enroll(tx, invitee, community)?;
                notify(tx, invitee, owner, NotificationKind::CommunityJoinAccept, community)?;
                Ok(Membership::Member)
            }
            Membership::NonMember => {
                q::insert_invite(tx, invitee, community, owner)?;
                notify(tx, invitee, owner, NotificationKind::CommunityInvite, community)?;
                Ok(Membership::PendingInvite)
            }
        }
    })?;
    debug!("{} invited {} to {}: {:?}", owner, invitee, community, state);
    Ok(state)
}

pub fn accept_invite(db: &Database, user: Uuid, community: Uuid) -> Result<()> {
    db.transaction(|tx| {
        let inviter = q::inviter_of(tx, user, community)?.ok_or(CoreError::NoSuchInvite)?;
        enroll(tx, user, community)?;
        notify(tx, inviter, user, NotificationKind::CommunityInviteAccept, community)?;
        Ok::<_, CoreError>(())
    })?;
    debug!("{} accepted invite to {}", user, community);
    Ok(())
}

pub fn decline_invite(db: &Database, user: Uuid, community: Uuid) -> Result<()> {
    let removed = db.with_conn(|conn| q::delete_invite(conn, user, community).map_err(CoreError::from))?;
    if removed == 0 {
        return Err(CoreError::NoSuchInvite);
    }
    debug!("{} declined invite to {}", user, community);
    Ok(())
}

pub fn accept_join_request(db: &Database, owner: Uuid, community: Uuid, user: Uuid) -> Result<()> {
    db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        if !q::on_roster(tx, Roster::Requests, community, user)? {
            return Err(CoreError::NoSuchRequest);
        }
        enroll(tx, user, community)?;
        notify(tx, user, owner, NotificationKind::CommunityJoinAccept, community)?;
        Ok(())
    })?;
    debug!("{} admitted {} to {}", owner, user, community);
    Ok(())
}

pub fn reject_join_request(db: &Database, owner: Uuid, community: Uuid, user: Uuid) -> Result<()> {
    db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        if q::remove_from_roster(tx, Roster::Requests, community, user)? == 0 {
            return Err(CoreError::NoSuchRequest);
        }
        Ok(())
    })?;
    debug!("{} turned down {}'s request to join {}", owner, user, community);
    Ok(())
}

pub fn cancel_join_request(db: &Database, user: Uuid, community: Uuid) -> Result<()> {
    let removed = db.with_conn(|conn| {
        q::remove_from_roster(conn, Roster::Requests, community, user).map_err(CoreError::from)
    })?;
    if removed == 0 {
        return Err(CoreError::NoSuchRequest);
    }
    debug!("{} cancelled join request to {}", user, community);
    Ok(())
}

/// Pending requests, oldest first. Owners only.
pub fn list_join_requests(db: &Database, owner: Uuid, community: Uuid) -> Result<Vec<UserSummary>> {
    db.with_conn(|conn| {
        require_owner(conn, owner, community)?;
        let rows = q::roster(conn, Roster::Requests, community)?;
        Ok(views::user_summaries(&rows))
    })
}

/// `(owners, members)`; members includes owners.
pub fn list_members(
    db: &Database,
    viewer: Uuid,
    community: Uuid,
) -> Result<(Vec<UserSummary>, Vec<UserSummary>)> {
    db.with_conn(|conn| {
        visible_community(conn, viewer, community)?;
        let owners = q::roster(conn, Roster::Owners, community)?;
        let members = q::roster(conn, Roster::Members, community)?;
        Ok((views::user_summaries(&owners), views::user_summaries(&members)))
    })
}

pub fn leave_community(db: &Database, user: Uuid, community: Uuid) -> Result<()> {
    db.transaction(|tx| {
        let (_, membership) = visible_community(tx, user, community)?;
        match membership {
            Membership::Owner => Err(CoreError::OwnerCannotLeave),
            Membership::Member => {
                q::remove_from_roster(tx, Roster::Members, community, user)?;
                q::clear_outing_rsvps(tx, community, user)?;
                Ok(())
            }
            _ => Err(CoreError::NotMember),
        }
    })?;
    debug!("{} left community {}", user, community);
    Ok(())
}

/// Owners remove a (non-owner) member.
pub fn remove_member(db: &Database, owner: Uuid, community: Uuid, member: Uuid) -> Result<()> {
    if owner == member {
        return Err(CoreError::SelfReferenceNotAllowed);
    }
    db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        match membership_of(tx, member, community)? {
            Membership::Owner => Err(CoreError::Forbidden("owners cannot be removed")),
            Membership::Member => {
                q::remove_from_roster(tx, Roster::Members, community, member)?;
                q::clear_outing_rsvps(tx, community, member)?;
                Ok(())
            }
            _ => Err(CoreError::NotMember),
        }
    })?;
    debug!("{} removed {} from {}", owner, member, community);
    Ok(())
}

pub fn add_owner(db: &Database, owner: Uuid, community: Uuid, member: Uuid) -> Result<()> {
    db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        match membership_of(tx, member, community)? {
            Membership::Owner => Err(CoreError::Conflict("already an owner")),
            Membership::Member => {
                q::add_to_roster(tx, Roster::Owners, community, member)?;
                Ok(())
            }
            _ => Err(CoreError::NotMember),
        }
    })?;
    debug!("{} made {} an owner of {}", owner, member, community);
    Ok(())
}

/// Gives up ownership but stays a member.
pub fn step_down(db: &Database, owner: Uuid, community: Uuid) -> Result<()> {
    db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        if q::roster_count(tx, Roster::Owners, community)? <= 1 {
            return Err(CoreError::LastOwner);
        }
        q::remove_from_roster(tx, Roster::Owners, community, owner)?;
        Ok(())
    })?;
    debug!("{} stepped down as owner of {}", owner, community);
    Ok(())
}

pub fn update_community(
    db: &Database,
    owner: Uuid,
    community: Uuid,
    changes: &CommunityChanges<'_>,
) -> Result<Community> {
    let description = changes
        .description
        .map(|d| validate::text("description", d, 0, 2000))
        .transpose()?;
    db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        q::update_community(tx, community, description, changes.is_open, changes.is_hidden)?;
        let row = q::community_by_id(tx, community)?.ok_or(CoreError::NotFound("community"))?;
        views::community(tx, row)
    })
}

/// Deletes the community together with its rosters, pending edges,
/// outings (and their RSVPs, comments and polls) and community posts.
pub fn delete_community(db: &Database, owner: Uuid, community: Uuid) -> Result<()> {
    db.transaction(|tx| {
        require_owner(tx, owner, community)?;
        q::delete_community(tx, community)?;
        Ok::<_, CoreError>(())
    })?;
    debug!("{} deleted community {}", owner, community);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications;
    use crate::test_support::{db, user};

    fn community(db: &Database, owner: Uuid, name: &str, is_open: bool, is_hidden: bool) -> Uuid {
        create_community(
            db,
            owner,
            &NewCommunity {
                name,
                description: "",
                is_open,
                is_hidden,
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn test_creator_is_owner_and_member() {
        let db = db();
        let o = user(&db, "olga");
        let c = community(&db, o, "hikers", true, false);

        let (view, state) = get_community(&db, o, c).unwrap();
        assert_eq!(state, Membership::Owner);
        assert_eq!(view.owner_ids, vec![o]);
        assert_eq!(view.member_count, 1);
    }

    #[test]
    fn test_name_taken() {
        let db = db();
        let o = user(&db, "olga");
        community(&db, o, "Hikers", true, false);
        let again = create_community(
            &db,
            o,
            &NewCommunity {
                name: " hikers ",
                description: "",
                is_open: true,
                is_hidden: false,
            },
        );
        assert!(matches!(again, Err(CoreError::NameTaken)));
    }

    #[test]
    fn test_open_join_is_immediate() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", true, false);

        assert_eq!(join_community(&db, u, c).unwrap(), Membership::Member);
        assert_eq!(membership(&db, u, c).unwrap(), Membership::Member);
        assert!(matches!(join_community(&db, u, c), Err(CoreError::AlreadyMember)));
        assert_eq!(my_communities(&db, u).unwrap()[0].id, c);
    }

    #[test]
    fn test_closed_join_waits_for_owner() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", false, false);

        assert_eq!(join_community(&db, u, c).unwrap(), Membership::PendingRequest);
        assert!(matches!(join_community(&db, u, c), Err(CoreError::DuplicateRequest)));
        assert_eq!(list_join_requests(&db, o, c).unwrap()[0].id, u);
        assert!(matches!(
            list_join_requests(&db, u, c),
            Err(CoreError::Forbidden(_))
        ));

        let inbox = notifications::list(&db, o, true).unwrap();
        assert_eq!(inbox[0].kind, NotificationKind::CommunityJoinRequest);

        accept_join_request(&db, o, c, u).unwrap();
        assert_eq!(membership(&db, u, c).unwrap(), Membership::Member);
        assert!(list_join_requests(&db, o, c).unwrap().is_empty());
        assert!(matches!(accept_join_request(&db, o, c, u), Err(CoreError::NoSuchRequest)));
    }

    #[test]
    fn test_reject_and_cancel_join_request() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", false, false);

        join_community(&db, u, c).unwrap();
        reject_join_request(&db, o, c, u).unwrap();
        assert_eq!(membership(&db, u, c).unwrap(), Membership::NonMember);

        join_community(&db, u, c).unwrap();
        cancel_join_request(&db, u, c).unwrap();
        assert!(matches!(cancel_join_request(&db, u, c), Err(CoreError::NoSuchRequest)));
    }

    #[test]
    fn test_invite_flow() {
        let db = db();
        let (o, u, m) = (user(&db, "olga"), user(&db, "uma"), user(&db, "max"));
        let c = community(&db, o, "hikers", false, false);
        join_community(&db, m, c).unwrap();
        accept_join_request(&db, o, c, m).unwrap();

        assert!(matches!(invite_user(&db, m, c, u), Err(CoreError::Forbidden(_))));
        assert!(matches!(invite_user(&db, o, c, o), Err(CoreError::SelfReferenceNotAllowed)));
        assert!(matches!(invite_user(&db, o, c, m), Err(CoreError::AlreadyMember)));

        assert_eq!(invite_user(&db, o, c, u).unwrap(), Membership::PendingInvite);
        assert!(matches!(invite_user(&db, o, c, u), Err(CoreError::DuplicateInvite)));
        assert_eq!(list_invites(&db, u).unwrap()[0].id, c);

        accept_invite(&db, u, c).unwrap();
        assert_eq!(membership(&db, u, c).unwrap(), Membership::Member);
        assert!(list_invites(&db, u).unwrap().is_empty());
        assert!(matches!(accept_invite(&db, u, c), Err(CoreError::NoSuchInvite)));

        let inbox = notifications::list(&db, o, false).unwrap();
        assert!(inbox.iter().any(|n| n.kind == NotificationKind::CommunityInviteAccept));
    }

    #[test]
    fn test_decline_invite() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", false, false);

        invite_user(&db, o, c, u).unwrap();
        decline_invite(&db, u, c).unwrap();
        assert_eq!(membership(&db, u, c).unwrap(), Membership::NonMember);
        assert!(matches!(decline_invite(&db, u, c), Err(CoreError::NoSuchInvite)));
    }

    #[test]
    fn test_crossing_intents_admit() {
        let db = db();
        let (o, u, v) = (user(&db, "olga"), user(&db, "uma"), user(&db, "vic"));
        let c = community(&db, o, "hikers", false, false);

        // Request, then invite.
        join_community(&db, u, c).unwrap();
        assert_eq!(invite_user(&db, o, c, u).unwrap(), Membership::Member);
        assert!(list_join_requests(&db, o, c).unwrap().is_empty());

        // Invite, then join.
        invite_user(&db, o, c, v).unwrap();
        assert_eq!(join_community(&db, v, c).unwrap(), Membership::Member);
        assert!(list_invites(&db, v).unwrap().is_empty());
    }

    #[test]
    fn test_hidden_community_is_invisible_to_outsiders() {
        let db = db();
        let (o, u, s) = (user(&db, "olga"), user(&db, "uma"), user(&db, "sam"));
        let c = community(&db, o, "secret", false, true);

        assert!(matches!(get_community(&db, s, c), Err(CoreError::NotFound("community"))));
        assert!(matches!(join_community(&db, s, c), Err(CoreError::NotFound("community"))));
        assert!(list_communities(&db, s).unwrap().is_empty());

        invite_user(&db, o, c, u).unwrap();
        let (_, state) = get_community(&db, u, c).unwrap();
        assert_eq!(state, Membership::PendingInvite);
    }

    #[test]
    fn test_leave() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", true, false);

        assert!(matches!(leave_community(&db, o, c), Err(CoreError::OwnerCannotLeave)));
        assert!(matches!(leave_community(&db, u, c), Err(CoreError::NotMember)));
        join_community(&db, u, c).unwrap();
        leave_community(&db, u, c).unwrap();
        assert_eq!(membership(&db, u, c).unwrap(), Membership::NonMember);
        assert!(my_communities(&db, u).unwrap().is_empty());
    }

    #[test]
    fn test_ownership_changes() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", true, false);

        assert!(matches!(step_down(&db, o, c), Err(CoreError::LastOwner)));
        assert!(matches!(add_owner(&db, o, c, u), Err(CoreError::NotMember)));

        join_community(&db, u, c).unwrap();
        add_owner(&db, o, c, u).unwrap();
        assert!(matches!(add_owner(&db, o, c, u), Err(CoreError::Conflict(_))));
        assert!(matches!(remove_member(&db, o, c, u), Err(CoreError::Forbidden(_))));

        step_down(&db, o, c).unwrap();
        assert_eq!(membership(&db, o, c).unwrap(), Membership::Member);
        leave_community(&db, o, c).unwrap();
        let (view, _) = get_community(&db, u, c).unwrap();
        assert_eq!(view.owner_ids, vec![u]);
    }

    #[test]
    fn test_remove_member() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", true, false);

        assert!(matches!(remove_member(&db, o, c, u), Err(CoreError::NotMember)));
        join_community(&db, u, c).unwrap();
        assert!(matches!(remove_member(&db, u, c, o), Err(CoreError::Forbidden(_))));
        remove_member(&db, o, c, u).unwrap();
        assert_eq!(membership(&db, u, c).unwrap(), Membership::NonMember);
    }

    #[test]
    fn test_update_and_delete() {
        let db = db();
        let (o, u) = (user(&db, "olga"), user(&db, "uma"));
        let c = community(&db, o, "hikers", true, false);
        join_community(&db, u, c).unwrap();

        let changes = CommunityChanges {
            description: Some("Weekend walks"),
            is_open: Some(false),
            ..Default::default()
        };
        assert!(matches!(update_community(&db, u, c, &changes), Err(CoreError::Forbidden(_))));
        let updated = update_community(&db, o, c, &changes).unwrap();
        assert_eq!(updated.description, "Weekend walks");
        assert!(!updated.is_open);
        assert!(!updated.is_hidden);

        assert!(matches!(delete_community(&db, u, c), Err(CoreError::Forbidden(_))));
        delete_community(&db, o, c).unwrap();
        assert!(matches!(get_community(&db, o, c), Err(CoreError::NotFound("community"))));
        assert!(my_communities(&db, u).unwrap().is_empty());
    }
}
