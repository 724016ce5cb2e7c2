//! Outings: meetups proposed inside a community. Everything about an
//! outing (seeing it, RSVPing, commenting, voting on its polls) is gated on
//! membership of the community that owns it.

use chrono::{DateTime, Utc};
use gather_db::Database;
use gather_db::models::OutingRow;
use gather_db::queries::outings::{self as q, NewOuting, Rsvp};
use gather_db::queries::posts::{self as comments, CommentTarget};
use gather_types::models::{Comment, Membership, Outing, UserSummary};
use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use crate::access::{self, ensure};
use crate::error::{CoreError, Result};
use crate::membership::{membership_of, visible_community};
use crate::validate::{self, MAX_BODY_CHARS};
use crate::views;

pub struct OutingDetails<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub starts_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct OutingChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub starts_at: Option<DateTime<Utc>>,
}

/// Loads an outing together with the viewer's membership of its community.
pub(crate) fn load_outing(conn: &Connection, viewer: Uuid, id: Uuid) -> Result<(OutingRow, Membership)> {
    let outing = q::outing_by_id(conn, id)?.ok_or(CoreError::NotFound("outing"))?;
    let membership = membership_of(conn, viewer, outing.community_id)?;
    Ok((outing, membership))
}

/// Loads an outing `viewer` may see.
pub(crate) fn viewable_outing(conn: &Connection, viewer: Uuid, id: Uuid) -> Result<(OutingRow, Membership)> {
    let (outing, membership) = load_outing(conn, viewer, id)?;
    ensure(
        access::can_view_outing(membership),
        CoreError::Forbidden("only community members can see this outing"),
    )?;
    Ok((outing, membership))
}

pub fn create_outing(
    db: &Database,
    user: Uuid,
    community: Uuid,
    details: &OutingDetails<'_>,
) -> Result<Outing> {
    let title = validate::text("title", details.title, 1, 120)?;
    let description = validate::text("description", details.description, 0, MAX_BODY_CHARS)?;
    let location = details
        .location
        .map(|l| validate::text("location", l, 1, 200))
        .transpose()?;
    let id = Uuid::new_v4();

    let outing = db.transaction(|tx| {
        let (_, membership) = visible_community(tx, user, community)?;
        ensure(
            membership.is_member(),
            CoreError::Forbidden("only members can propose outings"),
        )?;
        q::insert_outing(
            tx,
            &NewOuting {
                id,
                community_id: community,
                owner_id: user,
                title,
                description,
                location,
                starts_at: details.starts_at,
            },
        )?;
        let row = q::outing_by_id(tx, id)?.ok_or(CoreError::NotFound("outing"))?;
        views::outing(tx, row)
    })?;
    debug!("{} proposed outing {} in {}", user, id, community);
    Ok(outing)
}

pub fn get_outing(db: &Database, viewer: Uuid, id: Uuid) -> Result<Outing> {
    db.with_conn(|conn| {
        let (outing, _) = viewable_outing(conn, viewer, id)?;
        views::outing(conn, outing)
    })
}

pub fn list_outings(db: &Database, viewer: Uuid, community: Uuid) -> Result<Vec<Outing>> {
    db.with_conn(|conn| {
        let (_, membership) = visible_community(conn, viewer, community)?;
        ensure(
            access::can_view_outing(membership),
            CoreError::Forbidden("only community members can see outings"),
        )?;
        q::outings_in_community(conn, community)?
            .into_iter()
            .map(|row| views::outing(conn, row))
            .collect()
    })
}

pub fn update_outing(
    db: &Database,
    actor: Uuid,
    id: Uuid,
    changes: &OutingChanges<'_>,
) -> Result<Outing> {
    let title = changes
        .title
        .map(|t| validate::text("title", t, 1, 120))
        .transpose()?;
    let description = changes
        .description
        .map(|d| validate::text("description", d, 0, MAX_BODY_CHARS))
        .transpose()?;
    let location = changes
        .location
        .map(|l| validate::text("location", l, 1, 200))
        .transpose()?;

    db.transaction(|tx| {
        let (mut outing, membership) = viewable_outing(tx, actor, id)?;
        ensure(
            access::can_modify_outing(actor, &outing, membership),
            CoreError::Forbidden("only the organiser or a community owner can edit this outing"),
        )?;
        if let Some(title) = title {
            outing.title = title.to_string();
        }
        if let Some(description) = description {
            outing.description = description.to_string();
        }
        if let Some(location) = location {
            outing.location = Some(location.to_string());
        }
        if let Some(starts_at) = changes.starts_at {
            outing.starts_at = Some(starts_at);
        }
        q::update_outing(tx, &outing)?;
        views::outing(tx, outing)
    })
}

pub fn delete_outing(db: &Database, actor: Uuid, id: Uuid) -> Result<()> {
    db.transaction(|tx| {
        let (outing, membership) = load_outing(tx, actor, id)?;
        ensure(
            access::can_modify_outing(actor, &outing, membership),
            CoreError::Forbidden("only the organiser or a community owner can delete this outing"),
        )?;
        q::delete_outing(tx, id)?;
        Ok::<_, CoreError>(())
    })?;
    debug!("{} deleted outing {}", actor, id);
    Ok(())
}

// -- RSVPs --

/// Puts `user` on one RSVP list, moving them off the other. Attending and
/// interested are mutually exclusive.
pub fn rsvp(db: &Database, user: Uuid, id: Uuid, list: Rsvp) -> Result<()> {
    db.transaction(|tx| {
        let (_, membership) = load_outing(tx, user, id)?;
        ensure(
            access::can_attend_outing(membership),
            CoreError::Forbidden("only community members can RSVP"),
        )?;
        if q::has_rsvp(tx, list, id, user)? {
            return Err(CoreError::Conflict(match list {
                Rsvp::Attending => "already attending",
                Rsvp::Interested => "already interested",
            }));
        }
        q::delete_rsvp(tx, list.other(), id, user)?;
        q::insert_rsvp(tx, list, id, user)?;
        Ok(())
    })?;
    debug!("{} RSVP'd {:?} to outing {}", user, list, id);
    Ok(())
}

pub fn attend(db: &Database, user: Uuid, id: Uuid) -> Result<()> {
    rsvp(db, user, id, Rsvp::Attending)
}

pub fn mark_interested(db: &Database, user: Uuid, id: Uuid) -> Result<()> {
    rsvp(db, user, id, Rsvp::Interested)
}

pub fn withdraw_rsvp(db: &Database, user: Uuid, id: Uuid, list: Rsvp) -> Result<()> {
    db.transaction(|tx| {
        q::outing_by_id(tx, id)?.ok_or(CoreError::NotFound("outing"))?;
        if q::delete_rsvp(tx, list, id, user)? == 0 {
            return Err(CoreError::NotFound("rsvp"));
        }
        Ok(())
    })
}

pub fn unattend(db: &Database, user: Uuid, id: Uuid) -> Result<()> {
    withdraw_rsvp(db, user, id, Rsvp::Attending)
}

pub fn unmark_interested(db: &Database, user: Uuid, id: Uuid) -> Result<()> {
    withdraw_rsvp(db, user, id, Rsvp::Interested)
}

/// `(attending, interested)`
pub fn list_rsvps(db: &Database, viewer: Uuid, id: Uuid) -> Result<(Vec<UserSummary>, Vec<UserSummary>)> {
    db.with_conn(|conn| {
        viewable_outing(conn, viewer, id)?;
        let attending = q::rsvp_list(conn, Rsvp::Attending, id)?;
        let interested = q::rsvp_list(conn, Rsvp::Interested, id)?;
        Ok((views::user_summaries(&attending), views::user_summaries(&interested)))
    })
}

// -- Comments --

pub fn comment_outing(db: &Database, user: Uuid, id: Uuid, body: &str) -> Result<Comment> {
    let body = validate::text("body", body, 1, MAX_BODY_CHARS)?;
    let comment_id = Uuid::new_v4();
    db.transaction(|tx| {
        let (_, membership) = load_outing(tx, user, id)?;
        ensure(
            access::can_comment_outing(membership),
            CoreError::Forbidden("only community members can comment"),
        )?;
        comments::insert_comment(tx, CommentTarget::Outing, comment_id, id, user, body)?;
        let row = comments::comment_by_id(tx, CommentTarget::Outing, comment_id)?
            .ok_or(CoreError::NotFound("comment"))?;
        views::comment(tx, row)
    })
}

pub fn list_outing_comments(db: &Database, viewer: Uuid, id: Uuid) -> Result<Vec<Comment>> {
    db.with_conn(|conn| {
        viewable_outing(conn, viewer, id)?;
        let rows = comments::comments(conn, CommentTarget::Outing, id)?;
        views::comments(conn, rows)
    })
}

/// The comment's author, the organiser, or a community owner may remove it.
pub fn delete_outing_comment(db: &Database, actor: Uuid, comment: Uuid) -> Result<()> {
    db.transaction(|tx| {
        let row = comments::comment_by_id(tx, CommentTarget::Outing, comment)?
            .ok_or(CoreError::NotFound("comment"))?;
        let (outing, membership) = load_outing(tx, actor, row.parent_id)?;
        ensure(
            access::can_delete_comment(actor, &row, outing.owner_id) || membership.is_owner(),
            CoreError::Forbidden("you cannot delete this comment"),
        )?;
        comments::delete_comment(tx, CommentTarget::Outing, comment)?;
        Ok::<_, CoreError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::{self, NewCommunity};
    use crate::test_support::{db, user};

    struct Fixture {
        db: Database,
        owner: Uuid,
        member: Uuid,
        outsider: Uuid,
        community: Uuid,
    }

    fn fixture() -> Fixture {
        let db = db();
        let (owner, member, outsider) = (user(&db, "olga"), user(&db, "max"), user(&db, "sam"));
        let community = membership::create_community(
            &db,
            owner,
            &NewCommunity {
                name: "hikers",
                description: "",
                is_open: true,
                is_hidden: false,
            },
        )
        .unwrap()
        .id;
        membership::join_community(&db, member, community).unwrap();
        Fixture {
            db,
            owner,
            member,
            outsider,
            community,
        }
    }

    fn details(title: &str) -> OutingDetails<'_> {
        OutingDetails {
            title,
            description: "Bring water",
            location: Some("North trailhead"),
            starts_at: None,
        }
    }

    #[test]
    fn test_only_members_propose_and_see() {
        let f = fixture();
        assert!(matches!(
            create_outing(&f.db, f.outsider, f.community, &details("Walk")),
            Err(CoreError::Forbidden(_))
        ));
        let outing = create_outing(&f.db, f.member, f.community, &details("Walk")).unwrap();

        assert_eq!(get_outing(&f.db, f.owner, outing.id).unwrap().title, "Walk");
        assert!(matches!(get_outing(&f.db, f.outsider, outing.id), Err(CoreError::Forbidden(_))));
        assert_eq!(list_outings(&f.db, f.owner, f.community).unwrap().len(), 1);
        assert!(matches!(
            list_outings(&f.db, f.outsider, f.community),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[test]
    fn test_rsvps_are_exclusive() {
        let f = fixture();
        let outing = create_outing(&f.db, f.owner, f.community, &details("Walk")).unwrap();

        assert!(matches!(attend(&f.db, f.outsider, outing.id), Err(CoreError::Forbidden(_))));
        mark_interested(&f.db, f.member, outing.id).unwrap();
        attend(&f.db, f.member, outing.id).unwrap();
        assert!(matches!(attend(&f.db, f.member, outing.id), Err(CoreError::Conflict(_))));

        let (attending, interested) = list_rsvps(&f.db, f.owner, outing.id).unwrap();
        assert_eq!(attending.len(), 1);
        assert!(interested.is_empty());

        unattend(&f.db, f.member, outing.id).unwrap();
        assert!(matches!(unattend(&f.db, f.member, outing.id), Err(CoreError::NotFound("rsvp"))));
        assert!(matches!(unmark_interested(&f.db, f.member, outing.id), Err(CoreError::NotFound("rsvp"))));
    }

    #[test]
    fn test_leaving_drops_rsvps() {
        let f = fixture();
        let outing = create_outing(&f.db, f.owner, f.community, &details("Walk")).unwrap();
        attend(&f.db, f.member, outing.id).unwrap();

        membership::leave_community(&f.db, f.member, f.community).unwrap();
        assert_eq!(get_outing(&f.db, f.owner, outing.id).unwrap().attendee_count, 0);
    }

    #[test]
    fn test_edit_rights() {
        let f = fixture();
        let outing = create_outing(&f.db, f.member, f.community, &details("Walk")).unwrap();
        let other = user(&f.db, "nia");
        membership::join_community(&f.db, other, f.community).unwrap();

        let changes = OutingChanges {
            title: Some("Long walk"),
            ..Default::default()
        };
        assert!(matches!(
            update_outing(&f.db, other, outing.id, &changes),
            Err(CoreError::Forbidden(_))
        ));
        assert_eq!(update_outing(&f.db, f.member, outing.id, &changes).unwrap().title, "Long walk");
        let when: DateTime<Utc> = "2030-06-01T09:00:00Z".parse().unwrap();
        let changes = OutingChanges {
            starts_at: Some(when),
            ..Default::default()
        };
        let updated = update_outing(&f.db, f.owner, outing.id, &changes).unwrap();
        assert_eq!(updated.starts_at, Some(when));
        assert_eq!(updated.description, "Bring water");

        assert!(matches!(delete_outing(&f.db, other, outing.id), Err(CoreError::Forbidden(_))));
        delete_outing(&f.db, f.owner, outing.id).unwrap();
        assert!(matches!(get_outing(&f.db, f.member, outing.id), Err(CoreError::NotFound("outing"))));
    }

    #[test]
    fn test_outing_comments() {
        let f = fixture();
        let outing = create_outing(&f.db, f.owner, f.community, &details("Walk")).unwrap();

        assert!(matches!(
            comment_outing(&f.db, f.outsider, outing.id, "can I come?"),
            Err(CoreError::Forbidden(_))
        ));
        let comment = comment_outing(&f.db, f.member, outing.id, "count me in").unwrap();
        assert_eq!(list_outing_comments(&f.db, f.owner, outing.id).unwrap().len(), 1);

        delete_outing_comment(&f.db, f.owner, comment.id).unwrap();
        assert!(list_outing_comments(&f.db, f.member, outing.id).unwrap().is_empty());
    }

    #[test]
    fn test_deleting_community_removes_outings() {
        let f = fixture();
        let outing = create_outing(&f.db, f.member, f.community, &details("Walk")).unwrap();
        membership::delete_community(&f.db, f.owner, f.community).unwrap();
        assert!(matches!(get_outing(&f.db, f.member, outing.id), Err(CoreError::NotFound("outing"))));
    }
}
