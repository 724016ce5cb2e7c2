use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{CommunityRow, UserRow, time_col, uuid_col};
use crate::queries::users::{USER_COLUMNS, map_user};

const COMMUNITY_COLUMNS: &str = "c.id, c.name, c.description, c.is_open, c.is_hidden, c.created_at";

/// The four per-user edge tables hanging off a community.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roster {
    Owners,
    Members,
    /// Pending requests to join, stored on the community side.
    Requests,
}

impl Roster {
    fn table(self) -> &'static str {
        match self {
            Self::Owners => "community_owners",
            Self::Members => "community_members",
            Self::Requests => "community_requests",
        }
    }
}

fn map_community(row: &Row<'_>) -> rusqlite::Result<CommunityRow> {
    Ok(CommunityRow {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        is_open: row.get(3)?,
        is_hidden: row.get(4)?,
        created_at: time_col(row, 5)?,
    })
}

// -- Communities --

pub fn insert_community(
    conn: &Connection,
    id: Uuid,
    name: &str,
    description: &str,
    is_open: bool,
    is_hidden: bool,
) -> Result<()> {
    conn.execute(
        "INSERT INTO communities (id, name, description, is_open, is_hidden)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![id.to_string(), name, description, is_open, is_hidden],
    )?;
    Ok(())
}

pub fn community_by_id(conn: &Connection, id: Uuid) -> Result<Option<CommunityRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {COMMUNITY_COLUMNS} FROM communities c WHERE c.id = ?1"),
            [id.to_string()],
            map_community,
        )
        .optional()?;
    Ok(row)
}

pub fn name_taken(conn: &Connection, name: &str) -> Result<bool> {
    super::exists(
        conn,
        "SELECT 1 FROM communities WHERE name = ?1 COLLATE NOCASE",
        [name],
    )
}

pub fn update_community(
    conn: &Connection,
    id: Uuid,
    description: Option<&str>,
    is_open: Option<bool>,
    is_hidden: Option<bool>,
) -> Result<usize> {
    let n = conn.execute(
        "UPDATE communities
         SET description = COALESCE(?2, description),
             is_open = COALESCE(?3, is_open),
             is_hidden = COALESCE(?4, is_hidden)
         WHERE id = ?1",
        rusqlite::params![id.to_string(), description, is_open, is_hidden],
    )?;
    Ok(n)
}

/// Removes the community; owners, members, pending edges, outings and
/// community posts go with it through `ON DELETE CASCADE`.
pub fn delete_community(conn: &Connection, id: Uuid) -> Result<usize> {
    let n = conn.execute("DELETE FROM communities WHERE id = ?1", [id.to_string()])?;
    Ok(n)
}

/// Communities `viewer` may discover: every visible one, plus hidden ones
/// they belong to, have asked to join, or have been invited into.
pub fn discoverable(conn: &Connection, viewer: Uuid) -> Result<Vec<CommunityRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMUNITY_COLUMNS} FROM communities c
         WHERE c.is_hidden = 0
            OR EXISTS (SELECT 1 FROM community_members m WHERE m.community_id = c.id AND m.user_id = ?1)
            OR EXISTS (SELECT 1 FROM community_requests r WHERE r.community_id = c.id AND r.user_id = ?1)
            OR EXISTS (SELECT 1 FROM community_invites i WHERE i.community_id = c.id AND i.user_id = ?1)
         ORDER BY c.name"
    ))?;
    let rows = stmt
        .query_map([viewer.to_string()], map_community)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Communities `user` is a member of, in join order.
pub fn communities_of(conn: &Connection, user: Uuid) -> Result<Vec<CommunityRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMUNITY_COLUMNS} FROM community_members m
         JOIN communities c ON c.id = m.community_id
         WHERE m.user_id = ?1
         ORDER BY m.rowid"
    ))?;
    let rows = stmt
        .query_map([user.to_string()], map_community)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Communities where `user` is the one and only owner.
pub fn solely_owned_by(conn: &Connection, user: Uuid) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT o.community_id FROM community_owners o
         WHERE o.user_id = ?1
           AND (SELECT COUNT(*) FROM community_owners x WHERE x.community_id = o.community_id) = 1",
    )?;
    let rows = stmt
        .query_map([user.to_string()], |row| uuid_col(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Rosters (owners / members / join requests) --

pub fn on_roster(conn: &Connection, roster: Roster, community: Uuid, user: Uuid) -> Result<bool> {
    super::exists(
        conn,
        &format!(
            "SELECT 1 FROM {} WHERE community_id = ?1 AND user_id = ?2",
            roster.table()
        ),
        [community.to_string(), user.to_string()],
    )
}

pub fn add_to_roster(conn: &Connection, roster: Roster, community: Uuid, user: Uuid) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT OR IGNORE INTO {} (community_id, user_id) VALUES (?1, ?2)",
            roster.table()
        ),
        [community.to_string(), user.to_string()],
    )?;
    Ok(())
}

pub fn remove_from_roster(
    conn: &Connection,
    roster: Roster,
    community: Uuid,
    user: Uuid,
) -> Result<usize> {
    let n = conn.execute(
        &format!(
            "DELETE FROM {} WHERE community_id = ?1 AND user_id = ?2",
            roster.table()
        ),
        [community.to_string(), user.to_string()],
    )?;
    Ok(n)
}

pub fn roster(conn: &Connection, roster: Roster, community: Uuid) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM {} r
         JOIN users u ON u.id = r.user_id
         WHERE r.community_id = ?1
         ORDER BY r.rowid",
        roster.table()
    ))?;
    let rows = stmt
        .query_map([community.to_string()], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn roster_ids(conn: &Connection, roster: Roster, community: Uuid) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT user_id FROM {} WHERE community_id = ?1 ORDER BY rowid",
        roster.table()
    ))?;
    let rows = stmt
        .query_map([community.to_string()], |row| uuid_col(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn roster_count(conn: &Connection, roster: Roster, community: Uuid) -> Result<usize> {
    super::count(
        conn,
        &format!(
            "SELECT COUNT(*) FROM {} WHERE community_id = ?1",
            roster.table()
        ),
        [community.to_string()],
    )
}

// -- Invites (stored on the user side) --

pub fn has_invite(conn: &Connection, user: Uuid, community: Uuid) -> Result<bool> {
    super::exists(
        conn,
        "SELECT 1 FROM community_invites WHERE user_id = ?1 AND community_id = ?2",
        [user.to_string(), community.to_string()],
    )
}

pub fn insert_invite(conn: &Connection, user: Uuid, community: Uuid, inviter: Uuid) -> Result<()> {
    conn.execute(
        "INSERT INTO community_invites (user_id, community_id, inviter_id) VALUES (?1, ?2, ?3)",
        [user.to_string(), community.to_string(), inviter.to_string()],
    )?;
    Ok(())
}

pub fn delete_invite(conn: &Connection, user: Uuid, community: Uuid) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM community_invites WHERE user_id = ?1 AND community_id = ?2",
        [user.to_string(), community.to_string()],
    )?;
    Ok(n)
}

/// Who sent the pending invite, if there is one.
pub fn inviter_of(conn: &Connection, user: Uuid, community: Uuid) -> Result<Option<Uuid>> {
    let row = conn
        .query_row(
            "SELECT inviter_id FROM community_invites WHERE user_id = ?1 AND community_id = ?2",
            [user.to_string(), community.to_string()],
            |row| uuid_col(row, 0),
        )
        .optional()?;
    Ok(row)
}

/// Communities `user` has been invited into, oldest invite first.
pub fn invites_for(conn: &Connection, user: Uuid) -> Result<Vec<CommunityRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMUNITY_COLUMNS} FROM community_invites i
         JOIN communities c ON c.id = i.community_id
         WHERE i.user_id = ?1
         ORDER BY i.rowid"
    ))?;
    let rows = stmt
        .query_map([user.to_string()], map_community)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Drops a departing member's RSVPs on the community's outings.
pub fn clear_outing_rsvps(conn: &Connection, community: Uuid, user: Uuid) -> Result<usize> {
    let (community, user) = (community.to_string(), user.to_string());
    let mut n = 0;
    for table in ["outing_attendees", "outing_interestees"] {
        n += conn.execute(
            &format!(
                "DELETE FROM {table}
                 WHERE user_id = ?2
                   AND outing_id IN (SELECT id FROM outings WHERE community_id = ?1)"
            ),
            [&community, &user],
        )?;
    }
    Ok(n)
}

// -- Integrity repair --

/// Pending join requests and invites for users who are already members.
pub fn prune_pending_for_members(conn: &Connection) -> Result<usize> {
    let requests = conn.execute(
        "DELETE FROM community_requests
         WHERE EXISTS (
             SELECT 1 FROM community_members m
             WHERE m.community_id = community_requests.community_id
               AND m.user_id = community_requests.user_id
         )",
        [],
    )?;
    let invites = conn.execute(
        "DELETE FROM community_invites
         WHERE EXISTS (
             SELECT 1 FROM community_members m
             WHERE m.community_id = community_invites.community_id
               AND m.user_id = community_invites.user_id
         )",
        [],
    )?;
    Ok(requests + invites)
}

/// Adds every owner missing from their community's member roster.
pub fn enroll_owners_as_members(conn: &Connection) -> Result<usize> {
    let n = conn.execute(
        "INSERT INTO community_members (community_id, user_id)
         SELECT o.community_id, o.user_id FROM community_owners o
         WHERE NOT EXISTS (
             SELECT 1 FROM community_members m
             WHERE m.community_id = o.community_id AND m.user_id = o.user_id
         )",
        [],
    )?;
    Ok(n)
}
