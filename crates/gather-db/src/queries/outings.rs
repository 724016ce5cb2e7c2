use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{
    OutingRow, PollOptionRow, PollRow, UserRow, opt_time_col, time_col, uuid_col,
};
use crate::queries::users::{USER_COLUMNS, map_user};

const OUTING_COLUMNS: &str =
    "o.id, o.community_id, o.owner_id, o.title, o.description, o.location, o.starts_at, o.created_at";

/// The two RSVP lists on an outing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rsvp {
    Attending,
    Interested,
}

impl Rsvp {
    fn table(self) -> &'static str {
        match self {
            Self::Attending => "outing_attendees",
            Self::Interested => "outing_interestees",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Attending => Self::Interested,
            Self::Interested => Self::Attending,
        }
    }
}

fn map_outing(row: &Row<'_>) -> rusqlite::Result<OutingRow> {
    Ok(OutingRow {
        id: uuid_col(row, 0)?,
        community_id: uuid_col(row, 1)?,
        owner_id: uuid_col(row, 2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        location: row.get(5)?,
        starts_at: opt_time_col(row, 6)?,
        created_at: time_col(row, 7)?,
    })
}

// -- Outings --

pub struct NewOuting<'a> {
    pub id: Uuid,
    pub community_id: Uuid,
    pub owner_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub location: Option<&'a str>,
    pub starts_at: Option<DateTime<Utc>>,
}

pub fn insert_outing(conn: &Connection, outing: &NewOuting<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO outings (id, community_id, owner_id, title, description, location, starts_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            outing.id.to_string(),
            outing.community_id.to_string(),
            outing.owner_id.to_string(),
            outing.title,
            outing.description,
            outing.location,
            outing.starts_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(())
}

pub fn outing_by_id(conn: &Connection, id: Uuid) -> Result<Option<OutingRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {OUTING_COLUMNS} FROM outings o WHERE o.id = ?1"),
            [id.to_string()],
            map_outing,
        )
        .optional()?;
    Ok(row)
}

/// Writes back the editable fields of `outing`.
pub fn update_outing(conn: &Connection, outing: &OutingRow) -> Result<usize> {
    let n = conn.execute(
        "UPDATE outings SET title = ?2, description = ?3, location = ?4, starts_at = ?5
         WHERE id = ?1",
        rusqlite::params![
            outing.id.to_string(),
            outing.title,
            outing.description,
            outing.location,
            outing.starts_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(n)
}

pub fn delete_outing(conn: &Connection, id: Uuid) -> Result<usize> {
    let n = conn.execute("DELETE FROM outings WHERE id = ?1", [id.to_string()])?;
    Ok(n)
}

/// Outings of a community, soonest first; undated outings last.
pub fn outings_in_community(conn: &Connection, community: Uuid) -> Result<Vec<OutingRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {OUTING_COLUMNS} FROM outings o
         WHERE o.community_id = ?1
         ORDER BY o.starts_at IS NULL, o.starts_at, o.rowid"
    ))?;
    let rows = stmt
        .query_map([community.to_string()], map_outing)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- RSVPs --

pub fn has_rsvp(conn: &Connection, rsvp: Rsvp, outing: Uuid, user: Uuid) -> Result<bool> {
    super::exists(
        conn,
        &format!(
            "SELECT 1 FROM {} WHERE outing_id = ?1 AND user_id = ?2",
            rsvp.table()
        ),
        [outing.to_string(), user.to_string()],
    )
}

pub fn insert_rsvp(conn: &Connection, rsvp: Rsvp, outing: Uuid, user: Uuid) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (outing_id, user_id) VALUES (?1, ?2)",
            rsvp.table()
        ),
        [outing.to_string(), user.to_string()],
    )?;
    Ok(())
}

pub fn delete_rsvp(conn: &Connection, rsvp: Rsvp, outing: Uuid, user: Uuid) -> Result<usize> {
    let n = conn.execute(
        &format!(
            "DELETE FROM {} WHERE outing_id = ?1 AND user_id = ?2",
            rsvp.table()
        ),
        [outing.to_string(), user.to_string()],
    )?;
    Ok(n)
}

pub fn rsvp_list(conn: &Connection, rsvp: Rsvp, outing: Uuid) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM {} r
         JOIN users u ON u.id = r.user_id
         WHERE r.outing_id = ?1
         ORDER BY r.rowid",
        rsvp.table()
    ))?;
    let rows = stmt
        .query_map([outing.to_string()], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn rsvp_count(conn: &Connection, rsvp: Rsvp, outing: Uuid) -> Result<usize> {
    super::count(
        conn,
        &format!("SELECT COUNT(*) FROM {} WHERE outing_id = ?1", rsvp.table()),
        [outing.to_string()],
    )
}

// -- Polls --

pub fn insert_poll(
    conn: &Connection,
    id: Uuid,
    outing: Uuid,
    question: &str,
    created_by: Uuid,
) -> Result<()> {
    conn.execute(
        "INSERT INTO polls (id, outing_id, question, created_by) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id.to_string(), outing.to_string(), question, created_by.to_string()],
    )?;
    Ok(())
}

pub fn insert_poll_option(
    conn: &Connection,
    id: Uuid,
    poll: Uuid,
    label: &str,
    position: usize,
) -> Result<()> {
    conn.execute(
        "INSERT INTO poll_options (id, poll_id, label, position) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![id.to_string(), poll.to_string(), label, position as i64],
    )?;
    Ok(())
}

fn map_poll(row: &Row<'_>) -> rusqlite::Result<PollRow> {
    Ok(PollRow {
        id: uuid_col(row, 0)?,
        outing_id: uuid_col(row, 1)?,
        question: row.get(2)?,
        created_by: uuid_col(row, 3)?,
        created_at: time_col(row, 4)?,
    })
}

pub fn poll_by_id(conn: &Connection, id: Uuid) -> Result<Option<PollRow>> {
    let row = conn
        .query_row(
            "SELECT id, outing_id, question, created_by, created_at FROM polls WHERE id = ?1",
            [id.to_string()],
            map_poll,
        )
        .optional()?;
    Ok(row)
}

pub fn polls_for_outing(conn: &Connection, outing: Uuid) -> Result<Vec<PollRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, outing_id, question, created_by, created_at FROM polls
         WHERE outing_id = ?1
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([outing.to_string()], map_poll)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Options in the order they were given, with their current vote tally.
pub fn poll_options(conn: &Connection, poll: Uuid) -> Result<Vec<PollOptionRow>> {
    let mut stmt = conn.prepare(
        "SELECT o.id, o.poll_id, o.label,
                (SELECT COUNT(*) FROM poll_votes v WHERE v.option_id = o.id)
         FROM poll_options o
         WHERE o.poll_id = ?1
         ORDER BY o.position",
    )?;
    let rows = stmt
        .query_map([poll.to_string()], |row| {
            Ok(PollOptionRow {
                id: uuid_col(row, 0)?,
                poll_id: uuid_col(row, 1)?,
                label: row.get(2)?,
                votes: row.get::<_, i64>(3)? as usize,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn has_voted(conn: &Connection, poll: Uuid, user: Uuid) -> Result<bool> {
    super::exists(
        conn,
        "SELECT 1 FROM poll_votes WHERE poll_id = ?1 AND user_id = ?2",
        [poll.to_string(), user.to_string()],
    )
}

pub fn insert_vote(conn: &Connection, poll: Uuid, option: Uuid, user: Uuid) -> Result<()> {
    conn.execute(
        "INSERT INTO poll_votes (poll_id, option_id, user_id) VALUES (?1, ?2, ?3)",
        [poll.to_string(), option.to_string(), user.to_string()],
    )?;
    Ok(())
}
