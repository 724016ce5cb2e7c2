use anyhow::Result;
use rusqlite::Connection;
use uuid::Uuid;

use crate::models::UserRow;
use crate::queries::users::{USER_COLUMNS, map_user};

// -- Friendship edges --

/// Whether the single directed row `user -> friend` exists.
///
/// A friendship is only real when both directions exist; callers decide
/// what a lone direction means.
pub fn has_friend_edge(conn: &Connection, user: Uuid, friend: Uuid) -> Result<bool> {
    super::exists(
        conn,
        "SELECT 1 FROM friends WHERE user_id = ?1 AND friend_id = ?2",
        [user.to_string(), friend.to_string()],
    )
}

/// Inserts both directions. Existing rows are left alone, so this also
/// completes a half-written friendship.
pub fn insert_friendship(conn: &Connection, a: Uuid, b: Uuid) -> Result<()> {
    let (a, b) = (a.to_string(), b.to_string());
    conn.execute(
        "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?1, ?2)",
        [&a, &b],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO friends (user_id, friend_id) VALUES (?1, ?2)",
        [&b, &a],
    )?;
    Ok(())
}

/// Removes both directions, returning how many rows went.
pub fn delete_friendship(conn: &Connection, a: Uuid, b: Uuid) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM friends
         WHERE (user_id = ?1 AND friend_id = ?2) OR (user_id = ?2 AND friend_id = ?1)",
        [a.to_string(), b.to_string()],
    )?;
    Ok(n)
}

/// Friends of `user` in the order the friendships were made. Only
/// symmetric pairs count.
pub fn list_friends(conn: &Connection, user: Uuid) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS}
         FROM friends f
         JOIN friends r ON r.user_id = f.friend_id AND r.friend_id = f.user_id
         JOIN users u ON u.id = f.friend_id
         WHERE f.user_id = ?1
         ORDER BY f.rowid"
    ))?;
    let rows = stmt
        .query_map([user.to_string()], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn friend_count(conn: &Connection, user: Uuid) -> Result<usize> {
    super::count(
        conn,
        "SELECT COUNT(*) FROM friends f
         JOIN friends r ON r.user_id = f.friend_id AND r.friend_id = f.user_id
         WHERE f.user_id = ?1",
        [user.to_string()],
    )
}

/// Every directed row whose mirror is missing, as `(user_id, friend_id)`.
pub fn one_directional_edges(conn: &Connection) -> Result<Vec<(Uuid, Uuid)>> {
    let mut stmt = conn.prepare(
        "SELECT f.user_id, f.friend_id FROM friends f
         WHERE NOT EXISTS (
             SELECT 1 FROM friends r WHERE r.user_id = f.friend_id AND r.friend_id = f.user_id
         )",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                crate::models::uuid_col(row, 0)?,
                crate::models::uuid_col(row, 1)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_friend_edge(conn: &Connection, user: Uuid, friend: Uuid) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM friends WHERE user_id = ?1 AND friend_id = ?2",
        [user.to_string(), friend.to_string()],
    )?;
    Ok(n)
}

// -- Friend requests --

pub fn has_request(conn: &Connection, recipient: Uuid, sender: Uuid) -> Result<bool> {
    super::exists(
        conn,
        "SELECT 1 FROM friend_requests WHERE recipient_id = ?1 AND sender_id = ?2",
        [recipient.to_string(), sender.to_string()],
    )
}

pub fn insert_request(conn: &Connection, recipient: Uuid, sender: Uuid) -> Result<()> {
    conn.execute(
        "INSERT INTO friend_requests (recipient_id, sender_id) VALUES (?1, ?2)",
        [recipient.to_string(), sender.to_string()],
    )?;
    Ok(())
}

pub fn delete_request(conn: &Connection, recipient: Uuid, sender: Uuid) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM friend_requests WHERE recipient_id = ?1 AND sender_id = ?2",
        [recipient.to_string(), sender.to_string()],
    )?;
    Ok(n)
}

/// Users who have asked `user` to be friends, oldest first.
pub fn incoming_requests(conn: &Connection, user: Uuid) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS}
         FROM friend_requests fr
         JOIN users u ON u.id = fr.sender_id
         WHERE fr.recipient_id = ?1
         ORDER BY fr.rowid"
    ))?;
    let rows = stmt
        .query_map([user.to_string()], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Users `user` has asked to be friends, oldest first.
pub fn outgoing_requests(conn: &Connection, user: Uuid) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS}
         FROM friend_requests fr
         JOIN users u ON u.id = fr.recipient_id
         WHERE fr.sender_id = ?1
         ORDER BY fr.rowid"
    ))?;
    let rows = stmt
        .query_map([user.to_string()], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Drops pending requests in either direction between users who are
/// already (symmetrically) friends.
pub fn prune_requests_between_friends(conn: &Connection) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM friend_requests
         WHERE EXISTS (
             SELECT 1 FROM friends f
             JOIN friends r ON r.user_id = f.friend_id AND r.friend_id = f.user_id
             WHERE f.user_id = friend_requests.recipient_id
               AND f.friend_id = friend_requests.sender_id
         )",
        [],
    )?;
    Ok(n)
}
