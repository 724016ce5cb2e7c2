use anyhow::Result;
use rusqlite::{Connection, Row};
use uuid::Uuid;

use crate::models::{NotificationRow, time_col, uuid_col};

fn map_notification(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: uuid_col(row, 0)?,
        recipient_id: uuid_col(row, 1)?,
        actor_id: uuid_col(row, 2)?,
        kind: row.get(3)?,
        entity_id: uuid_col(row, 4)?,
        read: row.get(5)?,
        created_at: time_col(row, 6)?,
    })
}

pub fn insert_notification(
    conn: &Connection,
    id: Uuid,
    recipient: Uuid,
    actor: Uuid,
    kind: &str,
    entity: Uuid,
) -> Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, recipient_id, actor_id, kind, entity_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            id.to_string(),
            recipient.to_string(),
            actor.to_string(),
            kind,
            entity.to_string()
        ],
    )?;
    Ok(())
}

/// Newest first.
pub fn notifications_for(
    conn: &Connection,
    recipient: Uuid,
    unread_only: bool,
    limit: u32,
) -> Result<Vec<NotificationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, recipient_id, actor_id, kind, entity_id, read, created_at
         FROM notifications
         WHERE recipient_id = ?1 AND (?2 = 0 OR read = 0)
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?3",
    )?;
    let rows = stmt
        .query_map(
            rusqlite::params![recipient.to_string(), unread_only, limit],
            map_notification,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_read(conn: &Connection, recipient: Uuid, id: Uuid) -> Result<usize> {
    let n = conn.execute(
        "UPDATE notifications SET read = 1 WHERE id = ?1 AND recipient_id = ?2",
        [id.to_string(), recipient.to_string()],
    )?;
    Ok(n)
}

pub fn mark_all_read(conn: &Connection, recipient: Uuid) -> Result<usize> {
    let n = conn.execute(
        "UPDATE notifications SET read = 1 WHERE recipient_id = ?1 AND read = 0",
        [recipient.to_string()],
    )?;
    Ok(n)
}
