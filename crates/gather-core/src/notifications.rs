use gather_db::Database;
use gather_db::queries::notifications as q;
use gather_types::events::NotificationKind;
use gather_types::models::Notification;
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::views;

const LIST_LIMIT: u32 = 100;

/// Records a notification. Called from inside the transaction that makes
/// the state change, so the two commit or roll back together.
pub(crate) fn notify(
    conn: &Connection,
    recipient: Uuid,
    actor: Uuid,
    kind: NotificationKind,
    entity: Uuid,
) -> Result<()> {
    q::insert_notification(conn, Uuid::new_v4(), recipient, actor, kind.as_str(), entity)?;
    Ok(())
}

pub fn list(db: &Database, user: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
    let rows = db.with_conn(|conn| {
        q::notifications_for(conn, user, unread_only, LIST_LIMIT).map_err(CoreError::from)
    })?;
    Ok(views::notifications(rows))
}

pub fn mark_read(db: &Database, user: Uuid, id: Uuid) -> Result<()> {
    let n = db.with_conn(|conn| q::mark_read(conn, user, id).map_err(CoreError::from))?;
    if n == 0 {
        return Err(CoreError::NotFound("notification"));
    }
    Ok(())
}

pub fn mark_all_read(db: &Database, user: Uuid) -> Result<usize> {
    db.with_conn(|conn| q::mark_all_read(conn, user).map_err(CoreError::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationships;
    use crate::test_support::{db, user};

    #[test]
    fn test_friend_request_notifies_recipient() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        relationships::send_friend_request(&db, a, b).unwrap();
        let inbox = list(&db, b, true).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::FriendRequest);
        assert_eq!(inbox[0].actor_id, a);
        assert!(list(&db, a, false).unwrap().is_empty());

        mark_read(&db, b, inbox[0].id).unwrap();
        assert!(list(&db, b, true).unwrap().is_empty());
        assert!(matches!(
            mark_read(&db, a, inbox[0].id),
            Err(CoreError::NotFound("notification"))
        ));
    }

    #[test]
    fn test_mark_all_read() {
        let db = db();
        let (a, b, c) = (user(&db, "alice"), user(&db, "bob"), user(&db, "carol"));
        relationships::send_friend_request(&db, b, a).unwrap();
        relationships::send_friend_request(&db, c, a).unwrap();

        assert_eq!(mark_all_read(&db, a).unwrap(), 2);
        assert_eq!(mark_all_read(&db, a).unwrap(), 0);
        assert_eq!(list(&db, a, false).unwrap().len(), 2);
    }
}
