//! The friendship graph.
//!
//! A friendship is two mirrored rows in `friends`; a friend request is one
//! row in `friend_requests` keyed by recipient. Every operation that touches
//! more than one row runs in a single transaction, so a friendship is
//! never observable half-made and a request never survives its acceptance.

use gather_db::Database;
use gather_db::queries::friends;
use gather_types::events::NotificationKind;
use gather_types::models::UserSummary;
use rusqlite::Connection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::accounts::require_user;
use crate::error::{CoreError, Result};
use crate::notifications::notify;
use crate::views;

fn distinct(a: Uuid, b: Uuid) -> Result<()> {
    if a == b {
        return Err(CoreError::SelfReferenceNotAllowed);
    }
    Ok(())
}

/// Checks both directions. A lone direction is an integrity fault: it is
/// reported and treated as "not friends" until the repair pass removes it.
pub(crate) fn check_friends(conn: &Connection, a: Uuid, b: Uuid) -> Result<bool> {
    let forward = friends::has_friend_edge(conn, a, b)?;
    let backward = friends::has_friend_edge(conn, b, a)?;
    if forward != backward {
        warn!("Asymmetric friendship between {} and {}", a, b);
    }
    Ok(forward && backward)
}

pub fn are_friends(db: &Database, a: Uuid, b: Uuid) -> Result<bool> {
    db.with_conn(|conn| check_friends(conn, a, b))
}

pub fn send_friend_request(db: &Database, from: Uuid, to: Uuid) -> Result<()> {
    distinct(from, to)?;
    db.transaction(|tx| {
        require_user(tx, from)?;
        require_user(tx, to)?;
        if check_friends(tx, from, to)? {
            return Err(CoreError::AlreadyFriends);
        }
        if friends::has_request(tx, to, from)? {
            return Err(CoreError::DuplicateRequest);
        }
        if friends::has_request(tx, from, to)? {
            return Err(CoreError::ReciprocalRequest);
        }
        friends::insert_request(tx, to, from)?;
        notify(tx, to, from, NotificationKind::FriendRequest, from)?;
        Ok(())
    })?;
    debug!("Friend request {} -> {}", from, to);
    Ok(())
}

pub fn accept_friend_request(db: &Database, accepter: Uuid, requester: Uuid) -> Result<()> {
    distinct(accepter, requester)?;
    db.transaction(|tx| {
        if !friends::has_request(tx, accepter, requester)? {
            return Err(CoreError::NoSuchRequest);
        }
        if check_friends(tx, accepter, requester)? {
            return Err(CoreError::AlreadyFriends);
        }
        friends::delete_request(tx, accepter, requester)?;
        friends::delete_request(tx, requester, accepter)?;
        friends::insert_friendship(tx, accepter, requester)?;
        notify(tx, requester, accepter, NotificationKind::FriendAccept, accepter)?;
        Ok(())
    })?;
    debug!("{} accepted friend request from {}", accepter, requester);
    Ok(())
}

/// The recipient turns a request down.
pub fn reject_friend_request(db: &Database, recipient: Uuid, sender: Uuid) -> Result<()> {
    distinct(recipient, sender)?;
    let removed = db.with_conn(|conn| {
        friends::delete_request(conn, recipient, sender).map_err(CoreError::from)
    })?;
    if removed == 0 {
        return Err(CoreError::NoSuchRequest);
    }
    debug!("{} rejected friend request from {}", recipient, sender);
    Ok(())
}

/// The sender withdraws a request they made.
pub fn cancel_friend_request(db: &Database, sender: Uuid, recipient: Uuid) -> Result<()> {
    distinct(sender, recipient)?;
    let removed = db.with_conn(|conn| {
        friends::delete_request(conn, recipient, sender).map_err(CoreError::from)
    })?;
    if removed == 0 {
        return Err(CoreError::NoSuchRequest);
    }
    debug!("{} cancelled friend request to {}", sender, recipient);
    Ok(())
}

pub fn remove_friend(db: &Database, a: Uuid, b: Uuid) -> Result<()> {
    distinct(a, b)?;
    let removed = db.transaction(|tx| {
        friends::delete_friendship(tx, a, b).map_err(CoreError::from)
    })?;
    match removed {
        0 => Err(CoreError::NotFriends),
        1 => {
            warn!("Removed a one-directional friendship between {} and {}", a, b);
            Ok(())
        }
        _ => {
            debug!("{} unfriended {}", a, b);
            Ok(())
        }
    }
}

pub fn list_friends(db: &Database, user: Uuid) -> Result<Vec<UserSummary>> {
    let rows = db.with_conn(|conn| friends::list_friends(conn, user).map_err(CoreError::from))?;
    Ok(views::user_summaries(&rows))
}

pub fn list_incoming_requests(db: &Database, user: Uuid) -> Result<Vec<UserSummary>> {
    let rows =
        db.with_conn(|conn| friends::incoming_requests(conn, user).map_err(CoreError::from))?;
    Ok(views::user_summaries(&rows))
}

pub fn list_outgoing_requests(db: &Database, user: Uuid) -> Result<Vec<UserSummary>> {
    let rows =
        db.with_conn(|conn| friends::outgoing_requests(conn, user).map_err(CoreError::from))?;
    Ok(views::user_summaries(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db, user};

    #[test]
    fn test_self_friending_rejected() {
        let db = db();
        let a = user(&db, "alice");
        assert!(matches!(
            send_friend_request(&db, a, a),
            Err(CoreError::SelfReferenceNotAllowed)
        ));
        assert!(matches!(
            accept_friend_request(&db, a, a),
            Err(CoreError::SelfReferenceNotAllowed)
        ));
        assert!(matches!(remove_friend(&db, a, a), Err(CoreError::SelfReferenceNotAllowed)));
    }

    #[test]
    fn test_request_to_unknown_user() {
        let db = db();
        let a = user(&db, "alice");
        assert!(matches!(
            send_friend_request(&db, a, Uuid::new_v4()),
            Err(CoreError::NotFound("user"))
        ));
    }

    #[test]
    fn test_duplicate_and_reciprocal_requests() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        send_friend_request(&db, a, b).unwrap();
        assert!(matches!(send_friend_request(&db, a, b), Err(CoreError::DuplicateRequest)));
        assert!(matches!(send_friend_request(&db, b, a), Err(CoreError::ReciprocalRequest)));
    }

    #[test]
    fn test_accept_makes_symmetric_friendship() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        send_friend_request(&db, a, b).unwrap();
        accept_friend_request(&db, b, a).unwrap();

        assert!(are_friends(&db, a, b).unwrap());
        assert!(are_friends(&db, b, a).unwrap());
        assert!(list_incoming_requests(&db, b).unwrap().is_empty());
        assert!(list_outgoing_requests(&db, a).unwrap().is_empty());
        assert!(matches!(send_friend_request(&db, b, a), Err(CoreError::AlreadyFriends)));
    }

    #[test]
    fn test_only_recipient_can_accept() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        send_friend_request(&db, a, b).unwrap();
        assert!(matches!(accept_friend_request(&db, a, b), Err(CoreError::NoSuchRequest)));
        assert!(!are_friends(&db, a, b).unwrap());
    }

    #[test]
    fn test_reject_twice() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        send_friend_request(&db, a, b).unwrap();
        reject_friend_request(&db, b, a).unwrap();
        assert!(matches!(reject_friend_request(&db, b, a), Err(CoreError::NoSuchRequest)));
        // A rejected request can be sent again.
        send_friend_request(&db, a, b).unwrap();
    }

    #[test]
    fn test_cancel_is_sender_side() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        send_friend_request(&db, a, b).unwrap();
        assert!(matches!(cancel_friend_request(&db, b, a), Err(CoreError::NoSuchRequest)));
        cancel_friend_request(&db, a, b).unwrap();
        assert!(list_incoming_requests(&db, b).unwrap().is_empty());
    }

    #[test]
    fn test_remove_friend() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        assert!(matches!(remove_friend(&db, a, b), Err(CoreError::NotFriends)));
        send_friend_request(&db, a, b).unwrap();
        accept_friend_request(&db, b, a).unwrap();
        remove_friend(&db, b, a).unwrap();
        assert!(!are_friends(&db, a, b).unwrap());
        assert!(list_friends(&db, a).unwrap().is_empty());
        assert!(list_friends(&db, b).unwrap().is_empty());
    }

    #[test]
    fn test_half_edge_is_not_a_friendship() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));

        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO friends (user_id, friend_id) VALUES (?1, ?2)",
                [a.to_string(), b.to_string()],
            )
            .map_err(CoreError::from)
        })
        .unwrap();

        assert!(!are_friends(&db, a, b).unwrap());
        assert!(!are_friends(&db, b, a).unwrap());
        // Removing it cleans up the stray row.
        remove_friend(&db, a, b).unwrap();
        assert!(matches!(remove_friend(&db, a, b), Err(CoreError::NotFriends)));
    }

    #[test]
    fn test_failed_accept_leaves_no_partial_write() {
        let db = db();
        let (a, b) = (user(&db, "alice"), user(&db, "bob"));
        send_friend_request(&db, a, b).unwrap();

        // Simulate a failure after the first write of the acceptance.
        let result: Result<()> = db.transaction(|tx| {
            friends::delete_request(tx, b, a)?;
            Err(CoreError::Internal(anyhow::anyhow!("crash")))
        });
        assert!(result.is_err());

        assert_eq!(list_incoming_requests(&db, b).unwrap().len(), 1);
        accept_friend_request(&db, b, a).unwrap();
        assert!(are_friends(&db, a, b).unwrap());
    }
}
