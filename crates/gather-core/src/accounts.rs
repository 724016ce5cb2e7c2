//! User records: registration, profiles, search and account deletion.
//! Password hashing happens before this layer; only the hash arrives here.

use gather_db::Database;
use gather_db::queries::users::{self as q, NewUser};
use gather_db::queries::{communities, friends};
use gather_types::models::{Profile, UserSummary};
use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use crate::access;
use crate::error::{CoreError, Result};
use crate::relationships::check_friends;
use crate::{validate, views};

const SEARCH_LIMIT: u32 = 20;

/// Fails with `NotFound` unless `id` names a live account. Writes keyed by
/// the acting user call this first, since a token can outlive its account.
pub(crate) fn require_user(conn: &Connection, id: Uuid) -> Result<()> {
    if !q::user_exists(conn, id)? {
        return Err(CoreError::NotFound("user"));
    }
    Ok(())
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub country_code: &'a str,
    pub phone_number: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
}

pub fn register(db: &Database, account: &NewAccount<'_>) -> Result<UserSummary> {
    let username = validate::username(account.username)?;
    let email = validate::email(account.email)?.to_lowercase();
    let country_code = validate::country_code(account.country_code)?;
    let phone_number = validate::phone_number(account.phone_number)?;
    let display_name = validate::text("display name", account.display_name, 1, 64)?;
    let id = Uuid::new_v4();

    let row = db.transaction(|tx| {
        if q::username_taken(tx, username)? {
            return Err(CoreError::Conflict("username is already taken"));
        }
        if q::email_taken(tx, &email)? {
            return Err(CoreError::Conflict("email is already registered"));
        }
        if q::phone_taken(tx, country_code, phone_number)? {
            return Err(CoreError::Conflict("phone number is already registered"));
        }
        q::insert_user(
            tx,
            &NewUser {
                id,
                username,
                email: &email,
                country_code,
                phone_number,
                password_hash: account.password_hash,
                display_name,
            },
        )?;
        q::user_by_id(tx, id)?.ok_or(CoreError::NotFound("user"))
    })?;
    info!("Registered user {} ({})", row.username, id);
    Ok(views::user_summary(&row))
}

/// A user's profile as `viewer` sees it. The friend list is only shown to
/// the user themselves and their friends.
pub fn get_profile(db: &Database, viewer: Uuid, user: Uuid) -> Result<Profile> {
    db.with_conn(|conn| {
        let row = q::user_by_id(conn, user)?.ok_or(CoreError::NotFound("user"))?;
        let is_friend = viewer != user && check_friends(conn, viewer, user)?;
        let friends = if access::can_see_friend_list(viewer, user, is_friend) {
            Some(views::user_summaries(&friends::list_friends(conn, user)?))
        } else {
            None
        };
        Ok(Profile {
            user: views::user_summary(&row),
            friend_count: friends::friend_count(conn, user)?,
            is_friend,
            friends,
            created_at: row.created_at,
        })
    })
}

pub fn update_profile(
    db: &Database,
    user: Uuid,
    display_name: Option<&str>,
    profile_picture: Option<&str>,
) -> Result<UserSummary> {
    let display_name = display_name
        .map(|d| validate::text("display name", d, 1, 64))
        .transpose()?;
    let profile_picture = profile_picture
        .map(|p| validate::text("profile picture", p, 1, 512))
        .transpose()?;
    db.transaction(|tx| {
        if q::update_profile(tx, user, display_name, profile_picture)? == 0 {
            return Err(CoreError::NotFound("user"));
        }
        let row = q::user_by_id(tx, user)?.ok_or(CoreError::NotFound("user"))?;
        Ok(views::user_summary(&row))
    })
}

pub fn search_users(db: &Database, query: &str) -> Result<Vec<UserSummary>> {
    let query = validate::text("query", query, 1, 32)?;
    let rows = db.with_conn(|conn| {
        q::search_users(conn, query, SEARCH_LIMIT).map_err(CoreError::from)
    })?;
    Ok(views::user_summaries(&rows))
}

/// Deletes the account and, through cascading foreign keys, every
/// friendship, request, membership, post, comment, like, RSVP and
/// notification that references it.
///
/// Refused while the user is the only owner of any community, since that
/// community would be left without anyone able to manage it.
pub fn delete_account(db: &Database, user: Uuid) -> Result<()> {
    db.transaction(|tx| {
        require_user(tx, user)?;
        let sole = communities::solely_owned_by(tx, user)?;
        if !sole.is_empty() {
            return Err(CoreError::SoleOwner(sole.len()));
        }
        q::delete_user(tx, user)?;
        Ok(())
    })?;
    debug!("Deleted account {}", user);
    Ok(())
}
