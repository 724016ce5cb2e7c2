use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::Database;
use crate::models::{UserRow, time_col, uuid_col};

/// Column list matching `map_user`, for any query aliasing `users` as `u`.
pub const USER_COLUMNS: &str = "u.id, u.username, u.email, u.country_code, u.phone_number, \
     u.password, u.display_name, u.profile_picture, u.created_at";

pub struct NewUser<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub country_code: &'a str,
    pub phone_number: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
}

pub fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: uuid_col(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        country_code: row.get(3)?,
        phone_number: row.get(4)?,
        password: row.get(5)?,
        display_name: row.get(6)?,
        profile_picture: row.get(7)?,
        created_at: time_col(row, 8)?,
    })
}

pub fn insert_user(conn: &Connection, user: &NewUser<'_>) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, country_code, phone_number, password, display_name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user.id.to_string(),
            user.username,
            user.email,
            user.country_code,
            user.phone_number,
            user.password_hash,
            user.display_name,
        ],
    )?;
    Ok(())
}

pub fn user_by_id(conn: &Connection, id: Uuid) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
            [id.to_string()],
            map_user,
        )
        .optional()?;
    Ok(row)
}

pub fn user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1"),
            [username],
            map_user,
        )
        .optional()?;
    Ok(row)
}

pub fn user_exists(conn: &Connection, id: Uuid) -> Result<bool> {
    super::exists(conn, "SELECT 1 FROM users WHERE id = ?1", [id.to_string()])
}

pub fn username_taken(conn: &Connection, username: &str) -> Result<bool> {
    super::exists(conn, "SELECT 1 FROM users WHERE username = ?1", [username])
}

pub fn email_taken(conn: &Connection, email: &str) -> Result<bool> {
    super::exists(conn, "SELECT 1 FROM users WHERE email = ?1", [email])
}

pub fn phone_taken(conn: &Connection, country_code: &str, phone_number: &str) -> Result<bool> {
    super::exists(
        conn,
        "SELECT 1 FROM users WHERE country_code = ?1 AND phone_number = ?2",
        [country_code, phone_number],
    )
}

pub fn update_profile(
    conn: &Connection,
    id: Uuid,
    display_name: Option<&str>,
    profile_picture: Option<&str>,
) -> Result<usize> {
    let n = conn.execute(
        "UPDATE users
         SET display_name = COALESCE(?2, display_name),
             profile_picture = COALESCE(?3, profile_picture)
         WHERE id = ?1",
        rusqlite::params![id.to_string(), display_name, profile_picture],
    )?;
    Ok(n)
}

/// Username prefix search. `%` and `_` in the query are matched literally.
pub fn search_users(conn: &Connection, prefix: &str, limit: u32) -> Result<Vec<UserRow>> {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users u
         WHERE u.username LIKE ?1 || '%' ESCAPE '\\'
         ORDER BY u.username
         LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![escaped, limit], map_user)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Removes the user. Foreign keys cascade to every edge and piece of
/// content that references them.
pub fn delete_user(conn: &Connection, id: Uuid) -> Result<usize> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", [id.to_string()])?;
    Ok(n)
}

impl Database {
    pub fn create_user(&self, user: &NewUser<'_>) -> Result<()> {
        self.with_conn(|conn| insert_user(conn, user))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_id(conn, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::new_user;

    #[test]
    fn test_create_and_fetch_user() {
        let db = Database::open_in_memory().unwrap();
        let id = new_user(&db, "alice", "5550001");

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, id);
        assert_eq!(by_name.email, "alice@example.com");

        let by_id = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert!(db.get_user_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_phone_pair_is_unique() {
        let db = Database::open_in_memory().unwrap();
        new_user(&db, "alice", "5550001");

        db.with_conn(|conn| {
            assert!(phone_taken(conn, "+1", "5550001")?);
            assert!(!phone_taken(conn, "+44", "5550001")?);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();

        let dup = db.create_user(&NewUser {
            id: Uuid::new_v4(),
            username: "bob",
            email: "bob@example.com",
            country_code: "+1",
            phone_number: "5550001",
            password_hash: "hash",
            display_name: "Bob",
        });
        assert!(dup.is_err());
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let db = Database::open_in_memory().unwrap();
        new_user(&db, "al_ice", "5550001");
        new_user(&db, "alfred", "5550002");
        new_user(&db, "bob", "5550003");

        let hits = db.with_conn(|conn| search_users(conn, "al", 10)).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = db.with_conn(|conn| search_users(conn, "al_", 10)).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "al_ice");
    }

    #[test]
    fn test_update_profile_keeps_unset_fields() {
        let db = Database::open_in_memory().unwrap();
        let id = new_user(&db, "alice", "5550001");

        db.with_conn(|conn| update_profile(conn, id, None, Some("pics/alice.png")))
            .unwrap();
        let user = db.get_user_by_id(id).unwrap().unwrap();
        assert_eq!(user.display_name, "alice");
        assert_eq!(user.profile_picture.as_deref(), Some("pics/alice.png"));
    }
}
