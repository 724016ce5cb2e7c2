use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{CommentRow, PostRow, opt_uuid_col, time_col, uuid_col};

const POST_COLUMNS: &str = "p.id, p.owner_id, p.community_id, p.body, p.created_at";

/// Which kind of thing a comment hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Post,
    Outing,
}

impl CommentTarget {
    fn table(self) -> &'static str {
        match self {
            Self::Post => "post_comments",
            Self::Outing => "outing_comments",
        }
    }

    fn parent_column(self) -> &'static str {
        match self {
            Self::Post => "post_id",
            Self::Outing => "outing_id",
        }
    }
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: uuid_col(row, 0)?,
        owner_id: uuid_col(row, 1)?,
        community_id: opt_uuid_col(row, 2)?,
        body: row.get(3)?,
        created_at: time_col(row, 4)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: uuid_col(row, 0)?,
        parent_id: uuid_col(row, 1)?,
        author_id: uuid_col(row, 2)?,
        body: row.get(3)?,
        created_at: time_col(row, 4)?,
    })
}

fn collect_posts(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<PostRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, map_post)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// -- Posts --

pub fn insert_post(
    conn: &Connection,
    id: Uuid,
    owner: Uuid,
    community: Option<Uuid>,
    body: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (id, owner_id, community_id, body) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            id.to_string(),
            owner.to_string(),
            community.map(|c| c.to_string()),
            body
        ],
    )?;
    Ok(())
}

pub fn post_by_id(conn: &Connection, id: Uuid) -> Result<Option<PostRow>> {
    let row = conn
        .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?1"),
            [id.to_string()],
            map_post,
        )
        .optional()?;
    Ok(row)
}

pub fn delete_post(conn: &Connection, id: Uuid) -> Result<usize> {
    let n = conn.execute("DELETE FROM posts WHERE id = ?1", [id.to_string()])?;
    Ok(n)
}

/// Everything `viewer` can see, newest first: their own posts, personal
/// posts of mutual friends, and posts in communities they belong to.
pub fn feed(conn: &Connection, viewer: Uuid, limit: u32) -> Result<Vec<PostRow>> {
    collect_posts(
        conn,
        &format!(
            "SELECT {POST_COLUMNS} FROM posts p
             WHERE p.owner_id = ?1
                OR (p.community_id IS NULL
                    AND EXISTS (SELECT 1 FROM friends f WHERE f.user_id = ?1 AND f.friend_id = p.owner_id)
                    AND EXISTS (SELECT 1 FROM friends f WHERE f.user_id = p.owner_id AND f.friend_id = ?1))
                OR (p.community_id IS NOT NULL
                    AND EXISTS (SELECT 1 FROM community_members m
                                WHERE m.community_id = p.community_id AND m.user_id = ?1))
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?2"
        ),
        rusqlite::params![viewer.to_string(), limit],
    )
}

/// Posts by `owner` that `viewer` may see, newest first. Filtering happens
/// before the limit, so a run of hidden posts never crowds out visible ones.
pub fn visible_posts_by_owner(
    conn: &Connection,
    viewer: Uuid,
    owner: Uuid,
    limit: u32,
) -> Result<Vec<PostRow>> {
    collect_posts(
        conn,
        &format!(
            "SELECT {POST_COLUMNS} FROM posts p
             WHERE p.owner_id = ?2
               AND (?1 = ?2
                    OR (p.community_id IS NULL
                        AND EXISTS (SELECT 1 FROM friends f WHERE f.user_id = ?1 AND f.friend_id = ?2)
                        AND EXISTS (SELECT 1 FROM friends f WHERE f.user_id = ?2 AND f.friend_id = ?1))
                    OR (p.community_id IS NOT NULL
                        AND EXISTS (SELECT 1 FROM community_members m
                                    WHERE m.community_id = p.community_id AND m.user_id = ?1)))
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?3"
        ),
        rusqlite::params![viewer.to_string(), owner.to_string(), limit],
    )
}

pub fn posts_in_community(conn: &Connection, community: Uuid, limit: u32) -> Result<Vec<PostRow>> {
    collect_posts(
        conn,
        &format!(
            "SELECT {POST_COLUMNS} FROM posts p
             WHERE p.community_id = ?1
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?2"
        ),
        rusqlite::params![community.to_string(), limit],
    )
}

// -- Likes --

pub fn has_liked(conn: &Connection, post: Uuid, user: Uuid) -> Result<bool> {
    super::exists(
        conn,
        "SELECT 1 FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
        [post.to_string(), user.to_string()],
    )
}

pub fn insert_like(conn: &Connection, post: Uuid, user: Uuid) -> Result<()> {
    conn.execute(
        "INSERT INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
        [post.to_string(), user.to_string()],
    )?;
    Ok(())
}

pub fn delete_like(conn: &Connection, post: Uuid, user: Uuid) -> Result<usize> {
    let n = conn.execute(
        "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
        [post.to_string(), user.to_string()],
    )?;
    Ok(n)
}

pub fn like_count(conn: &Connection, post: Uuid) -> Result<usize> {
    super::count(
        conn,
        "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1",
        [post.to_string()],
    )
}

// -- Comments --

pub fn insert_comment(
    conn: &Connection,
    target: CommentTarget,
    id: Uuid,
    parent: Uuid,
    author: Uuid,
    body: &str,
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (id, {}, author_id, body) VALUES (?1, ?2, ?3, ?4)",
            target.table(),
            target.parent_column()
        ),
        rusqlite::params![id.to_string(), parent.to_string(), author.to_string(), body],
    )?;
    Ok(())
}

pub fn comment_by_id(conn: &Connection, target: CommentTarget, id: Uuid) -> Result<Option<CommentRow>> {
    let row = conn
        .query_row(
            &format!(
                "SELECT id, {}, author_id, body, created_at FROM {} WHERE id = ?1",
                target.parent_column(),
                target.table()
            ),
            [id.to_string()],
            map_comment,
        )
        .optional()?;
    Ok(row)
}

/// Comments on `parent`, oldest first.
pub fn comments(conn: &Connection, target: CommentTarget, parent: Uuid) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {col}, author_id, body, created_at FROM {table}
         WHERE {col} = ?1
         ORDER BY created_at, rowid",
        col = target.parent_column(),
        table = target.table()
    ))?;
    let rows = stmt
        .query_map([parent.to_string()], map_comment)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn comment_count(conn: &Connection, target: CommentTarget, parent: Uuid) -> Result<usize> {
    super::count(
        conn,
        &format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            target.table(),
            target.parent_column()
        ),
        [parent.to_string()],
    )
}

pub fn delete_comment(conn: &Connection, target: CommentTarget, id: Uuid) -> Result<usize> {
    let n = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", target.table()),
        [id.to_string()],
    )?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::queries::communities::{self, Roster};
    use crate::queries::friends;
    use crate::test_support::new_user;

    #[test]
    fn test_feed_visibility() {
        let db = Database::open_in_memory().unwrap();
        let me = new_user(&db, "me", "1");
        let friend = new_user(&db, "friend", "2");
        let stranger = new_user(&db, "stranger", "3");
        let club = Uuid::new_v4();
        let other_club = Uuid::new_v4();

        db.with_conn(|conn| {
            friends::insert_friendship(conn, me, friend)?;
            communities::insert_community(conn, club, "club", "", true, false)?;
            communities::insert_community(conn, other_club, "other", "", true, false)?;
            communities::add_to_roster(conn, Roster::Members, club, me)?;

            let mine = Uuid::new_v4();
            let friends_post = Uuid::new_v4();
            let strangers_post = Uuid::new_v4();
            let club_post = Uuid::new_v4();
            let friend_in_other_club = Uuid::new_v4();
            insert_post(conn, mine, me, None, "mine")?;
            insert_post(conn, friends_post, friend, None, "friend")?;
            insert_post(conn, strangers_post, stranger, None, "stranger")?;
            insert_post(conn, club_post, stranger, Some(club), "club")?;
            insert_post(conn, friend_in_other_club, friend, Some(other_club), "other")?;

            let mut seen: Vec<Uuid> = feed(conn, me, 50)?.iter().map(|p| p.id).collect();
            seen.sort();
            let mut expected = vec![mine, friends_post, club_post];
            expected.sort();
            assert_eq!(seen, expected);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn test_owner_posts_filtered_before_limit() {
        let db = Database::open_in_memory().unwrap();
        let author = new_user(&db, "author", "1");
        let friend = new_user(&db, "friend", "2");
        let club = Uuid::new_v4();
        let personal = Uuid::new_v4();

        db.with_conn(|conn| {
            friends::insert_friendship(conn, author, friend)?;
            communities::insert_community(conn, club, "club", "", false, false)?;
            communities::add_to_roster(conn, Roster::Members, club, author)?;
            insert_post(conn, personal, author, None, "for friends")?;
            for i in 0..5 {
                insert_post(conn, Uuid::new_v4(), author, Some(club), &format!("club {i}"))?;
            }

            let seen = visible_posts_by_owner(conn, friend, author, 3)?;
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].id, personal);
            assert_eq!(visible_posts_by_owner(conn, author, author, 3)?.len(), 3);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn test_comment_tables_are_separate() {
        let db = Database::open_in_memory().unwrap();
        let me = new_user(&db, "me", "1");
        let post = Uuid::new_v4();

        db.with_conn(|conn| {
            insert_post(conn, post, me, None, "hello")?;
            let c = Uuid::new_v4();
            insert_comment(conn, CommentTarget::Post, c, post, me, "first")?;
            assert_eq!(comment_count(conn, CommentTarget::Post, post)?, 1);
            assert!(comment_by_id(conn, CommentTarget::Outing, c)?.is_none());
            assert_eq!(comments(conn, CommentTarget::Post, post)?[0].body, "first");

            delete_post(conn, post)?;
            assert!(comment_by_id(conn, CommentTarget::Post, c)?.is_none());
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn test_duplicate_like_rejected() {
        let db = Database::open_in_memory().unwrap();
        let me = new_user(&db, "me", "1");
        let post = Uuid::new_v4();

        db.with_conn(|conn| {
            insert_post(conn, post, me, None, "hello")?;
            insert_like(conn, post, me)?;
            assert!(insert_like(conn, post, me).is_err());
            assert_eq!(like_count(conn, post)?, 1);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }
}
