use gather_db::Database;
use gather_db::models::PostRow;
use gather_db::queries::posts::{self as q, CommentTarget};
use gather_types::models::{Comment, Membership, Post};
use rusqlite::Connection;
use tracing::debug;
use uuid::Uuid;

use crate::access::{self, Standing, ensure};
use crate::accounts::require_user;
use crate::error::{CoreError, Result};
use crate::membership::membership_of;
use crate::relationships::check_friends;
use crate::validate::{self, MAX_BODY_CHARS};
use crate::views;

const FEED_LIMIT: u32 = 100;

/// Resolves the facts `access::can_view_post` needs for `viewer`.
fn standing(conn: &Connection, viewer: Uuid, post: &PostRow) -> Result<Standing> {
    if viewer == post.owner_id {
        return Ok(Standing::stranger());
    }
    let membership = match post.community_id {
        Some(community) => membership_of(conn, viewer, community)?,
        None => Membership::NonMember,
    };
    Ok(Standing {
        friends_with_owner: check_friends(conn, viewer, post.owner_id)?,
        membership,
    })
}

fn load_post(conn: &Connection, id: Uuid) -> Result<PostRow> {
    q::post_by_id(conn, id)?.ok_or(CoreError::NotFound("post"))
}

/// Loads a post `viewer` may see.
fn viewable_post(conn: &Connection, viewer: Uuid, id: Uuid) -> Result<PostRow> {
    let post = load_post(conn, id)?;
    let standing = standing(conn, viewer, &post)?;
    ensure(
        access::can_view_post(viewer, &post, &standing),
        CoreError::Forbidden("you cannot see this post"),
    )?;
    Ok(post)
}

pub fn create_post(db: &Database, owner: Uuid, body: &str, community: Option<Uuid>) -> Result<Post> {
    let body = validate::text("body", body, 1, MAX_BODY_CHARS)?;
    let id = Uuid::new_v4();

    let post = db.transaction(|tx| {
        require_user(tx, owner)?;
        if let Some(community) = community {
            let (_, membership) = crate::membership::visible_community(tx, owner, community)?;
            ensure(
                access::can_post_in_community(membership),
                CoreError::Forbidden("only members can post in a community"),
            )?;
        }
        q::insert_post(tx, id, owner, community, body)?;
        views::post(tx, owner, load_post(tx, id)?)
    })?;
    debug!("{} created post {}", owner, id);
    Ok(post)
}

pub fn get_post(db: &Database, viewer: Uuid, id: Uuid) -> Result<Post> {
    db.with_conn(|conn| {
        let post = viewable_post(conn, viewer, id)?;
        views::post(conn, viewer, post)
    })
}

/// The viewer's own posts, their friends' personal posts and posts in
/// their communities, newest first.
pub fn feed(db: &Database, viewer: Uuid) -> Result<Vec<Post>> {
    db.with_conn(|conn| {
        q::feed(conn, viewer, FEED_LIMIT)?
            .into_iter()
            .map(|row| views::post(conn, viewer, row))
            .collect()
    })
}

/// Posts by `author` that `viewer` is allowed to see.
pub fn user_posts(db: &Database, viewer: Uuid, author: Uuid) -> Result<Vec<Post>> {
    db.with_conn(|conn| {
        require_user(conn, author)?;
        q::visible_posts_by_owner(conn, viewer, author, FEED_LIMIT)?
            .into_iter()
            .map(|row| views::post(conn, viewer, row))
            .collect()
    })
}

pub fn community_posts(db: &Database, viewer: Uuid, community: Uuid) -> Result<Vec<Post>> {
    db.with_conn(|conn| {
        let (_, membership) = crate::membership::visible_community(conn, viewer, community)?;
        ensure(
            membership.is_member(),
            CoreError::Forbidden("only members can read community posts"),
        )?;
        q::posts_in_community(conn, community, FEED_LIMIT)?
            .into_iter()
            .map(|row| views::post(conn, viewer, row))
            .collect()
    })
}

pub fn delete_post(db: &Database, actor: Uuid, id: Uuid) -> Result<()> {
    db.transaction(|tx| {
        let post = load_post(tx, id)?;
        ensure(
            access::can_modify_post(actor, &post),
            CoreError::Forbidden("only the author can delete a post"),
        )?;
        q::delete_post(tx, id)?;
        Ok::<_, CoreError>(())
    })?;
    debug!("{} deleted post {}", actor, id);
    Ok(())
}

/// Returns the new like count.
pub fn like_post(db: &Database, user: Uuid, id: Uuid) -> Result<usize> {
    db.transaction(|tx| {
        let post = load_post(tx, id)?;
        let standing = standing(tx, user, &post)?;
        ensure(
            access::can_interact_with_post(user, &post, &standing),
            CoreError::Forbidden("you cannot see this post"),
        )?;
        if q::has_liked(tx, id, user)? {
            return Err(CoreError::Conflict("already liked"));
        }
        q::insert_like(tx, id, user)?;
        Ok(q::like_count(tx, id)?)
    })
}

/// Returns the new like count.
pub fn unlike_post(db: &Database, user: Uuid, id: Uuid) -> Result<usize> {
    db.transaction(|tx| {
        load_post(tx, id)?;
        if q::delete_like(tx, id, user)? == 0 {
            return Err(CoreError::NotFound("like"));
        }
        Ok(q::like_count(tx, id)?)
    })
}

pub fn comment_post(db: &Database, user: Uuid, id: Uuid, body: &str) -> Result<Comment> {
    let body = validate::text("body", body, 1, MAX_BODY_CHARS)?;
    let comment_id = Uuid::new_v4();
    db.transaction(|tx| {
        let post = load_post(tx, id)?;
        let standing = standing(tx, user, &post)?;
        ensure(
            access::can_interact_with_post(user, &post, &standing),
            CoreError::Forbidden("you cannot see this post"),
        )?;
        q::insert_comment(tx, CommentTarget::Post, comment_id, id, user, body)?;
        let row = q::comment_by_id(tx, CommentTarget::Post, comment_id)?
            .ok_or(CoreError::NotFound("comment"))?;
        views::comment(tx, row)
    })
}

pub fn list_comments(db: &Database, viewer: Uuid, id: Uuid) -> Result<Vec<Comment>> {
    db.with_conn(|conn| {
        viewable_post(conn, viewer, id)?;
        let rows = q::comments(conn, CommentTarget::Post, id)?;
        views::comments(conn, rows)
    })
}

/// The comment's author or the post's owner may remove it.
pub fn delete_comment(db: &Database, actor: Uuid, comment: Uuid) -> Result<()> {
    db.transaction(|tx| {
        let row = q::comment_by_id(tx, CommentTarget::Post, comment)?
            .ok_or(CoreError::NotFound("comment"))?;
        let post = load_post(tx, row.parent_id)?;
        ensure(
            access::can_delete_comment(actor, &row, post.owner_id),
            CoreError::Forbidden("you cannot delete this comment"),
        )?;
        q::delete_comment(tx, CommentTarget::Post, comment)?;
        Ok::<_, CoreError>(())
    })
}
