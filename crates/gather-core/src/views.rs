//! Row-to-API-model projections.

use gather_db::models::{CommentRow, CommunityRow, NotificationRow, OutingRow, PollRow, PostRow, UserRow};
use gather_db::queries::communities::{self, Roster};
use gather_db::queries::outings::{self, Rsvp};
use gather_db::queries::posts::{self, CommentTarget};
use gather_db::queries::users;
use gather_types::models::{
    Comment, Community, Notification, Outing, Poll, PollOption, Post, UserSummary,
};
use rusqlite::Connection;
use tracing::warn;
use uuid::Uuid;

use crate::error::{CoreError, Result};

pub fn user_summary(row: &UserRow) -> UserSummary {
    UserSummary {
        id: row.id,
        username: row.username.clone(),
        display_name: row.display_name.clone(),
        profile_picture: row.profile_picture.clone(),
    }
}

pub fn user_summaries(rows: &[UserRow]) -> Vec<UserSummary> {
    rows.iter().map(user_summary).collect()
}

fn summary_by_id(conn: &Connection, id: Uuid) -> Result<UserSummary> {
    users::user_by_id(conn, id)?
        .map(|row| user_summary(&row))
        .ok_or(CoreError::NotFound("user"))
}

pub fn community(conn: &Connection, row: CommunityRow) -> Result<Community> {
    Ok(Community {
        owner_ids: communities::roster_ids(conn, Roster::Owners, row.id)?,
        member_count: communities::roster_count(conn, Roster::Members, row.id)?,
        id: row.id,
        name: row.name,
        description: row.description,
        is_open: row.is_open,
        is_hidden: row.is_hidden,
        created_at: row.created_at,
    })
}

pub fn communities(conn: &Connection, rows: Vec<CommunityRow>) -> Result<Vec<Community>> {
    rows.into_iter().map(|row| community(conn, row)).collect()
}

pub fn post(conn: &Connection, viewer: Uuid, row: PostRow) -> Result<Post> {
    Ok(Post {
        owner: summary_by_id(conn, row.owner_id)?,
        like_count: posts::like_count(conn, row.id)?,
        comment_count: posts::comment_count(conn, CommentTarget::Post, row.id)?,
        liked_by_viewer: posts::has_liked(conn, row.id, viewer)?,
        id: row.id,
        community_id: row.community_id,
        body: row.body,
        created_at: row.created_at,
    })
}

pub fn comment(conn: &Connection, row: CommentRow) -> Result<Comment> {
    Ok(Comment {
        author: summary_by_id(conn, row.author_id)?,
        id: row.id,
        parent_id: row.parent_id,
        body: row.body,
        created_at: row.created_at,
    })
}

pub fn comments(conn: &Connection, rows: Vec<CommentRow>) -> Result<Vec<Comment>> {
    rows.into_iter().map(|row| comment(conn, row)).collect()
}

pub fn outing(conn: &Connection, row: OutingRow) -> Result<Outing> {
    Ok(Outing {
        attendee_count: outings::rsvp_count(conn, Rsvp::Attending, row.id)?,
        interested_count: outings::rsvp_count(conn, Rsvp::Interested, row.id)?,
        id: row.id,
        community_id: row.community_id,
        owner_id: row.owner_id,
        title: row.title,
        description: row.description,
        location: row.location,
        starts_at: row.starts_at,
        created_at: row.created_at,
    })
}

pub fn poll(conn: &Connection, row: PollRow) -> Result<Poll> {
    let options = outings::poll_options(conn, row.id)?
        .into_iter()
        .map(|o| PollOption {
            id: o.id,
            label: o.label,
            votes: o.votes,
        })
        .collect();
    Ok(Poll {
        id: row.id,
        outing_id: row.outing_id,
        question: row.question,
        created_by: row.created_by,
        options,
        created_at: row.created_at,
    })
}

/// Rows with a kind this build doesn't know are skipped rather than
/// failing the whole list.
pub fn notifications(rows: Vec<NotificationRow>) -> Vec<Notification> {
    rows.into_iter()
        .filter_map(|row| match row.kind.parse() {
            Ok(kind) => Some(Notification {
                id: row.id,
                kind,
                actor_id: row.actor_id,
                entity_id: row.entity_id,
                read: row.read,
                created_at: row.created_at,
            }),
            Err(e) => {
                warn!("Skipping notification {}: {}", row.id, e);
                None
            }
        })
        .collect()
}
