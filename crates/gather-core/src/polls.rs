use std::collections::HashSet;

use gather_db::Database;
use gather_db::queries::outings as q;
use gather_types::models::Poll;
use tracing::debug;
use uuid::Uuid;

use crate::access::{self, ensure};
use crate::error::{CoreError, Result};
use crate::outings::{load_outing, viewable_outing};
use crate::{validate, views};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

/// Trims the options and rejects blanks, case-insensitive duplicates and
/// counts outside `MIN_OPTIONS..=MAX_OPTIONS`.
fn clean_options(options: &[String]) -> Result<Vec<&str>> {
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(CoreError::InvalidArgument(format!(
            "a poll needs between {MIN_OPTIONS} and {MAX_OPTIONS} options"
        )));
    }
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(options.len());
    for option in options {
        let label = validate::text("option", option, 1, 100)?;
        if !seen.insert(label.to_lowercase()) {
            return Err(CoreError::InvalidArgument(format!(
                "duplicate option '{label}'"
            )));
        }
        cleaned.push(label);
    }
    Ok(cleaned)
}

pub fn create_poll(
    db: &Database,
    user: Uuid,
    outing: Uuid,
    question: &str,
    options: &[String],
) -> Result<Poll> {
    let question = validate::text("question", question, 1, 200)?;
    let options = clean_options(options)?;
    let id = Uuid::new_v4();

    let poll = db.transaction(|tx| {
        let (_, membership) = load_outing(tx, user, outing)?;
        ensure(
            access::can_comment_outing(membership),
            CoreError::Forbidden("only community members can start a poll"),
        )?;
        q::insert_poll(tx, id, outing, question, user)?;
        for (position, label) in options.iter().enumerate() {
            q::insert_poll_option(tx, Uuid::new_v4(), id, label, position)?;
        }
        let row = q::poll_by_id(tx, id)?.ok_or(CoreError::NotFound("poll"))?;
        views::poll(tx, row)
    })?;
    debug!("{} started poll {} on outing {}", user, id, outing);
    Ok(poll)
}

/// One vote per user per poll; votes are final.
pub fn vote(db: &Database, user: Uuid, poll: Uuid, option: Uuid) -> Result<Poll> {
    db.transaction(|tx| {
        let row = q::poll_by_id(tx, poll)?.ok_or(CoreError::NotFound("poll"))?;
        let (_, membership) = load_outing(tx, user, row.outing_id)?;
        ensure(
            access::can_attend_outing(membership),
            CoreError::Forbidden("only community members can vote"),
        )?;
        if !q::poll_options(tx, poll)?.iter().any(|o| o.id == option) {
            return Err(CoreError::NotFound("poll option"));
        }
        if q::has_voted(tx, poll, user)? {
            return Err(CoreError::AlreadyVoted);
        }
        q::insert_vote(tx, poll, option, user)?;
        views::poll(tx, row)
    })
}

pub fn poll_results(db: &Database, viewer: Uuid, poll: Uuid) -> Result<Poll> {
    db.with_conn(|conn| {
        let row = q::poll_by_id(conn, poll)?.ok_or(CoreError::NotFound("poll"))?;
        viewable_outing(conn, viewer, row.outing_id)?;
        views::poll(conn, row)
    })
}

pub fn list_polls(db: &Database, viewer: Uuid, outing: Uuid) -> Result<Vec<Poll>> {
    db.with_conn(|conn| {
        viewable_outing(conn, viewer, outing)?;
        q::polls_for_outing(conn, outing)?
            .into_iter()
            .map(|row| views::poll(conn, row))
            .collect()
    })
}
