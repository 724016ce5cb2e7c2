//! Primitive reads and writes over a `&Connection`.
//!
//! Each function does one thing to one table (or one join). They take a
//! plain connection so callers can compose several of them inside a single
//! `Database::transaction`.

pub mod communities;
pub mod friends;
pub mod notifications;
pub mod outings;
pub mod posts;
pub mod users;

use anyhow::Result;
use rusqlite::{Connection, Params};

pub(crate) fn exists<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<bool> {
    let found: bool = conn.query_row(&format!("SELECT EXISTS({sql})"), params, |row| row.get(0))?;
    Ok(found)
}

pub(crate) fn count<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<usize> {
    let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(n as usize)
}
