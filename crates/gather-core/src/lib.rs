//! Relationship, membership and access-control rules for Gather.
//!
//! Every operation takes the shared [`Database`](gather_db::Database) and the
//! acting user's id, checks permissions with the predicates in [`access`],
//! and performs all of its writes inside one transaction.

pub mod access;
pub mod accounts;
pub mod error;
pub mod membership;
pub mod notifications;
pub mod outings;
pub mod polls;
pub mod posts;
pub mod relationships;
pub mod repair;
mod validate;
mod views;

pub use error::{CoreError, ErrorKind, Result};
