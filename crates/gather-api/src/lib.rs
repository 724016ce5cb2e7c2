//! HTTP surface for Gather: JSON handlers over `gather-core`, bearer-token
//! auth, and the `{success, msg, ...data}` response envelope.

pub mod auth;
pub mod communities;
pub mod error;
pub mod friends;
pub mod middleware;
pub mod notifications;
pub mod outings;
pub mod posts;
pub mod routes;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
