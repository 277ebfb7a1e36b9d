//! Widget commands invoked by the host page.
//!
//! Commands orchestrate the services against a [`Session`](crate::session::Session).
//! They never fail outright: errors are logged, a rejected token is cleared,
//! and the caller receives a "no result" outcome so the page stays usable.
//! Only [`mount`] can abort, and only on invalid configuration.

pub mod auth;
pub mod comments;
pub mod issue;
pub mod reactions;
pub mod widget;

pub use auth::{complete_login, login, logout};
pub use comments::{add_comment, load_discussions};
pub use issue::{load_issue, IssueView};
pub use reactions::{load_reactions, toggle_reaction};
pub use widget::{mount, Mounted};
