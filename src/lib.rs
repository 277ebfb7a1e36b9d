//! BeBlob - GitLab issue comments for any web page.
//!
//! This is the engine behind the embeddable comment widget: it maps the
//! hosting page to a GitLab issue, runs the OAuth login, and manages the
//! issue's comments and reactions. Rendering is left to the host.

pub mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod session;

pub use commands::{mount, IssueView, Mounted};
pub use error::AppError;
pub use models::{Config, IssueMappingStrategy, ReactionName};
pub use session::Session;
