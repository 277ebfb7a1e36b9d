//! Business logic services.
//!
//! This module contains the core logic for talking to GitLab: URL building,
//! configuration parsing, token persistence, the OAuth flow, issue resolution
//! and reaction toggling.
//!
//! Services are independent of any particular host; the page and the storage
//! are reached through the [`Page`] and [`KeyValueStore`] traits.

pub mod config_resolver;
pub mod gitlab_client;
pub mod issue_resolver;
pub mod oauth;
pub mod page;
pub mod reactions;
pub mod token_store;
pub mod urls;

pub use config_resolver::{resolve_config, AttributeSource};
pub use gitlab_client::GitLabClient;
pub use issue_resolver::IssueResolver;
pub use oauth::{AuthState, CallbackOutcome, CallbackParams, OAuthFlow};
pub use page::{Page, StaticPage};
pub use reactions::{ReactionApi, ReactionEngine};
pub use token_store::{KeyValueStore, KeyringStore, MemoryStore, TokenStore};
