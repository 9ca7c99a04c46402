pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_for_drafts, connect_with_settings, DbPool};
pub use repositories::{RepositoryError, SqlDraftStore, StoredDraft};
