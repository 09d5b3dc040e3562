//! # recipebook-store
//!
//! Recipe storage for the Recipebook application.
//!
//! [`RecipeStore`] mirrors the user's recipes from a remote
//! [`DocumentStore`] through a standing subscription and merges them with
//! the built-in seed catalog. Mutations go to the remote first and reach
//! the local cache only once acknowledged. The [`query`] module filters and
//! orders recipe lists for display.

pub mod cache;
pub mod config;
pub mod events;
pub mod memory;
pub mod query;
pub mod remote;
pub mod seed;
pub mod store;

mod error;

pub use config::StoreConfig;
pub use error::{IdentityError, NetworkError, Result, StoreError};
pub use events::{StoreEvent, StoreSnapshot};
pub use memory::MemoryDocumentStore;
pub use query::{CategoryFilter, RecipeQuery};
pub use remote::{ChangeBatch, DocumentStore, RemoteError};
pub use seed::SeedCategory;
pub use store::RecipeStore;
