//! memzone REST API: authorizer, namespace bindings, operation handlers.

pub mod auth;
pub mod batch;
pub mod bindings;
pub mod config;
pub mod error;
pub mod extract;
pub mod server;

pub use auth::Authorizer;
pub use bindings::{BindingError, MemoryBindings};
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use server::{router, AppState};
