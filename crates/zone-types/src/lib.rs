//! Core types and traits for the memzone KV memory API.
//!
//! The envelope and request shapes here are the wire format shared by the
//! server (`zone-api`) and the remote client (`zone-client`).

mod dto;
mod envelope;
mod traits;

pub use dto::*;
pub use envelope::*;
pub use traits::*;
