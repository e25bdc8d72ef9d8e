//! Session domain module.
//!
//! # Module Structure
//!
//! - `name`, `tag`, `description`: validated value objects
//! - `model`: stored documents (`SessionData`, `CommandEntry`, ...)
//! - `tracker`: the live session recorder (`SessionTracker`)
//! - `repository`: repository trait for session persistence

mod description;
mod model;
mod name;
mod repository;
mod tag;
mod tracker;

pub use description::{deserialize_optional as deserialize_optional_description, SessionDescription};
pub use model::{
    max_order, CommandEntry, SessionData, SessionMetadata, SessionStats, SessionSummary,
    VariableSnapshot,
};
pub use name::SessionName;
pub use repository::{SessionEnvironment, SessionRepository};
pub use tag::{SessionTag, SessionTags};
pub use tracker::SessionTracker;
