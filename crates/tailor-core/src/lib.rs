//! Core domain of Tailor: sessions, their capture from the history log, and the
//! interpreter seam.

pub mod command_filter;
pub mod config;
pub mod decoder;
pub mod error;
pub mod history;
pub mod interpreter;
pub mod session;
pub mod timestamp;

pub use error::{Result, TailorError};
