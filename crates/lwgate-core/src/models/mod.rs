//! Shared data models for the gateway core

mod content;
mod event;
mod operation;
mod status;
mod uri;

pub use content::*;
pub use event::*;
pub use operation::*;
pub use status::*;
pub use uri::*;
