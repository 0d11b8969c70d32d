//! Repack search index.
//!
//! A single worker task owns the index and answers commands in arrival
//! order. Callers hold a [`RepackIndexHandle`]; each request carries its own
//! reply channel and build notifications are broadcast to subscribers.

mod handle;
mod index;
mod normalize;
mod state;
mod types;
mod worker;

pub use handle::*;
pub use index::TitleIndex;
pub use normalize::format_name;
pub use state::IndexState;
pub use types::*;
pub use worker::*;
