pub mod detail;
pub mod listing;

pub use detail::{DetailRequest, DetailScreen, DetailState};
pub use listing::{ListingScreen, PageRequest};

use crate::router::Route;

/// Identifies one fetch: the screen mount that issued it and its sequence
/// number within that mount. Completions whose ticket no longer matches the
/// live screen are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub mount: u64,
    pub seq: u64,
}

/// What the caller should do after a completion has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Ignored,
    Render,
    Navigate(Route),
}
