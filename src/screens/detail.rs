use super::{Effect, Ticket};
use crate::error::FetchError;
use crate::format::format_asset;
use crate::router::Route;
use crate::types::{AssetResponse, DisplayAsset};
use chrono::Utc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(Box<DisplayAsset>),
    /// A failure sent the user back to the listing; nothing more is shown.
    Redirecting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub ticket: Ticket,
    pub id: String,
}

pub struct DetailScreen {
    mount: u64,
    next_seq: u64,
    id: String,
    state: DetailState,
}

impl DetailScreen {
    pub fn mount(mount: u64, id: String) -> (Self, DetailRequest) {
        let mut screen = Self {
            mount,
            next_seq: 0,
            id: String::new(),
            state: DetailState::Loading,
        };
        let request = screen.start(id);
        (screen, request)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    /// Switches to another identifier. Returns `None` when it is the one
    /// already shown.
    pub fn set_identifier(&mut self, id: String) -> Option<DetailRequest> {
        if id == self.id {
            return None;
        }
        Some(self.start(id))
    }

    /// Applies a completed fetch. Only the latest request counts; older
    /// completions are dropped even if they arrive last.
    pub fn apply(
        &mut self,
        request: DetailRequest,
        result: Result<AssetResponse, FetchError>,
    ) -> Effect {
        let latest = self.next_seq.checked_sub(1);
        if request.ticket.mount != self.mount || Some(request.ticket.seq) != latest {
            debug!("dropping superseded detail response for '{}'", request.id);
            return Effect::Ignored;
        }
        if self.state != DetailState::Loading {
            return Effect::Ignored;
        }

        match result {
            Ok(AssetResponse::Data(asset)) => {
                info!("Loaded details for '{}'", asset.id);
                self.state = DetailState::Loaded(Box::new(format_asset(asset, Utc::now())));
                Effect::Render
            }
            Ok(AssetResponse::Error(message)) => {
                warn!("CoinCap rejected '{}': {}", request.id, message);
                self.redirect()
            }
            Err(e) => {
                warn!("Fetching '{}' failed: {}", request.id, e);
                self.redirect()
            }
        }
    }

    fn redirect(&mut self) -> Effect {
        self.state = DetailState::Redirecting;
        Effect::Navigate(Route::Listing)
    }

    fn start(&mut self, id: String) -> DetailRequest {
        info!("Loading details for '{}'", id);
        self.id = id.clone();
        self.state = DetailState::Loading;
        let ticket = Ticket {
            mount: self.mount,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        DetailRequest { ticket, id }
    }
}
