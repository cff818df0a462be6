use crate::error::FetchError;
use crate::router::Route;
use crate::screens::{DetailRequest, DetailScreen, Effect, ListingScreen, PageRequest};
use crate::sources::{AssetSource, PAGE_SIZE};
use crate::types::{Asset, AssetResponse};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub enum Screen {
    Listing(ListingScreen),
    Detail(DetailScreen),
}

impl Screen {
    pub fn route(&self) -> Route {
        match self {
            Screen::Listing(_) => Route::Listing,
            Screen::Detail(screen) => Route::Detail(screen.id().to_string()),
        }
    }
}

/// A finished fetch on its way back to the screen that asked for it.
pub enum Completion {
    Page(PageRequest, Result<Vec<Asset>, FetchError>),
    Detail(DetailRequest, Result<AssetResponse, FetchError>),
}

/// A line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    More,
    Retry,
    Search(String),
    Open(String),
    Back,
    Help,
    Quit,
}

impl Command {
    /// Leading whitespace is ignored. Search text after `/` or `search ` is
    /// kept verbatim.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim_start();
        if let Some(text) = line.strip_prefix('/') {
            return Ok(Command::Search(text.to_string()));
        }
        if let Some(text) = line.strip_prefix("search ") {
            return Ok(Command::Search(text.to_string()));
        }
        let (word, rest) = line
            .trim()
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line.trim(), ""));
        match (word, rest) {
            ("more" | "m", "") => Ok(Command::More),
            ("retry" | "r", "") => Ok(Command::Retry),
            ("search", "") => Ok(Command::Search(String::new())),
            ("open" | "o", selector) if !selector.is_empty() => {
                Ok(Command::Open(selector.to_string()))
            }
            ("back" | "b", "") => Ok(Command::Back),
            ("help" | "h" | "?", "") => Ok(Command::Help),
            ("quit" | "q" | "exit", "") => Ok(Command::Quit),
            _ => Err(format!("unknown command '{}' (type `help`)", line.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the mounted screen and routes fetch completions back into it.
/// Everything runs on the caller's task; fetches are spawned and report
/// through a channel.
pub struct App {
    source: Arc<dyn AssetSource>,
    screen: Screen,
    mounts: u64,
    in_flight: usize,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl App {
    /// Mounts `route` and starts its first fetch. Must be called inside a
    /// tokio runtime.
    pub fn new(source: Arc<dyn AssetSource>, route: Route) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        // Placeholder until `mount` runs; its request is never sent.
        let (placeholder, _) = ListingScreen::mount(0);
        let mut app = Self {
            source,
            screen: Screen::Listing(placeholder),
            mounts: 0,
            in_flight: 0,
            tx,
            rx,
        };
        app.mount(route);
        app
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn route(&self) -> Route {
        self.screen.route()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    pub fn navigate(&mut self, route: Route) {
        if route == self.route() {
            return;
        }
        info!("Navigating to {}", route);
        match route {
            // The detail view stays mounted and just switches identifier.
            Route::Detail(id) => match &mut self.screen {
                Screen::Detail(screen) => {
                    if let Some(request) = screen.set_identifier(id) {
                        self.dispatch_detail(request);
                    }
                }
                Screen::Listing(_) => self.mount(Route::Detail(id)),
            },
            Route::Listing => self.mount(Route::Listing),
        }
    }

    pub fn execute(&mut self, command: Command) -> Flow {
        match command {
            Command::Quit => return Flow::Quit,
            Command::Back => self.navigate(Route::Listing),
            Command::Search(text) => {
                let route = match &self.screen {
                    Screen::Listing(screen) => screen.submit_search(&text),
                    // No search form on the detail view; same rule applies.
                    Screen::Detail(_) if !text.is_empty() => Some(Route::Detail(text)),
                    Screen::Detail(_) => None,
                };
                if let Some(route) = route {
                    self.navigate(route);
                }
            }
            Command::More => {
                if let Screen::Listing(screen) = &mut self.screen {
                    let request = screen.load_more();
                    self.dispatch_page(request);
                }
            }
            Command::Retry => {
                if let Screen::Listing(screen) = &mut self.screen {
                    for request in screen.retry() {
                        self.dispatch_page(request);
                    }
                }
            }
            Command::Open(selector) => {
                if let Screen::Listing(screen) = &self.screen {
                    match screen.open(&selector) {
                        Some(route) => self.navigate(route),
                        None => debug!("no listed asset matches '{}'", selector),
                    }
                }
            }
            Command::Help => {}
        }
        Flow::Continue
    }

    /// Waits for the next fetch to finish. Never resolves while nothing is in
    /// flight.
    pub async fn next_completion(&mut self) -> Completion {
        if self.in_flight == 0 {
            std::future::pending::<()>().await;
        }
        // `self.tx` keeps the channel open, so `recv` only yields `Some`.
        loop {
            if let Some(completion) = self.rx.recv().await {
                self.in_flight -= 1;
                return completion;
            }
        }
    }

    /// Applies a completion. Returns whether the view changed.
    pub fn apply(&mut self, completion: Completion) -> bool {
        let effect = match (&mut self.screen, completion) {
            (Screen::Listing(screen), Completion::Page(request, result)) => {
                screen.apply(request, result)
            }
            (Screen::Detail(screen), Completion::Detail(request, result)) => {
                screen.apply(request, result)
            }
            _ => {
                debug!("dropping completion for a screen that is no longer mounted");
                Effect::Ignored
            }
        };
        match effect {
            Effect::Ignored => false,
            Effect::Render => true,
            Effect::Navigate(route) => {
                self.navigate(route);
                true
            }
        }
    }

    /// Applies completions until nothing is in flight.
    pub async fn settle(&mut self) {
        while !self.is_idle() {
            let completion = self.next_completion().await;
            self.apply(completion);
        }
    }

    fn mount(&mut self, route: Route) {
        self.mounts += 1;
        match route {
            Route::Listing => {
                let (screen, request) = ListingScreen::mount(self.mounts);
                self.screen = Screen::Listing(screen);
                self.dispatch_page(request);
            }
            Route::Detail(id) => {
                let (screen, request) = DetailScreen::mount(self.mounts, id);
                self.screen = Screen::Detail(screen);
                self.dispatch_detail(request);
            }
        }
    }

    fn dispatch_page(&mut self, request: PageRequest) {
        self.in_flight += 1;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.list(PAGE_SIZE, request.offset).await;
            // The receiver lives as long as the app.
            let _ = tx.send(Completion::Page(request, result));
        });
    }

    fn dispatch_detail(&mut self, request: DetailRequest) {
        self.in_flight += 1;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.detail(&request.id).await;
            let _ = tx.send(Completion::Detail(request, result));
        });
    }
}
