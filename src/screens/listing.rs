use super::{Effect, Ticket};
use crate::error::FetchError;
use crate::format::format_asset;
use crate::router::Route;
use crate::sources::PAGE_SIZE;
use crate::types::{Asset, DisplayAsset};
use chrono::Utc;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: Ticket,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageFailure {
    pub offset: u64,
    pub reason: String,
}

/// Slot for a page that has been requested. Pages are appended in request
/// order, so a finished page waits here until every page before it is done.
struct InFlight {
    request: PageRequest,
    ready: Option<Vec<DisplayAsset>>,
}

pub struct ListingScreen {
    mount: u64,
    next_seq: u64,
    offset: u64,
    entries: Vec<DisplayAsset>,
    in_flight: VecDeque<InFlight>,
    failures: VecDeque<PageFailure>,
}

impl ListingScreen {
    /// Creates the screen and the request for the first page.
    pub fn mount(mount: u64) -> (Self, PageRequest) {
        let mut screen = Self {
            mount,
            next_seq: 0,
            offset: 0,
            entries: Vec::new(),
            in_flight: VecDeque::new(),
            failures: VecDeque::new(),
        };
        let request = screen.request(0);
        (screen, request)
    }

    pub fn entries(&self) -> &[DisplayAsset] {
        &self.entries
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Pages that failed and have not been retried, oldest first.
    pub fn failures(&self) -> impl Iterator<Item = &PageFailure> {
        self.failures.iter()
    }

    /// Advances the cursor by one page and asks for it.
    pub fn load_more(&mut self) -> PageRequest {
        self.offset += PAGE_SIZE;
        info!("Loading more assets from offset {}", self.offset);
        self.request(self.offset)
    }

    /// Re-requests every failed page, oldest first, without moving the cursor.
    pub fn retry(&mut self) -> Vec<PageRequest> {
        let offsets: Vec<u64> = self.failures.drain(..).map(|f| f.offset).collect();
        offsets
            .into_iter()
            .map(|offset| {
                info!("Retrying assets at offset {}", offset);
                self.request(offset)
            })
            .collect()
    }

    /// Search text is used verbatim as the detail identifier.
    pub fn submit_search(&self, input: &str) -> Option<Route> {
        if input.is_empty() {
            return None;
        }
        Some(Route::Detail(input.to_string()))
    }

    /// Accepts a 1-based row number or the identifier of a listed asset.
    pub fn open(&self, selector: &str) -> Option<Route> {
        let by_row = selector
            .parse::<usize>()
            .ok()
            .and_then(|row| row.checked_sub(1))
            .and_then(|index| self.entries.get(index));
        let entry = by_row.or_else(|| self.entries.iter().find(|e| e.asset.id == selector))?;
        Some(Route::Detail(entry.asset.id.clone()))
    }

    pub fn apply(
        &mut self,
        request: PageRequest,
        result: Result<Vec<Asset>, FetchError>,
    ) -> Effect {
        if request.ticket.mount != self.mount {
            debug!("dropping page for offset {} from an old mount", request.offset);
            return Effect::Ignored;
        }
        let Some(index) = self
            .in_flight
            .iter()
            .position(|slot| slot.request == request)
        else {
            debug!("dropping unknown page request {:?}", request);
            return Effect::Ignored;
        };

        match result {
            Ok(assets) => {
                let fetched_at = Utc::now();
                let page = assets
                    .into_iter()
                    .map(|asset| format_asset(asset, fetched_at))
                    .collect::<Vec<_>>();
                info!("Fetched {} asset(s) at offset {}", page.len(), request.offset);
                self.failures.retain(|f| f.offset != request.offset);
                self.in_flight[index].ready = Some(page);
            }
            Err(e) => {
                warn!("Loading assets at offset {} failed: {}", request.offset, e);
                self.failures.retain(|f| f.offset != request.offset);
                self.failures.push_back(PageFailure {
                    offset: request.offset,
                    reason: e.to_string(),
                });
                self.in_flight.remove(index);
            }
        }

        while self.in_flight.front().is_some_and(|slot| slot.ready.is_some()) {
            if let Some(page) = self.in_flight.pop_front().and_then(|slot| slot.ready) {
                self.entries.extend(page);
            }
        }
        Effect::Render
    }

    fn request(&mut self, offset: u64) -> PageRequest {
        let request = PageRequest {
            ticket: Ticket {
                mount: self.mount,
                seq: self.next_seq,
            },
            offset,
        };
        self.next_seq += 1;
        self.in_flight.push_back(InFlight {
            request,
            ready: None,
        });
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(prefix: &str, count: usize) -> Vec<Asset> {
        (0..count)
            .map(|i| Asset {
                id: format!("{prefix}-{i}"),
                name: format!("{prefix} {i}"),
                symbol: format!("{}{i}", prefix.to_uppercase()),
                rank: Some((i + 1).to_string()),
                supply: None,
                max_supply: None,
                market_cap_usd: Some("1000000".to_string()),
                volume_usd24_hr: Some("2500".to_string()),
                price_usd: Some("1.5".to_string()),
                change_percent24_hr: Some("-0.25".to_string()),
                vwap24_hr: None,
                explorer: None,
            })
            .collect()
    }

    fn ids(screen: &ListingScreen) -> Vec<String> {
        screen.entries().iter().map(|e| e.asset.id.clone()).collect()
    }

    #[test]
    fn test_mount_requests_first_page() {
        let (screen, request) = ListingScreen::mount(7);
        assert_eq!(request.offset, 0);
        assert_eq!(request.ticket, Ticket { mount: 7, seq: 0 });
        assert!(screen.entries().is_empty());
    }

    #[test]
    fn test_load_more_appends_second_page() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 10)));
        let before = screen.entries().to_vec();

        let second = screen.load_more();
        assert_eq!(second.offset, 10);
        assert_eq!(screen.offset(), 10);
        assert_eq!(screen.apply(second, Ok(page("b", 10))), Effect::Render);

        assert_eq!(screen.entries().len(), 20);
        assert_eq!(&screen.entries()[..10], &before[..]);
        assert_eq!(screen.entries()[10].asset.id, "b-0");
    }

    #[test]
    fn test_offset_advances_by_page_size() {
        let (mut screen, _) = ListingScreen::mount(1);
        assert_eq!(screen.load_more().offset, 10);
        assert_eq!(screen.load_more().offset, 20);
        assert_eq!(screen.load_more().offset, 30);
    }

    #[test]
    fn test_repeated_ids_are_kept() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 2)));
        let second = screen.load_more();
        screen.apply(second, Ok(page("a", 2)));
        assert_eq!(ids(&screen), vec!["a-0", "a-1", "a-0", "a-1"]);
    }

    #[test]
    fn test_empty_page_is_a_no_op() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 3)));
        let past_end = screen.load_more();
        assert_eq!(screen.apply(past_end, Ok(Vec::new())), Effect::Render);
        assert_eq!(screen.entries().len(), 3);
        assert_eq!(screen.failures().count(), 0);
    }

    #[test]
    fn test_pages_append_in_request_order() {
        let (mut screen, first) = ListingScreen::mount(1);
        let second = screen.load_more();
        let third = screen.load_more();

        screen.apply(third, Ok(page("c", 1)));
        screen.apply(second, Ok(page("b", 1)));
        assert!(screen.entries().is_empty());

        screen.apply(first, Ok(page("a", 1)));
        assert_eq!(ids(&screen), vec!["a-0", "b-0", "c-0"]);
    }

    #[test]
    fn test_failed_page_keeps_list_and_enables_retry() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 10)));
        let second = screen.load_more();
        screen.apply(second, Err(FetchError::Upstream("rate limited".to_string())));

        assert_eq!(screen.entries().len(), 10);
        let failure = screen.failures().next().cloned().unwrap();
        assert_eq!(failure.offset, 10);
        assert!(failure.reason.contains("rate limited"));

        let mut retry = screen.retry();
        assert_eq!(retry.len(), 1);
        assert_eq!(retry[0].offset, 10);
        assert_eq!(screen.offset(), 10);
        assert_eq!(screen.failures().count(), 0);

        screen.apply(retry.remove(0), Ok(page("b", 10)));
        assert_eq!(screen.entries().len(), 20);
    }

    #[test]
    fn test_every_failed_page_is_retried_oldest_first() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 1)));
        let second = screen.load_more();
        let third = screen.load_more();
        screen.apply(second, Err(FetchError::Upstream("boom".to_string())));
        screen.apply(third, Err(FetchError::Upstream("boom".to_string())));

        let offsets: Vec<u64> = screen.failures().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![10, 20]);

        let retries = screen.retry();
        assert_eq!(retries.iter().map(|r| r.offset).collect::<Vec<_>>(), vec![10, 20]);
        assert_eq!(screen.failures().count(), 0);
        assert!(screen.retry().is_empty());

        screen.apply(retries[1], Ok(page("c", 1)));
        screen.apply(retries[0], Ok(page("b", 1)));
        assert_eq!(ids(&screen), vec!["a-0", "b-0", "c-0"]);
    }

    #[test]
    fn test_failed_page_is_recorded_once_per_offset() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Err(FetchError::Upstream("boom".to_string())));
        let retry = screen.retry();
        screen.apply(retry[0], Err(FetchError::Upstream("again".to_string())));
        let failures: Vec<&PageFailure> = screen.failures().collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].reason.contains("again"));
    }

    #[test]
    fn test_failed_page_does_not_block_later_pages() {
        let (mut screen, first) = ListingScreen::mount(1);
        let second = screen.load_more();
        screen.apply(second, Ok(page("b", 1)));
        screen.apply(first, Err(FetchError::Upstream("boom".to_string())));
        assert_eq!(ids(&screen), vec!["b-0"]);
    }

    #[test]
    fn test_retry_without_failure_does_nothing() {
        let (mut screen, _) = ListingScreen::mount(1);
        assert!(screen.retry().is_empty());
    }

    #[test]
    fn test_stale_mount_is_ignored() {
        let (mut screen, _) = ListingScreen::mount(2);
        let stale = PageRequest {
            ticket: Ticket { mount: 1, seq: 0 },
            offset: 0,
        };
        assert_eq!(screen.apply(stale, Ok(page("x", 5))), Effect::Ignored);
        assert!(screen.entries().is_empty());
    }

    #[test]
    fn test_duplicate_completion_is_ignored() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 1)));
        assert_eq!(screen.apply(first, Ok(page("a", 1))), Effect::Ignored);
        assert_eq!(screen.entries().len(), 1);
    }

    #[test]
    fn test_submit_search() {
        let (screen, _) = ListingScreen::mount(1);
        assert_eq!(
            screen.submit_search("bitcoin"),
            Some(Route::Detail("bitcoin".to_string()))
        );
        assert_eq!(
            screen.submit_search(" Bitcoin "),
            Some(Route::Detail(" Bitcoin ".to_string()))
        );
        assert_eq!(screen.submit_search(""), None);
    }

    #[test]
    fn test_open_by_row_or_id() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 3)));
        assert_eq!(screen.open("2"), Some(Route::Detail("a-1".to_string())));
        assert_eq!(screen.open("a-2"), Some(Route::Detail("a-2".to_string())));
        assert_eq!(screen.open("0"), None);
        assert_eq!(screen.open("9"), None);
        assert_eq!(screen.open("bitcoin"), None);
    }

    #[test]
    fn test_entries_are_formatted() {
        let (mut screen, first) = ListingScreen::mount(1);
        screen.apply(first, Ok(page("a", 1)));
        let entry = &screen.entries()[0];
        assert_eq!(entry.formatted_price, "$1.50");
        assert_eq!(entry.formatted_market, "$1M");
        assert_eq!(entry.formatted_volume, "$2.5K");
    }
}
