//! View state for the disabled-banner table.
//!
//! Every request gets a monotonically increasing sequence number. A response is
//! applied only if nothing newer has been applied and the query it answered is still
//! the current one; otherwise it is superseded and dropped without a trace.

use tracing::debug;

use crate::error::AppError;
use crate::types::{QuerySpec, ResultPage, SortField, SortOrder};

/// Lifecycle of one request: `Idle -> Requesting -> Applied | Superseded | Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPhase {
    Idle,
    Requesting,
    Applied,
    Superseded,
    Failed(String),
}

/// An issued request. The response must be handed back together with its ticket.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub seq: u64,
    pub spec: QuerySpec,
}

/// What the table area should show right now.
#[derive(Debug, PartialEq)]
pub enum ViewDisplay<'a> {
    /// Nothing applied yet and no error.
    Loading,
    /// Nothing applied yet and the last request failed.
    Unavailable(&'a str),
    /// The filter matches no records.
    Empty(&'a ResultPage),
    /// The filter matches records, but the requested page is past the end.
    OutOfRange(&'a ResultPage),
    Rows(&'a ResultPage),
}

#[derive(Debug)]
pub struct ViewState {
    spec: QuerySpec,
    next_seq: u64,
    latest_issued: Option<u64>,
    applied_seq: Option<u64>,
    phase: QueryPhase,
    page: Option<ResultPage>,
    applied_spec: Option<QuerySpec>,
    error: Option<String>,
}

impl ViewState {
    pub fn new(spec: QuerySpec) -> Self {
        Self {
            spec,
            next_seq: 1,
            latest_issued: None,
            applied_seq: None,
            phase: QueryPhase::Idle,
            page: None,
            applied_spec: None,
            error: None,
        }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Phase of the most recent request as seen by the view. Never `Superseded`.
    pub fn phase(&self) -> &QueryPhase {
        &self.phase
    }

    /// Last applied page. Survives failures.
    pub fn page(&self) -> Option<&ResultPage> {
        self.page.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn display(&self) -> ViewDisplay<'_> {
        match (&self.page, &self.error) {
            (None, Some(e)) => ViewDisplay::Unavailable(e),
            (None, None) => ViewDisplay::Loading,
            (Some(p), _) if p.total_count == 0 => ViewDisplay::Empty(p),
            (Some(p), _) if p.rows.is_empty() => ViewDisplay::OutOfRange(p),
            (Some(p), _) => ViewDisplay::Rows(p),
        }
    }

    /// Re-issue the current query unchanged (timer tick or manual refresh).
    pub fn issue(&mut self) -> Ticket {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_issued = Some(seq);
        self.phase = QueryPhase::Requesting;
        Ticket {
            seq,
            spec: self.spec.clone(),
        }
    }

    /// New account filter: back to page 1 and query immediately. Empty means "all".
    pub fn set_account_filter(&mut self, account: Option<String>) -> Ticket {
        self.spec.account_filter = account.filter(|a| !a.is_empty());
        self.spec.page = 1;
        self.issue()
    }

    /// New sort: back to page 1 and query immediately. Rows are never re-sorted locally,
    /// since the summary is computed over the full set on the server.
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) -> Ticket {
        self.spec.sort_field = field;
        self.spec.sort_order = order;
        self.spec.page = 1;
        self.issue()
    }

    pub fn cycle_sort_field(&mut self) -> Ticket {
        self.set_sort(self.spec.sort_field.next(), self.spec.sort_order)
    }

    pub fn toggle_sort_order(&mut self) -> Ticket {
        self.set_sort(self.spec.sort_field, self.spec.sort_order.toggled())
    }

    /// Jump to `page`, clamped into `[1, total_pages]` of the last applied result.
    /// While that result answered a different filter, sort or page size, only the
    /// lower bound applies. Returns None when the page is the one already requested.
    pub fn set_page(&mut self, page: u32) -> Option<Ticket> {
        let page = match self.known_total_pages() {
            Some(max) => page.clamp(1, max),
            None => page.max(1),
        };
        if page == self.spec.page {
            return None;
        }
        self.spec.page = page;
        Some(self.issue())
    }

    fn known_total_pages(&self) -> Option<u32> {
        let (page, applied) = (self.page.as_ref()?, self.applied_spec.as_ref()?);
        let same_listing = applied.account_filter == self.spec.account_filter
            && applied.sort_field == self.spec.sort_field
            && applied.sort_order == self.spec.sort_order
            && applied.page_size == self.spec.page_size;
        same_listing.then(|| page.total_pages.max(1))
    }

    pub fn next_page(&mut self) -> Option<Ticket> {
        self.set_page(self.spec.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Option<Ticket> {
        self.set_page(self.spec.page.saturating_sub(1))
    }

    /// Merge a response. Returns the phase this request ended in.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<ResultPage, AppError>) -> QueryPhase {
        let newer_applied = self.applied_seq.is_some_and(|applied| applied >= ticket.seq);
        if newer_applied || ticket.spec != self.spec {
            debug!(seq = ticket.seq, applied = ?self.applied_seq, "superseded response dropped");
            return QueryPhase::Superseded;
        }

        let is_latest = self.latest_issued == Some(ticket.seq);
        match result {
            Ok(page) => {
                self.page = Some(page);
                self.applied_seq = Some(ticket.seq);
                self.applied_spec = Some(ticket.spec);
                self.error = None;
                if is_latest {
                    self.phase = QueryPhase::Applied;
                }
                QueryPhase::Applied
            }
            Err(e) => {
                let msg = e.to_string();
                self.error = Some(msg.clone());
                if is_latest {
                    self.phase = QueryPhase::Failed(msg.clone());
                }
                QueryPhase::Failed(msg)
            }
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(QuerySpec::default())
    }
}

/// Account names for the filter selector. Polled on its own cadence.
#[derive(Debug, Default)]
pub struct AccountsState {
    pub accounts: Vec<String>,
    pub error: Option<String>,
}

impl AccountsState {
    /// A failed poll keeps the previous list.
    pub fn apply(&mut self, result: Result<Vec<String>, AppError>) {
        match result {
            Ok(accounts) => {
                self.accounts = accounts;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Selector order: all accounts, then each account in list order, then back to all.
    pub fn next_filter(&self, current: Option<&str>) -> Option<String> {
        let next_idx = match current {
            None => 0,
            Some(c) => match self.accounts.iter().position(|a| a == c) {
                Some(i) => i + 1,
                None => 0,
            },
        };
        self.accounts.get(next_idx).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SummaryStats;

    fn page_for(spec: &QuerySpec, rows: usize, total_count: u64) -> ResultPage {
        let record = crate::types::BannerDisableRecord {
            id: 1,
            banner_id: 1,
            banner_name: None,
            account_name: spec.account_filter.clone(),
            created_at: 0,
            spend: None,
            clicks: 0,
            shows: 0,
            ctr: None,
            conversions: 0,
            roi: None,
            reason: None,
        };
        ResultPage {
            rows: vec![record; rows],
            total_count,
            total_pages: total_count.div_ceil(u64::from(spec.page_size)).max(1) as u32,
            page: spec.page,
            page_size: spec.page_size,
            summary: SummaryStats { total_banners: total_count, ..SummaryStats::default() },
        }
    }

    fn small_pages() -> ViewState {
        ViewState::new(QuerySpec { page_size: 10, ..QuerySpec::default() })
    }

    #[test]
    fn filter_and_sort_changes_reset_to_first_page() {
        let mut view = small_pages();
        let t = view.issue();
        view.resolve(t.clone(), Ok(page_for(&t.spec, 10, 45)));
        let t = view.set_page(3).unwrap();
        assert_eq!(t.spec.page, 3);

        let t = view.set_account_filter(Some("A".to_string()));
        assert_eq!(t.spec.page, 1);
        assert_eq!(t.spec.account_filter.as_deref(), Some("A"));

        view.resolve(t.clone(), Ok(page_for(&t.spec, 10, 45)));
        view.set_page(2).unwrap();
        let t = view.toggle_sort_order();
        assert_eq!(t.spec.page, 1);
        assert_eq!(t.spec.sort_order, SortOrder::Asc);
        let t = view.cycle_sort_field();
        assert_eq!(t.spec.sort_field, SortField::BannerId);
        assert_eq!(t.spec.account_filter.as_deref(), Some("A"));
    }

    #[test]
    fn sequence_numbers_are_monotonic() {
        let mut view = ViewState::default();
        let a = view.issue();
        let b = view.set_account_filter(None);
        let c = view.issue();
        assert!(a.seq < b.seq && b.seq < c.seq);
    }

    #[test]
    fn slow_response_for_an_old_filter_is_superseded() {
        let mut view = ViewState::default();
        let q1 = view.set_account_filter(Some("A".to_string()));
        let q2 = view.set_account_filter(Some("B".to_string()));

        let q2_page = page_for(&q2.spec, 1, 1);
        assert_eq!(view.resolve(q2.clone(), Ok(q2_page.clone())), QueryPhase::Applied);
        assert_eq!(view.resolve(q1.clone(), Ok(page_for(&q1.spec, 3, 3))), QueryPhase::Superseded);

        assert_eq!(view.page(), Some(&q2_page));
        assert_eq!(view.phase(), &QueryPhase::Applied);
    }

    #[test]
    fn old_filter_response_arriving_first_is_still_dropped() {
        let mut view = ViewState::default();
        let q1 = view.set_account_filter(Some("A".to_string()));
        let q2 = view.set_account_filter(Some("B".to_string()));

        assert_eq!(view.resolve(q1.clone(), Ok(page_for(&q1.spec, 3, 3))), QueryPhase::Superseded);
        assert_eq!(view.display(), ViewDisplay::Loading);
        assert_eq!(view.phase(), &QueryPhase::Requesting);

        assert_eq!(view.resolve(q2.clone(), Ok(page_for(&q2.spec, 1, 1))), QueryPhase::Applied);
    }

    #[test]
    fn older_tick_after_newer_tick_applied_is_superseded() {
        let mut view = ViewState::default();
        let tick1 = view.issue();
        let tick2 = view.issue();

        let fresh = page_for(&tick2.spec, 2, 2);
        assert_eq!(view.resolve(tick2, Ok(fresh.clone())), QueryPhase::Applied);
        assert_eq!(view.resolve(tick1.clone(), Ok(page_for(&tick1.spec, 1, 1))), QueryPhase::Superseded);
        assert_eq!(view.page(), Some(&fresh));
    }

    #[test]
    fn older_tick_for_the_same_spec_applies_while_newer_is_in_flight() {
        let mut view = ViewState::default();
        let tick1 = view.issue();
        let _tick2 = view.issue();

        assert_eq!(view.resolve(tick1.clone(), Ok(page_for(&tick1.spec, 1, 1))), QueryPhase::Applied);
        assert!(view.page().is_some());
        // The newest request is still outstanding.
        assert_eq!(view.phase(), &QueryPhase::Requesting);
    }

    #[test]
    fn failure_keeps_the_last_page_visible() {
        let mut view = ViewState::default();
        let t = view.issue();
        let good = page_for(&t.spec, 2, 2);
        view.resolve(t, Ok(good.clone()));

        let t = view.issue();
        let outcome = view.resolve(t, Err(AppError::Config("timeout".to_string())));
        assert!(matches!(outcome, QueryPhase::Failed(_)));
        assert!(matches!(view.phase(), QueryPhase::Failed(_)));
        assert_eq!(view.page(), Some(&good));
        assert!(view.error().is_some());
        assert_eq!(view.display(), ViewDisplay::Rows(&good));

        let t = view.issue();
        view.resolve(t.clone(), Ok(page_for(&t.spec, 2, 2)));
        assert!(view.error().is_none());
    }

    #[test]
    fn failure_before_any_data_is_unavailable_not_loading() {
        let mut view = ViewState::default();
        assert_eq!(view.display(), ViewDisplay::Loading);
        let t = view.issue();
        view.resolve(t, Err(AppError::Config("connection refused".to_string())));
        assert!(matches!(view.display(), ViewDisplay::Unavailable(_)));
    }

    #[test]
    fn empty_result_and_out_of_range_page_are_distinct() {
        let mut view = ViewState::default();
        let t = view.issue();
        view.resolve(t.clone(), Ok(page_for(&t.spec, 0, 0)));
        assert!(matches!(view.display(), ViewDisplay::Empty(_)));

        let t = view.issue();
        view.resolve(t.clone(), Ok(page_for(&t.spec, 0, 12)));
        assert!(matches!(view.display(), ViewDisplay::OutOfRange(_)));
    }

    #[test]
    fn page_changes_clamp_to_known_total_pages() {
        let mut view = small_pages();
        let t = view.issue();
        view.resolve(t.clone(), Ok(page_for(&t.spec, 10, 25)));
        assert_eq!(view.set_page(99).map(|t| t.spec.page), Some(3));
        assert!(view.next_page().is_none());
        assert_eq!(view.prev_page().map(|t| t.spec.page), Some(2));
        assert_eq!(view.set_page(0).map(|t| t.spec.page), Some(1));
        assert!(view.prev_page().is_none());
    }

    #[test]
    fn result_for_a_previous_filter_does_not_bound_paging() {
        let mut view = small_pages();
        let t = view.issue();
        // The unfiltered listing has a single page.
        view.resolve(t.clone(), Ok(page_for(&t.spec, 5, 5)));
        assert!(view.next_page().is_none());

        // New filter in flight: the old single-page result must not block paging.
        view.set_account_filter(Some("A".to_string()));
        let t = view.next_page().unwrap();
        assert_eq!(t.spec.page, 2);
        assert_eq!(view.set_page(0).map(|t| t.spec.page), Some(1));

        // Once the filtered result lands, its page count bounds paging again.
        let t = view.issue();
        view.resolve(t.clone(), Ok(page_for(&t.spec, 10, 15)));
        assert_eq!(view.set_page(40).map(|t| t.spec.page), Some(2));
        assert!(view.next_page().is_none());
    }

    #[test]
    fn paging_before_any_result_is_only_bounded_below() {
        let mut view = small_pages();
        assert_eq!(view.next_page().map(|t| t.spec.page), Some(2));
        assert_eq!(view.prev_page().map(|t| t.spec.page), Some(1));
        assert!(view.prev_page().is_none());
    }

    #[test]
    fn out_of_range_page_clamps_on_next_interaction() {
        let mut view = ViewState::new(QuerySpec { page: 7, page_size: 10, ..QuerySpec::default() });
        let t = view.issue();
        view.resolve(t.clone(), Ok(page_for(&t.spec, 0, 25)));
        assert!(matches!(view.display(), ViewDisplay::OutOfRange(_)));
        assert_eq!(view.prev_page().map(|t| t.spec.page), Some(3));
    }

    #[test]
    fn account_selector_cycles_through_all() {
        let mut accounts = AccountsState::default();
        accounts.apply(Ok(vec!["A".to_string(), "B".to_string()]));

        assert_eq!(accounts.next_filter(None).as_deref(), Some("A"));
        assert_eq!(accounts.next_filter(Some("A")).as_deref(), Some("B"));
        assert_eq!(accounts.next_filter(Some("B")), None);
        assert_eq!(accounts.next_filter(Some("gone")).as_deref(), Some("A"));

        accounts.apply(Err(AppError::Config("down".to_string())));
        assert_eq!(accounts.accounts.len(), 2);
        assert!(accounts.error.is_some());
    }
}
