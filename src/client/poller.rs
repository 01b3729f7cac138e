use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::client::api_client::ApiClient;
use crate::client::view_state::{AccountsState, QueryPhase, Ticket, ViewState};
use crate::error::Result;
use crate::types::{QuerySpec, ResultPage};

/// Where the dashboard gets its data from.
pub trait DataSource: Clone + Send + Sync + 'static {
    fn fetch_page(&self, spec: QuerySpec) -> impl Future<Output = Result<ResultPage>> + Send;
    fn fetch_accounts(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}

impl DataSource for ApiClient {
    async fn fetch_page(&self, spec: QuerySpec) -> Result<ResultPage> {
        ApiClient::fetch_page(self, &spec).await
    }

    async fn fetch_accounts(&self) -> Result<Vec<String>> {
        ApiClient::fetch_accounts(self).await
    }
}

/// Completed requests flowing back to the task that owns the view state.
#[derive(Debug)]
pub enum PollEvent {
    Page { ticket: Ticket, result: Result<ResultPage> },
    Accounts(Result<Vec<String>>),
}

/// Owns the view state and fires requests. All merging happens on the caller's task
/// via [`Dashboard::handle`]; requests run detached and are never aborted.
pub struct Dashboard<S> {
    source: S,
    events_tx: mpsc::Sender<PollEvent>,
    pub view: ViewState,
    pub accounts: AccountsState,
}

impl<S: DataSource> Dashboard<S> {
    pub fn new(source: S, events_tx: mpsc::Sender<PollEvent>, spec: QuerySpec) -> Self {
        Self {
            source,
            events_tx,
            view: ViewState::new(spec),
            accounts: AccountsState::default(),
        }
    }

    /// Timer tick or manual refresh: re-issue the current query.
    pub fn refresh(&mut self) {
        let ticket = self.view.issue();
        self.dispatch(ticket);
    }

    pub fn set_account_filter(&mut self, account: Option<String>) {
        let ticket = self.view.set_account_filter(account);
        self.dispatch(ticket);
    }

    pub fn cycle_account_filter(&mut self) {
        let next = self.accounts.next_filter(self.view.spec().effective_account());
        self.set_account_filter(next);
    }

    pub fn cycle_sort_field(&mut self) {
        let ticket = self.view.cycle_sort_field();
        self.dispatch(ticket);
    }

    pub fn toggle_sort_order(&mut self) {
        let ticket = self.view.toggle_sort_order();
        self.dispatch(ticket);
    }

    pub fn next_page(&mut self) {
        if let Some(ticket) = self.view.next_page() {
            self.dispatch(ticket);
        }
    }

    pub fn prev_page(&mut self) {
        if let Some(ticket) = self.view.prev_page() {
            self.dispatch(ticket);
        }
    }

    /// Merge one completed request. Returns the page request's final phase, if it was one.
    pub fn handle(&mut self, event: PollEvent) -> Option<QueryPhase> {
        match event {
            PollEvent::Page { ticket, result } => {
                let phase = self.view.resolve(ticket, result);
                if let QueryPhase::Failed(e) = &phase {
                    warn!("disabled query failed: {e}");
                }
                Some(phase)
            }
            PollEvent::Accounts(result) => {
                if let Err(e) = &result {
                    warn!("account list poll failed: {e}");
                }
                self.accounts.apply(result);
                None
            }
        }
    }

    fn dispatch(&self, ticket: Ticket) {
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_page(ticket.spec.clone()).await;
            // Receiver gone means the dashboard shut down.
            let _ = tx.send(PollEvent::Page { ticket, result }).await;
        });
    }
}

/// Poll the account list on its own cadence. Shares nothing with the page query except
/// the event channel, so a slow or failing account list never delays the table.
pub fn spawn_accounts_poller<S: DataSource>(
    source: S,
    events_tx: mpsc::Sender<PollEvent>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let result = source.fetch_accounts().await;
            if events_tx.send(PollEvent::Accounts(result)).await.is_err() {
                break;
            }
        }
    })
}
