//! Polling client: keeps a view of the disabled-banner table fresh without letting
//! out-of-order responses overwrite newer ones.

pub mod api_client;
pub mod poller;
pub mod view_state;

pub use api_client::ApiClient;
pub use poller::{spawn_accounts_poller, Dashboard, DataSource, PollEvent};
pub use view_state::{AccountsState, QueryPhase, Ticket, ViewDisplay, ViewState};
