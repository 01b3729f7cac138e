use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::api::health::HealthState;
use crate::db::store::RecordStore;
use crate::error::Result;
use crate::query::ctr_percent;
use crate::types::NewDisableRecord;

/// Receives disable events from the ingest endpoint and appends them to SQLite.
/// Runs as a dedicated background task so a slow insert never stalls the API.
pub struct RecordWriter {
    store: RecordStore,
    record_rx: mpsc::Receiver<NewDisableRecord>,
    health: Arc<HealthState>,
}

impl RecordWriter {
    pub fn new(
        store: RecordStore,
        record_rx: mpsc::Receiver<NewDisableRecord>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { store, record_rx, health }
    }

    pub async fn run(mut self) {
        while let Some(rec) = self.record_rx.recv().await {
            self.health.dec_write_queue_pending();
            if let Err(e) = self.write_record(&rec).await {
                error!(banner_id = rec.banner_id, "DB write error: {e}");
            }
        }
    }

    async fn write_record(&self, rec: &NewDisableRecord) -> Result<()> {
        let created_at = rec.created_at.unwrap_or_else(now_ms);
        // Derive CTR only when the workflow didn't send one and it is computable.
        let ctr = rec
            .ctr
            .or_else(|| (rec.shows > 0).then(|| ctr_percent(rec.clicks, rec.shows)));

        let id = self.store.insert(rec, created_at, ctr).await?;
        self.health.record_written(created_at);

        debug!(
            event = "RECORD_WRITTEN",
            id,
            banner_id = rec.banner_id,
            account = rec.account_name.as_deref().unwrap_or("-"),
            "disabled banner {} stored as #{id}",
            rec.banner_id,
        );
        Ok(())
    }
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
