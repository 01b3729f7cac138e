use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::health::HealthState;
use crate::api::latency::{LatencySnapshot, QueryLatency};
use crate::db::RecordStore;
use crate::error::AppError;
use crate::query::evaluate;
use crate::types::{AccountList, NewDisableRecord, QueryParams, ResultPage};

#[derive(Clone)]
pub struct ApiState {
    pub store: RecordStore,
    pub writer_tx: mpsc::Sender<NewDisableRecord>,
    pub health: Arc<HealthState>,
    pub latency: Arc<QueryLatency>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/disabled", get(get_disabled).post(post_disabled))
        .route("/accounts", get(get_accounts))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub records_written: u64,
    pub write_queue_pending: u64,
    pub last_record_at_ms: Option<i64>,
    pub query_p99_us: Option<u64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_disabled(
    State(state): State<ApiState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<ResultPage>, AppError> {
    let started = Instant::now();
    let spec = params.into_spec()?;

    let snapshot = state.store.snapshot(spec.effective_account()).await?;
    let page = evaluate(snapshot, &spec);

    state.latency.record(started.elapsed());
    debug!(
        account = spec.effective_account().unwrap_or("*"),
        sort = %spec.sort_field,
        order = %spec.sort_order,
        page = spec.page,
        total = page.total_count,
        "disabled query served in {:?}",
        started.elapsed(),
    );

    Ok(Json(page))
}

async fn post_disabled(
    State(state): State<ApiState>,
    Json(rec): Json<NewDisableRecord>,
) -> Result<StatusCode, AppError> {
    if rec.clicks < 0 || rec.shows < 0 || rec.conversions < 0 {
        return Err(AppError::BadRequest(
            "clicks, shows and conversions must be non-negative".to_string(),
        ));
    }
    if rec.spend.is_some_and(|v| v < 0.0) || rec.ctr.is_some_and(|v| v < 0.0) {
        return Err(AppError::BadRequest("spend and ctr must be non-negative".to_string()));
    }

    state.health.inc_write_queue_pending();
    if state.writer_tx.try_send(rec).is_err() {
        state.health.dec_write_queue_pending();
        return Err(AppError::QueueFull);
    }
    Ok(StatusCode::ACCEPTED)
}

async fn get_accounts(State(state): State<ApiState>) -> Result<Json<AccountList>, AppError> {
    let accounts = state.store.accounts().await?;
    Ok(Json(AccountList { accounts }))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        records_written: state.health.records_written(),
        write_queue_pending: state.health.write_queue_pending(),
        last_record_at_ms: state.health.last_record_at_ms(),
        query_p99_us: state.latency.p99_us(),
    })
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencySnapshot> {
    Json(state.latency.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::Request;
    use tower::ServiceExt; // for `oneshot`

    use crate::db::store::tests::{memory_store, new_record};

    async fn seeded_state() -> (ApiState, mpsc::Receiver<NewDisableRecord>) {
        let store = memory_store().await;
        for (banner_id, account, spend) in [
            (1, "A", 10.0),
            (2, "A", 20.0),
            (3, "A", 30.0),
            (4, "B", 5.0),
        ] {
            let rec = new_record(banner_id, Some(account), Some(spend));
            store.insert(&rec, rec.created_at.unwrap_or(0), None).await.unwrap();
        }
        let (writer_tx, writer_rx) = mpsc::channel(1);
        let state = ApiState {
            store,
            writer_tx,
            health: Arc::new(HealthState::new()),
            latency: Arc::new(QueryLatency::new()),
        };
        (state, writer_rx)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn filtered_sorted_page_with_full_set_summary() {
        let (state, _rx) = seeded_state().await;
        let (status, json) = get_json(
            router(state),
            "/disabled?account_filter=A&sort_field=spend&sort_order=desc&page=1&page_size=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let page: ResultPage = serde_json::from_value(json).unwrap();
        let spends: Vec<_> = page.rows.iter().map(|r| r.spend).collect();
        assert_eq!(spends, vec![Some(30.0), Some(20.0)]);
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 2);
        assert!((page.summary.total_spend - 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn repeated_query_is_byte_identical() {
        let (state, _rx) = seeded_state().await;
        let app = router(state);
        let uri = "/disabled?sort_field=clicks&sort_order=asc";
        let (_, first) = get_json(app.clone(), uri).await;
        let (_, second) = get_json(app, uri).await;
        assert_eq!(first.to_string(), second.to_string());
    }

    #[tokio::test]
    async fn out_of_range_page_is_not_an_error() {
        let (state, _rx) = seeded_state().await;
        let (status, json) = get_json(router(state), "/disabled?page=9&page_size=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["disabled"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["total"], 4);
        assert_eq!(json["total_pages"], 2);
    }

    #[tokio::test]
    async fn invalid_params_are_bad_requests() {
        let (state, _rx) = seeded_state().await;
        let app = router(state);
        let (status, _) = get_json(app.clone(), "/disabled?page=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get_json(app, "/disabled?sort_field=name").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn accounts_endpoint_lists_distinct_names() {
        let (state, _rx) = seeded_state().await;
        let (status, json) = get_json(router(state), "/accounts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({ "accounts": ["A", "B"] }));
    }

    #[tokio::test]
    async fn ingest_queues_until_the_channel_is_full() {
        let (state, mut rx) = seeded_state().await;
        let health = Arc::clone(&state.health);
        let app = router(state);

        let post = |body: serde_json::Value| {
            Request::builder()
                .method("POST")
                .uri("/disabled")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap()
        };
        let rec = serde_json::json!({ "banner_id": 77, "account_name": "C", "clicks": 1, "shows": 10 });

        let resp = app.clone().oneshot(post(rec.clone())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(health.write_queue_pending(), 1);

        // Capacity is 1 and nothing drains it.
        let resp = app.clone().oneshot(post(rec)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health.write_queue_pending(), 1);

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.banner_id, 77);
        assert_eq!(queued.account_name.as_deref(), Some("C"));

        let negative = serde_json::json!({ "banner_id": 78, "clicks": -1 });
        let resp = app.oneshot(post(negative)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn negative_spend_or_ctr_is_rejected_before_queueing() {
        let (state, mut rx) = seeded_state().await;
        let health = Arc::clone(&state.health);
        let app = router(state);

        for body in [
            serde_json::json!({ "banner_id": 80, "spend": -0.5 }),
            serde_json::json!({ "banner_id": 81, "ctr": -1.0 }),
        ] {
            let req = Request::builder()
                .method("POST")
                .uri("/disabled")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(health.write_queue_pending(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn latency_is_recorded_per_query() {
        let (state, _rx) = seeded_state().await;
        let app = router(state);
        get_json(app.clone(), "/disabled").await;
        let (_, json) = get_json(app.clone(), "/stats/latency").await;
        assert_eq!(json["sample_count"], 1);
        let (_, health) = get_json(app, "/health").await;
        assert!(health["query_p99_us"].as_u64().is_some());
    }
}
