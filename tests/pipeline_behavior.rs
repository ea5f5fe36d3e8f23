//! End-to-end behavior of the sync and TA-metrics jobs: idempotence,
//! per-symbol failure isolation, retry of transient provider errors,
//! validation rejection, and the run deadline.

use std::sync::Arc;
use std::time::Duration;

use stockpulse_core::{FmpAdapter, HttpClient, HttpRequest, HttpResponse, RetryConfig};
use stockpulse_pipeline::{SymbolStatus, SyncJob, TaMetricsJob};
use stockpulse_tests::{
    bars_from_closes, config_for, temp_warehouse, ProviderScript, ScriptedProvider,
};

fn wavy_closes(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 100.0 + 12.0 * ((i as f64) * 0.2).sin() + 0.05 * i as f64)
        .collect()
}

#[tokio::test]
async fn sync_and_metrics_are_idempotent_over_unchanged_history() {
    let (_guard, warehouse) = temp_warehouse();
    let provider = Arc::new(ScriptedProvider::new(vec![(
        "AAPL",
        ProviderScript::Bars(bars_from_closes(&wavy_closes(60))),
    )]));
    let config = config_for(&["AAPL"]);

    let sync = SyncJob::new(provider.clone(), warehouse.clone(), config.clone());
    let first_sync = sync.run().await;
    assert_eq!(first_sync.stocks_synced, 1);
    assert_eq!(first_sync.records_inserted, 60);

    let metrics = TaMetricsJob::new(warehouse.clone(), config.clone());
    let first_metrics = metrics.run().await;
    assert_eq!(first_metrics.stocks_processed, 1);
    assert!(first_metrics.patterns_found > 0);

    let bars_snapshot = warehouse
        .bars_for_symbol("AAPL", None, None)
        .expect("bars");
    let patterns_snapshot = warehouse.patterns(None, None).expect("patterns");

    // Second pass over the unchanged provider history.
    let second_sync = sync.run().await;
    assert_eq!(second_sync.records_inserted, 0);
    let second_metrics = metrics.run().await;
    assert_eq!(second_metrics.patterns_found, 0);

    assert_eq!(
        warehouse
            .bars_for_symbol("AAPL", None, None)
            .expect("bars"),
        bars_snapshot
    );
    assert_eq!(
        warehouse.patterns(None, None).expect("patterns"),
        patterns_snapshot
    );
}

#[tokio::test]
async fn one_symbol_failure_does_not_block_the_rest() {
    let (_guard, warehouse) = temp_warehouse();
    let provider = Arc::new(ScriptedProvider::new(vec![
        (
            "AAPL",
            ProviderScript::Bars(bars_from_closes(&wavy_closes(30))),
        ),
        ("BAD", ProviderScript::UnknownSymbol),
    ]));
    let config = config_for(&["AAPL", "BAD"]);

    let report = SyncJob::new(provider, warehouse.clone(), config)
        .run()
        .await;

    let aapl = report
        .outcomes
        .iter()
        .find(|outcome| outcome.symbol == "AAPL")
        .expect("AAPL outcome");
    assert_eq!(aapl.status, SymbolStatus::Succeeded);
    assert_eq!(aapl.records, 30);

    let bad = report
        .outcomes
        .iter()
        .find(|outcome| outcome.symbol == "BAD")
        .expect("BAD outcome");
    assert_eq!(bad.status, SymbolStatus::Failed);
    assert!(bad.detail.as_deref().expect("detail").contains("BAD"));

    assert_eq!(report.stocks_synced, 1);
    assert_eq!(warehouse.bar_count("AAPL").expect("count"), 30);
    assert_eq!(warehouse.bar_count("BAD").expect("count"), 0);
}

#[tokio::test]
async fn transient_provider_errors_are_retried_to_success() {
    let (_guard, warehouse) = temp_warehouse();
    let provider = Arc::new(ScriptedProvider::new(vec![(
        "AAPL",
        ProviderScript::FailThenBars(2, bars_from_closes(&wavy_closes(10))),
    )]));
    let config = config_for(&["AAPL"]);

    let report = SyncJob::new(provider.clone(), warehouse.clone(), config)
        .with_retry(RetryConfig::fixed(Duration::from_millis(1), 3))
        .run()
        .await;

    assert_eq!(report.stocks_synced, 1);
    assert_eq!(report.records_inserted, 10);
    // Two transient failures plus the successful attempt.
    assert_eq!(provider.calls_for("AAPL"), 3);
}

#[tokio::test]
async fn permanent_provider_errors_are_not_retried() {
    let (_guard, warehouse) = temp_warehouse();
    let provider = Arc::new(ScriptedProvider::new(vec![(
        "BAD",
        ProviderScript::UnknownSymbol,
    )]));
    let config = config_for(&["BAD"]);

    let report = SyncJob::new(provider.clone(), warehouse, config)
        .with_retry(RetryConfig::fixed(Duration::from_millis(1), 5))
        .run()
        .await;

    assert_eq!(report.failures().count(), 1);
    assert_eq!(provider.calls_for("BAD"), 1);
}

#[tokio::test]
async fn exhausted_retries_report_the_transient_error() {
    let (_guard, warehouse) = temp_warehouse();
    let provider = Arc::new(ScriptedProvider::new(vec![(
        "AAPL",
        ProviderScript::Transient("upstream 503"),
    )]));
    let config = config_for(&["AAPL"]);

    let report = SyncJob::new(provider.clone(), warehouse, config)
        .with_retry(RetryConfig::fixed(Duration::from_millis(1), 2))
        .run()
        .await;

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.status, SymbolStatus::Failed);
    assert!(outcome.detail.as_deref().expect("detail").contains("503"));
    assert_eq!(provider.calls_for("AAPL"), 3);
}

/// A provider row with negative volume must be rejected by validation
/// without blocking the symbol's remaining bars.
#[tokio::test]
async fn invalid_volume_row_is_dropped_and_the_rest_stored() {
    struct OneShotClient {
        body: &'static str,
    }
    impl HttpClient for OneShotClient {
        fn execute<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> std::pin::Pin<
            Box<
                dyn std::future::Future<
                        Output = Result<HttpResponse, stockpulse_core::HttpError>,
                    > + Send
                    + 'a,
            >,
        > {
            let body = self.body.to_owned();
            Box::pin(async move { Ok(HttpResponse::ok_json(body)) })
        }
    }

    let body = r#"[
        {"date": "2024-01-03", "adjOpen": 102.0, "adjHigh": 104.0, "adjLow": 101.0, "adjClose": 103.0, "volume": 1200.0},
        {"date": "2024-01-02", "adjOpen": 101.0, "adjHigh": 103.0, "adjLow": 100.0, "adjClose": 102.0, "volume": -1.0},
        {"date": "2024-01-01", "adjOpen": 100.0, "adjHigh": 102.0, "adjLow": 99.0, "adjClose": 101.0, "volume": 1000.0}
    ]"#;

    let (_guard, warehouse) = temp_warehouse();
    let adapter = FmpAdapter::with_http_client(Arc::new(OneShotClient { body }), "test-key");
    let config = config_for(&["AAPL"]);

    let report = SyncJob::new(Arc::new(adapter), warehouse.clone(), config)
        .run()
        .await;

    assert_eq!(report.stocks_synced, 1);
    assert_eq!(report.records_inserted, 2);

    let bars = warehouse
        .bars_for_symbol("AAPL", None, None)
        .expect("bars");
    assert_eq!(bars.len(), 2);
    assert!(bars.iter().all(|bar| bar.ts != "2024-01-02T00:00:00Z"));
}

#[tokio::test]
async fn deadline_skips_unfinished_symbols_and_keeps_finished_writes() {
    let (_guard, warehouse) = temp_warehouse();
    let provider = Arc::new(ScriptedProvider::new(vec![
        (
            "AAPL",
            ProviderScript::Bars(bars_from_closes(&wavy_closes(10))),
        ),
        ("SLOW", ProviderScript::Hang),
    ]));
    let mut config = config_for(&["AAPL", "SLOW"]);
    config.run_deadline_secs = 1;
    config.sync_concurrency = 2;

    let report = SyncJob::new(provider, warehouse.clone(), config)
        .run()
        .await;

    let aapl = report
        .outcomes
        .iter()
        .find(|outcome| outcome.symbol == "AAPL")
        .expect("AAPL outcome");
    assert_eq!(aapl.status, SymbolStatus::Succeeded);

    let slow = report
        .outcomes
        .iter()
        .find(|outcome| outcome.symbol == "SLOW")
        .expect("SLOW outcome");
    assert_eq!(slow.status, SymbolStatus::Skipped);

    assert_eq!(warehouse.bar_count("AAPL").expect("count"), 10);
    assert_eq!(warehouse.bar_count("SLOW").expect("count"), 0);
}

#[tokio::test]
async fn metrics_skip_symbols_without_stored_bars() {
    let (_guard, warehouse) = temp_warehouse();
    let config = config_for(&["GHOST"]);

    let report = TaMetricsJob::new(warehouse, config).run().await;

    assert_eq!(report.stocks_processed, 0);
    assert_eq!(report.outcomes[0].status, SymbolStatus::Skipped);
    assert_eq!(report.outcomes[0].detail.as_deref(), Some("no bars stored"));
}
