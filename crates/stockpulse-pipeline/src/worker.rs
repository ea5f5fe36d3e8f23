//! Shared per-symbol worker scheduling for both jobs.
//!
//! Symbols run independently under a bounded semaphore; an overall run
//! deadline skips whatever has not finished. Workers already started keep
//! their single write transaction, so an expired deadline can only leave
//! a symbol fully written or untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use stockpulse_core::Symbol;
use tokio::sync::Semaphore;

use crate::report::SymbolOutcome;

pub(crate) type SymbolWorker = Pin<Box<dyn Future<Output = SymbolOutcome> + Send>>;

pub(crate) async fn run_symbol_workers<F>(
    symbols: &[Symbol],
    concurrency: usize,
    deadline: Duration,
    make_worker: F,
) -> Vec<SymbolOutcome>
where
    F: Fn(Symbol) -> SymbolWorker,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let deadline_at = tokio::time::Instant::now() + deadline;

    let mut handles = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let semaphore = Arc::clone(&semaphore);
        let worker = make_worker(symbol.clone());
        let symbol_name = symbol.to_string();
        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return SymbolOutcome::skipped(symbol_name, "worker pool shut down");
                }
            };
            worker.await
        });
        handles.push((symbol.to_string(), handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (symbol, handle) in handles {
        let abort = handle.abort_handle();
        match tokio::time::timeout_at(deadline_at, handle).await {
            Ok(Ok(outcome)) => outcomes.push(outcome),
            Ok(Err(join_error)) => {
                tracing::error!(symbol = %symbol, error = %join_error, "symbol worker failed");
                outcomes.push(SymbolOutcome::failed(
                    symbol,
                    format!("worker task failed: {join_error}"),
                ));
            }
            Err(_) => {
                abort.abort();
                tracing::warn!(symbol = %symbol, "run deadline exceeded, symbol skipped");
                outcomes.push(SymbolOutcome::skipped(symbol, "run deadline exceeded"));
            }
        }
    }
    outcomes
}
