//! Momentum engine: the baseline and intraday refresh protocol.
//!
//! Both batch operations fan out one task per constituent with bounded
//! concurrency, collect results by slot so universe order is preserved, and
//! publish the finished set in one store write. Operations on the same index
//! are serialized; different indices proceed in parallel.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::{ConfigError, EngineConfig};
use crate::error::EngineError;
use crate::gateway::{GatewayError, GatewayErrorKind, HistoryRequest, QuoteGateway};
use crate::metrics;
use crate::snapshot::{IndexSnapshotSet, MomentumSnapshot, RefreshMode, UnavailableReason};
use crate::store::SnapshotStore;
use crate::throttling::RateGate;
use crate::universe::{IndexSpec, UniverseLoader};
use crate::{ConstituentRecord, DailyBar, Symbol, SymbolFamily, UtcDateTime};

/// Computes, caches and refreshes momentum snapshots per index.
///
/// Cloning the engine shares its gateway, store and rate budget. Same-index
/// operations are serialized through the store, so engines built over one
/// store with [`MomentumEngine::with_store`] also exclude each other.
#[derive(Clone)]
pub struct MomentumEngine {
    gateway: Arc<dyn QuoteGateway>,
    store: SnapshotStore,
    config: EngineConfig,
    rate_gate: RateGate,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for MomentumEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MomentumEngine")
            .field("gateway", &self.gateway.name())
            .field("config", &self.config)
            .field("rate_gate", &self.rate_gate)
            .finish()
    }
}

impl MomentumEngine {
    pub fn new(gateway: Arc<dyn QuoteGateway>, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gateway,
            store: SnapshotStore::new(),
            rate_gate: RateGate::from_config(&config),
            permits: Arc::new(Semaphore::new(config.max_concurrency)),
            config,
        })
    }

    /// Publishes into an existing store instead of a private one.
    pub fn with_store(mut self, store: SnapshotStore) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn snapshot(&self, index: &str) -> Option<Arc<IndexSnapshotSet>> {
        self.store.get(index).await
    }

    pub async fn mode(&self, index: &str) -> RefreshMode {
        self.store.mode(index).await
    }

    /// Drops the published set of `index`, returning it to `Uninitialized`.
    pub async fn discard(&self, index: &str) -> Option<Arc<IndexSnapshotSet>> {
        let _lease = self.store.lease(index).await;
        self.store.remove(index).await
    }

    /// Full recomputation of one index from its constituent list.
    ///
    /// Total: every record yields exactly one row, in input order, and
    /// per-constituent failures only downgrade that row. Replaces any set
    /// already published for `index`.
    pub async fn load_baseline(
        &self,
        index: &str,
        family: SymbolFamily,
        records: &[ConstituentRecord],
    ) -> Arc<IndexSnapshotSet> {
        let _lease = self.store.lease(index).await;
        let started = Instant::now();
        tracing::info!(index, constituents = records.len(), %family, "baseline load started");

        let mut rows: Vec<Option<MomentumSnapshot>> = vec![None; records.len()];
        let mut jobs = Vec::with_capacity(records.len());
        for (slot, record) in records.iter().enumerate() {
            match family.resolve(record.code()) {
                Ok(symbol) => jobs.push((
                    slot,
                    baseline_row(
                        Arc::clone(&self.gateway),
                        record.clone(),
                        symbol,
                        self.config.history_bars,
                        self.config.fetch_deadline(),
                    ),
                )),
                Err(error) => {
                    tracing::warn!(index, code = record.code(), %error, "constituent rejected");
                    rows[slot] = Some(MomentumSnapshot::unavailable(
                        record,
                        UnavailableReason::InvalidSymbol,
                    ));
                }
            }
        }

        let fetched = self.run_batch(records.len(), jobs).await;
        let snapshots: Vec<MomentumSnapshot> = records
            .iter()
            .zip(rows.into_iter().zip(fetched))
            .map(|(record, (rejected, fetched))| {
                rejected.or(fetched).unwrap_or_else(|| {
                    MomentumSnapshot::unavailable(record, UnavailableReason::Internal)
                })
            })
            .collect();

        let set = IndexSnapshotSet::baseline(index, family, snapshots, UtcDateTime::now());
        let published = self.store.publish(set).await;
        tracing::info!(
            index,
            constituents = published.len(),
            complete = published.complete_count(),
            unavailable = published.unavailable_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "baseline published"
        );
        published
    }

    /// Loads `spec`'s constituents from `loader`, then runs a baseline.
    pub async fn load_universe_baseline(
        &self,
        loader: &dyn UniverseLoader,
        spec: &IndexSpec,
    ) -> Result<Arc<IndexSnapshotSet>, EngineError> {
        let records = loader.load_universe(&spec.name)?;
        Ok(self.load_baseline(&spec.name, spec.family, &records).await)
    }

    /// Recomputes every complete row of `index` against its latest bar.
    ///
    /// Baseline fields are reused untouched. A row whose fetch fails, times
    /// out or returns nothing keeps its previous values; unavailable rows are
    /// skipped.
    pub async fn refresh_intraday(&self, index: &str) -> Result<Arc<IndexSnapshotSet>, EngineError> {
        let _lease = self.store.lease(index).await;

        let current = match self.store.get(index).await {
            Some(set) if set.mode().accepts_intraday() => set,
            _ => {
                return Err(EngineError::BaselineNotReady {
                    index: index.to_owned(),
                })
            }
        };
        let started = Instant::now();
        tracing::info!(
            index,
            constituents = current.len(),
            eligible = current.complete_count(),
            "intraday refresh started"
        );

        let mut jobs = Vec::with_capacity(current.complete_count());
        for (slot, row) in current.snapshots().iter().enumerate() {
            if !row.is_complete() {
                continue;
            }
            match current.family().resolve(row.code()) {
                Ok(symbol) => jobs.push((
                    slot,
                    intraday_row(
                        Arc::clone(&self.gateway),
                        row.clone(),
                        symbol,
                        self.config.fetch_deadline(),
                    ),
                )),
                Err(error) => {
                    tracing::debug!(index, code = row.code(), %error, "keeping row with unresolvable code");
                }
            }
        }

        let outcomes = self.run_batch(current.len(), jobs).await;
        let mut refreshed = 0_usize;
        let snapshots: Vec<MomentumSnapshot> = current
            .snapshots()
            .iter()
            .zip(outcomes)
            .map(|(previous, outcome)| match outcome {
                Some(IntradayOutcome::Refreshed(row)) => {
                    refreshed += 1;
                    row
                }
                Some(IntradayOutcome::Kept) | None => previous.clone(),
            })
            .collect();

        let published = self
            .store
            .publish(current.refreshed(snapshots, UtcDateTime::now()))
            .await;
        tracing::info!(
            index,
            refreshed,
            stale = published.complete_count().saturating_sub(refreshed),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "intraday refresh published"
        );
        Ok(published)
    }

    /// Runs `jobs` under the shared concurrency bound and rate budget.
    ///
    /// Returns one entry per slot in `0..len`; slots without a job, or whose
    /// task panicked, are `None`.
    async fn run_batch<T, F>(&self, len: usize, jobs: Vec<(usize, F)>) -> Vec<Option<T>>
    where
        T: Send + 'static,
        F: Future<Output = T> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for (slot, job) in jobs {
            let permits = Arc::clone(&self.permits);
            let rate_gate = self.rate_gate.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                rate_gate.acquire().await;
                (slot, job.await)
            });
        }

        let mut results: Vec<Option<T>> = (0..len).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, value)) => results[slot] = Some(value),
                Err(error) => tracing::error!(%error, "constituent task failed"),
            }
        }
        results
    }
}

enum IntradayOutcome {
    Refreshed(MomentumSnapshot),
    Kept,
}

fn unavailable_reason(error: &GatewayError) -> UnavailableReason {
    match error.kind() {
        GatewayErrorKind::Unavailable => UnavailableReason::GatewayUnavailable,
        GatewayErrorKind::Timeout => UnavailableReason::Timeout,
        GatewayErrorKind::InvalidRequest | GatewayErrorKind::Internal => UnavailableReason::Internal,
    }
}

async fn fetch_history(
    gateway: &dyn QuoteGateway,
    symbol: Symbol,
    min_bars: usize,
    timeout: Duration,
) -> Result<Vec<DailyBar>, GatewayError> {
    let request = HistoryRequest::new(symbol, min_bars)?;
    tokio::time::timeout(timeout, gateway.fetch_history(request))
        .await
        .unwrap_or_else(|_| {
            Err(GatewayError::timeout(format!(
                "history fetch exceeded {}ms",
                timeout.as_millis()
            )))
        })
}

async fn fetch_latest(
    gateway: &dyn QuoteGateway,
    symbol: &Symbol,
    timeout: Duration,
) -> Result<Option<DailyBar>, GatewayError> {
    tokio::time::timeout(timeout, gateway.fetch_latest(symbol))
        .await
        .unwrap_or_else(|_| {
            Err(GatewayError::timeout(format!(
                "latest fetch exceeded {}ms",
                timeout.as_millis()
            )))
        })
}

async fn baseline_row(
    gateway: Arc<dyn QuoteGateway>,
    record: ConstituentRecord,
    symbol: Symbol,
    history_bars: usize,
    timeout: Duration,
) -> MomentumSnapshot {
    match fetch_history(gateway.as_ref(), symbol.clone(), history_bars, timeout).await {
        Ok(bars) => {
            let row = metrics::baseline_snapshot(&record, &bars, UtcDateTime::now());
            if let Some(reason) = row.unavailable_reason() {
                tracing::debug!(
                    code = record.code(),
                    %symbol,
                    bars = bars.len(),
                    reason = reason.as_str(),
                    "no baseline for constituent"
                );
            }
            row
        }
        Err(error) => {
            tracing::warn!(
                code = record.code(),
                %symbol,
                gateway = gateway.name(),
                error = %error,
                "history fetch failed; constituent unavailable"
            );
            MomentumSnapshot::unavailable(&record, unavailable_reason(&error))
        }
    }
}

async fn intraday_row(
    gateway: Arc<dyn QuoteGateway>,
    previous: MomentumSnapshot,
    symbol: Symbol,
    timeout: Duration,
) -> IntradayOutcome {
    match fetch_latest(gateway.as_ref(), &symbol, timeout).await {
        Ok(Some(bar)) => match metrics::intraday_snapshot(&previous, &bar, UtcDateTime::now()) {
            Some(row) => IntradayOutcome::Refreshed(row),
            None => {
                tracing::debug!(code = previous.code(), %symbol, "latest bar unusable; keeping previous values");
                IntradayOutcome::Kept
            }
        },
        Ok(None) => {
            tracing::debug!(code = previous.code(), %symbol, "no latest bar; keeping previous values");
            IntradayOutcome::Kept
        }
        Err(error) => {
            tracing::warn!(
                code = previous.code(),
                %symbol,
                gateway = gateway.name(),
                error = %error,
                "latest fetch failed; keeping previous values"
            );
            IntradayOutcome::Kept
        }
    }
}
