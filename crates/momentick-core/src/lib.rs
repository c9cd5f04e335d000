//! # Momentick Core
//!
//! Momentum snapshot engine for index constituents: per-constituent
//! percent change and ten-session relative volume, computed once as a
//! baseline and then refreshed cheaply against the latest bar.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Quote gateway implementations (Yahoo chart, static) |
//! | [`bucket`] | Volume-ratio bucket classification |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`config`] | Engine configuration |
//! | [`domain`] | Domain models (ConstituentRecord, DailyBar, Symbol) |
//! | [`engine`] | Baseline and intraday refresh protocol |
//! | [`error`] | Core error types |
//! | [`gateway`] | Quote gateway trait and errors |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`metrics`] | Pure metric computation |
//! | [`presentation`] | Chart-ready rows and axis scale |
//! | [`price_history`] | Single-stock history with EMA overlays |
//! | [`snapshot`] | Snapshot rows, sets and refresh mode |
//! | [`store`] | Shared in-memory snapshot store |
//! | [`throttling`] | Rate budget for gateway calls |
//! | [`universe`] | Index table and constituent loaders |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use momentick_core::{
//!     EngineConfig, MomentumEngine, PresentationFrame, StaticGateway, StaticUniverse,
//!     SymbolFamily, UniverseLoader,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Arc::new(StaticGateway::synthetic());
//!     let engine = MomentumEngine::new(gateway, EngineConfig::default())?;
//!     let records = StaticUniverse::demo().load_universe("HSI")?;
//!
//!     let baseline = engine.load_baseline("HSI", SymbolFamily::Numeric, &records).await;
//!     assert_eq!(baseline.len(), records.len());
//!
//!     let refreshed = engine.refresh_intraday("HSI").await?;
//!     let frame = PresentationFrame::from_set(&refreshed);
//!     println!("{}: {} rows", frame.title, frame.rows.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Universe Loader │  workbook / static
//! └────────┬────────┘
//!          │ ConstituentRecord list
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Momentum Engine │────▶│ Quote Gateway    │──▶ Circuit Breaker ──▶ HTTP Client
//! │ (fan-out, rate  │     │ (trait)          │
//! │  gate, timeout) │     └──────────────────┘
//! └────────┬────────┘
//!          │ atomic publish
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Snapshot Store  │────▶│ Presentation     │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod adapters;
pub mod bucket;
pub mod circuit_breaker;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod http_client;
pub mod metrics;
pub mod presentation;
pub mod price_history;
pub mod snapshot;
pub mod store;
pub mod throttling;
pub mod universe;

pub use adapters::{StaticGateway, YahooGateway};
pub use bucket::{classify, VolumeBucket};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{ConfigError, EngineConfig};
pub use domain::{ConstituentRecord, DailyBar, Symbol, SymbolFamily, UtcDateTime, NUMERIC_MARKET_SUFFIX};
pub use engine::MomentumEngine;
pub use error::{EngineError, ValidationError};
pub use gateway::{GatewayError, GatewayErrorKind, GatewayFuture, HistoryRequest, QuoteGateway};
pub use http_client::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use presentation::{AxisScale, PresentationFrame, PresentationRow};
pub use price_history::{load_price_history, HistoryPoint, PriceHistory};
pub use snapshot::{IndexSnapshotSet, MomentumSnapshot, RefreshMode, SnapshotStatus, UnavailableReason};
pub use store::SnapshotStore;
pub use throttling::RateGate;
pub use universe::{
    default_indices, find_index, IndexSpec, StaticUniverse, UniverseError, UniverseLoader,
    WorkbookUniverse,
};
