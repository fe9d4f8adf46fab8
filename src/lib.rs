//! # Sales Attainment
//!
//! A library for turning raw ERP sales lines into goal-attainment dashboards for a
//! veterinary pharmaceutical sales organization.
//!
//! ## Core Concepts
//!
//! - **Sales Lines**: Signed invoice and credit-note amounts pulled from the ERP
//! - **Commercial Lines**: Product lines the sales force is organized around; third-party brands
//!   are reported together as `TERCEROS`
//! - **Goals**: Monthly targets per commercial line and per seller, with a separate new-product goal
//! - **Attainment**: Actual sales over goal, with share of total and a linear run-rate projection
//! - **Scope**: One pipeline serves the company dashboard and the single-line seller dashboard
//!
//! ## Example
//!
//! ```rust,ignore
//! use sales_attainment::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let period: Period = "2025-03".parse()?;
//! let mut goals = GoalSheet::new();
//! goals.set("petmedica", GoalEntry::new(dec!(1000)));
//!
//! let store = InMemoryGoalStore::new().with_goals(period, goals);
//! let source = StaticSalesSource::new(vec![SalesLine {
//!     balance: Some(dec!(250)),
//!     commercial_line_name: Some("PETMEDICA".to_string()),
//!     product_name: "ATREVIA ONE MEDIUM".to_string(),
//!     ..Default::default()
//! }]);
//!
//! let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
//! let report = build_dashboard(
//!     &DashboardConfig::default(),
//!     &source,
//!     &store,
//!     &DashboardRequest::company(period, today),
//! )?;
//! assert_eq!(report.forecast.projected_period_total, dec!(775));
//! ```

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod forecaster;
pub mod ingestion;
pub mod normalizer;
pub mod period;
pub mod ports;
pub mod reconciler;
pub mod schema;
pub mod utils;

pub use aggregator::{AggregateBucket, Aggregator, RecordStats, SalesBuckets, Scope};
pub use config::DashboardConfig;
pub use engine::{
    compute_dashboard, DashboardBuilder, DashboardReport, DashboardRequest, ReferenceData,
};
pub use error::{Result, SalesAttainmentError};
pub use filter::{is_excluded, partition_excluded};
pub use forecaster::{project, project_window, required_daily_pace, ForecastResult};
pub use ingestion::*;
pub use normalizer::{
    display_name_from_key, line_key, normalize_commercial_line, strip_size_suffix,
    THIRD_PARTY_LINE,
};
pub use period::{Period, ReportingWindow};
pub use ports::{GoalStore, InMemoryGoalStore, SalesLineSource, StaticSalesSource};
pub use reconciler::{
    attainment_pct, available_lines, reconcile, reconcile_sellers, share_pct,
    top_products, BreakdownRow, ProductRank, ReconciledRow, ReconciledTable, TeamBreakdown,
    TeamLineRow, Totals,
};
pub use schema::*;
pub use utils::*;

/// Builds one dashboard with a throwaway [`DashboardBuilder`].
pub fn build_dashboard<S, G>(
    config: &DashboardConfig,
    source: &S,
    store: &G,
    request: &DashboardRequest,
) -> Result<DashboardReport>
where
    S: SalesLineSource + ?Sized,
    G: GoalStore + ?Sized,
{
    config.validate()?;
    DashboardBuilder::new(config.clone()).build(source, store, request)
}
