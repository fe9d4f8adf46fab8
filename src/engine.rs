use crate::aggregator::{Aggregator, RecordStats, SalesBuckets, Scope};
use crate::config::DashboardConfig;
use crate::error::{Result, SalesAttainmentError};
use crate::forecaster::{project_window, ForecastResult};
use crate::normalizer::line_key;
use crate::period::{Period, ReportingWindow};
use crate::ports::{GoalStore, SalesLineSource};
use crate::reconciler::{
    available_lines, ranked, reconcile, reconcile_sellers, team_breakdown, top_products,
    BreakdownRow, ProductRank, ReconciledTable, TeamBreakdown, Totals,
};
use crate::schema::{GoalSheet, SalesLine, SellerGoals};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What dashboard to build, for which month, as of which day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRequest {
    pub period: Period,
    pub scope: Scope,
    pub today: NaiveDate,
    /// Report up to this day of the month instead of the default cutoff.
    pub day_override: Option<u32>,
}

impl DashboardRequest {
    pub fn company(period: Period, today: NaiveDate) -> Self {
        Self {
            period,
            scope: Scope::Company,
            today,
            day_override: None,
        }
    }

    pub fn line(period: Period, line: &str, today: NaiveDate) -> Self {
        Self {
            period,
            scope: Scope::line(line),
            today,
            day_override: None,
        }
    }

    pub fn with_day(mut self, day: u32) -> Self {
        self.day_override = Some(day);
        self
    }
}

/// Goals, rosters and names a dashboard is reconciled against.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub goals: GoalSheet,
    /// Goals of the requested line's sellers (line scope).
    pub seller_goals: SellerGoals,
    /// Official members of the requested line's team (line scope).
    pub line_team: BTreeSet<String>,
    /// Members of the configured e-commerce team (company scope).
    pub ecommerce_team: BTreeSet<String>,
    /// Seller id → name, for members without sales.
    pub seller_directory: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub scope: Scope,
    pub window: ReportingWindow,
    /// One row per commercial line (only the requested line in line scope).
    pub lines: ReconciledTable,
    /// Seller rows of the requested line; `None` for the company dashboard.
    pub sellers: Option<ReconciledTable>,
    /// Headline figures: company totals, or the seller totals of the line.
    pub totals: Totals,
    pub forecast: ForecastResult,
    pub forecast_new_product: ForecastResult,
    pub top_products: Vec<ProductRank>,
    pub life_cycle_breakdown: Vec<BreakdownRow>,
    pub form_breakdown: Vec<BreakdownRow>,
    pub team_breakdown: Option<TeamBreakdown>,
    pub available_lines: Vec<String>,
    pub stats: RecordStats,
}

impl DashboardReport {
    pub fn seller_breakdown(&self) -> Option<&ReconciledTable> {
        self.sellers.as_ref()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Aggregates, reconciles and projects one batch of sales lines. Pure: no I/O.
pub fn compute_dashboard(
    lines: &[SalesLine],
    reference: &ReferenceData,
    window: ReportingWindow,
    scope: &Scope,
    config: &DashboardConfig,
) -> Result<DashboardReport> {
    let mut aggregator = Aggregator::new(config, scope.clone());
    if !scope.is_line_scoped() && !reference.ecommerce_team.is_empty() {
        aggregator = aggregator.with_team(&reference.ecommerce_team);
    }
    let buckets = aggregator.aggregate(lines);

    let (lines_table, sellers) = reconcile_scope(&buckets, reference, scope, config);
    let totals = sellers
        .as_ref()
        .map(|table| table.totals.clone())
        .unwrap_or_else(|| lines_table.totals.clone());

    let forecast = project_window(totals.actual, totals.goal, &window)?;
    let forecast_new_product =
        project_window(totals.actual_new_product, totals.goal_new_product, &window)?;

    let team = if scope.is_line_scoped() || reference.ecommerce_team.is_empty() {
        None
    } else {
        let goal = reference.goals.goal(&line_key(&config.ecommerce_team));
        Some(team_breakdown(
            &config.ecommerce_team,
            &buckets.team_by_line,
            goal,
        ))
    };

    debug!(
        "Reconciled {} line rows{} against goal {} (actual {})",
        lines_table.len(),
        sellers
            .as_ref()
            .map(|s| format!(" and {} seller rows", s.len()))
            .unwrap_or_default(),
        totals.goal,
        totals.actual
    );

    Ok(DashboardReport {
        scope: scope.clone(),
        window,
        lines: lines_table,
        sellers,
        totals,
        forecast,
        forecast_new_product,
        top_products: top_products(&buckets, config.top_products),
        life_cycle_breakdown: ranked(&buckets.by_life_cycle),
        form_breakdown: ranked(&buckets.by_form),
        team_breakdown: team,
        available_lines: available_lines(
            &buckets.lines_seen,
            &reference.goals,
            &config.line_selector_exclusions,
        ),
        stats: buckets.stats,
    })
}

fn reconcile_scope(
    buckets: &SalesBuckets,
    reference: &ReferenceData,
    scope: &Scope,
    config: &DashboardConfig,
) -> (ReconciledTable, Option<ReconciledTable>) {
    match scope {
        Scope::Company => (
            reconcile(buckets, &reference.goals, &config.table_exclusions),
            None,
        ),
        Scope::CommercialLine(name) => {
            let key = line_key(name);
            let mut own_goal = GoalSheet::new();
            if let Some(entry) = reference.goals.get(&key) {
                own_goal.set(&key, entry.clone());
            }
            let lines = reconcile(buckets, &own_goal, &[]);
            let sellers = reconcile_sellers(
                buckets,
                &reference.seller_goals,
                &reference.line_team,
                &reference.seller_directory,
            );
            (lines, Some(sellers))
        }
    }
}

/// Fetches sales and goals for a request and turns them into a [`DashboardReport`].
pub struct DashboardBuilder {
    config: DashboardConfig,
}

impl DashboardBuilder {
    pub fn new(config: DashboardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Builds the dashboard. An unavailable sales source degrades to an empty dashboard;
    /// goal-store failures and invalid requests are returned as errors.
    pub fn build<S, G>(
        &self,
        source: &S,
        store: &G,
        request: &DashboardRequest,
    ) -> Result<DashboardReport>
    where
        S: SalesLineSource + ?Sized,
        G: GoalStore + ?Sized,
    {
        let window = ReportingWindow::new(request.period, request.today, request.day_override)?;
        let scope = match &request.scope {
            Scope::CommercialLine(name) if name.is_empty() => Scope::line(&self.config.default_line),
            scope => scope.clone(),
        };

        info!(
            "Building {} dashboard for {} up to day {} of {}",
            scope.line_name().unwrap_or("company"),
            window.period,
            window.day_of_period,
            window.days_in_period
        );

        let lines = self.fetch_lines(source, &window)?;
        let reference = self.load_reference(source, store, &window.period, &scope)?;

        let report = compute_dashboard(&lines, &reference, window, &scope, &self.config)?;

        info!(
            "Dashboard ready: actual {} of goal {} ({}%), {} lines counted",
            report.totals.actual,
            report.totals.goal,
            report.totals.attainment_pct.round_dp(2),
            report.stats.counted
        );

        Ok(report)
    }

    fn fetch_lines<S>(&self, source: &S, window: &ReportingWindow) -> Result<Vec<SalesLine>>
    where
        S: SalesLineSource + ?Sized,
    {
        let limit = self.config.row_limit;
        let lines = match source.fetch_lines(window.start_date(), window.cutoff_date()?, limit) {
            Ok(lines) => lines,
            Err(err) => {
                warn!("Sales source failed, building an empty dashboard: {}", err);
                return Ok(Vec::new());
            }
        };

        if lines.len() >= limit {
            warn!(
                "Sales source returned {} lines, the configured ceiling; totals may be incomplete",
                lines.len()
            );
        }
        debug!("Fetched {} sales lines", lines.len());
        Ok(lines)
    }

    fn load_reference<S, G>(
        &self,
        source: &S,
        store: &G,
        period: &Period,
        scope: &Scope,
    ) -> Result<ReferenceData>
    where
        S: SalesLineSource + ?Sized,
        G: GoalStore + ?Sized,
    {
        let mut reference = ReferenceData {
            goals: store.get_goals(period)?,
            ..Default::default()
        };

        match scope {
            Scope::Company => {
                reference.ecommerce_team = store.team_members(&self.config.ecommerce_team)?;
            }
            Scope::CommercialLine(name) => {
                let key = line_key(name);
                reference.seller_goals = store.get_seller_goals(period, &key)?;
                reference.line_team = store.team_members(&key)?;
                reference.seller_directory = match source.sellers() {
                    Ok(sellers) => sellers
                        .into_iter()
                        .map(|seller| (seller.id.to_string(), seller.name))
                        .collect(),
                    Err(err) => {
                        warn!("Seller directory unavailable: {}", err);
                        BTreeMap::new()
                    }
                };
            }
        }

        Ok(reference)
    }

    /// Stores goals for a period on behalf of `user_email`, who must be on the admin list.
    pub fn save_goals<G>(
        &self,
        store: &mut G,
        user_email: &str,
        period: &Period,
        sheet: &GoalSheet,
    ) -> Result<()>
    where
        G: GoalStore + ?Sized,
    {
        if !self.config.is_admin(user_email) {
            return Err(SalesAttainmentError::Unauthorized(user_email.to_string()));
        }
        sheet.validate()?;
        info!(
            "{} updated {} goals for {} (total {})",
            user_email,
            sheet.len(),
            period,
            sheet.total_goal()
        );
        store.put_goals(period, sheet)
    }
}
