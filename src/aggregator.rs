use crate::config::DashboardConfig;
use crate::filter::partition_excluded;
use crate::normalizer::normalize_commercial_line;
use crate::schema::{NormalizedLine, SalesLine};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Group key → running sum.
pub type AggregateBucket = BTreeMap<String, Decimal>;

pub const UNDEFINED_LIFE_CYCLE: &str = "No definido";
pub const DEFAULT_FORM: &str = "Instrumental";
pub const NO_LINE: &str = "N/A";

/// Which lines a dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Every national line, grouped by commercial line.
    Company,
    /// Only lines of one (normalized) commercial line, grouped by seller.
    CommercialLine(String),
}

impl Scope {
    /// Line scope for a user-supplied line name, normalized like the sales data.
    pub fn line(name: &str) -> Self {
        let normalized = normalize_commercial_line(Some(name)).unwrap_or_default();
        Scope::CommercialLine(normalized)
    }

    pub fn includes(&self, line: &NormalizedLine) -> bool {
        match self {
            Scope::Company => true,
            Scope::CommercialLine(name) => line.commercial_line.as_deref() == Some(name.as_str()),
        }
    }

    pub fn is_line_scoped(&self) -> bool {
        matches!(self, Scope::CommercialLine(_))
    }

    pub fn line_name(&self) -> Option<&str> {
        match self {
            Scope::Company => None,
            Scope::CommercialLine(name) => Some(name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    /// Lines received from the source.
    pub seen: usize,
    /// International/export lines dropped before aggregation.
    pub excluded: usize,
    /// National lines outside the requested scope.
    pub out_of_scope: usize,
    /// Lines that went through the aggregation pass.
    pub counted: usize,
    /// Counted lines without a usable balance (they add zero to every sum).
    pub missing_balance: usize,
}

/// Every bucket produced by one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesBuckets {
    pub by_line_total: AggregateBucket,
    pub by_line_near_expiry: AggregateBucket,
    pub by_line_new_product: AggregateBucket,
    pub by_product: AggregateBucket,
    /// Lifecycle of the first line seen for each product.
    pub product_life_cycle: BTreeMap<String, Option<String>>,
    pub by_life_cycle: AggregateBucket,
    pub by_form: AggregateBucket,
    pub by_seller_total: AggregateBucket,
    pub by_seller_new_product: AggregateBucket,
    pub by_seller_near_expiry: AggregateBucket,
    pub seller_names: BTreeMap<String, String>,
    /// Sales (usually credit notes) carrying no seller.
    pub unassigned_adjustments: Decimal,
    /// Sales of the configured team's members by commercial line.
    pub team_by_line: AggregateBucket,
    /// Number of counted lines per commercial line, including zero-amount lines.
    pub line_record_counts: BTreeMap<String, usize>,
    /// Normalized commercial lines present in national sales, regardless of scope.
    pub lines_seen: BTreeSet<String>,
    pub stats: RecordStats,
}

fn add(bucket: &mut AggregateBucket, key: &str, amount: Decimal) {
    *bucket.entry(key.to_string()).or_insert(Decimal::ZERO) += amount;
}

pub struct Aggregator<'a> {
    config: &'a DashboardConfig,
    scope: Scope,
    team: Option<&'a BTreeSet<String>>,
}

impl<'a> Aggregator<'a> {
    pub fn new(config: &'a DashboardConfig, scope: Scope) -> Self {
        Self {
            config,
            scope,
            team: None,
        }
    }

    /// Also break down the sales of these seller ids by commercial line.
    pub fn with_team(mut self, members: &'a BTreeSet<String>) -> Self {
        self.team = Some(members);
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Normalizes, filters once, then folds every remaining line into all buckets.
    pub fn aggregate(&self, lines: &[SalesLine]) -> SalesBuckets {
        let normalized: Vec<NormalizedLine> = lines.iter().map(NormalizedLine::from).collect();
        let (national, excluded) = partition_excluded(normalized);

        let mut buckets = SalesBuckets::default();
        buckets.stats.seen = lines.len();
        buckets.stats.excluded = excluded;

        for line in &national {
            if let Some(name) = &line.commercial_line {
                buckets.lines_seen.insert(name.clone());
            }

            if !self.scope.includes(line) {
                buckets.stats.out_of_scope += 1;
                continue;
            }

            self.accumulate(&mut buckets, line);
        }

        debug!(
            "Aggregated {} of {} lines ({} excluded, {} out of scope) into {} commercial lines",
            buckets.stats.counted,
            buckets.stats.seen,
            buckets.stats.excluded,
            buckets.stats.out_of_scope,
            buckets.by_line_total.len()
        );

        buckets
    }

    fn accumulate(&self, buckets: &mut SalesBuckets, line: &NormalizedLine) {
        buckets.stats.counted += 1;
        if line.balance.is_none() {
            buckets.stats.missing_balance += 1;
        }
        if let Some(name) = &line.commercial_line {
            *buckets.line_record_counts.entry(name.clone()).or_insert(0) += 1;
        }
        if let Some(seller) = &line.seller {
            buckets
                .seller_names
                .entry(seller.id.to_string())
                .or_insert_with(|| seller.name.clone());
        }

        let amount = line.amount();
        // Zero-amount lines create no bucket keys, except a seller's row in a line table.
        if amount.is_zero() {
            if let (true, Some(seller)) = (self.scope.is_line_scoped(), &line.seller) {
                buckets
                    .by_seller_total
                    .entry(seller.id.to_string())
                    .or_insert(Decimal::ZERO);
            }
            return;
        }

        let near_expiry = self.config.is_near_expiry_route(line.route_id);
        let new_product = self
            .config
            .is_new_product(line.product_life_cycle.as_deref());

        if let Some(name) = &line.commercial_line {
            add(&mut buckets.by_line_total, name, amount);
            if near_expiry {
                add(&mut buckets.by_line_near_expiry, name, amount);
            }
            if new_product {
                add(&mut buckets.by_line_new_product, name, amount);
            }
        }

        if !line.product_name.is_empty() {
            add(&mut buckets.by_product, &line.product_name, amount);
            buckets
                .product_life_cycle
                .entry(line.product_name.clone())
                .or_insert_with(|| line.product_life_cycle.clone());
        }

        let life_cycle = line
            .product_life_cycle
            .as_deref()
            .unwrap_or(UNDEFINED_LIFE_CYCLE);
        add(&mut buckets.by_life_cycle, life_cycle, amount);

        if let Some(team) = self.team {
            let on_team = line
                .seller
                .as_ref()
                .is_some_and(|s| team.contains(&s.id.to_string()));
            if on_team {
                let name = line.commercial_line.as_deref().unwrap_or(NO_LINE);
                add(&mut buckets.team_by_line, name, amount);
            }
        }

        if !self.scope.is_line_scoped() {
            return;
        }

        let form = line.pharmaceutical_form.as_deref().unwrap_or(DEFAULT_FORM);
        add(&mut buckets.by_form, form, amount);

        match &line.seller {
            Some(seller) => {
                let id = seller.id.to_string();
                add(&mut buckets.by_seller_total, &id, amount);
                if new_product {
                    add(&mut buckets.by_seller_new_product, &id, amount);
                }
                if near_expiry {
                    add(&mut buckets.by_seller_near_expiry, &id, amount);
                }
            }
            None => buckets.unassigned_adjustments += amount,
        }
    }
}
