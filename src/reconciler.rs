//! Goal-vs-actual reconciliation.
//!
//! Buckets from the [`Aggregator`](crate::aggregator::Aggregator) are merged with the stored goals
//! into rows carrying attainment and share-of-total percentages. All divisions are guarded: a
//! non-positive denominator yields zero instead of an error.

use crate::aggregator::{AggregateBucket, SalesBuckets, UNDEFINED_LIFE_CYCLE};
use crate::normalizer::{display_name_from_key, line_key};
use crate::schema::{GoalSheet, SellerGoals};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Row key of the seller-less adjustments row in a line's seller table.
pub const ADJUSTMENTS_KEY: &str = "ajustes";
pub const ADJUSTMENTS_NAME: &str = "Ajustes y Notas de Crédito (Sin Vendedor)";

/// `actual / goal * 100`, or zero when there is no positive goal.
pub fn attainment_pct(actual: Decimal, goal: Decimal) -> Decimal {
    guarded_pct(actual, goal)
}

/// `part / total * 100`, or zero when the total is not positive.
pub fn share_pct(part: Decimal, total: Decimal) -> Decimal {
    guarded_pct(part, total)
}

/// Zero for a non-positive denominator or a result outside the `Decimal` range.
fn guarded_pct(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .and_then(|ratio| ratio.checked_mul(dec!(100)))
        .unwrap_or(Decimal::ZERO)
}

fn amount(bucket: &AggregateBucket, key: &str) -> Decimal {
    bucket.get(key).copied().unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledRow {
    /// Goal-store key (`pet_nutriscience`), seller id, or [`ADJUSTMENTS_KEY`].
    pub key: String,
    pub name: String,
    pub goal: Decimal,
    pub goal_new_product: Decimal,
    pub actual: Decimal,
    pub actual_new_product: Decimal,
    pub actual_near_expiry: Decimal,
    pub attainment_pct: Decimal,
    pub attainment_new_pct: Decimal,
    pub share_of_total_pct: Decimal,
}

impl ReconciledRow {
    fn new(key: String, name: String, goal: Decimal, goal_new_product: Decimal) -> Self {
        Self {
            key,
            name,
            goal,
            goal_new_product,
            actual: Decimal::ZERO,
            actual_new_product: Decimal::ZERO,
            actual_near_expiry: Decimal::ZERO,
            attainment_pct: Decimal::ZERO,
            attainment_new_pct: Decimal::ZERO,
            share_of_total_pct: Decimal::ZERO,
        }
    }

    fn with_actuals(mut self, actual: Decimal, new_product: Decimal, near_expiry: Decimal) -> Self {
        self.actual = actual;
        self.actual_new_product = new_product;
        self.actual_near_expiry = near_expiry;
        self.attainment_pct = attainment_pct(actual, self.goal);
        self.attainment_new_pct = attainment_pct(new_product, self.goal_new_product);
        self
    }

    fn with_share_of(mut self, total_actual: Decimal) -> Self {
        self.share_of_total_pct = share_pct(self.actual, total_actual);
        self
    }
}

/// Headline figures of a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub goal: Decimal,
    pub actual: Decimal,
    pub attainment_pct: Decimal,
    pub goal_new_product: Decimal,
    pub actual_new_product: Decimal,
    pub attainment_new_pct: Decimal,
    pub near_expiry: Decimal,
}

impl Totals {
    pub fn new(
        goal: Decimal,
        actual: Decimal,
        goal_new_product: Decimal,
        actual_new_product: Decimal,
        near_expiry: Decimal,
    ) -> Self {
        Self {
            goal,
            actual,
            attainment_pct: attainment_pct(actual, goal),
            goal_new_product,
            actual_new_product,
            attainment_new_pct: attainment_pct(actual_new_product, goal_new_product),
            near_expiry,
        }
    }
}

/// Rows in key order plus the headline totals they were reconciled against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciledTable {
    pub rows: Vec<ReconciledRow>,
    pub totals: Totals,
}

impl ReconciledTable {
    /// Rows ordered by display name, ascending.
    pub fn by_name(&self) -> Vec<&ReconciledRow> {
        let mut rows: Vec<&ReconciledRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }

    /// Rows ordered by actual sales, descending. Ties keep key order.
    pub fn by_actual(&self) -> Vec<&ReconciledRow> {
        let mut rows: Vec<&ReconciledRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| b.actual.cmp(&a.actual));
        rows
    }

    pub fn get(&self, key: &str) -> Option<&ReconciledRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn is_listed(name: &str, list: &[String]) -> bool {
    list.iter().any(|entry| entry.trim().eq_ignore_ascii_case(name.trim()))
}

/// Company table: one row per commercial line with sales or a goal.
///
/// Lines named in `exclusions` are left out of the rows, but the totals are summed over every
/// line so that hidden lines still count toward the company figures.
pub fn reconcile(
    buckets: &SalesBuckets,
    goals: &GoalSheet,
    exclusions: &[String],
) -> ReconciledTable {
    // key -> display name; names seen on sales win over names rebuilt from goal keys
    let mut lines: BTreeMap<String, String> = BTreeMap::new();
    for name in buckets.by_line_total.keys() {
        lines.insert(line_key(name), name.to_uppercase());
    }
    for key in goals.keys() {
        lines
            .entry(key.clone())
            .or_insert_with(|| display_name_from_key(key));
    }

    let totals = Totals::new(
        goals.total_goal(),
        buckets.by_line_total.values().copied().sum(),
        goals.total_goal_new_product(),
        buckets.by_line_new_product.values().copied().sum(),
        buckets.by_line_near_expiry.values().copied().sum(),
    );

    let rows = lines
        .into_iter()
        .filter(|(_, name)| !is_listed(name, exclusions))
        .map(|(key, name)| {
            let goal = goals.goal(&key);
            let goal_new = goals.goal_new_product(&key);
            let actual = amount(&buckets.by_line_total, &name);
            let actual_new = amount(&buckets.by_line_new_product, &name);
            let near_expiry = amount(&buckets.by_line_near_expiry, &name);
            ReconciledRow::new(key, name, goal, goal_new)
                .with_actuals(actual, actual_new, near_expiry)
                .with_share_of(totals.actual)
        })
        .collect();

    ReconciledTable { rows, totals }
}

/// Seller table of one commercial line.
///
/// Rows cover the official `members` and everyone who sold in the line, in id order. Goals are
/// only taken for official members. Seller-less sales become an [`ADJUSTMENTS_KEY`] row that
/// counts toward the line total. Sellers whose actual is negative are dropped from the rows but
/// not from the totals.
pub fn reconcile_sellers(
    buckets: &SalesBuckets,
    seller_goals: &SellerGoals,
    members: &BTreeSet<String>,
    directory: &BTreeMap<String, String>,
) -> ReconciledTable {
    let ids: BTreeSet<&String> = members
        .iter()
        .chain(buckets.by_seller_total.keys())
        .collect();

    let mut rows = Vec::with_capacity(ids.len() + 1);
    for id in ids {
        let name = buckets
            .seller_names
            .get(id)
            .or_else(|| directory.get(id))
            .cloned()
            .unwrap_or_else(|| format!("Vendedor ID {}", id));

        let (goal, goal_new) = match seller_goals.get(id) {
            Some(entry) if members.contains(id) => (entry.goal_total, entry.new_product()),
            _ => (Decimal::ZERO, Decimal::ZERO),
        };

        rows.push(
            ReconciledRow::new(id.clone(), name, goal, goal_new).with_actuals(
                amount(&buckets.by_seller_total, id),
                amount(&buckets.by_seller_new_product, id),
                amount(&buckets.by_seller_near_expiry, id),
            ),
        );
    }

    if !buckets.unassigned_adjustments.is_zero() {
        rows.push(
            ReconciledRow::new(
                ADJUSTMENTS_KEY.to_string(),
                ADJUSTMENTS_NAME.to_string(),
                Decimal::ZERO,
                Decimal::ZERO,
            )
            .with_actuals(buckets.unassigned_adjustments, Decimal::ZERO, Decimal::ZERO),
        );
    }

    let totals = Totals::new(
        rows.iter().map(|r| r.goal).sum(),
        rows.iter().map(|r| r.actual).sum(),
        rows.iter().map(|r| r.goal_new_product).sum(),
        rows.iter().map(|r| r.actual_new_product).sum(),
        rows.iter().map(|r| r.actual_near_expiry).sum(),
    );

    let rows = rows
        .into_iter()
        .filter(|row| row.actual >= Decimal::ZERO || row.key == ADJUSTMENTS_KEY)
        .map(|row| row.with_share_of(totals.actual))
        .collect();

    ReconciledTable { rows, totals }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub name: String,
    pub actual: Decimal,
}

/// Bucket entries sorted by actual, descending.
pub fn ranked(bucket: &AggregateBucket) -> Vec<BreakdownRow> {
    let mut rows: Vec<BreakdownRow> = bucket
        .iter()
        .map(|(name, actual)| BreakdownRow {
            name: name.clone(),
            actual: *actual,
        })
        .collect();
    rows.sort_by(|a, b| b.actual.cmp(&a.actual));
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRank {
    pub name: String,
    pub actual: Decimal,
    pub life_cycle: String,
}

/// The `limit` best-selling products with their first-seen lifecycle.
pub fn top_products(buckets: &SalesBuckets, limit: usize) -> Vec<ProductRank> {
    ranked(&buckets.by_product)
        .into_iter()
        .take(limit)
        .map(|row| {
            let life_cycle = buckets
                .product_life_cycle
                .get(&row.name)
                .cloned()
                .flatten()
                .unwrap_or_else(|| UNDEFINED_LIFE_CYCLE.to_string());
            ProductRank {
                name: row.name,
                actual: row.actual,
                life_cycle,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamLineRow {
    pub name: String,
    pub actual: Decimal,
    pub share_of_total_pct: Decimal,
}

/// Sales of one team split by commercial line, measured against the team's goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamBreakdown {
    pub team: String,
    pub rows: Vec<TeamLineRow>,
    pub goal: Decimal,
    pub actual: Decimal,
    pub attainment_pct: Decimal,
}

pub fn team_breakdown(team: &str, team_by_line: &AggregateBucket, goal: Decimal) -> TeamBreakdown {
    let actual: Decimal = team_by_line.values().copied().sum();
    let rows = ranked(team_by_line)
        .into_iter()
        .map(|row| TeamLineRow {
            share_of_total_pct: share_pct(row.actual, actual),
            name: row.name,
            actual: row.actual,
        })
        .collect();

    TeamBreakdown {
        team: team.to_string(),
        rows,
        goal,
        actual,
        attainment_pct: attainment_pct(actual, goal),
    }
}

/// Commercial lines a user can pick: lines with sales or goals, minus the `exclusions`, sorted.
pub fn available_lines(
    lines_seen: &BTreeSet<String>,
    goals: &GoalSheet,
    exclusions: &[String],
) -> Vec<String> {
    lines_seen
        .iter()
        .map(|name| name.to_uppercase())
        .chain(goals.keys().map(|key| display_name_from_key(key)))
        .filter(|name| !name.is_empty() && !is_listed(name, exclusions))
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{Aggregator, Scope};
    use crate::config::DashboardConfig;
    use crate::schema::{GoalEntry, SalesLine, SellerRef};
    use pretty_assertions::assert_eq;

    fn bucket(entries: &[(&str, Decimal)]) -> AggregateBucket {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    fn exclusions() -> Vec<String> {
        DashboardConfig::default().table_exclusions
    }

    fn company_buckets() -> SalesBuckets {
        SalesBuckets {
            by_line_total: bucket(&[
                ("PETMEDICA", dec!(600)),
                ("AGROVET", dec!(300)),
                ("ECOMMERCE", dec!(100)),
            ]),
            by_line_new_product: bucket(&[("PETMEDICA", dec!(60)), ("ECOMMERCE", dec!(10))]),
            by_line_near_expiry: bucket(&[("AGROVET", dec!(30))]),
            ..Default::default()
        }
    }

    fn company_goals() -> GoalSheet {
        let mut goals = GoalSheet::new();
        goals.set("petmedica", GoalEntry::new(dec!(1000)).with_new_product(dec!(100)));
        goals.set("agrovet", GoalEntry::new(dec!(250)));
        goals.set("pet_nutriscience", GoalEntry::new(dec!(400)));
        goals.set("ecommerce", GoalEntry::new(dec!(50)));
        goals
    }

    #[test]
    fn test_guarded_percentages() {
        assert_eq!(attainment_pct(dec!(250), dec!(1000)), dec!(25));
        assert_eq!(attainment_pct(dec!(-40), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(attainment_pct(dec!(10), dec!(-5)), Decimal::ZERO);
        assert_eq!(share_pct(dec!(1), dec!(4)), dec!(25));
        assert_eq!(share_pct(dec!(1), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(share_pct(dec!(1), dec!(-10)), Decimal::ZERO);
    }

    #[test]
    fn test_percentages_out_of_range_are_zero() {
        assert_eq!(attainment_pct(Decimal::MAX, dec!(0.000001)), Decimal::ZERO);
        assert_eq!(attainment_pct(dec!(1000000000000000000000000000), dec!(0.5)), Decimal::ZERO);
        assert_eq!(share_pct(Decimal::MIN, dec!(0.01)), Decimal::ZERO);
        assert_eq!(attainment_pct(dec!(100000000000000000000), dec!(100000000000000000000)), dec!(100));
    }

    #[test]
    fn test_reconcile_lines_union_of_sales_and_goals() {
        let table = reconcile(&company_buckets(), &company_goals(), &exclusions());

        let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["agrovet", "pet_nutriscience", "petmedica"]);

        let petmedica = table.get("petmedica").unwrap();
        assert_eq!(petmedica.name, "PETMEDICA");
        assert_eq!(petmedica.attainment_pct, dec!(60));
        assert_eq!(petmedica.attainment_new_pct, dec!(60));
        assert_eq!(petmedica.share_of_total_pct, dec!(60));

        let agrovet = table.get("agrovet").unwrap();
        assert_eq!(agrovet.attainment_pct, dec!(120));
        assert_eq!(agrovet.actual_near_expiry, dec!(30));

        let nutriscience = table.get("pet_nutriscience").unwrap();
        assert_eq!(nutriscience.name, "PET NUTRISCIENCE");
        assert_eq!(nutriscience.actual, Decimal::ZERO);
        assert_eq!(nutriscience.goal, dec!(400));
    }

    #[test]
    fn test_totals_include_excluded_lines() {
        let with_list = reconcile(&company_buckets(), &company_goals(), &exclusions());
        let without_list = reconcile(&company_buckets(), &company_goals(), &[]);

        assert_eq!(with_list.totals, without_list.totals);
        assert_eq!(with_list.totals.goal, dec!(1700));
        assert_eq!(with_list.totals.actual, dec!(1000));
        assert_eq!(with_list.totals.actual_new_product, dec!(70));
        assert_eq!(with_list.totals.near_expiry, dec!(30));
        assert!(with_list.get("ecommerce").is_none());
        assert!(without_list.get("ecommerce").is_some());
    }

    #[test]
    fn test_negative_actual_without_goal() {
        let buckets = SalesBuckets {
            by_line_total: bucket(&[("TERCEROS", dec!(-100))]),
            ..Default::default()
        };
        let table = reconcile(&buckets, &GoalSheet::new(), &exclusions());
        let row = table.get("terceros").unwrap();
        assert_eq!(row.actual, dec!(-100));
        assert_eq!(row.attainment_pct, Decimal::ZERO);
        assert_eq!(row.share_of_total_pct, Decimal::ZERO);
        assert_eq!(table.totals.attainment_pct, Decimal::ZERO);
    }

    #[test]
    fn test_orderings_are_stable() {
        let buckets = SalesBuckets {
            by_line_total: bucket(&[("AVIVET", dec!(50)), ("OTROS", dec!(50)), ("ZOO", dec!(90))]),
            ..Default::default()
        };
        let table = reconcile(&buckets, &GoalSheet::new(), &[]);

        let by_actual: Vec<&str> = table.by_actual().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(by_actual, vec!["ZOO", "AVIVET", "OTROS"]);

        let by_name: Vec<&str> = table.by_name().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(by_name, vec!["AVIVET", "OTROS", "ZOO"]);
    }

    fn line_sale(seller: Option<(i64, &str)>, balance: Decimal) -> SalesLine {
        SalesLine {
            balance: Some(balance),
            commercial_line_name: Some("PETMEDICA".to_string()),
            seller: seller.map(|(id, name)| SellerRef {
                id,
                name: name.to_string(),
            }),
            product_name: "PRODUCT".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_reconcile_sellers() {
        let config = DashboardConfig::default();
        let buckets = Aggregator::new(&config, Scope::line("PETMEDICA")).aggregate(&[
            line_sale(Some((1, "Ana")), dec!(400)),
            line_sale(Some((2, "Beto")), dec!(300)),
            line_sale(Some((3, "Caro")), dec!(-50)),
            line_sale(None, dec!(-50)),
        ]);

        let members: BTreeSet<String> = ["1", "2", "4"].iter().map(|s| s.to_string()).collect();
        let mut seller_goals = SellerGoals::new();
        seller_goals.insert("1".to_string(), GoalEntry::new(dec!(500)));
        seller_goals.insert("3".to_string(), GoalEntry::new(dec!(999)));
        seller_goals.insert("4".to_string(), GoalEntry::new(dec!(100)));
        let directory: BTreeMap<String, String> = [("4".to_string(), "Dani".to_string())].into();

        let table = reconcile_sellers(&buckets, &seller_goals, &members, &directory);

        // Caro is hidden (negative actual) but still subtracts from the total.
        assert!(table.get("3").is_none());
        assert_eq!(table.totals.actual, dec!(600));
        // Goals only for official members.
        assert_eq!(table.totals.goal, dec!(600));
        assert_eq!(table.totals.attainment_pct, dec!(100));

        let ana = table.get("1").unwrap();
        assert_eq!(ana.attainment_pct, dec!(80));
        assert_eq!(ana.share_of_total_pct, dec!(400) / dec!(600) * dec!(100));

        let dani = table.get("4").unwrap();
        assert_eq!(dani.name, "Dani");
        assert_eq!(dani.actual, Decimal::ZERO);

        let adjustments = table.get(ADJUSTMENTS_KEY).unwrap();
        assert_eq!(adjustments.actual, dec!(-50));
        assert_eq!(adjustments.goal, Decimal::ZERO);

        let order: Vec<&str> = table.by_actual().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(order, vec!["1", "2", "4", ADJUSTMENTS_KEY]);
    }

    #[test]
    fn test_seller_with_only_zero_lines_keeps_row() {
        let config = DashboardConfig::default();
        let buckets = Aggregator::new(&config, Scope::line("PETMEDICA")).aggregate(&[
            line_sale(Some((1, "Ana")), dec!(400)),
            line_sale(Some((8, "Hugo")), dec!(120)),
            line_sale(Some((8, "Hugo")), dec!(-120)),
            line_sale(Some((9, "Iris")), Decimal::ZERO),
        ]);
        let members: BTreeSet<String> = ["1".to_string()].into();

        let table = reconcile_sellers(&buckets, &SellerGoals::new(), &members, &BTreeMap::new());

        let iris = table.get("9").unwrap();
        assert_eq!(iris.name, "Iris");
        assert_eq!(iris.actual, Decimal::ZERO);
        assert_eq!(table.get("8").unwrap().actual, Decimal::ZERO);
        assert_eq!(table.totals.actual, dec!(400));
    }

    #[test]
    fn test_seller_name_fallback() {
        let members: BTreeSet<String> = ["77".to_string()].into();
        let table = reconcile_sellers(
            &SalesBuckets::default(),
            &SellerGoals::new(),
            &members,
            &BTreeMap::new(),
        );
        assert_eq!(table.get("77").unwrap().name, "Vendedor ID 77");
        assert!(table.get(ADJUSTMENTS_KEY).is_none());
    }

    #[test]
    fn test_top_products_and_life_cycles() {
        let mut buckets = SalesBuckets {
            by_product: bucket(&[
                ("A", dec!(10)),
                ("B", dec!(70)),
                ("C", dec!(40)),
                ("D", dec!(5)),
            ]),
            ..Default::default()
        };
        buckets
            .product_life_cycle
            .insert("B".to_string(), Some("nuevo".to_string()));
        buckets.product_life_cycle.insert("C".to_string(), None);

        let top = top_products(&buckets, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "B");
        assert_eq!(top[0].life_cycle, "nuevo");
        assert_eq!(top[1].name, "C");
        assert_eq!(top[1].life_cycle, UNDEFINED_LIFE_CYCLE);
    }

    #[test]
    fn test_team_breakdown_shares() {
        let team = team_breakdown(
            "ecommerce",
            &bucket(&[("PETMEDICA", dec!(75)), ("N/A", dec!(25))]),
            dec!(200),
        );
        assert_eq!(team.actual, dec!(100));
        assert_eq!(team.attainment_pct, dec!(50));
        assert_eq!(team.rows[0].name, "PETMEDICA");
        assert_eq!(team.rows[0].share_of_total_pct, dec!(75));
        assert_eq!(team.rows[1].share_of_total_pct, dec!(25));
    }

    #[test]
    fn test_available_lines() {
        let seen: BTreeSet<String> = ["PETMEDICA", "ECOMMERCE", "TERCEROS"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut goals = GoalSheet::new();
        goals.set("pet_nutriscience", GoalEntry::new(dec!(1)));
        goals.set("licitacion", GoalEntry::new(dec!(1)));

        let lines = available_lines(
            &seen,
            &goals,
            &DashboardConfig::default().line_selector_exclusions,
        );
        assert_eq!(lines, vec!["PET NUTRISCIENCE", "PETMEDICA", "TERCEROS"]);
    }
}
