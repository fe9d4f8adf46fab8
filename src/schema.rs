use crate::error::{Result, SalesAttainmentError};
use crate::normalizer::{canonical_goal_key, normalize_commercial_line, strip_size_suffix};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Salesperson reference carried by an invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerRef {
    pub id: i64,
    pub name: String,
}

/// Seller directory entry, used to name team members who have no sales yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,
    pub name: String,
}

/// One posted invoice or credit-note line as delivered by the ERP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesLine {
    /// Signed ledger amount. `None` when the record carried no usable balance.
    pub balance: Option<Decimal>,
    pub commercial_line_name: Option<String>,
    pub sales_channel_name: Option<String>,
    pub seller: Option<SellerRef>,
    /// Distribution route id; routes 18 and 19 carry short-shelf-life stock.
    pub route_id: Option<i64>,
    /// "nuevo" for newly launched products.
    pub product_life_cycle: Option<String>,
    pub product_name: String,
    pub pharmaceutical_form_name: Option<String>,
    pub invoice_date: Option<NaiveDate>,
}

/// A [`SalesLine`] with canonical commercial line and product names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLine {
    pub balance: Option<Decimal>,
    /// Uppercased, third-party brands folded into `TERCEROS`; `None` when absent or blank.
    pub commercial_line: Option<String>,
    pub sales_channel: Option<String>,
    pub seller: Option<SellerRef>,
    pub route_id: Option<i64>,
    pub product_life_cycle: Option<String>,
    /// Trimmed, with ATREVIA size suffixes removed. May be empty.
    pub product_name: String,
    pub pharmaceutical_form: Option<String>,
}

impl NormalizedLine {
    /// Amount used in monetary sums: a missing balance contributes zero.
    pub fn amount(&self) -> Decimal {
        self.balance.unwrap_or(Decimal::ZERO)
    }
}

impl From<&SalesLine> for NormalizedLine {
    fn from(line: &SalesLine) -> Self {
        let commercial_line = normalize_commercial_line(line.commercial_line_name.as_deref())
            .filter(|name| !name.is_empty());

        Self {
            balance: line.balance,
            commercial_line,
            sales_channel: line.sales_channel_name.clone(),
            seller: line.seller.clone(),
            route_id: line.route_id,
            product_life_cycle: line
                .product_life_cycle
                .clone()
                .filter(|stage| !stage.trim().is_empty()),
            product_name: strip_size_suffix(line.product_name.trim()),
            pharmaceutical_form: line.pharmaceutical_form_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GoalEntry {
    #[schemars(description = "Monthly sales goal for the commercial line or seller. Zero or positive.")]
    pub goal_total: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(
        description = "Monthly goal for new-product (lifecycle 'nuevo') sales. Optional, zero when absent."
    )]
    pub goal_new_product: Option<Decimal>,
}

impl GoalEntry {
    pub fn new(goal_total: Decimal) -> Self {
        Self {
            goal_total,
            goal_new_product: None,
        }
    }

    pub fn with_new_product(mut self, goal_new_product: Decimal) -> Self {
        self.goal_new_product = Some(goal_new_product);
        self
    }

    pub fn new_product(&self) -> Decimal {
        self.goal_new_product.unwrap_or(Decimal::ZERO)
    }

    pub fn validate(&self, key: &str) -> Result<()> {
        if self.goal_total < Decimal::ZERO {
            return Err(SalesAttainmentError::InvalidGoal {
                key: key.to_string(),
                value: self.goal_total,
            });
        }
        if let Some(value) = self.goal_new_product {
            if value < Decimal::ZERO {
                return Err(SalesAttainmentError::InvalidGoal {
                    key: key.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }

    fn accumulate(&mut self, other: &GoalEntry) {
        self.goal_total += other.goal_total;
        self.goal_new_product = match (self.goal_new_product, other.goal_new_product) {
            (None, None) => None,
            (a, b) => Some(a.unwrap_or(Decimal::ZERO) + b.unwrap_or(Decimal::ZERO)),
        };
    }
}

/// Goals of one period, keyed by canonical commercial-line key (`pet_nutriscience`, `terceros`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GoalSheet {
    entries: BTreeMap<String, GoalEntry>,
}

impl GoalSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts the goal for a key, replacing whatever the sheet held for its canonical key.
    pub fn set(&mut self, raw_key: &str, entry: GoalEntry) {
        self.entries.insert(canonical_goal_key(raw_key), entry);
    }

    /// Adds to the goal for a key; used when several stored keys fold into one line.
    pub fn add(&mut self, raw_key: &str, entry: GoalEntry) {
        self.entries
            .entry(canonical_goal_key(raw_key))
            .or_default()
            .accumulate(&entry);
    }

    pub fn get(&self, key: &str) -> Option<&GoalEntry> {
        self.entries.get(key)
    }

    pub fn goal(&self, key: &str) -> Decimal {
        self.get(key).map(|e| e.goal_total).unwrap_or(Decimal::ZERO)
    }

    pub fn goal_new_product(&self, key: &str) -> Decimal {
        self.get(key).map(GoalEntry::new_product).unwrap_or(Decimal::ZERO)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &GoalEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_goal(&self) -> Decimal {
        self.entries.values().map(|e| e.goal_total).sum()
    }

    pub fn total_goal_new_product(&self) -> Decimal {
        self.entries.values().map(GoalEntry::new_product).sum()
    }

    pub fn validate(&self) -> Result<()> {
        for (key, entry) in &self.entries {
            entry.validate(key)?;
        }
        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(GoalSheet)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Per-seller goals of one commercial line and period, keyed by seller id.
pub type SellerGoals = BTreeMap<String, GoalEntry>;
