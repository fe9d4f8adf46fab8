//! Collaborators the dashboard builder talks to: where sales lines come from and where goals live.

use crate::error::{Result, SalesAttainmentError};
use crate::period::Period;
use crate::schema::{GoalSheet, SalesLine, Seller, SellerGoals};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Read-only access to posted sales lines.
pub trait SalesLineSource {
    /// Lines with an invoice date in `date_from..=date_to`, at most `limit` of them.
    fn fetch_lines(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<SalesLine>>;

    /// Seller directory used to name team members who have no sales in the window.
    fn sellers(&self) -> Result<Vec<Seller>> {
        Ok(Vec::new())
    }
}

/// Goal persistence. A period or line with nothing stored reads as empty.
pub trait GoalStore {
    fn get_goals(&self, period: &Period) -> Result<GoalSheet>;

    /// Upserts every entry of `sheet`; keys not in `sheet` keep their stored goals.
    fn put_goals(&mut self, period: &Period, sheet: &GoalSheet) -> Result<()>;

    /// Per-seller goals of one commercial line (`line_key` as in `pet_nutriscience`).
    fn get_seller_goals(&self, period: &Period, line_key: &str) -> Result<SellerGoals>;

    fn put_seller_goals(&mut self, period: &Period, line_key: &str, goals: &SellerGoals)
        -> Result<()>;

    /// Seller ids officially assigned to a team. Line teams share the line's key.
    fn team_members(&self, team_key: &str) -> Result<BTreeSet<String>>;

    fn set_team_members(&mut self, team_key: &str, members: BTreeSet<String>) -> Result<()>;
}

/// Goal store kept in memory, for tests and single-process tools.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGoalStore {
    goals: BTreeMap<Period, GoalSheet>,
    seller_goals: BTreeMap<(Period, String), SellerGoals>,
    teams: BTreeMap<String, BTreeSet<String>>,
}

impl InMemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goals(mut self, period: Period, sheet: GoalSheet) -> Self {
        self.goals.insert(period, sheet);
        self
    }

    pub fn with_team(mut self, team_key: &str, members: &[&str]) -> Self {
        self.teams.insert(
            team_key.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.goals.keys()
    }
}

impl GoalStore for InMemoryGoalStore {
    fn get_goals(&self, period: &Period) -> Result<GoalSheet> {
        Ok(self.goals.get(period).cloned().unwrap_or_default())
    }

    fn put_goals(&mut self, period: &Period, sheet: &GoalSheet) -> Result<()> {
        sheet.validate()?;
        let stored = self.goals.entry(*period).or_default();
        for (key, entry) in sheet.iter() {
            stored.set(key, entry.clone());
        }
        Ok(())
    }

    fn get_seller_goals(&self, period: &Period, line_key: &str) -> Result<SellerGoals> {
        Ok(self
            .seller_goals
            .get(&(*period, line_key.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn put_seller_goals(
        &mut self,
        period: &Period,
        line_key: &str,
        goals: &SellerGoals,
    ) -> Result<()> {
        for (seller_id, entry) in goals {
            entry.validate(seller_id)?;
        }
        let stored = self
            .seller_goals
            .entry((*period, line_key.to_string()))
            .or_default();
        for (seller_id, entry) in goals {
            stored.insert(seller_id.clone(), entry.clone());
        }
        Ok(())
    }

    fn team_members(&self, team_key: &str) -> Result<BTreeSet<String>> {
        Ok(self.teams.get(team_key).cloned().unwrap_or_default())
    }

    fn set_team_members(&mut self, team_key: &str, members: BTreeSet<String>) -> Result<()> {
        if team_key.trim().is_empty() {
            return Err(SalesAttainmentError::GoalStore(
                "team key must not be empty".to_string(),
            ));
        }
        self.teams.insert(team_key.to_string(), members);
        Ok(())
    }
}

/// Source serving a fixed set of lines, filtered by invoice date like the ERP query.
/// Lines without an invoice date are always returned.
#[derive(Debug, Clone, Default)]
pub struct StaticSalesSource {
    lines: Vec<SalesLine>,
    sellers: Vec<Seller>,
}

impl StaticSalesSource {
    pub fn new(lines: Vec<SalesLine>) -> Self {
        Self {
            lines,
            sellers: Vec::new(),
        }
    }

    pub fn with_sellers(mut self, sellers: Vec<Seller>) -> Self {
        self.sellers = sellers;
        self
    }
}

impl SalesLineSource for StaticSalesSource {
    fn fetch_lines(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
        limit: usize,
    ) -> Result<Vec<SalesLine>> {
        Ok(self
            .lines
            .iter()
            .filter(|line| {
                line.invoice_date
                    .map_or(true, |date| date >= date_from && date <= date_to)
            })
            .take(limit)
            .cloned()
            .collect())
    }

    fn sellers(&self) -> Result<Vec<Seller>> {
        Ok(self.sellers.clone())
    }
}
