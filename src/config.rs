use crate::error::{Result, SalesAttainmentError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DashboardConfig {
    #[schemars(
        description = "Maximum number of sales lines requested from the ERP for one dashboard build."
    )]
    pub row_limit: usize,

    #[schemars(
        description = "Distribution route ids whose sales count as near-expiry (short shelf life) stock."
    )]
    pub near_expiry_routes: Vec<i64>,

    #[schemars(description = "Product lifecycle value that marks a new product.")]
    pub new_product_stage: String,

    #[schemars(
        description = "Commercial line display names hidden from the company table. Their sales and goals still count toward the headline totals."
    )]
    pub table_exclusions: Vec<String>,

    #[schemars(description = "Commercial line names never offered in the line selector.")]
    pub line_selector_exclusions: Vec<String>,

    #[schemars(description = "How many products the top-products ranking returns.")]
    pub top_products: usize,

    #[schemars(
        description = "Team key whose members' sales are broken down by commercial line on the company dashboard. Its goal is the line goal stored under the same key."
    )]
    pub ecommerce_team: String,

    #[schemars(description = "Commercial line shown when a line dashboard is requested without one.")]
    pub default_line: String,

    #[schemars(description = "E-mail addresses allowed to edit goals.")]
    pub admin_users: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            row_limit: 10_000,
            near_expiry_routes: vec![18, 19],
            new_product_stage: "nuevo".to_string(),
            table_exclusions: vec![
                "LICITACION".to_string(),
                "NINGUNO".to_string(),
                "ECOMMERCE".to_string(),
                "GENVET".to_string(),
                "MARCA BLANCA".to_string(),
            ],
            line_selector_exclusions: vec![
                "LICITACION".to_string(),
                "NINGUNO".to_string(),
                "ECOMMERCE".to_string(),
                "VENTA INTERNACIONAL".to_string(),
            ],
            top_products: 7,
            ecommerce_team: "ecommerce".to_string(),
            default_line: "PETMEDICA".to_string(),
            admin_users: Vec::new(),
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.row_limit == 0 {
            return Err(SalesAttainmentError::InvalidConfig(
                "row_limit must be greater than zero".to_string(),
            ));
        }
        if self.new_product_stage.trim().is_empty() {
            return Err(SalesAttainmentError::InvalidConfig(
                "new_product_stage must not be empty".to_string(),
            ));
        }
        if self.default_line.trim().is_empty() {
            return Err(SalesAttainmentError::InvalidConfig(
                "default_line must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_near_expiry_route(&self, route_id: Option<i64>) -> bool {
        route_id.is_some_and(|id| self.near_expiry_routes.contains(&id))
    }

    pub fn is_new_product(&self, life_cycle: Option<&str>) -> bool {
        life_cycle == Some(self.new_product_stage.as_str())
    }

    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim();
        self.admin_users
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = schemars::schema_for!(DashboardConfig);
        serde_json::to_string_pretty(&schema)
    }
}
