use crate::error::Result;
use crate::period::Period;
use crate::schema::{GoalEntry, GoalSheet, SalesLine, SellerRef};
use chrono::NaiveDate;
use log::warn;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Name half of an ERP `[id, name]` reference. `false`, `null` and short arrays have none.
pub fn display_name_of(field: &Value) -> Option<String> {
    match field {
        Value::Array(pair) if pair.len() > 1 => pair[1].as_str().map(str::to_string),
        _ => None,
    }
}

/// Id half of an ERP `[id, name]` reference.
pub fn id_of(field: &Value) -> Option<i64> {
    match field {
        Value::Array(pair) => pair.first().and_then(Value::as_i64),
        _ => None,
    }
}

fn text_of(field: Option<&Value>) -> Option<String> {
    field.and_then(Value::as_str).map(str::to_string)
}

fn decimal_of(field: Option<&Value>) -> Option<Decimal> {
    match field? {
        Value::Number(number) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        Value::String(text) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    }
}

/// Decodes one ERP invoice-line record. Returns `None` when the record is not a JSON object.
pub fn sales_line_from_erp_record(record: &Value) -> Option<SalesLine> {
    let fields = record.as_object()?;
    let field = |name: &str| fields.get(name).unwrap_or(&Value::Null);

    let seller_field = field("invoice_user_id");
    let seller = match (id_of(seller_field), display_name_of(seller_field)) {
        (Some(id), Some(name)) => Some(SellerRef { id, name }),
        _ => None,
    };

    Some(SalesLine {
        balance: decimal_of(fields.get("balance")),
        commercial_line_name: display_name_of(field("commercial_line_national_id")),
        sales_channel_name: display_name_of(field("sales_channel_id")),
        seller,
        route_id: id_of(field("route_id")),
        product_life_cycle: text_of(fields.get("product_life_cycle")),
        product_name: text_of(fields.get("name")).unwrap_or_default(),
        pharmaceutical_form_name: display_name_of(field("pharmaceutical_forms_id")),
        invoice_date: text_of(fields.get("invoice_date"))
            .and_then(|date| NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()),
    })
}

/// Decodes a batch of ERP records, skipping (and logging) anything that is not an object.
pub fn sales_lines_from_erp_records(records: &[Value]) -> (Vec<SalesLine>, usize) {
    let mut malformed = 0;
    let lines = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let line = sales_line_from_erp_record(record);
            if line.is_none() {
                warn!("Skipping ERP record {}: expected a JSON object", index);
                malformed += 1;
            }
            line
        })
        .collect();
    (lines, malformed)
}

/// One row of a goal spreadsheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalRow {
    /// `YYYY-MM`.
    pub period: String,
    /// Commercial line key or display name (`pet_nutriscience`, `PET NUTRISCIENCE`).
    pub line: String,
    pub goal_total: Decimal,
    #[serde(default)]
    pub goal_new_product: Option<Decimal>,
}

/// Groups flat goal rows into one sheet per period. Rows landing on the same canonical line are
/// summed, so `genvet` and `marca_blanca` rows add up under `terceros`.
pub fn convert_goal_rows(rows: &[GoalRow]) -> Result<BTreeMap<Period, GoalSheet>> {
    let mut sheets: BTreeMap<Period, GoalSheet> = BTreeMap::new();

    for row in rows {
        let period: Period = row.period.parse()?;
        let mut entry = GoalEntry::new(row.goal_total);
        if let Some(new_product) = row.goal_new_product {
            entry = entry.with_new_product(new_product);
        }
        entry.validate(&row.line)?;

        sheets.entry(period).or_default().add(&row.line, entry);
    }

    Ok(sheets)
}
