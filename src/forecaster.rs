use crate::error::{Result, SalesAttainmentError};
use crate::period::ReportingWindow;
use crate::reconciler::attainment_pct;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Linear run-rate projection of a period's sales.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Sales extrapolated to the full period at the current daily average.
    pub projected_period_total: Decimal,
    pub projected_attainment_pct: Decimal,
    /// `max(goal - actual, 0)`.
    pub shortfall: Decimal,
    /// Attainment points per remaining working day needed to reach 100%.
    pub required_daily_pace: Decimal,
    /// Attainment points achieved per elapsed day.
    pub daily_attainment_pct: Decimal,
}

/// Projects `actual` over the whole period after `day_of_period` elapsed days.
///
/// `required_daily_pace` is left at zero; use [`project_window`] for open periods.
pub fn project(
    actual: Decimal,
    goal: Decimal,
    day_of_period: u32,
    days_in_period: u32,
) -> Result<ForecastResult> {
    if days_in_period == 0 {
        return Err(SalesAttainmentError::InvalidArgument {
            field: "days_in_period".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    if day_of_period > days_in_period {
        return Err(SalesAttainmentError::InvalidArgument {
            field: "day_of_period".to_string(),
            reason: format!("{} exceeds the {} days of the period", day_of_period, days_in_period),
        });
    }

    // Out-of-range projections read as zero, like the other guarded ratios.
    let projected_period_total = if day_of_period > 0 {
        actual
            .checked_mul(Decimal::from(days_in_period))
            .and_then(|total| total.checked_div(Decimal::from(day_of_period)))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    let attainment = attainment_pct(actual, goal);
    let daily_attainment_pct = if day_of_period > 0 {
        attainment / Decimal::from(day_of_period)
    } else {
        Decimal::ZERO
    };

    Ok(ForecastResult {
        projected_period_total,
        projected_attainment_pct: attainment_pct(projected_period_total, goal),
        shortfall: goal
            .checked_sub(actual)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO),
        required_daily_pace: Decimal::ZERO,
        daily_attainment_pct,
    })
}

/// [`project`] over a reporting window, adding the required daily pace for the current period.
pub fn project_window(
    actual: Decimal,
    goal: Decimal,
    window: &ReportingWindow,
) -> Result<ForecastResult> {
    let mut forecast = project(actual, goal, window.day_of_period, window.days_in_period)?;
    if window.is_current {
        forecast.required_daily_pace =
            required_daily_pace(actual, goal, window.remaining_working_days());
    }
    Ok(forecast)
}

/// Remaining attainment points spread over the remaining working days. Zero without a goal,
/// once the goal is met, or when no working days are left.
pub fn required_daily_pace(actual: Decimal, goal: Decimal, remaining_days: u32) -> Decimal {
    if goal <= Decimal::ZERO || remaining_days == 0 {
        return Decimal::ZERO;
    }
    let remaining_pct = dec!(100)
        .checked_sub(attainment_pct(actual, goal))
        .unwrap_or(Decimal::ZERO);
    if remaining_pct > Decimal::ZERO {
        remaining_pct / Decimal::from(remaining_days)
    } else {
        Decimal::ZERO
    }
}
