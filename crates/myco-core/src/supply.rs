//! Supply catalogue lookups, recipe costing and stock consumption.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analytics::round2;
use crate::error::{MycoError, Result};
use crate::normalize::name_key;
use crate::types::{RecipeItem, Supply};

/// Find a supply by exact id, then by case-insensitive name.
pub fn find_supply(supplies: &[Supply], ident: &str) -> Option<usize> {
    let ident = ident.trim();
    if ident.is_empty() {
        return None;
    }
    supplies.iter().position(|s| s.id == ident).or_else(|| {
        let want = name_key(ident);
        supplies.iter().position(|s| name_key(&s.name) == want)
    })
}

pub fn validate_supply(supply: &Supply) -> Result<()> {
    if supply.name.trim().is_empty() {
        return Err(MycoError::ValidationError(
            "supply name cannot be empty".to_string(),
        ));
    }
    if !supply.cost.is_finite() || supply.cost < 0.0 {
        return Err(MycoError::InvalidCost(supply.cost));
    }
    if !supply.quantity.is_finite() || supply.quantity < 0.0 {
        return Err(MycoError::ValidationError(format!(
            "quantity must be a finite, non-negative number, got {}",
            supply.quantity
        )));
    }
    Ok(())
}

/// Amount actually drawn from stock. Count units round up to whole items.
fn drawn_amount(supply: &Supply, amount: f64) -> f64 {
    let amount = amount.max(0.0);
    if supply.is_count_unit() {
        amount.ceil()
    } else {
        amount
    }
}

fn catalogued<'a>(
    item: &RecipeItem,
    supplies: &'a [Supply],
) -> Option<(usize, &'a Supply, f64)> {
    let idx = find_supply(supplies, item.supply_id.as_deref()?)?;
    let supply = &supplies[idx];
    Some((idx, supply, drawn_amount(supply, item.amount.unwrap_or(0.0))))
}

/// Cost of the catalogued items in a recipe: unit cost times amount.
/// `None` when no item references a catalogued supply.
pub fn recipe_cost(items: &[RecipeItem], supplies: &[Supply]) -> Option<f64> {
    let mut total: Option<f64> = None;
    for item in items {
        if let Some((_, supply, amount)) = catalogued(item, supplies) {
            *total.get_or_insert(0.0) += supply.cost * amount;
        }
    }
    total.map(round2)
}

/// One stock change made by [`consume`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    pub supply_id: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub before: f64,
    pub after: f64,
    pub unit_cost: f64,
}

/// Draw each catalogued item's amount from stock. Stock never goes below zero.
pub fn consume(
    supplies: &mut [Supply],
    items: &[RecipeItem],
    now: DateTime<Utc>,
) -> Vec<Consumption> {
    let mut applied = Vec::new();
    for item in items {
        let Some((idx, _, amount)) = catalogued(item, supplies) else {
            continue;
        };
        if amount <= 0.0 {
            continue;
        }
        let supply = &mut supplies[idx];
        let before = supply.quantity;
        supply.quantity = (before - amount).max(0.0);
        supply.last_updated_at = Some(now);
        applied.push(Consumption {
            supply_id: supply.id.clone(),
            name: supply.name.clone(),
            amount,
            unit: supply.unit.clone(),
            before,
            after: supply.quantity,
            unit_cost: supply.cost,
        });
    }
    applied
}
