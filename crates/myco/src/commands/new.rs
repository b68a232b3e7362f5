use anyhow::Result;
use chrono::Utc;

use crate::cli::NewArgs;
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::lifecycle::{self, NewGrow};
use myco_core::types::{RecipeItem, Supply};
use myco_core::{config, id, storage, supply};

use super::parse_datetime_arg;

/// `NAME` or `NAME:AMOUNT`. A suffix that isn't a number stays part of the name.
/// A name or ID found in the supply catalogue is linked by ID.
fn parse_item(raw: &str, supplies: &[Supply]) -> RecipeItem {
    let raw = raw.trim();
    let (name, amount) = match raw.rsplit_once(':') {
        Some((name, amount)) => match amount.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => (name.trim(), Some(n)),
            _ => (raw, None),
        },
        None => (raw, None),
    };
    match supply::find_supply(supplies, name) {
        Some(idx) => RecipeItem {
            supply_id: Some(supplies[idx].id.clone()),
            amount,
            ..RecipeItem::default()
        },
        None => RecipeItem {
            name: Some(name.to_string()),
            amount,
            ..RecipeItem::default()
        },
    }
}

pub fn run(ctx: &RuntimeContext, args: &NewArgs) -> Result<()> {
    ctx.load_config()?;
    config::validate_strain_name(&args.strain)?;

    let now = Utc::now();
    let inoculated = args
        .inoculated
        .as_deref()
        .map(|d| parse_datetime_arg("inoculated", d))
        .transpose()?;

    let path = ctx.grows_path();
    let existing = storage::read_grows(&path)?;
    let grow_id = id::generate_grow_id(
        &args.strain,
        now,
        existing.iter().map(|g| g.id.as_str()),
    );

    let supplies_path = ctx.supplies_path();
    let supplies = storage::read_supplies(&supplies_path)?;
    let recipe_items: Vec<RecipeItem> = args
        .items
        .iter()
        .map(|i| parse_item(i, &supplies))
        .collect();
    let cost = args.cost.or_else(|| supply::recipe_cost(&recipe_items, &supplies));

    let grow = lifecycle::new_grow(
        grow_id,
        NewGrow {
            strain: args.strain.clone(),
            grow_type: args.grow_type.clone(),
            abbreviation: args.abbr.clone(),
            cost,
            inoculated,
            recipe_name: args.recipe.clone(),
            recipe_items,
        },
        now,
    )?;
    storage::append_grow(&path, &grow)?;
    tracing::debug!(id = %grow.id, strain = %grow.strain, "grow created");

    let consumed = if args.no_consume {
        Vec::new()
    } else {
        storage::consume_supplies(&supplies_path, &grow.recipe_items, now)?
    };
    for c in &consumed {
        tracing::debug!(
            supply = %c.supply_id,
            amount = c.amount,
            after = c.after,
            "supply consumed"
        );
    }

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "new",
            "id": grow.id,
            "grow": grow,
            "consumed": consumed,
        }));
    } else {
        print_success(&format!(
            "Created grow {} ({}, {}).",
            grow.id,
            grow.label(),
            grow.grow_type
        ));
        for c in &consumed {
            let amount = format!("{} {}", c.amount, c.unit);
            print_dim(&format!(
                "  Used {} of {} ({} left)",
                amount.trim_end(),
                c.name,
                c.after
            ));
        }
    }

    Ok(())
}
