use anyhow::Result;
use chrono::Utc;

use crate::cli::{SupplyAddArgs, SupplyArgs, SupplyCommand, SupplyEditArgs, SupplyIdentArgs};
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::format::format_money;
use myco_core::types::Supply;
use myco_core::{id, storage};

pub fn run(ctx: &RuntimeContext, args: &SupplyArgs) -> Result<()> {
    let cfg = ctx.load_config()?;
    match &args.command {
        SupplyCommand::Add(a) => add(ctx, a),
        SupplyCommand::List => list(ctx, &cfg.currency),
        SupplyCommand::Edit(a) => edit(ctx, a),
        SupplyCommand::Remove(a) => remove(ctx, a),
    }
}

fn add(ctx: &RuntimeContext, args: &SupplyAddArgs) -> Result<()> {
    let path = ctx.supplies_path();
    let now = Utc::now();
    let existing = storage::read_supplies(&path)?;
    let supply = Supply {
        id: id::generate_supply_id(&args.name, now, existing.iter().map(|s| s.id.as_str())),
        name: args.name.trim().to_string(),
        cost: args.cost,
        quantity: args.quantity,
        unit: args.unit.trim().to_string(),
        last_updated_at: Some(now),
        ..Supply::default()
    };
    storage::add_supply(&path, &supply)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "supply add",
            "id": supply.id,
            "supply": supply,
        }));
    } else {
        print_success(&format!("Added supply \"{}\" ({}).", supply.name, supply.id));
    }
    Ok(())
}

fn list(ctx: &RuntimeContext, currency: &str) -> Result<()> {
    let mut supplies = storage::read_supplies(&ctx.supplies_path())?;
    supplies.sort_by_key(|s| s.name.to_lowercase());

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "supply list",
            "count": supplies.len(),
            "supplies": supplies,
        }));
        return Ok(());
    }

    if supplies.is_empty() {
        println!("No supplies yet. Run `myco supply add <name>` to add one.");
        return Ok(());
    }
    for s in &supplies {
        let unit = if s.unit.is_empty() { "unit" } else { s.unit.as_str() };
        println!(
            "[{}] {:<24} {} {unit} in stock, {}/{unit}",
            s.id,
            s.name,
            s.quantity,
            format_money(s.cost, currency)
        );
        if s.quantity <= 0.0 {
            print_dim("  out of stock");
        }
    }
    Ok(())
}

fn edit(ctx: &RuntimeContext, args: &SupplyEditArgs) -> Result<()> {
    let updated = storage::update_supply(&ctx.supplies_path(), &args.supply, |s| {
        if let Some(ref name) = args.name {
            s.name = name.trim().to_string();
        }
        if let Some(cost) = args.cost {
            s.cost = cost;
        }
        if let Some(quantity) = args.quantity {
            s.quantity = quantity;
        }
        if let Some(ref unit) = args.unit {
            s.unit = unit.trim().to_string();
        }
        s.last_updated_at = Some(Utc::now());
    })?;

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "supply edit",
            "supply": updated,
        }));
    } else {
        print_success(&format!("Updated supply \"{}\".", updated.name));
    }
    Ok(())
}

fn remove(ctx: &RuntimeContext, args: &SupplyIdentArgs) -> Result<()> {
    let removed = storage::remove_supply(&ctx.supplies_path(), &args.supply)?;
    let grows = storage::read_grows(&ctx.grows_path())?;
    let in_use = grows
        .iter()
        .filter(|g| {
            g.recipe_items
                .iter()
                .any(|i| i.supply_id.as_deref() == Some(removed.id.as_str()))
        })
        .count();

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "supply remove",
            "id": removed.id,
            "name": removed.name,
            "grows_referencing": in_use,
        }));
    } else {
        print_success(&format!("Removed supply \"{}\".", removed.name));
        if in_use > 0 {
            print_warning(&format!(
                "{in_use} grow(s) still reference this supply; their items will show its ID."
            ));
        }
    }
    Ok(())
}
