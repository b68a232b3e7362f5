use anyhow::Result;

use crate::cli::{Dataset, ListArgs};
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::format;
use myco_core::storage;
use myco_core::types::{Grow, GrowType, Stage, Status};

fn in_dataset(grow: &Grow, dataset: Dataset) -> bool {
    match dataset {
        Dataset::All => true,
        Dataset::Active => grow.status_kind() == Status::Active,
        Dataset::Stored => grow.status_kind() == Status::Stored,
        Dataset::Archived => grow.status_kind() == Status::Archived,
    }
}

fn matches(grow: &Grow, args: &ListArgs) -> bool {
    if !in_dataset(grow, args.dataset) {
        return false;
    }
    if let Some(ref strain) = args.strain {
        if !grow.strain.trim().eq_ignore_ascii_case(strain.trim()) {
            return false;
        }
    }
    if let Some(ref t) = args.grow_type {
        if grow.grow_kind() != GrowType::normalize(t) {
            return false;
        }
    }
    if let Some(ref s) = args.stage {
        if grow.stage_kind() != Stage::normalize(s) {
            return false;
        }
    }
    true
}

pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let cfg = ctx.load_config()?;
    let grows = storage::read_grows(&ctx.grows_path())?;
    let selected: Vec<&Grow> = grows.iter().filter(|g| matches(g, args)).collect();

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "list",
            "count": selected.len(),
            "grows": selected,
        }));
    } else {
        println!("{}", format::format_grow_list(&selected, &cfg.currency));
    }

    Ok(())
}
