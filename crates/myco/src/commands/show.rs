use anyhow::Result;
use chrono::Utc;

use crate::cli::IdArgs;
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::analytics::yield_totals;
use myco_core::{format, resolve, storage};

pub fn run(ctx: &RuntimeContext, args: &IdArgs) -> Result<()> {
    let cfg = ctx.load_config()?;
    let grows = storage::read_grows(&ctx.grows_path())?;
    let (_, grow) = resolve::resolve_grow_id(&grows, &args.id)?;
    let supplies = storage::read_supplies(&ctx.supplies_path())?;

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "show",
            "grow": grow,
            "yield": yield_totals(grow),
        }));
    } else {
        println!("{}", format::format_grow_detail(grow, &supplies, &cfg.currency, Utc::now()));
    }

    Ok(())
}
