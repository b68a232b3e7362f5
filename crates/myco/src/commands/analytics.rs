use anyhow::Result;
use chrono::Utc;

use crate::cli::{AnalyticsArgs, GroupBy};
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::analytics::{self, AnalyticsOptions, ContaminationGroup, GrowFilter};
use myco_core::{format, storage};

use super::parse_day_arg;

pub fn run(ctx: &RuntimeContext, args: &AnalyticsArgs) -> Result<()> {
    let cfg = ctx.load_config()?;
    let filter = GrowFilter {
        strain: args
            .strain
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from),
        from: args.from.as_deref().map(|d| parse_day_arg("from", d)).transpose()?,
        to: args.to.as_deref().map(|d| parse_day_arg("to", d)).transpose()?,
    };
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            print_warning(&format!("--from {from} is after --to {to}; nothing will match."));
        }
    }

    let grows = storage::read_grows(&ctx.grows_path())?;
    let supplies = storage::read_supplies(&ctx.supplies_path())?;
    let options = AnalyticsOptions {
        filter,
        include_inactive: args.all,
        contamination_group: match args.group_by {
            GroupBy::Strain => ContaminationGroup::Strain,
            GroupBy::Recipe => ContaminationGroup::Recipe,
        },
    };
    let report = analytics::analyze(&grows, &[], &supplies, &options, Utc::now());

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "analytics",
            "report": report,
        }));
    } else {
        println!("{}", format::format_analytics(&report, &cfg.currency));
    }

    Ok(())
}
