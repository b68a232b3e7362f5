use anyhow::Result;
use chrono::Utc;

use crate::cli::RemindArgs;
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::reminder::{self, FiredReminders};
use myco_core::{config, format, storage};

use super::parse_datetime_arg;

pub fn run(ctx: &RuntimeContext, args: &RemindArgs) -> Result<()> {
    let cfg = ctx.load_config()?;
    let now = match args.now.as_deref() {
        Some(raw) => parse_datetime_arg("now", raw)?,
        None => Utc::now(),
    };

    let fired_path = config::get_fired_path(&ctx.cwd);
    let mut fired = FiredReminders::load(&fired_path)?;
    let grows = storage::read_grows(&ctx.grows_path())?;
    let due = reminder::due_reminders(&grows, &cfg.reminders, now, &fired)?;

    if args.mark && !due.is_empty() {
        for r in &due {
            fired.mark(r.id.clone());
        }
        fired.save(&fired_path)?;
    }

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "remind",
            "enabled": cfg.reminders.enabled,
            "marked": args.mark,
            "reminders": due,
        }));
    } else if !cfg.reminders.enabled {
        print_warning("Reminders are disabled. Set reminders.enabled in .myco/myco.config.yaml.");
    } else {
        println!("{}", format::format_reminders(&due, now));
        if args.mark && !due.is_empty() {
            print_dim(&format!("Marked {} reminder(s) as delivered.", due.len()));
        }
    }

    Ok(())
}
