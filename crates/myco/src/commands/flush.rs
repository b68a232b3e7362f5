use anyhow::{Result, bail};
use chrono::Utc;

use crate::cli::{FlushArgs, FlushCommand, FlushSetArgs, IdArgs};
use crate::context::RuntimeContext;
use myco_core::format::format_grams;
use myco_core::lifecycle::{self, FlushPatch};

use super::{parse_datetime_arg, patch_grow, report_patch};

pub fn run(ctx: &RuntimeContext, args: &FlushArgs) -> Result<()> {
    match &args.command {
        FlushCommand::Add(a) => add(ctx, a),
        FlushCommand::Set(a) => set(ctx, a),
    }
}

fn add(ctx: &RuntimeContext, args: &IdArgs) -> Result<()> {
    let now = Utc::now();
    let patched = patch_grow(ctx, &args.id, |g| lifecycle::add_flush(g, now).map(Some))?;
    let grow = &patched.grow;
    report_patch(
        ctx,
        "flush add",
        &patched,
        &format!("Added flush #{} to {}.", grow.flushes.len(), grow.label()),
        "",
    )
}

fn set(ctx: &RuntimeContext, args: &FlushSetArgs) -> Result<()> {
    if args.index == 0 {
        bail!("flush numbers start at 1");
    }
    let changes = FlushPatch {
        wet: args.wet,
        dry: args.dry,
        date: args
            .date
            .as_deref()
            .map(|d| parse_datetime_arg("date", d))
            .transpose()?,
    };
    if changes == FlushPatch::default() {
        bail!("nothing to update; pass --wet, --dry or --date");
    }
    let now = Utc::now();
    let index = args.index - 1;

    let patched = patch_grow(ctx, &args.id, |g| {
        lifecycle::update_flush(g, index, &changes, now).map(Some)
    })?;
    let grow = &patched.grow;
    let flush = &grow.flushes[index];
    report_patch(
        ctx,
        "flush set",
        &patched,
        &format!(
            "Flush #{} of {}: {} wet / {} dry.",
            args.index,
            grow.label(),
            format_grams(flush.wet),
            format_grams(flush.dry)
        ),
        "",
    )
}
