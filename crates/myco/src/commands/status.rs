use anyhow::Result;
use chrono::Utc;

use crate::cli::IdArgs;
use crate::context::RuntimeContext;
use myco_core::lifecycle;

use super::{patch_grow, report_patch};

pub fn archive(ctx: &RuntimeContext, args: &IdArgs) -> Result<()> {
    let now = Utc::now();
    let patched = patch_grow(ctx, &args.id, |g| {
        lifecycle::toggle_archive_grow(g, now).map(Some)
    })?;
    let grow = &patched.grow;
    report_patch(
        ctx,
        "archive",
        &patched,
        &format!("{} is now {}.", grow.label(), grow.status),
        "",
    )
}

pub fn store(ctx: &RuntimeContext, args: &IdArgs) -> Result<()> {
    let now = Utc::now();
    let patched = patch_grow(ctx, &args.id, |g| {
        lifecycle::toggle_store_grow(g, now).map(Some)
    })?;
    let grow = &patched.grow;
    report_patch(
        ctx,
        "store",
        &patched,
        &format!("{} is now {}.", grow.label(), grow.status),
        "",
    )
}

pub fn harvest(ctx: &RuntimeContext, args: &IdArgs) -> Result<()> {
    let now = Utc::now();
    let patched = patch_grow(ctx, &args.id, |g| {
        lifecycle::finish_harvest(g, now).map(Some)
    })?;
    let grow = &patched.grow;
    report_patch(
        ctx,
        "harvest",
        &patched,
        &format!("Harvest finished; {} archived.", grow.label()),
        "",
    )
}
