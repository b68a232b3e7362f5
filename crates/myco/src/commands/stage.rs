use anyhow::Result;
use chrono::Utc;

use crate::cli::{AdvanceArgs, StageArgs};
use crate::context::RuntimeContext;
use myco_core::lifecycle;

use super::{parse_datetime_arg, parse_stage_arg, patch_grow, report_patch};

pub fn advance(ctx: &RuntimeContext, args: &AdvanceArgs) -> Result<()> {
    let at = args
        .date
        .as_deref()
        .map(|d| parse_datetime_arg("date", d))
        .transpose()?;
    let now = Utc::now();

    let patched = patch_grow(ctx, &args.id, |g| lifecycle::advance(g, at, now))?;
    let grow = &patched.grow;
    report_patch(
        ctx,
        "advance",
        &patched,
        &format!("{} advanced to {}.", grow.label(), grow.stage),
        &format!("{} is at {} and cannot advance further.", grow.label(), grow.stage),
    )
}

pub fn set(ctx: &RuntimeContext, args: &StageArgs) -> Result<()> {
    let stage = parse_stage_arg(&args.stage)?;
    let at = args
        .date
        .as_deref()
        .map(|d| parse_datetime_arg("date", d))
        .transpose()?;
    let now = Utc::now();

    let patched = patch_grow(ctx, &args.id, |g| lifecycle::set_stage(g, stage, at, now))?;
    let grow = &patched.grow;
    report_patch(
        ctx,
        "stage",
        &patched,
        &format!("{} set to {}.", grow.label(), grow.stage),
        &format!("{} is already {}.", grow.label(), grow.stage),
    )
}
