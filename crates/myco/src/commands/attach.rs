use anyhow::Result;
use chrono::Utc;

use crate::cli::{NoteArgs, PhotoArgs};
use crate::context::RuntimeContext;
use myco_core::lifecycle;

use super::{parse_stage_arg, patch_grow, report_patch};

pub fn note(ctx: &RuntimeContext, args: &NoteArgs) -> Result<()> {
    let stage = args.stage.as_deref().map(parse_stage_arg).transpose()?;
    let now = Utc::now();
    let patched = patch_grow(ctx, &args.id, |g| {
        lifecycle::add_note(g, stage, &args.text, now).map(Some)
    })?;
    let grow = &patched.grow;
    let filed_under = grow
        .stage_notes
        .last()
        .map(|n| n.stage.as_str())
        .unwrap_or_default();
    report_patch(
        ctx,
        "note",
        &patched,
        &format!("Note added to {} under {filed_under}.", grow.label()),
        "",
    )
}

pub fn photo(ctx: &RuntimeContext, args: &PhotoArgs) -> Result<()> {
    let stage = args.stage.as_deref().map(parse_stage_arg).transpose()?;
    let now = Utc::now();
    let patched = patch_grow(ctx, &args.id, |g| {
        lifecycle::add_photo(g, stage, &args.path, args.caption.as_deref(), now).map(Some)
    })?;
    let grow = &patched.grow;
    report_patch(
        ctx,
        "photo",
        &patched,
        &format!("Photo attached to {}.", grow.label()),
        "",
    )
}
