use anyhow::Result;

use crate::cli::{StrainArgs, StrainCommand, StrainEditArgs, StrainFields, StrainNameArgs};
use crate::context::RuntimeContext;
use crate::output::*;
use myco_core::types::Strain;
use myco_core::{config, storage};

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

pub fn run(ctx: &RuntimeContext, args: &StrainArgs) -> Result<()> {
    ctx.load_config()?;
    match &args.command {
        StrainCommand::Add(a) => add(ctx, a),
        StrainCommand::List => list(ctx),
        StrainCommand::Edit(a) => edit(ctx, a),
        StrainCommand::Remove(a) => remove(ctx, a),
    }
}

fn add(ctx: &RuntimeContext, args: &StrainFields) -> Result<()> {
    config::validate_strain_name(&args.name)?;
    let strain = Strain {
        name: args.name.trim().to_string(),
        scientific_name: clean(&args.scientific),
        photo_url: clean(&args.photo),
        description: clean(&args.description),
        ..Strain::default()
    };
    storage::add_strain(&ctx.strains_path(), &strain)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "strain add",
            "strain": strain,
        }));
    } else {
        print_success(&format!("Added strain \"{}\".", strain.name));
    }
    Ok(())
}

fn list(ctx: &RuntimeContext) -> Result<()> {
    let mut strains = storage::read_strains(&ctx.strains_path())?;
    strains.sort_by_key(|s| s.name.to_lowercase());

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "strain list",
            "count": strains.len(),
            "strains": strains,
        }));
        return Ok(());
    }

    if strains.is_empty() {
        println!("No strains yet. Run `myco strain add <name>` to add one.");
        return Ok(());
    }
    for s in &strains {
        let sci = s
            .scientific_name
            .as_ref()
            .map(|n| format!(" ({n})"))
            .unwrap_or_default();
        println!("{}{sci}", s.name);
        if let Some(ref d) = s.description {
            print_dim(&format!("  {d}"));
        }
    }
    Ok(())
}

fn edit(ctx: &RuntimeContext, args: &StrainEditArgs) -> Result<()> {
    if let Some(ref new_name) = args.rename {
        config::validate_strain_name(new_name)?;
    }
    let fields = &args.fields;
    let updated = storage::update_strain(&ctx.strains_path(), &fields.name, |s| {
        if let Some(ref new_name) = args.rename {
            s.name = new_name.trim().to_string();
        }
        if fields.scientific.is_some() {
            s.scientific_name = clean(&fields.scientific);
        }
        if fields.photo.is_some() {
            s.photo_url = clean(&fields.photo);
        }
        if fields.description.is_some() {
            s.description = clean(&fields.description);
        }
    })?;

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "strain edit",
            "strain": updated,
        }));
    } else {
        print_success(&format!("Updated strain \"{}\".", updated.name));
    }
    Ok(())
}

fn remove(ctx: &RuntimeContext, args: &StrainNameArgs) -> Result<()> {
    let removed = storage::remove_strain(&ctx.strains_path(), &args.name)?;
    let grows = storage::read_grows(&ctx.grows_path())?;
    let in_use = grows
        .iter()
        .filter(|g| g.strain.trim().eq_ignore_ascii_case(removed.name.trim()))
        .count();

    if ctx.json {
        output_json(&serde_json::json!({
            "success": true,
            "command": "strain remove",
            "name": removed.name,
            "grows_referencing": in_use,
        }));
    } else {
        print_success(&format!("Removed strain \"{}\".", removed.name));
        if in_use > 0 {
            print_warning(&format!(
                "{in_use} grow(s) still name this strain; their records are unchanged."
            ));
        }
    }
    Ok(())
}
