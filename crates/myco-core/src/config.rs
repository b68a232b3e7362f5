use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MycoError, Result};
use crate::types::MycoConfig;

const MYCO_DIR: &str = ".myco";
const CONFIG_FILE: &str = "myco.config.yaml";
const GROWS_FILE: &str = "grows.jsonl";
const STRAINS_FILE: &str = "strains.jsonl";
const SUPPLIES_FILE: &str = "supplies.jsonl";
const FIRED_FILE: &str = "reminders-fired.json";

pub const MYCO_README: &str = r#"# .myco/

Grow records managed by `myco`.

## Key Commands

- `myco new --strain <name>`  Start tracking a grow
- `myco list`                 List active grows
- `myco advance <id>`         Move a grow to its next stage
- `myco flush add <id>`       Record a new flush
- `myco supply add <name>`    Catalogue a supply and its unit cost
- `myco analytics`            Summary statistics
- `myco remind`               Stage reminders that are due

## Structure

- `myco.config.yaml`     Configuration
- `grows.jsonl`          One grow per line
- `strains.jsonl`        Strain catalogue
- `supplies.jsonl`       Supply catalogue
- `reminders-fired.json` Reminders already delivered
"#;

static STRAIN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\p{Cc}]+$").expect("static regex"));

static DIGEST_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("static regex"));

pub fn get_myco_dir(cwd: &Path) -> PathBuf {
    cwd.join(MYCO_DIR)
}

pub fn get_config_path(cwd: &Path) -> PathBuf {
    get_myco_dir(cwd).join(CONFIG_FILE)
}

pub fn get_grows_path(cwd: &Path) -> PathBuf {
    get_myco_dir(cwd).join(GROWS_FILE)
}

pub fn get_strains_path(cwd: &Path) -> PathBuf {
    get_myco_dir(cwd).join(STRAINS_FILE)
}

pub fn get_supplies_path(cwd: &Path) -> PathBuf {
    get_myco_dir(cwd).join(SUPPLIES_FILE)
}

pub fn get_fired_path(cwd: &Path) -> PathBuf {
    get_myco_dir(cwd).join(FIRED_FILE)
}

pub fn validate_strain_name(name: &str) -> Result<()> {
    if !STRAIN_NAME_RE.is_match(name.trim()) {
        return Err(MycoError::ValidationError(format!(
            "invalid strain name {name:?}: must be non-blank with no control characters"
        )));
    }
    Ok(())
}

pub fn validate_config(config: &MycoConfig) -> Result<()> {
    if !DIGEST_TIME_RE.is_match(&config.reminders.digest_time) {
        return Err(MycoError::ValidationError(format!(
            "reminders.digest_time must be HH:MM, got \"{}\"",
            config.reminders.digest_time
        )));
    }
    if config.currency.trim().is_empty() {
        return Err(MycoError::ValidationError(
            "currency cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Read and validate the config. A missing file yields the defaults.
pub fn read_config(cwd: &Path) -> Result<MycoConfig> {
    let config_path = get_config_path(cwd);
    let config: MycoConfig = match fs::read_to_string(&config_path) {
        Ok(content) => serde_yaml::from_str(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => MycoConfig::default(),
        Err(e) => return Err(e.into()),
    };
    validate_config(&config)?;
    Ok(config)
}

pub fn write_config(config: &MycoConfig, cwd: &Path) -> Result<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    fs::write(get_config_path(cwd), content)?;
    Ok(())
}

pub fn ensure_myco_dir(cwd: &Path) -> Result<()> {
    if !get_myco_dir(cwd).is_dir() {
        return Err(MycoError::NotInitialized);
    }
    Ok(())
}

/// Create `.myco/` with default config and empty data files. Existing files
/// are left alone.
pub fn init_myco_dir(cwd: &Path) -> Result<()> {
    let myco_dir = get_myco_dir(cwd);
    fs::create_dir_all(&myco_dir)?;

    if !get_config_path(cwd).exists() {
        write_config(&MycoConfig::default(), cwd)?;
    }
    for path in [
        get_grows_path(cwd),
        get_strains_path(cwd),
        get_supplies_path(cwd),
    ] {
        if !path.exists() {
            fs::write(&path, "")?;
        }
    }

    let readme_path = myco_dir.join("README.md");
    if !readme_path.exists() {
        fs::write(&readme_path, MYCO_README)?;
    }

    tracing::debug!(dir = %myco_dir.display(), "initialized");
    Ok(())
}
