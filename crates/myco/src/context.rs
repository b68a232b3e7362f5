use std::env;
use std::path::PathBuf;

use myco_core::config;
use myco_core::error::Result;
use myco_core::types::MycoConfig;

use crate::cli::GlobalArgs;

#[derive(Debug)]
pub struct RuntimeContext {
    pub json: bool,
    pub cwd: PathBuf,
}

impl RuntimeContext {
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            json: global.json,
            cwd: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Fail unless `.myco/` exists, then load its config.
    pub fn load_config(&self) -> Result<MycoConfig> {
        config::ensure_myco_dir(&self.cwd)?;
        config::read_config(&self.cwd)
    }

    pub fn grows_path(&self) -> PathBuf {
        config::get_grows_path(&self.cwd)
    }

    pub fn strains_path(&self) -> PathBuf {
        config::get_strains_path(&self.cwd)
    }

    pub fn supplies_path(&self) -> PathBuf {
        config::get_supplies_path(&self.cwd)
    }
}
