use anyhow::{Context, Result};
use std::{env, path::PathBuf};

pub struct Env {}

impl Env {
    pub const SYS_NAME: &'static str = "simplot";
    pub const PLOTS_DIR_ENV_VAR: &'static str = "SIMPLOT_PLOTS_DIR";

    pub fn proj_root() -> Result<PathBuf> {
        env::current_dir().context("simplot: failed to get current directory")
    }

    /// Directory where generated charts are written. Can be overridden with
    /// `SIMPLOT_PLOTS_DIR`.
    pub fn plots_root() -> Result<PathBuf> {
        match env::var(Self::PLOTS_DIR_ENV_VAR) {
            Ok(dir) => Ok(PathBuf::from(dir)),
            Err(_) => {
                let mut path = Self::proj_root()?;
                path.push("plots");
                Ok(path)
            }
        }
    }

    pub fn plot_path(name: &str) -> Result<PathBuf> {
        let mut path = Self::plots_root()?;
        path.push(format!("{name}.svg"));
        Ok(path)
    }
}
