//! Configuration inspection.

use anyhow::{Context, Result};
use wristlink_core::config::Config;

use super::{ConfigAction, ConfigArgs};

/// Run the config command.
pub fn run(args: &ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = super::load_config();
            let rendered =
                toml::to_string_pretty(&config).context("failed to render configuration")?;
            print!("{rendered}");
        }
        ConfigAction::Path => {
            let path = Config::config_path().context("failed to resolve configuration path")?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
