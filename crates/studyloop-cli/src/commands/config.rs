use clap::Subcommand;
use studyloop_core::storage::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full configuration as TOML
    Show,
    /// Get a value by dot-separated key (e.g. timer.work_secs)
    Get { key: String },
    /// Set a value by dot-separated key
    Set { key: String, value: String },
    /// Print the config file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => match Config::load()?.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown config key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
