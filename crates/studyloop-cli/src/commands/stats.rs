use clap::Subcommand;
use studyloop_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// All-time totals
    All,
    /// Most recent sessions
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Today => {
            println!("{}", serde_json::to_string_pretty(&db.stats_today()?)?);
        }
        StatsAction::All => {
            println!("{}", serde_json::to_string_pretty(&db.stats_all()?)?);
        }
        StatsAction::Recent { limit } => {
            println!("{}", serde_json::to_string_pretty(&db.recent(limit)?)?);
        }
    }
    Ok(())
}
