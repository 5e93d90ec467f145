use std::path::PathBuf;

use anyhow::Context as _;
use chrono::Local;
use lcdtris_engine::{Achievement, SavedSnapshot};
use lcdtris_store::FileStore;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ShowSaveArg {
    /// Player whose save to print
    #[clap(long)]
    user: String,
    /// Directory holding save files
    #[clap(long, default_value = "./data/saves/")]
    save_dir: PathBuf,
}

pub(crate) fn run(arg: &ShowSaveArg) -> anyhow::Result<()> {
    let ShowSaveArg { user, save_dir } = arg;

    let store = FileStore::open(save_dir)
        .with_context(|| format!("failed to open save directory {}", save_dir.display()))?;
    let record = store
        .load_record(user)
        .with_context(|| format!("failed to read save of {user}"))?;

    match record {
        Some(record) => {
            let snapshot = SavedSnapshot::from_blob(&record.state)
                .with_context(|| format!("save of {user} is not a valid game"))?;
            println!(
                "Saved at: {}",
                record.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("No saved game for {user}."),
    }

    let achievements = store
        .achievements(user)
        .with_context(|| format!("failed to read achievements of {user}"))?;
    if achievements.unlocked.is_empty() {
        println!("No achievements yet.");
    } else {
        println!("Achievements:");
        for (code, unlocked_at) in &achievements.unlocked {
            let name = Achievement::from_code(code)
                .map_or_else(|| code.clone(), |achievement| achievement.to_string());
            println!(
                "  {name:<12} {}",
                unlocked_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    Ok(())
}
