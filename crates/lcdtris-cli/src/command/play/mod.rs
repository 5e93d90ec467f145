use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use lcdtris_engine::{GameLoop, PersistenceBridge, PieceSeed, SessionConfig};
use lcdtris_store::FileStore;
use ratatui_runtime::Runtime;

use self::app::PlayApp;

mod app;
mod input;

const DEFAULT_SAVE_DIR: &str = "./data/saves/";
const DEFAULT_LOG_FILE: &str = "lcdtris.log";

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PlayArg {
    /// Play signed in as this player; saves and achievements are kept.
    /// Without it the game runs as a guest with limited free play
    #[clap(long)]
    user: Option<String>,
    /// Directory holding save files
    #[clap(long, default_value = DEFAULT_SAVE_DIR)]
    save_dir: PathBuf,
    /// Starting level
    #[clap(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    level: u16,
    /// Seed for the piece sequence (32 hex characters)
    #[clap(long)]
    seed: Option<PieceSeed>,
    /// Free play allowed to a guest, in seconds
    #[clap(long, default_value_t = 300)]
    free_play_secs: u64,
    /// How long the loading screen stays up, in milliseconds
    #[clap(long, default_value_t = 1200)]
    loading_ms: u64,
    /// File receiving log output
    #[clap(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

impl Default for PlayArg {
    fn default() -> Self {
        Self {
            user: None,
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            level: 1,
            seed: None,
            free_play_secs: 300,
            loading_ms: 1200,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl PlayArg {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            start_level: usize::from(self.level),
            free_play: Duration::from_secs(self.free_play_secs),
            ..SessionConfig::default()
        }
    }
}

pub(crate) fn run(arg: &PlayArg) -> anyhow::Result<()> {
    init_logger(&arg.log_file)?;

    let bridge = match &arg.user {
        Some(user) => Some(open_bridge(&arg.save_dir, user)?),
        None => None,
    };
    let config = arg.session_config();
    let game = match arg.seed {
        Some(seed) => GameLoop::with_seed(config, seed, bridge),
        None => GameLoop::new(config, bridge),
    };

    let mut app = PlayApp::new(
        game,
        Duration::from_millis(arg.loading_ms),
        arg.save_dir.clone(),
    );
    Runtime::new().run(&mut app)?;
    app.shutdown();

    Ok(())
}

fn init_logger(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("failed to initialise logger")?;
    Ok(())
}

/// Opens the file store under `save_dir` and starts its worker for `user`.
fn open_bridge(save_dir: &Path, user: &str) -> anyhow::Result<PersistenceBridge> {
    let store = FileStore::open(save_dir)
        .with_context(|| format!("failed to open save directory {}", save_dir.display()))?;
    let bridge = PersistenceBridge::spawn(user, store).context("failed to start store worker")?;
    Ok(bridge)
}
