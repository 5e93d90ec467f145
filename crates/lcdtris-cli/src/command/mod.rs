use clap::{Parser, Subcommand};

use self::{play::PlayArg, show_save::ShowSaveArg};

mod play;
mod show_save;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play in the terminal (default)
    Play(#[clap(flatten)] PlayArg),
    /// Print the saved game of a player
    ShowSave(#[clap(flatten)] ShowSaveArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Play(PlayArg::default())) {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::ShowSave(arg) => show_save::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_play_is_default() {
        let args = CommandArgs::try_parse_from(["lcdtris"]).unwrap();
        assert!(args.mode.is_none());
    }

    #[test]
    fn test_show_save_requires_user() {
        assert!(CommandArgs::try_parse_from(["lcdtris", "show-save"]).is_err());
        let args =
            CommandArgs::try_parse_from(["lcdtris", "show-save", "--user", "ann"]).unwrap();
        assert!(matches!(args.mode, Some(Mode::ShowSave(_))));
    }
}
