//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// A terminal audio player with real-time stereo and vocal waveform visualization
#[derive(Parser, Debug)]
#[command(name = "vocalviz")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "A terminal audio player with real-time stereo and vocal waveform visualization.\n\nThree bands are drawn while a track plays: the left channel, the right channel\nand the vocal band isolated by a tunable filter chain.\n\nDEFAULT COMMAND:\n    If no command is specified, 'play' is used by default.\n\nEXAMPLES:\n    # Play a few files\n    $ vocalviz song.wav other.wav\n\n    # Shuffle a folder\n    $ vocalviz play --shuffle music/*.wav\n\n    # Tune the vocal filter on a reference track\n    $ vocalviz calibrate reference.wav\n\n    # Toggle playback from another program\n    $ pkill -USR1 vocalviz")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/vocalviz/vocalviz.toml\n    Logs:               ~/.local/state/vocalviz/vocalviz.log.*\n    Diagnostics:        VOCALVIZ_WAVEFORM_DEBUG=1 RUST_LOG=debug"
)]
struct Cli {
    /// WAV files to play (play default command)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Shuffle the play order (play default command)
    #[arg(short, long)]
    shuffle: bool,

    /// Open the vocal filter calibration panel (play default command)
    #[arg(long)]
    calibrate: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play WAV files with live waveform visualization (default)
    ///
    /// Space play/pause, n next track, ←/→ seek 5s, Escape/q quit.
    /// SIGUSR1 toggles play/pause.
    #[command(visible_alias = "p")]
    Play {
        /// WAV files to play, in order
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Shuffle the play order
        #[arg(short, long)]
        shuffle: bool,

        /// Open the vocal filter calibration panel
        #[arg(long)]
        calibrate: bool,
    },

    /// Tune the vocal isolation filter on a track
    ///
    /// ↑/↓ select a parameter, +/- adjust it (Shift for bigger steps),
    /// c copy the values, s save them to the config file, r restore defaults.
    Calibrate {
        /// WAV file to play while calibrating
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio output devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the output device in vocalviz.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   vocalviz completions bash > vocalviz.bash
    ///   vocalviz completions zsh > _vocalviz
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that don't need logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "vocalviz", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return exit_on_error(commands::handle_list_devices()),
        Some(Commands::Logs) => return exit_on_error(commands::handle_logs()),
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        None => {
            if cli.files.is_empty() {
                Cli::command().print_help()?;
                process::exit(2);
            }
            commands::handle_play(cli.files, cli.shuffle, cli.calibrate)?;
        }
        Some(Commands::Play {
            files,
            shuffle,
            calibrate,
        }) => commands::handle_play(files, shuffle, calibrate)?,
        Some(Commands::Calibrate { file }) => commands::handle_calibrate(file)?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

fn exit_on_error(result: anyhow::Result<()>) -> anyhow::Result<()> {
    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
    Ok(())
}
