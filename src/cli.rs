use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Clip range inspection for review pipelines
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List image sequences in a directory, longest span first
    Scan {
        /// Directory to scan
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Emit machine-readable JSON instead of a table
        #[arg(long = "json")]
        json: bool,
    },

    /// Resolve a clip and print its type, playable paths and native range
    Info {
        /// Movie file, frame file or templated sequence path
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Emit machine-readable JSON instead of text
        #[arg(long = "json")]
        json: bool,
    },

    /// Print the hold/window/hold breakdown for a play range
    Window {
        /// Movie file, frame file or templated sequence path
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Requested first playback frame (defaults to the native range)
        #[arg(long = "play-in", value_name = "N")]
        play_in: Option<i64>,

        /// Requested last playback frame
        #[arg(long = "play-out", value_name = "N")]
        play_out: Option<i64>,
    },
}

/// Map -v occurrences onto an env_logger filter level.
pub fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scan() {
        let args = Args::try_parse_from(["clipstore", "scan", "/mnt/seq", "--json"]).unwrap();
        match args.command {
            Command::Scan { dir, json } => {
                assert_eq!(dir, PathBuf::from("/mnt/seq"));
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_window_range() {
        let args = Args::try_parse_from([
            "clipstore",
            "window",
            "shot.0101.jpg",
            "--play-in",
            "80",
            "--play-out",
            "106",
        ])
        .unwrap();
        match args.command {
            Command::Window {
                play_in, play_out, ..
            } => {
                assert_eq!(play_in, Some(80));
                assert_eq!(play_out, Some(106));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(1), "info");
        assert_eq!(log_level(5), "trace");
    }
}
