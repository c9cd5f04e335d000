//! CLI argument definitions for momentick.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `universe` | List configured indices, or one index's constituents |
//! | `resolve` | Resolve raw codes to gateway symbols |
//! | `baseline` | Run a baseline load and print the momentum frame |
//! | `watch` | Baseline once, then refresh intraday on an interval |
//! | `history` | Daily history of one stock with EMA 20/50/200 |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | search path | JSON config file |
//! | `--universe` | from config | Constituent workbook |
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Offline gateway and built-in universe |
//! | `--concurrency` | from config | Maximum in-flight fetches |
//! | `--timeout-ms` | from config | Per-fetch timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! momentick --mock baseline HSI "SP 500"
//! momentick --universe Index-Weight.xlsx watch HSTECH --interval-secs 300 --cycles 12
//! momentick resolve --family numeric 5 700 12345
//! momentick history --family numeric 700
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use momentick_core::SymbolFamily;

/// Volume and price momentum of index constituents.
#[derive(Debug, Parser)]
#[command(
    name = "momentick",
    author,
    version,
    about = "Volume and price momentum of index constituents",
    long_about = "momentick loads an index universe, fetches daily history per constituent, \
and reports today's percent change against the ten-session average volume ratio.\n\
\n\
Use 'momentick <command> --help' for command-specific help."
)]
pub struct Cli {
    /// JSON config file. Without it, momentick.json and
    /// config/momentick.json are tried before built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Constituent workbook with one sheet per index.
    #[arg(long, global = true)]
    pub universe: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Use the deterministic offline gateway and the built-in universe.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Maximum concurrent gateway fetches.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Per-fetch timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text table for terminal display.
    Table,
    /// JSON document.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    /// Numeric exchange codes, padded to four digits with the `.HK` suffix.
    Numeric,
    /// Alphabetic tickers, used unchanged.
    Alphabetic,
}

impl From<FamilyArg> for SymbolFamily {
    fn from(value: FamilyArg) -> Self {
        match value {
            FamilyArg::Numeric => SymbolFamily::Numeric,
            FamilyArg::Alphabetic => SymbolFamily::Alphabetic,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List configured indices, or the constituents of one index.
    ///
    /// # Examples
    ///
    ///   momentick --mock universe
    ///   momentick --universe Index-Weight.xlsx universe HSI
    Universe(UniverseArgs),

    /// Resolve raw constituent codes to gateway symbols.
    ///
    /// # Examples
    ///
    ///   momentick resolve --family numeric 5 700
    ///   momentick resolve --family alphabetic AAPL MSFT
    Resolve(ResolveArgs),

    /// Run a baseline load for one or more indices (all when omitted).
    ///
    /// Indices are loaded in parallel.
    ///
    /// # Examples
    ///
    ///   momentick --mock baseline
    ///   momentick baseline HSI HSTECH --format json --pretty
    Baseline(BaselineArgs),

    /// Baseline once, then refresh intraday on a fixed interval.
    ///
    /// # Examples
    ///
    ///   momentick watch HSI --interval-secs 300 --cycles 12
    Watch(WatchArgs),

    /// Show one stock's recent daily sessions with EMA 20/50/200.
    ///
    /// About three years are fetched so the long average is warmed up;
    /// the last 200 days are printed.
    ///
    /// # Examples
    ///
    ///   momentick history --family numeric 700
    ///   momentick history --family alphabetic AAPL --format json
    History(HistoryArgs),
}

#[derive(Debug, Args)]
pub struct UniverseArgs {
    /// Index name (e.g. HSI, "SP 500").
    pub index: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Symbol family of the codes.
    #[arg(long, value_enum)]
    pub family: FamilyArg,

    /// Raw codes to resolve.
    #[arg(required = true, num_args = 1..)]
    pub codes: Vec<String>,
}

#[derive(Debug, Args)]
pub struct BaselineArgs {
    /// Index names; every configured index when omitted.
    pub indices: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Index name.
    pub index: String,

    /// Seconds between intraday refreshes.
    #[arg(long, default_value_t = 60)]
    pub interval_secs: u64,

    /// Number of intraday refreshes after the baseline.
    #[arg(long, default_value_t = 1)]
    pub cycles: u32,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Symbol family of the code.
    #[arg(long, value_enum)]
    pub family: FamilyArg,

    /// Raw stock code (e.g. 700, AAPL).
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "momentick",
            "baseline",
            "HSI",
            "SP 500",
            "--mock",
            "--format",
            "json",
            "--concurrency",
            "4",
        ])
        .expect("valid arguments");

        assert!(cli.mock);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.concurrency, Some(4));
        match cli.command {
            Command::Baseline(args) => assert_eq!(args.indices, vec!["HSI", "SP 500"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn resolve_requires_family_and_codes() {
        assert!(Cli::try_parse_from(["momentick", "resolve", "5"]).is_err());
        assert!(Cli::try_parse_from(["momentick", "resolve", "--family", "numeric"]).is_err());

        let cli = Cli::try_parse_from(["momentick", "resolve", "--family", "alphabetic", "AAPL"])
            .expect("valid arguments");
        match cli.command {
            Command::Resolve(args) => {
                assert_eq!(SymbolFamily::from(args.family), SymbolFamily::Alphabetic);
                assert_eq!(args.codes, vec!["AAPL"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn watch_defaults() {
        let cli = Cli::try_parse_from(["momentick", "watch", "HSTECH"]).expect("valid arguments");
        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.interval_secs, 60);
                assert_eq!(args.cycles, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn history_takes_one_code_and_a_family() {
        assert!(Cli::try_parse_from(["momentick", "history", "700"]).is_err());

        let cli = Cli::try_parse_from(["momentick", "history", "--family", "numeric", "700"])
            .expect("valid arguments");
        match cli.command {
            Command::History(args) => {
                assert_eq!(args.code, "700");
                assert_eq!(SymbolFamily::from(args.family), SymbolFamily::Numeric);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
