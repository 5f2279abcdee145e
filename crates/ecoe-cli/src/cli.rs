//! CLI argument definitions for the ECOE question editor.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use ecoe_editor::{ExamScope, MoveDirection};
use ecoe_model::{ExamId, OptionId, QblockId, QuestionId, StationId};

#[derive(Parser)]
#[command(
    name = "ecoe",
    version,
    about = "Browse and edit ECOE exam questions",
    long_about = "Browse and edit the questions of an ECOE exam.\n\n\
                  Shows a station's qblocks, questions and answer options, \
                  reorders options and moves questions between qblocks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// TOML file with API connection settings.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// API server root (overrides the config file and ECOE_API_URL).
    #[arg(long = "base-url", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Bearer token (overrides the config file and ECOE_API_TOKEN).
    #[arg(long = "token", value_name = "TOKEN", global = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the qblocks and questions of a station.
    Tree(ScopeArgs),

    /// Show the answer options of a question.
    Options(OptionsArgs),

    /// Move an answer option one position up or down.
    Reorder(ReorderArgs),

    /// Move a question from one qblock to another.
    Move(MoveArgs),

    /// List the qblocks of a station.
    Qblocks(QblocksArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Exam id.
    #[arg(long = "exam", value_name = "ID")]
    pub exam: u64,

    /// Station id (default: the exam's first station).
    #[arg(long = "station", value_name = "ID")]
    pub station: Option<u64>,

    /// Only show this qblock (requires --station).
    #[arg(long = "qblock", value_name = "ID", requires = "station")]
    pub qblock: Option<u64>,
}

impl ScopeArgs {
    #[must_use]
    pub fn scope(&self) -> ExamScope {
        let mut scope = ExamScope::exam(ExamId(self.exam));
        if let Some(station) = self.station {
            scope = scope.with_station(StationId(station));
        }
        if let Some(qblock) = self.qblock {
            scope = scope.with_qblock(QblockId(qblock));
        }
        scope
    }
}

#[derive(Args, Debug, Clone)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Question id.
    #[arg(value_name = "QUESTION")]
    pub question: u64,
}

impl OptionsArgs {
    #[must_use]
    pub fn question(&self) -> QuestionId {
        QuestionId(self.question)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ReorderArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Question id.
    #[arg(value_name = "QUESTION")]
    pub question: u64,

    /// Option id.
    #[arg(value_name = "OPTION")]
    pub option: u64,

    /// Direction to move the option.
    #[arg(value_enum, value_name = "DIRECTION")]
    pub direction: DirectionArg,
}

impl ReorderArgs {
    #[must_use]
    pub fn ids(&self) -> (QuestionId, OptionId) {
        (QuestionId(self.question), OptionId(self.option))
    }
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Question id.
    #[arg(value_name = "QUESTION")]
    pub question: u64,

    /// Qblock the question is in.
    #[arg(long = "from", value_name = "QBLOCK")]
    pub from: u64,

    /// Qblock to move the question to.
    #[arg(long = "to", value_name = "QBLOCK")]
    pub to: u64,
}

#[derive(Args, Debug, Clone)]
pub struct QblocksArgs {
    /// Station id.
    #[arg(long = "station", value_name = "ID")]
    pub station: u64,
}

/// Option move direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for MoveDirection {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Up => Self::Up,
            DirectionArg::Down => Self::Down,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
