//! Command implementations.
//!
//! Every command is generic over the fetcher so it runs the same against the
//! HTTP API and the in-memory store.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use comfy_table::Table;
use ecoe_client::{ClientConfig, ResourceFetcher};
use ecoe_editor::{EditSession, MoveDirection};
use ecoe_model::{QblockId, QuestionId, StationId};
use tracing::info;

use crate::cli::{MoveArgs, OptionsArgs, QblocksArgs, ReorderArgs, ScopeArgs};
use crate::render::{options_table, qblocks_table, tree_table};

/// Command output: an optional heading line above a table.
#[derive(Debug)]
pub struct Report {
    pub heading: Option<String>,
    pub table: Table,
}

impl From<Table> for Report {
    fn from(table: Table) -> Self {
        Self {
            heading: None,
            table,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(heading) = &self.heading {
            writeln!(f, "{heading}")?;
        }
        write!(f, "{}", self.table)
    }
}

/// Resolve connection settings: config file, then environment, then flags.
pub fn client_config(
    path: Option<&Path>,
    base_url: Option<String>,
    token: Option<String>,
) -> Result<ClientConfig> {
    let config = match path {
        Some(path) => ClientConfig::load(path).context("load client config")?,
        None => ClientConfig::default(),
    };
    Ok(config.with_env_overrides().with_overrides(base_url, token))
}

pub async fn run_tree<F: ResourceFetcher>(fetcher: &F, args: &ScopeArgs) -> Result<Report> {
    let session = load(fetcher, args).await?;
    render_tree(&session)
}

pub async fn run_options<F: ResourceFetcher>(fetcher: &F, args: &OptionsArgs) -> Result<Report> {
    let mut session = load(fetcher, &args.scope).await?;
    let question = args.question();
    session
        .load_options_by_question(fetcher, true, question)
        .await
        .with_context(|| format!("load options of question {question}"))?;
    render_options(&session, question)
}

pub async fn run_reorder<F: ResourceFetcher>(fetcher: &F, args: &ReorderArgs) -> Result<Report> {
    let mut session = load(fetcher, &args.scope).await?;
    let (question, option) = args.ids();
    session
        .load_options_by_question(fetcher, true, question)
        .await
        .with_context(|| format!("load options of question {question}"))?;
    let direction: MoveDirection = args.direction.into();
    session
        .change_option_order(fetcher, question, option, direction)
        .await
        .with_context(|| format!("move option {option} {direction}"))?;
    info!(question = %question, option = %option, "option moved");
    render_options(&session, question)
}

pub async fn run_move<F: ResourceFetcher>(fetcher: &F, args: &MoveArgs) -> Result<Report> {
    let mut session = load(fetcher, &args.scope).await?;
    let question = QuestionId(args.question);
    session
        .move_question(fetcher, question, QblockId(args.from), QblockId(args.to))
        .await
        .with_context(|| {
            format!(
                "move question {question} from qblock {} to qblock {}",
                args.from, args.to
            )
        })?;
    render_tree(&session)
}

pub async fn run_qblocks<F: ResourceFetcher>(fetcher: &F, args: &QblocksArgs) -> Result<Report> {
    let mut session = EditSession::default();
    let qblocks = session
        .load_qblocks_by_station(fetcher, StationId(args.station))
        .await
        .with_context(|| format!("load qblocks of station {}", args.station))?;
    Ok(qblocks_table(qblocks).into())
}

async fn load<F: ResourceFetcher>(fetcher: &F, args: &ScopeArgs) -> Result<EditSession> {
    EditSession::load(fetcher, args.scope())
        .await
        .with_context(|| format!("load exam {}", args.exam))
}

fn render_tree(session: &EditSession) -> Result<Report> {
    let root = session.root().ok_or_else(|| anyhow!("no station loaded"))?;
    Ok(Report {
        heading: Some(format!("Station: {} ({})", root.station.name, root.station.id)),
        table: tree_table(session, root),
    })
}

fn render_options(session: &EditSession, question: QuestionId) -> Result<Report> {
    let node = session
        .question(question)
        .ok_or_else(|| anyhow!("question {question} is not in the loaded station"))?;
    Ok(Report {
        heading: Some(format!("Question {}: {}", node.id, node.description)),
        table: options_table(session, node),
    })
}
