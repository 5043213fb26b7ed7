use clap::Args;

use crate::cli::CommandOutput;
use crate::cli::result::{run_export, run_list};
use crate::error::TalusError;
use crate::source::RecordSource;
use crate::tokenize::tokenize;

#[derive(Debug, Args)]
pub struct ExecArgs {
    #[arg(
        value_name = "LINE",
        help = "Command line with shell quoting, e.g. 'result list --tags \"IE 11\" --all'"
    )]
    pub line: String,
}

pub fn run_exec(
    args: ExecArgs,
    source: &dyn RecordSource,
    user: Option<String>,
) -> Result<CommandOutput, TalusError> {
    run_line(&args.line, source, user)
}

/// Tokenizes `line` and dispatches it the way the interactive shell would.
pub fn run_line(
    line: &str,
    source: &dyn RecordSource,
    user: Option<String>,
) -> Result<CommandOutput, TalusError> {
    let tokens = tokenize(line)?;
    tracing::debug!(?tokens, "tokenized command line");

    match tokens.as_slice() {
        [group, action, terms @ ..] if group == "result" => match action.as_str() {
            "list" => run_list(terms, source, user).map(CommandOutput::List),
            "export" => run_export(terms, source, user).map(CommandOutput::Export),
            other => Err(TalusError::InvalidRequest {
                message: format!("unknown result command '{other}' (expected list or export)"),
            }),
        },
        _ => Err(TalusError::InvalidRequest {
            message: format!(
                "expected 'result list ...' or 'result export ...', got {:?}",
                crate::tokenize::join(&tokens)
            ),
        }),
    }
}
