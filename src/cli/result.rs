use std::path::PathBuf;

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;

use crate::cli::CommandOutput;
use crate::error::TalusError;
use crate::export::{ExportStatus, default_destination, write_record};
use crate::flags::classify;
use crate::namespace::NamespaceMapper;
use crate::notice::Notice;
use crate::query::{SearchQuery, SearchTermBuilder};
use crate::record::Record;
use crate::reference::{ResolvedBy, parse_reference, resolve_one};
use crate::source::RecordSource;

/// Keys holding crash hashes; their values must never be read as numbers.
pub const EXPORT_NO_HEX_KEYS: &[&str] = &["hash_major", "hash_minor", "hash"];

#[derive(Debug, Args)]
pub struct ResultArgs {
    #[command(subcommand)]
    pub command: ResultCommands,
}

#[derive(Debug, Subcommand)]
pub enum ResultCommands {
    #[command(about = "List results matching --field value search terms, most recent first")]
    List(TermArgs),
    #[command(about = "Export one result's raw JSON to a file")]
    Export(TermArgs),
}

#[derive(Debug, Args)]
pub struct TermArgs {
    #[arg(
        value_name = "TERM",
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Search terms (--field value, --sort, --num, --tags, --dest, --all, --all-mine) and an optional reference (id, name, or +N)"
    )]
    pub terms: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub query: SearchQuery,
    pub count: usize,
    pub results: Vec<Record>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub status: ExportStatus,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<Value>,
    pub path: PathBuf,
    pub resolved_by: ResolvedBy,
    pub notices: Vec<Notice>,
}

pub fn run_result(
    args: ResultArgs,
    source: &dyn RecordSource,
    user: Option<String>,
) -> Result<CommandOutput, TalusError> {
    match args.command {
        ResultCommands::List(terms) => run_list(&terms.terms, source, user).map(CommandOutput::List),
        ResultCommands::Export(terms) => {
            run_export(&terms.terms, source, user).map(CommandOutput::Export)
        }
    }
}

pub fn run_list<S: AsRef<str>>(
    terms: &[S],
    source: &dyn RecordSource,
    user: Option<String>,
) -> Result<ListResponse, TalusError> {
    let classified = classify(terms)?;
    if let Some(extra) = classified.leftover.first() {
        return Err(TalusError::UnexpectedArgument {
            argument: extra.clone(),
        });
    }

    let mut built = SearchTermBuilder::new()
        .user(user)
        .user_default_filter(true)
        .build(&classified)?;
    built.query.take_dest();
    for notice in &built.notices {
        notice.emit();
    }

    let results = source.fetch(&built.query)?;
    Ok(ListResponse {
        query: built.query,
        count: results.len(),
        results,
        notices: built.notices,
    })
}

pub fn run_export<S: AsRef<str>>(
    terms: &[S],
    source: &dyn RecordSource,
    user: Option<String>,
) -> Result<ExportResponse, TalusError> {
    if terms.is_empty() {
        return Err(TalusError::InvalidRequest {
            message: "you must provide a name/id/git-thing of a result to export it".to_string(),
        });
    }

    let classified = classify(terms)?;
    let built = SearchTermBuilder::new()
        .no_hex_keys(EXPORT_NO_HEX_KEYS.iter().copied())
        .default_limit(None)
        .user(user)
        .user_default_filter(true)
        .build(&classified)?;

    let mut query = NamespaceMapper::for_results().map(built.query);
    let dest = query.take_dest();
    let reference = parse_reference(&classified.leftover)?;

    let resolution = resolve_one(reference.as_ref(), &query, source)?;
    let record = resolution.record;
    let path = dest.unwrap_or_else(|| default_destination(&record));
    tracing::info!(id = record.id(), path = %path.display(), "exporting result");

    let mut notices = built.notices;
    let status = write_record(&record, &path)?;
    if status == ExportStatus::Skipped {
        let notice = Notice::destination_exists(path.clone());
        notice.emit();
        notices.push(notice);
    }

    Ok(ExportResponse {
        status,
        id: record.id().to_string(),
        job: record.lookup("job").cloned(),
        path,
        resolved_by: resolution.resolved_by,
        notices,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::tempdir;

    use super::{run_export, run_list};
    use crate::error::TalusError;
    use crate::export::ExportStatus;
    use crate::notice::Notice;
    use crate::record::Record;
    use crate::reference::ResolvedBy;
    use crate::source::JsonFileStore;

    fn store() -> JsonFileStore {
        let mut values = vec![
            json!({"id": "old-ie", "created": 10, "tags": ["IE", "alice"], "job": "j1",
                   "data": {"crashing_module": "libxml", "hash": "0x1f"}}),
            json!({"id": "new-ie", "created": 30, "tags": ["IE", "bob"], "job": "j2",
                   "data": {"crashing_module": "mshtml", "hash": "0x2e"}}),
            json!({"id": "adobe", "created": 20, "tags": ["adobe", "alice"], "job": "j1",
                   "data": {"crashing_module": "libxml", "hash": "0x3d"}}),
        ];
        for index in 0..25 {
            values.push(json!({"id": format!("bulk-{index:02}"), "created": index, "tags": ["bulk"]}));
        }
        JsonFileStore::from_records(
            values
                .into_iter()
                .map(|value| Record::from_value(value).expect("fixture record"))
                .collect(),
        )
    }

    #[test]
    fn list_caps_at_default_limit_with_notice() {
        let response = run_list::<&str>(&[], &store(), None).expect("list");
        assert_eq!(response.count, 20);
        assert_eq!(response.results[0].id(), "new-ie");
        assert_eq!(response.notices, vec![Notice::default_limit(20)]);
    }

    #[test]
    fn list_with_all_returns_everything() {
        let response = run_list(&["--all"], &store(), None).expect("list");
        assert_eq!(response.count, 28);
        assert!(response.notices.is_empty());
    }

    #[test]
    fn list_all_mine_scopes_to_user() {
        let response =
            run_list(&["--all-mine"], &store(), Some("alice".to_string())).expect("list");
        let ids: Vec<&str> = response.results.iter().map(Record::id).collect();
        assert_eq!(ids, vec!["adobe", "old-ie"]);
    }

    #[test]
    fn list_defaults_to_current_user_unless_all() {
        let alice = || Some("alice".to_string());

        let response = run_list::<&str>(&[], &store(), alice()).expect("list");
        let ids: Vec<&str> = response.results.iter().map(Record::id).collect();
        assert_eq!(ids, vec!["adobe", "old-ie"]);
        assert_eq!(response.notices, vec![Notice::default_limit(20)]);

        let response = run_list(&["--all"], &store(), alice()).expect("list");
        assert_eq!(response.count, 28);
    }

    #[test]
    fn list_rejects_positional_arguments() {
        let error = run_list(&["+1"], &store(), None).expect_err("list takes no reference");
        assert!(matches!(error, TalusError::UnexpectedArgument { .. }));
    }

    #[test]
    fn export_resolves_ordinal_within_tag_filter() {
        let dir = tempdir().expect("temp dir");
        let dest = dir.path().join("second.json");
        let dest_arg = dest.to_str().expect("utf-8 path");

        let response = run_export(&["--tags", "IE", "--dest", dest_arg, "+2"], &store(), None)
            .expect("export");
        assert_eq!(response.status, ExportStatus::Written);
        assert_eq!(response.id, "old-ie");
        assert_eq!(response.resolved_by, ResolvedBy::Ordinal);
        assert_eq!(response.job, Some(json!("j1")));

        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(&dest).expect("read export")).expect("json");
        assert_eq!(written["id"], "old-ie");
    }

    #[test]
    fn export_ordinal_counts_only_current_user_results_unless_all() {
        let dir = tempdir().expect("temp dir");
        let mine = dir.path().join("mine.json");
        let response = run_export(
            &["--tags", "IE", "--dest", mine.to_str().expect("utf-8 path"), "+1"],
            &store(),
            Some("alice".to_string()),
        )
        .expect("export");
        assert_eq!(response.id, "old-ie");

        let everyone = dir.path().join("everyone.json");
        let response = run_export(
            &[
                "--all",
                "--tags",
                "IE",
                "--dest",
                everyone.to_str().expect("utf-8 path"),
                "+1",
            ],
            &store(),
            Some("alice".to_string()),
        )
        .expect("export");
        assert_eq!(response.id, "new-ie");
    }

    #[test]
    fn export_namespaces_short_field_names() {
        let dir = tempdir().expect("temp dir");
        let dest = dir.path().join("mshtml.json");
        let response = run_export(
            &[
                "--crashing-module",
                "mshtml",
                "--dest",
                dest.to_str().expect("utf-8 path"),
            ],
            &store(),
            None,
        )
        .expect("export");
        assert_eq!(response.id, "new-ie");
        assert_eq!(response.resolved_by, ResolvedBy::Search);
    }

    #[test]
    fn export_keeps_hash_values_verbatim() {
        let dir = tempdir().expect("temp dir");
        let dest = dir.path().join("hash.json");
        let response = run_export(
            &["--hash", "0x3d", "--dest", dest.to_str().expect("utf-8 path")],
            &store(),
            None,
        )
        .expect("hash is matched as text");
        assert_eq!(response.id, "adobe");
    }

    #[test]
    fn export_skips_existing_destination() {
        let dir = tempdir().expect("temp dir");
        let dest = dir.path().join("out.json");
        fs::write(&dest, "keep me").expect("seed");

        let response = run_export(
            &["--dest", dest.to_str().expect("utf-8 path"), "+1"],
            &store(),
            None,
        )
        .expect("existing file is a soft stop");
        assert_eq!(response.status, ExportStatus::Skipped);
        assert!(matches!(
            response.notices.as_slice(),
            [Notice::DestinationExists { .. }]
        ));
        assert_eq!(fs::read_to_string(&dest).expect("read"), "keep me");
    }

    #[test]
    fn export_requires_arguments_and_unique_match() {
        let error = run_export::<&str>(&[], &store(), None).expect_err("no arguments");
        assert!(matches!(error, TalusError::InvalidRequest { .. }));

        let error = run_export(&["--tags", "IE"], &store(), None).expect_err("two IE results");
        assert!(matches!(
            error,
            TalusError::AmbiguousReference { candidates: 2, .. }
        ));

        let error = run_export(&["+1", "+2"], &store(), None).expect_err("two references");
        assert!(matches!(error, TalusError::UnexpectedArgument { .. }));
    }
}
