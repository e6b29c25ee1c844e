//! `bops apply`: run one bulk action against a catalog file.
//!
//! Loads the catalog, builds the selection from `--ids`/`--all`/`--where`,
//! validates the request, executes it and writes the catalog back. The undo
//! ledger only lives for this process, so `canUndo` in the result tells the
//! caller the action is reversible; use `bops session` to actually undo.

use crate::catalog::{self, CatalogError};
use crate::output::{
    CliError, OutputMode, fail, pretty_kv, pretty_section, render_error, render_mode,
};
use brandops_core::config::{self, ProjectConfig};
use brandops_core::error::ErrorCode;
use brandops_core::{
    ActionKind, ActionParams, Executor, Item, MemoryStore, OperationResult, OperationStatus,
    Progress, Selection, validate_action,
};
use chrono::SecondsFormat;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Action to apply (see `bops actions`).
    pub action: String,

    /// Catalog file: a JSON array of items.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub catalog: PathBuf,

    /// Comma-separated item ids to select.
    #[arg(long, value_delimiter = ',', conflicts_with = "all")]
    pub ids: Vec<String>,

    /// Select every item in the catalog.
    #[arg(long)]
    pub all: bool,

    /// Keep only items whose FIELD equals VALUE. Repeatable; all must match.
    #[arg(long = "where", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// New status (change-status).
    #[arg(long)]
    pub status: Option<String>,

    /// Tag to add or remove (assign-tags, remove-tags). Repeatable or comma-separated.
    #[arg(long = "tag", value_delimiter = ',')]
    pub tags: Vec<String>,

    /// New category (change-category).
    #[arg(long)]
    pub category: Option<String>,

    /// New priority (change-priority).
    #[arg(long)]
    pub priority: Option<String>,

    /// Where exported items are written (export). Defaults to `<catalog>.export.json`.
    #[arg(long = "out", value_name = "FILE")]
    pub export_out: Option<PathBuf>,

    /// Validate and show what would happen without touching any file.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    fn params(&self) -> ActionParams {
        ActionParams {
            status: self.status.clone(),
            tags: (!self.tags.is_empty()).then(|| self.tags.clone()),
            category: self.category.clone(),
            priority: self.priority.clone(),
        }
    }
}

/// Result of `apply`, also emitted for every `apply` inside a session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutput {
    #[serde(flatten)]
    pub result: OperationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DryRun {
    action: ActionKind,
    title: &'static str,
    prompt: String,
    reversible: bool,
    destructive: bool,
    item_ids: Vec<String>,
    dry_run: bool,
}

/// Why a selection could not be built.
#[derive(Debug)]
pub enum SelectError {
    InvalidFilter(String),
    UnknownIds(Vec<String>),
}

impl SelectError {
    pub fn into_cli_error(self) -> CliError {
        match self {
            Self::InvalidFilter(raw) => {
                CliError::coded(ErrorCode::InvalidFilter, format!("invalid filter '{raw}'"))
            }
            Self::UnknownIds(ids) => CliError::coded(
                ErrorCode::ItemNotFound,
                format!("item(s) not in catalog: {}", ids.join(", ")),
            ),
        }
    }
}

pub fn parse_filters(raw: &[String]) -> Result<Vec<(String, String)>, SelectError> {
    raw.iter()
        .map(|f| catalog::parse_filter(f).ok_or_else(|| SelectError::InvalidFilter(f.clone())))
        .collect()
}

/// Selection from explicit ids or every item, narrowed by `filters`.
///
/// With neither ids nor `all`, filters apply to the whole catalog.
pub fn build_selection(
    items: &[Item],
    ids: &[String],
    all: bool,
    filters: &[(String, String)],
) -> Result<Selection, SelectError> {
    let unknown: Vec<String> = ids
        .iter()
        .filter(|id| !items.iter().any(|i| &i.id == *id))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(SelectError::UnknownIds(unknown));
    }

    let mut selection = Selection::new();
    if all {
        selection.toggle_all(items);
    } else {
        selection.select_many(ids.iter().cloned());
    }

    if !filters.is_empty() {
        let whole_catalog = !all && ids.is_empty();
        let base = selection.clone();
        selection.select_by(items, |item| {
            (whole_catalog || base.is_selected(&item.id))
                && filters.iter().all(|(f, v)| item.matches_field(f, v))
        });
    }
    Ok(selection)
}

pub fn load_catalog(output: OutputMode, path: &Path) -> anyhow::Result<Vec<Item>> {
    match catalog::load(path) {
        Ok(items) => {
            info!(catalog = %path.display(), items = items.len(), "catalog loaded");
            Ok(items)
        }
        Err(e @ CatalogError::NotFound(_)) => {
            Err(fail(output, ErrorCode::CatalogNotFound, e.to_string()))
        }
        Err(e) => Err(fail(output, ErrorCode::CatalogParseError, e.to_string())),
    }
}

pub fn load_project(output: OutputMode, project_root: &Path) -> anyhow::Result<ProjectConfig> {
    config::load_project_config(project_root)
        .map_err(|e| fail(output, ErrorCode::ConfigParseError, format!("{e:#}")))
}

pub fn parse_action(output: OutputMode, raw: &str) -> anyhow::Result<ActionKind> {
    raw.parse::<ActionKind>()
        .map_err(|e| fail(output, ErrorCode::UnknownAction, e.to_string()))
}

pub fn log_progress(p: Progress) {
    debug!(
        processed = p.processed,
        total = p.total,
        percent = p.percent_rounded(),
        "bulk progress"
    );
}

pub fn write_result_text(out: &ApplyOutput, w: &mut dyn Write) -> io::Result<()> {
    let r = &out.result;
    writeln!(
        w,
        "{}  {}  {}  {}/{} succeeded  {} failed  undo={}",
        r.id,
        r.action,
        r.status,
        r.items_succeeded,
        r.items_total,
        r.items_failed,
        if r.can_undo { "yes" } else { "no" }
    )?;
    if let Some(ref path) = out.export_path {
        writeln!(w, "exported  {path}")?;
    }
    for error in &r.errors {
        writeln!(w, "  {error}")?;
    }
    Ok(())
}

pub fn write_result_pretty(out: &ApplyOutput, w: &mut dyn Write) -> io::Result<()> {
    let r = &out.result;
    pretty_section(w, &format!("Bulk operation {}", r.id))?;
    pretty_kv(w, "Action", format!("{} ({})", r.action.title(), r.action))?;
    pretty_kv(w, "Status", r.status.to_string())?;
    pretty_kv(
        w,
        "Items",
        format!("{} of {} succeeded", r.items_succeeded, r.items_total),
    )?;
    if r.items_failed > 0 {
        pretty_kv(w, "Failed", r.items_failed.to_string())?;
    }
    if r.items_processed < r.items_total {
        pretty_kv(
            w,
            "Skipped",
            (r.items_total - r.items_processed).to_string(),
        )?;
    }
    pretty_kv(
        w,
        "Started",
        r.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    )?;
    pretty_kv(w, "Undo", if r.can_undo { "available" } else { "not available" })?;
    if let Some(ref path) = out.export_path {
        pretty_kv(w, "Exported", path)?;
    }
    if !r.errors.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Errors")?;
        for error in &r.errors {
            writeln!(w, "  {error}")?;
        }
    }
    Ok(())
}

/// Run `bops apply`.
///
/// # Errors
///
/// Returns an error when the catalog or config cannot be read, the request
/// fails validation, a file cannot be written, or the operation did not
/// complete cleanly.
pub fn run_apply(
    args: &ApplyArgs,
    output: OutputMode,
    quiet: bool,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = load_project(output, project_root)?;
    let kind = parse_action(output, &args.action)?;
    let items = load_catalog(output, &args.catalog)?;

    let selection = parse_filters(&args.filters)
        .and_then(|filters| build_selection(&items, &args.ids, args.all, &filters))
        .map_err(|e| {
            let err = e.into_cli_error();
            match render_error(output, &err) {
                Ok(()) => anyhow::anyhow!("{}", err.message),
                Err(render_err) => render_err,
            }
        })?;

    let mut targets: Vec<Item> = selection
        .selected_items(&items)
        .into_iter()
        .cloned()
        .collect();

    let action = match validate_action(kind, &targets, &args.params()) {
        Ok(action) => action,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    if args.dry_run {
        let plan = DryRun {
            action: kind,
            title: kind.title(),
            prompt: kind.prompt(targets.len()),
            reversible: kind.is_reversible(),
            destructive: kind.is_destructive(),
            item_ids: targets.iter().map(|i| i.id.clone()).collect(),
            dry_run: true,
        };
        return render_mode(
            output,
            &plan,
            |p, w| {
                writeln!(w, "dry-run  {}  {} items", p.action, p.item_ids.len())?;
                for id in &p.item_ids {
                    writeln!(w, "{id}")?;
                }
                Ok(())
            },
            |p, w| {
                pretty_section(w, p.title)?;
                writeln!(w, "{}", p.prompt)?;
                pretty_kv(w, "Items", p.item_ids.join(", "))?;
                pretty_kv(w, "Undo", if p.reversible { "available" } else { "not available" })?;
                writeln!(w, "(dry run, nothing written)")
            },
        );
    }

    let mut exec = Executor::with_ledger(MemoryStore::new(items), project.ledger.build());
    let mut on_progress = log_progress;
    let result = exec.execute(&action, &mut targets, Some(&mut on_progress));

    let exports = exec.record_mut().take_exports();
    let export_path = if kind == ActionKind::Export {
        let path = args
            .export_out
            .clone()
            .unwrap_or_else(|| catalog::default_export_path(&args.catalog));
        catalog::save(&path, &exports, project.export.pretty)
            .map_err(|e| fail(output, ErrorCode::ExportWriteFailed, format!("{e:#}")))?;
        info!(path = %path.display(), items = exports.len(), "export written");
        Some(path.display().to_string())
    } else {
        None
    };

    if kind != ActionKind::Export && result.items_succeeded > 0 {
        catalog::save(&args.catalog, exec.record().items(), true)
            .map_err(|e| fail(output, ErrorCode::CatalogWriteFailed, format!("{e:#}")))?;
    }

    let status = result.status;
    let (failed, total) = (result.items_failed, result.items_total);
    let out = ApplyOutput {
        result,
        export_path,
    };
    render_mode(output, &out, write_result_text, |o, w| {
        if quiet {
            write_result_text(o, w)
        } else {
            write_result_pretty(o, w)
        }
    })?;

    if status != OperationStatus::Completed {
        anyhow::bail!("bulk {kind} {status}: {failed} of {total} items failed");
    }
    Ok(())
}
