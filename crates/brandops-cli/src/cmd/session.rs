//! `bops session`: several bulk commands against one catalog, sharing one
//! selection, one executor and one undo ledger.
//!
//! Commands are read one per line from `--script` or stdin:
//!
//! ```text
//! select all | none | ID...     replace the selection
//! add ID...                     add to the selection
//! remove ID...                  drop from the selection
//! toggle ID                     flip one id
//! toggle-all                    select every item, or clear if all are selected
//! where FIELD=VALUE             select exactly the matching items
//! range A B                     add A..=B in catalog order
//! list                          show the selection
//! actions                       actions offered for the selection
//! apply ACTION [key=value]...   status=, category=, priority=, tag=, tags=a,b, out=FILE
//! undo [OP_ID]                  undo an operation (default: the most recent)
//! history                       operations that can still be undone
//! save                          write the catalog back
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. A command that fails
//! emits an error event and the session carries on; the process exits
//! non-zero at the end if any command failed.

use crate::catalog;
use crate::cmd::apply::{
    ApplyOutput, build_selection, load_catalog, load_project, log_progress, parse_filters,
    write_result_pretty, write_result_text,
};
use crate::output::{CliError, OutputMode, write_error};
use brandops_core::error::ErrorCode;
use brandops_core::{
    ActionKind, ActionParams, Executor, Item, MemoryStore, Selection, SelectionState,
    UndoLedger, available_actions, validate_action,
};
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Catalog file: a JSON array of items.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub catalog: PathBuf,

    /// Read commands from FILE instead of stdin.
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case", rename_all_fields = "camelCase")]
enum SessionEvent {
    Selection(SelectionState),
    Operation(ApplyOutput),
    Undo { operation_id: String, undone: bool },
    History { operation_ids: Vec<String> },
    Actions { actions: Vec<ActionKind> },
    Saved { path: String, items: usize },
    Error { error: CliError },
}

impl SessionEvent {
    const fn failed(error: CliError) -> Self {
        Self::Error { error }
    }

    fn plain(message: impl Into<String>) -> Self {
        Self::failed(CliError::new(message))
    }

    fn coded(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::failed(CliError::coded(code, message))
    }

    /// Commands that did not fully succeed: errors, and operations that
    /// ended anything but completed.
    fn is_failure(&self) -> bool {
        match self {
            Self::Error { .. } => true,
            Self::Operation(out) => !out.result.is_completed(),
            _ => false,
        }
    }

    fn write(&self, w: &mut dyn Write, mode: OutputMode) -> anyhow::Result<()> {
        if mode.is_json() {
            serde_json::to_writer(&mut *w, self)?;
            writeln!(w)?;
            return Ok(());
        }
        match (self, mode) {
            (Self::Error { error }, _) => write_error(w, mode, error)?,
            (Self::Operation(out), OutputMode::Pretty) => write_result_pretty(out, w)?,
            (Self::Operation(out), _) => write_result_text(out, w)?,
            (Self::Selection(state), _) => writeln!(
                w,
                "selected {}/{}{}",
                state.selected_ids.len(),
                state.total_items,
                if state.is_all_selected { " (all)" } else { "" }
            )?,
            (Self::Undo { operation_id, .. }, _) => writeln!(w, "undone {operation_id}")?,
            (Self::History { operation_ids }, _) => {
                if operation_ids.is_empty() {
                    writeln!(w, "no undoable operations")?;
                }
                for id in operation_ids {
                    writeln!(w, "{id}")?;
                }
            }
            (Self::Actions { actions }, _) => {
                if actions.is_empty() {
                    writeln!(w, "no actions (nothing selected)")?;
                }
                for kind in actions {
                    writeln!(w, "{kind}")?;
                }
            }
            (Self::Saved { path, items }, _) => writeln!(w, "saved {items} items to {path}")?,
        }
        Ok(())
    }
}

/// Live state of one session.
pub struct Session {
    exec: Executor<MemoryStore>,
    selection: Selection,
    catalog_path: PathBuf,
    export_pretty: bool,
    failures: usize,
}

impl Session {
    pub fn new(
        items: Vec<Item>,
        catalog_path: PathBuf,
        ledger: UndoLedger,
        export_pretty: bool,
    ) -> Self {
        Self {
            exec: Executor::with_ledger(MemoryStore::new(items), ledger),
            selection: Selection::new(),
            catalog_path,
            export_pretty,
            failures: 0,
        }
    }

    pub const fn failures(&self) -> usize {
        self.failures
    }

    fn items(&self) -> &[Item] {
        self.exec.record().items()
    }

    fn selection_event(&self) -> SessionEvent {
        SessionEvent::Selection(self.selection.state(self.items()))
    }

    /// Run every line of `input`, writing one event per command to `out`.
    pub fn run(
        &mut self,
        input: impl BufRead,
        out: &mut dyn Write,
        mode: OutputMode,
    ) -> anyhow::Result<()> {
        for line in input.lines() {
            let line = line?;
            if let Some(event) = self.handle(&line) {
                if event.is_failure() {
                    self.failures += 1;
                }
                event.write(out, mode)?;
            }
        }
        Ok(())
    }

    fn handle(&mut self, line: &str) -> Option<SessionEvent> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        debug!(command = line, "session command");

        let mut words = line.split_whitespace();
        let command = words.next()?;
        let args: Vec<&str> = words.collect();

        Some(match command {
            "select" => self.select(&args),
            "add" => self.with_known_ids(&args, |sel, ids| sel.add_many(ids.iter().copied())),
            "remove" => {
                self.selection.remove_many(args.iter().copied());
                self.selection_event()
            }
            "toggle" => self.toggle(&args),
            "toggle-all" => {
                let items = self.exec.record().items();
                self.selection.toggle_all(items);
                self.selection_event()
            }
            "where" => self.select_where(&args),
            "range" => self.range(&args),
            "list" => self.selection_event(),
            "actions" => SessionEvent::Actions {
                actions: available_actions(&self.selection.selected_items(self.items())),
            },
            "apply" => self.apply(&args),
            "undo" => self.undo(args.first().copied()),
            "history" => SessionEvent::History {
                operation_ids: self
                    .exec
                    .ledger()
                    .operation_ids()
                    .map(String::from)
                    .collect(),
            },
            "save" => self.save(),
            other => SessionEvent::plain(format!("unknown command '{other}'")),
        })
    }

    fn unknown_ids(&self, ids: &[&str]) -> Option<SessionEvent> {
        let unknown: Vec<&str> = ids
            .iter()
            .copied()
            .filter(|id| self.exec.record().get(id).is_none())
            .collect();
        (!unknown.is_empty()).then(|| {
            SessionEvent::coded(
                ErrorCode::ItemNotFound,
                format!("item(s) not in catalog: {}", unknown.join(", ")),
            )
        })
    }

    fn with_known_ids(
        &mut self,
        ids: &[&str],
        update: impl FnOnce(&mut Selection, &[&str]),
    ) -> SessionEvent {
        if ids.is_empty() {
            return SessionEvent::plain("expected at least one item id");
        }
        if let Some(err) = self.unknown_ids(ids) {
            return err;
        }
        update(&mut self.selection, ids);
        self.selection_event()
    }

    fn select(&mut self, args: &[&str]) -> SessionEvent {
        match args {
            ["all"] => {
                let ids: Vec<String> = self.items().iter().map(|i| i.id.clone()).collect();
                self.selection.select_many(ids);
                self.selection_event()
            }
            ["none"] => {
                self.selection.clear();
                self.selection_event()
            }
            ids => self.with_known_ids(ids, |sel, ids| sel.select_many(ids.iter().copied())),
        }
    }

    fn toggle(&mut self, args: &[&str]) -> SessionEvent {
        let [id] = args else {
            return SessionEvent::plain("usage: toggle ID");
        };
        if let Some(err) = self.unknown_ids(args) {
            return err;
        }
        self.selection.toggle(id);
        self.selection_event()
    }

    fn select_where(&mut self, args: &[&str]) -> SessionEvent {
        let raw: Vec<String> = args.iter().map(|a| (*a).to_string()).collect();
        let filters = match parse_filters(&raw) {
            Ok(f) if !f.is_empty() => f,
            Ok(_) => return SessionEvent::plain("usage: where FIELD=VALUE..."),
            Err(e) => return SessionEvent::failed(e.into_cli_error()),
        };
        match build_selection(self.exec.record().items(), &[], false, &filters) {
            Ok(selection) => {
                self.selection = selection;
                self.selection_event()
            }
            Err(e) => SessionEvent::failed(e.into_cli_error()),
        }
    }

    fn range(&mut self, args: &[&str]) -> SessionEvent {
        let [anchor, target] = args else {
            return SessionEvent::plain("usage: range ANCHOR TARGET");
        };
        let items = self.exec.record().items();
        if self.selection.select_range(items, anchor, target) {
            self.selection_event()
        } else {
            self.unknown_ids(args).unwrap_or_else(|| {
                SessionEvent::coded(ErrorCode::ItemNotFound, "range endpoints not in catalog")
            })
        }
    }

    fn apply(&mut self, args: &[&str]) -> SessionEvent {
        let Some((name, rest)) = args.split_first() else {
            return SessionEvent::plain("usage: apply ACTION [key=value]...");
        };
        let kind = match name.parse::<ActionKind>() {
            Ok(kind) => kind,
            Err(e) => return SessionEvent::coded(ErrorCode::UnknownAction, e.to_string()),
        };

        let mut params = ActionParams::default();
        let mut export_out: Option<PathBuf> = None;
        for pair in rest {
            let Some((key, value)) = pair.split_once('=') else {
                return SessionEvent::plain(format!("expected key=value, got '{pair}'"));
            };
            match key {
                "status" => params.status = Some(value.to_string()),
                "category" => params.category = Some(value.to_string()),
                "priority" => params.priority = Some(value.to_string()),
                "tag" | "tags" => params
                    .tags
                    .get_or_insert_with(Vec::new)
                    .extend(value.split(',').map(String::from)),
                "out" => export_out = Some(PathBuf::from(value)),
                other => {
                    return SessionEvent::plain(format!("unknown parameter '{other}'"));
                }
            }
        }

        let mut targets: Vec<Item> = self
            .selection
            .selected_items(self.items())
            .into_iter()
            .cloned()
            .collect();
        let action = match validate_action(kind, &targets, &params) {
            Ok(action) => action,
            Err(e) => return SessionEvent::failed(CliError::from(&e)),
        };

        let mut on_progress = log_progress;
        let result = self
            .exec
            .execute(&action, &mut targets, Some(&mut on_progress));
        let removed = self.selection.prune(self.exec.record().items());
        if removed > 0 {
            debug!(removed, "dropped selected ids no longer in the catalog");
        }

        let export_path = if kind == ActionKind::Export {
            let exports = self.exec.record_mut().take_exports();
            let path =
                export_out.unwrap_or_else(|| catalog::default_export_path(&self.catalog_path));
            if let Err(e) = catalog::save(&path, &exports, self.export_pretty) {
                return SessionEvent::coded(ErrorCode::ExportWriteFailed, format!("{e:#}"));
            }
            Some(path.display().to_string())
        } else {
            None
        };

        SessionEvent::Operation(ApplyOutput {
            result,
            export_path,
        })
    }

    fn undo(&mut self, requested: Option<&str>) -> SessionEvent {
        let Some(operation_id) = requested
            .map(String::from)
            .or_else(|| self.exec.ledger().last_operation_id().map(String::from))
        else {
            return SessionEvent::coded(ErrorCode::UnknownOperation, "nothing to undo");
        };

        if self.exec.undo(&operation_id) {
            SessionEvent::Undo {
                operation_id,
                undone: true,
            }
        } else if self.exec.ledger().contains(&operation_id) {
            SessionEvent::coded(
                ErrorCode::UndoFailed,
                format!("could not undo {operation_id}"),
            )
        } else {
            SessionEvent::coded(
                ErrorCode::UnknownOperation,
                format!("no undoable operation {operation_id}"),
            )
        }
    }

    fn save(&self) -> SessionEvent {
        match catalog::save(&self.catalog_path, self.items(), true) {
            Ok(()) => SessionEvent::Saved {
                path: self.catalog_path.display().to_string(),
                items: self.items().len(),
            },
            Err(e) => SessionEvent::coded(ErrorCode::CatalogWriteFailed, format!("{e:#}")),
        }
    }
}

/// Run `bops session`.
///
/// # Errors
///
/// Returns an error when the catalog, config or script cannot be read, or
/// when any session command failed.
pub fn run_session(
    args: &SessionArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = load_project(output, project_root)?;
    let items = load_catalog(output, &args.catalog)?;
    let mut session = Session::new(
        items,
        args.catalog.clone(),
        project.ledger.build(),
        project.export.pretty,
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.script {
        Some(ref script) => {
            let file = std::fs::File::open(script)
                .with_context(|| format!("failed to open script {}", script.display()))?;
            session.run(BufReader::new(file), &mut out, output)?;
        }
        None => session.run(io::stdin().lock(), &mut out, output)?,
    }

    info!(failures = session.failures(), "session finished");
    if session.failures() > 0 {
        anyhow::bail!("{} session command(s) failed", session.failures());
    }
    Ok(())
}
