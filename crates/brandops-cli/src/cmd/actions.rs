//! `bops actions`: the action menu with what each action needs.

use crate::output::{
    OutputMode, cli_flag_for, pretty_kv, pretty_rule, pretty_section, render_mode,
};
use brandops_core::ActionKind;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ActionsArgs {
    /// Phrase confirmation prompts for this many items.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInfo {
    pub kind: ActionKind,
    pub title: &'static str,
    pub reversible: bool,
    pub destructive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_param: Option<&'static str>,
    pub prompt: String,
}

impl ActionInfo {
    fn new(kind: ActionKind, count: usize) -> Self {
        Self {
            kind,
            title: kind.title(),
            reversible: kind.is_reversible(),
            destructive: kind.is_destructive(),
            required_param: kind.required_param(),
            prompt: kind.prompt(count),
        }
    }
}

pub fn catalog_of_actions(count: usize) -> Vec<ActionInfo> {
    ActionKind::ALL
        .into_iter()
        .map(|kind| ActionInfo::new(kind, count))
        .collect()
}

fn write_text(actions: &[ActionInfo], w: &mut dyn Write) -> io::Result<()> {
    for a in actions {
        let mut flags = Vec::new();
        if a.reversible {
            flags.push("undoable");
        }
        if a.destructive {
            flags.push("destructive");
        }
        let param = a
            .required_param
            .map_or_else(String::new, |p| format!(" --{}", cli_flag_for(p)));
        if flags.is_empty() {
            writeln!(w, "{}{param}", a.kind)?;
        } else {
            writeln!(w, "{}{param}  [{}]", a.kind, flags.join(","))?;
        }
    }
    Ok(())
}

fn write_pretty(actions: &[ActionInfo], w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, "Bulk actions")?;
    for a in actions {
        writeln!(w, "{} ({})", a.title, a.kind)?;
        if let Some(param) = a.required_param {
            pretty_kv(w, "  Needs", param)?;
        }
        pretty_kv(w, "  Undo", if a.reversible { "yes" } else { "no" })?;
        if a.destructive {
            pretty_kv(w, "  Warning", "destructive")?;
        }
        pretty_kv(w, "  Prompt", &a.prompt)?;
    }
    pretty_rule(w)
}

/// Run `bops actions`.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_actions(args: &ActionsArgs, output: OutputMode) -> anyhow::Result<()> {
    let actions = catalog_of_actions(args.count);
    render_mode(
        output,
        &actions,
        |a, w| write_text(a, w),
        |a, w| write_pretty(a, w),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_action_in_menu_order() {
        let actions = catalog_of_actions(3);
        let kinds: Vec<ActionKind> = actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, ActionKind::ALL.to_vec());
    }

    #[test]
    fn delete_is_flagged_and_not_undoable() {
        let delete = catalog_of_actions(2)
            .into_iter()
            .find(|a| a.kind == ActionKind::Delete)
            .unwrap();
        assert!(delete.destructive);
        assert!(!delete.reversible);
        assert!(delete.required_param.is_none());
        assert_eq!(delete.prompt, ActionKind::Delete.prompt(2));
    }

    #[test]
    fn json_shape_is_camel_case() {
        let value = serde_json::to_value(catalog_of_actions(1)).unwrap();
        assert_eq!(value[0]["kind"], "change-status");
        assert_eq!(value[0]["requiredParam"], "status");
        assert!(value[5].get("requiredParam").is_none());
    }

    #[test]
    fn text_names_the_flag() {
        let mut buf = Vec::new();
        write_text(&catalog_of_actions(1), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().any(|l| l.starts_with("assign-tags --tag")));
        assert!(text.lines().any(|l| l == "delete  [destructive]"));
        assert!(text.lines().any(|l| l == "export"));
    }
}
