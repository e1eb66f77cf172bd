//! Match-to-diagnostic reconciliation
//!
//!     Turns the matches of one check response into LSP diagnostics plus the corrective actions
//!     offered for each of them. Matches are processed in service order and never re-sorted.
//!
//!     Per match:
//!         1. annotated offsets (UTF-16) → document bytes → LSP range
//!         2. spelling-class or grammar-class, by rule id
//!         3. severity: configured base, optionally refined by category (auto mode)
//!         4. hint override for ignored words and inline ignore directives
//!         5. actions: replacements, ignore toggles, rule/category disables
//!
//!     The reconciler never touches configuration. Ignore and disable actions carry a
//!     [`LintCommand`] that the server executes when the user picks it.

use super::commands::LintCommand;
use super::ignore_list::IgnoreList;
use super::line_index::LineIndex;
use crate::service::LintMatch;
use lt_annotate::AnnotatedText;
use lt_config::{Scope, Settings, Severity};
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Range};

pub const SOURCE: &str = "LanguageTool";

const SPELLING_RULE_MARKERS: &[&str] = &[
    "MORFOLOGIK_RULE",
    "SPELLER_RULE",
    "HUNSPELL_RULE",
    "HUNSPELL_NO_SUGGEST_RULE",
    "FR_SPELLING_RULE",
];

const AUTO_WARNING_CATEGORIES: &[&str] = &["GRAMMAR", "PUNCTUATION", "TYPOGRAPHY"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintAction {
    /// Replace the diagnostic's range with `value`.
    Replace { title: String, value: String },
    Command { title: String, command: LintCommand },
}

impl LintAction {
    pub fn title(&self) -> &str {
        match self {
            LintAction::Replace { title, .. } | LintAction::Command { title, .. } => title,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LintDiagnostic {
    pub diagnostic: Diagnostic,
    pub actions: Vec<LintAction>,
}

impl LintDiagnostic {
    pub fn range(&self) -> Range {
        self.diagnostic.range
    }
}

pub fn is_spelling_rule(rule_id: &str) -> bool {
    SPELLING_RULE_MARKERS
        .iter()
        .any(|marker| rule_id.contains(marker))
}

fn to_lsp_severity(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Information => DiagnosticSeverity::INFORMATION,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Error => DiagnosticSeverity::ERROR,
    }
}

fn base_severity(settings: &Settings, found: &LintMatch, spelling: bool) -> Severity {
    let configured = settings.severity();
    if !settings.diagnostic_severity_auto {
        return configured;
    }
    if spelling {
        return Severity::Error;
    }
    let category = found.category_id().unwrap_or_default();
    if AUTO_WARNING_CATEGORIES
        .iter()
        .any(|marker| category.contains(marker))
    {
        Severity::Warning
    } else {
        configured
    }
}

/// Reconcile one check response against `text`, the document the request was built from.
pub fn reconcile(
    text: &str,
    annotated: &AnnotatedText,
    matches: &[LintMatch],
    settings: &Settings,
) -> Vec<LintDiagnostic> {
    let index = LineIndex::new(text);
    let ignore_list = IgnoreList::build(text);
    let words = settings.ignored_words();
    let mut diagnostics = Vec::with_capacity(matches.len());

    for found in matches {
        let start = annotated.source_offset(found.offset).min(text.len());
        let end = annotated
            .source_offset(found.offset.saturating_add(found.length))
            .clamp(start, text.len());
        let matched = text.get(start..end).unwrap_or_default();
        let range = index.range(start, end);
        let rule_id = found.rule.id.as_str();
        let spelling = is_spelling_rule(rule_id);

        let in_global = spelling && words.global.contains(matched);
        let in_workspace = spelling && words.workspace.contains(matched);
        let ignored_word = in_global || in_workspace;
        if ignored_word && !settings.show_ignored_word_hints {
            continue;
        }

        let directive = ignore_list.is_ignored(range.start.line as usize, rule_id, matched);
        let severity = if ignored_word || directive {
            DiagnosticSeverity::HINT
        } else {
            to_lsp_severity(base_severity(settings, found, spelling))
        };

        let actions = if spelling && ignored_word {
            removal_actions(matched, in_global, in_workspace)
        } else if spelling {
            let mut actions = ignore_actions(matched);
            actions.extend(replacement_actions(found));
            actions
        } else {
            let mut actions = replacement_actions(found);
            actions.extend(disable_actions(found));
            actions
        };

        diagnostics.push(LintDiagnostic {
            diagnostic: diagnostic(found, range, severity, settings.hide_rule_ids),
            actions,
        });
    }

    diagnostics
}

fn diagnostic(
    found: &LintMatch,
    range: Range,
    severity: DiagnosticSeverity,
    hide_rule_ids: bool,
) -> Diagnostic {
    let rule_id = found.rule.id.as_str();
    let show_id = !hide_rule_ids && !rule_id.is_empty();
    let message = if show_id {
        format!("{} ({rule_id})", found.message)
    } else {
        found.message.clone()
    };
    Diagnostic {
        range,
        severity: Some(severity),
        code: show_id.then(|| NumberOrString::String(rule_id.to_string())),
        source: Some(SOURCE.to_string()),
        message,
        ..Diagnostic::default()
    }
}

fn removal_actions(word: &str, in_global: bool, in_workspace: bool) -> Vec<LintAction> {
    let mut actions = Vec::new();
    if in_global {
        actions.push(LintAction::Command {
            title: format!("Remove '{word}' from always ignored words"),
            command: LintCommand::RemoveIgnoredWord {
                word: word.to_string(),
                scope: Scope::Global,
            },
        });
    }
    if in_workspace {
        actions.push(LintAction::Command {
            title: format!("Remove '{word}' from workspace ignored words"),
            command: LintCommand::RemoveIgnoredWord {
                word: word.to_string(),
                scope: Scope::Workspace,
            },
        });
    }
    actions
}

fn ignore_actions(word: &str) -> Vec<LintAction> {
    vec![
        LintAction::Command {
            title: format!("Always ignore '{word}'"),
            command: LintCommand::IgnoreWord {
                word: word.to_string(),
                scope: Scope::Global,
            },
        },
        LintAction::Command {
            title: format!("Ignore '{word}' in workspace"),
            command: LintCommand::IgnoreWord {
                word: word.to_string(),
                scope: Scope::Workspace,
            },
        },
    ]
}

fn replacement_actions(found: &LintMatch) -> Vec<LintAction> {
    found
        .replacements
        .iter()
        .map(|replacement| LintAction::Replace {
            title: if replacement.value.is_empty() {
                "Remove".to_string()
            } else {
                format!("Replace with '{}'", replacement.value)
            },
            value: replacement.value.clone(),
        })
        .collect()
}

fn disable_actions(found: &LintMatch) -> Vec<LintAction> {
    let mut actions = Vec::new();
    let rule_id = found.rule.id.as_str();
    if !rule_id.is_empty() {
        for scope in [Scope::Global, Scope::Workspace] {
            actions.push(LintAction::Command {
                title: format!("Disable rule {rule_id} {}", scope_suffix(scope)),
                command: LintCommand::DisableRule {
                    rule_id: rule_id.to_string(),
                    scope,
                },
            });
        }
    }
    if let Some(category_id) = found.category_id() {
        for scope in [Scope::Global, Scope::Workspace] {
            actions.push(LintAction::Command {
                title: format!("Disable category {category_id} {}", scope_suffix(scope)),
                command: LintCommand::DisableCategory {
                    category_id: category_id.to_string(),
                    scope,
                },
            });
        }
    }
    actions
}

fn scope_suffix(scope: Scope) -> &'static str {
    match scope {
        Scope::Global => "globally",
        Scope::Workspace => "in workspace",
    }
}
