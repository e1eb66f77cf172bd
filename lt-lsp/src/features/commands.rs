use lt_config::Scope;
use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::{Command, Url};

pub const IGNORE_WORD_GLOBALLY: &str = "languagetoolLinter.ignoreWordGlobally";
pub const IGNORE_WORD_IN_WORKSPACE: &str = "languagetoolLinter.ignoreWordInWorkspace";
pub const REMOVE_GLOBALLY_IGNORED_WORD: &str = "languagetoolLinter.removeGloballyIgnoredWord";
pub const REMOVE_WORKSPACE_IGNORED_WORD: &str = "languagetoolLinter.removeWorkspaceIgnoredWord";
pub const DISABLE_RULE_GLOBALLY: &str = "languagetoolLinter.disableRuleGlobally";
pub const DISABLE_RULE_IN_WORKSPACE: &str = "languagetoolLinter.disableRuleInWorkspace";
pub const DISABLE_CATEGORY_GLOBALLY: &str = "languagetoolLinter.disableCategoryGlobally";
pub const DISABLE_CATEGORY_IN_WORKSPACE: &str = "languagetoolLinter.disableCategoryInWorkspace";
pub const LINT_DOCUMENT: &str = "languagetoolLinter.lintDocument";

/// Every command advertised through `executeCommandProvider`.
pub const COMMANDS: &[&str] = &[
    IGNORE_WORD_GLOBALLY,
    IGNORE_WORD_IN_WORKSPACE,
    REMOVE_GLOBALLY_IGNORED_WORD,
    REMOVE_WORKSPACE_IGNORED_WORD,
    DISABLE_RULE_GLOBALLY,
    DISABLE_RULE_IN_WORKSPACE,
    DISABLE_CATEGORY_GLOBALLY,
    DISABLE_CATEGORY_IN_WORKSPACE,
    LINT_DOCUMENT,
];

/// A deferred configuration change emitted by the reconciler and executed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintCommand {
    IgnoreWord { word: String, scope: Scope },
    RemoveIgnoredWord { word: String, scope: Scope },
    DisableRule { rule_id: String, scope: Scope },
    DisableCategory { category_id: String, scope: Scope },
    LintDocument { uri: Url },
}

impl LintCommand {
    pub fn id(&self) -> &'static str {
        match self {
            LintCommand::IgnoreWord { scope: Scope::Global, .. } => IGNORE_WORD_GLOBALLY,
            LintCommand::IgnoreWord { scope: Scope::Workspace, .. } => IGNORE_WORD_IN_WORKSPACE,
            LintCommand::RemoveIgnoredWord { scope: Scope::Global, .. } => {
                REMOVE_GLOBALLY_IGNORED_WORD
            }
            LintCommand::RemoveIgnoredWord { scope: Scope::Workspace, .. } => {
                REMOVE_WORKSPACE_IGNORED_WORD
            }
            LintCommand::DisableRule { scope: Scope::Global, .. } => DISABLE_RULE_GLOBALLY,
            LintCommand::DisableRule { scope: Scope::Workspace, .. } => DISABLE_RULE_IN_WORKSPACE,
            LintCommand::DisableCategory { scope: Scope::Global, .. } => DISABLE_CATEGORY_GLOBALLY,
            LintCommand::DisableCategory { scope: Scope::Workspace, .. } => {
                DISABLE_CATEGORY_IN_WORKSPACE
            }
            LintCommand::LintDocument { .. } => LINT_DOCUMENT,
        }
    }

    pub fn argument(&self) -> Value {
        match self {
            LintCommand::IgnoreWord { word, .. } | LintCommand::RemoveIgnoredWord { word, .. } => {
                Value::String(word.clone())
            }
            LintCommand::DisableRule { rule_id, .. } => Value::String(rule_id.clone()),
            LintCommand::DisableCategory { category_id, .. } => Value::String(category_id.clone()),
            LintCommand::LintDocument { uri } => Value::String(uri.to_string()),
        }
    }

    pub fn to_lsp(&self, title: impl Into<String>) -> Command {
        Command {
            title: title.into(),
            command: self.id().to_string(),
            arguments: Some(vec![self.argument()]),
        }
    }

    pub fn parse(command: &str, arguments: &[Value]) -> Result<Self> {
        let argument = || -> Result<String> {
            arguments
                .first()
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .ok_or_else(|| Error::invalid_params(format!("{command} expects one string argument")))
        };
        let parsed = match command {
            IGNORE_WORD_GLOBALLY => LintCommand::IgnoreWord {
                word: argument()?,
                scope: Scope::Global,
            },
            IGNORE_WORD_IN_WORKSPACE => LintCommand::IgnoreWord {
                word: argument()?,
                scope: Scope::Workspace,
            },
            REMOVE_GLOBALLY_IGNORED_WORD => LintCommand::RemoveIgnoredWord {
                word: argument()?,
                scope: Scope::Global,
            },
            REMOVE_WORKSPACE_IGNORED_WORD => LintCommand::RemoveIgnoredWord {
                word: argument()?,
                scope: Scope::Workspace,
            },
            DISABLE_RULE_GLOBALLY => LintCommand::DisableRule {
                rule_id: argument()?,
                scope: Scope::Global,
            },
            DISABLE_RULE_IN_WORKSPACE => LintCommand::DisableRule {
                rule_id: argument()?,
                scope: Scope::Workspace,
            },
            DISABLE_CATEGORY_GLOBALLY => LintCommand::DisableCategory {
                category_id: argument()?,
                scope: Scope::Global,
            },
            DISABLE_CATEGORY_IN_WORKSPACE => LintCommand::DisableCategory {
                category_id: argument()?,
                scope: Scope::Workspace,
            },
            LINT_DOCUMENT => {
                let raw = argument()?;
                let uri = Url::parse(&raw)
                    .map_err(|err| Error::invalid_params(format!("invalid uri '{raw}': {err}")))?;
                LintCommand::LintDocument { uri }
            }
            other => return Err(Error::invalid_params(format!("unknown command '{other}'"))),
        };
        Ok(parsed)
    }
}
