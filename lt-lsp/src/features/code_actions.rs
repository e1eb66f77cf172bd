use super::diagnostics::{LintAction, LintDiagnostic};
use std::collections::HashMap;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Position, Range, TextEdit, Url, WorkspaceEdit,
};

/// Code actions of every stored diagnostic whose range touches `range`.
pub fn code_actions(
    uri: &Url,
    diagnostics: &[LintDiagnostic],
    range: Range,
) -> Vec<CodeActionOrCommand> {
    diagnostics
        .iter()
        .filter(|lint| intersects(lint.range(), range))
        .flat_map(|lint| {
            lint.actions
                .iter()
                .map(move |action| CodeActionOrCommand::CodeAction(to_code_action(uri, lint, action)))
        })
        .collect()
}

fn to_code_action(uri: &Url, lint: &LintDiagnostic, action: &LintAction) -> CodeAction {
    let mut code_action = CodeAction {
        title: action.title().to_string(),
        kind: Some(CodeActionKind::QUICKFIX),
        diagnostics: Some(vec![lint.diagnostic.clone()]),
        ..CodeAction::default()
    };
    match action {
        LintAction::Replace { value, .. } => {
            let edit = TextEdit {
                range: lint.range(),
                new_text: value.clone(),
            };
            code_action.edit = Some(WorkspaceEdit {
                changes: Some(HashMap::from([(uri.clone(), vec![edit])])),
                ..WorkspaceEdit::default()
            });
        }
        LintAction::Command { title, command } => {
            code_action.command = Some(command.to_lsp(title.clone()));
        }
    }
    code_action
}

fn before(a: Position, b: Position) -> bool {
    (a.line, a.character) < (b.line, b.character)
}

/// Closed-interval overlap, so a cursor sitting at either end of a diagnostic still counts.
fn intersects(a: Range, b: Range) -> bool {
    !before(a.end, b.start) && !before(b.end, a.start)
}
