use crate::service::protocol::{Category, Replacement, Rule};
use crate::service::LintMatch;
use lt_config::{Loader, Settings};
use serde_json::Value;

pub(crate) const SAMPLE: &str = "# Notes\n\nThis is tset text.\n\nAn \"quoted\" line--done...\n";

/// Settings as the editor would send them, layered over the defaults.
pub(crate) fn settings(client: Value) -> Settings {
    let mut settings = Loader::new()
        .with_client_settings(&client)
        .build()
        .expect("test settings to build");
    settings.validate();
    settings
}

pub(crate) fn lint_match(
    offset: usize,
    length: usize,
    rule_id: &str,
    category: Option<&str>,
    replacements: &[&str],
) -> LintMatch {
    LintMatch {
        offset,
        length,
        message: "message".into(),
        short_message: String::new(),
        replacements: replacements
            .iter()
            .map(|value| Replacement {
                value: value.to_string(),
            })
            .collect(),
        rule: Rule {
            id: rule_id.into(),
            description: String::new(),
            issue_type: None,
            category: category.map(|id| Category {
                id: id.into(),
                name: id.into(),
            }),
        },
    }
}
