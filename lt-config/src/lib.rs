//! Shared configuration loader for the lt language server.
//!
//! `defaults/lt.default.toml` is embedded into every binary so that docs and runtime behavior
//! stay in sync. Callers layer a user file and the editor's settings on top of those defaults
//! via [`Loader`] before deserializing into [`Settings`].
//!
//! Editor settings arrive as JSON with camelCase keys (`diagnosticSeverity`,
//! `smartFormat.onType`). They are rewritten to the snake_case keys of the defaults file before
//! layering, see [`normalize_keys`].

mod ignored_words;

pub use config::ConfigError;
pub use ignored_words::{IgnoredWordSet, IgnoredWords};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const DEFAULT_TOML: &str = include_str!("../defaults/lt.default.toml");

/// Name of the settings section clients use (`workspace/configuration`, initialization options).
pub const SETTINGS_SECTION: &str = "languageToolLinter";

/// Top-level settings consumed by the language server.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub service_type: String,
    pub lint_on_open: bool,
    pub lint_on_change: bool,
    pub lint_on_change_delay: u64,
    pub lint_on_save: bool,
    pub hide_diagnostics_on_change: bool,
    pub hide_rule_ids: bool,
    pub diagnostic_severity: String,
    pub diagnostic_severity_auto: bool,
    pub show_ignored_word_hints: bool,
    pub ignored_words_global: IgnoredWordSet,
    pub ignored_words_workspace: IgnoredWordSet,
    pub external: ExternalSettings,
    pub public: PublicSettings,
    pub language_tool: LanguageToolSettings,
    pub plain_text: PlainTextSettings,
    pub smart_format: SmartFormatSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalSettings {
    pub url: String,
}

/// Credentials for the premium tier of the public API. Both empty means the free tier.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicSettings {
    pub username: String,
    pub api_key: String,
}

/// Pass-through check parameters. Rule and category lists are comma separated, as the service
/// expects them.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguageToolSettings {
    pub language: String,
    pub mother_tongue: String,
    pub preferred_variants: String,
    pub disabled_rules: String,
    pub disabled_categories: String,
    pub enabled_rules: String,
    pub enabled_categories: String,
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlainTextSettings {
    pub enabled: bool,
    pub language_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmartFormatSettings {
    pub on_type: bool,
    pub on_save: bool,
}

/// Base diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "information" => Ok(Severity::Information),
            "warning" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Which kind of service backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    External,
    Public,
}

impl FromStr for ServiceType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "external" => Ok(ServiceType::External),
            "public" => Ok(ServiceType::Public),
            _ => Err(()),
        }
    }
}

/// Where a persisted setting lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Workspace,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Workspace => f.write_str("workspace"),
        }
    }
}

/// A recoverable configuration problem, reported to the user while a safe default is used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigWarning {
    #[error("unknown diagnostic severity '{0}', using 'warning'")]
    UnknownSeverity(String),
    #[error("unsupported service type '{0}', using 'public'")]
    UnsupportedServiceType(String),
    #[error("ignoring malformed {key} entries (ids may not contain spaces): {entries:?}")]
    MalformedIds { key: &'static str, entries: Vec<String> },
}

impl Settings {
    /// Replace malformed values by safe defaults, returning what was fixed.
    pub fn validate(&mut self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.diagnostic_severity.parse::<Severity>().is_err() {
            warnings.push(ConfigWarning::UnknownSeverity(
                self.diagnostic_severity.clone(),
            ));
            self.diagnostic_severity = "warning".to_string();
        }

        if self.service_type.parse::<ServiceType>().is_err() {
            warnings.push(ConfigWarning::UnsupportedServiceType(
                self.service_type.clone(),
            ));
            self.service_type = "public".to_string();
        }

        let language_tool = &mut self.language_tool;
        for (key, list) in [
            ("disabledRules", &mut language_tool.disabled_rules),
            ("disabledCategories", &mut language_tool.disabled_categories),
            ("enabledRules", &mut language_tool.enabled_rules),
            ("enabledCategories", &mut language_tool.enabled_categories),
        ] {
            let (kept, malformed) = split_ids(list);
            if !malformed.is_empty() {
                warnings.push(ConfigWarning::MalformedIds {
                    key,
                    entries: malformed,
                });
            }
            *list = kept.join(",");
        }

        warnings
    }

    pub fn severity(&self) -> Severity {
        self.diagnostic_severity
            .parse()
            .unwrap_or(Severity::Warning)
    }

    pub fn service(&self) -> ServiceType {
        self.service_type.parse().unwrap_or(ServiceType::Public)
    }

    /// Whether `language_id` is linted as plain text.
    pub fn is_plain_text(&self, language_id: &str) -> bool {
        self.plain_text.enabled
            && (language_id == "plaintext"
                || self.plain_text.language_ids.iter().any(|id| id == language_id))
    }

    pub fn ignored_words(&self) -> IgnoredWords<'_> {
        IgnoredWords {
            global: &self.ignored_words_global,
            workspace: &self.ignored_words_workspace,
        }
    }

    pub fn ignored_words_mut(&mut self, scope: Scope) -> &mut IgnoredWordSet {
        match scope {
            Scope::Global => &mut self.ignored_words_global,
            Scope::Workspace => &mut self.ignored_words_workspace,
        }
    }

    pub fn is_ignored_word(&self, word: &str) -> bool {
        self.ignored_words().contains(word)
    }
}

/// Split a comma separated id list into well formed ids and entries containing whitespace.
pub fn split_ids(list: &str) -> (Vec<String>, Vec<String>) {
    let mut kept = Vec::new();
    let mut malformed = Vec::new();
    for entry in list.split(',') {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.contains(char::is_whitespace) {
            malformed.push(trimmed.to_string());
        } else {
            kept.push(trimmed.to_string());
        }
    }
    (kept, malformed)
}

/// Add `id` to a comma separated list, keeping it sorted and free of duplicates.
pub fn add_id(list: &str, id: &str) -> String {
    let (mut ids, _) = split_ids(list);
    ids.push(id.to_string());
    ids.sort();
    ids.dedup();
    ids.join(",")
}

/// Rewrite camelCase object keys to snake_case and drop nulls, recursively.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (snake_case(&key), normalize_keys(value)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (idx, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if idx > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer the editor's settings object (camelCase JSON). Non-object values are ignored.
    pub fn with_client_settings(mut self, settings: &Value) -> Self {
        if let normalized @ Value::Object(_) = normalize_keys(settings.clone()) {
            let json = normalized.to_string();
            self.builder = self
                .builder
                .add_source(File::from_str(&json, FileFormat::Json));
        }
        self
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<Settings, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<Settings, ConfigError> {
    Loader::new().build()
}
