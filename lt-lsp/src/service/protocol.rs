//! Wire types of the LanguageTool HTTP API (`/v2/check`).

use lt_annotate::AnnotatedText;
use lt_config::Settings;
use serde::Deserialize;

/// Body of a successful check response. Only the fields the server consumes are modelled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LintResponse {
    #[serde(default)]
    pub matches: Vec<LintMatch>,
}

/// One reported issue. `offset` and `length` are UTF-16 code units into the annotated text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMatch {
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub short_message: String,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    #[serde(default)]
    pub rule: Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Replacement {
    #[serde(default)]
    pub value: String,
}

impl LintMatch {
    pub fn category_id(&self) -> Option<&str> {
        self.rule
            .category
            .as_ref()
            .map(|category| category.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

/// Form fields of one `/v2/check` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRequest {
    fields: Vec<(&'static str, String)>,
}

impl CheckRequest {
    /// Build the request for `annotated`, passing through every non-empty check parameter.
    pub fn new(annotated: &AnnotatedText, settings: &Settings) -> serde_json::Result<Self> {
        let mut request = Self {
            fields: vec![("data", annotated.to_json()?)],
        };
        let params = &settings.language_tool;
        let language = if params.language.is_empty() {
            "auto"
        } else {
            params.language.as_str()
        };
        request.push("language", language);
        request.push("motherTongue", &params.mother_tongue);
        if language == "auto" {
            request.push("preferredVariants", &params.preferred_variants);
        }
        request.push("disabledRules", &params.disabled_rules);
        request.push("disabledCategories", &params.disabled_categories);
        request.push("enabledRules", &params.enabled_rules);
        request.push("enabledCategories", &params.enabled_categories);
        if params.level != "default" {
            request.push("level", &params.level);
        }
        request.push("username", &settings.public.username);
        request.push("apiKey", &settings.public.api_key);
        Ok(request)
    }

    fn push(&mut self, key: &'static str, value: &str) {
        if !value.is_empty() {
            self.fields.push((key, value.to_string()));
        }
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
    }
}
