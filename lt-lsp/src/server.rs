//! Main language server implementation

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ServiceError;
use crate::features::code_actions::code_actions;
use crate::features::commands::{LintCommand, COMMANDS};
use crate::features::diagnostics::{reconcile, LintDiagnostic};
use crate::features::formatting::{format_document, format_lines, to_text_edits, LineRange};
use crate::output::{ClientOutput, OutputChannel};
use crate::scheduler::{LintScheduler, LintTask};
use crate::service::{CheckRequest, HttpService, LintService, ServiceKind};
use lt_annotate::{build, Dialect};
use lt_config::{add_id, load_defaults, Loader, Scope, Settings, SETTINGS_SECTION};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::{
    CodeActionKind, CodeActionOptions, CodeActionParams, CodeActionProviderCapability,
    CodeActionResponse, ConfigurationItem, Diagnostic, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, DocumentFormattingParams, DocumentOnTypeFormattingOptions,
    DocumentOnTypeFormattingParams, ExecuteCommandOptions, ExecuteCommandParams,
    InitializeParams, InitializeResult, InitializedParams, MessageType, OneOf, SaveOptions,
    ServerCapabilities, ServerInfo, TextDocumentItem, TextDocumentSyncCapability,
    TextDocumentSyncKind, TextDocumentSyncOptions, TextDocumentSyncSaveOptions, TextEdit, Url,
    WillSaveTextDocumentParams,
};
use tower_lsp::Client;
use tracing::{debug, info};

/// Characters that trigger smart formatting while typing.
pub const ON_TYPE_TRIGGERS: &[&str] = &["\"", "'", "-", "."];

/// Persist a setting change on the client side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationUpdate {
    pub section: String,
    pub key: String,
    pub value: Value,
    pub target: String,
}

pub enum UpdateConfiguration {}

impl Notification for UpdateConfiguration {
    type Params = ConfigurationUpdate;
    const METHOD: &'static str = "languagetoolLinter/updateConfiguration";
}

#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);
    async fn log_message(&self, kind: MessageType, message: String);
    async fn show_message(&self, kind: MessageType, message: String);
    async fn update_configuration(&self, update: ConfigurationUpdate);
    /// Pull the `languageToolLinter` section through `workspace/configuration`.
    async fn workspace_settings(&self) -> Option<Value>;
}

#[async_trait]
impl LspClient for Client {
    async fn publish_diagnostics(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        Client::publish_diagnostics(self, uri, diagnostics, version).await;
    }

    async fn log_message(&self, kind: MessageType, message: String) {
        Client::log_message(self, kind, message).await;
    }

    async fn show_message(&self, kind: MessageType, message: String) {
        Client::show_message(self, kind, message).await;
    }

    async fn update_configuration(&self, update: ConfigurationUpdate) {
        self.send_notification::<UpdateConfiguration>(update).await;
    }

    async fn workspace_settings(&self) -> Option<Value> {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(SETTINGS_SECTION.to_string()),
        }];
        self.configuration(items)
            .await
            .ok()?
            .into_iter()
            .next()
            .filter(|value| !value.is_null())
    }
}

pub type ServiceFactory = Arc<
    dyn Fn(ServiceKind) -> std::result::Result<Arc<dyn LintService>, ServiceError> + Send + Sync,
>;

pub fn http_service_factory() -> ServiceFactory {
    Arc::new(
        |kind: ServiceKind| -> std::result::Result<Arc<dyn LintService>, ServiceError> {
            Ok(Arc::new(HttpService::new(kind)?))
        },
    )
}

pub struct ServerOptions {
    /// Settings in effect until the client sends its own.
    pub settings: Settings,
    /// User TOML file layered between the defaults and the client settings.
    pub config_file: Option<PathBuf>,
    pub service_factory: ServiceFactory,
}

impl ServerOptions {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            config_file: None,
            service_factory: http_service_factory(),
        }
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_service_factory(mut self, factory: ServiceFactory) -> Self {
        self.service_factory = factory;
        self
    }
}

#[derive(Clone)]
struct DocumentEntry {
    text: Arc<String>,
    language_id: String,
    version: i32,
}

#[derive(Default)]
struct DocumentStore {
    entries: RwLock<HashMap<Url, DocumentEntry>>,
}

impl DocumentStore {
    async fn open(&self, uri: Url, language_id: String, version: i32, text: String) {
        let entry = DocumentEntry {
            text: Arc::new(text),
            language_id,
            version,
        };
        self.entries.write().await.insert(uri, entry);
    }

    async fn update(&self, uri: &Url, version: i32, text: String) -> bool {
        match self.entries.write().await.get_mut(uri) {
            Some(entry) => {
                entry.text = Arc::new(text);
                entry.version = version;
                true
            }
            None => false,
        }
    }

    async fn get(&self, uri: &Url) -> Option<DocumentEntry> {
        self.entries.read().await.get(uri).cloned()
    }

    async fn remove(&self, uri: &Url) {
        self.entries.write().await.remove(uri);
    }

    async fn uris(&self) -> Vec<Url> {
        self.entries.read().await.keys().cloned().collect()
    }
}

/// Dialect used to lint a document, or `None` when the language is not checked.
fn resolve_dialect(settings: &Settings, language_id: &str) -> Option<Dialect> {
    if settings.is_plain_text(language_id) {
        return Some(Dialect::PlainText);
    }
    match Dialect::from_language_id(language_id) {
        Some(Dialect::PlainText) | None => None,
        dialect => dialect,
    }
}

fn ignored_words_key(scope: Scope) -> &'static str {
    match scope {
        Scope::Global => "ignoredWordsGlobal",
        Scope::Workspace => "ignoredWordsWorkspace",
    }
}

/// Outcome of one lint pass, committed by the scheduler when still current.
pub struct LintPass {
    version: i32,
    diagnostics: Vec<LintDiagnostic>,
}

struct ServerState<C> {
    client: C,
    output: Arc<dyn OutputChannel>,
    documents: DocumentStore,
    settings: RwLock<Settings>,
    config_file: Option<PathBuf>,
    service: RwLock<Option<Arc<dyn LintService>>>,
    service_factory: ServiceFactory,
    diagnostics: RwLock<HashMap<Url, Vec<LintDiagnostic>>>,
}

impl<C: LspClient> ServerState<C> {
    async fn reload_settings(&self, client_settings: Value) {
        let section = client_settings
            .get(SETTINGS_SECTION)
            .cloned()
            .unwrap_or(client_settings);

        let Some(mut settings) = self.load_settings(&section).await else {
            return;
        };
        for warning in settings.validate() {
            self.output
                .show(MessageType::WARNING, &warning.to_string())
                .await;
        }

        let kind = ServiceKind::from_settings(&settings);
        *self.settings.write().await = settings;
        self.ensure_service(kind).await;
    }

    /// Layer the client settings over the user file, dropping the file and then the client
    /// layer when they fail to load.
    async fn load_settings(&self, section: &Value) -> Option<Settings> {
        if let Some(path) = &self.config_file {
            match Loader::new()
                .with_file(path)
                .with_client_settings(section)
                .build()
            {
                Ok(settings) => return Some(settings),
                Err(err) => {
                    self.output
                        .show(
                            MessageType::WARNING,
                            &format!("Ignoring settings file {}: {err}", path.display()),
                        )
                        .await
                }
            }
        }
        match Loader::new().with_client_settings(section).build() {
            Ok(settings) => return Some(settings),
            Err(err) => {
                self.output
                    .show(
                        MessageType::WARNING,
                        &format!("Invalid LanguageTool configuration, using defaults: {err}"),
                    )
                    .await
            }
        }
        match load_defaults() {
            Ok(settings) => Some(settings),
            Err(err) => {
                self.output
                    .show(MessageType::ERROR, &format!("Cannot load default settings: {err}"))
                    .await;
                None
            }
        }
    }

    async fn ensure_service(&self, kind: ServiceKind) {
        let mut service = self.service.write().await;
        if service.as_ref().is_some_and(|current| current.kind() == &kind) {
            return;
        }
        if let Some(previous) = service.take() {
            if let Err(err) = previous.stop().await {
                self.output
                    .append_line(&format!("Stopping LanguageTool service failed: {err}"))
                    .await;
            }
        }
        let next = match (self.service_factory)(kind) {
            Ok(next) => next,
            Err(err) => {
                self.output
                    .show(
                        MessageType::ERROR,
                        &format!("LanguageTool service unavailable: {err}"),
                    )
                    .await;
                return;
            }
        };
        let started = next.start().await;
        match started {
            Ok(url) => {
                self.output
                    .append_line(&format!("Using LanguageTool service at {url}"))
                    .await;
                *service = Some(next);
            }
            Err(err) => {
                self.output
                    .show(
                        MessageType::ERROR,
                        &format!("LanguageTool service unavailable: {err}"),
                    )
                    .await;
            }
        }
    }

    async fn current_service(&self) -> Option<Arc<dyn LintService>> {
        self.service.read().await.clone()
    }

    async fn clear_diagnostics(&self, uri: &Url) {
        self.diagnostics.write().await.remove(uri);
        self.client
            .publish_diagnostics(uri.clone(), Vec::new(), None)
            .await;
    }

    async fn persist(&self, key: &str, value: Value, scope: Scope) {
        self.client
            .update_configuration(ConfigurationUpdate {
                section: SETTINGS_SECTION.to_string(),
                key: key.to_string(),
                value,
                target: scope.to_string(),
            })
            .await;
    }
}

#[async_trait]
impl<C: LspClient> LintTask for ServerState<C> {
    type Output = LintPass;

    async fn run(&self, uri: &Url) -> Option<LintPass> {
        let entry = self.documents.get(uri).await?;
        let settings = self.settings.read().await.clone();
        let Some(dialect) = resolve_dialect(&settings, &entry.language_id) else {
            debug!(%uri, language = %entry.language_id, "language not checked");
            return None;
        };

        let annotated = build(&entry.text, dialect);
        let request = match CheckRequest::new(&annotated, &settings) {
            Ok(request) => request,
            Err(err) => {
                self.output
                    .show(MessageType::ERROR, &ServiceError::from(err).to_string())
                    .await;
                return None;
            }
        };
        let Some(service) = self.current_service().await else {
            self.output
                .append_line("No LanguageTool service configured, skipping lint")
                .await;
            return None;
        };

        match service.invoke(&request).await {
            Ok(response) => {
                debug!(%uri, matches = response.matches.len(), "lint response");
                Some(LintPass {
                    version: entry.version,
                    diagnostics: reconcile(&entry.text, &annotated, &response.matches, &settings),
                })
            }
            Err(err) => {
                self.output
                    .show(MessageType::ERROR, &format!("LanguageTool check failed: {err}"))
                    .await;
                None
            }
        }
    }

    async fn commit(&self, uri: &Url, pass: LintPass) {
        let published: Vec<Diagnostic> = pass
            .diagnostics
            .iter()
            .map(|lint| lint.diagnostic.clone())
            .collect();
        self.diagnostics
            .write()
            .await
            .insert(uri.clone(), pass.diagnostics);
        self.client
            .publish_diagnostics(uri.clone(), published, Some(pass.version))
            .await;
    }
}

pub struct LtLanguageServer<C: LspClient = Client> {
    state: Arc<ServerState<C>>,
    scheduler: LintScheduler<ServerState<C>>,
}

impl LtLanguageServer<Client> {
    pub fn new(client: Client, settings: Settings) -> Self {
        Self::with_options(client, ServerOptions::new(settings))
    }
}

impl<C: LspClient> LtLanguageServer<C> {
    pub fn with_options(client: C, options: ServerOptions) -> Self {
        let state = Arc::new(ServerState {
            output: Arc::new(ClientOutput::new(client.clone())),
            client,
            documents: DocumentStore::default(),
            settings: RwLock::new(options.settings),
            config_file: options.config_file,
            service: RwLock::new(None),
            service_factory: options.service_factory,
            diagnostics: RwLock::new(HashMap::new()),
        });
        let scheduler = LintScheduler::new(Arc::clone(&state));
        Self { state, scheduler }
    }

    async fn settings(&self) -> Settings {
        self.state.settings.read().await.clone()
    }

    async fn lint_now(&self, uri: Url) {
        self.scheduler.request_lint(uri, Duration::ZERO).await;
    }

    async fn lint_all(&self) {
        for uri in self.state.documents.uris().await {
            self.lint_now(uri).await;
        }
    }

    async fn smart_format_edits(&self, uri: &Url, lines: Option<LineRange>) -> Option<Vec<TextEdit>> {
        let entry = self.state.documents.get(uri).await?;
        let settings = self.settings().await;
        let dialect = resolve_dialect(&settings, &entry.language_id)?;
        let spans = match lines {
            Some(range) => format_lines(&entry.text, dialect, range),
            None => format_document(&entry.text, dialect),
        };
        Some(to_text_edits(&entry.text, &spans))
    }

    async fn execute(&self, command: LintCommand) {
        info!(command = command.id(), "executing command");
        match command {
            LintCommand::IgnoreWord { word, scope } => {
                let words = {
                    let mut settings = self.state.settings.write().await;
                    let set = settings.ignored_words_mut(scope);
                    set.add(&word);
                    set.to_sorted_vec()
                };
                self.state
                    .persist(ignored_words_key(scope), json!(words), scope)
                    .await;
                self.lint_all().await;
            }
            LintCommand::RemoveIgnoredWord { word, scope } => {
                let words = {
                    let mut settings = self.state.settings.write().await;
                    let set = settings.ignored_words_mut(scope);
                    set.remove(&word);
                    set.to_sorted_vec()
                };
                self.state
                    .persist(ignored_words_key(scope), json!(words), scope)
                    .await;
                self.lint_all().await;
            }
            LintCommand::DisableRule { rule_id, scope } => {
                let rules = {
                    let mut settings = self.state.settings.write().await;
                    let rules = add_id(&settings.language_tool.disabled_rules, &rule_id);
                    settings.language_tool.disabled_rules = rules.clone();
                    rules
                };
                self.state
                    .persist("languageTool.disabledRules", json!(rules), scope)
                    .await;
                self.lint_all().await;
            }
            LintCommand::DisableCategory { category_id, scope } => {
                let categories = {
                    let mut settings = self.state.settings.write().await;
                    let categories =
                        add_id(&settings.language_tool.disabled_categories, &category_id);
                    settings.language_tool.disabled_categories = categories.clone();
                    categories
                };
                self.state
                    .persist("languageTool.disabledCategories", json!(categories), scope)
                    .await;
                self.lint_all().await;
            }
            LintCommand::LintDocument { uri } => {
                if self.state.documents.get(&uri).await.is_some() {
                    self.lint_now(uri).await;
                }
            }
        }
    }
}

#[async_trait]
impl<C: LspClient> tower_lsp::LanguageServer for LtLanguageServer<C> {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let options = params.initialization_options.unwrap_or(Value::Null);
        self.state.reload_settings(options).await;

        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    will_save: None,
                    will_save_wait_until: Some(true),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(false),
                    })),
                },
            )),
            code_action_provider: Some(CodeActionProviderCapability::Options(
                CodeActionOptions {
                    code_action_kinds: Some(vec![CodeActionKind::QUICKFIX]),
                    ..CodeActionOptions::default()
                },
            )),
            document_formatting_provider: Some(OneOf::Left(true)),
            document_on_type_formatting_provider: Some(DocumentOnTypeFormattingOptions {
                first_trigger_character: ON_TYPE_TRIGGERS[0].to_string(),
                more_trigger_character: Some(
                    ON_TYPE_TRIGGERS[1..]
                        .iter()
                        .map(|trigger| trigger.to_string())
                        .collect(),
                ),
            }),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(|command| command.to_string()).collect(),
                ..ExecuteCommandOptions::default()
            }),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "lt-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        if let Some(settings) = self.state.client.workspace_settings().await {
            self.state.reload_settings(settings).await;
        }
        if let Some(service) = self.state.current_service().await {
            match service.ping().await {
                Ok(()) => {
                    self.state
                        .output
                        .append_line("LanguageTool service is reachable")
                        .await
                }
                Err(err) => {
                    self.state
                        .output
                        .append_line(&format!("LanguageTool service did not answer: {err}"))
                        .await
                }
            }
        }
    }

    async fn shutdown(&self) -> Result<()> {
        if let Some(service) = self.state.current_service().await {
            if let Err(err) = service.stop().await {
                self.state
                    .output
                    .append_line(&format!("Stopping LanguageTool service failed: {err}"))
                    .await;
            }
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let TextDocumentItem {
            uri,
            language_id,
            version,
            text,
        } = params.text_document;
        self.state
            .documents
            .open(uri.clone(), language_id, version, text)
            .await;
        if self.settings().await.lint_on_open {
            self.lint_now(uri).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.scheduler.invalidate(&uri).await;
        if !self
            .state
            .documents
            .update(&uri, params.text_document.version, change.text)
            .await
        {
            return;
        }
        let settings = self.settings().await;
        if settings.hide_diagnostics_on_change {
            self.state.clear_diagnostics(&uri).await;
        }
        if settings.lint_on_change {
            let delay = Duration::from_millis(settings.lint_on_change_delay);
            self.scheduler.request_lint(uri, delay).await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        if self.settings().await.lint_on_save {
            self.lint_now(params.text_document.uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.scheduler.cancel_lint(&uri).await;
        self.state.documents.remove(&uri).await;
        self.state.clear_diagnostics(&uri).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let pushed = params
            .settings
            .as_object()
            .filter(|object| !object.is_empty())
            .map(|_| params.settings.clone());
        let settings = match pushed {
            Some(settings) => Some(settings),
            None => self.state.client.workspace_settings().await,
        };
        if let Some(settings) = settings {
            self.state.reload_settings(settings).await;
            self.lint_all().await;
        }
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let stored = self.state.diagnostics.read().await;
        let Some(diagnostics) = stored.get(&uri) else {
            return Ok(None);
        };
        Ok(Some(code_actions(&uri, diagnostics, params.range)))
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let command = LintCommand::parse(&params.command, &params.arguments)?;
        self.execute(command).await;
        Ok(None)
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        Ok(self
            .smart_format_edits(&params.text_document.uri, None)
            .await)
    }

    async fn will_save_wait_until(
        &self,
        params: WillSaveTextDocumentParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        if !self.settings().await.smart_format.on_save {
            return Ok(None);
        }
        Ok(self
            .smart_format_edits(&params.text_document.uri, None)
            .await)
    }

    async fn on_type_formatting(
        &self,
        params: DocumentOnTypeFormattingParams,
    ) -> Result<Option<Vec<TextEdit>>> {
        if !self.settings().await.smart_format.on_type {
            return Ok(None);
        }
        let position = params.text_document_position;
        let line = LineRange::single(position.position.line as usize);
        Ok(self
            .smart_format_edits(&position.text_document.uri, Some(line))
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as ServiceResult;
    use crate::features::commands::{IGNORE_WORD_GLOBALLY, LINT_DOCUMENT};
    use crate::features::test_support::{lint_match, SAMPLE};
    use crate::service::{LintResponse, ServiceState};
    use std::sync::Mutex;
    use tower_lsp::lsp_types::{
        CodeActionContext, CodeActionOrCommand, DiagnosticSeverity, FormattingOptions, Position,
        Range, TextDocumentContentChangeEvent, TextDocumentIdentifier,
        TextDocumentPositionParams, TextDocumentSaveReason, VersionedTextDocumentIdentifier,
    };
    use tower_lsp::LanguageServer;

    type Published = Vec<(Url, Vec<Diagnostic>, Option<i32>)>;

    #[derive(Clone, Default)]
    struct RecordingClient {
        published: Arc<Mutex<Published>>,
        shown: Arc<Mutex<Vec<String>>>,
        updates: Arc<Mutex<Vec<ConfigurationUpdate>>>,
    }

    impl RecordingClient {
        fn last_published(&self) -> Option<Vec<Diagnostic>> {
            self.published
                .lock()
                .unwrap()
                .last()
                .map(|(_, diagnostics, _)| diagnostics.clone())
        }

        fn publish_count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LspClient for RecordingClient {
        async fn publish_diagnostics(
            &self,
            uri: Url,
            diagnostics: Vec<Diagnostic>,
            version: Option<i32>,
        ) {
            self.published
                .lock()
                .unwrap()
                .push((uri, diagnostics, version));
        }

        async fn log_message(&self, _: MessageType, _: String) {}

        async fn show_message(&self, _: MessageType, message: String) {
            self.shown.lock().unwrap().push(message);
        }

        async fn update_configuration(&self, update: ConfigurationUpdate) {
            self.updates.lock().unwrap().push(update);
        }

        async fn workspace_settings(&self) -> Option<Value> {
            None
        }
    }

    struct MockService {
        kind: ServiceKind,
        latency: Duration,
        response: Mutex<Option<LintResponse>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockService {
        fn new(response: Option<LintResponse>) -> Arc<Self> {
            Self::slow(response, Duration::ZERO)
        }

        fn slow(response: Option<LintResponse>, latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                kind: ServiceKind::Public { premium: false },
                latency,
                response: Mutex::new(response),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn invocations(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn fail_from_now_on(&self) {
            *self.response.lock().unwrap() = None;
        }
    }

    #[async_trait]
    impl LintService for MockService {
        async fn start(&self) -> ServiceResult<String> {
            Ok("http://mock".into())
        }

        async fn stop(&self) -> ServiceResult<()> {
            Ok(())
        }

        async fn ping(&self) -> ServiceResult<()> {
            Ok(())
        }

        async fn invoke(&self, request: &CheckRequest) -> ServiceResult<LintResponse> {
            self.requests
                .lock()
                .unwrap()
                .push(request.get("data").unwrap_or_default().to_string());
            tokio::time::sleep(self.latency).await;
            self.response
                .lock()
                .unwrap()
                .clone()
                .ok_or(ServiceError::NotRunning)
        }

        fn state(&self) -> ServiceState {
            ServiceState::Ready("http://mock".into())
        }

        fn kind(&self) -> &ServiceKind {
            &self.kind
        }
    }

    fn typo_response() -> LintResponse {
        LintResponse {
            matches: vec![lint_match(
                17,
                4,
                "MORFOLOGIK_RULE_EN_US",
                Some("TYPOS"),
                &["test"],
            )],
        }
    }

    fn sample_uri() -> Url {
        Url::parse("file:///notes.md").unwrap()
    }

    async fn server_with(
        service: Arc<MockService>,
        client_settings: Value,
    ) -> (LtLanguageServer<RecordingClient>, RecordingClient) {
        let client = RecordingClient::default();
        let factory_service = Arc::clone(&service);
        let factory: ServiceFactory = Arc::new(
            move |_: ServiceKind| -> ServiceResult<Arc<dyn LintService>> {
                Ok(factory_service.clone())
            },
        );
        let server = LtLanguageServer::with_options(
            client.clone(),
            ServerOptions::new(load_defaults().unwrap()).with_service_factory(factory),
        );
        server
            .initialize(InitializeParams {
                initialization_options: Some(client_settings),
                ..InitializeParams::default()
            })
            .await
            .unwrap();
        (server, client)
    }

    async fn open(server: &LtLanguageServer<RecordingClient>, language_id: &str, text: &str) {
        server
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem {
                    uri: sample_uri(),
                    language_id: language_id.into(),
                    version: 1,
                    text: text.into(),
                },
            })
            .await;
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    fn code_action_params(range: Range) -> CodeActionParams {
        CodeActionParams {
            text_document: TextDocumentIdentifier { uri: sample_uri() },
            range,
            context: CodeActionContext::default(),
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn open_lints_and_publishes_diagnostics() {
        let service = MockService::new(Some(typo_response()));
        let (server, client) = server_with(service.clone(), json!({})).await;
        open(&server, "markdown", SAMPLE).await;
        settle().await;

        assert_eq!(service.invocations(), 1);
        let diagnostics = client.last_published().unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].range,
            Range::new(Position::new(2, 8), Position::new(2, 12))
        );
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::WARNING));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_check_keeps_previous_diagnostics() {
        let service = MockService::new(Some(typo_response()));
        let (server, client) = server_with(service.clone(), json!({})).await;
        open(&server, "markdown", SAMPLE).await;
        settle().await;
        let published = client.publish_count();

        service.fail_from_now_on();
        server
            .did_save(DidSaveTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: sample_uri() },
                text: None,
            })
            .await;
        settle().await;

        assert_eq!(service.invocations(), 2);
        assert_eq!(client.publish_count(), published);
        assert!(client
            .shown
            .lock()
            .unwrap()
            .iter()
            .any(|message| message.starts_with("LanguageTool check failed")));
        let actions = server
            .code_action(code_action_params(Range::new(
                Position::new(2, 9),
                Position::new(2, 9),
            )))
            .await
            .unwrap()
            .unwrap();
        assert!(!actions.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn code_actions_follow_stored_diagnostics() {
        let service = MockService::new(Some(typo_response()));
        let (server, _) = server_with(service, json!({})).await;
        open(&server, "markdown", SAMPLE).await;
        settle().await;

        let actions = server
            .code_action(code_action_params(Range::new(
                Position::new(2, 10),
                Position::new(2, 10),
            )))
            .await
            .unwrap()
            .unwrap();
        let titles: Vec<String> = actions
            .iter()
            .map(|action| match action {
                CodeActionOrCommand::CodeAction(action) => action.title.clone(),
                CodeActionOrCommand::Command(command) => command.title.clone(),
            })
            .collect();
        assert_eq!(
            titles,
            vec![
                "Always ignore 'tset'",
                "Ignore 'tset' in workspace",
                "Replace with 'test'",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn ignoring_a_word_persists_and_relints() {
        let service = MockService::new(Some(typo_response()));
        let (server, client) = server_with(service.clone(), json!({})).await;
        open(&server, "markdown", SAMPLE).await;
        settle().await;

        server
            .execute_command(ExecuteCommandParams {
                command: IGNORE_WORD_GLOBALLY.into(),
                arguments: vec![json!("Tset")],
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap();
        settle().await;

        let updates = client.updates.lock().unwrap().clone();
        assert_eq!(
            updates,
            vec![ConfigurationUpdate {
                section: SETTINGS_SECTION.into(),
                key: "ignoredWordsGlobal".into(),
                value: json!(["tset"]),
                target: "global".into(),
            }]
        );
        assert_eq!(service.invocations(), 2);
        let diagnostics = client.last_published().unwrap();
        assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::HINT));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_command_is_rejected() {
        let (server, _) = server_with(MockService::new(None), json!({})).await;
        let result = server
            .execute_command(ExecuteCommandParams {
                command: "languagetoolLinter.nope".into(),
                arguments: vec![],
                work_done_progress_params: Default::default(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn lint_document_command_only_lints_open_documents() {
        let service = MockService::new(Some(LintResponse::default()));
        let (server, _) = server_with(service.clone(), json!({ "lintOnOpen": false })).await;
        server
            .execute_command(ExecuteCommandParams {
                command: LINT_DOCUMENT.into(),
                arguments: vec![json!(sample_uri().to_string())],
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap();
        settle().await;
        assert_eq!(service.invocations(), 0);

        open(&server, "markdown", SAMPLE).await;
        server
            .execute_command(ExecuteCommandParams {
                command: LINT_DOCUMENT.into(),
                arguments: vec![json!(sample_uri().to_string())],
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap();
        settle().await;
        assert_eq!(service.invocations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn changes_are_debounced() {
        let service = MockService::new(Some(LintResponse::default()));
        let (server, _) = server_with(
            service.clone(),
            json!({ "lintOnOpen": false, "lintOnChange": true, "lintOnChangeDelay": 300 }),
        )
        .await;
        open(&server, "markdown", SAMPLE).await;

        for (version, text) in [(2, "First draft."), (3, "Second draft.")] {
            server
                .did_change(DidChangeTextDocumentParams {
                    text_document: VersionedTextDocumentIdentifier {
                        uri: sample_uri(),
                        version,
                    },
                    content_changes: vec![TextDocumentContentChangeEvent {
                        range: None,
                        range_length: None,
                        text: text.into(),
                    }],
                })
                .await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let requests = service.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("Second draft."));
    }

    #[tokio::test(start_paused = true)]
    async fn edit_during_check_drops_the_outdated_result() {
        let service = MockService::slow(Some(typo_response()), Duration::from_millis(200));
        let (server, client) = server_with(service.clone(), json!({})).await;
        open(&server, "markdown", SAMPLE).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        server
            .did_change(DidChangeTextDocumentParams {
                text_document: VersionedTextDocumentIdentifier {
                    uri: sample_uri(),
                    version: 2,
                },
                content_changes: vec![TextDocumentContentChangeEvent {
                    range: None,
                    range_length: None,
                    text: "Short.".into(),
                }],
            })
            .await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(service.invocations(), 1);
        assert_eq!(client.publish_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn close_clears_diagnostics() {
        let service = MockService::new(Some(typo_response()));
        let (server, client) = server_with(service, json!({})).await;
        open(&server, "markdown", SAMPLE).await;
        settle().await;

        server
            .did_close(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: sample_uri() },
            })
            .await;

        assert_eq!(client.last_published(), Some(Vec::new()));
        let actions = server
            .code_action(code_action_params(Range::new(
                Position::new(2, 10),
                Position::new(2, 10),
            )))
            .await
            .unwrap();
        assert!(actions.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn plain_text_needs_opt_in() {
        let service = MockService::new(Some(LintResponse::default()));
        let (server, _) = server_with(service.clone(), json!({})).await;
        open(&server, "plaintext", "Some words.").await;
        settle().await;
        assert_eq!(service.invocations(), 0);

        let service = MockService::new(Some(LintResponse::default()));
        let (server, _) = server_with(
            service.clone(),
            json!({ "plainText": { "enabled": true, "languageIds": ["latex"] } }),
        )
        .await;
        open(&server, "latex", "Some words.").await;
        settle().await;
        assert_eq!(service.invocations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn formatting_rewrites_prose_only() {
        let (server, _) = server_with(MockService::new(None), json!({ "lintOnOpen": false })).await;
        open(&server, "markdown", "Say \"hi\" to `a--b`.\n").await;

        let edits = server
            .formatting(DocumentFormattingParams {
                text_document: TextDocumentIdentifier { uri: sample_uri() },
                options: FormattingOptions::default(),
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "Say \u{201C}hi\u{201D} to `a--b`.\n");

        let on_save = server
            .will_save_wait_until(WillSaveTextDocumentParams {
                text_document: TextDocumentIdentifier { uri: sample_uri() },
                reason: TextDocumentSaveReason::MANUAL,
            })
            .await
            .unwrap();
        assert!(on_save.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn on_type_formatting_touches_the_cursor_line() {
        let (server, _) = server_with(
            MockService::new(None),
            json!({ "lintOnOpen": false, "smartFormat": { "onType": true } }),
        )
        .await;
        open(&server, "markdown", "one--two\n\nthree--four\n").await;

        let edits = server
            .on_type_formatting(DocumentOnTypeFormattingParams {
                text_document_position: TextDocumentPositionParams {
                    text_document: TextDocumentIdentifier { uri: sample_uri() },
                    position: Position::new(2, 7),
                },
                ch: "-".into(),
                options: FormattingOptions::default(),
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].range.start, Position::new(2, 0));
        assert_eq!(edits[0].new_text, "three\u{2013}four\n");
    }

    #[tokio::test(start_paused = true)]
    async fn broken_settings_file_keeps_client_settings() {
        let client = RecordingClient::default();
        let service = MockService::new(None);
        let factory: ServiceFactory = Arc::new(
            move |_: ServiceKind| -> ServiceResult<Arc<dyn LintService>> { Ok(service.clone()) },
        );
        let server = LtLanguageServer::with_options(
            client.clone(),
            ServerOptions::new(load_defaults().unwrap())
                .with_config_file("/nonexistent/lt-lsp/settings.toml")
                .with_service_factory(factory),
        );
        server
            .initialize(InitializeParams {
                initialization_options: Some(json!({ "lintOnOpen": false, "hideRuleIds": true })),
                ..InitializeParams::default()
            })
            .await
            .unwrap();

        let settings = server.settings().await;
        assert!(!settings.lint_on_open);
        assert!(settings.hide_rule_ids);
        assert!(client
            .shown
            .lock()
            .unwrap()
            .iter()
            .any(|message| message.starts_with("Ignoring settings file")));
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_settings_warn_and_fall_back() {
        let (server, client) = server_with(
            MockService::new(None),
            json!({ "diagnosticSeverity": "shouty" }),
        )
        .await;
        assert_eq!(server.settings().await.diagnostic_severity, "warning");
        assert!(client
            .shown
            .lock()
            .unwrap()
            .iter()
            .any(|message| message.contains("shouty")));
    }
}
