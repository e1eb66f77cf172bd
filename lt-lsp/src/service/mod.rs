//! LanguageTool service backends
//!
//!     The server only needs a base URL and a way to post a check request. How the service got
//!     there is the backend's business. Every backend implements [`LintService`] and is selected
//!     through a [`ServiceKind`] resolved from the settings.
//!
//!     Readiness is a completion signal: `start()` publishes the resolved URL on a watch
//!     channel exactly once, and `invoke()` waits on that channel instead of polling.

pub mod http;
pub mod protocol;

pub use http::HttpService;
pub use protocol::{CheckRequest, LintMatch, LintResponse};

use crate::error::Result;
use lt_config::{ServiceType, Settings};
use tower_lsp::async_trait;

/// Public API endpoints.
pub const PUBLIC_URL: &str = "https://api.languagetool.org";
pub const PREMIUM_URL: &str = "https://api.languagetoolplus.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Starting,
    Ready(String),
    Failed(String),
}

/// Which backend to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    /// A user-run service at a fixed base URL.
    External { url: String },
    /// The public API. Credentials select the premium endpoint.
    Public { premium: bool },
}

impl ServiceKind {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.service() {
            ServiceType::External => ServiceKind::External {
                url: settings.external.url.clone(),
            },
            ServiceType::Public => ServiceKind::Public {
                premium: !settings.public.username.is_empty()
                    && !settings.public.api_key.is_empty(),
            },
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            ServiceKind::External { url } => url.trim_end_matches('/'),
            ServiceKind::Public { premium: true } => PREMIUM_URL,
            ServiceKind::Public { premium: false } => PUBLIC_URL,
        }
    }
}

#[async_trait]
pub trait LintService: Send + Sync + 'static {
    /// Bring the backend up and return its base URL.
    async fn start(&self) -> Result<String>;

    async fn stop(&self) -> Result<()>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<()>;

    async fn invoke(&self, request: &CheckRequest) -> Result<LintResponse>;

    fn state(&self) -> ServiceState;

    fn kind(&self) -> &ServiceKind;
}
