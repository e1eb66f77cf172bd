use super::{CheckRequest, LintResponse, LintService, ServiceKind, ServiceState};
use crate::error::{Result, ServiceError};
use reqwest::{Client, Url};
use tokio::sync::watch;
use tower_lsp::async_trait;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("lt-lsp/", env!("CARGO_PKG_VERSION"));

/// HTTP backend for both the external and the public service kinds.
pub struct HttpService {
    client: Client,
    kind: ServiceKind,
    state: watch::Sender<ServiceState>,
}

impl HttpService {
    pub fn new(kind: ServiceKind) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ServiceError::Start(err.to_string()))?;
        let (state, _) = watch::channel(ServiceState::Stopped);
        Ok(Self {
            client,
            kind,
            state,
        })
    }

    /// Wait for a pending start to settle and return the resolved URL.
    async fn ready_url(&self) -> Result<String> {
        let mut receiver = self.state.subscribe();
        let state = receiver
            .wait_for(|state| !matches!(state, ServiceState::Starting))
            .await
            .map_err(|_| ServiceError::NotRunning)?;
        match &*state {
            ServiceState::Ready(url) => Ok(url.clone()),
            ServiceState::Failed(reason) => Err(ServiceError::Start(reason.clone())),
            ServiceState::Stopped | ServiceState::Starting => Err(ServiceError::NotRunning),
        }
    }

    async fn url(&self) -> Result<String> {
        if matches!(*self.state.borrow(), ServiceState::Stopped) {
            return self.start().await;
        }
        self.ready_url().await
    }

    fn resolve(&self) -> Result<String> {
        let raw = self.kind.base_url();
        let parsed = Url::parse(raw).map_err(|err| ServiceError::InvalidUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ServiceError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(raw.to_string())
    }
}

#[async_trait]
impl LintService for HttpService {
    async fn start(&self) -> Result<String> {
        let mut claimed = false;
        self.state.send_if_modified(|state| {
            if matches!(state, ServiceState::Stopped | ServiceState::Failed(_)) {
                *state = ServiceState::Starting;
                claimed = true;
                true
            } else {
                false
            }
        });
        if !claimed {
            return self.ready_url().await;
        }

        match self.resolve() {
            Ok(url) => {
                info!(%url, "LanguageTool service ready");
                self.state.send_replace(ServiceState::Ready(url.clone()));
                Ok(url)
            }
            Err(err) => {
                self.state.send_replace(ServiceState::Failed(err.to_string()));
                Err(err)
            }
        }
    }

    async fn stop(&self) -> Result<()> {
        self.state.send_replace(ServiceState::Stopped);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let url = format!("{}/v2/languages", self.url().await?);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ServiceError::Status {
                url,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }

    async fn invoke(&self, request: &CheckRequest) -> Result<LintResponse> {
        let url = format!("{}/v2/check", self.url().await?);
        debug!(%url, fields = request.fields().len(), "posting check request");
        let response = self
            .client
            .post(&url)
            .form(request.fields())
            .send()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ServiceError::Transport {
                url: url.clone(),
                source,
            })?;
        if !status.is_success() {
            return Err(ServiceError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|err| ServiceError::MalformedResponse {
            url,
            reason: err.to_string(),
        })
    }

    fn state(&self) -> ServiceState {
        self.state.borrow().clone()
    }

    fn kind(&self) -> &ServiceKind {
        &self.kind
    }
}
