//! User-facing output channel.
//!
//! Components report through an injected [`OutputChannel`] instead of a global logger. Every
//! line is also emitted as a `tracing` event so stderr logs stay complete.

use crate::server::LspClient;
use tower_lsp::async_trait;
use tower_lsp::lsp_types::MessageType;

#[async_trait]
pub trait OutputChannel: Send + Sync {
    /// Append a line to the log.
    async fn append_line(&self, line: &str);

    /// Surface a message to the user.
    async fn show(&self, kind: MessageType, message: &str);
}

/// Output channel backed by the LSP client's `window/logMessage` and `window/showMessage`.
pub struct ClientOutput<C> {
    client: C,
}

impl<C: LspClient> ClientOutput<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: LspClient> OutputChannel for ClientOutput<C> {
    async fn append_line(&self, line: &str) {
        tracing::info!("{line}");
        self.client
            .log_message(MessageType::INFO, line.to_string())
            .await;
    }

    async fn show(&self, kind: MessageType, message: &str) {
        if kind == MessageType::ERROR {
            tracing::error!("{message}");
        } else {
            tracing::warn!("{message}");
        }
        self.client.log_message(kind, message.to_string()).await;
        self.client.show_message(kind, message.to_string()).await;
    }
}
