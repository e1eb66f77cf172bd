//! Language Server Protocol (LSP) implementation for LanguageTool linting
//!
//!     This crate checks the prose of markdown, MDX, HTML and plain text documents against a
//!     LanguageTool service and reports the findings as diagnostics, with quick fixes, ignore
//!     commands and typographic smart formatting.
//!
//! Feature Set
//!
//!     1. Diagnostics (textDocument/publishDiagnostics):
//!         - Linted on open, on save and (debounced) on change, each switchable
//!         - Ignored words and in-document ignore directives downgrade a finding to a hint
//!         - Severity fixed by configuration, or derived from the match category
//!
//!     2. Code Actions (textDocument/codeAction):
//!         - Replacement suggestions as quick fixes
//!         - Ignore or un-ignore a word, globally or per workspace
//!         - Disable a rule or a category, globally or per workspace
//!
//!     3. Commands (workspace/executeCommand):
//!         - The actions above, plus an explicit "lint document"
//!         - Setting changes are sent back to the client through the
//!           `languagetoolLinter/updateConfiguration` notification
//!
//!     4. Smart Formatting (textDocument/formatting, onTypeFormatting, willSaveWaitUntil):
//!         - Curly quotes, dashes and ellipses, prose only
//!
//! Architecture
//!
//!     LSP Layer (tower-lsp):
//!         - JSON-RPC, capability negotiation, request routing
//!
//!     Server Layer ([./server.rs]):
//!         - Implements LanguageServer, owns documents, settings and stored diagnostics
//!         - Thin: every handler defers to the feature layer or the scheduler
//!
//!     Scheduler ([./scheduler.rs]):
//!         - One debounce timer and at most one running pass per document
//!         - Stale results are discarded, never published
//!
//!     Service Layer ([./service]):
//!         - LintService trait, one HTTP backend for external and public endpoints
//!
//!     Feature Layer ([./features]):
//!         - Stateless transformations over text, annotations and service matches
//!         - All logic and dense unit tests
//!
//!     Annotated text construction lives in the lt-annotate crate, settings in lt-config.
//!
//! Usage
//!
//!     Binary:
//!         $ lt-lsp [--config lt.toml]
//!         Starts the language server on stdin/stdout for editor integration. Logs go to stderr,
//!         filtered by `LT_LSP_LOG` (defaults to `info`).

pub mod error;
pub mod features;
pub mod output;
pub mod scheduler;
pub mod server;
pub mod service;

pub use error::ServiceError;
pub use server::{LspClient, LtLanguageServer, ServerOptions};
