//! LanguageTool language server
//!
//! Usage:
//!   lt-lsp [--config `<file>`]   - Serve LSP on stdin/stdout

use clap::{Arg, Command};
use lt_config::Loader;
use lt_lsp::{LtLanguageServer, ServerOptions};
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let matches = Command::new("lt-lsp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Language server checking prose with LanguageTool")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered between the built-in defaults and the editor settings"),
        )
        .get_matches();

    // stdout carries the protocol, logs go to stderr
    let filter = EnvFilter::try_from_env("LT_LSP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let config_file = matches.get_one::<String>("config").cloned();
    let mut loader = Loader::new();
    if let Some(path) = &config_file {
        loader = loader.with_file(path);
    }
    let settings = match loader.build() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("lt-lsp: cannot load settings: {err}");
            std::process::exit(1);
        }
    };
    tracing::info!("lt-lsp v{} starting", env!("CARGO_PKG_VERSION"));

    let (service, socket) = LspService::new(move |client| {
        let mut options = ServerOptions::new(settings.clone());
        if let Some(path) = &config_file {
            options = options.with_config_file(path);
        }
        LtLanguageServer::with_options(client, options)
    });
    Server::new(stdin(), stdout(), socket).serve(service).await;
}
