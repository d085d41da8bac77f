//! Application wiring: one API client, one auth store, one document store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clausewise_client::{
    ApiClient, AuthStore, ClientConfig, ClientResult, DocumentStore, FileSessionStorage,
    LoginRedirect, Notifier, SessionToken,
};

use super::args::GlobalArgs;

/// Tells the user to log in again after the server rejected the session.
#[derive(Debug)]
pub struct CliRedirect {
    enabled: bool,
}

impl LoginRedirect for CliRedirect {
    fn redirect_to_login(&self) {
        if self.enabled {
            eprintln!("Session is no longer valid. Run `clausewise login` to sign in again.");
        }
    }
}

/// Prints notifications to stderr so stdout stays machine-readable.
#[derive(Debug)]
pub struct ConsoleNotifier {
    quiet: bool,
    error_shown: AtomicBool,
}

impl ConsoleNotifier {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            error_shown: AtomicBool::new(false),
        }
    }

    /// Whether an error has already been shown to the user.
    pub fn error_shown(&self) -> bool {
        self.error_shown.load(Ordering::SeqCst)
    }
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    fn error(&self, message: &str) {
        self.error_shown.store(true, Ordering::SeqCst);
        eprintln!("error: {}", message);
    }
}

pub struct App {
    pub api: ApiClient,
    pub auth: AuthStore,
    pub documents: DocumentStore,
    pub notifier: Arc<ConsoleNotifier>,
    pub json: bool,
}

impl App {
    /// Build the stores. `redirect_hint` controls whether a 401 prints the
    /// "log in again" hint; it is off for the commands that log in.
    pub fn build(global: &GlobalArgs, redirect_hint: bool) -> ClientResult<Self> {
        let config = config_from(global);

        let storage = match &config.session_file {
            Some(path) => FileSessionStorage::at(path),
            None => FileSessionStorage::new()?,
        };

        let api = ApiClient::new(
            &config,
            SessionToken::new(),
            Arc::new(storage),
            Arc::new(CliRedirect {
                enabled: redirect_hint,
            }),
        )?;

        let notifier = Arc::new(ConsoleNotifier::new(global.json));
        let auth = AuthStore::new(api.clone(), notifier.clone());
        let documents = DocumentStore::new(api.clone(), notifier.clone());

        Ok(Self {
            api,
            auth,
            documents,
            notifier,
            json: global.json,
        })
    }
}

fn config_from(global: &GlobalArgs) -> ClientConfig {
    let mut config = ClientConfig::from_env();
    if let Some(url) = &global.api_url {
        config = config.with_url(url.clone());
    }
    if let Some(timeout) = global.timeout {
        config = config.with_timeout_secs(timeout);
    }
    if let Some(path) = &global.session_file {
        config = config.with_session_file(path.clone());
    }
    config
}
