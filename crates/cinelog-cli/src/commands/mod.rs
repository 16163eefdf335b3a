pub mod config;
pub mod movies;
pub mod prompts;
pub mod reviews;
pub mod session;
pub mod watchlist;

use cinelog_api::HttpCatalogApi;
use cinelog_config::{Config, CredentialStore, PathManager};
use cinelog_core::{CatalogStore, DispatchError, ErrorSurface, SessionStatus, StoreOptions};
use color_eyre::eyre::{eyre, Report};
use color_eyre::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Paths, configuration and stored credentials shared by every command
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
    pub credentials: CredentialStore,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let paths = if std::env::var("CINELOG_BASE_PATH").is_ok() {
            PathManager::from_docker_env()
        } else {
            PathManager::new().map_err(|e| eyre!("{}", e))?
        };
        Self::load_from(paths)
    }

    pub fn load_from(paths: PathManager) -> Result<Self> {
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config
            .validate()
            .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials
            .load()
            .map_err(|e| eyre!("Failed to read credentials: {}", e))?;

        Ok(Self { paths, config, credentials })
    }

    /// HTTP client carrying the stored session token, if any
    pub fn api(&self) -> HttpCatalogApi {
        let api = HttpCatalogApi::new(&self.config.api);
        match self.credentials.get_session_token() {
            Some(token) => api.with_token(token.clone()),
            None => api,
        }
    }

    pub fn store(&self) -> CatalogStore<HttpCatalogApi> {
        CatalogStore::with_options(Arc::new(self.api()), StoreOptions::from(&self.config.catalog))
    }

    /// A store whose session is bound to the logged-in user
    ///
    /// Fails early when no token is stored so commands that need an account
    /// do not issue requests that can only come back unauthorized.
    pub async fn authenticated_store(&self) -> Result<CatalogStore<HttpCatalogApi>> {
        if self.credentials.get_session_token().is_none() {
            return Err(eyre!("Not logged in. Run 'cinelog login' first"));
        }
        let store = self.store();
        match store.api().current_user().await {
            Ok(user) => {
                debug!("Session belongs to {}", user.username);
                store.set_session_user(Some(user));
                Ok(store)
            }
            Err(e) if e.is_unauthorized() => {
                self.forget_session();
                Err(eyre!("Session expired. Run 'cinelog login' again"))
            }
            Err(e) => Err(eyre!("Failed to resolve the current user: {}", e)),
        }
    }

    /// Turn a dispatch failure into a report, using the snapshot's surfaced error
    pub fn dispatch_error(&self, store: &CatalogStore<HttpCatalogApi>, error: DispatchError) -> Report {
        let snapshot = store.get_snapshot();
        if snapshot.session.status == SessionStatus::LoginRequired {
            self.forget_session();
        }
        // Busy never becomes the surfaced error, so last_error may be an older failure
        if error.is_busy() {
            return eyre!("{}, try again once it finishes", error);
        }
        match &snapshot.last_error {
            Some(surfaced) if surfaced.surface == ErrorSurface::LoginPrompt => {
                eyre!("Session expired. Run 'cinelog login' again")
            }
            Some(surfaced) if surfaced.surface == ErrorSurface::Placeholder => eyre!("{}", surfaced.message),
            _ => eyre!("{}", error),
        }
    }

    /// Drop the stored token after the server rejected it
    fn forget_session(&self) {
        let mut credentials = CredentialStore::new(self.paths.credentials_file());
        let cleared = credentials.load().and_then(|_| {
            credentials.clear_session();
            credentials.save()
        });
        if let Err(e) = cleared {
            warn!("Failed to clear the stored session: {}", e);
        }
    }
}

/// Render an average rating as five stars
pub fn stars(rating: f32) -> String {
    let filled = rating.round().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// Shorten long text for table cells
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('…');
    shortened
}
