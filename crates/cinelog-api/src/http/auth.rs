use crate::error::ApiResult;
use crate::http::api::{AuthEnvelope, LoginBody, RegisterBody, UserEnvelope};
use crate::http::client::HttpCatalogApi;
use cinelog_models::User;
use reqwest::Method;
use tracing::info;

/// Token plus the user it belongs to, as returned by login and register
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

impl From<AuthEnvelope> for AuthSession {
    fn from(envelope: AuthEnvelope) -> Self {
        Self {
            token: envelope.token,
            user: envelope.user,
        }
    }
}

impl HttpCatalogApi {
    /// Exchange credentials for a session token and start using it
    pub async fn login(&mut self, email: &str, password: &str) -> ApiResult<AuthSession> {
        let request = self
            .request(Method::POST, "auth/login")
            .json(&LoginBody { email, password });
        let envelope: AuthEnvelope = self.send(request).await?;
        let session = AuthSession::from(envelope);
        self.set_token(Some(session.token.clone()));
        info!("Logged in as {}", session.user.username);
        Ok(session)
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ApiResult<AuthSession> {
        let request = self
            .request(Method::POST, "auth/register")
            .json(&RegisterBody { username, email, password });
        let envelope: AuthEnvelope = self.send(request).await?;
        let session = AuthSession::from(envelope);
        self.set_token(Some(session.token.clone()));
        info!("Registered and logged in as {}", session.user.username);
        Ok(session)
    }

    /// Resolve the user behind the current token
    pub async fn current_user(&self) -> ApiResult<User> {
        let envelope: UserEnvelope = self.send(self.request(Method::GET, "auth/me")).await?;
        Ok(envelope.user)
    }
}
