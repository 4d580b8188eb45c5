//! OAuth sign-in with Google and GitHub.
//!
//! Authorization-code flow:
//!
//! 1. `/auth/oauth/{provider}` stores a random `state` in the session and
//!    redirects to the provider's consent page.
//! 2. The provider redirects back to `/auth/oauth/{provider}/callback` with
//!    `code` and `state`.
//! 3. The code is exchanged for an access token, the profile is fetched,
//!    and the resulting [`ExternalIdentity`] is handed to
//!    [`AuthService::find_or_register_oauth`](crate::services::auth::AuthService::find_or_register_oauth).

use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use reqwest::header::{ACCEPT, USER_AGENT};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gremco_core::{Email, EmailError};

use crate::config::{OAuthClientConfig, StorefrontConfig};
use crate::services::auth::ExternalIdentity;

const STATE_LENGTH: usize = 32;
const GITHUB_API_USER_AGENT: &str = concat!("gremco-storefront/", env!("CARGO_PKG_VERSION"));

/// Supported OAuth providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Github,
}

impl Provider {
    /// Every provider, in the order buttons are shown.
    pub const ALL: [Self; 2] = [Self::Google, Self::Github];

    /// Path segment used in `/auth/oauth/{provider}`.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Github => "GitHub",
        }
    }

    const fn authorize_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Github => "https://github.com/login/oauth/authorize",
        }
    }

    const fn token_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://oauth2.googleapis.com/token",
            Self::Github => "https://github.com/login/oauth/access_token",
        }
    }

    const fn scope(self) -> &'static str {
        match self {
            Self::Google => "openid email profile",
            Self::Github => "read:user user:email",
        }
    }
}

impl FromStr for Provider {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.slug() == s)
            .ok_or_else(|| OAuthError::UnknownProvider(s.to_owned()))
    }
}

/// Errors that can occur during OAuth sign-in.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// Path segment does not name a provider.
    #[error("unknown OAuth provider: {0}")]
    UnknownProvider(String),

    /// Provider exists but has no credentials configured.
    #[error("{} sign-in is not configured", .0.display_name())]
    ProviderDisabled(Provider),

    /// Transport error talking to the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider refused the authorization code.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// The profile request failed or returned an unexpected shape.
    #[error("profile lookup failed: {0}")]
    Profile(String),

    /// The account exposes no usable email address.
    #[error("provider returned no verified email")]
    MissingEmail,

    /// The provider returned an email we cannot parse.
    #[error("provider returned an invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// Authorization request waiting for its callback, kept in the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub provider: Provider,
    pub state: String,
}

impl PendingAuthorization {
    /// Start a new authorization with a fresh random state.
    #[must_use]
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            state: generate_random_string(STATE_LENGTH),
        }
    }

    /// Whether a callback belongs to this authorization.
    #[must_use]
    pub fn matches(&self, provider: Provider, state: &str) -> bool {
        self.provider == provider && self.state == state
    }
}

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Pick the address GitHub considers primary, if it is verified.
fn primary_verified_email(emails: &[GithubEmail]) -> Option<&str> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .map(|e| e.email.as_str())
}

/// Client for the configured OAuth providers.
#[derive(Clone)]
pub struct OAuthClient {
    inner: Arc<OAuthClientInner>,
}

struct OAuthClientInner {
    http: reqwest::Client,
    base_url: String,
    google: Option<OAuthClientConfig>,
    github: Option<OAuthClientConfig>,
}

impl OAuthClient {
    /// Create a client from configuration.
    #[must_use]
    pub fn new(config: &StorefrontConfig) -> Self {
        Self {
            inner: Arc::new(OAuthClientInner {
                http: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                google: config.oauth.google.clone(),
                github: config.oauth.github.clone(),
            }),
        }
    }

    /// Providers with credentials configured.
    #[must_use]
    pub fn enabled_providers(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.credentials(*p).is_ok())
            .collect()
    }

    fn credentials(&self, provider: Provider) -> Result<&OAuthClientConfig, OAuthError> {
        match provider {
            Provider::Google => self.inner.google.as_ref(),
            Provider::Github => self.inner.github.as_ref(),
        }
        .ok_or(OAuthError::ProviderDisabled(provider))
    }

    /// Callback URL registered with the provider.
    #[must_use]
    pub fn redirect_uri(&self, provider: Provider) -> String {
        format!("{}/auth/oauth/{}/callback", self.inner.base_url, provider.slug())
    }

    /// Build the provider consent URL.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::ProviderDisabled` if the provider is not configured.
    pub fn authorization_url(&self, pending: &PendingAuthorization) -> Result<String, OAuthError> {
        let provider = pending.provider;
        let credentials = self.credentials(provider)?;
        Ok(format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            provider.authorize_endpoint(),
            urlencoding::encode(&credentials.client_id),
            urlencoding::encode(&self.redirect_uri(provider)),
            urlencoding::encode(provider.scope()),
            urlencoding::encode(&pending.state),
        ))
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::TokenExchange` if the provider rejects the code.
    pub async fn exchange_code(&self, provider: Provider, code: &str) -> Result<String, OAuthError> {
        let credentials = self.credentials(provider)?;
        let redirect_uri = self.redirect_uri(provider);

        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
        ];

        let response = self
            .inner
            .http
            .post(provider.token_endpoint())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenExchange(text));
        }

        let token: TokenResponse = response.json().await?;
        match (token.access_token, token.error) {
            (Some(access_token), None) => Ok(access_token),
            (_, error) => Err(OAuthError::TokenExchange(
                token
                    .error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token in response".to_owned()),
            )),
        }
    }

    /// Fetch the signed-in account's email and display name.
    ///
    /// # Errors
    ///
    /// Returns `OAuthError::MissingEmail` if no verified email is available.
    /// Returns `OAuthError::Profile` if the profile request fails.
    pub async fn fetch_identity(
        &self,
        provider: Provider,
        access_token: &str,
    ) -> Result<ExternalIdentity, OAuthError> {
        match provider {
            Provider::Google => self.google_identity(access_token).await,
            Provider::Github => self.github_identity(access_token).await,
        }
    }

    async fn google_identity(&self, access_token: &str) -> Result<ExternalIdentity, OAuthError> {
        let response = self
            .inner
            .http
            .get("https://openidconnect.googleapis.com/v1/userinfo")
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OAuthError::Profile(format!(
                "Google userinfo returned {}",
                response.status()
            )));
        }

        let info: GoogleUserInfo = response.json().await?;
        let email = info
            .email
            .filter(|_| info.email_verified)
            .ok_or(OAuthError::MissingEmail)?;
        Ok(ExternalIdentity {
            email: Email::parse(&email)?,
            name: info.name.unwrap_or_default(),
        })
    }

    async fn github_identity(&self, access_token: &str) -> Result<ExternalIdentity, OAuthError> {
        let user: GithubUser = self.github_get("https://api.github.com/user", access_token).await?;

        let email = match user.email {
            Some(email) => email,
            None => {
                let emails: Vec<GithubEmail> = self
                    .github_get("https://api.github.com/user/emails", access_token)
                    .await?;
                primary_verified_email(&emails)
                    .ok_or(OAuthError::MissingEmail)?
                    .to_owned()
            }
        };

        Ok(ExternalIdentity {
            email: Email::parse(&email)?,
            name: user.name.unwrap_or(user.login),
        })
    }

    async fn github_get<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> Result<T, OAuthError> {
        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, GITHUB_API_USER_AGENT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OAuthError::Profile(format!(
                "GitHub {url} returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn client(google: bool) -> OAuthClient {
        let mut config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("https://tienda.example.org".to_owned()),
            "STOREFRONT_SESSION_SECRET" => Some("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%".to_owned()),
            _ => None,
        })
        .unwrap();
        if google {
            config.oauth.google = Some(OAuthClientConfig {
                client_id: "abc.apps.googleusercontent.com".to_owned(),
                client_secret: SecretString::from("GOCSPX-k3yM4t3r14l"),
            });
        }
        OAuthClient::new(&config)
    }

    #[test]
    fn test_provider_slugs_round_trip() {
        for provider in Provider::ALL {
            assert_eq!(provider.slug().parse::<Provider>().unwrap(), provider);
        }
        assert!(matches!(
            "facebook".parse::<Provider>(),
            Err(OAuthError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_only_configured_providers_are_enabled() {
        assert!(client(false).enabled_providers().is_empty());
        assert_eq!(client(true).enabled_providers(), vec![Provider::Google]);
    }

    #[test]
    fn test_authorization_url_carries_state_and_redirect() {
        let pending = PendingAuthorization::new(Provider::Google);
        let url = client(true).authorization_url(&pending).unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains(&format!("state={}", pending.state)));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Ftienda.example.org%2Fauth%2Foauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[test]
    fn test_disabled_provider_has_no_authorization_url() {
        let pending = PendingAuthorization::new(Provider::Github);
        assert!(matches!(
            client(true).authorization_url(&pending),
            Err(OAuthError::ProviderDisabled(Provider::Github))
        ));
    }

    #[test]
    fn test_pending_state_is_random_and_provider_bound() {
        let a = PendingAuthorization::new(Provider::Github);
        let b = PendingAuthorization::new(Provider::Github);
        assert_eq!(a.state.len(), STATE_LENGTH);
        assert_ne!(a.state, b.state);
        assert!(a.matches(Provider::Github, &a.state));
        assert!(!a.matches(Provider::Google, &a.state));
        assert!(!a.matches(Provider::Github, &b.state));
    }

    #[test]
    fn test_github_email_fallback_picks_primary_verified() {
        let emails = vec![
            GithubEmail {
                email: "old@example.com".to_owned(),
                primary: false,
                verified: true,
            },
            GithubEmail {
                email: "main@example.com".to_owned(),
                primary: true,
                verified: true,
            },
        ];
        assert_eq!(primary_verified_email(&emails), Some("main@example.com"));

        let unverified = vec![GithubEmail {
            email: "main@example.com".to_owned(),
            primary: true,
            verified: false,
        }];
        assert_eq!(primary_verified_email(&unverified), None);
    }
}
