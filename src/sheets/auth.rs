use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{checked, SheetError};

const RETRIES: u32 = 2;
const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Запас до истечения токена
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Ключ сервисного аккаунта Google (JSON из консоли).
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Выдаёт bearer-токен, кэширует его до истечения.
#[derive(Clone)]
pub struct TokenProvider {
    key: ServiceAccountKey,
    client: ClientWithMiddleware,
    cached: Arc<RwLock<Option<(String, SystemTime)>>>,
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, timeout: Duration) -> Result<Self, SheetError> {
        // обмен JWT на токен идемпотентен, его можно повторять
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(RETRIES);
        let client = ClientBuilder::new(Client::builder().timeout(timeout).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            key,
            client,
            cached: Arc::new(RwLock::new(None)),
        })
    }

    pub async fn token(&self) -> Result<String, SheetError> {
        {
            let cached = self.cached.read().await;
            if let Some((token, expires_at)) = cached.as_ref() {
                if expires_at
                    .duration_since(SystemTime::now())
                    .unwrap_or_default()
                    > EXPIRY_MARGIN
                {
                    return Ok(token.clone());
                }
            }
        }

        let assertion = self.signed_assertion()?;
        log::debug!("Requesting Google access token for {}", self.key.client_email);

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let token: TokenResponse = checked(response, "token exchange").await?.json().await?;
        let expires_at = SystemTime::now() + Duration::from_secs(token.expires_in);

        let mut cached = self.cached.write().await;
        *cached = Some((token.access_token.clone(), expires_at));
        Ok(token.access_token)
    }

    fn signed_assertion(&self) -> Result<String, SheetError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SheetError::Auth(e.to_string()))?
            .as_secs();

        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPES,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| SheetError::Auth(format!("invalid private key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| SheetError::Auth(format!("cannot sign assertion: {}", e)))
    }
}
