// SPDX-License-Identifier: MIT

//! Google sign-in: ID-token verification and best-effort sign-out.
//!
//! The embedding UI runs the popup flow and hands us the resulting ID
//! token; this service proves it, extracts the account identity, and on
//! sign-out revokes the last verified token at Google. Signing keys are
//! fetched through OIDC discovery and cached per their Cache-Control TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::AuthUser;

const DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";
const FALLBACK_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_KEY_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;

#[derive(Clone)]
enum VerifierMode {
    Google,
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

struct KeySet {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier and sign-out endpoint for Google accounts.
pub struct GoogleIdentity {
    http_client: reqwest::Client,
    /// Expected ID-token audience (the app's OAuth client id)
    client_id: String,
    mode: VerifierMode,
    keys: RwLock<Option<KeySet>>,
    refresh_lock: Mutex<()>,
    /// Last successfully verified token, revoked on sign-out
    current_token: RwLock<Option<String>>,
}

impl GoogleIdentity {
    /// Create a production verifier backed by Google's published JWKS.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building identity HTTP client")?;

        tracing::info!(client_id = %config.google_client_id, "Initialized Google identity verifier");

        Ok(Self {
            http_client,
            client_id: config.google_client_id.clone(),
            mode: VerifierMode::Google,
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            current_token: RwLock::new(None),
        })
    }

    /// Create a verifier with a static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static kid must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed building identity HTTP client")?;

        Ok(Self {
            http_client,
            client_id: config.google_client_id.clone(),
            mode: VerifierMode::StaticKey {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
            keys: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            current_token: RwLock::new(None),
        })
    }

    /// Verify a Google ID token and extract the signed-in identity.
    ///
    /// The verified token is retained so `sign_out` can revoke it later.
    pub async fn verify_id_token(&self, token: &str) -> Result<AuthUser> {
        let header = decode_header(token)
            .map_err(|e| AppError::Identity(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Identity(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Identity("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&["https://accounts.google.com", "accounts.google.com"]);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let token_data = decode::<GoogleIdTokenClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| AppError::Identity(format!("JWT validation failed: {e}")))?;

        let claims = token_data.claims;
        validate_iat(claims.iat)?;

        let email = claims
            .email
            .ok_or_else(|| AppError::Identity("missing email claim".to_string()))?;

        match claims.email_verified {
            Some(true) => {}
            Some(false) => {
                return Err(AppError::Identity("email_verified claim is false".to_string()));
            }
            None => {
                return Err(AppError::Identity("email_verified claim is missing".to_string()));
            }
        }

        tracing::debug!(
            subject = %claims.sub,
            email = %email,
            issuer = %claims.iss,
            audience = %claims.aud,
            exp = claims.exp,
            "Google ID token verified"
        );

        *self.current_token.write().await = Some(token.to_string());

        Ok(AuthUser {
            subject: claims.sub,
            email,
            display_name: claims.name.unwrap_or_default(),
        })
    }

    /// Invalidate the remote session, best-effort.
    ///
    /// Revocation failures are logged and swallowed; sign-out must never
    /// block local cleanup.
    pub async fn sign_out(&self) {
        let token = self.current_token.write().await.take();

        let Some(token) = token else {
            return;
        };

        let result = self
            .http_client
            .post(REVOKE_URL)
            .form(&[("token", token.as_str())])
            .send()
            .await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("Google session revoked");
            }
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "Google revocation returned non-success");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Google revocation request failed");
            }
        }
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        if let VerifierMode::StaticKey {
            kid: static_kid,
            decoding_key,
        } = &self.mode
        {
            if kid == static_kid {
                return Ok(decoding_key.clone());
            }
            return Err(AppError::Identity(format!(
                "unknown JWT kid for static verifier: {kid}"
            )));
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // The kid may belong to a freshly rotated key: one forced refresh
        // after the TTL-respecting one.
        for force_refresh in [false, true] {
            self.refresh_keys(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(AppError::Identity(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let keys = self.keys.read().await;
        let now = Instant::now();
        keys.as_ref()
            .filter(|set| set.expires_at > now)
            .and_then(|set| set.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_keys(&self, force_refresh: bool) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let keys = self.keys.read().await;
            if keys
                .as_ref()
                .is_some_and(|set| set.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        let jwks_uri = self.resolve_jwks_uri().await;
        tracing::debug!(jwks_uri = %jwks_uri, "Refreshing Google JWKS cache");

        let response = self
            .http_client
            .get(&jwks_uri)
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Identity(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_KEY_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("invalid JWKS JSON: {e}")))?;

        let mut keys_by_kid: HashMap<String, Arc<DecodingKey>> = HashMap::new();

        for jwk in jwks.keys {
            if !jwk.usable_for_rs256() {
                continue;
            }

            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys_by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                }
            }
        }

        if keys_by_kid.is_empty() {
            return Err(AppError::Identity(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.keys.write().await = Some(KeySet {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Google JWKS cache refreshed");
        Ok(())
    }

    /// Resolve the JWKS URI through OIDC discovery, falling back to the
    /// well-known URL when discovery is unavailable.
    async fn resolve_jwks_uri(&self) -> String {
        match self.http_client.get(DISCOVERY_URL).send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<OpenIdConfig>().await {
                Ok(discovery) => discovery.jwks_uri,
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid OIDC discovery document; using fallback JWKS URI");
                    FALLBACK_JWKS_URL.to_string()
                }
            },
            Ok(resp) => {
                tracing::warn!(
                    status = %resp.status(),
                    "OIDC discovery returned non-success status; using fallback JWKS URI"
                );
                FALLBACK_JWKS_URL.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "OIDC discovery request failed; using fallback JWKS URI");
                FALLBACK_JWKS_URL.to_string()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenIdConfig {
    jwks_uri: String,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

impl Jwk {
    fn usable_for_rs256(&self) -> bool {
        if self.kty != "RSA" || self.kid.trim().is_empty() {
            return false;
        }
        if self.alg.as_deref().is_some_and(|alg| alg != "RS256") {
            return false;
        }
        if self.use_.as_deref().is_some_and(|use_| use_ != "sig") {
            return false;
        }
        true
    }
}

/// Claims of a Google end-user ID token.
#[derive(Debug, Deserialize)]
struct GoogleIdTokenClaims {
    iss: String,
    aud: String,
    sub: String,
    exp: usize,
    iat: Option<usize>,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
}

fn validate_iat(iat: Option<usize>) -> Result<()> {
    let now = now_unix_secs();

    let Some(iat) = iat else {
        return Err(AppError::Identity("missing iat claim".to_string()));
    };

    if iat as u64 > now + CLOCK_SKEW_SECS {
        return Err(AppError::Identity("iat claim is in the future".to_string()));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    let Some(max_age) = headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
    else {
        return fallback;
    };

    Duration::from_secs(max_age)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    for directive in value.split(',') {
        let directive = directive.trim();

        if let Some(raw) = directive.strip_prefix("max-age=") {
            let raw = raw.trim_matches('"');
            if let Ok(seconds) = raw.parse::<u64>() {
                return Some(seconds);
            }
        }
    }

    None
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
