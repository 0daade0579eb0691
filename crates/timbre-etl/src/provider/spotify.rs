//! Spotify Web API feature provider.
//!
//! Fetches audio features, track popularity and the primary artist's
//! popularity and genres for one track identifier. Authentication uses
//! the client-credentials flow with credentials taken from
//! [`ProviderConfig`]; the access token is cached until shortly before it
//! expires.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backon::Retryable;
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use timbre_core::AudioFeatures;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::resilience::{retry_policy, RateLimiter};
use crate::provider::{FeatureProvider, FeatureRecord};

const SOURCE_NAME: &str = "Spotify";

/// Refresh the token this long before it actually expires.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    danceability: f64,
    energy: f64,
    key: f64,
    loudness: f64,
    mode: f64,
    speechiness: f64,
    acousticness: f64,
    instrumentalness: f64,
    liveness: f64,
    valence: f64,
    tempo: f64,
}

impl AudioFeaturesResponse {
    fn into_features(self) -> AudioFeatures {
        AudioFeatures::from_values([
            self.danceability,
            self.energy,
            self.key,
            self.loudness,
            self.mode,
            self.speechiness,
            self.acousticness,
            self.instrumentalness,
            self.liveness,
            self.valence,
            self.tempo,
        ])
    }
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    name: String,
    popularity: i64,
    #[serde(default)]
    artists: Vec<ArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    popularity: i64,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Spotify Web API client implementing [`FeatureProvider`].
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    api_base: String,
    accounts_base: String,
    token: Arc<Mutex<Option<AccessToken>>>,
    rate_limiter: RateLimiter,
    max_retries: usize,
}

impl fmt::Debug for SpotifyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyClient")
            .field("client_id", &self.client_id)
            .field("api_base", &self.api_base)
            .field("accounts_base", &self.accounts_base)
            .field("rate_limiter", &self.rate_limiter)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl SpotifyClient {
    /// Create a client from provider configuration.
    ///
    /// # Errors
    /// Returns [`ProviderError::MissingCredentials`] if the client id or
    /// secret is not configured, or a request error if the HTTP client
    /// cannot be built.
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let (client_id, client_secret) = config
            .credentials()
            .ok_or(ProviderError::MissingCredentials)?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("timbre/0.1.0 (https://github.com/oxur/timbre)")
            .build()?;

        Ok(Self {
            http,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            accounts_base: config.accounts_base.trim_end_matches('/').to_string(),
            token: Arc::new(Mutex::new(None)),
            rate_limiter: RateLimiter::new(config.requests_per_second),
            max_retries: config.max_retries,
        })
    }

    /// Return a valid access token, requesting a new one if needed.
    async fn access_token(&self) -> ProviderResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        log::debug!("Requesting {} access token", SOURCE_NAME);
        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_base))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| unavailable(&e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(&format!("token request rejected with {status}")));
        }

        let token: TokenResponse = response.json().await.map_err(|e| ProviderError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let value = token.access_token.clone();
        *cached = Some(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    /// GET an API resource, retrying transient failures.
    ///
    /// A `null` body (the API's answer for ids it has no features for)
    /// yields `None`.
    async fn get_json<T>(&self, path: &str, id: &str) -> ProviderResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        (|| self.get_json_once::<T>(path, id))
            .retry(retry_policy(self.max_retries))
            .when(ProviderError::is_transient)
            .notify(|err: &ProviderError, after: Duration| {
                log::warn!(
                    "{} request {} failed ({}); retrying in {:?}",
                    SOURCE_NAME,
                    path,
                    err,
                    after
                );
            })
            .await
    }

    async fn get_json_once<T>(&self, path: &str, id: &str) -> ProviderResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.rate_limiter.acquire().await;
        let token = self.access_token().await?;
        let mut response = self.send_get(path, &token).await?;

        // The cached token can be revoked before it expires; replace it once.
        if response.status() == StatusCode::UNAUTHORIZED {
            log::debug!("{} rejected the access token; requesting a new one", SOURCE_NAME);
            self.discard_token(&token).await;
            let token = self.access_token().await?;
            self.rate_limiter.acquire().await;
            response = self.send_get(path, &token).await?;
        }

        check_status(response.status(), id)?;

        let body = response.text().await?;
        serde_json::from_str::<Option<T>>(&body).map_err(|e| ProviderError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: format!("{path}: {e}"),
        })
    }

    async fn send_get(&self, path: &str, token: &str) -> ProviderResult<Response> {
        self.http
            .get(format!("{}/{}", self.api_base, path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    unavailable(&e.to_string())
                } else {
                    ProviderError::Request(e)
                }
            })
    }

    /// Drop the cached token unless another request already replaced it.
    async fn discard_token(&self, rejected: &str) {
        let mut cached = self.token.lock().await;
        if cached.as_ref().is_some_and(|t| t.value == rejected) {
            *cached = None;
        }
    }
}

#[async_trait]
impl FeatureProvider for SpotifyClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, id: &str) -> ProviderResult<FeatureRecord> {
        let features: AudioFeaturesResponse = self
            .get_json(&format!("audio-features/{id}"), id)
            .await?
            .ok_or_else(|| ProviderError::UnknownIdentifier { id: id.to_string() })?;

        let track: TrackResponse = self
            .get_json(&format!("tracks/{id}"), id)
            .await?
            .ok_or_else(|| ProviderError::UnknownIdentifier { id: id.to_string() })?;

        let primary = track
            .artists
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Incomplete {
                id: id.to_string(),
                what: "artist".to_string(),
            })?;

        let artist: ArtistResponse = self
            .get_json(&format!("artists/{}", primary.id), id)
            .await?
            .ok_or_else(|| ProviderError::Incomplete {
                id: id.to_string(),
                what: "artist data".to_string(),
            })?;

        Ok(FeatureRecord {
            id: id.to_string(),
            artist_name: primary.name,
            track_name: track.name,
            features: features.into_features(),
            artist_pop: artist.popularity,
            track_pop: track.popularity,
            genres: artist.genres,
            fetched_at: Utc::now(),
        })
    }
}

fn unavailable(message: &str) -> ProviderError {
    ProviderError::Unavailable {
        source_name: SOURCE_NAME.to_string(),
        message: message.to_string(),
    }
}

/// Map a non-success response status onto the provider error taxonomy.
fn check_status(status: StatusCode, id: &str) -> ProviderResult<()> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => Err(ProviderError::UnknownIdentifier {
            id: id.to_string(),
        }),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(unavailable(&format!("{status} while fetching {id}")))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(ProviderError::RateLimited {
            source_name: SOURCE_NAME.to_string(),
        }),
        _ => Err(ProviderError::Http {
            source_name: SOURCE_NAME.to_string(),
            message: format!("{status} while fetching {id}"),
        }),
    }
}

/// Extract a track identifier from a bare id, a `spotify:track:` URI or an
/// `open.spotify.com/track/` link.
///
/// Returns `None` for input that does not contain a plausible id.
pub fn parse_track_id(input: &str) -> Option<&str> {
    let input = input.trim();
    let id = if let Some(rest) = input.strip_prefix("spotify:track:") {
        rest
    } else if let Some(pos) = input.find("open.spotify.com/track/") {
        let rest = &input[pos + "open.spotify.com/track/".len()..];
        rest.split(['?', '/', '#']).next().unwrap_or_default()
    } else {
        input
    };

    if !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(id)
    } else {
        None
    }
}
