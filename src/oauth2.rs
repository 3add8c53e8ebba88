// src/oauth2.rs
//
// OAuth2 credential store for the Gmail API: cached token file, refresh
// exchange, and the loopback authorization-code flow.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use secure_string::SecureString;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};

use crate::cfg::client_secrets::ClientSecrets;
use crate::client_ops::Clock;
use crate::error::ProbeError;

/// Scopes the probe needs: read threads, send mail, create drafts.
pub const GMAIL_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.compose",
];

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// An access/refresh token pair with its expiry and granted scopes.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: SecureString,
    pub refresh_token: Option<SecureString>,
    pub expiry: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
}

impl Credential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS),
            None => false,
        }
    }

    /// Whether every required scope was granted. A token without a recorded
    /// scope list is given the benefit of the doubt.
    pub fn covers(&self, required: &[&str]) -> bool {
        self.scopes.is_empty() || required.iter().all(|s| self.scopes.iter().any(|g| g == s))
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    /// Space-separated granted scopes
    pub scope: Option<String>,
}

impl TokenGrant {
    fn into_credential(
        self,
        now: DateTime<Utc>,
        previous_refresh: Option<SecureString>,
        requested: &[String],
    ) -> Credential {
        let scopes = match self.scope {
            Some(granted) => granted.split_whitespace().map(String::from).collect(),
            None => requested.to_vec(),
        };

        Credential {
            access_token: SecureString::from(self.access_token),
            // refresh responses usually omit the refresh token
            refresh_token: self.refresh_token.map(SecureString::from).or(previous_refresh),
            expiry: self.expires_in.map(|secs| now + Duration::seconds(secs as i64)),
            scopes,
        }
    }
}

/// On-disk token format, compatible with Google's "authorized user" files.
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    refresh_token: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

/// The network half of the OAuth dance.
pub trait Authorizer {
    /// Exchange a refresh token for a fresh access token
    fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProbeError>;

    /// Run the interactive consent flow
    fn authorize(&self, scopes: &[String]) -> Result<TokenGrant, ProbeError>;

    /// Client identity recorded next to the token
    fn client(&self) -> Option<&ClientSecrets> {
        None
    }
}

/// Loads, refreshes and persists the cached OAuth token.
pub struct CredentialStore<A: Authorizer, C: Clock> {
    token_path: PathBuf,
    authorizer: A,
    clock: C,
    scopes: Vec<String>,
}

impl<A: Authorizer, C: Clock> CredentialStore<A, C> {
    pub fn new(token_path: impl Into<PathBuf>, authorizer: A, clock: C) -> Self {
        Self {
            token_path: token_path.into(),
            authorizer,
            clock,
            scopes: GMAIL_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Return a valid credential, refreshing or re-authorizing as needed.
    /// Any new credential is written back to the token file.
    pub fn obtain_credential(&self) -> Result<Credential, ProbeError> {
        let now = self.clock.now();
        let required: Vec<&str> = self.scopes.iter().map(String::as_str).collect();

        if let Some(cached) = self.load()? {
            if !cached.covers(&required) {
                info!("Cached token lacks required scopes; re-authorizing");
            } else if !cached.is_expired(now) {
                debug!("Using cached token from {:?}", self.token_path);
                return Ok(cached);
            } else if let Some(refresh_token) = &cached.refresh_token {
                info!("🔄 Refreshing expired credentials...");
                match self.authorizer.refresh(refresh_token.unsecure()) {
                    Ok(grant) => {
                        let credential = grant.into_credential(now, cached.refresh_token.clone(), &cached.scopes);
                        self.persist(&credential)?;
                        return Ok(credential);
                    }
                    Err(e) => warn!("Token refresh failed ({}); falling back to browser consent", e),
                }
            } else {
                debug!("Cached token expired and has no refresh token");
            }
        }

        info!("🌐 Starting OAuth flow...");
        let grant = self.authorizer.authorize(&self.scopes)?;
        let credential = grant.into_credential(self.clock.now(), None, &self.scopes);
        self.persist(&credential)?;
        Ok(credential)
    }

    /// Read the token file. A missing file is `None`; an unreadable or
    /// corrupt one is an error.
    pub fn load(&self) -> Result<Option<Credential>, ProbeError> {
        if !self.token_path.exists() {
            debug!("No token file at {:?}", self.token_path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.token_path).map_err(|e| {
            ProbeError::Auth(format!("failed to read token file {}: {}", self.token_path.display(), e))
        })?;
        let stored: StoredToken = serde_json::from_str(&content).map_err(|e| {
            ProbeError::Auth(format!("corrupt token file {}: {}", self.token_path.display(), e))
        })?;

        Ok(Some(Credential {
            access_token: SecureString::from(stored.token),
            refresh_token: stored.refresh_token.map(SecureString::from),
            expiry: stored.expiry,
            scopes: stored.scopes,
        }))
    }

    /// Replace the token file atomically. The temp file is created 0600, so
    /// the renamed token file is private too.
    pub fn persist(&self, credential: &Credential) -> Result<(), ProbeError> {
        let client = self.authorizer.client();
        let stored = StoredToken {
            token: credential.access_token.unsecure().to_string(),
            refresh_token: credential.refresh_token.as_ref().map(|t| t.unsecure().to_string()),
            token_uri: client.map(|c| c.token_uri.clone()),
            client_id: client.map(|c| c.client_id.clone()),
            client_secret: client.map(|c| c.client_secret.unsecure().to_string()),
            scopes: credential.scopes.clone(),
            expiry: credential.expiry,
        };

        let content = serde_json::to_string_pretty(&stored)
            .map_err(|e| ProbeError::Auth(format!("failed to serialize token: {}", e)))?;

        let dir = match self.token_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_err = |e: std::io::Error| {
            ProbeError::Auth(format!("failed to write token file {}: {}", self.token_path.display(), e))
        };

        fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.persist(&self.token_path).map_err(|e| write_err(e.error))?;

        debug!("Saved token to {:?}", self.token_path);
        Ok(())
    }
}

/// Talks to Google's OAuth endpoints.
pub struct GoogleAuthorizer {
    secrets: ClientSecrets,
}

impl GoogleAuthorizer {
    pub fn new(secrets: ClientSecrets) -> Self {
        Self { secrets }
    }

    fn exchange(&self, form: &[(&str, &str)]) -> Result<TokenGrant, ProbeError> {
        let response = ureq::post(&self.secrets.token_uri)
            .send_form(form)
            .map_err(|e| ProbeError::Auth(ProbeError::from_http("oauth2.token", e).to_string()))?;

        response
            .into_json()
            .map_err(|e| ProbeError::Auth(format!("failed to parse token response: {}", e)))
    }

    fn consent_url(&self, redirect_uri: &str, scopes: &[String]) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.secrets.auth_uri,
            urlencoding::encode(&self.secrets.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
        )
    }
}

impl Authorizer for GoogleAuthorizer {
    fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProbeError> {
        debug!("Refreshing OAuth2 access token at {}", self.secrets.token_uri);

        self.exchange(&[
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.unsecure()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
    }

    fn authorize(&self, scopes: &[String]) -> Result<TokenGrant, ProbeError> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .map_err(|e| ProbeError::Auth(format!("could not start callback listener: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| ProbeError::Auth(format!("callback listener has no address: {}", e)))?
            .port();
        let redirect_uri = format!("http://localhost:{}/", port);
        let auth_url = self.consent_url(&redirect_uri, scopes);

        println!("Please visit this URL to authorize this application: {}", auth_url);
        if let Err(e) = open::that(&auth_url) {
            warn!("Failed to open browser: {}. Please open the URL manually.", e);
        }

        let code = wait_for_callback(listener)?;

        debug!("Exchanging authorization code for tokens");
        self.exchange(&[
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.unsecure()),
            ("code", code.as_str()),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri.as_str()),
        ])
    }

    fn client(&self) -> Option<&ClientSecrets> {
        Some(&self.secrets)
    }
}

/// Serve the loopback listener until the browser redirect arrives, then pull
/// the authorization code out of it. Unrelated requests (favicon lookups,
/// empty preconnects) get a 404 and are skipped.
fn wait_for_callback(listener: TcpListener) -> Result<String, ProbeError> {
    for stream in listener.incoming() {
        let mut stream =
            stream.map_err(|e| ProbeError::Auth(format!("failed to accept OAuth callback: {}", e)))?;

        let mut request_line = String::new();
        if let Err(e) = BufReader::new(&stream).read_line(&mut request_line) {
            debug!("Dropping unreadable callback connection: {}", e);
            continue;
        }

        if !is_oauth_redirect(&request_line) {
            debug!("Ignoring request on callback listener: {:?}", request_line.trim());
            stream
                .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .ok();
            continue;
        }

        let result = parse_callback(&request_line);

        let (status, body) = match result {
            Ok(_) => ("200 OK", "The authentication flow has completed. You may close this window."),
            Err(_) => ("400 Bad Request", "Authentication failed. Please try again."),
        };
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n\
             <html><body><h1>{}</h1></body></html>",
            status, body
        );
        // the browser page is cosmetic; the code is what matters
        stream.write_all(response.as_bytes()).ok();

        return result;
    }

    Err(ProbeError::Auth("callback listener closed before the redirect arrived".to_string()))
}

fn callback_query(request_line: &str) -> &str {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| path.split_once('?'))
        .map(|(_, query)| query)
        .unwrap_or("")
}

fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| match pair.split_once('=') {
        Some((k, v)) if k == name => Some(
            urlencoding::decode(v)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| v.to_string()),
        ),
        _ => None,
    })
}

/// Whether the request is Google's redirect, successful or not.
fn is_oauth_redirect(request_line: &str) -> bool {
    let query = callback_query(request_line);
    query_param(query, "code").is_some() || query_param(query, "error").is_some()
}

/// Parse `GET /?code=...&scope=... HTTP/1.1` into the decoded code.
fn parse_callback(request_line: &str) -> Result<String, ProbeError> {
    let query = callback_query(request_line);
    let param = |name: &str| query_param(query, name);

    if let Some(err) = param("error") {
        return Err(ProbeError::Auth(format!("OAuth error: {}", err)));
    }

    param("code")
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ProbeError::Auth("no authorization code received".to_string()))
}
