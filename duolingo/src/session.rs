use crate::Error;
use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::sync::Arc;

pub(crate) const DEFAULT_BASE_URL: &str = "https://www.duolingo.com";

/// The remote blocks unrecognized clients, so every request pretends to be a
/// desktop browser.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/83.0.4103.116 Safari/537.36";

/// How a [`Credential`] authenticates: a long-lived login token or a password.
#[derive(Debug, Clone)]
pub enum Auth {
    /// A `jwt_token` captured from a logged-in browser session.
    Jwt(String),
    /// Account password; exchanged for a token via the login endpoint.
    Password(String),
}

/// A username plus exactly one way to authenticate it.
#[derive(Debug, Clone)]
pub struct Credential {
    username: String,
    auth: Auth,
}

impl Credential {
    /// Creates a credential backed by a login token.
    #[must_use]
    pub fn with_jwt(username: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth: Auth::Jwt(jwt.into()),
        }
    }

    /// Creates a credential backed by an account password.
    #[must_use]
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            auth: Auth::Password(password.into()),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

/// One authenticated HTTP session. Owns the cookie jar and the current bearer
/// token; created once per client and never shared across credentials.
#[derive(Debug)]
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    base_url: String,
    username: String,
    auth: Auth,
    jwt: Option<String>,
}

impl Session {
    pub(crate) fn new(credential: Credential, base_url: impl Into<String>) -> Result<Self, Error> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_provider(Arc::clone(&jar))
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            jar,
            base_url,
            username: credential.username,
            auth: credential.auth,
            jwt: None,
        })
    }

    pub(crate) fn username(&self) -> &str {
        &self.username
    }

    /// Validates the credential and leaves the session ready for fetches.
    ///
    /// Token credentials are probed against the profile endpoint; password
    /// credentials go through the login endpoint, which returns the token in
    /// a response header on success and a `failure` field in the body
    /// otherwise.
    pub(crate) async fn authenticate(&mut self) -> Result<(), Error> {
        match self.auth.clone() {
            Auth::Jwt(jwt) => {
                self.apply_token(&jwt);
                let path = format!("/users/{}", self.username);
                let probe = self.send(&path, &[], None).await?;
                if probe.status != StatusCode::OK {
                    return Err(Error::Authentication(format!(
                        "token probe for '{}' returned {}",
                        self.username, probe.status
                    )));
                }
                tracing::debug!(username = %self.username, "token accepted");
                Ok(())
            }
            Auth::Password(password) => {
                let body = serde_json::json!({
                    "login": self.username,
                    "password": password,
                });
                let resp = self.send("/login", &[], Some(&body)).await?;
                let parsed: Value = serde_json::from_str(&resp.body).unwrap_or(Value::Null);
                if parsed.get("failure").is_some() {
                    return Err(Error::Authentication(format!(
                        "login rejected for '{}'",
                        self.username
                    )));
                }
                let jwt = resp
                    .headers
                    .get("jwt")
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::Authentication("login response carried no jwt header".into())
                    })?;
                self.apply_token(&jwt);
                tracing::debug!(username = %self.username, "password login succeeded");
                Ok(())
            }
        }
    }

    /// Stores the token and mirrors it into the cookie jar; the remote
    /// expects it both as a bearer header and a same-domain cookie.
    fn apply_token(&mut self, jwt: &str) {
        if let Ok(url) = Url::parse(&self.base_url) {
            self.jar.add_cookie_str(&format!("jwt_token={jwt}"), &url);
        }
        self.jwt = Some(jwt.to_string());
    }

    /// Issues one request and reads the whole response. The method is POST
    /// when a body is supplied and GET otherwise; that is a convention of
    /// the remote API, not a per-call choice.
    ///
    /// Every response is screened for the anti-bot challenge (403 with a
    /// `blockScript` marker), which poisons the session until the client
    /// identity is rotated out-of-band.
    pub(crate) async fn send(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<RawResponse, Error> {
        let url = format!("{}{}", self.base_url, path);
        let method = if body.is_some() { Method::POST } else { Method::GET };
        let mut request = self.client.request(method, &url);
        if let Some(jwt) = &self.jwt {
            request = request.bearer_auth(jwt);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status == StatusCode::FORBIDDEN && is_captcha_challenge(&body) {
            return Err(Error::Captcha { url });
        }

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// [`Session::send`] plus the shared status mapping: 404 becomes
    /// [`Error::NotFound`], any other non-2xx or an unparsable body becomes
    /// [`Error::Remote`] with the body attached for diagnosis.
    pub(crate) async fn request_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let resp = self.send(path, query, body).await?;
        if resp.status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{}{}", self.base_url, path)));
        }
        if !resp.status.is_success() {
            return Err(Error::Remote {
                status: resp.status.as_u16(),
                body: resp.body,
            });
        }
        serde_json::from_str(&resp.body).map_err(|_| Error::Remote {
            status: resp.status.as_u16(),
            body: resp.body,
        })
    }
}

fn is_captcha_challenge(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("blockScript").cloned())
        .is_some_and(|marker| !marker.is_null())
}

#[cfg(test)]
mod tests {
    use super::is_captcha_challenge;

    #[test]
    fn block_script_marker_is_a_challenge() {
        assert!(is_captcha_challenge(r#"{"blockScript": "https://x/c.js"}"#));
    }

    #[test]
    fn plain_forbidden_body_is_not_a_challenge() {
        assert!(!is_captcha_challenge(r#"{"error": "forbidden"}"#));
        assert!(!is_captcha_challenge(r#"{"blockScript": null}"#));
        assert!(!is_captcha_challenge("not json"));
    }
}
