use duolingo::{Credential, Duolingo};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Deserialize)]
pub struct Fixture {
    pub request: FixtureRequest,
    pub response: FixtureResponse,
}

#[derive(Deserialize)]
pub struct FixtureRequest {
    pub method: String,
    pub path_pattern: String,
}

#[derive(Deserialize)]
pub struct FixtureResponse {
    pub status_code: u16,
    pub headers: Option<std::collections::HashMap<String, String>>,
    pub body: serde_json::Value,
}

pub struct DuolingoMock {
    pub server: MockServer,
}

#[allow(dead_code)]
impl DuolingoMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    pub async fn mount_fixture(&self, fixture_path: &str) {
        let full_path = Self::fixtures_dir().join(fixture_path);

        let content = fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", full_path.display(), e));

        let fixture: Fixture = serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", full_path.display(), e));

        let mut template =
            ResponseTemplate::new(fixture.response.status_code).set_body_json(&fixture.response.body);
        if let Some(headers) = &fixture.response.headers {
            for (key, value) in headers {
                template = template.insert_header(key.as_str(), value.as_str());
            }
        }

        Mock::given(method(fixture.request.method.as_str()))
            .and(path_regex(&fixture.request.path_pattern))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// Mounts a bare status response without a fixture file, for error paths.
    pub async fn mount_status(&self, http_method: &str, pattern: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path_regex(pattern))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({})))
            .mount(&self.server)
            .await;
    }

    /// Mounts the two profile fixtures every logged-in client needs.
    pub async fn mount_profile(&self) {
        self.mount_fixture("user_by_name.json").await;
        self.mount_fixture("user_by_id.json").await;
    }

    /// Mounts a full happy-path remote: profile plus every polled endpoint.
    pub async fn mount_all(&self) {
        self.mount_profile().await;
        self.mount_fixture("leaderboard.json").await;
        self.mount_fixture("friends.json").await;
        self.mount_fixture("friend_matches.json").await;
        self.mount_fixture("match_details.json").await;
        self.mount_fixture("quest_progress.json").await;
        self.mount_fixture("quest_schema.json").await;
    }

    pub async fn login(&self) -> Duolingo {
        self.try_login()
            .await
            .expect("login against the mock server failed")
    }

    pub async fn try_login(&self) -> Result<Duolingo, duolingo::Error> {
        let credential = Credential::with_jwt("testuser", "test-jwt");
        Duolingo::login_with_base_url(credential, self.server.uri()).await
    }

    pub async fn try_login_with_password(&self, password: &str) -> Result<Duolingo, duolingo::Error> {
        let credential = Credential::with_password("testuser", password);
        Duolingo::login_with_base_url(credential, self.server.uri()).await
    }
}
