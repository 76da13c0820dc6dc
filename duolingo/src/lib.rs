//! Unofficial async client for the Duolingo HTTP API.
//!
//! A [`Duolingo`] client logs in once and then polls a set of data views:
//! profile and XP, the weekly leaderboard, followed friends, friend streaks
//! and quest progress. Views keep their last good payload across failed
//! refreshes, so accessors always answer, with documented placeholders where
//! the remote has not delivered data yet.

pub mod json;
mod fetch;
mod session;
pub mod types;
pub mod views;

pub use session::{Auth, Credential, Session};
pub use views::{FriendStreaksData, FriendsData, LeaderboardData, QuestsData, UserData};

use session::DEFAULT_BASE_URL;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The credential was rejected, at login or on a later refresh.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// The remote answered with its anti-bot challenge; the session is
    /// unusable until the client identity changes.
    #[error("captcha challenge at {url}")]
    Captcha { url: String },
    #[error("not found: {0}")]
    NotFound(String),
    /// Any other unexpected remote answer, body attached for diagnosis.
    #[error("remote error {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether this error means the stored credential no longer works, as
    /// opposed to a transient remote problem.
    #[must_use]
    pub fn is_credential_problem(&self) -> bool {
        matches!(self, Error::Authentication(_) | Error::Captcha { .. })
    }
}

/// Outcome of one [`Duolingo::update`] pass: which views failed and why.
/// Views that failed keep serving their previous payload.
#[derive(Debug, Default)]
pub struct RefreshSummary {
    failed: Vec<(&'static str, Error)>,
}

impl RefreshSummary {
    fn record(&mut self, view: &'static str, result: Result<(), Error>) {
        if let Err(err) = result {
            tracing::warn!(view, error = %err, "refresh failed");
            self.failed.push((view, err));
        }
    }

    /// View names that failed to refresh, paired with their errors.
    #[must_use]
    pub fn failed(&self) -> &[(&'static str, Error)] {
        &self.failed
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether any failure points at the credential rather than the remote.
    #[must_use]
    pub fn auth_failed(&self) -> bool {
        self.failed.iter().any(|(_, err)| err.is_credential_problem())
    }
}

/// One logged-in account and its data views.
#[derive(Debug)]
pub struct Duolingo {
    session: Session,
    user_id: i64,
    pub user: UserData,
    pub leaderboard: LeaderboardData,
    pub friends: FriendsData,
    pub friend_streaks: FriendStreaksData,
    pub quests: QuestsData,
}

impl Duolingo {
    /// Logs in against the production API and primes the profile view.
    ///
    /// # Errors
    /// Fails when the credential is rejected, when the initial profile
    /// fetch fails, or when the profile does not carry a numeric user id.
    pub async fn login(credential: Credential) -> Result<Self, Error> {
        Self::login_with_base_url(credential, DEFAULT_BASE_URL).await
    }

    /// [`Duolingo::login`] against an alternate base URL.
    ///
    /// # Errors
    /// Same conditions as [`Duolingo::login`].
    pub async fn login_with_base_url(
        credential: Credential,
        base_url: impl Into<String>,
    ) -> Result<Self, Error> {
        let mut session = Session::new(credential, base_url)?;
        session.authenticate().await?;

        // The profile must load once: every other view needs the numeric
        // user id it carries.
        let mut user = UserData::new(session.username().to_string());
        user.update(&session).await?;
        let user_id = user.user_id();
        if user_id < 0 {
            return Err(Error::Authentication(format!(
                "profile for '{}' carried no user id",
                session.username()
            )));
        }
        tracing::info!(username = %session.username(), user_id, "logged in");

        Ok(Self {
            session,
            user_id,
            user,
            leaderboard: LeaderboardData::new(user_id),
            friends: FriendsData::new(user_id),
            friend_streaks: FriendStreaksData::new(user_id),
            quests: QuestsData::new(user_id),
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.session.username()
    }

    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Refreshes every view in a fixed order. Failures are collected, not
    /// propagated: each view independently keeps its previous payload, and
    /// the summary tells the caller what went stale and whether the
    /// credential itself is the problem.
    pub async fn update(&mut self) -> RefreshSummary {
        let mut summary = RefreshSummary::default();
        summary.record("user", self.user.update(&self.session).await);
        summary.record("leaderboard", self.leaderboard.update(&self.session).await);
        summary.record("friends", self.friends.update(&self.session).await);
        summary.record(
            "friend_streaks",
            self.friend_streaks.update(&self.session).await,
        );
        summary.record("quests", self.quests.update(&self.session).await);
        summary
    }
}
