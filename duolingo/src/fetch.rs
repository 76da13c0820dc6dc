//! Raw fetchers: one method per remote resource, each a single request
//! returning the decoded JSON body or a typed failure. No retries here;
//! backoff is the caller's concern.

use crate::session::Session;
use crate::Error;
use serde_json::Value;

/// Weekly leaderboard cohort id. Fixed on the remote side; every user's
/// leaderboard lives under the same cohort.
const LEADERBOARD_COHORT: &str = "7d9f5dd1-8423-491a-91f2-2532052038ce";

/// Page size for the friends profile endpoint; effectively "all of them".
const FRIENDS_PAGE_SIZE: u32 = 1000;

impl Session {
    /// Profile by username. The lighter of the two profile payloads, but the
    /// only one that can resolve a username to a numeric id.
    pub(crate) async fn fetch_user_by_name(&self, username: &str) -> Result<Value, Error> {
        self.request_json(&format!("/users/{username}"), &[], None)
            .await
    }

    /// Profile by id; carries courses, XP goal, streak data, gems and the
    /// recent lesson list.
    pub(crate) async fn fetch_user_by_id(&self, user_id: i64) -> Result<Value, Error> {
        self.request_json(&format!("/2017-06-30/users/{user_id}"), &[], None)
            .await
    }

    /// Weekly cohort leaderboard and tier for the user.
    pub(crate) async fn fetch_leaderboard(&self, user_id: i64) -> Result<Value, Error> {
        let path = format!("/leaderboard-service/leaderboards/{LEADERBOARD_COHORT}/users/{user_id}");
        self.request_json(&path, &[], None).await
    }

    /// Followers/following lists.
    pub(crate) async fn fetch_friends(&self, user_id: i64) -> Result<Value, Error> {
        let path = format!("/friends-service/users/{user_id}/profile");
        let query = [("pageSize", FRIENDS_PAGE_SIZE.to_string())];
        self.request_json(&path, &query, None).await
    }

    /// Confirmed friend-streak matches; first half of the two-step streak
    /// resolution.
    pub(crate) async fn fetch_friend_matches(&self, user_id: i64) -> Result<Value, Error> {
        let path = format!("/friends/users/{user_id}/matches");
        let query = [("activityName", "friendsStreak".to_string())];
        self.request_json(&path, &query, None).await
    }

    /// Streak details for the given match ids; second half of the two-step
    /// streak resolution.
    pub(crate) async fn fetch_match_details(&self, match_ids: &[String]) -> Result<Value, Error> {
        let query = [("matchIds", match_ids.join(","))];
        self.request_json("/friends-streak/matches", &query, None)
            .await
    }

    /// Quest/goal progress, including the active quest list.
    pub(crate) async fn fetch_quest_progress(&self, user_id: i64) -> Result<Value, Error> {
        let path = format!("/goals-service/users/{user_id}/progress");
        let query = [("ui_language", "en".to_string())];
        self.request_json(&path, &query, None).await
    }

    /// Display schema for quests/goals (thresholds, titles).
    pub(crate) async fn fetch_quest_schema(&self) -> Result<Value, Error> {
        let query = [("ui_language", "en".to_string())];
        self.request_json("/goals-service/schema", &query, None)
            .await
    }
}
