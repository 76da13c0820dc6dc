use crate::json;
use crate::session::Session;
use crate::types::{normalize_picture, FriendStreak};
use crate::views::{iso_date, local_now};
use crate::Error;
use serde_json::Value;
use std::collections::HashMap;
use time::OffsetDateTime;

/// Friend streaks: shared consecutive-day records with other users.
///
/// Resolution is two-step: the confirmed-matches list names the matches and
/// participants, the match-details call resolves per-match streak lengths
/// and dates. The composed payload is `{"friend_streak": …, "matches": …}`.
#[derive(Debug)]
pub struct FriendStreaksData {
    user_id: i64,
    raw: Value,
    last_update: Option<OffsetDateTime>,
}

impl FriendStreaksData {
    pub(crate) fn new(user_id: i64) -> Self {
        Self {
            user_id,
            raw: Value::Null,
            last_update: None,
        }
    }

    /// Refreshes both halves of the streak data; any failure in the
    /// sequence keeps the previous composed payload (no partial commit).
    ///
    /// # Errors
    /// Returns the fetch error for the caller to log.
    pub async fn update(&mut self, session: &Session) -> Result<(), Error> {
        let result = self.fetch(session).await;
        self.last_update = Some(local_now());
        self.raw = result?;
        Ok(())
    }

    async fn fetch(&self, session: &Session) -> Result<Value, Error> {
        let matches = session.fetch_friend_matches(self.user_id).await?;
        let match_ids = confirmed_match_ids(&matches);
        // No confirmed matches means nothing to resolve; calling the
        // details endpoint with an empty id list is a guaranteed remote
        // error that would discard the good first fetch.
        let details = if match_ids.is_empty() {
            serde_json::json!({ "friendsStreak": [] })
        } else {
            session.fetch_match_details(&match_ids).await?
        };
        Ok(serde_json::json!({
            "friend_streak": matches,
            "matches": details,
        }))
    }

    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    #[must_use]
    pub fn last_update(&self) -> Option<OffsetDateTime> {
        self.last_update
    }

    /// Confirmed friend streaks in match order. A match whose details are
    /// missing still appears, as a zero-length placeholder, as long as it
    /// names at least one participant other than this user.
    #[must_use]
    pub fn confirmed(&self) -> Vec<FriendStreak> {
        self.confirmed_at(local_now())
    }

    fn confirmed_at(&self, now: OffsetDateTime) -> Vec<FriendStreak> {
        let Some(confirmed) = json::pluck_array(
            &self.raw,
            "friend_streak.friendsStreak.confirmedMatches",
        ) else {
            return Vec::new();
        };
        let details = self.details_by_match_id();
        let today = iso_date(now.date());

        confirmed
            .iter()
            .filter_map(|entry| {
                let match_id = json::pluck_str(entry, "matchId")?;
                let partner = json::pluck_array(entry, "usersInMatch")?
                    .iter()
                    .find(|user| {
                        json::pluck_i64(user, "userId")
                            .is_some_and(|id| id != self.user_id)
                    })?;

                let mut streak = FriendStreak {
                    match_id: match_id.to_string(),
                    user_id: json::pluck_i64(partner, "userId").unwrap_or(-1),
                    ..FriendStreak::default()
                };
                if let Some(name) = json::pluck_str(partner, "name") {
                    streak.name = name.to_string();
                }
                if let Some(picture) = json::pluck_str(partner, "picture") {
                    streak.picture = normalize_picture(picture);
                }
                if let Some(detail) = details.get(match_id) {
                    if let Some(length) = json::pluck_i64(detail, "streakLength") {
                        streak.length = length;
                    }
                    if let Some(date) = json::pluck_str(detail, "startDate") {
                        streak.start_date = date.to_string();
                    }
                    if let Some(date) = json::pluck_str(detail, "endDate") {
                        streak.end_date = date.to_string();
                    }
                    if let Some(date) = json::pluck_str(detail, "lastExtendedDate") {
                        streak.last_extended_date = date.to_string();
                    }
                }
                streak.extended_today = streak.last_extended_date == today;
                Some(streak)
            })
            .collect()
    }

    /// First streak record per match id from the details payload.
    fn details_by_match_id(&self) -> HashMap<&str, &Value> {
        let Some(matches) = json::pluck_array(&self.raw, "matches.friendsStreak") else {
            return HashMap::new();
        };
        matches
            .iter()
            .filter_map(|entry| {
                let match_id = json::pluck_str(entry, "matchId")?;
                let first_streak = json::pluck(entry, "streaks.0")?;
                Some((match_id, first_streak))
            })
            .collect()
    }
}

fn confirmed_match_ids(matches: &Value) -> Vec<String> {
    let Some(confirmed) = json::pluck_array(matches, "friendsStreak.confirmedMatches") else {
        return Vec::new();
    };
    confirmed
        .iter()
        .filter_map(|entry| json::pluck_str(entry, "matchId"))
        .map(str::to_string)
        .collect()
}
