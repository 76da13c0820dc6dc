use crate::json;
use crate::session::Session;
use crate::types::Friend;
use crate::views::local_now;
use crate::Error;
use serde_json::Value;
use time::OffsetDateTime;

/// Followed users for one account.
#[derive(Debug)]
pub struct FriendsData {
    user_id: i64,
    raw: Value,
    last_update: Option<OffsetDateTime>,
}

impl FriendsData {
    pub(crate) fn new(user_id: i64) -> Self {
        Self {
            user_id,
            raw: Value::Null,
            last_update: None,
        }
    }

    /// Refreshes the friends profile; a failure keeps the previous payload.
    ///
    /// # Errors
    /// Returns the fetch error for the caller to log.
    pub async fn update(&mut self, session: &Session) -> Result<(), Error> {
        let result = session.fetch_friends(self.user_id).await;
        self.last_update = Some(local_now());
        self.raw = result?;
        Ok(())
    }

    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    #[must_use]
    pub fn last_update(&self) -> Option<OffsetDateTime> {
        self.last_update
    }

    /// Users this account follows, in remote order. Rows without a user id
    /// are skipped; every other missing field gets its placeholder.
    #[must_use]
    pub fn friends(&self) -> Vec<Friend> {
        let Some(users) = json::pluck_array(&self.raw, "following.users") else {
            return Vec::new();
        };
        users
            .iter()
            .filter_map(|user| {
                let mut friend = Friend {
                    user_id: json::pluck_i64(user, "userId")?,
                    ..Friend::default()
                };
                if let Some(value) = json::pluck_str(user, "username") {
                    friend.username = value.to_string();
                }
                if let Some(value) = json::pluck_str(user, "displayName") {
                    friend.display_name = value.to_string();
                }
                if let Some(value) = json::pluck_str(user, "picture") {
                    friend.picture = value.to_string();
                }
                if let Some(value) = json::pluck_i64(user, "totalXp") {
                    friend.total_xp = value;
                }
                if let Some(value) = json::pluck_bool(user, "hasSubscription") {
                    friend.has_subscription = value;
                }
                if let Some(value) = json::pluck_bool(user, "isCurrentlyActive") {
                    friend.is_currently_active = value;
                }
                Some(friend)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::FriendsData;
    use serde_json::json;

    fn view(raw: serde_json::Value) -> FriendsData {
        let mut view = FriendsData::new(7);
        view.raw = raw;
        view
    }

    #[test]
    fn friends_parse_with_per_field_defaults() {
        let view = view(json!({"following": {"users": [
            {"userId": 11, "username": "anna", "displayName": "Anna",
             "picture": "//p/anna", "totalXp": 900, "hasSubscription": true,
             "isCurrentlyActive": false},
            {"userId": 12},
            {"username": "no-id"},
        ]}}));
        let friends = view.friends();
        assert_eq!(friends.len(), 2);
        assert_eq!(friends[0].display_name, "Anna");
        assert!(friends[0].has_subscription);
        assert_eq!(friends[1].username, "?");
        assert_eq!(friends[1].total_xp, -1);
    }

    #[test]
    fn empty_payload_yields_no_friends() {
        assert!(view(json!({})).friends().is_empty());
        assert!(view(json!({"following": {"users": "oops"}})).friends().is_empty());
    }
}
