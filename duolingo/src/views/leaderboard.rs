use crate::json;
use crate::session::Session;
use crate::types::{LeaderboardEntry, UNKNOWN_NUMBER, UNKNOWN_TEXT};
use crate::views::local_now;
use crate::Error;
use serde_json::Value;
use time::OffsetDateTime;

/// League ladder, lowest tier first. Indexed by the remote's `tier` field.
const TIER_NAMES: [&str; 10] = [
    "Bronze", "Silver", "Gold", "Sapphire", "Ruby", "Emerald", "Amethyst", "Pearl", "Obsidian",
    "Diamond",
];

/// Weekly cohort leaderboard for one user.
#[derive(Debug)]
pub struct LeaderboardData {
    user_id: i64,
    raw: Value,
    last_update: Option<OffsetDateTime>,
}

impl LeaderboardData {
    pub(crate) fn new(user_id: i64) -> Self {
        Self {
            user_id,
            raw: Value::Null,
            last_update: None,
        }
    }

    /// Refreshes the leaderboard payload; a failure keeps the previous one.
    ///
    /// # Errors
    /// Returns the fetch error for the caller to log; the view itself stays
    /// usable either way.
    pub async fn update(&mut self, session: &Session) -> Result<(), Error> {
        let result = session.fetch_leaderboard(self.user_id).await;
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

    #[must_use]
    pub fn tier(&self) -> i64 {
        json::pluck_i64(&self.raw, "tier").unwrap_or(UNKNOWN_NUMBER)
    }

    /// League name for the current tier, `"?"` when the tier is unknown or
    /// beyond the known ladder.
    #[must_use]
    pub fn tier_name(&self) -> String {
        usize::try_from(self.tier())
            .ok()
            .and_then(|tier| TIER_NAMES.get(tier))
            .map_or_else(|| UNKNOWN_TEXT.to_string(), |name| (*name).to_string())
    }

    #[must_use]
    pub fn streak_in_tier(&self) -> i64 {
        json::pluck_i64(&self.raw, "streak_in_tier").unwrap_or(UNKNOWN_NUMBER)
    }

    /// Cohort rankings in remote order (already rank-ordered). Rows missing
    /// any required field are skipped entirely and never count toward
    /// positions.
    #[must_use]
    pub fn ranking(&self) -> Vec<LeaderboardEntry> {
        let Some(rankings) = json::pluck_array(&self.raw, "active.cohort.rankings") else {
            return Vec::new();
        };
        rankings.iter().filter_map(parse_entry).collect()
    }

    /// 1-based position of this user among valid rows, `-1` when absent.
    #[must_use]
    pub fn position(&self) -> i64 {
        self.ranking()
            .iter()
            .position(|entry| entry.user_id == self.user_id)
            .map_or(UNKNOWN_NUMBER, |index| index as i64 + 1)
    }

    /// Whether this user already extended their streak today, as reported
    /// by their own leaderboard row.
    #[must_use]
    pub fn streak_extended_today(&self) -> bool {
        self.ranking()
            .iter()
            .find(|entry| entry.user_id == self.user_id)
            .is_some_and(|entry| entry.streak_extended_today)
    }
}

fn parse_entry(row: &Value) -> Option<LeaderboardEntry> {
    Some(LeaderboardEntry {
        user_id: json::pluck_i64(row, "user_id")?,
        display_name: json::pluck_str(row, "display_name")?.to_string(),
        avatar_url: json::pluck_str(row, "avatar_url")?.to_string(),
        score: json::pluck_i64(row, "score")?,
        has_plus: json::pluck_bool(row, "has_plus")?,
        streak_extended_today: json::pluck_bool(row, "streak_extended_today")?,
    })
}
