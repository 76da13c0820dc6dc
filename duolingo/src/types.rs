use serde::Serialize;

/// Placeholder for numeric fields the remote did not provide.
pub const UNKNOWN_NUMBER: i64 = -1;
/// Placeholder for string fields the remote did not provide.
pub const UNKNOWN_TEXT: &str = "?";
/// Placeholder for date fields the remote did not provide.
pub const UNKNOWN_DATE: &str = "1900-01-01";

/// A course the user is enrolled in. Only entries carrying all five fields
/// make it out of the raw payload; malformed entries are dropped silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Course {
    /// Display name, e.g. "German".
    pub name: String,
    /// Language being learned, e.g. "de".
    pub language_code: String,
    /// Language the course is taught from, e.g. "en".
    pub from_language_code: String,
    /// XP earned in this course.
    pub xp: i64,
    /// Remote course id, e.g. "DUOLINGO_DE_EN".
    pub id: String,
}

/// A consecutive-day usage record. Dates are `YYYY-MM-DD` strings as the
/// remote reports them; a length of `-1` means the streak is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub start_date: String,
    pub end_date: String,
    /// Day the streak was last extended. Only meaningful for the current
    /// streak.
    pub last_extended_date: String,
    /// Day the record was achieved. Only meaningful for the longest streak.
    pub achieved_date: String,
    pub length: i64,
}

impl Default for Streak {
    fn default() -> Self {
        Self {
            start_date: UNKNOWN_DATE.to_string(),
            end_date: UNKNOWN_DATE.to_string(),
            last_extended_date: UNKNOWN_DATE.to_string(),
            achieved_date: UNKNOWN_DATE.to_string(),
            length: UNKNOWN_NUMBER,
        }
    }
}

/// One lesson entry from the recent-XP list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    /// XP gained.
    pub xp: i64,
    /// Unix timestamp (seconds) the lesson was logged at.
    pub time: i64,
}

/// A followed user from the friends profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Friend {
    pub user_id: i64,
    pub username: String,
    pub display_name: String,
    pub picture: String,
    pub total_xp: i64,
    pub has_subscription: bool,
    pub is_currently_active: bool,
}

impl Default for Friend {
    fn default() -> Self {
        Self {
            user_id: UNKNOWN_NUMBER,
            username: UNKNOWN_TEXT.to_string(),
            display_name: UNKNOWN_TEXT.to_string(),
            picture: UNKNOWN_TEXT.to_string(),
            total_xp: UNKNOWN_NUMBER,
            has_subscription: false,
            is_currently_active: false,
        }
    }
}

/// One row of the weekly cohort leaderboard. Only rows carrying every field
/// are surfaced; incomplete rows are skipped and do not count toward
/// positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub display_name: String,
    pub avatar_url: String,
    pub score: i64,
    pub has_plus: bool,
    pub streak_extended_today: bool,
}

/// A friend streak: a shared consecutive-day record with one other user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendStreak {
    pub match_id: String,
    /// The other participant.
    pub user_id: i64,
    pub name: String,
    pub picture: String,
    pub length: i64,
    pub start_date: String,
    pub end_date: String,
    pub last_extended_date: String,
    /// Whether the streak was already extended today (local time).
    pub extended_today: bool,
}

impl Default for FriendStreak {
    fn default() -> Self {
        Self {
            match_id: UNKNOWN_TEXT.to_string(),
            user_id: UNKNOWN_NUMBER,
            name: UNKNOWN_TEXT.to_string(),
            picture: UNKNOWN_TEXT.to_string(),
            length: 0,
            start_date: UNKNOWN_DATE.to_string(),
            end_date: UNKNOWN_DATE.to_string(),
            last_extended_date: UNKNOWN_DATE.to_string(),
            extended_today: false,
        }
    }
}

/// The other participant in a friend quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestPartner {
    pub user_id: i64,
    pub name: String,
    pub avatar: String,
}

impl Default for QuestPartner {
    fn default() -> Self {
        Self {
            user_id: UNKNOWN_NUMBER,
            name: UNKNOWN_TEXT.to_string(),
            avatar: UNKNOWN_TEXT.to_string(),
        }
    }
}

/// One side's contribution to a friend quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QuestSide {
    pub total: i64,
    pub increments: Vec<i64>,
}

/// The current social quest shared with a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FriendQuest {
    pub goal_id: String,
    /// Raw remote state, e.g. "ACTIVE".
    pub state: String,
    /// Human-readable state, e.g. "Not started".
    pub state_label: String,
    pub active: bool,
    pub threshold: i64,
    pub points: i64,
    pub partner: QuestPartner,
    /// Combined progress of both participants.
    pub progress_total: i64,
    pub me: QuestSide,
    pub friend: QuestSide,
}

impl Default for FriendQuest {
    fn default() -> Self {
        Self {
            goal_id: UNKNOWN_TEXT.to_string(),
            state: UNKNOWN_TEXT.to_string(),
            state_label: UNKNOWN_TEXT.to_string(),
            active: false,
            threshold: 0,
            points: 0,
            partner: QuestPartner::default(),
            progress_total: 0,
            me: QuestSide::default(),
            friend: QuestSide::default(),
        }
    }
}

/// The month-long challenge, resolved from the goal details and schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyChallenge {
    /// Goal identifier, e.g. "2024_03_monthly_challenge".
    pub goal_id: String,
    /// Display title from the schema.
    pub name: String,
    pub threshold: i64,
    /// Capped at `threshold`.
    pub progress: i64,
    /// One entry per day of the challenge month.
    pub increments: Vec<i64>,
}

impl Default for MonthlyChallenge {
    fn default() -> Self {
        Self {
            goal_id: UNKNOWN_TEXT.to_string(),
            name: UNKNOWN_TEXT.to_string(),
            threshold: 0,
            progress: 0,
            increments: Vec::new(),
        }
    }
}

/// Ensures an avatar/picture URL points at the large rendition; the remote
/// hands out both bare and suffixed forms.
#[must_use]
pub(crate) fn normalize_picture(url: &str) -> String {
    if url.ends_with("/large") {
        url.to_string()
    } else {
        format!("{url}/large")
    }
}
