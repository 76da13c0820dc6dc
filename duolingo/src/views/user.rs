use crate::json;
use crate::session::Session;
use crate::types::{Course, Lesson, Streak, UNKNOWN_NUMBER, UNKNOWN_TEXT};
use crate::views::{day_key, iso_date, local_now};
use crate::Error;
use serde_json::Value;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

/// Profile data for one user, combined from the username and id endpoints.
///
/// The composed payload is `{"by_username": …, "by_id": …}`; the username
/// endpoint resolves the numeric id, the id endpoint carries courses, the
/// XP goal, streak data, gems and the recent lesson list.
#[derive(Debug)]
pub struct UserData {
    username: String,
    raw: Value,
    last_update: Option<OffsetDateTime>,
    abbr_to_name: HashMap<String, String>,
    name_to_abbr: HashMap<String, String>,
}

impl UserData {
    pub(crate) fn new(username: String) -> Self {
        Self {
            username,
            raw: Value::Null,
            last_update: None,
            abbr_to_name: HashMap::new(),
            name_to_abbr: HashMap::new(),
        }
    }

    /// Refreshes both profile payloads. On failure the previous payload is
    /// retained; only the refresh timestamp advances.
    ///
    /// # Errors
    /// Returns the fetch error so the caller can decide whether it is fatal
    /// (it is during client construction, where the numeric id must
    /// resolve).
    pub async fn update(&mut self, session: &Session) -> Result<(), Error> {
        let result = self.fetch(session).await;
        self.last_update = Some(local_now());
        self.raw = result?;
        // Lookup maps are built once, from the first good payload.
        if self.abbr_to_name.is_empty() {
            self.populate_language_maps();
        }
        Ok(())
    }

    async fn fetch(&self, session: &Session) -> Result<Value, Error> {
        let by_username = session.fetch_user_by_name(&self.username).await?;
        let user_id = json::pluck_i64(&by_username, "id").ok_or_else(|| Error::Remote {
            status: 200,
            body: format!("profile for '{}' carried no numeric id", self.username),
        })?;
        let by_id = session.fetch_user_by_id(user_id).await?;
        Ok(serde_json::json!({
            "by_username": by_username,
            "by_id": by_id,
        }))
    }

    fn populate_language_maps(&mut self) {
        let Some(languages) = json::pluck_array(&self.raw, "by_username.languages") else {
            return;
        };
        for language in languages {
            let (Some(abbr), Some(name)) = (
                json::pluck_str(language, "language"),
                json::pluck_str(language, "language_string"),
            ) else {
                continue;
            };
            self.abbr_to_name.insert(abbr.to_string(), name.to_string());
            self.name_to_abbr
                .insert(name.to_lowercase(), abbr.to_string());
        }
    }

    /// The raw composed payload from the last successful refresh.
    #[must_use]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// When the view last attempted a refresh, successful or not.
    #[must_use]
    pub fn last_update(&self) -> Option<OffsetDateTime> {
        self.last_update
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn user_id(&self) -> i64 {
        json::pluck_i64(&self.raw, "by_username.id").unwrap_or(UNKNOWN_NUMBER)
    }

    #[must_use]
    pub fn fullname(&self) -> String {
        self.text("by_username.fullname")
    }

    #[must_use]
    pub fn bio(&self) -> String {
        self.text("by_username.bio")
    }

    #[must_use]
    pub fn avatar(&self) -> String {
        self.text("by_username.avatar")
    }

    #[must_use]
    pub fn ui_language(&self) -> String {
        self.text("by_username.ui_language")
    }

    #[must_use]
    pub fn learning_language(&self) -> String {
        self.text("by_username.learning_language")
    }

    #[must_use]
    pub fn total_xp(&self) -> i64 {
        json::pluck_i64(&self.raw, "by_id.totalXp").unwrap_or(UNKNOWN_NUMBER)
    }

    #[must_use]
    pub fn gems(&self) -> i64 {
        json::pluck_i64(&self.raw, "by_id.gems")
            .or_else(|| json::pluck_i64(&self.raw, "by_username.tracking_properties.gems"))
            .unwrap_or(UNKNOWN_NUMBER)
    }

    /// Daily XP goal the user configured.
    #[must_use]
    pub fn daily_xp_goal(&self) -> i64 {
        json::pluck_i64(&self.raw, "by_id.xpGoal").unwrap_or(UNKNOWN_NUMBER)
    }

    /// Streak length as the username endpoint reports it.
    #[must_use]
    pub fn site_streak(&self) -> i64 {
        json::pluck_i64(&self.raw, "by_username.site_streak").unwrap_or(UNKNOWN_NUMBER)
    }

    #[must_use]
    pub fn current_streak(&self) -> Streak {
        self.streak("currentStreak")
    }

    #[must_use]
    pub fn previous_streak(&self) -> Streak {
        self.streak("previousStreak")
    }

    #[must_use]
    pub fn longest_streak(&self) -> Streak {
        self.streak("longestStreak")
    }

    fn streak(&self, key: &str) -> Streak {
        let mut streak = Streak::default();
        let base = format!("by_id.streakData.{key}");
        if let Some(value) = json::pluck_str(&self.raw, &format!("{base}.startDate")) {
            streak.start_date = value.to_string();
        }
        if let Some(value) = json::pluck_str(&self.raw, &format!("{base}.endDate")) {
            streak.end_date = value.to_string();
        }
        if let Some(value) = json::pluck_str(&self.raw, &format!("{base}.lastExtendedDate")) {
            streak.last_extended_date = value.to_string();
        }
        if let Some(value) = json::pluck_str(&self.raw, &format!("{base}.achieveDate")) {
            streak.achieved_date = value.to_string();
        }
        if let Some(value) = json::pluck_i64(&self.raw, &format!("{base}.length")) {
            streak.length = value;
        }
        streak
    }

    /// Whether the streak was already extended today (local time).
    #[must_use]
    pub fn streak_extended_today(&self) -> bool {
        self.streak_extended_today_at(local_now())
    }

    fn streak_extended_today_at(&self, now: OffsetDateTime) -> bool {
        let current = self.current_streak();
        if current.last_extended_date == iso_date(now.date()) {
            return true;
        }
        json::pluck_bool(&self.raw, "by_username.streak_extended_today").unwrap_or(false)
    }

    /// Courses the user is enrolled in. Entries missing any required field
    /// are dropped.
    #[must_use]
    pub fn courses(&self) -> Vec<Course> {
        let Some(courses) = json::pluck_array(&self.raw, "by_id.courses") else {
            return Vec::new();
        };
        courses
            .iter()
            .filter_map(|course| {
                Some(Course {
                    name: json::pluck_str(course, "title")?.to_string(),
                    language_code: json::pluck_str(course, "learningLanguage")?.to_string(),
                    from_language_code: json::pluck_str(course, "fromLanguage")?.to_string(),
                    xp: json::pluck_i64(course, "xp")?,
                    id: json::pluck_str(course, "id")?.to_string(),
                })
            })
            .collect()
    }

    /// Lessons logged today (local time).
    #[must_use]
    pub fn lessons_today(&self) -> Vec<Lesson> {
        self.lessons_today_at(local_now())
    }

    /// XP gained today (local time); `0` when no lessons are visible.
    #[must_use]
    pub fn xp_today(&self) -> i64 {
        self.xp_today_at(local_now())
    }

    fn xp_today_at(&self, now: OffsetDateTime) -> i64 {
        self.lessons_today_at(now).iter().map(|lesson| lesson.xp).sum()
    }

    fn lessons_today_at(&self, now: OffsetDateTime) -> Vec<Lesson> {
        // The window is [midnight, midnight + 1 day] with both ends
        // inclusive: a lesson stamped exactly at the next midnight still
        // counts as today. Boundary policy, kept as documented.
        let midnight = now.date().midnight().assume_offset(now.offset());
        let start = midnight.unix_timestamp();
        let end = start + 86_400;
        self.lessons()
            .into_iter()
            .filter(|lesson| lesson.time >= start && lesson.time <= end)
            .collect()
    }

    fn lessons(&self) -> Vec<Lesson> {
        let Some(gains) = json::pluck_array(&self.raw, "by_id.xpGains") else {
            return Vec::new();
        };
        gains
            .iter()
            .filter_map(|gain| {
                Some(Lesson {
                    xp: json::pluck_i64(gain, "xp").unwrap_or(0),
                    time: json::pluck_i64(gain, "time")?,
                })
            })
            .collect()
    }

    /// XP per day over the trailing 7 calendar days (today included), keyed
    /// `DD.MM.YYYY`. Days without lessons have no entry.
    #[must_use]
    pub fn xp_week(&self) -> HashMap<String, i64> {
        self.xp_week_at(local_now())
    }

    /// Sum of the weekly buckets.
    #[must_use]
    pub fn week_xp(&self) -> i64 {
        self.xp_week().values().sum()
    }

    fn xp_week_at(&self, now: OffsetDateTime) -> HashMap<String, i64> {
        let today = now.date();
        let window_start = today - Duration::days(6);
        let mut buckets: HashMap<String, i64> = HashMap::new();
        for lesson in self.lessons() {
            let Ok(stamp) = OffsetDateTime::from_unix_timestamp(lesson.time) else {
                continue;
            };
            let date = stamp.to_offset(now.offset()).date();
            if date < window_start || date > today {
                continue;
            }
            *buckets.entry(day_key(date)).or_insert(0) += lesson.xp;
        }
        buckets
    }

    /// Full language name for an abbreviation, from the lookup map built on
    /// the first successful fetch.
    #[must_use]
    pub fn language_from_abbr(&self, abbr: &str) -> String {
        self.abbr_to_name
            .get(abbr)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_TEXT.to_string())
    }

    /// Abbreviation for a full language name (case-insensitive).
    #[must_use]
    pub fn abbreviation_of(&self, name: &str) -> String {
        self.name_to_abbr
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_else(|| UNKNOWN_TEXT.to_string())
    }

    /// Longest-path depth of each skill in the legacy skill graph for a
    /// language: `1` for roots, `1 + max(deps)` otherwise. A skill reachable
    /// from itself is a data anomaly; it is logged and pinned to `0`.
    #[must_use]
    pub fn skill_dependency_order(&self, lang: &str) -> HashMap<String, u32> {
        let path = format!("by_username.language_data.{lang}.skills");
        let Some(skills) = json::pluck_array(&self.raw, &path) else {
            return HashMap::new();
        };
        let by_name: HashMap<&str, &Value> = skills
            .iter()
            .filter_map(|skill| Some((json::pluck_str(skill, "name")?, skill)))
            .collect();
        let mut memo = HashMap::new();
        for skill in skills {
            if let Some(name) = json::pluck_str(skill, "name") {
                let mut trail = Vec::new();
                resolve_order(name, &by_name, &mut memo, &mut trail);
            }
        }
        memo
    }

    /// Names of learned skills for a language, ordered by dependency depth.
    #[must_use]
    pub fn learned_skills(&self, lang: &str) -> Vec<String> {
        let orders = self.skill_dependency_order(lang);
        let path = format!("by_username.language_data.{lang}.skills");
        let Some(skills) = json::pluck_array(&self.raw, &path) else {
            return Vec::new();
        };
        let mut learned: Vec<(u32, String)> = skills
            .iter()
            .filter(|skill| json::pluck_bool(skill, "learned").unwrap_or(false))
            .filter_map(|skill| {
                let name = json::pluck_str(skill, "name")?.to_string();
                let order = orders.get(&name).copied().unwrap_or(0);
                Some((order, name))
            })
            .collect();
        learned.sort_by_key(|(order, _)| *order);
        learned.into_iter().map(|(_, name)| name).collect()
    }

    fn text(&self, path: &str) -> String {
        json::pluck_str(&self.raw, path)
            .map_or_else(|| UNKNOWN_TEXT.to_string(), str::to_string)
    }
}

fn resolve_order(
    name: &str,
    skills: &HashMap<&str, &Value>,
    memo: &mut HashMap<String, u32>,
    trail: &mut Vec<String>,
) -> u32 {
    if trail.iter().any(|crumb| crumb == name) {
        tracing::warn!(skill = name, "dependency cycle in skill graph");
        memo.insert(name.to_string(), 0);
        return 0;
    }
    if let Some(&order) = memo.get(name) {
        return order;
    }
    let dependencies: Vec<&str> = skills
        .get(name)
        .and_then(|skill| json::pluck_array(skill, "dependencies_name"))
        .map(|deps| deps.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let order = if dependencies.is_empty() {
        1
    } else {
        trail.push(name.to_string());
        let deepest = dependencies
            .iter()
            .map(|dep| resolve_order(dep, skills, memo, trail))
            .max()
            .unwrap_or(0);
        trail.pop();
        1 + deepest
    };
    // Cycle detection may have pinned this skill to 0 while we recursed.
    *memo.entry(name.to_string()).or_insert(order)
}
