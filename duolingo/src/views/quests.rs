use crate::json;
use crate::session::Session;
use crate::types::{normalize_picture, FriendQuest, MonthlyChallenge, QuestSide};
use crate::views::local_now;
use crate::Error;
use serde_json::Value;
use time::{Month, OffsetDateTime};

/// Quest states that mark the quest worth surfacing.
const RELEVANT_STATES: [&str; 2] = ["ACTIVE", "NOT_STARTED"];

/// Length of the progress-increment vectors the remote uses for friend
/// quests when it reports them at all.
const FRIEND_QUEST_DAYS: usize = 6;

/// Quest and goal progress: the social friend quest plus the monthly
/// challenge. The composed payload is `{"progress": …, "schema": …}`.
#[derive(Debug)]
pub struct QuestsData {
    user_id: i64,
    raw: Value,
    last_update: Option<OffsetDateTime>,
}

impl QuestsData {
    pub(crate) fn new(user_id: i64) -> Self {
        Self {
            user_id,
            raw: Value::Null,
            last_update: None,
        }
    }

    /// Refreshes progress then schema; any failure keeps the previous
    /// composed payload (no partial commit).
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
        let progress = session.fetch_quest_progress(self.user_id).await?;
        let schema = session.fetch_quest_schema().await?;
        Ok(serde_json::json!({
            "progress": progress,
            "schema": schema,
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

    /// The first quest in remote order whose state is `ACTIVE` or
    /// `NOT_STARTED`; sentinel-filled when there is none. The remote is
    /// assumed to report at most one quest in those states.
    #[must_use]
    pub fn friend_quest(&self) -> FriendQuest {
        let Some(quests) = json::pluck_array(&self.raw, "progress.quests") else {
            return FriendQuest::default();
        };
        let Some(quest) = quests.iter().find(|quest| {
            json::pluck_str(quest, "questState")
                .is_some_and(|state| RELEVANT_STATES.contains(&state))
        }) else {
            return FriendQuest::default();
        };

        let mut out = FriendQuest::default();
        if let Some(goal_id) = json::pluck_str(quest, "goalId") {
            out.goal_id = goal_id.to_string();
        }
        if let Some(state) = json::pluck_str(quest, "questState") {
            out.state = state.to_string();
            out.state_label = humanize_state(state);
            out.active = state == "ACTIVE";
        }
        out.threshold = json::pluck_i64(quest, "questThreshold").unwrap_or(0);
        out.points = json::pluck_i64(quest, "questPoints").unwrap_or(0);

        if let Some(partner) = json::pluck(quest, "otherQuestParticipants.0") {
            if let Some(id) = json::pluck_i64(partner, "userId") {
                out.partner.user_id = id;
            }
            if let Some(name) = json::pluck_str(partner, "displayName") {
                out.partner.name = name.to_string();
            }
            if let Some(avatar) = json::pluck_str(partner, "avatarUrl") {
                out.partner.avatar = normalize_picture(avatar);
            }
        }

        let detail_path = format!("progress.goals.details.{}", out.goal_id);
        if let Some(detail) = json::pluck(&self.raw, &detail_path) {
            out.progress_total = json::pluck_i64(detail, "progress").unwrap_or(0);
            out.me = quest_side(json::pluck_array(detail, "progressIncrements"));
            out.friend = quest_side(json::pluck_array(
                detail,
                "socialProgress.0.progressIncrements",
            ));
        }
        out
    }

    /// The monthly challenge, located by scanning the previous, current and
    /// next month's goal identifiers against the details mapping;
    /// sentinel-filled when none of the three is present.
    #[must_use]
    pub fn monthly_challenge(&self) -> MonthlyChallenge {
        self.monthly_challenge_at(local_now())
    }

    fn monthly_challenge_at(&self, now: OffsetDateTime) -> MonthlyChallenge {
        let Some(details) = json::pluck_object(&self.raw, "progress.goals.details") else {
            return MonthlyChallenge::default();
        };

        let mut found: Option<(String, usize)> = None;
        for (year, month) in month_window(now) {
            let name = format!("{year}_{month:02}_monthly_challenge");
            if details.contains_key(&name) {
                let days = Month::try_from(month)
                    .map(|month| time::util::days_in_year_month(year, month))
                    .unwrap_or(30);
                found = Some((name, usize::from(days)));
                break;
            }
        }
        let Some((goal_id, days_in_month)) = found else {
            return MonthlyChallenge::default();
        };

        let mut challenge = MonthlyChallenge {
            goal_id: goal_id.clone(),
            ..MonthlyChallenge::default()
        };
        if let Some(goals) = json::pluck_array(&self.raw, "schema.goals") {
            if let Some(schema_goal) = goals
                .iter()
                .find(|goal| json::pluck_str(goal, "goalId") == Some(goal_id.as_str()))
            {
                challenge.threshold = json::pluck_i64(schema_goal, "threshold").unwrap_or(0);
                if let Some(title) = json::pluck_str(schema_goal, "title.uiString") {
                    challenge.name = title.to_string();
                }
            }
        }

        let detail = &details[&goal_id];
        let progress = json::pluck_i64(detail, "progress").unwrap_or(0);
        challenge.progress = progress.min(challenge.threshold);
        challenge.increments = json::pluck_array(detail, "progressIncrements").map_or_else(
            || vec![0; days_in_month],
            |increments| increments.iter().filter_map(Value::as_i64).collect(),
        );
        challenge
    }
}

/// The candidate months for the challenge id: previous, current, next.
fn month_window(now: OffsetDateTime) -> [(i32, u8); 3] {
    let year = now.year();
    let month = u8::from(now.month());
    let previous = if month == 1 { (year - 1, 12) } else { (year, month - 1) };
    let next = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    [previous, (year, month), next]
}

fn quest_side(increments: Option<&Vec<Value>>) -> QuestSide {
    let increments: Vec<i64> = increments
        .map(|values| values.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    // An absent or empty vector still renders as one zero per slot.
    let increments = if increments.is_empty() {
        vec![0; FRIEND_QUEST_DAYS]
    } else {
        increments
    };
    QuestSide {
        total: increments.iter().sum(),
        increments,
    }
}

fn humanize_state(state: &str) -> String {
    let lowered = state.to_lowercase().replace('_', " ");
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => lowered,
    }
}

#[cfg(test)]
mod tests {
    use super::{humanize_state, month_window, QuestsData};
    use serde_json::json;
    use time::macros::datetime;

    fn view(raw: serde_json::Value) -> QuestsData {
        let mut view = QuestsData::new(7);
        view.raw = raw;
        view
    }

    #[test]
    fn friend_quest_takes_the_first_active_or_not_started() {
        let view = view(json!({"progress": {
            "quests": [
                {"goalId": "old_quest", "questState": "COMPLETE"},
                {"goalId": "friend_quest_a", "questState": "ACTIVE",
                 "questThreshold": 150, "questPoints": 50,
                 "otherQuestParticipants": [
                     {"userId": 11, "displayName": "Anna", "avatarUrl": "//p/anna"},
                 ]},
                {"goalId": "friend_quest_b", "questState": "NOT_STARTED"},
            ],
            "goals": {"details": {"friend_quest_a": {
                "progress": 80,
                "progressIncrements": [10, 20, 0, 0, 0, 0],
                "socialProgress": [{"progressIncrements": [25, 25, 0, 0, 0, 0]}],
            }}},
        }}));
        let quest = view.friend_quest();
        assert_eq!(quest.goal_id, "friend_quest_a");
        assert!(quest.active);
        assert_eq!(quest.state_label, "Active");
        assert_eq!(quest.threshold, 150);
        assert_eq!(quest.partner.name, "Anna");
        assert_eq!(quest.partner.avatar, "//p/anna/large");
        assert_eq!(quest.progress_total, 80);
        assert_eq!(quest.me.total, 30);
        assert_eq!(quest.friend.total, 50);
    }

    #[test]
    fn no_relevant_quest_yields_sentinels() {
        let view = view(json!({"progress": {"quests": [
            {"goalId": "done", "questState": "COMPLETE"},
        ]}}));
        let quest = view.friend_quest();
        assert_eq!(quest.goal_id, "?");
        assert!(!quest.active);
        assert!(quest.me.increments.is_empty());
    }

    #[test]
    fn missing_increments_render_as_zero_slots() {
        let view = view(json!({"progress": {
            "quests": [{"goalId": "q", "questState": "ACTIVE"}],
            "goals": {"details": {"q": {"progress": 5}}},
        }}));
        let quest = view.friend_quest();
        assert_eq!(quest.me.increments, vec![0; 6]);
        assert_eq!(quest.friend.total, 0);
    }

    #[test]
    fn monthly_challenge_resolves_threshold_from_schema() {
        let view = view(json!({
            "progress": {"goals": {"details": {"2024_03_monthly_challenge": {
                "progress": 12,
                "progressIncrements": [4, 4, 4],
            }}}},
            "schema": {"goals": [
                {"goalId": "2024_03_monthly_challenge", "threshold": 30,
                 "title": {"uiString": "March Challenge"}},
            ]},
        }));
        let challenge = view.monthly_challenge_at(datetime!(2024-03-15 12:00 UTC));
        assert_eq!(challenge.goal_id, "2024_03_monthly_challenge");
        assert_eq!(challenge.name, "March Challenge");
        assert_eq!(challenge.progress, 12);
        assert_eq!(challenge.threshold, 30);
        assert_eq!(challenge.increments, vec![4, 4, 4]);
    }

    #[test]
    fn monthly_progress_is_capped_at_the_threshold() {
        let view = view(json!({
            "progress": {"goals": {"details": {"2024_03_monthly_challenge": {
                "progress": 45,
            }}}},
            "schema": {"goals": [
                {"goalId": "2024_03_monthly_challenge", "threshold": 30},
            ]},
        }));
        let challenge = view.monthly_challenge_at(datetime!(2024-03-15 12:00 UTC));
        assert_eq!(challenge.progress, 30);
        // March has 31 days; absent increments default to one zero per day.
        assert_eq!(challenge.increments, vec![0; 31]);
    }

    #[test]
    fn window_covers_the_adjacent_months_with_year_wrap() {
        assert_eq!(
            month_window(datetime!(2024-01-10 00:00 UTC)),
            [(2023, 12), (2024, 1), (2024, 2)]
        );
        assert_eq!(
            month_window(datetime!(2024-12-10 00:00 UTC)),
            [(2024, 11), (2024, 12), (2025, 1)]
        );
    }

    #[test]
    fn previous_month_is_found_when_current_is_absent() {
        let view = view(json!({
            "progress": {"goals": {"details": {"2024_02_monthly_challenge": {
                "progress": 8,
            }}}},
            "schema": {"goals": []},
        }));
        let challenge = view.monthly_challenge_at(datetime!(2024-03-02 12:00 UTC));
        assert_eq!(challenge.goal_id, "2024_02_monthly_challenge");
    }

    #[test]
    fn absent_candidates_yield_sentinels() {
        let view = view(json!({
            "progress": {"goals": {"details": {}}},
            "schema": {"goals": []},
        }));
        let challenge = view.monthly_challenge_at(datetime!(2024-03-15 12:00 UTC));
        assert_eq!(challenge.goal_id, "?");
        assert!(challenge.increments.is_empty());
    }

    #[test]
    fn states_humanize() {
        assert_eq!(humanize_state("NOT_STARTED"), "Not started");
        assert_eq!(humanize_state("ACTIVE"), "Active");
    }
}
