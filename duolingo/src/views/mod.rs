//! Per-category data views.
//!
//! Each view keeps the last successfully fetched payload plus the time of
//! the last refresh attempt. A failed refresh never clears the payload:
//! consumers may see stale data while the remote degrades, but never a
//! forced-empty view after having seen good data. Accessors are total —
//! any missing or malformed field degrades to its documented placeholder
//! instead of panicking or erroring.

mod friend_streaks;
mod friends;
mod leaderboard;
mod quests;
mod user;

pub use friend_streaks::FriendStreaksData;
pub use friends::FriendsData;
pub use leaderboard::LeaderboardData;
pub use quests::QuestsData;
pub use user::UserData;

use time::{Date, OffsetDateTime, UtcOffset};

/// Current wall-clock time in the local offset, falling back to UTC when the
/// local offset cannot be determined.
pub(crate) fn local_now() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    UtcOffset::current_local_offset().map_or(now, |offset| now.to_offset(offset))
}

/// `YYYY-MM-DD`, the format the remote uses for streak dates.
pub(crate) fn iso_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// `DD.MM.YYYY`, the fixed key format of the weekly XP buckets.
pub(crate) fn day_key(date: Date) -> String {
    format!(
        "{:02}.{:02}.{:04}",
        date.day(),
        u8::from(date.month()),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::{day_key, iso_date};
    use time::macros::date;

    #[test]
    fn date_formats_are_zero_padded() {
        assert_eq!(iso_date(date!(2024 - 03 - 05)), "2024-03-05");
        assert_eq!(day_key(date!(2024 - 03 - 05)), "05.03.2024");
    }
}
