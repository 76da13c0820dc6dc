mod common;

use common::mock_server::DuolingoMock;

#[tokio::test]
async fn profile_accessors_read_the_composed_payload() {
    let mock = DuolingoMock::start().await;
    mock.mount_profile().await;

    let client = mock.login().await;
    let user = &client.user;

    assert_eq!(user.total_xp(), 15300);
    assert_eq!(user.gems(), 540);
    assert_eq!(user.daily_xp_goal(), 20);
    assert_eq!(user.site_streak(), 42);
    assert_eq!(user.bio(), "learning for the owl");
    assert_eq!(user.learning_language(), "de");

    let courses = user.courses();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].name, "German");
    assert_eq!(courses[0].language_code, "de");
    assert_eq!(courses[1].xp, 3300);

    assert_eq!(user.current_streak().length, 42);
    assert_eq!(user.previous_streak().length, 36);
    assert_eq!(user.longest_streak().achieved_date, "2023-04-25");
    assert!(user.last_update().is_some());
}

#[tokio::test]
async fn language_maps_resolve_both_directions() {
    let mock = DuolingoMock::start().await;
    mock.mount_profile().await;

    let client = mock.login().await;
    assert_eq!(client.user.language_from_abbr("de"), "German");
    assert_eq!(client.user.abbreviation_of("French"), "fr");
    assert_eq!(client.user.language_from_abbr("xx"), "?");
}

#[tokio::test]
async fn learned_skills_come_back_in_dependency_order() {
    let mock = DuolingoMock::start().await;
    mock.mount_profile().await;

    let client = mock.login().await;
    assert_eq!(client.user.learned_skills("de"), vec!["Basics", "Phrases"]);
    assert!(client.user.learned_skills("fr").is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_the_previous_payload() {
    let mock = DuolingoMock::start().await;
    mock.mount_all().await;

    let mut client = mock.login().await;
    let first_update = client.user.last_update().unwrap();
    assert_eq!(client.user.total_xp(), 15300);

    // The remote goes away entirely; every endpoint now answers 404.
    mock.server.reset().await;
    let summary = client.update().await;

    assert!(!summary.is_clean());
    assert_eq!(summary.failed().len(), 5);
    assert!(!summary.auth_failed());

    // Stale data keeps serving; only the attempt timestamp advanced.
    assert_eq!(client.user.total_xp(), 15300);
    assert_eq!(client.user.courses().len(), 2);
    assert!(client.user.last_update().unwrap() >= first_update);
}

#[tokio::test]
async fn clean_update_refreshes_every_view() {
    let mock = DuolingoMock::start().await;
    mock.mount_all().await;

    let mut client = mock.login().await;
    let summary = client.update().await;

    assert!(summary.is_clean());
    assert!(client.leaderboard.last_update().is_some());
    assert!(client.friends.last_update().is_some());
    assert!(client.friend_streaks.last_update().is_some());
    assert!(client.quests.last_update().is_some());
}
