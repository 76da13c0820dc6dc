mod common;

use common::mock_server::DuolingoMock;

#[tokio::test]
async fn active_friend_quest_combines_progress_and_partner() {
    let mock = DuolingoMock::start().await;
    mock.mount_all().await;

    let mut client = mock.login().await;
    assert!(client.update().await.is_clean());

    let quest = client.quests.friend_quest();
    assert_eq!(quest.goal_id, "friend_quest_xp");
    assert!(quest.active);
    assert_eq!(quest.state_label, "Active");
    assert_eq!(quest.threshold, 150);
    assert_eq!(quest.points, 50);
    assert_eq!(quest.partner.user_id, 111);
    assert_eq!(quest.partner.name, "Anna");
    assert_eq!(quest.progress_total, 80);
    assert_eq!(quest.me.total, 30);
    assert_eq!(quest.friend.total, 50);
}

#[tokio::test]
async fn absent_monthly_challenge_degrades_to_sentinels() {
    let mock = DuolingoMock::start().await;
    mock.mount_all().await;

    let mut client = mock.login().await;
    assert!(client.update().await.is_clean());

    // The fixture carries no monthly goal for any nearby month.
    let challenge = client.quests.monthly_challenge();
    assert_eq!(challenge.goal_id, "?");
    assert_eq!(challenge.progress, 0);
    assert!(challenge.increments.is_empty());
}
