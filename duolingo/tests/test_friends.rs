mod common;

use common::mock_server::DuolingoMock;

#[tokio::test]
async fn friends_parse_with_placeholders_for_sparse_rows() {
    let mock = DuolingoMock::start().await;
    mock.mount_all().await;

    let mut client = mock.login().await;
    assert!(client.update().await.is_clean());

    let friends = client.friends.friends();
    assert_eq!(friends.len(), 2);
    assert_eq!(friends[0].display_name, "Anna");
    assert_eq!(friends[0].total_xp, 9001);
    assert!(friends[0].has_subscription);
    // The sparse second row falls back to placeholders.
    assert_eq!(friends[1].username, "bert");
    assert_eq!(friends[1].display_name, "?");
    assert_eq!(friends[1].total_xp, -1);
}
