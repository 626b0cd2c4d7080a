//! End-to-end conversation flows: pair uniqueness, unread accounting,
//! read receipts, and the events members observe.

use uuid::Uuid;

use memberhub_core::ErrorKind;
use memberhub_core::types::pagination::PageRequest;

use crate::helpers::{TestApp, next_frame};

#[tokio::test]
async fn test_racing_creators_converge_on_one_conversation() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();
    let kenji = Uuid::new_v4();

    let (first, second) = tokio::join!(
        app.conversations.find_or_create_direct(ana, kenji),
        app.conversations.find_or_create_direct(kenji, ana),
    );
    let first = first.unwrap();
    let second = second.unwrap();
    assert_eq!(first.id, second.id);

    let found = app
        .store
        .conversations
        .find_direct(kenji, ana)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn test_message_goes_to_the_room_and_badges_to_the_others() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();
    let kenji = Uuid::new_v4();
    let conversation = app
        .conversations
        .find_or_create_direct(ana, kenji)
        .await
        .unwrap();
    let room = format!("conversation:{}", conversation.id);

    let (ana_handle, mut ana_rx) = app.connect(ana);
    let (kenji_handle, mut kenji_rx) = app.connect(kenji);
    app.subscribe(&ana_handle, &room).await;
    app.subscribe(&kenji_handle, &room).await;

    app.conversations
        .append_message(conversation.id, ana, "lunch at noon?".to_string(), vec![])
        .await
        .unwrap();

    // Both watchers get the message; only kenji gets an unread badge.
    assert_eq!(next_frame(&mut ana_rx)["event"], "conversation:message");
    assert_eq!(next_frame(&mut kenji_rx)["event"], "conversation:message");
    let badge = next_frame(&mut kenji_rx);
    assert_eq!(badge["event"], "conversation:unread");
    assert_eq!(badge["data"]["unreadCount"], 1);
    assert_eq!(badge["data"]["totalUnread"], 1);
    assert!(ana_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_read_receipt_reaches_the_room_and_clears_the_badge() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();
    let kenji = Uuid::new_v4();
    let conversation = app
        .conversations
        .find_or_create_direct(ana, kenji)
        .await
        .unwrap();
    let room = format!("conversation:{}", conversation.id);

    app.conversations
        .append_message(conversation.id, ana, "ping".to_string(), vec![])
        .await
        .unwrap();

    let (ana_handle, mut ana_rx) = app.connect(ana);
    let (kenji_handle, mut kenji_rx) = app.connect(kenji);
    app.subscribe(&ana_handle, &room).await;
    app.subscribe(&kenji_handle, &room).await;

    app.conversations.mark_read(conversation.id, kenji).await.unwrap();

    // The sender sees who read and when.
    let receipt = next_frame(&mut ana_rx);
    assert_eq!(receipt["event"], "conversation:read");
    assert_eq!(receipt["data"]["participantId"], kenji.to_string());
    assert!(receipt["data"]["readAt"].is_string());

    // The reader's own channels see the receipt and the cleared badge.
    assert_eq!(next_frame(&mut kenji_rx)["event"], "conversation:read");
    let badge = next_frame(&mut kenji_rx);
    assert_eq!(badge["event"], "conversation:unread");
    assert_eq!(badge["data"]["unreadCount"], 0);
    assert_eq!(badge["data"]["totalUnread"], 0);
}

#[tokio::test]
async fn test_unread_totals_sum_across_conversations() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();
    let kenji = Uuid::new_v4();
    let chioma = Uuid::new_v4();

    let with_kenji = app
        .conversations
        .find_or_create_direct(ana, kenji)
        .await
        .unwrap();
    let with_chioma = app
        .conversations
        .find_or_create_direct(ana, chioma)
        .await
        .unwrap();

    for text in ["one", "two"] {
        app.conversations
            .append_message(with_kenji.id, kenji, text.to_string(), vec![])
            .await
            .unwrap();
    }
    app.conversations
        .append_message(with_chioma.id, chioma, "hi".to_string(), vec![])
        .await
        .unwrap();

    assert_eq!(app.conversations.total_unread(ana).await.unwrap(), 3);

    let page = app
        .conversations
        .list_conversations(ana, &PageRequest::new(1, 10))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    // Most recently active first.
    assert_eq!(page.items[0].conversation.id, with_chioma.id);
    assert_eq!(page.items[0].unread_count, 1);
    assert_eq!(page.items[1].unread_count, 2);

    app.conversations.mark_read(with_kenji.id, ana).await.unwrap();
    assert_eq!(app.conversations.total_unread(ana).await.unwrap(), 1);
}

#[tokio::test]
async fn test_closed_conversations_reject_appends_but_stay_readable() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();
    let kenji = Uuid::new_v4();
    let conversation = app
        .conversations
        .find_or_create_direct(ana, kenji)
        .await
        .unwrap();
    app.conversations
        .append_message(conversation.id, ana, "closing soon".to_string(), vec![])
        .await
        .unwrap();

    app.conversations.close(conversation.id, ana).await.unwrap();

    let err = app
        .conversations
        .append_message(conversation.id, kenji, "wait".to_string(), vec![])
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let history = app
        .conversations
        .history(conversation.id, kenji, &PageRequest::new(1, 10))
        .await
        .unwrap();
    assert_eq!(history.items.len(), 1);
}
