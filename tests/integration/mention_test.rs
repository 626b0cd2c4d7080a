//! Mention scanning against the member directory, and the fan-out that
//! follows from it.

use std::collections::HashSet;

use uuid::Uuid;

use memberhub_entity::{NotificationKind, UserRole, UserStatus};
use memberhub_service::NotificationSpec;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_unknown_and_inactive_names_are_dropped() {
    let app = TestApp::new();
    let ana = app.seed_user("ana.torres").await;
    let kenji = app.seed_user("kenji").await;
    app.seed_user_with("closed.store", UserRole::Franchisee, UserStatus::Inactive)
        .await;

    let ids = app
        .mentions
        .resolve("@ana.torres @kenji @closed.store and @nobody")
        .await
        .unwrap();
    assert_eq!(ids, vec![ana.id, kenji.id]);
}

#[tokio::test]
async fn test_resolution_is_case_insensitive_and_deduplicated() {
    let app = TestApp::new();
    let ana = app.seed_user("ana.torres").await;

    let ids = app
        .mentions
        .resolve("cc @Ana.Torres, and again: @ana.torres")
        .await
        .unwrap();
    assert_eq!(ids, vec![ana.id]);
}

#[tokio::test]
async fn test_mention_pipeline_notifies_everyone_but_the_author() {
    let app = TestApp::new();
    let author = app.seed_user("bruno").await;
    let ana = app.seed_user("ana.torres").await;
    let kenji = app.seed_user("kenji").await;

    let text = "@ana.torres @kenji @bruno the rollout plan is up";
    let mentioned = app
        .mentions
        .resolve_excluding(text, author.id)
        .await
        .unwrap();
    assert_eq!(mentioned, vec![ana.id, kenji.id]);

    let template = NotificationSpec {
        recipient_id: Uuid::new_v4(),
        sender_id: Some(author.id),
        kind: NotificationKind::Mention,
        title: "You were mentioned".to_string(),
        message: text.to_string(),
        reference: None,
        link: None,
    };
    let outcomes = app.notifications.dispatch_many(&template, &mentioned).await;

    let stored: HashSet<Uuid> = outcomes
        .iter()
        .filter(|o| o.is_stored())
        .map(|o| o.recipient_id)
        .collect();
    assert_eq!(stored, HashSet::from([ana.id, kenji.id]));
    assert_eq!(app.notifications.unread_count(author.id).await.unwrap(), 0);
}
