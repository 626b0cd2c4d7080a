//! End-to-end notification flows: dispatch, fan-out isolation, read state.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_core::{AppError, AppResult, ErrorKind};
use memberhub_entity::{Notification, NotificationKind, UserRole, UserStatus};
use memberhub_service::{NotificationService, NotificationSpec};
use memberhub_store::NotificationStore;

use crate::helpers::{TestApp, next_frame, reply_spec};

#[tokio::test]
async fn test_online_recipient_gets_the_event_with_a_fresh_badge() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();
    let (_handle, mut rx) = app.connect(ana);

    let stored = app
        .notifications
        .create_and_dispatch(reply_spec(ana, Uuid::new_v4()))
        .await
        .unwrap();

    let frame = next_frame(&mut rx);
    assert_eq!(frame["event"], "notification:new");
    assert_eq!(frame["data"]["notification"]["id"], stored.id.to_string());
    assert_eq!(frame["data"]["unreadCount"], 1);
}

#[tokio::test]
async fn test_offline_recipient_still_gets_the_row() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();

    app.notifications
        .create_and_dispatch(reply_spec(ana, Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(app.notifications.unread_count(ana).await.unwrap(), 1);
    let page = app
        .notifications
        .list(ana, &PageRequest::new(1, 10), false)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_dead_channels_are_pruned_without_blocking_delivery() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();

    let (_live, mut live_rx) = app.connect(ana);
    let (_dead, dead_rx) = app.connect(ana);
    drop(dead_rx);
    assert_eq!(app.engine.channel_count(), 2);

    app.notifications
        .create_and_dispatch(reply_spec(ana, Uuid::new_v4()))
        .await
        .unwrap();

    let frame = next_frame(&mut live_rx);
    assert_eq!(frame["event"], "notification:new");
    assert_eq!(app.engine.channel_count(), 1);
}

/// Delegates to the real store but fails inserts for chosen recipients.
struct FailingNotificationStore {
    inner: Arc<dyn NotificationStore>,
    failing: HashSet<Uuid>,
}

#[async_trait]
impl NotificationStore for FailingNotificationStore {
    async fn insert(&self, notification: &Notification) -> AppResult<Notification> {
        if self.failing.contains(&notification.recipient_id) {
            return Err(AppError::persistence("injected insert failure"));
        }
        self.inner.insert(notification).await
    }

    async fn find_by_id(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Option<Notification>> {
        self.inner.find_by_id(recipient_id, id).await
    }

    async fn find_by_recipient(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
        unread_only: bool,
    ) -> AppResult<PageResponse<Notification>> {
        self.inner
            .find_by_recipient(recipient_id, page, unread_only)
            .await
    }

    async fn count_unread(&self, recipient_id: Uuid) -> AppResult<i64> {
        self.inner.count_unread(recipient_id).await
    }

    async fn mark_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        self.inner.mark_read(recipient_id, id, at).await
    }

    async fn mark_all_read(&self, recipient_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        self.inner.mark_all_read(recipient_id, at).await
    }

    async fn delete(&self, recipient_id: Uuid, id: Uuid) -> AppResult<bool> {
        self.inner.delete(recipient_id, id).await
    }

    async fn delete_all_for(&self, recipient_id: Uuid) -> AppResult<u64> {
        self.inner.delete_all_for(recipient_id).await
    }
}

#[tokio::test]
async fn test_fanout_isolates_per_recipient_failures() {
    let app = TestApp::new();
    let sender = Uuid::new_v4();
    let audience: Vec<Uuid> = (0..50).map(|_| Uuid::new_v4()).collect();
    let unlucky = audience[26];

    let failing = Arc::new(FailingNotificationStore {
        inner: Arc::clone(&app.store.notifications),
        failing: HashSet::from([unlucky]),
    });
    let service = NotificationService::new(
        failing,
        Arc::clone(&app.store.users),
        app.engine.broadcaster(),
    );

    // Duplicates and the acting sender are dropped before any attempt.
    let mut input = audience.clone();
    input.push(audience[0]);
    input.push(sender);

    let outcomes = service
        .dispatch_many(&reply_spec(Uuid::new_v4(), sender), &input)
        .await;

    assert_eq!(outcomes.len(), 50);
    assert_eq!(outcomes.iter().filter(|o| o.is_stored()).count(), 49);

    let failures: Vec<_> = outcomes.iter().filter(|o| !o.is_stored()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].recipient_id, unlucky);
    assert!(failures[0].stored.as_ref().unwrap_err().is_retryable());

    assert_eq!(service.unread_count(audience[0]).await.unwrap(), 1);
    assert_eq!(service.unread_count(unlucky).await.unwrap(), 0);
    assert_eq!(service.unread_count(audience[49]).await.unwrap(), 1);
}

#[tokio::test]
async fn test_mark_read_is_scoped_to_the_recipient() {
    let app = TestApp::new();
    let ana = Uuid::new_v4();
    let stored = app
        .notifications
        .create_and_dispatch(reply_spec(ana, Uuid::new_v4()))
        .await
        .unwrap();

    let err = app
        .notifications
        .mark_read(Uuid::new_v4(), stored.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let read = app.notifications.mark_read(ana, stored.id).await.unwrap();
    assert!(read.read_at.is_some());
    assert_eq!(app.notifications.unread_count(ana).await.unwrap(), 0);
}

#[tokio::test]
async fn test_role_fanout_targets_active_holders_only() {
    let app = TestApp::new();
    let first = app
        .seed_user_with("hq.ana", UserRole::Admin, UserStatus::Active)
        .await;
    let second = app
        .seed_user_with("hq.kenji", UserRole::Admin, UserStatus::Active)
        .await;
    app.seed_user_with("hq.gone", UserRole::Admin, UserStatus::Inactive)
        .await;
    app.seed_user_with("store.staff", UserRole::Staff, UserStatus::Active)
        .await;

    let template = NotificationSpec {
        kind: NotificationKind::Broadcast,
        ..reply_spec(Uuid::new_v4(), Uuid::new_v4())
    };
    let outcomes = app
        .notifications
        .dispatch_to_role(&template, UserRole::Admin)
        .await
        .unwrap();

    let recipients: HashSet<Uuid> = outcomes.iter().map(|o| o.recipient_id).collect();
    assert_eq!(recipients, HashSet::from([first.id, second.id]));
    assert!(outcomes.iter().all(|o| o.is_stored()));
}
