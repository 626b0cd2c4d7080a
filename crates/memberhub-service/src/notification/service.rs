//! Notification creation, fan-out, and read-state management.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use memberhub_core::types::pagination::{PageRequest, PageResponse};
use memberhub_core::{AppError, AppResult};
use memberhub_entity::notification::Notification;
use memberhub_entity::user::UserRole;
use memberhub_realtime::{Broadcaster, ServerEvent};
use memberhub_store::traits::{NotificationStore, UserDirectory};

use super::spec::{FanoutOutcome, NotificationSpec};

/// Creates notification rows and pushes `notification:new` events.
///
/// The row write is the operation; the event is a courtesy. Store failures
/// propagate to the caller, delivery failures never do.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationStore>,
    users: Arc<dyn UserDirectory>,
    broadcaster: Arc<Broadcaster>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        users: Arc<dyn UserDirectory>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            notifications,
            users,
            broadcaster,
        }
    }

    /// Validates, persists, and dispatches one notification. Returns the
    /// stored row whether or not anyone was online to receive the event.
    pub async fn create_and_dispatch(&self, spec: NotificationSpec) -> AppResult<Notification> {
        spec.check()?;
        let stored = self.notifications.insert(&spec.into_notification()).await?;
        self.broadcast(&stored).await;
        Ok(stored)
    }

    /// Fans the template out to every listed recipient, one row each.
    ///
    /// Recipients are de-duplicated and the acting sender is dropped from
    /// the list. Each recipient gets an independent outcome; a store
    /// failure for one never aborts the rest.
    pub async fn dispatch_many(
        &self,
        template: &NotificationSpec,
        recipients: &[Uuid],
    ) -> Vec<FanoutOutcome> {
        let mut seen = HashSet::new();
        let targets: Vec<Uuid> = recipients
            .iter()
            .copied()
            .filter(|id| Some(*id) != template.sender_id && seen.insert(*id))
            .collect();

        let mut outcomes = Vec::with_capacity(targets.len());
        for recipient_id in targets {
            let spec = template.for_recipient(recipient_id);
            let stored = match spec.check() {
                Ok(()) => self.notifications.insert(&spec.into_notification()).await,
                Err(e) => Err(e),
            };

            let delivered = match &stored {
                Ok(notification) => self.broadcast(notification).await,
                Err(e) => {
                    warn!(
                        recipient_id = %recipient_id,
                        error = %e,
                        "Skipping recipient in notification fan-out"
                    );
                    0
                }
            };

            outcomes.push(FanoutOutcome {
                recipient_id,
                stored,
                delivered,
            });
        }

        let stored_count = outcomes.iter().filter(|o| o.is_stored()).count();
        info!(
            requested = recipients.len(),
            stored = stored_count,
            kind = %template.kind,
            "Notification fan-out finished"
        );
        outcomes
    }

    /// Fans the template out to every active member holding the role.
    pub async fn dispatch_to_role(
        &self,
        template: &NotificationSpec,
        role: UserRole,
    ) -> AppResult<Vec<FanoutOutcome>> {
        let recipients = self.users.active_ids_by_role(role).await?;
        Ok(self.dispatch_many(template, &recipients).await)
    }

    /// The recipient's unread badge count.
    pub async fn unread_count(&self, recipient_id: Uuid) -> AppResult<i64> {
        self.notifications.count_unread(recipient_id).await
    }

    /// Lists the recipient's notifications, newest first.
    pub async fn list(
        &self,
        recipient_id: Uuid,
        page: &PageRequest,
        unread_only: bool,
    ) -> AppResult<PageResponse<Notification>> {
        self.notifications
            .find_by_recipient(recipient_id, page, unread_only)
            .await
    }

    /// Marks one notification read. Idempotent: a second call returns the
    /// row unchanged with its original `read_at`.
    pub async fn mark_read(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Notification> {
        self.notifications
            .mark_read(recipient_id, id, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))
    }

    /// Marks every unread notification read. Returns how many changed.
    pub async fn mark_all_read(&self, recipient_id: Uuid) -> AppResult<u64> {
        self.notifications.mark_all_read(recipient_id, Utc::now()).await
    }

    /// Deletes one notification.
    pub async fn delete(&self, recipient_id: Uuid, id: Uuid) -> AppResult<()> {
        if self.notifications.delete(recipient_id, id).await? {
            Ok(())
        } else {
            Err(AppError::not_found(format!("Notification {id} not found")))
        }
    }

    /// Deletes every notification the recipient has. Returns the removed
    /// count.
    pub async fn delete_all(&self, recipient_id: Uuid) -> AppResult<u64> {
        self.notifications.delete_all_for(recipient_id).await
    }

    /// Publishes `notification:new` to the recipient's private room and
    /// returns how many channels took it. A failed badge count skips the
    /// event; the stored row already stands.
    async fn broadcast(&self, notification: &Notification) -> usize {
        let unread_count = match self
            .notifications
            .count_unread(notification.recipient_id)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(
                    recipient_id = %notification.recipient_id,
                    error = %e,
                    "Unread count failed, skipping notification event"
                );
                return 0;
            }
        };

        self.broadcaster
            .publish_to_user(
                notification.recipient_id,
                &ServerEvent::NotificationNew {
                    notification: notification.clone(),
                    unread_count,
                },
            )
            .await
    }
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memberhub_core::ErrorKind;
    use memberhub_core::config::realtime::RealtimeConfig;
    use memberhub_entity::notification::NotificationKind;
    use memberhub_realtime::{OpenRoomPolicy, RealtimeEngine};
    use memberhub_store::Store;

    fn service() -> (NotificationService, RealtimeEngine) {
        let engine = RealtimeEngine::new(RealtimeConfig::default(), Arc::new(OpenRoomPolicy));
        let store = Store::in_memory();
        let service = NotificationService::new(
            Arc::clone(&store.notifications),
            Arc::clone(&store.users),
            engine.broadcaster(),
        );
        (service, engine)
    }

    fn spec_for(recipient_id: Uuid) -> NotificationSpec {
        NotificationSpec {
            recipient_id,
            sender_id: Some(Uuid::new_v4()),
            kind: NotificationKind::Reply,
            title: "New reply".to_string(),
            message: "Someone replied to your thread".to_string(),
            reference: None,
            link: None,
        }
    }

    #[tokio::test]
    async fn test_create_persists_and_pushes_to_online_recipient() {
        let (service, engine) = service();
        let recipient = Uuid::new_v4();
        let (_handle, mut rx) = engine.sessions().register(recipient).unwrap();

        let stored = service.create_and_dispatch(spec_for(recipient)).await.unwrap();
        assert!(stored.is_unread());
        assert_eq!(service.unread_count(recipient).await.unwrap(), 1);

        let frame = rx.try_recv().unwrap();
        let event: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(event["event"], "notification:new");
        assert_eq!(event["data"]["unreadCount"], 1);
        assert_eq!(
            event["data"]["notification"]["id"],
            stored.id.to_string()
        );
    }

    #[tokio::test]
    async fn test_offline_recipient_still_gets_the_row() {
        let (service, _engine) = service();
        let recipient = Uuid::new_v4();

        let stored = service.create_and_dispatch(spec_for(recipient)).await.unwrap();
        assert_eq!(stored.recipient_id, recipient);
        assert_eq!(service.unread_count(recipient).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fanout_dedupes_and_drops_the_sender() {
        let (service, _engine) = service();
        let sender = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let template = NotificationSpec {
            sender_id: Some(sender),
            ..spec_for(Uuid::new_v4())
        };

        let outcomes = service
            .dispatch_many(&template, &[a, b, a, sender, b])
            .await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(FanoutOutcome::is_stored));
        assert_eq!(service.unread_count(a).await.unwrap(), 1);
        assert_eq!(service.unread_count(b).await.unwrap(), 1);
        assert_eq!(service.unread_count(sender).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent_and_scoped() {
        let (service, _engine) = service();
        let recipient = Uuid::new_v4();
        let stored = service.create_and_dispatch(spec_for(recipient)).await.unwrap();

        let read = service.mark_read(recipient, stored.id).await.unwrap();
        assert!(read.is_read);
        let first_read_at = read.read_at.unwrap();

        let again = service.mark_read(recipient, stored.id).await.unwrap();
        assert_eq!(again.read_at.unwrap(), first_read_at);

        // Another member cannot touch this row.
        let err = service.mark_read(Uuid::new_v4(), stored.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_unknown_notification_is_not_found() {
        let (service, _engine) = service();
        let err = service
            .delete(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
