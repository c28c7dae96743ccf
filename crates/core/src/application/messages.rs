// Message Service - authorized message operations
//
// Every method authorizes first; a denial returns before the store is touched.
// Writes then confirm the binding again inside the store write itself, so a
// rebind that commits after the check turns the write into a denial.

use super::access::AccessGuard;
use super::truncate::plan_truncation;
use crate::domain::{Message, MessageContent, MessageId, NewMessage, Principal};
use crate::error::{AppError, Result};
use crate::port::{MessageRepository, StoreTransaction, TimeProvider, TransactionalStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a truncate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TruncateOutcome {
    /// Surviving message, `None` if the queue was empty
    pub kept: Option<MessageId>,
    pub removed: u64,
}

pub struct MessageService {
    guard: Arc<AccessGuard>,
    messages: Arc<dyn MessageRepository>,
    store: Arc<dyn TransactionalStore>,
    time_provider: Arc<dyn TimeProvider>,
}

fn rebound(queue: &str) -> AppError {
    AppError::unauthorized(format!("queue {} was rebound during the request", queue))
}

/// Fails unless `owner` still holds `queue` as seen by the open transaction
async fn confirm_owner(tx: &mut dyn StoreTransaction, owner: &Principal, queue: &str) -> Result<()> {
    match tx.find_queue_owner(queue).await? {
        Some(current) if current.id == owner.id => Ok(()),
        _ => Err(rebound(queue)),
    }
}

/// Commit on success, roll back (logging a failed rollback) on error
async fn finish<T>(tx: Box<dyn StoreTransaction>, applied: Result<T>, op: &str) -> Result<T> {
    match applied {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = ?rollback_err, op, "Rollback failed");
            }
            Err(e)
        }
    }
}

impl MessageService {
    pub fn new(
        guard: Arc<AccessGuard>,
        messages: Arc<dyn MessageRepository>,
        store: Arc<dyn TransactionalStore>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            guard,
            messages,
            store,
            time_provider,
        }
    }

    /// Append a message to the requester's queue
    pub async fn append(
        &self,
        requester: &Principal,
        queue: &str,
        content: MessageContent,
    ) -> Result<Message> {
        let owner = self.guard.authorize(requester, queue).await?;

        let message = self
            .messages
            .append(
                owner.id,
                &NewMessage {
                    queue: queue.to_string(),
                    author: owner.username,
                    content: content.into_inner(),
                    created_at: self.time_provider.now_millis(),
                },
            )
            .await?
            .ok_or_else(|| rebound(queue))?;

        debug!(id = message.id, queue = %queue, "Message appended");
        Ok(message)
    }

    /// Snapshot of the queue, oldest first (created_at, then id)
    pub async fn list(&self, requester: &Principal, queue: &str) -> Result<Vec<Message>> {
        self.guard.authorize(requester, queue).await?;
        self.messages.list_by_queue(queue).await
    }

    /// Fetch one message of the requester's queue.
    ///
    /// Messages of other queues are reported as absent.
    pub async fn get(&self, requester: &Principal, id: MessageId) -> Result<Option<Message>> {
        let current = self.guard.authorize_queue_user(requester).await?;
        Ok(self
            .messages
            .find_by_id(id)
            .await?
            .filter(|m| current.owns(&m.queue)))
    }

    /// Delete one message by id.
    ///
    /// A missing id is a no-op (`Ok(false)`). An existing message of another
    /// queue is `Unauthorized`.
    pub async fn delete_by_id(&self, requester: &Principal, id: MessageId) -> Result<bool> {
        self.guard.authorize_queue_user(requester).await?;

        let Some(message) = self.messages.find_by_id(id).await? else {
            debug!(id, "Delete of missing message ignored");
            return Ok(false);
        };

        let owner = self.guard.authorize(requester, &message.queue).await?;

        // Conditional on the queue and the binding we authorized against
        let deleted = self
            .messages
            .delete_in_queue(id, owner.id, &owner.queue)
            .await?;
        debug!(id, queue = %owner.queue, deleted, "Message delete");
        Ok(deleted)
    }

    /// Remove every message of the queue
    pub async fn clear(&self, requester: &Principal, queue: &str) -> Result<u64> {
        let owner = self.guard.authorize(requester, queue).await?;

        let mut tx = self.store.begin_transaction().await?;
        let applied = async {
            confirm_owner(tx.as_mut(), &owner, queue).await?;
            let removed = tx.clear_queue(queue).await?;
            Ok::<_, AppError>(removed)
        }
        .await;
        let removed = finish(tx, applied, "clear").await?;

        info!(queue = %queue, removed, "Queue cleared");
        Ok(removed)
    }

    /// Keep only the newest message of the queue
    pub async fn truncate(&self, requester: &Principal, queue: &str) -> Result<TruncateOutcome> {
        let owner = self.guard.authorize(requester, queue).await?;

        let mut tx = self.store.begin_transaction().await?;
        let applied = async {
            confirm_owner(tx.as_mut(), &owner, queue).await?;
            let snapshot = tx.list_messages(queue).await?;
            let plan = plan_truncation(&snapshot);
            let removed = if plan.delete.is_empty() {
                0
            } else {
                tx.delete_messages(&plan.delete).await?
            };
            Ok::<_, AppError>(TruncateOutcome {
                kept: plan.keep,
                removed,
            })
        }
        .await;
        let outcome = finish(tx, applied, "truncate").await?;

        info!(
            queue = %queue,
            kept = ?outcome.kept,
            removed = outcome.removed,
            "Queue truncated"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::port::message_repository::MockMessageRepository;
    use crate::port::principal_repository::MockPrincipalRepository;
    use crate::port::time_provider::mocks::ManualClock;
    use crate::port::StoreTransaction;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct NoTransactions;

    #[async_trait]
    impl TransactionalStore for NoTransactions {
        async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>> {
            Err(AppError::Internal("transaction must not be opened".to_string()))
        }
    }

    fn principal(id: i64, username: &str, queue: &str) -> Principal {
        Principal {
            id,
            username: username.to_string(),
            queue: queue.to_string(),
            password_hash: String::new(),
        }
    }

    fn service(requester: Principal, messages: MockMessageRepository) -> MessageService {
        let mut principals = MockPrincipalRepository::new();
        principals
            .expect_find_by_id()
            .returning(move |_| Ok(Some(requester.clone())));
        MessageService::new(
            Arc::new(AccessGuard::new(Arc::new(principals))),
            Arc::new(messages),
            Arc::new(NoTransactions),
            Arc::new(ManualClock::new(5_000)),
        )
    }

    #[tokio::test]
    async fn test_denied_requests_never_touch_the_store() {
        let eve = principal(2, "eve", "");
        let mut messages = MockMessageRepository::new();
        messages.expect_append().never();
        messages.expect_list_by_queue().never();
        let svc = service(eve.clone(), messages);

        let append = svc
            .append(&eve, "jobs", MessageContent::new("x"))
            .await;
        assert!(matches!(append, Err(AppError::Unauthorized(_))));
        assert!(matches!(
            svc.list(&eve, "jobs").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.clear(&eve, "jobs").await,
            Err(AppError::Unauthorized(_))
        ));
        // Denied before a transaction is opened
        assert!(matches!(
            svc.truncate(&eve, "jobs").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_append_stamps_author_and_clock() {
        let bob = principal(1, "bob", "jobs");
        let mut messages = MockMessageRepository::new();
        messages
            .expect_append()
            .withf(|owner, m| {
                *owner == 1 && m.author == "bob" && m.queue == "jobs" && m.created_at == 5_000
            })
            .returning(|_, m| {
                Ok(Some(Message {
                    id: 10,
                    queue: m.queue.clone(),
                    author: m.author.clone(),
                    content: m.content.clone(),
                    created_at: m.created_at,
                }))
            });
        let svc = service(bob.clone(), messages);

        let stored = svc
            .append(&bob, "jobs", MessageContent::new("build #1"))
            .await
            .unwrap();
        assert_eq!(stored.id, 10);
        assert_eq!(stored.content, "build #1");
    }

    #[tokio::test]
    async fn test_append_refused_by_store_is_unauthorized() {
        let bob = principal(1, "bob", "jobs");
        let mut messages = MockMessageRepository::new();
        messages.expect_append().times(1).returning(|_, _| Ok(None));
        let svc = service(bob.clone(), messages);

        let err = svc
            .append(&bob, "jobs", MessageContent::new("late"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_noop() {
        let bob = principal(1, "bob", "jobs");
        let mut messages = MockMessageRepository::new();
        messages.expect_find_by_id().returning(|_| Ok(None));
        messages.expect_delete_in_queue().never();
        let svc = service(bob.clone(), messages);

        assert!(!svc.delete_by_id(&bob, 999).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_foreign_message_is_unauthorized() {
        let bob = principal(1, "bob", "jobs");
        let mut messages = MockMessageRepository::new();
        messages.expect_find_by_id().returning(|id| {
            Ok(Some(Message {
                id,
                queue: "orders".to_string(),
                author: "alice".to_string(),
                content: String::new(),
                created_at: 1,
            }))
        });
        messages.expect_delete_in_queue().never();
        let svc = service(bob.clone(), messages);

        assert!(matches!(
            svc.delete_by_id(&bob, 3).await,
            Err(AppError::Unauthorized(_))
        ));
        // get() hides it instead
        assert_eq!(svc.get(&bob, 3).await.unwrap(), None);
    }
    /// Transaction that reports a fixed queue owner and records what ran
    struct RecordingTx {
        owner: Option<Principal>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl crate::port::Transaction for RecordingTx {
        async fn commit(self: Box<Self>) -> Result<()> {
            self.log.lock().unwrap().push("commit");
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> Result<()> {
            self.log.lock().unwrap().push("rollback");
            Ok(())
        }
    }

    #[async_trait]
    impl StoreTransaction for RecordingTx {
        async fn find_principal(&mut self, _: &str) -> Result<Option<Principal>> {
            Ok(self.owner.clone())
        }

        async fn find_queue_owner(&mut self, _: &str) -> Result<Option<Principal>> {
            Ok(self.owner.clone())
        }

        async fn update_principal(&mut self, _: &Principal) -> Result<()> {
            unreachable!()
        }

        async fn delete_principal(&mut self, _: i64) -> Result<bool> {
            unreachable!()
        }

        async fn list_messages(&mut self, queue: &str) -> Result<Vec<Message>> {
            self.log.lock().unwrap().push("list");
            Ok((1..=3)
                .map(|id| Message {
                    id,
                    queue: queue.to_string(),
                    author: "bob".to_string(),
                    content: String::new(),
                    created_at: id,
                })
                .collect())
        }

        async fn delete_messages(&mut self, ids: &[MessageId]) -> Result<u64> {
            self.log.lock().unwrap().push("delete");
            Ok(ids.len() as u64)
        }

        async fn clear_queue(&mut self, _: &str) -> Result<u64> {
            self.log.lock().unwrap().push("clear");
            Ok(3)
        }

        async fn retag_queue(&mut self, _: &str, _: &str) -> Result<u64> {
            unreachable!()
        }

        async fn retag_author(&mut self, _: &str, _: &str) -> Result<u64> {
            unreachable!()
        }
    }

    struct RecordingStore {
        owner: Option<Principal>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl TransactionalStore for RecordingStore {
        async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>> {
            Ok(Box::new(RecordingTx {
                owner: self.owner.clone(),
                log: self.log.clone(),
            }))
        }
    }

    /// The guard sees `requester`; the write transaction sees `owner_in_tx`
    fn service_with_store(
        requester: Principal,
        owner_in_tx: Option<Principal>,
    ) -> (MessageService, Arc<Mutex<Vec<&'static str>>>) {
        let mut principals = MockPrincipalRepository::new();
        principals
            .expect_find_by_id()
            .returning(move |_| Ok(Some(requester.clone())));
        let log = Arc::new(Mutex::new(Vec::new()));
        let svc = MessageService::new(
            Arc::new(AccessGuard::new(Arc::new(principals))),
            Arc::new(MockMessageRepository::new()),
            Arc::new(RecordingStore {
                owner: owner_in_tx,
                log: log.clone(),
            }),
            Arc::new(ManualClock::new(5_000)),
        );
        (svc, log)
    }

    #[tokio::test]
    async fn test_clear_and_truncate_confirm_owner_in_transaction() {
        let bob = principal(1, "bob", "jobs");
        let (svc, log) = service_with_store(bob.clone(), Some(bob.clone()));

        assert_eq!(svc.clear(&bob, "jobs").await.unwrap(), 3);
        let outcome = svc.truncate(&bob, "jobs").await.unwrap();
        assert_eq!(outcome.kept, Some(3));
        assert_eq!(outcome.removed, 2);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["clear", "commit", "list", "delete", "commit"]
        );
    }

    #[tokio::test]
    async fn test_queue_rebound_after_check_rolls_back() {
        let bob = principal(1, "bob", "jobs");
        // Another principal took "jobs" between the check and the write
        let carol = principal(7, "carol", "jobs");

        for owner_in_tx in [None, Some(carol)] {
            let (svc, log) = service_with_store(bob.clone(), owner_in_tx);

            assert!(matches!(
                svc.clear(&bob, "jobs").await,
                Err(AppError::Unauthorized(_))
            ));
            assert!(matches!(
                svc.truncate(&bob, "jobs").await,
                Err(AppError::Unauthorized(_))
            ));
            assert_eq!(*log.lock().unwrap(), vec!["rollback", "rollback"]);
        }
    }
}
