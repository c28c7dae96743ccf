//! Operations racing each other: concurrent requests on a file-backed
//! database, and writes overtaken by a rebind committed after their access check

mod common;

use async_trait::async_trait;
use common::{Harness, TempDb};
use futures::future::join_all;
use qnd_core::application::{
    AccessGuard, DeletePolicy, MessageService, QueueLifecycleManager, Rebinding,
    UpdatePrincipalRequest,
};
use qnd_core::domain::{MessageContent, NewPrincipal, Principal, PrincipalId};
use qnd_core::error::{AppError, Result};
use qnd_core::port::{MessageRepository, PrincipalRepository, TransactionalStore};
use qnd_infra_sqlite::SqlitePrincipalRepository;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_concurrent_truncates_leave_exactly_one_message() {
    let db = TempDb::new();
    let h = Harness::open(&db.url(), DeletePolicy::Retain).await;
    let alice = h.user("alice", "orders").await;

    let mut newest = 0;
    for t in 1..=20 {
        newest = h.post_at(&alice, &format!("m{}", t), t).await;
    }

    let outcomes = join_all((0..8).map(|_| h.messages.truncate(&alice, "orders"))).await;

    let mut removed = 0;
    for outcome in outcomes {
        let outcome = outcome.unwrap();
        assert_eq!(outcome.kept, Some(newest));
        removed += outcome.removed;
    }
    // Serialized: the first truncate removes everything, the rest find one message
    assert_eq!(removed, 19);

    let remaining = h.messages.list(&alice, "orders").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, newest);
}

#[tokio::test]
async fn test_concurrent_appends_to_separate_queues() {
    let db = TempDb::new();
    let h = Harness::open(&db.url(), DeletePolicy::Retain).await;
    let alice = h.user("alice", "orders").await;
    let bob = h.user("bob", "jobs").await;

    let posts = (0..25).flat_map(|i| {
        [
            h.messages
                .append(&alice, "orders", MessageContent::new(format!("a{}", i))),
            h.messages
                .append(&bob, "jobs", MessageContent::new(format!("b{}", i))),
        ]
    });
    let results = join_all(posts).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let mut ids: Vec<i64> = results.into_iter().map(|r| r.unwrap().id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 50);

    assert_eq!(h.store.count_by_queue("orders").await.unwrap(), 25);
    assert_eq!(h.store.count_by_queue("jobs").await.unwrap(), 25);
    assert!(h
        .messages
        .list(&bob, "jobs")
        .await
        .unwrap()
        .iter()
        .all(|m| m.author == "bob"));
}

#[tokio::test]
async fn test_truncate_racing_appends_keeps_a_consistent_queue() {
    let db = TempDb::new();
    let h = Harness::open(&db.url(), DeletePolicy::Retain).await;
    let alice = h.user("alice", "orders").await;
    for t in 1..=5 {
        h.post_at(&alice, "old", t).await;
    }
    h.clock.set(100);

    let append = async {
        for i in 0..10 {
            h.messages
                .append(&alice, "orders", MessageContent::new(format!("new{}", i)))
                .await
                .unwrap();
        }
    };
    let truncate = h.messages.truncate(&alice, "orders");
    let (_, outcome) = tokio::join!(append, truncate);
    let outcome = outcome.unwrap();
    assert!(outcome.kept.is_some());

    // The truncate saw one snapshot; nothing it did not remove is lost
    let remaining = h.messages.list(&alice, "orders").await.unwrap();
    assert_eq!(remaining.len() as u64, 15 - outcome.removed);
    assert!(remaining.iter().any(|m| Some(m.id) == outcome.kept));
}

#[tokio::test]
async fn test_list_racing_clear_sees_all_or_nothing() {
    let db = TempDb::new();
    let h = Harness::open(&db.url(), DeletePolicy::Retain).await;
    let alice = h.user("alice", "orders").await;
    for t in 1..=30 {
        h.post_at(&alice, "x", t).await;
    }

    let (listed, cleared) = tokio::join!(
        h.messages.list(&alice, "orders"),
        h.messages.clear(&alice, "orders")
    );

    let listed = listed.unwrap().len();
    assert!(listed == 0 || listed == 30, "partial view of {} messages", listed);
    assert_eq!(cleared.unwrap(), 30);
    assert!(h.messages.list(&alice, "orders").await.unwrap().is_empty());
}

/// Answers lookups from the database, then commits a pending rebind before
/// returning, so the caller holds a record that is already stale.
struct RebindAfterLookup {
    inner: Arc<dyn PrincipalRepository>,
    lifecycle: Arc<QueueLifecycleManager>,
    pending: Mutex<Option<Rebinding>>,
}

#[async_trait]
impl PrincipalRepository for RebindAfterLookup {
    async fn insert(&self, principal: &NewPrincipal) -> Result<Principal> {
        self.inner.insert(principal).await
    }

    async fn find_by_id(&self, id: PrincipalId) -> Result<Option<Principal>> {
        let found = self.inner.find_by_id(id).await?;
        let pending = self.pending.lock().unwrap().take();
        if let Some(change) = pending {
            self.lifecycle.rebind(change).await?;
        }
        Ok(found)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>> {
        self.inner.find_by_username(username).await
    }

    async fn find_by_queue(&self, queue: &str) -> Result<Option<Principal>> {
        self.inner.find_by_queue(queue).await
    }

    async fn list_all(&self) -> Result<Vec<Principal>> {
        self.inner.list_all().await
    }

    async fn count(&self) -> Result<i64> {
        self.inner.count().await
    }
}

/// Message service whose first access check is followed by moving alice to "archive"
fn service_rebinding_alice(h: &Harness) -> MessageService {
    let store: Arc<dyn TransactionalStore> = h.store.clone();
    let principals = RebindAfterLookup {
        inner: Arc::new(SqlitePrincipalRepository::new(h.pool.clone())),
        lifecycle: Arc::new(QueueLifecycleManager::new(store.clone(), DeletePolicy::Retain)),
        pending: Mutex::new(Some(Rebinding {
            username: "alice".into(),
            new_queue: Some("archive".into()),
            ..Default::default()
        })),
    };
    MessageService::new(
        Arc::new(AccessGuard::new(Arc::new(principals))),
        h.store.clone(),
        store,
        h.clock.clone(),
    )
}

#[tokio::test]
async fn test_append_after_rebind_is_refused_and_nothing_is_stranded() {
    let h = Harness::in_memory(DeletePolicy::Retain).await;
    let alice = h.user("alice", "orders").await;
    h.post_at(&alice, "before", 1).await;

    let svc = service_rebinding_alice(&h);
    let err = svc
        .append(&alice, "orders", MessageContent::new("during"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    assert_eq!(h.store.count_by_queue("orders").await.unwrap(), 0);
    assert_eq!(h.store.count_by_queue("archive").await.unwrap(), 1);
    assert!(h.registry.overview().await.unwrap().orphaned.is_empty());
}

#[tokio::test]
async fn test_clear_and_truncate_after_rebind_leave_moved_messages_alone() {
    let h = Harness::in_memory(DeletePolicy::Retain).await;
    let alice = h.user("alice", "orders").await;
    for t in 1..=3 {
        h.post_at(&alice, "kept", t).await;
    }

    let err = service_rebinding_alice(&h)
        .clear(&alice, "orders")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(h.store.count_by_queue("archive").await.unwrap(), 3);

    // Move back, then race a truncate against the same rebind
    h.directory
        .update(UpdatePrincipalRequest {
            username: "alice".into(),
            queue: Some("orders".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let err = service_rebinding_alice(&h)
        .truncate(&alice, "orders")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(h.store.count_by_queue("archive").await.unwrap(), 3);
    assert_eq!(h.store.count_by_queue("orders").await.unwrap(), 0);
}
