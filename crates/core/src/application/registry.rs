// Queue Registry - derived, read-only view over the Identity Directory

use crate::domain::{Principal, QueueSummary};
use crate::error::Result;
use crate::port::{MessageRepository, PrincipalRepository};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything the management overview shows
#[derive(Debug, Clone, Serialize)]
pub struct QueueOverview {
    pub administrators: Vec<Principal>,
    /// Queues bound to a principal, with message counts
    pub queues: Vec<QueueSummary>,
    /// Queues holding messages but bound to nobody
    pub orphaned: Vec<QueueSummary>,
}

pub struct QueueRegistry {
    principals: Arc<dyn PrincipalRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl QueueRegistry {
    pub fn new(
        principals: Arc<dyn PrincipalRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            principals,
            messages,
        }
    }

    /// Principal bound to `queue`; the empty name never has an owner
    pub async fn owner_of(&self, queue: &str) -> Result<Option<Principal>> {
        if queue.is_empty() {
            return Ok(None);
        }
        self.principals.find_by_queue(queue).await
    }

    pub fn is_admin(principal: &Principal) -> bool {
        principal.is_admin()
    }

    /// Recomputed on every call, nothing is cached
    pub async fn overview(&self) -> Result<QueueOverview> {
        let principals = self.principals.list_all().await?;
        let mut counts: HashMap<String, i64> =
            self.messages.counts_by_queue().await?.into_iter().collect();

        let mut administrators = Vec::new();
        let mut queues = Vec::new();

        for principal in principals {
            if principal.is_admin() {
                administrators.push(principal);
                continue;
            }
            let message_count = counts.remove(&principal.queue).unwrap_or(0);
            queues.push(QueueSummary {
                queue: principal.queue,
                owner: Some(principal.username),
                message_count,
            });
        }

        // Whatever is left has no owner
        let mut orphaned: Vec<QueueSummary> = counts
            .into_iter()
            .map(|(queue, message_count)| QueueSummary {
                queue,
                owner: None,
                message_count,
            })
            .collect();
        orphaned.sort_by(|a, b| a.queue.cmp(&b.queue));

        Ok(QueueOverview {
            administrators,
            queues,
            orphaned,
        })
    }
}
