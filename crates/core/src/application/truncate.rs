// Truncation Engine
//
// Reduces a queue to its single newest message. The plan is computed in one
// pass over the queue in arrival order; the caller applies it inside the same
// write transaction it read the queue in.

use crate::domain::{Message, MessageId};

/// Outcome of planning a truncation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TruncationPlan {
    /// Surviving message, `None` for an empty queue
    pub keep: Option<MessageId>,
    /// Every other message of the queue
    pub delete: Vec<MessageId>,
}

/// Plan a truncation over `messages` (one queue, any order).
///
/// Tracks a single "newest so far" candidate. A message that is not newer
/// than the candidate is marked for deletion; a strictly newer one pushes the
/// previous candidate into the deletion set and takes its place. Newer means
/// greater `created_at`, ties broken by greater id.
pub fn plan_truncation(messages: &[Message]) -> TruncationPlan {
    let mut newest: Option<&Message> = None;
    let mut delete = Vec::with_capacity(messages.len().saturating_sub(1));

    for message in messages {
        match newest {
            None => newest = Some(message),
            Some(candidate) if message.is_newer_than(candidate) => {
                delete.push(candidate.id);
                newest = Some(message);
            }
            Some(_) => delete.push(message.id),
        }
    }

    TruncationPlan {
        keep: newest.map(|m| m.id),
        delete,
    }
}
