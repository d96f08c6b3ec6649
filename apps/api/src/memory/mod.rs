//! In-process memory store for finalized resume snapshots.
//!
//! Records live under a namespace `(user_id, kind)` and are insert-only:
//! nothing mutates a stored record, deletion is the only removal path.
//! Contents are lost on restart.

pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Resumes,
}

/// What a snapshot was produced from, plus the document itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPayload {
    /// The job description for builds, `Updated via instruction: ...` for edits.
    pub job_description: String,
    pub resume: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub memory_id: Uuid,
    pub user_id: String,
    pub kind: MemoryKind,
    pub data: MemoryPayload,
    pub created_at: DateTime<Utc>,
}

type Namespace = (String, MemoryKind);

/// Cheap to clone; all clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    // Each namespace keeps records in insertion order, which is also created_at order.
    inner: Arc<RwLock<HashMap<Namespace, Vec<MemoryRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new snapshot and returns it.
    pub async fn put(
        &self,
        user_id: &str,
        kind: MemoryKind,
        job_description: impl Into<String>,
        resume: Value,
    ) -> MemoryRecord {
        let now = Utc::now();
        let record = MemoryRecord {
            memory_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            kind,
            data: MemoryPayload {
                job_description: job_description.into(),
                resume,
                timestamp: now,
            },
            created_at: now,
        };

        self.inner
            .write()
            .await
            .entry((user_id.to_string(), kind))
            .or_default()
            .push(record.clone());

        info!("Stored memory {} for user {user_id}", record.memory_id);
        record
    }

    pub async fn get(&self, user_id: &str, kind: MemoryKind, memory_id: Uuid) -> Option<MemoryRecord> {
        self.inner
            .read()
            .await
            .get(&(user_id.to_string(), kind))
            .and_then(|records| records.iter().find(|r| r.memory_id == memory_id))
            .cloned()
    }

    /// All records in the namespace, oldest first.
    pub async fn list(&self, user_id: &str, kind: MemoryKind) -> Vec<MemoryRecord> {
        self.inner
            .read()
            .await
            .get(&(user_id.to_string(), kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Removes one record. Returns whether anything was removed.
    pub async fn delete(&self, user_id: &str, kind: MemoryKind, memory_id: Uuid) -> bool {
        let mut map = self.inner.write().await;
        let namespace = (user_id.to_string(), kind);

        let Some(records) = map.get_mut(&namespace) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| r.memory_id != memory_id);
        let removed = records.len() < before;

        if records.is_empty() {
            map.remove(&namespace);
        }
        debug!("Delete memory {memory_id} for user {user_id}: removed={removed}");
        removed
    }
}
