//! Resume Store — owns the stored resume list and the single active-resume
//! pointer.
//!
//! Invariant: the active pointer is always either null or the id of an
//! existing entry, checked on every mutation before commit. Because the
//! backing store is reached across await points, every mutation re-reads
//! state, validates its precondition against that fresh snapshot, and commits
//! list + pointer in a single adapter write.

use serde_json::Value;
use tracing::{debug, info};

use crate::errors::EngineError;
use crate::models::resume::{ResumeEntry, ResumeProfile};
use crate::storage::{Storage, StorageKey};

#[derive(Clone)]
pub struct ResumeStore {
    storage: Storage,
}

impl ResumeStore {
    pub fn new(storage: Storage) -> Self {
        ResumeStore { storage }
    }

    /// All stored resumes in insertion order.
    pub async fn list(&self) -> Result<Vec<ResumeEntry>, EngineError> {
        Ok(self
            .storage
            .read::<Vec<ResumeEntry>>(StorageKey::Resumes)
            .await?
            .unwrap_or_default())
    }

    /// The active entry, or `None` when no resume is selected.
    /// Side-effect-free; a dangling pointer in stored state is corruption and
    /// reported as a validation error rather than silently repaired.
    pub async fn get_active(&self) -> Result<Option<ResumeEntry>, EngineError> {
        let (entries, active_id) = self.load().await?;
        match active_id {
            None => Ok(None),
            Some(id) => entries
                .into_iter()
                .find(|e| e.id == id)
                .map(Some)
                .ok_or_else(|| {
                    EngineError::Validation(format!(
                        "active resume id '{id}' references no stored entry"
                    ))
                }),
        }
    }

    /// Appends a resume, preserving insertion order. The first resume ever
    /// added becomes active automatically.
    pub async fn add_resume(&self, entry: ResumeEntry) -> Result<(), EngineError> {
        let (mut entries, active_id) = self.load().await?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(EngineError::DuplicateId(entry.id));
        }

        info!("adding resume '{}' ({})", entry.name, entry.id);
        let active_id = active_id.or_else(|| Some(entry.id.clone()));
        entries.push(entry);
        self.commit(entries, active_id).await
    }

    /// Removes a resume. If it was active, the most-recently-added remaining
    /// resume becomes active, or the pointer clears when none remain.
    pub async fn remove_resume(&self, id: &str) -> Result<(), EngineError> {
        let (mut entries, mut active_id) = self.load().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(EngineError::NotFound(format!("resume '{id}'")));
        }

        if active_id.as_deref() == Some(id) {
            active_id = entries.last().map(|e| e.id.clone());
            debug!("active resume removed, reassigning to {:?}", active_id);
        }
        self.commit(entries, active_id).await
    }

    /// Repoints the active selection. `None` (no active resume) is always
    /// permitted; a concrete id must reference a stored entry.
    pub async fn set_active(&self, id: Option<&str>) -> Result<(), EngineError> {
        let (entries, _) = self.load().await?;
        if let Some(id) = id {
            if !entries.iter().any(|e| e.id == id) {
                return Err(EngineError::NotFound(format!("resume '{id}'")));
            }
        }
        self.commit(entries, id.map(str::to_owned)).await
    }

    /// Replaces the structured profile on an entry, last-write-wins.
    pub async fn attach_profile(
        &self,
        id: &str,
        profile: ResumeProfile,
    ) -> Result<(), EngineError> {
        let (mut entries, active_id) = self.load().await?;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("resume '{id}'")))?;
        entry.profile = Some(profile);
        self.commit(entries, active_id).await
    }

    async fn load(&self) -> Result<(Vec<ResumeEntry>, Option<String>), EngineError> {
        let entries = self.list().await?;
        let active_id = self
            .storage
            .read::<String>(StorageKey::ActiveResumeId)
            .await?;
        Ok((entries, active_id))
    }

    /// Commits list and pointer as one write after the invariant check.
    async fn commit(
        &self,
        entries: Vec<ResumeEntry>,
        active_id: Option<String>,
    ) -> Result<(), EngineError> {
        if let Some(id) = &active_id {
            // A dangling pointer here is a bug in this module, not user input.
            debug_assert!(entries.iter().any(|e| &e.id == id));
            if !entries.iter().any(|e| &e.id == id) {
                return Err(EngineError::Validation(format!(
                    "refusing to commit dangling active resume id '{id}'"
                )));
            }
        }

        let encoded_entries = serde_json::to_value(&entries)
            .map_err(|e| EngineError::Validation(format!("cannot encode resume list: {e}")))?;
        let encoded_active = match &active_id {
            Some(id) => Value::String(id.clone()),
            None => Value::Null,
        };
        self.storage
            .write_many(vec![
                (StorageKey::Resumes, encoded_entries),
                (StorageKey::ActiveResumeId, encoded_active),
            ])
            .await
    }
}
