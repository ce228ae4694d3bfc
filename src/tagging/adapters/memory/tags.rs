//! In-memory repository for tagging tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::pipeline::domain::ApplicationId;
use crate::tagging::{
    domain::{AppliedTag, Tag, TagAssociation, TagId},
    ports::{TagRepository, TagRepositoryError, TagRepositoryResult},
};
use crate::tenant::CompanyId;

/// Thread-safe in-memory tag repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTagRepository {
    state: Arc<RwLock<InMemoryTagState>>,
}

#[derive(Debug, Default)]
struct InMemoryTagState {
    tags: HashMap<TagId, Tag>,
    label_index: HashMap<(CompanyId, String), TagId>,
    associations: HashMap<(ApplicationId, TagId), TagAssociation>,
}

impl InMemoryTagRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned<T>(err: std::sync::PoisonError<T>) -> TagRepositoryError {
    TagRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn label_key(tag: &Tag) -> (CompanyId, String) {
    (tag.company_id(), tag.label().as_str().to_owned())
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn create_tag(&self, tag: &Tag) -> TagRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let key = label_key(tag);
        if state.label_index.contains_key(&key) {
            return Err(TagRepositoryError::DuplicateLabel {
                company: tag.company_id(),
                label: tag.label().clone(),
            });
        }
        state.label_index.insert(key, tag.id());
        state.tags.insert(tag.id(), tag.clone());
        Ok(())
    }

    async fn update_tag(&self, tag: &Tag) -> TagRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let stored = state
            .tags
            .get(&tag.id())
            .ok_or(TagRepositoryError::UnknownTag(tag.id()))?
            .clone();

        let key = label_key(tag);
        if let Some(holder) = state.label_index.get(&key)
            && *holder != tag.id()
        {
            return Err(TagRepositoryError::DuplicateLabel {
                company: tag.company_id(),
                label: tag.label().clone(),
            });
        }

        state.label_index.remove(&label_key(&stored));
        state.label_index.insert(key, tag.id());
        state.tags.insert(tag.id(), tag.clone());
        Ok(())
    }

    async fn delete_tag(&self, company: CompanyId, tag: TagId) -> TagRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let Some(stored) = state
            .tags
            .get(&tag)
            .filter(|stored| stored.company_id() == company)
            .cloned()
        else {
            return Ok(false);
        };
        state.tags.remove(&tag);
        state.label_index.remove(&label_key(&stored));
        state.associations.retain(|(_, tag_id), _| *tag_id != tag);
        Ok(true)
    }

    async fn find_tag(
        &self,
        company: CompanyId,
        tag: TagId,
    ) -> TagRepositoryResult<Option<Tag>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .tags
            .get(&tag)
            .filter(|stored| stored.company_id() == company)
            .cloned())
    }

    async fn list_tags(&self, company: CompanyId) -> TagRepositoryResult<Vec<Tag>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|tag| tag.company_id() == company)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.label().as_str().cmp(b.label().as_str()));
        Ok(tags)
    }

    async fn attach(
        &self,
        association: &TagAssociation,
    ) -> TagRepositoryResult<TagAssociation> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        let key = (association.application_id(), association.tag_id());
        if let Some(existing) = state.associations.get(&key) {
            return Ok(existing.clone());
        }
        state.associations.insert(key, association.clone());
        Ok(association.clone())
    }

    async fn detach(
        &self,
        application: ApplicationId,
        tag: TagId,
    ) -> TagRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        Ok(state.associations.remove(&(application, tag)).is_some())
    }

    async fn list_for_application(
        &self,
        application: ApplicationId,
    ) -> TagRepositoryResult<Vec<AppliedTag>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut applied: Vec<AppliedTag> = state
            .associations
            .values()
            .filter(|association| association.application_id() == application)
            .filter_map(|association| {
                state
                    .tags
                    .get(&association.tag_id())
                    .map(|tag| AppliedTag::new(association.clone(), tag))
            })
            .collect();
        applied.sort_by(|a, b| b.association.created_at().cmp(&a.association.created_at()));
        Ok(applied)
    }

    async fn associations_for_tag(
        &self,
        tag: TagId,
    ) -> TagRepositoryResult<Vec<TagAssociation>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut associations: Vec<TagAssociation> = state
            .associations
            .values()
            .filter(|association| association.tag_id() == tag)
            .cloned()
            .collect();
        associations.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(associations)
    }
}
