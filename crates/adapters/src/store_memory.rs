//! In-memory post store for testing and offline mode

use async_trait::async_trait;
use gentle_post_domain::{
    AttachmentRef, PostContent, PostOrder, PostRecord, PostStore, StoreError,
};
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory post store implementation
///
/// Records are kept in insertion order so equal timestamps list stably.
pub struct InMemoryPostStore {
    posts: RwLock<Vec<PostRecord>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
        }
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut PostRecord),
    {
        let mut posts = self
            .posts
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;
        apply(post);
        Ok(())
    }

    fn collect_ordered<P>(&self, keep: P, order: PostOrder) -> Result<Vec<PostRecord>, StoreError>
    where
        P: Fn(&PostRecord) -> bool,
    {
        let posts = self
            .posts
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut selected: Vec<PostRecord> = posts.iter().filter(|p| keep(p)).cloned().collect();
        selected.sort_by_key(|p| p.created_at);
        if order == PostOrder::Newest {
            selected.reverse();
        }
        Ok(selected)
    }
}

impl Default for InMemoryPostStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert(&self, record: &PostRecord) -> Result<(), StoreError> {
        let mut posts = self
            .posts
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if posts.iter().any(|p| p.id == record.id) {
            return Err(StoreError::Database(format!(
                "Duplicate post id: {}",
                record.id
            )));
        }
        posts.push(record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<PostRecord>, StoreError> {
        let posts = self
            .posts
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn apply_edit(
        &self,
        id: Uuid,
        content: Option<&PostContent>,
        attachment: Option<Option<&AttachmentRef>>,
    ) -> Result<(), StoreError> {
        self.update(id, |post| {
            if let Some(content) = content {
                post.content = content.clone();
            }
            if let Some(attachment) = attachment {
                post.attachment = attachment.cloned();
            }
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut posts = self
            .posts
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let index = posts
            .iter()
            .position(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;
        posts.remove(index);
        Ok(())
    }

    async fn list_by_owner(
        &self,
        owner: &str,
        order: PostOrder,
    ) -> Result<Vec<PostRecord>, StoreError> {
        self.collect_ordered(|p| p.is_owned_by(owner), order)
    }

    async fn list_all(&self, order: PostOrder) -> Result<Vec<PostRecord>, StoreError> {
        self.collect_ordered(|_| true, order)
    }
}
