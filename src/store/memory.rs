//! # Work Store
//!
//! Transactional persistence of works.
//!
//! ## Atomicity
//! A mutation runs against a private copy of the stored work while the
//! write lock is held. The copy replaces the stored work only if the
//! mutation succeeds, so a transition and its side effects land together
//! or not at all, and concurrent mutations of one store serialize.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::errors::{CoreError, CoreResult};
use crate::ids::WorkId;
use crate::resource::Work;

/// A mutation applied inside a store transaction.
pub type WorkMutation<'a> = dyn FnMut(&mut Work) -> CoreResult<()> + 'a;

/// Storage seam for works.
pub trait WorkStore: Send + Sync {
    /// Insert a new work. Fails if the id is taken.
    fn insert(&self, work: Work) -> CoreResult<()>;

    fn get(&self, id: WorkId) -> CoreResult<Work>;

    fn ids(&self) -> CoreResult<Vec<WorkId>>;

    /// Run `mutation` atomically and return the committed work.
    fn update(&self, id: WorkId, mutation: &mut WorkMutation<'_>) -> CoreResult<Work>;

    /// Delete the work if `guard` approves it, atomically.
    fn delete(&self, id: WorkId, guard: &dyn Fn(&Work) -> CoreResult<()>) -> CoreResult<Work>;
}

impl dyn WorkStore + '_ {
    /// Typed wrapper over [`WorkStore::update`] returning the mutation's
    /// value alongside the committed work.
    pub fn transact<T, F>(&self, id: WorkId, f: F) -> CoreResult<(T, Work)>
    where
        F: FnOnce(&mut Work) -> CoreResult<T>,
    {
        let mut f = Some(f);
        let mut out = None;
        let work = self.update(id, &mut |work| {
            let f = f
                .take()
                .ok_or_else(|| CoreError::StorageError("mutation invoked twice".into()))?;
            out = Some(f(work)?);
            Ok(())
        })?;
        let value = out.ok_or_else(|| CoreError::StorageError("mutation not invoked".into()))?;
        Ok((value, work))
    }
}

/// In-memory work store
#[derive(Debug, Default)]
pub struct InMemoryWorkStore {
    works: RwLock<BTreeMap<WorkId, Work>>,
}

impl InMemoryWorkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.works.read().map(|w| w.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WorkStore for InMemoryWorkStore {
    fn insert(&self, work: Work) -> CoreResult<()> {
        let mut works = self.works.write().map_err(|_| CoreError::poisoned("work store"))?;
        if works.contains_key(&work.id()) {
            return Err(CoreError::constraint(format!("work {} already exists", work.id())));
        }
        works.insert(work.id(), work);
        Ok(())
    }

    fn get(&self, id: WorkId) -> CoreResult<Work> {
        let works = self.works.read().map_err(|_| CoreError::poisoned("work store"))?;
        works.get(&id).cloned().ok_or(CoreError::WorkNotFound(id))
    }

    fn ids(&self) -> CoreResult<Vec<WorkId>> {
        let works = self.works.read().map_err(|_| CoreError::poisoned("work store"))?;
        Ok(works.keys().copied().collect())
    }

    fn update(&self, id: WorkId, mutation: &mut WorkMutation<'_>) -> CoreResult<Work> {
        let mut works = self.works.write().map_err(|_| CoreError::poisoned("work store"))?;
        let stored = works.get_mut(&id).ok_or(CoreError::WorkNotFound(id))?;

        let mut scratch = stored.clone();
        mutation(&mut scratch)?;
        *stored = scratch.clone();
        Ok(scratch)
    }

    fn delete(&self, id: WorkId, guard: &dyn Fn(&Work) -> CoreResult<()>) -> CoreResult<Work> {
        let mut works = self.works.write().map_err(|_| CoreError::poisoned("work store"))?;
        let stored = works.get(&id).ok_or(CoreError::WorkNotFound(id))?;
        guard(stored)?;
        works.remove(&id).ok_or(CoreError::WorkNotFound(id))
    }
}
