use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use shared::protocol::OrderedRankedItem;
use tracing::{debug, info, warn};

use crate::{
    error::{CurationError, Result},
    ranked_list::{Keyed, RankedItem, RankedList},
};

/// Remote home of a ranked list, e.g. a "replace collection" endpoint.
#[async_trait]
pub trait RankedStore<T: Keyed>: Send + Sync {
    /// Returns the persisted items in rank order.
    async fn load(&self) -> anyhow::Result<Vec<T>>;

    /// Replaces the persisted ranking with `items`.
    async fn save(&self, items: &[OrderedRankedItem<T::Key>]) -> anyhow::Result<()>;
}

struct CollectionState<T> {
    list: RankedList<T>,
    save_in_flight: bool,
}

/// Shared editing handle for a curated list backed by a [`RankedStore`].
///
/// Edits apply to local state immediately, including while a save is in
/// flight. Only one save runs at a time; a save clears the dirty flag only if
/// no edit landed after its snapshot was taken.
pub struct CuratedCollection<T, S> {
    state: Arc<Mutex<CollectionState<T>>>,
    store: Arc<S>,
}

impl<T, S> Clone for CuratedCollection<T, S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T, S> CuratedCollection<T, S>
where
    T: Keyed + Clone + Send + 'static,
    S: RankedStore<T>,
{
    pub fn new(store: S) -> Self {
        Self::with_list(Arc::new(store), RankedList::new())
    }

    pub fn with_list(store: Arc<S>, list: RankedList<T>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CollectionState {
                list,
                save_in_flight: false,
            })),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn add(&self, item: T) -> Result<u32> {
        self.lock().list.add(item)
    }

    pub fn remove(&self, key: &T::Key) -> Result<T> {
        self.lock().list.remove(key)
    }

    pub fn move_item(&self, key: &T::Key, to_index: usize) -> Result<bool> {
        self.lock().list.move_item(key, to_index)
    }

    pub fn is_present(&self, key: &T::Key) -> bool {
        self.lock().list.is_present(key)
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().list.is_dirty()
    }

    pub fn is_saving(&self) -> bool {
        self.lock().save_in_flight
    }

    pub fn len(&self) -> usize {
        self.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().list.is_empty()
    }

    pub fn items(&self) -> Vec<RankedItem<T>> {
        self.lock().list.items().to_vec()
    }

    pub fn snapshot(&self) -> RankedList<T> {
        self.lock().list.clone()
    }

    /// Replaces local state with the store's copy.
    ///
    /// Refused with [`CurationError::UnsavedChanges`] when the list is dirty
    /// or an edit lands while the store is being read, and with
    /// [`CurationError::SaveInProgress`] while a save is in flight.
    pub async fn load(&self) -> Result<usize> {
        self.load_from_store(false).await
    }

    /// Like [`load`](Self::load), but drops unsaved local edits made before
    /// the call. Edits that land while the store is being read still win.
    pub async fn load_discarding(&self) -> Result<usize> {
        self.load_from_store(true).await
    }

    async fn load_from_store(&self, discard_unsaved: bool) -> Result<usize> {
        let revision = {
            let state = self.lock();
            if state.save_in_flight {
                return Err(CurationError::SaveInProgress);
            }
            if state.list.is_dirty() && !discard_unsaved {
                return Err(CurationError::UnsavedChanges);
            }
            state.list.revision()
        };

        let items = RankedStore::<T>::load(self.store.as_ref())
            .await
            .map_err(CurationError::PersistenceFailure)?;
        let list = RankedList::from_items(items)?;
        let len = list.len();

        let mut state = self.lock();
        if state.save_in_flight {
            return Err(CurationError::SaveInProgress);
        }
        if state.list.revision() != revision {
            return Err(CurationError::UnsavedChanges);
        }
        let discarded = state.list.is_dirty();
        state.list = list.succeed(&state.list);
        debug!(items = len, discarded, "loaded ranked list from store");
        Ok(len)
    }

    /// Persists the current ordering through the injected store.
    pub async fn save(&self) -> Result<()> {
        let store = Arc::clone(&self.store);
        self.save_with(move |items| async move {
            RankedStore::<T>::save(store.as_ref(), &items).await
        })
        .await
    }

    /// Persists the current ordering through `persist`.
    ///
    /// Fails with [`CurationError::SaveInProgress`] if another save has not
    /// finished. On failure the items are untouched and the list stays dirty.
    pub async fn save_with<F, Fut>(&self, persist: F) -> Result<()>
    where
        F: FnOnce(Vec<OrderedRankedItem<T::Key>>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let (snapshot, revision, _in_flight) = {
            let mut state = self.lock();
            if state.save_in_flight {
                return Err(CurationError::SaveInProgress);
            }
            state.save_in_flight = true;
            let snapshot = state.list.to_ordered();
            let revision = state.list.revision();
            (snapshot, revision, InFlight { state: &self.state })
        };
        let len = snapshot.len();

        match persist(snapshot).await {
            Ok(()) => {
                let mut state = self.lock();
                if state.list.mark_saved(revision) {
                    info!(items = len, "saved ranked list");
                } else {
                    debug!(
                        items = len,
                        "ranked list changed while saving; keeping it dirty"
                    );
                }
                Ok(())
            }
            Err(error) => {
                warn!(items = len, error = %format!("{error:#}"), "failed to save ranked list");
                self.lock().list.mark_dirty();
                Err(CurationError::PersistenceFailure(error))
            }
        }
    }
}

/// Clears the in-flight flag when a save finishes or its future is dropped.
struct InFlight<'a, T> {
    state: &'a Mutex<CollectionState<T>>,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .save_in_flight = false;
    }
}

#[cfg(test)]
#[path = "tests/collection_tests.rs"]
mod tests;
