//! In-memory [`UserStore`] double for tests.
//!
//! Units of work stage writes and apply them on commit, so a dropped unit leaves
//! the map untouched like a rolled-back transaction. [`Fault`]s make the chosen
//! store call fail with a database error.

use super::{StoreError, UnitOfWork, User, UserId, UserStore};
use async_trait::async_trait;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Fault {
    Begin,
    Commit,
    Ping,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MemoryUserStore {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    faults: Arc<Mutex<HashSet<Fault>>>,
    begins: Arc<AtomicUsize>,
    commits: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
}

impl MemoryUserStore {
    pub(crate) fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let store = Self::default();
        store
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(users.into_iter().map(|user| (user.id, user)));
        store
    }

    pub(crate) fn get(&self, id: UserId) -> Option<User> {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Replace or insert a row outside any unit of work.
    pub(crate) fn put(&self, user: User) {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.id, user);
    }

    pub(crate) fn fail(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(fault);
    }

    fn check(&self, fault: Fault) -> Result<(), StoreError> {
        let failing = self
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&fault);
        if failing {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    /// Number of units of work opened so far.
    pub(crate) fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub(crate) fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Units of work currently alive, i.e. holding a "connection".
    pub(crate) fn open_units(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        self.check(Fault::Begin)?;
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryUnitOfWork {
            store: self.clone(),
            staged: Vec::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check(Fault::Ping)
    }
}

struct MemoryUnitOfWork {
    store: MemoryUserStore,
    staged: Vec<User>,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, StoreError> {
        let staged = self.staged.iter().rev().find(|user| user.id == id).cloned();
        Ok(staged.or_else(|| self.store.get(id)))
    }

    async fn save(&mut self, user: &User) -> Result<(), StoreError> {
        self.staged.push(user.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut unit = self;
        unit.store.check(Fault::Commit)?;
        let staged = std::mem::take(&mut unit.staged);
        let mut users = unit
            .store
            .users
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for change in staged {
            if let Some(user) = users.get_mut(&change.id) {
                user.hashed_password = change.hashed_password;
                user.phone_number = change.phone_number;
            }
        }
        drop(users);
        unit.store.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        self.store.open.fetch_sub(1, Ordering::SeqCst);
    }
}
