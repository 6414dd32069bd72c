//! Conversation-keyed store of in-progress carts.
//!
//! Entries expire after `ttl` of inactivity. Expired entries read as absent
//! and are dropped lazily on access or in bulk by [`SessionStore::purge_expired`].

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::cart::{Cart, ConversationId};

struct SessionEntry {
    cart: Cart,
    touched_at: Instant,
}

pub struct SessionStore {
    carts: RwLock<HashMap<ConversationId, SessionEntry>>,
    ttl: Option<Duration>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore {
    /// `ttl = None` keeps carts for the life of the process.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self { carts: RwLock::new(HashMap::new()), ttl }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub async fn get(&self, id: &ConversationId) -> Option<Cart> {
        let mut carts = self.carts.write().await;
        let now = Instant::now();
        match carts.get_mut(id) {
            Some(entry) if !self.is_expired(entry, now) => {
                entry.touched_at = now;
                Some(entry.cart.clone())
            }
            Some(_) => {
                carts.remove(id);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, id: ConversationId, cart: Cart) {
        let mut carts = self.carts.write().await;
        carts.insert(id, SessionEntry { cart, touched_at: Instant::now() });
    }

    pub async fn remove(&self, id: &ConversationId) -> Option<Cart> {
        let mut carts = self.carts.write().await;
        let now = Instant::now();
        carts.remove(id).filter(|entry| !self.is_expired(entry, now)).map(|entry| entry.cart)
    }

    /// Runs `apply` against the live cart slot for `id` under a single write guard.
    ///
    /// The slot is `None` when no live cart exists. Whatever the slot holds after
    /// `apply` returns is stored back; leaving it `None` keeps the conversation
    /// without a cart.
    pub async fn modify<R>(
        &self,
        id: &ConversationId,
        apply: impl FnOnce(&mut Option<Cart>) -> R,
    ) -> R {
        let mut carts = self.carts.write().await;
        let now = Instant::now();
        let mut slot = carts
            .remove(id)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| entry.cart);

        let result = apply(&mut slot);

        if let Some(cart) = slot {
            carts.insert(id.clone(), SessionEntry { cart, touched_at: now });
        }
        result
    }

    /// Drops every expired cart and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let mut carts = self.carts.write().await;
        let now = Instant::now();
        let before = carts.len();
        carts.retain(|_, entry| !self.is_expired(entry, now));
        before - carts.len()
    }

    pub async fn clear(&self) {
        self.carts.write().await.clear();
    }

    /// Number of carts that have not expired.
    pub async fn len(&self) -> usize {
        let carts = self.carts.read().await;
        let now = Instant::now();
        carts.values().filter(|entry| !self.is_expired(entry, now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| now.duration_since(entry.touched_at) >= ttl)
    }
}
