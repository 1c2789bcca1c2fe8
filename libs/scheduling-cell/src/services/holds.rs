use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

/// How long a selected slot stays reserved for its draft before others may
/// take it again.
pub const HOLD_TTL_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub dentiste_id: i64,
    pub date: NaiveDate,
    pub heure: String,
}

#[derive(Debug, Clone)]
struct SlotHold {
    owner: Uuid,
    expires_at: DateTime<Utc>,
}

/// In-process, TTL-bounded slot reservations. Selecting a slot in a draft
/// holds it against other drafts until submission, release or expiry. This
/// narrows the double-booking window within one instance; the backend's
/// create call remains the authority on true conflicts.
#[derive(Debug, Default)]
pub struct HoldStore {
    inner: RwLock<HashMap<SlotKey, SlotHold>>,
}

impl HoldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to hold `key` for `owner`. Re-acquiring one's own hold
    /// refreshes its expiry; a live hold by anyone else wins.
    pub fn acquire(&self, key: SlotKey, owner: Uuid) -> bool {
        self.acquire_until(key, owner, Utc::now() + Duration::minutes(HOLD_TTL_MINUTES))
    }

    pub fn acquire_until(&self, key: SlotKey, owner: Uuid, expires_at: DateTime<Utc>) -> bool {
        let now = Utc::now();
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, hold| hold.expires_at > now);

        if let Some(existing) = map.get(&key) {
            if existing.owner != owner {
                debug!("Slot {:?} already held by another draft", key);
                return false;
            }
        }

        map.insert(key, SlotHold { owner, expires_at });
        true
    }

    /// Release one hold, if `owner` still owns it.
    pub fn release(&self, key: &SlotKey, owner: Uuid) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if map.get(key).map(|hold| hold.owner) == Some(owner) {
            map.remove(key);
        }
    }

    /// Drop every hold belonging to `owner` (draft abandoned or reset).
    pub fn release_owner(&self, owner: Uuid) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, hold| hold.owner != owner);
    }

    /// Times currently held for (dentist, date) by drafts other than
    /// `exclude`. Expired holds are purged on the way.
    pub fn held_times(
        &self,
        dentiste_id: i64,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> HashSet<String> {
        let now = Utc::now();
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.retain(|_, hold| hold.expires_at > now);

        map.iter()
            .filter(|(key, hold)| {
                key.dentiste_id == dentiste_id
                    && key.date == date
                    && Some(hold.owner) != exclude
            })
            .map(|(key, _)| key.heure.clone())
            .collect()
    }
}
