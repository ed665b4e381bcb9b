//! Repository contracts for events, memberships and accounts.
//!
//! Handlers hold these behind `Arc<dyn ...>` so the Postgres implementation
//! can be swapped for [`MemoryStore`] in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Account, Event, EventFields, EventMember, NewEvent};
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Every event owned by `owner`, ordered by start time.
    async fn all_events(&self, owner: Uuid) -> Result<Vec<Event>>;

    /// Events of `owner` with `start_time <= now <= end_time`.
    async fn running_events(&self, owner: Uuid, now: DateTime<Utc>) -> Result<Vec<Event>>;

    /// The `limit` most recently created events of `owner`, newest first.
    async fn latest_events(&self, owner: Uuid, limit: i64) -> Result<Vec<Event>>;

    async fn count_events(&self, owner: Uuid) -> Result<i64>;

    /// Events of `owner` starting in `[from, to)`.
    async fn events_between(
        &self,
        owner: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>>;

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>>;

    /// Returns the existing event with identical owner, title, description,
    /// start and end, or inserts one. The flag is true when inserted.
    async fn get_or_create_event(&self, new: &NewEvent) -> Result<(Event, bool)>;

    /// Always inserts a new record.
    async fn insert_event(&self, new: &NewEvent) -> Result<Event>;

    async fn update_event(&self, id: Uuid, fields: &EventFields) -> Result<Option<Event>>;

    /// Deletes the event and its members. False when nothing was deleted.
    async fn delete_event(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn members_of(&self, event_id: Uuid) -> Result<Vec<EventMember>>;

    async fn count_members(&self, event_id: Uuid) -> Result<i64>;

    async fn add_member(&self, event_id: Uuid, account_id: Uuid) -> Result<EventMember>;

    async fn remove_member(&self, member_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn account(&self, id: Uuid) -> Result<Option<Account>>;

    async fn account_by_subject(&self, cognito_sub: &str) -> Result<Option<Account>>;

    /// The admin account linked to a manager record.
    async fn manager_admin(&self, manager_id: Uuid) -> Result<Option<Account>>;

    /// The admin account linked to a project engineer record.
    async fn engineer_admin(&self, engineer_id: Uuid) -> Result<Option<Account>>;
}
