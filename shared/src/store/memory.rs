//! In-memory store used by tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountDirectory, EventStore, MembershipStore};
use crate::models::{Account, Event, EventFields, EventMember, NewEvent};
use crate::Result;

#[derive(Default)]
struct Tables {
    accounts: Vec<Account>,
    managers: HashMap<Uuid, Uuid>,
    engineers: HashMap<Uuid, Uuid>,
    events: Vec<Event>,
    members: Vec<EventMember>,
}

/// Implements every repository trait over vectors behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_account(&self, account: Account) {
        self.tables.write().await.accounts.push(account);
    }

    /// Register a manager record whose admin account is `admin_id`.
    pub async fn insert_manager(&self, manager_id: Uuid, admin_id: Uuid) {
        self.tables.write().await.managers.insert(manager_id, admin_id);
    }

    /// Register a project engineer record whose admin account is `admin_id`.
    pub async fn insert_engineer(&self, engineer_id: Uuid, admin_id: Uuid) {
        self.tables.write().await.engineers.insert(engineer_id, admin_id);
    }
}

fn sorted_by_start(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by_key(|e| (e.start_time, e.created_at));
    events
}

fn build_event(new: &NewEvent) -> Event {
    Event {
        id: Uuid::new_v4(),
        owner_id: new.owner_id,
        title: new.fields.title.clone(),
        description: new.fields.description.clone(),
        start_time: new.fields.start_time,
        end_time: new.fields.end_time,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn all_events(&self, owner: Uuid) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_start(
            tables.events.iter().filter(|e| e.owner_id == owner).cloned().collect(),
        ))
    }

    async fn running_events(&self, owner: Uuid, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_start(
            tables
                .events
                .iter()
                .filter(|e| e.owner_id == owner && e.is_running(now))
                .cloned()
                .collect(),
        ))
    }

    async fn latest_events(&self, owner: Uuid, limit: i64) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        // Insertion order stands in for the serial id.
        Ok(tables
            .events
            .iter()
            .rev()
            .filter(|e| e.owner_id == owner)
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn count_events(&self, owner: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.events.iter().filter(|e| e.owner_id == owner).count() as i64)
    }

    async fn events_between(
        &self,
        owner: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_start(
            tables
                .events
                .iter()
                .filter(|e| e.owner_id == owner && e.start_time >= from && e.start_time < to)
                .cloned()
                .collect(),
        ))
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let tables = self.tables.read().await;
        Ok(tables.events.iter().find(|e| e.id == id).cloned())
    }

    async fn get_or_create_event(&self, new: &NewEvent) -> Result<(Event, bool)> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.events.iter().find(|e| e.to_new() == *new) {
            return Ok((existing.clone(), false));
        }
        let event = build_event(new);
        tables.events.push(event.clone());
        Ok((event, true))
    }

    async fn insert_event(&self, new: &NewEvent) -> Result<Event> {
        let event = build_event(new);
        self.tables.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, fields: &EventFields) -> Result<Option<Event>> {
        let mut tables = self.tables.write().await;
        Ok(tables.events.iter_mut().find(|e| e.id == id).map(|event| {
            event.title = fields.title.clone();
            event.description = fields.description.clone();
            event.start_time = fields.start_time;
            event.end_time = fields.end_time;
            event.clone()
        }))
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        if tables.events.len() == before {
            return Ok(false);
        }
        tables.members.retain(|m| m.event_id != id);
        Ok(true)
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn members_of(&self, event_id: Uuid) -> Result<Vec<EventMember>> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn count_members(&self, event_id: Uuid) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.members.iter().filter(|m| m.event_id == event_id).count() as i64)
    }

    async fn add_member(&self, event_id: Uuid, account_id: Uuid) -> Result<EventMember> {
        let member = EventMember {
            id: Uuid::new_v4(),
            event_id,
            account_id,
            created_at: Utc::now(),
        };
        self.tables.write().await.members.push(member.clone());
        Ok(member)
    }

    async fn remove_member(&self, member_id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.members.len();
        tables.members.retain(|m| m.id != member_id);
        Ok(tables.members.len() != before)
    }
}

#[async_trait]
impl AccountDirectory for MemoryStore {
    async fn account(&self, id: Uuid) -> Result<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn account_by_subject(&self, cognito_sub: &str) -> Result<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .iter()
            .find(|a| a.cognito_sub == cognito_sub)
            .cloned())
    }

    async fn manager_admin(&self, manager_id: Uuid) -> Result<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .managers
            .get(&manager_id)
            .and_then(|admin| tables.accounts.iter().find(|a| a.id == *admin))
            .cloned())
    }

    async fn engineer_admin(&self, engineer_id: Uuid) -> Result<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .engineers
            .get(&engineer_id)
            .and_then(|admin| tables.accounts.iter().find(|a| a.id == *admin))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_event(owner: Uuid, title: &str, start: DateTime<Utc>) -> NewEvent {
        NewEvent {
            owner_id: owner,
            fields: EventFields {
                title: title.to_string(),
                description: String::new(),
                start_time: start,
                end_time: start + Duration::hours(1),
            },
        }
    }

    #[tokio::test]
    async fn test_get_or_create_dedupes_identical_events() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let new = new_event(owner, "Retro", Utc.with_ymd_and_hms(2024, 5, 3, 14, 0, 0).unwrap());

        let (first, created) = store.get_or_create_event(&new).await.unwrap();
        assert!(created);
        let (second, created) = store.get_or_create_event(&new).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);

        let other_owner = NewEvent { owner_id: Uuid::new_v4(), ..new.clone() };
        let (_, created) = store.get_or_create_event(&other_owner).await.unwrap();
        assert!(created);
        assert_eq!(store.count_events(owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_running_and_between_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let start = Utc.with_ymd_and_hms(2024, 5, 3, 14, 0, 0).unwrap();
        store.insert_event(&new_event(owner, "Mine", start)).await.unwrap();
        store
            .insert_event(&new_event(Uuid::new_v4(), "Theirs", start))
            .await
            .unwrap();

        let now = start + Duration::minutes(30);
        let running = store.running_events(owner, now).await.unwrap();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].title, "Mine");
        assert!(store
            .running_events(owner, start + Duration::hours(2))
            .await
            .unwrap()
            .is_empty());

        let in_may = store
            .events_between(
                owner,
                Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(in_may.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_event_cascades_members() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let event = store
            .insert_event(&new_event(owner, "Launch", Utc::now()))
            .await
            .unwrap();
        store.add_member(event.id, Uuid::new_v4()).await.unwrap();

        assert!(store.delete_event(event.id).await.unwrap());
        assert_eq!(store.count_members(event.id).await.unwrap(), 0);
        assert!(!store.delete_event(event.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_latest_events_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        for title in ["a", "b", "c"] {
            store.insert_event(&new_event(owner, title, Utc::now())).await.unwrap();
        }
        let latest = store.latest_events(owner, 2).await.unwrap();
        let titles: Vec<&str> = latest.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b"]);
    }
}
