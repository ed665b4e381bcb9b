//! Postgres-backed repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountDirectory, EventStore, MembershipStore};
use crate::models::{Account, Event, EventFields, EventMember, NewEvent};
use crate::Result;

const EVENT_COLUMNS: &str =
    "id, owner_id, title, description, start_time, end_time, created_at";

const ACCOUNT_COLUMNS: &str = "a.id, a.cognito_sub, a.email, a.display_name";

/// Implements every repository trait over one connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn all_events(&self, owner: Uuid) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE owner_id = $1 ORDER BY start_time, created_at",
            EVENT_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn running_events(&self, owner: Uuid, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {} FROM events
            WHERE owner_id = $1 AND start_time <= $2 AND end_time >= $2
            ORDER BY start_time
            "#,
            EVENT_COLUMNS
        ))
        .bind(owner)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn latest_events(&self, owner: Uuid, limit: i64) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE owner_id = $1 ORDER BY created_at DESC LIMIT $2",
            EVENT_COLUMNS
        ))
        .bind(owner)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn count_events(&self, owner: Uuid) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE owner_id = $1")
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn events_between(
        &self,
        owner: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {} FROM events
            WHERE owner_id = $1 AND start_time >= $2 AND start_time < $3
            ORDER BY start_time
            "#,
            EVENT_COLUMNS
        ))
        .bind(owner)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn get_or_create_event(&self, new: &NewEvent) -> Result<(Event, bool)> {
        let existing = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {} FROM events
            WHERE owner_id = $1 AND title = $2 AND description = $3
              AND start_time = $4 AND end_time = $5
            LIMIT 1
            "#,
            EVENT_COLUMNS
        ))
        .bind(new.owner_id)
        .bind(&new.fields.title)
        .bind(&new.fields.description)
        .bind(new.fields.start_time)
        .bind(new.fields.end_time)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(event) => Ok((event, false)),
            None => Ok((self.insert_event(new).await?, true)),
        }
    }

    async fn insert_event(&self, new: &NewEvent) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (id, owner_id, title, description, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new.owner_id)
        .bind(&new.fields.title)
        .bind(&new.fields.description)
        .bind(new.fields.start_time)
        .bind(new.fields.end_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(event)
    }

    async fn update_event(&self, id: Uuid, fields: &EventFields) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET title = $2, description = $3, start_time = $4, end_time = $5
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        // event_members rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn members_of(&self, event_id: Uuid) -> Result<Vec<EventMember>> {
        let members = sqlx::query_as::<_, EventMember>(
            r#"
            SELECT id, event_id, account_id, created_at
            FROM event_members
            WHERE event_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn count_members(&self, event_id: Uuid) -> Result<i64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM event_members WHERE event_id = $1")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(total)
    }

    async fn add_member(&self, event_id: Uuid, account_id: Uuid) -> Result<EventMember> {
        let member = sqlx::query_as::<_, EventMember>(
            r#"
            INSERT INTO event_members (id, event_id, account_id)
            VALUES ($1, $2, $3)
            RETURNING id, event_id, account_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(member)
    }

    async fn remove_member(&self, member_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM event_members WHERE id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AccountDirectory for PgStore {
    async fn account(&self, id: Uuid) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts a WHERE a.id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn account_by_subject(&self, cognito_sub: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM accounts a WHERE a.cognito_sub = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(cognito_sub)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn manager_admin(&self, manager_id: Uuid) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM managers m JOIN accounts a ON a.id = m.admin_id WHERE m.id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(manager_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn engineer_admin(&self, engineer_id: Uuid) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {} FROM project_engineers e JOIN accounts a ON a.id = e.admin_id WHERE e.id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(engineer_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }
}
