//! Event operations behind the calendar endpoints.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::forms::EventForm;
use crate::models::{Account, Event, EventMember, EventView, NewEvent};
use crate::month::{self, MonthGrid};
use crate::store::{AccountDirectory, EventStore, MembershipStore};
use crate::{Error, Result};

/// Number of entries in the dashboard's "latest events" list.
pub const LATEST_EVENTS: i64 = 10;

/// Listing payload for the calendar widget.
#[derive(Debug, Serialize)]
pub struct EventListing {
    pub name: String,
    pub events: Vec<EventView>,
    pub running_events: Vec<EventView>,
}

pub async fn list_events(
    store: &dyn EventStore,
    acting: &Account,
    now: DateTime<Utc>,
) -> Result<EventListing> {
    let events = store.all_events(acting.id).await?;
    let running = store.running_events(acting.id, now).await?;
    Ok(EventListing {
        name: acting.name().to_string(),
        events: events.iter().map(EventView::from).collect(),
        running_events: running.iter().map(EventView::from).collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_events: i64,
    pub running_events: Vec<EventView>,
    pub latest_events: Vec<EventView>,
}

pub async fn dashboard(
    store: &dyn EventStore,
    account: &Account,
    now: DateTime<Utc>,
) -> Result<Dashboard> {
    let total_events = store.count_events(account.id).await?;
    let running = store.running_events(account.id, now).await?;
    let latest = store.latest_events(account.id, LATEST_EVENTS).await?;
    Ok(Dashboard {
        total_events,
        running_events: running.iter().map(EventView::from).collect(),
        latest_events: latest.iter().map(EventView::from).collect(),
    })
}

/// Month view payload: the grid plus the query fragments for the neighbour links.
///
/// A link is `None` when the neighbouring month is outside the supported years.
#[derive(Debug, Serialize)]
pub struct MonthView {
    pub calendar: MonthGrid,
    pub prev_month: Option<String>,
    pub next_month: Option<String>,
}

pub async fn month_view(
    store: &dyn EventStore,
    account: &Account,
    anchor: NaiveDate,
) -> Result<MonthView> {
    let (from, to) = month::month_bounds(anchor)
        .ok_or_else(|| Error::MalformedMonth(format!("{}-{}", anchor.year(), anchor.month())))?;
    let events = store.events_between(account.id, from, to).await?;
    Ok(MonthView {
        calendar: month::month_grid(anchor, &events),
        prev_month: month::previous_month_param(anchor),
        next_month: month::next_month_param(anchor),
    })
}

/// Validate `form` and get-or-create the event for `acting`.
pub async fn create_event(
    store: &dyn EventStore,
    acting: &Account,
    form: EventForm,
) -> Result<(Event, bool)> {
    let new = NewEvent {
        owner_id: acting.id,
        fields: form.into_fields()?,
    };
    let (event, created) = store.get_or_create_event(&new).await?;
    if created {
        info!(event_id = %event.id, owner = %acting.id, "Created event");
    }
    Ok((event, created))
}

pub async fn update_event(store: &dyn EventStore, id: Uuid, form: EventForm) -> Result<Event> {
    let fields = form.into_fields()?;
    let event = store
        .update_event(id, &fields)
        .await?
        .ok_or_else(|| event_not_found(id))?;
    info!(event_id = %id, "Updated event");
    Ok(event)
}

pub async fn get_event(store: &dyn EventStore, id: Uuid) -> Result<Event> {
    store.get_event(id).await?.ok_or_else(|| event_not_found(id))
}

pub async fn delete_event(store: &dyn EventStore, id: Uuid) -> Result<()> {
    if !store.delete_event(id).await? {
        return Err(event_not_found(id));
    }
    info!(event_id = %id, "Deleted event");
    Ok(())
}

fn event_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Event {}", id))
}

/// Offset applied when duplicating an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    NextDay,
    NextWeek,
}

impl Shift {
    pub fn offset(self) -> Duration {
        match self {
            Shift::NextDay => Duration::days(1),
            Shift::NextWeek => Duration::days(7),
        }
    }
}

/// Persist a copy of `source` shifted by `shift`. The source is not modified.
pub async fn duplicate(store: &dyn EventStore, source: &Event, shift: Shift) -> Result<Event> {
    let mut copy = source.to_new();
    copy.fields.start_time += shift.offset();
    copy.fields.end_time += shift.offset();
    let event = store.insert_event(&copy).await?;
    info!(source = %source.id, copy = %event.id, ?shift, "Duplicated event");
    Ok(event)
}

/// Look up `id` and duplicate it.
pub async fn duplicate_event(store: &dyn EventStore, id: Uuid, shift: Shift) -> Result<Event> {
    let source = get_event(store, id).await?;
    duplicate(store, &source, shift).await
}

#[derive(Debug, Serialize)]
pub struct EventDetails {
    pub event: EventView,
    pub members: Vec<EventMember>,
}

pub async fn event_details(
    store: &dyn EventStore,
    members: &dyn MembershipStore,
    id: Uuid,
) -> Result<EventDetails> {
    let event = get_event(store, id).await?;
    let members = members.members_of(id).await?;
    Ok(EventDetails {
        event: EventView::from(&event),
        members,
    })
}

/// Add `account_id` to the event unless it already holds `limit` members.
///
/// The count and the insert are separate statements, so concurrent calls
/// can overshoot the limit.
pub async fn add_member(
    store: &dyn EventStore,
    members: &dyn MembershipStore,
    accounts: &dyn AccountDirectory,
    event_id: Uuid,
    account_id: Uuid,
    limit: usize,
) -> Result<EventMember> {
    let event = get_event(store, event_id).await?;
    if accounts.account(account_id).await?.is_none() {
        return Err(Error::NotFound(format!("Account {}", account_id)));
    }

    let count = members.count_members(event.id).await?;
    if count >= limit as i64 {
        warn!(event_id = %event.id, count, limit, "Member limit exceeded");
        return Err(Error::MemberLimitExceeded {
            event_id: event.id,
            limit,
        });
    }

    let member = members.add_member(event.id, account_id).await?;
    info!(event_id = %event.id, member_id = %member.id, "Added event member");
    Ok(member)
}

pub async fn remove_member(members: &dyn MembershipStore, member_id: Uuid) -> Result<()> {
    if !members.remove_member(member_id).await? {
        return Err(Error::NotFound(format!("Event member {}", member_id)));
    }
    info!(member_id = %member_id, "Removed event member");
    Ok(())
}
