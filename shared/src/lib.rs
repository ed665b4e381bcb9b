//! Shared library for the calendar Lambda functions.
//!
//! This crate provides the event domain, its repositories and the helpers
//! used by the API Gateway handlers.

pub mod acting;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod forms;
pub mod http;
pub mod models;
pub mod month;
pub mod secrets;
pub mod store;

pub use acting::resolve_acting_account;
pub use auth::{extract_user_from_claims, AuthenticatedUser};
pub use config::Config;
pub use error::{Error, Result};
pub use events::Shift;
pub use forms::{AddMemberForm, EventForm, FormError};
pub use models::{Account, Event, EventFields, EventMember, EventView, NewEvent};
pub use month::{anchor_date, next_month_param, previous_month_param};
pub use store::{AccountDirectory, EventStore, MembershipStore, MemoryStore, PgStore};
