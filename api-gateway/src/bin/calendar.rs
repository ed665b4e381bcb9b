//! Calendar Lambda - Event CRUD for the calendar widget.
//!
//! Endpoints:
//! - GET /calendar?month=YYYY-M - Month grid with previous/next links
//! - GET /dashboard - Event totals, running and latest events
//! - GET /events?manager=&engineer= - List the acting account's events
//! - POST /events?manager=&engineer= - Create an event (get-or-create)
//! - GET /events/{id} - Event details with members
//! - PUT /events/{id} - Edit an event
//! - POST /events/{id}/delete - Delete an event
//! - POST /events/{id}/next-day - Copy an event one day later
//! - POST /events/{id}/next-week - Copy an event one week later
//! - POST /events/{id}/members - Add a member
//! - DELETE /members/{id} - Remove a member

use chrono::{DateTime, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use serde::Serialize;
use shared::events::{self, Shift};
use shared::http::{
    domain_error_response, error_response, json_response, message_response, redirect_response,
    same_origin_referer, ApiResponse,
};
use shared::month::anchor_date_at;
use shared::{
    extract_user_from_claims, parse_body, resolve_acting_account, Account, AccountDirectory,
    AddMemberForm, AuthenticatedUser, Config, EventForm, EventStore, EventView, MembershipStore,
    PgStore,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Application state
struct AppState {
    events: Arc<dyn EventStore>,
    members: Arc<dyn MembershipStore>,
    accounts: Arc<dyn AccountDirectory>,
    member_limit: usize,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let pool = shared::db::create_pool(&config).await?;
        let store = Arc::new(PgStore::new(pool));

        Ok(Self {
            events: store.clone(),
            members: store.clone(),
            accounts: store,
            member_limit: config.member_limit,
        })
    }
}

/// The parts of a Lambda request the routes look at.
struct CalendarRequest {
    method: String,
    path: String,
    month: Option<String>,
    manager: Option<String>,
    engineer: Option<String>,
    referer: Option<String>,
    host: Option<String>,
    body: Body,
    requester: Account,
}

/// Extract the caller's identity from the authorizer claims
fn extract_user(event: &Request) -> Result<AuthenticatedUser, String> {
    let context = event
        .request_context_ref()
        .ok_or("Missing request context")?;

    let claims = context
        .authorizer()
        .and_then(|a| a.fields.get("claims"))
        .ok_or("Missing claims in authorizer context")?;

    extract_user_from_claims(claims).map_err(|e| e.to_string())
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str().to_string();
    let raw_path = event.uri().path();
    // Strip /api stage prefix if present (API Gateway REST API includes stage in path)
    let path = raw_path.strip_prefix("/api").unwrap_or(raw_path).to_string();

    let user = match extract_user(&event) {
        Ok(user) => user,
        Err(e) => {
            info!("Calendar request: {} {} (unauthenticated)", method, path);
            return error_response(401, format!("Authentication required: {}", e));
        }
    };

    info!(
        subject = %user.subject,
        email = user.email.as_deref().unwrap_or("-"),
        "Calendar request: {} {}",
        method,
        path
    );

    let requester = match state.accounts.account_by_subject(&user.subject).await {
        Ok(Some(account)) => account,
        Ok(None) => return error_response(401, "User not registered"),
        Err(e) => {
            error!("Failed to lookup user: {}", e);
            return domain_error_response(&e);
        }
    };

    let params = event.query_string_parameters();
    let header = |name: &str| {
        event
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let request = CalendarRequest {
        method,
        path,
        month: params.first("month").map(String::from),
        manager: params.first("manager").map(String::from),
        engineer: params.first("engineer").map(String::from),
        referer: header("referer"),
        host: header("host"),
        body: event.into_body(),
        requester,
    };

    route(&state, request, Utc::now()).await
}

/// Wrap a service result in the standard envelope.
fn respond<T: Serialize>(status: u16, result: shared::Result<T>) -> Result<Response<Body>, Error> {
    match result {
        Ok(data) => json_response(status, &ApiResponse::success(data)),
        Err(e) => {
            if e.status_code() >= 500 {
                error!("Calendar request failed: {}", e);
            }
            domain_error_response(&e)
        }
    }
}

fn parse_id(raw: &str, what: &str) -> shared::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| shared::Error::NotFound(format!("{} {}", what, raw)))
}

#[derive(Debug, Clone, Copy)]
enum EventAction {
    Delete,
    Duplicate(Shift),
}

/// Delete/duplicate endpoints answer `{"message": ...}`: 404 for an unknown
/// event whatever the method, then 400 for anything but POST.
async fn event_action(
    state: &AppState,
    method: &str,
    raw_id: &str,
    action: EventAction,
) -> Result<Response<Body>, Error> {
    let lookup = match parse_id(raw_id, "Event") {
        Ok(id) => events::get_event(state.events.as_ref(), id).await,
        Err(e) => Err(e),
    };
    let event = match lookup {
        Ok(event) => event,
        Err(e) => return domain_error_response(&e),
    };

    if method != "POST" {
        return message_response(400, "Error!");
    }

    let outcome = match action {
        EventAction::Delete => events::delete_event(state.events.as_ref(), event.id)
            .await
            .map(|_| "Event deleted."),
        EventAction::Duplicate(shift) => events::duplicate(state.events.as_ref(), &event, shift)
            .await
            .map(|_| "Success!"),
    };

    match outcome {
        Ok(message) => message_response(200, message),
        Err(e) => {
            error!("Event action {:?} failed: {}", action, e);
            domain_error_response(&e)
        }
    }
}

#[derive(Serialize)]
struct CreatedEvent {
    event: EventView,
    created: bool,
}

async fn route(
    state: &AppState,
    request: CalendarRequest,
    now: DateTime<Utc>,
) -> Result<Response<Body>, Error> {
    let method = request.method.as_str();
    let segments: Vec<&str> = request
        .path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    match (method, segments.as_slice()) {
        ("GET", ["calendar"]) => {
            let result = match anchor_date_at(request.month.as_deref(), now.date_naive()) {
                Ok(anchor) => {
                    events::month_view(state.events.as_ref(), &request.requester, anchor).await
                }
                Err(e) => Err(e),
            };
            respond(200, result)
        }

        ("GET", ["dashboard"]) => respond(
            200,
            events::dashboard(state.events.as_ref(), &request.requester, now).await,
        ),

        ("GET", ["events"]) => {
            let result = match resolve_acting_account(
                state.accounts.as_ref(),
                &request.requester,
                request.manager.as_deref(),
                request.engineer.as_deref(),
            )
            .await
            {
                Ok(acting) => events::list_events(state.events.as_ref(), &acting, now).await,
                Err(e) => Err(e),
            };
            respond(200, result)
        }

        ("POST", ["events"]) => {
            let acting = match resolve_acting_account(
                state.accounts.as_ref(),
                &request.requester,
                request.manager.as_deref(),
                request.engineer.as_deref(),
            )
            .await
            {
                Ok(acting) => acting,
                Err(e) => return domain_error_response(&e),
            };

            let form: EventForm = parse_body!(&request.body);
            let result = events::create_event(state.events.as_ref(), &acting, form).await;
            let back_to = request
                .referer
                .as_deref()
                .filter(|r| same_origin_referer(r, request.host.as_deref()));
            match (result, back_to) {
                (Ok(_), Some(referer)) => redirect_response(referer),
                (Ok((event, created)), None) => json_response(
                    201,
                    &ApiResponse::success(CreatedEvent {
                        event: EventView::from(&event),
                        created,
                    }),
                ),
                (Err(e), _) => domain_error_response(&e),
            }
        }

        ("GET", ["events", id]) => {
            let result = match parse_id(id, "Event") {
                Ok(id) => {
                    events::event_details(state.events.as_ref(), state.members.as_ref(), id).await
                }
                Err(e) => Err(e),
            };
            respond(200, result)
        }

        ("PUT", ["events", id]) => {
            let id = match parse_id(id, "Event") {
                Ok(id) => id,
                Err(e) => return domain_error_response(&e),
            };
            let form: EventForm = parse_body!(&request.body);
            let result = events::update_event(state.events.as_ref(), id, form)
                .await
                .map(|event| EventView::from(&event));
            respond(200, result)
        }

        (_, ["events", id, "delete"]) => event_action(state, method, id, EventAction::Delete).await,

        (_, ["events", id, "next-day"]) => {
            event_action(state, method, id, EventAction::Duplicate(Shift::NextDay)).await
        }

        (_, ["events", id, "next-week"]) => {
            event_action(state, method, id, EventAction::Duplicate(Shift::NextWeek)).await
        }

        ("POST", ["events", id, "members"]) => {
            let id = match parse_id(id, "Event") {
                Ok(id) => id,
                Err(e) => return domain_error_response(&e),
            };
            let form: AddMemberForm = parse_body!(&request.body);
            let result = events::add_member(
                state.events.as_ref(),
                state.members.as_ref(),
                state.accounts.as_ref(),
                id,
                form.user_id,
                state.member_limit,
            )
            .await;
            respond(201, result)
        }

        ("DELETE", ["members", id]) => {
            let result = match parse_id(id, "Event member") {
                Ok(id) => events::remove_member(state.members.as_ref(), id)
                    .await
                    .map(|_| serde_json::json!({ "memberId": id.to_string() })),
                Err(e) => Err(e),
            };
            respond(200, result)
        }

        _ => error_response(404, "Not found"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);
    let state_clone = state.clone();

    run(service_fn(move |event| {
        let state = state_clone.clone();
        async move { handler(state, event).await }
    }))
    .await
}
