use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Extension, Path, RawQuery, Request, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::backend::path_segment;
use crate::core::itinerary::group_by_date;
use crate::core::seating::{SeatId, SeatMap};
use crate::core::wizard::{validate_step, Wizard, WizardStep};
use crate::core::{Activity, Currency, DayGroup, Role, ServiceDraft, Session, WalletResponse};
use crate::server::state::AppState;
use crate::utils::error::MarketError;

/// Backend collections exposed through the wrapper routes.
pub const PROXIED_RESOURCES: [&str; 6] = [
    "services",
    "suppliers",
    "products",
    "users",
    "notifications",
    "locations",
];

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn collection_handler(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward(&state, &headers, method, &resource, None, query, body).await
}

pub async fn item_handler(
    State(state): State<AppState>,
    Path((resource, id)): Path<(String, String)>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward(&state, &headers, method, &resource, Some(&id), query, body).await
}

async fn forward(
    state: &AppState,
    headers: &HeaderMap,
    method: Method,
    resource: &str,
    id: Option<&str>,
    query: Option<String>,
    body: Bytes,
) -> Response {
    if !PROXIED_RESOURCES.contains(&resource) {
        return json_error(StatusCode::NOT_FOUND, format!("Unknown resource: {}", resource));
    }

    let body = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => Some(value),
            Err(e) => return json_error(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e)),
        }
    };

    // The id arrives percent-decoded; it must stay a single segment under the resource.
    let path = match id.map(|id| path_segment("id", id)) {
        Some(Ok(id)) => format!("{}/{}", resource, id),
        Some(Err(e)) => return e.into_response(),
        None => resource.to_string(),
    };

    let (status, body) = state
        .backend
        .authorized(headers)
        .forward(method, &path, query.as_deref(), body)
        .await;
    if body.is_null() {
        return status.into_response();
    }
    (status, Json(body)).into_response()
}

fn wallet_reply<T: Serialize>(response: WalletResponse<T>) -> Response {
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(response)).into_response()
}

fn wallet_failure(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(WalletResponse::<Value>::failure(message))).into_response()
}

fn wallet_rejection(rejection: JsonRejection) -> Response {
    wallet_failure(rejection.status(), rejection.body_text())
}

/// Wallet routes act for the signed-in user only; admins may act for anyone.
fn ensure_wallet_owner(session: Option<&Session>, user_id: &str) -> Result<(), Response> {
    match session {
        None => Err(wallet_failure(StatusCode::UNAUTHORIZED, "Sign in to use the wallet")),
        Some(session) if session.role != Role::Admin && session.user_id != user_id => {
            tracing::warn!("User {} tried to use wallet {}", session.user_id, user_id);
            Err(wallet_failure(
                StatusCode::FORBIDDEN,
                "Cannot act on another user's wallet",
            ))
        }
        Some(_) => Ok(()),
    }
}

pub async fn balance_handler(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Response, Response> {
    ensure_wallet_owner(session.as_deref(), &user_id)?;
    Ok(wallet_reply(
        state.wallet.authorized(&headers).get_balance(&user_id).await,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFundsRequest {
    pub user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: Currency,
}

pub async fn add_funds_handler(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    headers: HeaderMap,
    payload: Result<Json<AddFundsRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(payload) = payload.map_err(wallet_rejection)?;
    ensure_wallet_owner(session.as_deref(), &payload.user_id)?;
    Ok(wallet_reply(
        state
            .wallet
            .authorized(&headers)
            .add_funds(&payload.user_id, payload.amount, payload.currency)
            .await,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: Currency,
}

pub async fn transfer_handler(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    headers: HeaderMap,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(payload) = payload.map_err(wallet_rejection)?;
    ensure_wallet_owner(session.as_deref(), &payload.from_user_id)?;
    Ok(wallet_reply(
        state
            .wallet
            .authorized(&headers)
            .transfer_funds(
                &payload.from_user_id,
                &payload.to_user_id,
                payload.amount,
                payload.currency,
            )
            .await,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub user_id: String,
    pub from: Currency,
    pub to: Currency,
    pub amount: f64,
}

pub async fn convert_handler(
    State(state): State<AppState>,
    session: Option<Extension<Session>>,
    headers: HeaderMap,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Response, Response> {
    let Json(payload) = payload.map_err(wallet_rejection)?;
    ensure_wallet_owner(session.as_deref(), &payload.user_id)?;
    Ok(wallet_reply(
        state
            .wallet
            .authorized(&headers)
            .convert_currency(&payload.user_id, payload.from, payload.to, payload.amount)
            .await,
    ))
}

pub async fn itinerary_handler(
    activities: Result<Json<Vec<Activity>>, JsonRejection>,
) -> Result<Json<Vec<DayGroup>>, MarketError> {
    let Json(activities) = activities?;
    Ok(Json(group_by_date(activities)))
}

#[derive(Debug, Serialize)]
pub struct StepStatus {
    pub step: WizardStep,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn wizard_validate_handler(
    draft: Result<Json<ServiceDraft>, JsonRejection>,
) -> Result<Json<Vec<StepStatus>>, MarketError> {
    let Json(draft) = draft?;
    let statuses = WizardStep::ALL
        .iter()
        .map(|step| match validate_step(*step, &draft) {
            Ok(()) => StepStatus {
                step: *step,
                valid: true,
                message: None,
            },
            Err(e) => StepStatus {
                step: *step,
                valid: false,
                message: Some(e.to_string()),
            },
        })
        .collect();
    Ok(Json(statuses))
}

pub async fn wizard_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    draft: Result<Json<ServiceDraft>, JsonRejection>,
) -> Result<Response, MarketError> {
    let Json(draft) = draft?;
    let mut wizard = Wizard::with_draft(draft);
    while !wizard.is_last_step() {
        wizard.next_step()?;
    }

    let created = wizard.submit(&state.backend.authorized(&headers)).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSelectionRequest {
    pub rows: usize,
    pub cols: usize,
    pub max_selection: usize,
    #[serde(default)]
    pub booked: Vec<String>,
    #[serde(default)]
    pub selected: Vec<String>,
    pub toggle: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSelectionResponse {
    pub selected: Vec<String>,
    pub available: usize,
}

fn parse_seat(label: &str) -> Result<SeatId, MarketError> {
    SeatId::parse(label).ok_or_else(|| MarketError::SeatError {
        seat: label.to_string(),
        message: "not a seat label".to_string(),
    })
}

pub async fn seat_handler(
    request: Result<Json<SeatSelectionRequest>, JsonRejection>,
) -> Result<Json<SeatSelectionResponse>, MarketError> {
    let Json(request) = request?;
    let mut map = SeatMap::new(request.rows, request.cols, request.max_selection);
    for label in &request.booked {
        map.mark_booked(parse_seat(label)?)?;
    }
    for label in &request.selected {
        map.toggle(parse_seat(label)?)?;
    }
    map.toggle(parse_seat(&request.toggle)?)?;

    Ok(Json(SeatSelectionResponse {
        selected: map.selected(),
        available: map.available_count(),
    }))
}

/// Placeholder for server-rendered pages behind the access middleware.
pub async fn page_handler(request: Request) -> Response {
    let path = request.uri().path().to_string();
    let session = request.extensions().get::<Session>().cloned();
    Json(json!({ "page": path, "session": session })).into_response()
}
