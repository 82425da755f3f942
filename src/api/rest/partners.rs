use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::ActingIdentity;
use crate::engine::broadcast::{self, OfferView};
use crate::engine::{claim, relay};
use crate::error::DispatchError;
use crate::models::assignment::Assignment;
use crate::models::partner::{DeliveryPartner, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/partners", post(register_partner))
        .route("/partners/:id/availability", patch(update_availability))
        .route("/partners/:id/location", patch(report_location))
        .route("/partners/:id/offers", get(open_offers))
        .route("/offers/:id/accept", post(accept_offer))
        .route("/offers/:id/reject", post(reject_offer))
}

#[derive(Deserialize)]
pub struct RegisterPartnerRequest {
    pub name: String,
    pub vehicle: String,
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub available: bool,
}

#[derive(Deserialize)]
pub struct ReportLocationRequest {
    pub location: GeoPoint,
}

async fn register_partner(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Json(payload): Json<RegisterPartnerRequest>,
) -> Result<Json<DeliveryPartner>, DispatchError> {
    if !identity.can_act_as_partner() {
        return Err(DispatchError::Unauthorized);
    }

    if payload.name.trim().is_empty() {
        return Err(DispatchError::BadRequest("name cannot be empty".to_string()));
    }

    let partner = DeliveryPartner {
        id: identity.id,
        name: payload.name,
        vehicle: payload.vehicle,
        available: true,
        location: payload.location,
        updated_at: Utc::now(),
    };

    state.partners.insert(partner.id, partner.clone());
    Ok(Json(partner))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<DeliveryPartner>, DispatchError> {
    if !identity.can_act_as_partner() || (!identity.is_admin() && identity.id != id) {
        return Err(DispatchError::Unauthorized);
    }

    let mut partner = state
        .partners
        .get_mut(&id)
        .ok_or_else(|| DispatchError::NotFound(format!("partner {id} not found")))?;

    partner.available = payload.available;
    partner.updated_at = Utc::now();

    Ok(Json(partner.clone()))
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReportLocationRequest>,
) -> Result<Json<Value>, DispatchError> {
    relay::report_location(&state, id, payload.location, identity)?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn open_offers(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<OfferView>>, DispatchError> {
    if !identity.can_act_as_partner() || (!identity.is_admin() && identity.id != id) {
        return Err(DispatchError::Unauthorized);
    }

    Ok(Json(broadcast::open_offers_for(&state, id)))
}

async fn accept_offer(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, DispatchError> {
    let assignment = claim::accept_offer(&state, id, identity)?;
    Ok(Json(assignment))
}

async fn reject_offer(
    State(state): State<Arc<AppState>>,
    identity: ActingIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, DispatchError> {
    claim::reject_offer(&state, id, identity)?;
    Ok(Json(json!({ "status": "ok" })))
}
