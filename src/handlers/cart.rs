use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::commerce_service::CommerceService;
use crate::domain::cart::{CartLine, LineType, NewCartItem};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

/// Loosely-shaped cart line as sent by the storefront. Converted into a
/// typed line before it reaches the cart.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    /// One of `purchase`, `rental`, `package`.
    #[serde(rename = "type")]
    pub item_type: String,
    pub equipment_id: Option<String>,
    pub package_id: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Decimal unit price as a string, e.g. "24.99"
    pub price: String,
    /// Rental length in days.
    pub rental_duration: Option<u32>,
    pub selected_date: Option<DateTime<Utc>>,
    pub participants: Option<u32>,
}

fn default_quantity() -> u32 {
    1
}

impl AddCartItemRequest {
    pub fn into_new_item(self) -> Result<NewCartItem, AppError> {
        let bad = |msg: &str| AppError::BadRequest(msg.to_string());

        let line_type: LineType = serde_json::from_value(serde_json::Value::String(
            self.item_type.trim().to_ascii_lowercase(),
        ))
        .map_err(|_| AppError::BadRequest(format!("unknown item type '{}'", self.item_type)))?;

        if self.quantity == 0 {
            return Err(bad("quantity must be at least 1"));
        }
        let price = BigDecimal::from_str(self.price.trim())
            .map_err(|e| AppError::BadRequest(format!("Invalid price '{}': {}", self.price, e)))?;
        if price < BigDecimal::from(0) {
            return Err(bad("price cannot be negative"));
        }

        let line = match line_type {
            LineType::Purchase | LineType::Rental => {
                if self.package_id.is_some() {
                    return Err(bad("equipment lines cannot reference a package"));
                }
                let equipment_id = self
                    .equipment_id
                    .ok_or_else(|| bad("equipmentId is required"))?;
                if line_type == LineType::Purchase {
                    CartLine::Purchase { equipment_id }
                } else {
                    let rental_duration = self
                        .rental_duration
                        .filter(|d| *d > 0)
                        .ok_or_else(|| bad("rentalDuration must be at least one day"))?;
                    CartLine::Rental {
                        equipment_id,
                        rental_duration,
                        selected_date: self.selected_date,
                    }
                }
            }
            LineType::Package => {
                if self.equipment_id.is_some() {
                    return Err(bad("package lines cannot reference equipment"));
                }
                CartLine::Package {
                    package_id: self.package_id.ok_or_else(|| bad("packageId is required"))?,
                    selected_date: self
                        .selected_date
                        .ok_or_else(|| bad("selectedDate is required for packages"))?,
                    participants: self.participants.unwrap_or(1),
                }
            }
        };

        Ok(NewCartItem {
            line,
            quantity: self.quantity,
            price,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// Zero or less removes the line.
    pub quantity: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
///
/// Returns the cart lines, unit count and totals priced for the current
/// member tier.
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Current cart"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn get_cart(service: web::Data<CommerceService>) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(service.cart_summary()?))
}

/// POST /cart/items
///
/// Adds a line, or increments the matching line when type, item, rental
/// duration and date are the same.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Line added or merged"),
        (status = 400, description = "Malformed line"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    service: web::Data<CommerceService>,
    body: web::Json<AddCartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item = body.into_inner().into_new_item()?;
    let line = service.add_to_cart(item)?;
    Ok(HttpResponse::Created().json(line))
}

/// PATCH /cart/items/{id}
#[utoipa::path(
    patch,
    path = "/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart line id")),
    request_body = UpdateQuantityRequest,
    responses((status = 200, description = "Updated cart")),
    tag = "cart"
)]
pub async fn update_item(
    service: web::Data<CommerceService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    service.update_cart_quantity(path.into_inner(), body.quantity)?;
    Ok(HttpResponse::Ok().json(service.cart_summary()?))
}

/// DELETE /cart/items/{id}
#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    params(("id" = Uuid, Path, description = "Cart line id")),
    responses((status = 204, description = "Line removed")),
    tag = "cart"
)]
pub async fn remove_item(
    service: web::Data<CommerceService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    service.remove_from_cart(path.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /cart
#[utoipa::path(
    delete,
    path = "/cart",
    responses((status = 204, description = "Cart emptied")),
    tag = "cart"
)]
pub async fn clear_cart(service: web::Data<CommerceService>) -> Result<HttpResponse, AppError> {
    service.clear_cart()?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /cart/validate
///
/// Checks every line against the live catalog without checking out.
#[utoipa::path(
    get,
    path = "/cart/validate",
    responses((status = 200, description = "Validation result", body = ValidationResponse)),
    tag = "cart"
)]
pub async fn validate_cart(
    service: web::Data<CommerceService>,
) -> Result<HttpResponse, AppError> {
    let result = service.validate_cart()?;
    Ok(HttpResponse::Ok().json(ValidationResponse {
        is_valid: result.is_valid,
        errors: result.errors,
    }))
}
