use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::commerce_service::CommerceService;
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

/// GET /account/history
///
/// Orders, rentals and bookings of the signed-in user, newest first.
#[utoipa::path(
    get,
    path = "/account/history",
    responses(
        (status = 200, description = "Account history"),
        (status = 401, description = "No signed-in user"),
    ),
    tag = "orders"
)]
pub async fn account_history(
    service: web::Data<CommerceService>,
) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse::Ok().json(service.account_history()?))
}

/// PATCH /orders/{id}/status
///
/// Appends a status change. The first time an order is confirmed, shipped,
/// delivered or cancelled the matching timestamp is recorded.
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated order"),
        (status = 400, description = "Unknown status or illegal transition"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    service: web::Data<CommerceService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let order = service.update_order_status(path.into_inner(), body.status.parse()?, body.notes)?;
    Ok(HttpResponse::Ok().json(order))
}

/// PATCH /rentals/{id}/status
#[utoipa::path(
    patch,
    path = "/rentals/{id}/status",
    params(("id" = Uuid, Path, description = "Rental UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated rental"),
        (status = 400, description = "Unknown status or illegal transition"),
        (status = 404, description = "Rental not found"),
    ),
    tag = "orders"
)]
pub async fn update_rental_status(
    service: web::Data<CommerceService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let rental =
        service.update_rental_status(path.into_inner(), body.status.parse()?, body.notes)?;
    Ok(HttpResponse::Ok().json(rental))
}

/// PATCH /bookings/{id}/status
#[utoipa::path(
    patch,
    path = "/bookings/{id}/status",
    params(("id" = Uuid, Path, description = "Booking UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated booking"),
        (status = 400, description = "Unknown status or illegal transition"),
        (status = 404, description = "Booking not found"),
    ),
    tag = "orders"
)]
pub async fn update_booking_status(
    service: web::Data<CommerceService>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let booking =
        service.update_booking_status(path.into_inner(), body.status.parse()?, body.notes)?;
    Ok(HttpResponse::Ok().json(booking))
}
