use actix_web::{web, HttpResponse};

use crate::application::commerce_service::CommerceService;
use crate::errors::AppError;

/// GET /track/{number}
///
/// Public lookup by order, rental or booking number. Only the status trail
/// is returned; addresses and account data stay private.
#[utoipa::path(
    get,
    path = "/track/{number}",
    params(("number" = String, Path, description = "Order, rental or booking number")),
    responses(
        (status = 200, description = "Status and history"),
        (status = 404, description = "Nothing matches the number"),
    ),
    tag = "tracking"
)]
pub async fn track(
    service: web::Data<CommerceService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let number = path.into_inner();
    match service.track(&number)? {
        Some(view) => Ok(HttpResponse::Ok().json(view)),
        None => Err(AppError::NotFound(format!(
            "No order, rental or booking matches '{}'",
            number.trim()
        ))),
    }
}
