use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::checkout::CheckoutRequest;
use crate::application::commerce_service::CommerceService;
use crate::domain::order::{DeliveryAddress, DeliveryMethod, PaymentDetails, PaymentMethod};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressBody {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    /// `card` or `paypal`.
    pub method: String,
    pub card_number: Option<String>,
    pub cardholder_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub delivery_address: AddressBody,
    pub payment: PaymentBody,
    /// `pickup` (default) or `delivery` for rented gear.
    pub rental_delivery: Option<String>,
}

impl CheckoutBody {
    fn into_request(self) -> Result<CheckoutRequest, AppError> {
        let address = self.delivery_address;
        let required = [
            ("name", &address.name),
            ("phone", &address.phone),
            ("street", &address.street),
            ("city", &address.city),
            ("postalCode", &address.postal_code),
            ("country", &address.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::BadRequest(format!(
                "deliveryAddress.{field} is required"
            )));
        }

        let method: PaymentMethod = self.payment.method.parse()?;
        let rental_delivery: DeliveryMethod = match self.rental_delivery {
            Some(m) => m.parse()?,
            None => DeliveryMethod::Pickup,
        };

        Ok(CheckoutRequest {
            delivery_address: DeliveryAddress {
                name: address.name,
                phone: address.phone,
                street: address.street,
                city: address.city,
                state: address.state,
                postal_code: address.postal_code,
                country: address.country,
            },
            payment: PaymentDetails {
                method,
                card_number: self.payment.card_number,
                cardholder_name: self.payment.cardholder_name,
            },
            rental_delivery,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub order_number: Option<String>,
    pub rental_numbers: Vec<String>,
    pub booking_numbers: Vec<String>,
    pub payment_reference: String,
    /// Rounded cart-wide total that was charged.
    pub total: String,
}

/// POST /checkout
///
/// Re-validates the cart, charges the cart total once, then creates one
/// order for purchased gear plus a rental or booking per line. The cart is
/// emptied only when everything succeeds.
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutBody,
    responses(
        (status = 201, description = "Checkout complete", body = CheckoutResponse),
        (status = 401, description = "No signed-in user"),
        (status = 402, description = "Payment failed"),
        (status = 409, description = "Checkout already in progress"),
        (status = 422, description = "Cart failed validation"),
    ),
    tag = "checkout"
)]
pub async fn checkout(
    service: web::Data<CommerceService>,
    body: web::Json<CheckoutBody>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner().into_request()?;
    let outcome = service.checkout(request).await?;

    Ok(HttpResponse::Created().json(CheckoutResponse {
        order_number: outcome.order.map(|o| o.order_number),
        rental_numbers: outcome.rentals.into_iter().map(|r| r.rental_number).collect(),
        booking_numbers: outcome
            .bookings
            .into_iter()
            .map(|b| b.booking_number)
            .collect(),
        payment_reference: outcome.payment_reference,
        total: outcome.totals.total.to_string(),
    }))
}
