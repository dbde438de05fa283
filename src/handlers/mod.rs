pub mod cart;
pub mod checkout;
pub mod orders;
pub mod tracking;

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        cart::get_cart,
        cart::add_item,
        cart::update_item,
        cart::remove_item,
        cart::clear_cart,
        cart::validate_cart,
        checkout::checkout,
        orders::account_history,
        orders::update_order_status,
        orders::update_rental_status,
        orders::update_booking_status,
        tracking::track,
    ),
    components(schemas(
        cart::AddCartItemRequest,
        cart::UpdateQuantityRequest,
        cart::ValidationResponse,
        checkout::AddressBody,
        checkout::PaymentBody,
        checkout::CheckoutBody,
        checkout::CheckoutResponse,
        orders::UpdateStatusRequest,
    )),
    tags(
        (name = "cart", description = "Shopping cart"),
        (name = "checkout", description = "Checkout"),
        (name = "orders", description = "Orders, rentals and bookings"),
        (name = "tracking", description = "Public status tracking"),
    )
)]
pub struct ApiDoc;
