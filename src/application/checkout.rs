use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bigdecimal::BigDecimal;

use super::cart_engine::CartEngine;
use super::lifecycle::OrderLifecycleManager;
use super::pricing::{PriceBreakdown, PricingPolicy};
use crate::domain::cart::{CartItem, CartLine};
use crate::domain::catalog::User;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    Booking, BookingStatus, DeliveryAddress, DeliveryMethod, EmergencyContact, NewBooking,
    NewOrder, NewRental, Order, OrderItem, OrderStatus, ParticipantDetail, PaymentDetails,
    PaymentStatus, Rental, RentalStatus,
};
use crate::domain::ports::{CatalogProvider, Clock, PaymentGateway};

pub const PAYMENT_FAILED_MESSAGE: &str = "Payment failed. Please try again.";

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub delivery_address: DeliveryAddress,
    pub payment: PaymentDetails,
    pub rental_delivery: DeliveryMethod,
}

#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Option<Order>,
    pub rentals: Vec<Rental>,
    pub bookings: Vec<Booking>,
    /// Cart-wide totals, rounded.
    pub totals: PriceBreakdown,
    pub payment_reference: String,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DomainError> {
    mutex
        .lock()
        .map_err(|_| DomainError::Internal("state lock poisoned".to_string()))
}

/// Held for the duration of one checkout; released on drop.
struct SubmissionGuard<'a>(&'a AtomicBool);

impl<'a> SubmissionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, DomainError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DomainError::CheckoutInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct PreparedCheckout {
    user: User,
    items: Vec<CartItem>,
    order_items: Vec<OrderItem>,
    totals: PriceBreakdown,
}

pub struct CheckoutOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    policy: PricingPolicy,
    payment_latency: Duration,
    in_flight: AtomicBool,
}

impl CheckoutOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        policy: PricingPolicy,
        payment_latency: Duration,
    ) -> Self {
        Self {
            gateway,
            clock,
            policy,
            payment_latency,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Validate, charge, create one order for purchases plus a rental or
    /// booking per line, then take the checked-out lines out of the cart.
    /// Records created before a failure are kept.
    pub async fn process_checkout(
        &self,
        cart: &Mutex<CartEngine>,
        lifecycle: &Mutex<OrderLifecycleManager>,
        catalog: &dyn CatalogProvider,
        user: Option<User>,
        request: CheckoutRequest,
    ) -> Result<CheckoutOutcome, DomainError> {
        let _guard = SubmissionGuard::acquire(&self.in_flight)?;

        let prepared = self.prepare(cart, catalog, user)?;
        let charged = prepared.totals.rounded().total;

        tokio::time::sleep(self.payment_latency).await;

        let receipt = self
            .gateway
            .charge(&charged, &request.payment)
            .map_err(|e| {
                log::warn!("Payment of {charged} for user {} failed: {e}", prepared.user.id);
                DomainError::Payment(PAYMENT_FAILED_MESSAGE.to_string())
            })?;

        let (order, rentals, bookings) = {
            let mut lifecycle = lock(lifecycle)?;
            self.create_records(&mut lifecycle, &prepared, &request)
                .map_err(|e| {
                    log::error!(
                        "Checkout for user {} failed after payment {}: {e}",
                        prepared.user.id,
                        receipt.reference
                    );
                    DomainError::Payment(PAYMENT_FAILED_MESSAGE.to_string())
                })?
        };

        lock(cart)?.remove_checked_out(&prepared.items);

        log::info!(
            "Checkout {} complete for user {}: {} order, {} rentals, {} bookings",
            receipt.reference,
            prepared.user.id,
            usize::from(order.is_some()),
            rentals.len(),
            bookings.len()
        );

        Ok(CheckoutOutcome {
            order,
            rentals,
            bookings,
            totals: prepared.totals.rounded(),
            payment_reference: receipt.reference,
        })
    }

    fn prepare(
        &self,
        cart: &Mutex<CartEngine>,
        catalog: &dyn CatalogProvider,
        user: Option<User>,
    ) -> Result<PreparedCheckout, DomainError> {
        let user = user.ok_or(DomainError::Unauthenticated)?;
        let cart = lock(cart)?;
        if cart.is_empty() {
            return Err(DomainError::InvalidInput("cart is empty".to_string()));
        }

        let validation = cart.validate_cart(catalog);
        if !validation.is_valid {
            log::info!(
                "Checkout for user {} rejected: {} cart errors",
                user.id,
                validation.errors.len()
            );
            return Err(DomainError::Validation(validation.errors));
        }

        let items = cart.items().to_vec();
        let totals = self.policy.calculate(&items, user.membership);
        let order_items = items
            .iter()
            .filter_map(|item| match &item.line {
                CartLine::Purchase { equipment_id } => Some(OrderItem {
                    equipment_id: equipment_id.clone(),
                    name: CartEngine::item_details(item, catalog)
                        .map(|d| d.name().to_string())
                        .unwrap_or_else(|| equipment_id.clone()),
                    quantity: item.quantity,
                    unit_price: item.price.clone(),
                    line_total: item.line_total(),
                }),
                _ => None,
            })
            .collect();

        Ok(PreparedCheckout {
            user,
            items,
            order_items,
            totals,
        })
    }

    fn create_records(
        &self,
        lifecycle: &mut OrderLifecycleManager,
        prepared: &PreparedCheckout,
        request: &CheckoutRequest,
    ) -> Result<(Option<Order>, Vec<Rental>, Vec<Booking>), DomainError> {
        let user_id = &prepared.user.id;

        let order = if prepared.order_items.is_empty() {
            None
        } else {
            let subtotal = prepared
                .order_items
                .iter()
                .fold(BigDecimal::from(0), |acc, i| acc + &i.line_total);
            Some(lifecycle.create_order(NewOrder {
                user_id: user_id.clone(),
                items: prepared.order_items.clone(),
                subtotal,
                discount: prepared.totals.discount.clone(),
                tax: prepared.totals.tax.clone(),
                shipping: prepared.totals.shipping.clone(),
                status: OrderStatus::Confirmed,
                payment_status: PaymentStatus::Paid,
                payment_method: request.payment.method,
                delivery_address: request.delivery_address.clone(),
            })?)
        };

        let now = self.clock.now();
        let mut rentals = Vec::new();
        let mut bookings = Vec::new();

        for item in &prepared.items {
            match &item.line {
                CartLine::Purchase { .. } => {}
                CartLine::Rental {
                    equipment_id,
                    rental_duration,
                    selected_date,
                } => rentals.push(lifecycle.create_rental(NewRental {
                    user_id: user_id.clone(),
                    equipment_id: equipment_id.clone(),
                    quantity: item.quantity,
                    rental_duration: *rental_duration,
                    start_date: now,
                    requested_date: *selected_date,
                    total_cost: item.line_total(),
                    status: RentalStatus::Confirmed,
                    delivery_method: request.rental_delivery,
                    delivery_address: (request.rental_delivery == DeliveryMethod::Delivery)
                        .then(|| request.delivery_address.clone()),
                })?),
                CartLine::Package {
                    package_id,
                    selected_date,
                    participants,
                } => bookings.push(lifecycle.create_booking(NewBooking {
                    user_id: user_id.clone(),
                    package_id: package_id.clone(),
                    selected_date: *selected_date,
                    participants: *participants,
                    participant_details: (1..=*participants)
                        .map(|n| ParticipantDetail {
                            name: format!("Participant {n}"),
                            certification_level: None,
                        })
                        .collect(),
                    total_cost: item.line_total(),
                    status: BookingStatus::Confirmed,
                    payment_status: PaymentStatus::Paid,
                    emergency_contact: EmergencyContact::from(&request.delivery_address),
                })?),
            }
        }

        Ok((order, rentals, bookings))
    }
}
