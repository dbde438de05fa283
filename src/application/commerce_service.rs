use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::cart_engine::{CartEngine, CartValidation};
use super::checkout::{lock, CheckoutOrchestrator, CheckoutOutcome, CheckoutRequest};
use super::lifecycle::{OrderLifecycleManager, TrackingView};
use super::persistence::{
    PersistenceAdapter, BOOKINGS_KEY, CART_KEY, ORDERS_KEY, RENTALS_KEY,
};
use super::pricing::{PriceBreakdown, PricingPolicy};
use crate::domain::cart::{CartItem, NewCartItem};
use crate::domain::catalog::User;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    Booking, BookingStatus, Order, OrderStatus, Rental, RentalStatus, StatusEntry,
};
use crate::domain::ports::{
    CatalogProvider, Clock, IdentityProvider, KeyValueStore, PaymentGateway, SuffixSource,
};

/// Collaborators and settings the service is assembled from.
pub struct ServiceParts {
    pub store: Arc<dyn KeyValueStore>,
    pub catalog: Arc<dyn CatalogProvider>,
    pub identity: Arc<dyn IdentityProvider>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub clock: Arc<dyn Clock>,
    pub suffixes: Arc<dyn SuffixSource>,
    pub policy: PricingPolicy,
    pub payment_latency: Duration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    /// Rounded, priced for the current user's membership tier.
    pub totals: PriceBreakdown,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountHistory {
    pub orders: Vec<Order>,
    pub rentals: Vec<Rental>,
    pub bookings: Vec<Booking>,
}

/// Process-wide commerce state. Construct once, call `init()` before use and
/// `teardown()` on shutdown. Every mutation is written through to the store.
pub struct CommerceService {
    cart: Mutex<CartEngine>,
    lifecycle: Mutex<OrderLifecycleManager>,
    persistence: PersistenceAdapter<Arc<dyn KeyValueStore>>,
    catalog: Arc<dyn CatalogProvider>,
    identity: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    checkout: CheckoutOrchestrator,
}

impl CommerceService {
    pub fn new(parts: ServiceParts) -> Self {
        Self {
            cart: Mutex::new(CartEngine::new(parts.clock.clone())),
            lifecycle: Mutex::new(OrderLifecycleManager::new(
                parts.clock.clone(),
                parts.suffixes,
            )),
            persistence: PersistenceAdapter::new(parts.store),
            catalog: parts.catalog,
            identity: parts.identity,
            clock: parts.clock.clone(),
            checkout: CheckoutOrchestrator::new(
                parts.gateway,
                parts.clock,
                parts.policy,
                parts.payment_latency,
            ),
        }
    }

    /// Load every collection from the store. An unreadable collection is
    /// backed up under a separate key and then starts empty; if the backup
    /// cannot be written, init fails before anything is overwritten.
    pub fn init(&self) -> Result<(), DomainError> {
        let stamp = self.clock.now().format("%Y%m%d%H%M%S").to_string();
        let cart = self.recover(self.persistence.load_cart(), CART_KEY, &stamp)?;
        let orders = self.recover(self.persistence.load_orders(), ORDERS_KEY, &stamp)?;
        let rentals = self.recover(self.persistence.load_rentals(), RENTALS_KEY, &stamp)?;
        let bookings = self.recover(self.persistence.load_bookings(), BOOKINGS_KEY, &stamp)?;

        log::info!(
            "Loaded {} cart lines, {} orders, {} rentals, {} bookings",
            cart.len(),
            orders.len(),
            rentals.len(),
            bookings.len()
        );

        lock(&self.cart)?.restore(cart);
        lock(&self.lifecycle)?.restore(orders, rentals, bookings);
        Ok(())
    }

    fn recover<T>(
        &self,
        loaded: Result<Vec<T>, DomainError>,
        key: &str,
        stamp: &str,
    ) -> Result<Vec<T>, DomainError> {
        match loaded {
            Ok(items) => Ok(items),
            Err(DomainError::Storage(msg)) => {
                let backup = self.persistence.back_up(key, stamp)?;
                log::warn!("Unreadable '{key}' collection saved as '{backup}', starting empty: {msg}");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Flush every collection.
    pub fn teardown(&self) -> Result<(), DomainError> {
        self.persist_cart()?;
        self.persist_records()?;
        log::info!("Commerce state flushed");
        Ok(())
    }

    fn persist_cart(&self) -> Result<(), DomainError> {
        let cart = lock(&self.cart)?;
        self.persistence.save_cart(cart.items()).inspect_err(|e| {
            log::error!("Failed to persist cart: {e}");
        })
    }

    /// Apply `change` and write the cart through. A failed write puts the
    /// previous contents back.
    fn mutate_cart<R>(&self, change: impl FnOnce(&mut CartEngine) -> R) -> Result<R, DomainError> {
        let mut cart = lock(&self.cart)?;
        let before = cart.items().to_vec();
        let result = change(&mut *cart);
        if let Err(e) = self.persistence.save_cart(cart.items()) {
            log::error!("Failed to persist cart, change rolled back: {e}");
            cart.restore(before);
            return Err(e);
        }
        Ok(result)
    }

    fn persist_records(&self) -> Result<(), DomainError> {
        let lifecycle = lock(&self.lifecycle)?;
        let orders = self.persistence.save_orders(lifecycle.orders());
        let rentals = self.persistence.save_rentals(lifecycle.rentals());
        let bookings = self.persistence.save_bookings(lifecycle.bookings());
        orders
            .and(rentals)
            .and(bookings)
            .inspect_err(|e| log::error!("Failed to persist records: {e}"))
    }

    pub fn current_user(&self) -> Option<User> {
        self.identity.current_user()
    }

    pub fn catalog(&self) -> &dyn CatalogProvider {
        self.catalog.as_ref()
    }

    // ── Cart ─────────────────────────────────────────────────────────────────

    pub fn cart_items(&self) -> Result<Vec<CartItem>, DomainError> {
        Ok(lock(&self.cart)?.items().to_vec())
    }

    pub fn cart_summary(&self) -> Result<CartSummary, DomainError> {
        let tier = self.current_user().and_then(|u| u.membership);
        let cart = lock(&self.cart)?;
        Ok(CartSummary {
            items: cart.items().to_vec(),
            item_count: cart.item_count(),
            totals: self.checkout.policy().calculate(cart.items(), tier).rounded(),
        })
    }

    pub fn add_to_cart(&self, item: NewCartItem) -> Result<CartItem, DomainError> {
        self.mutate_cart(|cart| cart.add_item(item).clone())
    }

    pub fn remove_from_cart(&self, id: Uuid) -> Result<(), DomainError> {
        self.mutate_cart(|cart| cart.remove_item(id)).map(|_| ())
    }

    pub fn update_cart_quantity(&self, id: Uuid, quantity: i64) -> Result<(), DomainError> {
        self.mutate_cart(|cart| cart.update_quantity(id, quantity))
            .map(|_| ())
    }

    pub fn clear_cart(&self) -> Result<(), DomainError> {
        self.mutate_cart(CartEngine::clear_cart)
    }

    pub fn validate_cart(&self) -> Result<CartValidation, DomainError> {
        Ok(lock(&self.cart)?.validate_cart(self.catalog.as_ref()))
    }

    // ── Checkout ─────────────────────────────────────────────────────────────

    /// Records created by a partially failed run are persisted too. Both
    /// writes are always attempted; a write failure after a successful charge
    /// is logged and the outcome is still returned.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutOutcome, DomainError> {
        let result = self
            .checkout
            .process_checkout(
                &self.cart,
                &self.lifecycle,
                self.catalog.as_ref(),
                self.current_user(),
                request,
            )
            .await;

        if !matches!(result, Err(DomainError::CheckoutInProgress)) {
            let records = self.persist_records();
            let cart = self.persist_cart();
            if let (Ok(outcome), Err(e)) = (&result, records.and(cart)) {
                log::error!(
                    "Checkout {} was charged but not fully saved: {e}",
                    outcome.payment_reference
                );
            }
        }
        result
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    pub fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        let order = lock(&self.lifecycle)?.update_order_status(id, status, notes)?;
        self.persist_records()?;
        Ok(order)
    }

    pub fn update_rental_status(
        &self,
        id: Uuid,
        status: RentalStatus,
        notes: Option<String>,
    ) -> Result<Rental, DomainError> {
        let rental = lock(&self.lifecycle)?.update_rental_status(id, status, notes)?;
        self.persist_records()?;
        Ok(rental)
    }

    pub fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<Booking, DomainError> {
        let booking = lock(&self.lifecycle)?.update_booking_status(id, status, notes)?;
        self.persist_records()?;
        Ok(booking)
    }

    pub fn track(&self, number: &str) -> Result<Option<TrackingView>, DomainError> {
        Ok(lock(&self.lifecycle)?.track(number))
    }

    pub fn track_order(&self, order_number: &str) -> Result<Vec<StatusEntry<OrderStatus>>, DomainError> {
        Ok(lock(&self.lifecycle)?.track_order(order_number))
    }

    /// Everything the signed-in user has bought, rented or booked.
    pub fn account_history(&self) -> Result<AccountHistory, DomainError> {
        let user = self.current_user().ok_or(DomainError::Unauthenticated)?;
        let lifecycle = lock(&self.lifecycle)?;
        Ok(AccountHistory {
            orders: lifecycle.orders_for_user(&user.id),
            rentals: lifecycle.rentals_for_user(&user.id),
            bookings: lifecycle.bookings_for_user(&user.id),
        })
    }
}
