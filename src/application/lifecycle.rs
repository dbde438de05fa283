use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::pricing::round_currency;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    Booking, BookingStatus, NewBooking, NewOrder, NewRental, Order, OrderStatus, PaymentStatus,
    Rental, RentalStatus, Status, StatusEntry, StatusHistory,
};
use crate::domain::ports::{Clock, SuffixSource};

pub const ORDER_PREFIX: &str = "ORD";
pub const RENTAL_PREFIX: &str = "RNT";
pub const BOOKING_PREFIX: &str = "BKG";

/// Days between shipping and the estimated delivery date.
pub const DELIVERY_ESTIMATE_DAYS: i64 = 4;

const MAX_NUMBER_ATTEMPTS: usize = 8;

pub fn security_deposit_rate() -> BigDecimal {
    BigDecimal::new(30.into(), 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedKind {
    Order,
    Rental,
    Booking,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEntry {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Public tracking result. Carries no address or user data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub kind: TrackedKind,
    pub number: String,
    pub status: String,
    pub history: Vec<TrackedEntry>,
}

fn tracked<S: Status>(history: &StatusHistory<S>) -> Vec<TrackedEntry> {
    history
        .entries()
        .iter()
        .map(|e| TrackedEntry {
            status: e.status.to_string(),
            timestamp: e.timestamp,
            notes: e.notes.clone(),
        })
        .collect()
}

/// Owns every order, rental and booking. Aggregates are never deleted.
pub struct OrderLifecycleManager {
    orders: Vec<Order>,
    rentals: Vec<Rental>,
    bookings: Vec<Booking>,
    clock: Arc<dyn Clock>,
    suffixes: Arc<dyn SuffixSource>,
}

impl OrderLifecycleManager {
    pub fn new(clock: Arc<dyn Clock>, suffixes: Arc<dyn SuffixSource>) -> Self {
        Self {
            orders: Vec::new(),
            rentals: Vec::new(),
            bookings: Vec::new(),
            clock,
            suffixes,
        }
    }

    pub fn restore(&mut self, orders: Vec<Order>, rentals: Vec<Rental>, bookings: Vec<Booking>) {
        self.orders = orders;
        self.rentals = rentals;
        self.bookings = bookings;
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn rentals(&self) -> &[Rental] {
        &self.rentals
    }

    pub fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    fn next_number(
        &self,
        prefix: &str,
        now: DateTime<Utc>,
        taken: impl Fn(&str) -> bool,
    ) -> Result<String, DomainError> {
        let stamp = now.format("%y%m%d%H%M%S");
        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let candidate = format!("{prefix}-{stamp}-{}", self.suffixes.suffix());
            if !taken(&candidate) {
                return Ok(candidate);
            }
            log::warn!("Business number {candidate} already taken, regenerating");
        }
        Err(DomainError::Internal(format!(
            "could not allocate a unique {prefix} number"
        )))
    }

    // ── Creation ─────────────────────────────────────────────────────────────

    pub fn create_order(&mut self, data: NewOrder) -> Result<Order, DomainError> {
        let now = self.clock.now();
        let order_number = self.next_number(ORDER_PREFIX, now, |n| {
            self.orders.iter().any(|o| o.order_number == n)
        })?;

        let subtotal = round_currency(&data.subtotal);
        let discount = round_currency(&data.discount);
        let tax = round_currency(&data.tax);
        let shipping = round_currency(&data.shipping);
        let total = round_currency(&(&subtotal - &discount + &tax + &shipping));

        let mut order = Order {
            id: Uuid::new_v4(),
            order_number,
            user_id: data.user_id,
            items: data.items,
            subtotal,
            discount,
            tax,
            shipping,
            total,
            status: data.status,
            payment_status: data.payment_status,
            payment_method: data.payment_method,
            delivery_address: data.delivery_address,
            status_history: StatusHistory::start(data.status, now),
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            estimated_delivery: None,
        };
        stamp_milestone(&mut order, data.status, now);

        log::info!(
            "Created order {} for user {} ({})",
            order.order_number,
            order.user_id,
            order.total
        );
        self.orders.push(order.clone());
        Ok(order)
    }

    pub fn create_rental(&mut self, data: NewRental) -> Result<Rental, DomainError> {
        let now = self.clock.now();
        let rental_number = self.next_number(RENTAL_PREFIX, now, |n| {
            self.rentals.iter().any(|r| r.rental_number == n)
        })?;

        let total_cost = round_currency(&data.total_cost);
        let security_deposit = round_currency(&(&total_cost * security_deposit_rate()));

        let rental = Rental {
            id: Uuid::new_v4(),
            rental_number,
            user_id: data.user_id,
            equipment_id: data.equipment_id,
            quantity: data.quantity,
            rental_duration: data.rental_duration,
            start_date: data.start_date,
            end_date: data.start_date + Duration::days(i64::from(data.rental_duration)),
            requested_date: data.requested_date,
            status: data.status,
            total_cost,
            security_deposit,
            delivery_method: data.delivery_method,
            delivery_address: data.delivery_address,
            status_history: StatusHistory::start(data.status, now),
            created_at: now,
            updated_at: now,
        };

        log::info!(
            "Created rental {} for equipment {} ({} days)",
            rental.rental_number,
            rental.equipment_id,
            rental.rental_duration
        );
        self.rentals.push(rental.clone());
        Ok(rental)
    }

    pub fn create_booking(&mut self, data: NewBooking) -> Result<Booking, DomainError> {
        let now = self.clock.now();
        let booking_number = self.next_number(BOOKING_PREFIX, now, |n| {
            self.bookings.iter().any(|b| b.booking_number == n)
        })?;

        let booking = Booking {
            id: Uuid::new_v4(),
            booking_number,
            user_id: data.user_id,
            package_id: data.package_id,
            selected_date: data.selected_date,
            participants: data.participants,
            participant_details: data.participant_details,
            total_cost: round_currency(&data.total_cost),
            status: data.status,
            payment_status: data.payment_status,
            emergency_contact: data.emergency_contact,
            status_history: StatusHistory::start(data.status, now),
            created_at: now,
            updated_at: now,
        };

        log::info!(
            "Created booking {} for package {} on {}",
            booking.booking_number,
            booking.package_id,
            booking.selected_date
        );
        self.bookings.push(booking.clone());
        Ok(booking)
    }

    // ── Status updates ───────────────────────────────────────────────────────

    pub fn update_order_status(
        &mut self,
        id: Uuid,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, DomainError> {
        let now = self.clock.now();
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Order {id}")))?;

        order.status.check_transition(status)?;
        order.status_history.record(status, now, notes);
        order.status = status;
        order.updated_at = now;
        stamp_milestone(order, status, now);

        log::info!("Order {} is now {}", order.order_number, status);
        Ok(order.clone())
    }

    pub fn update_rental_status(
        &mut self,
        id: Uuid,
        status: RentalStatus,
        notes: Option<String>,
    ) -> Result<Rental, DomainError> {
        let now = self.clock.now();
        let rental = self
            .rentals
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Rental {id}")))?;

        rental.status.check_transition(status)?;
        rental.status_history.record(status, now, notes);
        rental.status = status;
        rental.updated_at = now;

        log::info!("Rental {} is now {}", rental.rental_number, status);
        Ok(rental.clone())
    }

    pub fn update_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<Booking, DomainError> {
        let now = self.clock.now();
        let booking = self
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("Booking {id}")))?;

        booking.status.check_transition(status)?;
        booking.status_history.record(status, now, notes);
        booking.status = status;
        booking.updated_at = now;

        log::info!("Booking {} is now {}", booking.booking_number, status);
        Ok(booking.clone())
    }

    // ── Lookups ──────────────────────────────────────────────────────────────

    pub fn get_order(&self, id: Uuid) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn get_rental(&self, id: Uuid) -> Option<&Rental> {
        self.rentals.iter().find(|r| r.id == id)
    }

    pub fn get_booking(&self, id: Uuid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    pub fn get_order_by_number(&self, number: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.order_number == number)
    }

    pub fn get_rental_by_number(&self, number: &str) -> Option<&Rental> {
        self.rentals.iter().find(|r| r.rental_number == number)
    }

    pub fn get_booking_by_number(&self, number: &str) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.booking_number == number)
    }

    /// Newest first.
    pub fn orders_for_user(&self, user_id: &str) -> Vec<Order> {
        newest_first(&self.orders, |o| o.user_id == user_id, |o| o.created_at)
    }

    pub fn rentals_for_user(&self, user_id: &str) -> Vec<Rental> {
        newest_first(&self.rentals, |r| r.user_id == user_id, |r| r.created_at)
    }

    pub fn bookings_for_user(&self, user_id: &str) -> Vec<Booking> {
        newest_first(&self.bookings, |b| b.user_id == user_id, |b| b.created_at)
    }

    /// Status history of an order, empty when the number is unknown.
    pub fn track_order(&self, order_number: &str) -> Vec<StatusEntry<OrderStatus>> {
        self.get_order_by_number(order_number)
            .map(|o| o.status_history.entries().to_vec())
            .unwrap_or_default()
    }

    /// Try the number as an order, then a rental, then a booking.
    pub fn track(&self, number: &str) -> Option<TrackingView> {
        let number = number.trim();
        if let Some(order) = self.get_order_by_number(number) {
            return Some(TrackingView {
                kind: TrackedKind::Order,
                number: order.order_number.clone(),
                status: order.status.to_string(),
                history: tracked(&order.status_history),
            });
        }
        if let Some(rental) = self.get_rental_by_number(number) {
            return Some(TrackingView {
                kind: TrackedKind::Rental,
                number: rental.rental_number.clone(),
                status: rental.status.to_string(),
                history: tracked(&rental.status_history),
            });
        }
        self.get_booking_by_number(number).map(|booking| TrackingView {
            kind: TrackedKind::Booking,
            number: booking.booking_number.clone(),
            status: booking.status.to_string(),
            history: tracked(&booking.status_history),
        })
    }
}

fn newest_first<T: Clone>(
    items: &[T],
    keep: impl Fn(&T) -> bool,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut selected: Vec<T> = items.iter().filter(|i| keep(i)).cloned().collect();
    selected.sort_by_key(|i| std::cmp::Reverse(created_at(i)));
    selected
}

/// Milestone timestamps are written the first time the status is reached
/// and never again.
fn stamp_milestone(order: &mut Order, status: OrderStatus, at: DateTime<Utc>) {
    match status {
        OrderStatus::Confirmed => {
            order.confirmed_at.get_or_insert(at);
        }
        OrderStatus::Shipped => {
            if order.shipped_at.is_none() {
                order.shipped_at = Some(at);
                order.estimated_delivery = Some(at + Duration::days(DELIVERY_ESTIMATE_DAYS));
            }
        }
        OrderStatus::Delivered => {
            order.delivered_at.get_or_insert(at);
        }
        OrderStatus::Cancelled => {
            order.cancelled_at.get_or_insert(at);
        }
        OrderStatus::Refunded => order.payment_status = PaymentStatus::Refunded,
        OrderStatus::Pending | OrderStatus::Processing => {}
    }
}
