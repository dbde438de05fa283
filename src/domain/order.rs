use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Behaviour shared by the order, rental and booking status machines.
pub trait Status: Copy + PartialEq + std::fmt::Display {
    /// Whether `next` may follow `self`. Re-applying the current status is
    /// always allowed.
    fn allows(self, next: Self) -> bool;

    fn check_transition(self, next: Self) -> Result<(), DomainError> {
        if self == next || self.allows(next) {
            Ok(())
        } else {
            Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

macro_rules! status_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(match self {
                    $($name::$variant => $text),+
                })
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(DomainError::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

status_enum!(OrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl Status for OrderStatus {
    fn allows(self, next: Self) -> bool {
        use OrderStatus::*;
        match self {
            Pending => matches!(next, Confirmed | Cancelled | Refunded),
            Confirmed => matches!(next, Processing | Shipped | Cancelled | Refunded),
            Processing => matches!(next, Shipped | Cancelled | Refunded),
            Shipped => matches!(next, Delivered | Cancelled | Refunded),
            Delivered | Cancelled | Refunded => false,
        }
    }
}

status_enum!(RentalStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Active => "active",
    Returned => "returned",
    Overdue => "overdue",
    Damaged => "damaged",
});

impl Status for RentalStatus {
    fn allows(self, next: Self) -> bool {
        use RentalStatus::*;
        match self {
            Pending => matches!(next, Confirmed | Active),
            Confirmed => matches!(next, Active),
            Active => matches!(next, Returned | Overdue | Damaged),
            Overdue => matches!(next, Returned | Damaged),
            Returned | Damaged => false,
        }
    }
}

status_enum!(BookingStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl Status for BookingStatus {
    fn allows(self, next: Self) -> bool {
        use BookingStatus::*;
        match self {
            Pending => matches!(next, Confirmed | Completed | Cancelled),
            Confirmed => matches!(next, Completed | Cancelled),
            Completed | Cancelled => false,
        }
    }
}

status_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

status_enum!(PaymentMethod {
    Card => "card",
    Paypal => "paypal",
});

status_enum!(DeliveryMethod {
    Pickup => "pickup",
    Delivery => "delivery",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry<S> {
    pub status: S,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Append-only log of status changes. The last entry is the current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory<S>(Vec<StatusEntry<S>>);

impl<S: Status> StatusHistory<S> {
    pub fn start(status: S, at: DateTime<Utc>) -> Self {
        StatusHistory(vec![StatusEntry {
            status,
            timestamp: at,
            notes: None,
        }])
    }

    pub fn record(&mut self, status: S, at: DateTime<Utc>, notes: Option<String>) {
        self.0.push(StatusEntry {
            status,
            timestamp: at,
            notes,
        });
    }

    pub fn entries(&self) -> &[StatusEntry<S>] {
        &self.0
    }

    pub fn latest(&self) -> Option<S> {
        self.0.last().map(|e| e.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub cardholder_name: Option<String>,
}

impl PaymentDetails {
    pub fn card_last4(&self) -> Option<&str> {
        self.card_number
            .as_deref()
            .and_then(|n| n.get(n.len().checked_sub(4)?..))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub equipment_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub tax: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
    pub status_history: StatusHistory<OrderStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: Uuid,
    pub rental_number: String,
    pub user_id: String,
    pub equipment_id: String,
    pub quantity: u32,
    pub rental_duration: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Date the customer picked in the cart, if any. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_date: Option<DateTime<Utc>>,
    pub status: RentalStatus,
    pub total_cost: BigDecimal,
    pub security_deposit: BigDecimal,
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<DeliveryAddress>,
    pub status_history: StatusHistory<RentalStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetail {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

impl From<&DeliveryAddress> for EmergencyContact {
    fn from(address: &DeliveryAddress) -> Self {
        EmergencyContact {
            name: address.name.clone(),
            phone: address.phone.clone(),
            relationship: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub booking_number: String,
    pub user_id: String,
    pub package_id: String,
    pub selected_date: DateTime<Utc>,
    pub participants: u32,
    pub participant_details: Vec<ParticipantDetail>,
    pub total_cost: BigDecimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub emergency_contact: EmergencyContact,
    pub status_history: StatusHistory<BookingStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Creation inputs ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub tax: BigDecimal,
    pub shipping: BigDecimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub delivery_address: DeliveryAddress,
}

#[derive(Debug, Clone)]
pub struct NewRental {
    pub user_id: String,
    pub equipment_id: String,
    pub quantity: u32,
    pub rental_duration: u32,
    pub start_date: DateTime<Utc>,
    pub requested_date: Option<DateTime<Utc>>,
    pub total_cost: BigDecimal,
    pub status: RentalStatus,
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<DeliveryAddress>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub package_id: String,
    pub selected_date: DateTime<Utc>,
    pub participants: u32,
    pub participant_details: Vec<ParticipantDetail>,
    pub total_cost: BigDecimal,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub emergency_contact: EmergencyContact,
}
