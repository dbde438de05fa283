use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::cart::CartItem;
use crate::domain::errors::DomainError;
use crate::domain::order::{Booking, Order, Rental};
use crate::domain::ports::KeyValueStore;

pub const CART_KEY: &str = "cart";
pub const ORDERS_KEY: &str = "orders";
pub const RENTALS_KEY: &str = "rentals";
pub const BOOKINGS_KEY: &str = "bookings";

/// JSON codec over a key-value store. Dates are written as RFC 3339 strings
/// and parsed back into `DateTime<Utc>` on load.
pub struct PersistenceAdapter<S> {
    store: S,
}

impl<S: KeyValueStore> PersistenceAdapter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// A missing key loads as an empty collection.
    pub fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, DomainError> {
        match self.store.load(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| DomainError::Storage(format!("corrupt '{key}' collection: {e}"))),
            None => Ok(Vec::new()),
        }
    }

    /// Copy the raw value under `key` to `<key>_corrupt_<stamp>` so it
    /// survives the next save. Returns the backup key.
    pub fn back_up(&self, key: &str, stamp: &str) -> Result<String, DomainError> {
        let raw = self
            .store
            .load(key)?
            .ok_or_else(|| DomainError::Storage(format!("nothing stored under '{key}'")))?;
        let backup = format!("{key}_corrupt_{stamp}");
        self.store.save(&backup, &raw)?;
        Ok(backup)
    }

    pub fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), DomainError> {
        let raw = serde_json::to_string(items)?;
        self.store.save(key, &raw)
    }

    pub fn load_cart(&self) -> Result<Vec<CartItem>, DomainError> {
        self.load_collection(CART_KEY)
    }

    pub fn save_cart(&self, items: &[CartItem]) -> Result<(), DomainError> {
        self.save_collection(CART_KEY, items)
    }

    pub fn load_orders(&self) -> Result<Vec<Order>, DomainError> {
        self.load_collection(ORDERS_KEY)
    }

    pub fn save_orders(&self, orders: &[Order]) -> Result<(), DomainError> {
        self.save_collection(ORDERS_KEY, orders)
    }

    pub fn load_rentals(&self) -> Result<Vec<Rental>, DomainError> {
        self.load_collection(RENTALS_KEY)
    }

    pub fn save_rentals(&self, rentals: &[Rental]) -> Result<(), DomainError> {
        self.save_collection(RENTALS_KEY, rentals)
    }

    pub fn load_bookings(&self) -> Result<Vec<Booking>, DomainError> {
        self.load_collection(BOOKINGS_KEY)
    }

    pub fn save_bookings(&self, bookings: &[Booking]) -> Result<(), DomainError> {
        self.save_collection(BOOKINGS_KEY, bookings)
    }
}
