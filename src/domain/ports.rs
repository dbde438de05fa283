use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::catalog::{DivePackage, Equipment, User};
use super::errors::DomainError;
use super::order::PaymentDetails;

/// Read-only equipment and package records.
pub trait CatalogProvider: Send + Sync + 'static {
    fn find_equipment_by_id(&self, id: &str) -> Option<Equipment>;
    fn find_package_by_id(&self, id: &str) -> Option<DivePackage>;
}

pub trait IdentityProvider: Send + Sync + 'static {
    fn current_user(&self) -> Option<User>;
}

/// Durable string store keyed by collection name.
pub trait KeyValueStore: Send + Sync + 'static {
    fn load(&self, key: &str) -> Result<Option<String>, DomainError>;
    fn save(&self, key: &str, value: &str) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub reference: String,
    pub amount: BigDecimal,
}

pub trait PaymentGateway: Send + Sync + 'static {
    /// Single pass/fail charge. Declines surface as `DomainError::Payment`.
    fn charge(
        &self,
        amount: &BigDecimal,
        details: &PaymentDetails,
    ) -> Result<PaymentReceipt, DomainError>;
}

pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of the short random suffix on business numbers.
pub trait SuffixSource: Send + Sync + 'static {
    fn suffix(&self) -> String;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>, DomainError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DomainError> {
        (**self).save(key, value)
    }
}
