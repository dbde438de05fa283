pub mod catalog;
pub mod identity;
pub mod payment;
pub mod store;
pub mod system;
