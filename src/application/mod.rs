pub mod cart_engine;
pub mod checkout;
pub mod commerce_service;
pub mod lifecycle;
pub mod persistence;
pub mod pricing;
