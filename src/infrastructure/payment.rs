use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{PaymentDetails, PaymentMethod};
use crate::domain::ports::{PaymentGateway, PaymentReceipt};

/// Card number that is always declined.
pub const DECLINED_TEST_CARD: &str = "4000000000000002";

/// Stand-in gateway: approves everything except the declined test card,
/// card payments without a number and non-positive amounts. Latency is
/// simulated by the checkout, not here.
#[derive(Debug, Default)]
pub struct SimulatedPaymentGateway;

impl PaymentGateway for SimulatedPaymentGateway {
    fn charge(
        &self,
        amount: &BigDecimal,
        details: &PaymentDetails,
    ) -> Result<PaymentReceipt, DomainError> {
        if *amount <= BigDecimal::from(0) {
            return Err(DomainError::Payment(format!("invalid amount {amount}")));
        }
        if details.method == PaymentMethod::Card {
            let number: String = details
                .card_number
                .as_deref()
                .unwrap_or_default()
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            if number.is_empty() {
                return Err(DomainError::Payment("card number missing".to_string()));
            }
            if number == DECLINED_TEST_CARD {
                return Err(DomainError::Payment("card declined".to_string()));
            }
        }

        let reference = format!("PAY-{}", Uuid::new_v4().simple()).to_uppercase();
        Ok(PaymentReceipt {
            reference,
            amount: amount.clone(),
        })
    }
}
