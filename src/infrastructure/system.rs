use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{Clock, SuffixSource};

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Four uppercase hex characters taken from a fresh v4 uuid.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSuffixSource;

impl SuffixSource for UuidSuffixSource {
    fn suffix(&self) -> String {
        Uuid::new_v4().simple().to_string()[..4].to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_four_uppercase_hex_chars() {
        let suffix = UuidSuffixSource.suffix();
        assert_eq!(suffix.len(), 4);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
    }
}
