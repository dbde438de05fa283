use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A piece of dive equipment as the catalog describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub price: BigDecimal,
    /// Per-day rental price, present only for rentable gear.
    #[serde(default)]
    pub rental_price: Option<BigDecimal>,
    pub stock: u32,
    pub available: bool,
    #[serde(default)]
    pub is_rentable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivePackage {
    pub id: String,
    pub name: String,
    /// Price per participant.
    pub price: BigDecimal,
    pub min_participants: u32,
    pub max_participants: u32,
    #[serde(default)]
    pub available_dates: Vec<DateTime<Utc>>,
}

impl DivePackage {
    pub fn offers_date(&self, date: &DateTime<Utc>) -> bool {
        self.available_dates.iter().any(|d| d == date)
    }

    pub fn accepts_participants(&self, participants: u32) -> bool {
        (self.min_participants..=self.max_participants).contains(&participants)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipTier {
    Platinum,
    Gold,
    Silver,
}

impl std::str::FromStr for MembershipTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "platinum" => Ok(MembershipTier::Platinum),
            "gold" => Ok(MembershipTier::Gold),
            "silver" => Ok(MembershipTier::Silver),
            other => Err(format!("unknown membership tier '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub membership: Option<MembershipTier>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn package() -> DivePackage {
        DivePackage {
            id: "reef-1".to_string(),
            name: "Reef Discovery".to_string(),
            price: BigDecimal::from(120),
            min_participants: 2,
            max_participants: 6,
            available_dates: vec![Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap()],
        }
    }

    #[test]
    fn offers_date_requires_exact_instant() {
        let pkg = package();
        assert!(pkg.offers_date(&Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap()));
        assert!(!pkg.offers_date(&Utc.with_ymd_and_hms(2026, 11, 2, 9, 0, 0).unwrap()));
    }

    #[test]
    fn participant_bounds_are_inclusive() {
        let pkg = package();
        assert!(!pkg.accepts_participants(1));
        assert!(pkg.accepts_participants(2));
        assert!(pkg.accepts_participants(6));
        assert!(!pkg.accepts_participants(7));
    }

    #[test]
    fn membership_tier_parses_case_insensitively() {
        assert_eq!("Gold".parse::<MembershipTier>(), Ok(MembershipTier::Gold));
        assert!("diamond".parse::<MembershipTier>().is_err());
    }

    #[test]
    fn equipment_deserializes_from_catalog_json() {
        let json = r#"{"id":"1","name":"Regulator","price":"349.99","stock":4,"available":true}"#;
        let eq: Equipment = serde_json::from_str(json).unwrap();
        assert_eq!(eq.rental_price, None);
        assert!(!eq.is_rentable);
        assert_eq!(eq.stock, 4);
    }
}
