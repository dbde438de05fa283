use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Purchase,
    Rental,
    Package,
}

impl std::fmt::Display for LineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LineType::Purchase => "purchase",
            LineType::Rental => "rental",
            LineType::Package => "package",
        })
    }
}

/// What a cart line refers to. Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CartLine {
    #[serde(rename_all = "camelCase")]
    Purchase { equipment_id: String },
    #[serde(rename_all = "camelCase")]
    Rental {
        equipment_id: String,
        /// Days.
        rental_duration: u32,
        /// Requested pickup date; the rental starts at checkout when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected_date: Option<DateTime<Utc>>,
    },
    #[serde(rename_all = "camelCase")]
    Package {
        package_id: String,
        selected_date: DateTime<Utc>,
        participants: u32,
    },
}

impl CartLine {
    pub fn line_type(&self) -> LineType {
        match self {
            CartLine::Purchase { .. } => LineType::Purchase,
            CartLine::Rental { .. } => LineType::Rental,
            CartLine::Package { .. } => LineType::Package,
        }
    }

    pub fn equipment_id(&self) -> Option<&str> {
        match self {
            CartLine::Purchase { equipment_id } | CartLine::Rental { equipment_id, .. } => {
                Some(equipment_id.as_str())
            }
            CartLine::Package { .. } => None,
        }
    }

    pub fn package_id(&self) -> Option<&str> {
        match self {
            CartLine::Package { package_id, .. } => Some(package_id.as_str()),
            _ => None,
        }
    }

    pub fn selected_date(&self) -> Option<DateTime<Utc>> {
        match self {
            CartLine::Purchase { .. } => None,
            CartLine::Rental { selected_date, .. } => *selected_date,
            CartLine::Package { selected_date, .. } => Some(*selected_date),
        }
    }

    pub fn rental_duration(&self) -> Option<u32> {
        match self {
            CartLine::Rental {
                rental_duration, ..
            } => Some(*rental_duration),
            _ => None,
        }
    }

    /// Two lines merge when type, referenced record, rental duration and
    /// selected date all match. Participants are not part of the key.
    pub fn merges_with(&self, other: &CartLine) -> bool {
        self.line_type() == other.line_type()
            && self.equipment_id() == other.equipment_id()
            && self.package_id() == other.package_id()
            && self.rental_duration() == other.rental_duration()
            && self.selected_date() == other.selected_date()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    #[serde(flatten)]
    pub line: CartLine,
    pub quantity: u32,
    /// Unit price captured when the line was added.
    pub price: BigDecimal,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Units the line counts for: participants for packages, quantity otherwise.
    pub fn units(&self) -> u32 {
        match &self.line {
            CartLine::Package { participants, .. } => *participants,
            _ => self.quantity,
        }
    }

    pub fn line_total(&self) -> BigDecimal {
        &self.price * BigDecimal::from(self.units())
    }
}

/// A line as requested by the caller, before the cart assigns id and time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCartItem {
    pub line: CartLine,
    pub quantity: u32,
    pub price: BigDecimal,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, day, 8, 0, 0).unwrap()
    }

    #[test]
    fn rental_lines_with_different_durations_do_not_merge() {
        let a = CartLine::Rental {
            equipment_id: "1".to_string(),
            rental_duration: 3,
            selected_date: None,
        };
        let b = CartLine::Rental {
            equipment_id: "1".to_string(),
            rental_duration: 5,
            selected_date: None,
        };
        assert!(!a.merges_with(&b));
        assert!(a.merges_with(&a.clone()));
    }

    #[test]
    fn purchase_and_rental_of_same_equipment_do_not_merge() {
        let a = CartLine::Purchase {
            equipment_id: "1".to_string(),
        };
        let b = CartLine::Rental {
            equipment_id: "1".to_string(),
            rental_duration: 1,
            selected_date: None,
        };
        assert!(!a.merges_with(&b));
    }

    #[test]
    fn package_merge_ignores_participants() {
        let a = CartLine::Package {
            package_id: "p".to_string(),
            selected_date: date(2),
            participants: 2,
        };
        let b = CartLine::Package {
            package_id: "p".to_string(),
            selected_date: date(2),
            participants: 4,
        };
        let c = CartLine::Package {
            package_id: "p".to_string(),
            selected_date: date(3),
            participants: 2,
        };
        assert!(a.merges_with(&b));
        assert!(!a.merges_with(&c));
    }

    #[test]
    fn package_line_total_uses_participants() {
        let item = CartItem {
            id: Uuid::new_v4(),
            line: CartLine::Package {
                package_id: "p".to_string(),
                selected_date: date(2),
                participants: 3,
            },
            quantity: 1,
            price: BigDecimal::from(80),
            added_at: date(1),
        };
        assert_eq!(item.units(), 3);
        assert_eq!(item.line_total(), BigDecimal::from(240));
    }

    #[test]
    fn serialized_line_carries_type_tag_and_camel_case_fields() {
        let item = CartItem {
            id: Uuid::nil(),
            line: CartLine::Rental {
                equipment_id: "7".to_string(),
                rental_duration: 2,
                selected_date: Some(date(5)),
            },
            quantity: 1,
            price: BigDecimal::from(15),
            added_at: date(1),
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "rental");
        assert_eq!(value["equipmentId"], "7");
        assert_eq!(value["rentalDuration"], 2);
        assert!(value["selectedDate"].is_string());
        assert!(value["addedAt"].is_string());
    }
}
