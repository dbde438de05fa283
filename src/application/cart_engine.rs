use std::sync::Arc;

use bigdecimal::BigDecimal;
use uuid::Uuid;

use crate::domain::cart::{CartItem, CartLine, NewCartItem};
use crate::domain::catalog::{DivePackage, Equipment};
use crate::domain::ports::{CatalogProvider, Clock};

/// Catalog record a cart line points at.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDetails {
    Equipment(Equipment),
    Package(DivePackage),
}

impl ItemDetails {
    pub fn name(&self) -> &str {
        match self {
            ItemDetails::Equipment(e) => &e.name,
            ItemDetails::Package(p) => &p.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

pub struct CartEngine {
    items: Vec<CartItem>,
    clock: Arc<dyn Clock>,
}

impl CartEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            items: Vec::new(),
            clock,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: Uuid) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Replace the contents wholesale, used when reviving a persisted cart.
    pub fn restore(&mut self, items: Vec<CartItem>) {
        self.items = items;
    }

    /// Merge into an existing line with the same key or append a new one.
    /// Returns the line that now holds the item.
    pub fn add_item(&mut self, new_item: NewCartItem) -> &CartItem {
        let position = self
            .items
            .iter()
            .position(|i| i.line.merges_with(&new_item.line));

        let index = match position {
            Some(index) => {
                let existing = &mut self.items[index];
                existing.quantity = existing.quantity.saturating_add(new_item.quantity);
                if let (
                    CartLine::Package { participants, .. },
                    CartLine::Package {
                        participants: supplied,
                        ..
                    },
                ) = (&mut existing.line, &new_item.line)
                {
                    *participants = *supplied;
                }
                index
            }
            None => {
                self.items.push(CartItem {
                    id: Uuid::new_v4(),
                    line: new_item.line,
                    quantity: new_item.quantity,
                    price: new_item.price,
                    added_at: self.clock.now(),
                });
                self.items.len() - 1
            }
        };

        &self.items[index]
    }

    /// Returns whether a line was removed.
    pub fn remove_item(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    /// Quantities at or below zero remove the line. Returns whether the
    /// line existed.
    pub fn update_quantity(&mut self, id: Uuid, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove_item(id);
        }
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                true
            }
            None => false,
        }
    }

    pub fn clear_cart(&mut self) {
        self.items.clear();
    }

    /// Take a checked-out snapshot back out of the cart. Units added to a
    /// line after the snapshot stay, as do lines the snapshot never saw.
    pub fn remove_checked_out(&mut self, snapshot: &[CartItem]) {
        for sold in snapshot {
            if let Some(item) = self.items.iter_mut().find(|i| i.id == sold.id) {
                item.quantity = item.quantity.saturating_sub(sold.quantity);
            }
        }
        self.items.retain(|i| i.quantity > 0);
    }

    pub fn subtotal(&self) -> BigDecimal {
        subtotal_of(&self.items)
    }

    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.units()))
    }

    pub fn item_details(item: &CartItem, catalog: &dyn CatalogProvider) -> Option<ItemDetails> {
        match &item.line {
            CartLine::Purchase { equipment_id } | CartLine::Rental { equipment_id, .. } => catalog
                .find_equipment_by_id(equipment_id)
                .map(ItemDetails::Equipment),
            CartLine::Package { package_id, .. } => catalog
                .find_package_by_id(package_id)
                .map(ItemDetails::Package),
        }
    }

    /// Check every line against live catalog data.
    pub fn validate_cart(&self, catalog: &dyn CatalogProvider) -> CartValidation {
        let errors: Vec<String> = self
            .items
            .iter()
            .flat_map(|item| line_errors(item, catalog))
            .collect();

        CartValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

pub(crate) fn subtotal_of(items: &[CartItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + item.line_total())
}

fn line_errors(item: &CartItem, catalog: &dyn CatalogProvider) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(details) = CartEngine::item_details(item, catalog) else {
        let reference = item
            .line
            .equipment_id()
            .or(item.line.package_id())
            .unwrap_or_default();
        errors.push(format!(
            "{} item '{}' is no longer available",
            item.line.line_type(),
            reference
        ));
        return errors;
    };

    match (&item.line, details) {
        (CartLine::Purchase { .. } | CartLine::Rental { .. }, ItemDetails::Equipment(equipment)) => {
            if !equipment.available || equipment.stock == 0 {
                errors.push(format!("{} is out of stock", equipment.name));
            } else if item.quantity > equipment.stock {
                errors.push(format!(
                    "Only {} {} left in stock (requested {})",
                    equipment.stock, equipment.name, item.quantity
                ));
            }
            if matches!(item.line, CartLine::Rental { .. }) && !equipment.is_rentable {
                errors.push(format!("{} is not available for rental", equipment.name));
            }
        }
        (
            CartLine::Package {
                selected_date,
                participants,
                ..
            },
            ItemDetails::Package(package),
        ) => {
            if !package.accepts_participants(*participants) {
                errors.push(format!(
                    "{} requires between {} and {} participants",
                    package.name, package.min_participants, package.max_participants
                ));
            }
            if !package.offers_date(selected_date) {
                errors.push(format!(
                    "Selected date {} is not available for {}",
                    selected_date.format("%Y-%m-%d"),
                    package.name
                ));
            }
        }
        (_, details) => errors.push(format!("{} is no longer available", details.name())),
    }

    errors
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::domain::cart::LineType;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Default)]
    struct StubCatalog {
        equipment: HashMap<String, Equipment>,
        packages: HashMap<String, DivePackage>,
    }

    impl CatalogProvider for StubCatalog {
        fn find_equipment_by_id(&self, id: &str) -> Option<Equipment> {
            self.equipment.get(id).cloned()
        }

        fn find_package_by_id(&self, id: &str) -> Option<DivePackage> {
            self.packages.get(id).cloned()
        }
    }

    fn dive_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 11, 20, 7, 30, 0).unwrap()
    }

    fn engine() -> CartEngine {
        CartEngine::new(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
        )))
    }

    fn equipment(id: &str, stock: u32, available: bool, rentable: bool) -> Equipment {
        Equipment {
            id: id.to_string(),
            name: format!("Gear {id}"),
            price: BigDecimal::from(10),
            rental_price: rentable.then(|| BigDecimal::from(3)),
            stock,
            available,
            is_rentable: rentable,
        }
    }

    fn catalog() -> StubCatalog {
        let mut catalog = StubCatalog::default();
        for eq in [
            equipment("1", 5, true, true),
            equipment("2", 0, false, false),
            equipment("3", 2, true, false),
        ] {
            catalog.equipment.insert(eq.id.clone(), eq);
        }
        catalog.packages.insert(
            "p1".to_string(),
            DivePackage {
                id: "p1".to_string(),
                name: "Wreck Weekend".to_string(),
                price: BigDecimal::from(150),
                min_participants: 2,
                max_participants: 4,
                available_dates: vec![dive_date()],
            },
        );
        catalog
    }

    fn purchase(id: &str, quantity: u32) -> NewCartItem {
        NewCartItem {
            line: CartLine::Purchase {
                equipment_id: id.to_string(),
            },
            quantity,
            price: BigDecimal::from(10),
        }
    }

    fn package(participants: u32, date: DateTime<Utc>) -> NewCartItem {
        NewCartItem {
            line: CartLine::Package {
                package_id: "p1".to_string(),
                selected_date: date,
                participants,
            },
            quantity: 1,
            price: BigDecimal::from(150),
        }
    }

    #[test]
    fn adding_same_purchase_twice_merges_into_one_line() {
        let mut cart = engine();
        cart.add_item(purchase("1", 1));
        cart.add_item(purchase("1", 1));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[0].line.line_type(), LineType::Purchase);
    }

    #[test]
    fn new_line_gets_id_and_added_at() {
        let mut cart = engine();
        let added_at = cart.add_item(purchase("1", 1)).added_at;
        assert_eq!(added_at, Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
        assert_ne!(cart.items()[0].id, Uuid::nil());
    }

    #[test]
    fn merging_package_overwrites_participants() {
        let mut cart = engine();
        cart.add_item(package(2, dive_date()));
        cart.add_item(package(3, dive_date()));

        assert_eq!(cart.items().len(), 1);
        assert!(matches!(
            cart.items()[0].line,
            CartLine::Package { participants: 3, .. }
        ));
    }

    #[test]
    fn item_count_uses_participants_for_packages() {
        let mut cart = engine();
        cart.add_item(purchase("1", 2));
        cart.add_item(package(3, dive_date()));

        assert_eq!(cart.item_count(), 5);
        // 2 × 10 + 3 × 150
        assert_eq!(cart.subtotal(), BigDecimal::from(470));
    }

    #[test]
    fn update_quantity_to_zero_removes_line() {
        let mut cart = engine();
        let id = cart.add_item(purchase("1", 2)).id;

        assert!(cart.update_quantity(id, 4));
        assert_eq!(cart.items()[0].quantity, 4);

        assert!(cart.update_quantity(id, 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn merging_huge_quantities_saturates() {
        let mut cart = engine();
        cart.add_item(purchase("1", u32::MAX));
        cart.add_item(purchase("1", u32::MAX));
        cart.add_item(purchase("2", 5));

        assert_eq!(cart.items()[0].quantity, u32::MAX);
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn removing_checked_out_lines_keeps_later_additions() {
        let mut cart = engine();
        cart.add_item(purchase("1", 2));
        let snapshot = cart.items().to_vec();

        cart.add_item(purchase("1", 1));
        cart.add_item(purchase("2", 4));
        cart.remove_checked_out(&snapshot);

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].id, snapshot[0].id);
        assert_eq!(cart.items()[0].quantity, 1);
        assert_eq!(cart.items()[1].quantity, 4);

        cart.remove_checked_out(&cart.items().to_vec());
        assert!(cart.is_empty());
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut cart = engine();
        cart.add_item(purchase("1", 1));
        assert!(!cart.update_quantity(Uuid::new_v4(), 3));
        assert!(!cart.remove_item(Uuid::new_v4()));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn unavailable_equipment_reports_stock_error() {
        let mut cart = engine();
        cart.add_item(purchase("2", 1));

        let result = cart.validate_cart(&catalog());
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("stock"));
    }

    #[test]
    fn quantity_above_stock_is_rejected() {
        let mut cart = engine();
        cart.add_item(purchase("3", 3));

        let result = cart.validate_cart(&catalog());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Only 2"));
    }

    #[test]
    fn rental_of_non_rentable_equipment_is_rejected() {
        let mut cart = engine();
        cart.add_item(NewCartItem {
            line: CartLine::Rental {
                equipment_id: "3".to_string(),
                rental_duration: 2,
                selected_date: None,
            },
            quantity: 1,
            price: BigDecimal::from(3),
        });

        let result = cart.validate_cart(&catalog());
        assert_eq!(
            result.errors,
            vec!["Gear 3 is not available for rental".to_string()]
        );
    }

    #[test]
    fn missing_record_is_no_longer_available() {
        let mut cart = engine();
        cart.add_item(purchase("99", 1));

        let result = cart.validate_cart(&catalog());
        assert!(result.errors[0].contains("no longer available"));
    }

    #[test]
    fn package_checks_participants_and_date() {
        let mut cart = engine();
        cart.add_item(package(5, Utc.with_ymd_and_hms(2026, 12, 1, 7, 30, 0).unwrap()));

        let result = cart.validate_cart(&catalog());
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors[0].contains("between 2 and 4"));
        assert!(result.errors[1].contains("2026-12-01"));
    }

    #[test]
    fn valid_cart_passes() {
        let mut cart = engine();
        cart.add_item(purchase("1", 2));
        cart.add_item(package(2, dive_date()));

        assert_eq!(
            cart.validate_cart(&catalog()),
            CartValidation {
                is_valid: true,
                errors: vec![]
            }
        );
    }

    #[test]
    fn item_details_resolves_by_type() {
        let mut cart = engine();
        cart.add_item(package(2, dive_date()));
        let details = CartEngine::item_details(&cart.items()[0], &catalog());
        assert_eq!(details.map(|d| d.name().to_string()), Some("Wreck Weekend".to_string()));
    }
}
