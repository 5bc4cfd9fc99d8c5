//! # Pricing Engine
//!
//! Deterministic, side-effect free price calculation for order lines.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Catalog line                                                           │
//! │    unit_price = catalog_item.base_price                                 │
//! │    subtotal   = unit_price × quantity                                   │
//! │                                                                         │
//! │  Customized component                                                   │
//! │    unit_price = round(raw_material.base_price × (1 + margin))           │
//! │    subtotal   = round(unit_price × quantity)                            │
//! │                                                                         │
//! │  Customized line                                                        │
//! │    unit_price = Σ component.subtotal,  quantity = 1,  subtotal = unit   │
//! │                                                                         │
//! │  round = half away from zero, to the cent                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every price is captured on the line when it is created; later catalog or
//! raw-material price changes never touch existing orders.

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::quantity::{Margin, Quantity};
use crate::types::{CatalogItem, RawMaterial};
use crate::validation::{validate_component_quantity, validate_line_quantity};

/// Prices captured on a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePrice {
    pub unit_price: Money,
    pub subtotal: Money,
}

impl LinePrice {
    /// A customized item is always sold once, so subtotal equals unit price.
    pub fn customized(total_unit_price: Money) -> Self {
        LinePrice {
            unit_price: total_unit_price,
            subtotal: total_unit_price,
        }
    }
}

/// Prices captured on one component of a customized item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPrice {
    pub raw_material_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Prices a catalog line at the item's current base price.
///
/// ## Example
/// ```rust
/// use scoop_core::pricing::price_catalog_line;
/// use scoop_core::types::CatalogItem;
///
/// let cone = CatalogItem {
///     id: "VANILLA-CONE".to_string(),
///     name: "Vanilla cone".to_string(),
///     base_price_cents: 350,
///     is_ice_cream: true,
/// };
/// let price = price_catalog_line(&cone, 3).unwrap();
/// assert_eq!(price.subtotal.cents(), 1050);
/// ```
pub fn price_catalog_line(item: &CatalogItem, quantity: i64) -> CoreResult<LinePrice> {
    validate_line_quantity(quantity)?;
    let unit_price = item.base_price();
    Ok(LinePrice {
        unit_price,
        subtotal: unit_price.multiply_quantity(quantity)?,
    })
}

/// Prices one raw material inside a customized item.
///
/// `margin` falls back to the 0.30 default when absent.
pub fn price_customized_component(
    material: &RawMaterial,
    quantity: Quantity,
    margin: Option<Margin>,
) -> CoreResult<ComponentPrice> {
    validate_component_quantity(quantity)?;
    if material.base_price_cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "base_price".to_string(),
        }
        .into());
    }

    let unit_price = material.base_price().apply_margin(margin.unwrap_or_default())?;
    Ok(ComponentPrice {
        raw_material_id: material.id.clone(),
        quantity,
        unit_price,
        subtotal: unit_price.times_quantity(quantity)?,
    })
}

/// Sums component subtotals into the customized item's unit price.
pub fn price_customized_item(components: &[ComponentPrice]) -> CoreResult<Money> {
    Money::checked_sum(components.iter().map(|c| c.subtotal))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::MeasureUnit;

    fn material(id: &str, base_price_cents: i64) -> RawMaterial {
        RawMaterial {
            id: id.to_string(),
            name: id.to_string(),
            unit: MeasureUnit::Kg,
            base_price_cents,
            min_stock: Quantity::from_units(1),
            expires_on: None,
        }
    }

    #[test]
    fn test_catalog_line_price() {
        let item = CatalogItem {
            id: "cone".to_string(),
            name: "Cone".to_string(),
            base_price_cents: 250,
            is_ice_cream: true,
        };
        let price = price_catalog_line(&item, 4).unwrap();
        assert_eq!(price.unit_price.cents(), 250);
        assert_eq!(price.subtotal.cents(), 1000);

        assert!(price_catalog_line(&item, 0).is_err());
    }

    #[test]
    fn test_component_with_default_margin() {
        // 4.00 × 1.30 = 5.20; 5.20 × 0.50 = 2.60
        let price =
            price_customized_component(&material("choc", 400), Quantity::from_hundredths(50), None)
                .unwrap();
        assert_eq!(price.unit_price.cents(), 520);
        assert_eq!(price.subtotal.cents(), 260);
    }

    #[test]
    fn test_component_with_explicit_margin() {
        let margin = Margin::from_bps(5000).unwrap();
        let price = price_customized_component(
            &material("milk", 200),
            Quantity::from_hundredths(25),
            Some(margin),
        )
        .unwrap();
        assert_eq!(price.unit_price.cents(), 300);
        assert_eq!(price.subtotal.cents(), 75);
    }

    #[test]
    fn test_component_rejects_zero_quantity() {
        let result = price_customized_component(&material("choc", 400), Quantity::zero(), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_component_quantity_upper_bound() {
        let err = price_customized_component(
            &material("choc", 400),
            Quantity::from_hundredths(90_000_000_000_000_000),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::TooLarge { .. })));

        // 4.00 × 1.30 × 10000.00 = 52000.00
        let price = price_customized_component(
            &material("choc", 400),
            Quantity::from_hundredths(crate::MAX_COMPONENT_HUNDREDTHS),
            None,
        )
        .unwrap();
        assert_eq!(price.subtotal.cents(), 5_200_000);
    }

    #[test]
    fn test_overflowing_prices_are_validation_errors() {
        let item = CatalogItem {
            id: "gold".to_string(),
            name: "Gold sundae".to_string(),
            base_price_cents: i64::MAX / 2,
            is_ice_cream: true,
        };
        assert!(matches!(
            price_catalog_line(&item, 3),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
        assert!(price_customized_component(
            &material("saffron", i64::MAX / 2),
            Quantity::from_hundredths(100),
            None
        )
        .is_err());
    }

    #[test]
    fn test_customized_item_sums_components() {
        let components = vec![
            price_customized_component(&material("choc", 400), Quantity::from_hundredths(50), None)
                .unwrap(),
            price_customized_component(&material("milk", 100), Quantity::from_hundredths(30), None)
                .unwrap(),
        ];
        // 2.60 + round(1.30 × 0.30 = 0.39) = 2.99
        let total = price_customized_item(&components).unwrap();
        assert_eq!(total.cents(), 299);

        let line = LinePrice::customized(total);
        assert_eq!(line.unit_price, line.subtotal);
    }
}
