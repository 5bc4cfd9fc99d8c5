//! # Orders: Requests, State Machine, Settlement Plan
//!
//! Everything about an order that can be decided without touching storage.
//!
//! ## Request Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Wire (JSON)                         Domain                             │
//! │  ──────────────────────────────      ─────────────────────────────────  │
//! │  RawLineRequest {                    LineRequest::Catalog {             │
//! │    kind?, catalog_item_id?,   ──►      catalog_item_id, quantity }      │
//! │    customization?, quantity?  TryFrom                                   │
//! │  }                                   LineRequest::Customized(           │
//! │                                        CustomizationRequest { .. })     │
//! │                                                                         │
//! │  Both or neither payload supplied ──► ValidationError                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine
//! ```text
//!              ┌──────── Settle ────────► Paid ──────┐
//!   Pending ───┤                                     ├──► (no transitions)
//!              └──────── Cancel ────────► Cancelled ─┘
//! ```
//!
//! ## Settlement Plan
//! [`plan_settlement`] turns an order's lines into stock demands: duplicates
//! aggregated, finished goods before raw materials, each ascending by id.
//! Every settlement locks rows in that order so no two settlements can wait
//! on each other in a cycle.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::quantity::{Margin, Quantity};
use crate::types::{LineItem, LineItemKind, OrderState, PaymentMethod, StockPool};
use crate::validation::{
    validate_component_quantity, validate_id, validate_line_quantity, validate_optional_text,
    ValidationResult,
};
use crate::{MAX_COMPONENTS_PER_ITEM, MAX_ORDER_LINES};

/// Longest display name accepted for a customized item.
pub const MAX_CUSTOM_NAME_LEN: usize = 100;

// =============================================================================
// Line Requests
// =============================================================================

/// Discriminator carried by the wire form of a line request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Catalog,
    Customized,
}

/// A line request as it arrives over the wire.
///
/// Every field is optional here; [`LineRequest::try_from`] decides whether
/// the combination names exactly one kind of line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawLineRequest {
    #[serde(default)]
    pub kind: Option<LineKind>,
    #[serde(default)]
    pub catalog_item_id: Option<String>,
    #[serde(default)]
    pub customization: Option<CustomizationRequest>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// A customized item to compose from raw materials.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomizationRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to 0.30 when absent.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub margin: Option<Margin>,
    #[serde(default)]
    pub components: Vec<ComponentRequest>,
}

impl CustomizationRequest {
    pub fn margin_or_default(&self) -> Margin {
        self.margin.unwrap_or_default()
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_optional_text("name", self.name.as_deref(), MAX_CUSTOM_NAME_LEN)?;

        if self.components.is_empty() {
            return Err(ValidationError::Required {
                field: "components".to_string(),
            });
        }
        if self.components.len() > MAX_COMPONENTS_PER_ITEM {
            return Err(ValidationError::OutOfRange {
                field: "components".to_string(),
                min: 1,
                max: MAX_COMPONENTS_PER_ITEM as i64,
            });
        }

        let mut seen = HashSet::new();
        for (index, component) in self.components.iter().enumerate() {
            let prefix = format!("components[{}]", index);
            validate_id("raw_material_id", &component.raw_material_id)
                .map_err(|e| e.within(&prefix))?;
            validate_component_quantity(component.quantity).map_err(|e| e.within(&prefix))?;

            if !seen.insert(component.raw_material_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "raw_material_id".to_string(),
                    value: component.raw_material_id.clone(),
                }
                .within(&prefix));
            }
        }
        Ok(())
    }
}

/// One raw material and how much of it goes into a customized item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentRequest {
    pub raw_material_id: String,
    #[ts(type = "string")]
    pub quantity: Quantity,
}

/// A validated line request: exactly one kind of line.
#[derive(Debug, Clone)]
pub enum LineRequest {
    Catalog {
        catalog_item_id: String,
        quantity: i64,
    },
    /// Always sold as quantity 1; the price aggregates the composition.
    Customized(CustomizationRequest),
}

impl LineRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        match self {
            LineRequest::Catalog {
                catalog_item_id,
                quantity,
            } => {
                validate_id("catalog_item_id", catalog_item_id)?;
                validate_line_quantity(*quantity)
            }
            LineRequest::Customized(customization) => customization.validate(),
        }
    }

    pub const fn kind(&self) -> LineKind {
        match self {
            LineRequest::Catalog { .. } => LineKind::Catalog,
            LineRequest::Customized(_) => LineKind::Customized,
        }
    }
}

impl TryFrom<RawLineRequest> for LineRequest {
    type Error = ValidationError;

    fn try_from(raw: RawLineRequest) -> Result<Self, Self::Error> {
        let line = match (raw.catalog_item_id, raw.customization) {
            (Some(_), Some(_)) => {
                return Err(ValidationError::Exclusive {
                    first: "catalog_item_id".to_string(),
                    second: "customization".to_string(),
                })
            }
            (None, None) => {
                return Err(ValidationError::OneRequired {
                    first: "catalog_item_id".to_string(),
                    second: "customization".to_string(),
                })
            }
            (Some(catalog_item_id), None) => {
                let quantity = raw.quantity.ok_or_else(|| ValidationError::Required {
                    field: "quantity".to_string(),
                })?;
                LineRequest::Catalog {
                    catalog_item_id,
                    quantity,
                }
            }
            (None, Some(customization)) => {
                if let Some(quantity) = raw.quantity {
                    if quantity != 1 {
                        return Err(ValidationError::OutOfRange {
                            field: "quantity".to_string(),
                            min: 1,
                            max: 1,
                        });
                    }
                }
                LineRequest::Customized(customization)
            }
        };

        if let Some(kind) = raw.kind {
            if kind != line.kind() {
                return Err(ValidationError::InvalidFormat {
                    field: "kind".to_string(),
                    reason: format!("kind does not match the supplied {:?} payload", line.kind())
                        .to_lowercase(),
                });
            }
        }

        line.validate()?;
        Ok(line)
    }
}

// =============================================================================
// New Order
// =============================================================================

/// Wire form of a create-order request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    pub branch_id: String,
    pub staff_id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub lines: Vec<RawLineRequest>,
}

/// A validated order ready for the composer.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub branch_id: String,
    pub staff_id: String,
    /// None for anonymous orders.
    pub customer_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub lines: Vec<LineRequest>,
}

impl NewOrder {
    /// Checks identifiers and every line before any storage is touched.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("branch_id", &self.branch_id)?;
        validate_id("staff_id", &self.staff_id)?;
        if let Some(customer_id) = &self.customer_id {
            validate_id("customer_id", customer_id)?;
        }

        if self.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".to_string(),
            });
        }
        if self.lines.len() > MAX_ORDER_LINES {
            return Err(ValidationError::OutOfRange {
                field: "lines".to_string(),
                min: 1,
                max: MAX_ORDER_LINES as i64,
            });
        }

        for (index, line) in self.lines.iter().enumerate() {
            line.validate()
                .map_err(|e| e.within(format!("lines[{}]", index)))?;
        }
        Ok(())
    }
}

impl TryFrom<CreateOrderRequest> for NewOrder {
    type Error = ValidationError;

    fn try_from(request: CreateOrderRequest) -> Result<Self, Self::Error> {
        let lines = request
            .lines
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                LineRequest::try_from(raw).map_err(|e| e.within(format!("lines[{}]", index)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let order = NewOrder {
            branch_id: request.branch_id,
            staff_id: request.staff_id,
            customer_id: request.customer_id,
            payment_method: request.payment_method,
            lines,
        };
        order.validate()?;
        Ok(order)
    }
}

// =============================================================================
// Patch + State Machine
// =============================================================================

/// Partial update of an order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPatch {
    #[serde(default)]
    pub state: Option<OrderState>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl OrderPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.state.is_none() && self.payment_method.is_none() {
            return Err(ValidationError::OneRequired {
                first: "state".to_string(),
                second: "payment_method".to_string(),
            });
        }
        Ok(())
    }
}

/// What a requested state change requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Pending → Pending.
    Unchanged,
    /// Pending → Paid: run settlement.
    Settle,
    /// Pending → Cancelled: no stock effect.
    Cancel,
}

impl OrderState {
    /// Decides whether `self → to` is allowed.
    ///
    /// Paid and Cancelled are terminal: every transition out of them,
    /// including re-confirming a paid order, is an `InvalidTransition`.
    pub fn transition(self, order_id: &str, to: OrderState) -> CoreResult<Transition> {
        match (self, to) {
            (OrderState::Pending, OrderState::Pending) => Ok(Transition::Unchanged),
            (OrderState::Pending, OrderState::Paid) => Ok(Transition::Settle),
            (OrderState::Pending, OrderState::Cancelled) => Ok(Transition::Cancel),
            (from, to) => Err(CoreError::InvalidTransition {
                order_id: order_id.to_string(),
                from,
                to,
            }),
        }
    }
}

// =============================================================================
// Settlement Plan
// =============================================================================

/// One stock decrement required to settle an order.
///
/// The derived `Ord` is the lock order: finished goods before raw
/// materials, then ascending item id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum StockDemand {
    FinishedGood {
        catalog_item_id: String,
        units: i64,
    },
    RawMaterial {
        raw_material_id: String,
        quantity: Quantity,
    },
}

impl StockDemand {
    pub const fn pool(&self) -> StockPool {
        match self {
            StockDemand::FinishedGood { .. } => StockPool::FinishedGood,
            StockDemand::RawMaterial { .. } => StockPool::RawMaterial,
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            StockDemand::FinishedGood {
                catalog_item_id, ..
            } => catalog_item_id,
            StockDemand::RawMaterial {
                raw_material_id, ..
            } => raw_material_id,
        }
    }

    /// Requested amount as a quantity (finished goods as whole units).
    pub fn requested(&self) -> Quantity {
        match self {
            StockDemand::FinishedGood { units, .. } => Quantity::from_units(*units),
            StockDemand::RawMaterial { quantity, .. } => *quantity,
        }
    }
}

/// Builds the ordered, aggregated list of stock decrements for an order.
///
/// Catalog lines demand `line.quantity` units of their item; customized
/// lines demand each component's quantity of its raw material. An aggregate
/// that does not fit in i64 is a validation error.
pub fn plan_settlement(lines: &[LineItem]) -> CoreResult<Vec<StockDemand>> {
    let mut finished: BTreeMap<&str, i64> = BTreeMap::new();
    let mut raw: BTreeMap<&str, Quantity> = BTreeMap::new();

    for line in lines {
        match &line.item {
            LineItemKind::Catalog {
                catalog_item_id, ..
            } => {
                let units = finished.entry(catalog_item_id.as_str()).or_insert(0);
                *units = units
                    .checked_add(line.quantity)
                    .ok_or_else(|| demand_too_large(catalog_item_id))?;
            }
            LineItemKind::Customized(item) => {
                for component in &item.components {
                    let total = raw.entry(component.raw_material_id.as_str()).or_default();
                    *total = total
                        .checked_add(component.quantity)
                        .ok_or_else(|| demand_too_large(&component.raw_material_id))?;
                }
            }
        }
    }

    let finished = finished
        .into_iter()
        .map(|(id, units)| StockDemand::FinishedGood {
            catalog_item_id: id.to_string(),
            units,
        });
    let raw = raw.into_iter().map(|(id, quantity)| StockDemand::RawMaterial {
        raw_material_id: id.to_string(),
        quantity,
    });

    Ok(finished.chain(raw).collect())
}

fn demand_too_large(item_id: &str) -> CoreError {
    ValidationError::TooLarge {
        field: format!("demand for {}", item_id),
        max: Quantity::from_hundredths(i64::MAX).to_string(),
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Component, CustomizedItem, MeasureUnit};
    use chrono::Utc;

    fn customization(components: &[(&str, i64)]) -> CustomizationRequest {
        CustomizationRequest {
            name: Some("Sundae".to_string()),
            margin: None,
            components: components
                .iter()
                .map(|(id, hundredths)| ComponentRequest {
                    raw_material_id: id.to_string(),
                    quantity: Quantity::from_hundredths(*hundredths),
                })
                .collect(),
        }
    }

    fn catalog_line(id: &str, item: &str, quantity: i64) -> LineItem {
        LineItem {
            id: id.to_string(),
            position: 0,
            quantity,
            unit_price_cents: 100,
            subtotal_cents: 100 * quantity,
            item: LineItemKind::Catalog {
                catalog_item_id: item.to_string(),
                name: item.to_string(),
            },
        }
    }

    fn customized_line(id: &str, components: &[(&str, i64)]) -> LineItem {
        LineItem {
            id: id.to_string(),
            position: 0,
            quantity: 1,
            unit_price_cents: 0,
            subtotal_cents: 0,
            item: LineItemKind::Customized(CustomizedItem {
                id: format!("ci-{}", id),
                name: None,
                margin: Margin::default(),
                created_at: Utc::now(),
                components: components
                    .iter()
                    .map(|(material, hundredths)| Component {
                        raw_material_id: material.to_string(),
                        name: material.to_string(),
                        unit: MeasureUnit::Kg,
                        quantity: Quantity::from_hundredths(*hundredths),
                        unit_price_cents: 0,
                        subtotal_cents: 0,
                    })
                    .collect(),
            }),
        }
    }

    #[test]
    fn test_raw_line_with_both_payloads_is_rejected() {
        let raw = RawLineRequest {
            kind: None,
            catalog_item_id: Some("cone".to_string()),
            customization: Some(customization(&[("m1", 50)])),
            quantity: Some(1),
        };
        let err = LineRequest::try_from(raw).unwrap_err();
        assert!(matches!(err, ValidationError::Exclusive { .. }));
    }

    #[test]
    fn test_raw_line_with_neither_payload_is_rejected() {
        let raw = RawLineRequest {
            kind: Some(LineKind::Catalog),
            quantity: Some(2),
            ..Default::default()
        };
        let err = LineRequest::try_from(raw).unwrap_err();
        assert!(matches!(err, ValidationError::OneRequired { .. }));
    }

    #[test]
    fn test_raw_line_kind_mismatch_is_rejected() {
        let raw = RawLineRequest {
            kind: Some(LineKind::Customized),
            catalog_item_id: Some("cone".to_string()),
            quantity: Some(2),
            ..Default::default()
        };
        let err = LineRequest::try_from(raw).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_catalog_line_requires_positive_quantity() {
        let raw = RawLineRequest {
            catalog_item_id: Some("cone".to_string()),
            quantity: Some(0),
            ..Default::default()
        };
        assert!(LineRequest::try_from(raw).is_err());

        let raw = RawLineRequest {
            catalog_item_id: Some("cone".to_string()),
            quantity: None,
            ..Default::default()
        };
        let err = LineRequest::try_from(raw).unwrap_err();
        assert!(matches!(err, ValidationError::Required { .. }));
    }

    #[test]
    fn test_customized_line_quantity_must_be_one() {
        let raw = RawLineRequest {
            customization: Some(customization(&[("m1", 50)])),
            quantity: Some(3),
            ..Default::default()
        };
        assert!(LineRequest::try_from(raw).is_err());

        let raw = RawLineRequest {
            kind: Some(LineKind::Customized),
            customization: Some(customization(&[("m1", 50)])),
            quantity: None,
            ..Default::default()
        };
        let line = LineRequest::try_from(raw).unwrap();
        assert_eq!(line.kind(), LineKind::Customized);
    }

    #[test]
    fn test_customization_requires_components() {
        let raw = RawLineRequest {
            customization: Some(customization(&[])),
            ..Default::default()
        };
        let err = LineRequest::try_from(raw).unwrap_err();
        assert_eq!(err.to_string(), "components is required");
    }

    #[test]
    fn test_customization_rejects_duplicate_and_zero_components() {
        let err = customization(&[("m1", 50), ("m1", 25)]).validate().unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { .. }));

        let err = customization(&[("m1", 0)]).validate().unwrap_err();
        assert_eq!(err.to_string(), "components[0].quantity must be positive");
    }

    #[test]
    fn test_create_order_request_json() {
        let json = r#"{
            "branch_id": "centro",
            "staff_id": "s-1",
            "lines": [
                { "kind": "catalog", "catalog_item_id": "cone", "quantity": 2 },
                { "kind": "customized", "customization": {
                    "name": "Sundae", "margin": "0.30",
                    "components": [{ "raw_material_id": "m1", "quantity": "0.50" }]
                } }
            ]
        }"#;
        let request: CreateOrderRequest = serde_json::from_str(json).unwrap();
        let order = NewOrder::try_from(request).unwrap();
        assert_eq!(order.lines.len(), 2);
        assert!(order.customer_id.is_none());
        assert!(matches!(order.lines[1], LineRequest::Customized(_)));
    }

    #[test]
    fn test_new_order_errors_name_the_line() {
        let request = CreateOrderRequest {
            branch_id: "centro".to_string(),
            staff_id: "s-1".to_string(),
            customer_id: None,
            payment_method: None,
            lines: vec![
                RawLineRequest {
                    catalog_item_id: Some("cone".to_string()),
                    quantity: Some(1),
                    ..Default::default()
                },
                RawLineRequest::default(),
            ],
        };
        let err = NewOrder::try_from(request).unwrap_err();
        assert_eq!(
            err.to_string(),
            "one of lines[1].catalog_item_id or lines[1].customization is required"
        );
    }

    #[test]
    fn test_new_order_requires_lines() {
        let order = NewOrder {
            branch_id: "centro".to_string(),
            staff_id: "s-1".to_string(),
            customer_id: None,
            payment_method: None,
            lines: vec![],
        };
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_transitions() {
        let pending = OrderState::Pending;
        assert_eq!(pending.transition("o", OrderState::Paid).unwrap(), Transition::Settle);
        assert_eq!(pending.transition("o", OrderState::Cancelled).unwrap(), Transition::Cancel);
        assert_eq!(pending.transition("o", OrderState::Pending).unwrap(), Transition::Unchanged);

        for from in [OrderState::Paid, OrderState::Cancelled] {
            for to in [OrderState::Pending, OrderState::Paid, OrderState::Cancelled] {
                let err = from.transition("o", to).unwrap_err();
                assert!(matches!(err, CoreError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        assert!(OrderPatch::default().validate().is_err());
        let patch = OrderPatch {
            state: None,
            payment_method: Some(PaymentMethod::Card),
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_settlement_plan_aggregates_and_orders() {
        let lines = vec![
            customized_line("l1", &[("milk", 50), ("cocoa", 10)]),
            catalog_line("l2", "waffle", 2),
            catalog_line("l3", "cone", 1),
            catalog_line("l4", "waffle", 3),
            customized_line("l5", &[("milk", 25)]),
        ];

        let plan = plan_settlement(&lines).unwrap();
        assert_eq!(
            plan,
            vec![
                StockDemand::FinishedGood {
                    catalog_item_id: "cone".to_string(),
                    units: 1
                },
                StockDemand::FinishedGood {
                    catalog_item_id: "waffle".to_string(),
                    units: 5
                },
                StockDemand::RawMaterial {
                    raw_material_id: "cocoa".to_string(),
                    quantity: Quantity::from_hundredths(10)
                },
                StockDemand::RawMaterial {
                    raw_material_id: "milk".to_string(),
                    quantity: Quantity::from_hundredths(75)
                },
            ]
        );

        let mut sorted = plan.clone();
        sorted.sort();
        assert_eq!(sorted, plan);
        assert_eq!(plan[1].requested(), Quantity::from_units(5));
        assert_eq!(plan[3].pool(), StockPool::RawMaterial);
    }

    #[test]
    fn test_settlement_plan_rejects_overflowing_demand() {
        let mut lines = vec![catalog_line("l1", "cone", 1), catalog_line("l2", "cone", 1)];
        lines[0].quantity = i64::MAX;
        assert!(matches!(
            plan_settlement(&lines),
            Err(CoreError::Validation(ValidationError::TooLarge { .. }))
        ));
    }
}
