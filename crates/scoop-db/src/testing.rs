//! Shared fixtures for the in-crate tests.

use chrono::Utc;

use crate::pool::{Database, DbConfig};
use scoop_core::{
    AssignFinishedGood, AssignRawMaterial, Branch, CatalogItem, ComponentRequest, Customer,
    CustomizationRequest, LineRequest, MeasureUnit, NewOrder, Quantity, RawMaterial, StaffMember,
};

pub const BRANCH: &str = "centro";
pub const OTHER_BRANCH: &str = "norte";
pub const STAFF: &str = "s-1";

/// In-memory database with two branches and stock at `centro`:
///
/// | item      | price | centro |
/// |-----------|-------|--------|
/// | cone      | 3.50  | 10     |
/// | waffle    | 5.00  | 10     |
/// | sprinkles | 0.80  | -      |
/// | choc (kg) | 4.00  | 5.00   |
/// | milk (l)  | 1.00  | 10.00  |
pub async fn seeded_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let reference = db.reference();

    for (id, name) in [(BRANCH, "Centro"), (OTHER_BRANCH, "Norte")] {
        reference
            .insert_branch(&Branch {
                id: id.to_string(),
                name: name.to_string(),
                address: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
    }

    reference
        .insert_staff(&StaffMember {
            id: STAFF.to_string(),
            name: "Ana Seller".to_string(),
            username: "ana".to_string(),
            role: "seller".to_string(),
            branch_id: Some(BRANCH.to_string()),
        })
        .await
        .unwrap();

    reference
        .insert_customer(&Customer {
            id: "c-1".to_string(),
            first_name: "Luis".to_string(),
            last_name: Some("Perez".to_string()),
        })
        .await
        .unwrap();

    for (id, price, is_ice_cream) in [("cone", 350, true), ("waffle", 500, true), ("sprinkles", 80, false)] {
        reference
            .insert_catalog_item(&CatalogItem {
                id: id.to_string(),
                name: id.to_string(),
                base_price_cents: price,
                is_ice_cream,
            })
            .await
            .unwrap();
    }

    for (id, unit, price, min) in [("choc", MeasureUnit::Kg, 400, 100), ("milk", MeasureUnit::Liter, 100, 200)] {
        reference
            .insert_raw_material(&RawMaterial {
                id: id.to_string(),
                name: id.to_string(),
                unit,
                base_price_cents: price,
                min_stock: Quantity::from_hundredths(min),
                expires_on: None,
            })
            .await
            .unwrap();
    }

    let inventory = db.inventory();
    for item in ["cone", "waffle"] {
        inventory
            .assign_finished_good(
                BRANCH,
                AssignFinishedGood {
                    catalog_item_id: item.to_string(),
                    initial: 10,
                },
            )
            .await
            .unwrap();
    }
    for (material, stock) in [("choc", 500), ("milk", 1000)] {
        inventory
            .assign_raw_material(
                BRANCH,
                AssignRawMaterial {
                    raw_material_id: material.to_string(),
                    initial: Quantity::from_hundredths(stock),
                },
            )
            .await
            .unwrap();
    }

    db
}

/// An order at `centro` with one catalog line per `(item, quantity)`.
pub fn catalog_order(lines: &[(&str, i64)]) -> NewOrder {
    NewOrder {
        branch_id: BRANCH.to_string(),
        staff_id: STAFF.to_string(),
        customer_id: None,
        payment_method: None,
        lines: lines
            .iter()
            .map(|(item, quantity)| LineRequest::Catalog {
                catalog_item_id: item.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

/// A customized line from `(raw_material_id, hundredths)` pairs, default margin.
pub fn customized_line(components: &[(&str, i64)]) -> LineRequest {
    LineRequest::Customized(CustomizationRequest {
        name: Some("Custom cup".to_string()),
        margin: None,
        components: components
            .iter()
            .map(|(material, hundredths)| ComponentRequest {
                raw_material_id: material.to_string(),
                quantity: Quantity::from_hundredths(*hundredths),
            })
            .collect(),
    })
}
