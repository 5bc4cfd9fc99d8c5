//! # Seed Data Generator
//!
//! Populates a database with demo data for two branches.
//!
//! ## Usage
//! ```bash
//! # Seed ./scoop_dev.db
//! cargo run -p scoop-db --bin seed
//!
//! # Specify database path
//! cargo run -p scoop-db --bin seed -- --db ./data/scoop.db
//! ```
//!
//! ## Generated Data
//! - Branches `centro` and `norte`, one manager and one seller each
//! - Ice-cream and topping catalog items, stocked at both branches
//! - Raw materials for customized cups, some seeded below minimum
//! - A few pending orders at `centro`, one of them confirmed

use anyhow::Context;
use chrono::{Duration, Utc};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scoop_core::{
    AssignFinishedGood, AssignRawMaterial, Branch, CatalogItem, ComponentRequest, Customer,
    CustomizationRequest, LineRequest, MeasureUnit, NewOrder, PaymentMethod, Quantity,
    RawMaterial, StaffMember,
};
use scoop_db::{Database, DbConfig};

const BRANCHES: &[(&str, &str, &str)] = &[
    ("centro", "Centro", "Av. Principal 100"),
    ("norte", "Norte", "Calle 45 #12"),
];

/// (id, name, username, role, branch)
const STAFF: &[(&str, &str, &str, &str, &str)] = &[
    ("m-centro", "Marta Rojas", "marta", "branch_manager", "centro"),
    ("s-centro", "Ana Gil", "ana", "seller", "centro"),
    ("m-norte", "Pablo Ruiz", "pablo", "branch_manager", "norte"),
    ("s-norte", "Leo Vega", "leo", "seller", "norte"),
];

/// (id, name, price cents, is ice cream, stock per branch)
const CATALOG: &[(&str, &str, i64, bool, i64)] = &[
    ("cone-vanilla", "Vanilla cone", 350, true, 40),
    ("cone-chocolate", "Chocolate cone", 380, true, 40),
    ("cup-strawberry", "Strawberry cup", 420, true, 25),
    ("sundae", "Classic sundae", 650, true, 15),
    ("waffle", "Waffle cone", 120, false, 60),
    ("sprinkles", "Sprinkles", 80, false, 100),
];

/// (id, name, unit, price cents, min stock hundredths, stock hundredths, expires in days)
const MATERIALS: &[(&str, &str, MeasureUnit, i64, i64, i64, Option<i64>)] = &[
    ("cocoa", "Cocoa", MeasureUnit::Kg, 900, 200, 1500, Some(120)),
    ("milk", "Whole milk", MeasureUnit::Liter, 110, 1000, 800, Some(7)),
    ("cream", "Heavy cream", MeasureUnit::Liter, 420, 500, 1200, Some(10)),
    ("strawberry", "Strawberries", MeasureUnit::Kg, 650, 300, 250, Some(4)),
    ("nuts", "Chopped nuts", MeasureUnit::Kg, 1400, 100, 600, None),
    ("syrup", "Caramel syrup", MeasureUnit::Liter, 520, 200, 900, None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./scoop_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Scoop Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./scoop_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;
    info!(path = %db_path, "Connected, migrations applied");

    let reference = db.reference();
    if !reference.list_branches().await?.is_empty() {
        info!("Database already has branches; delete the file to regenerate");
        return Ok(());
    }

    for (id, name, address) in BRANCHES {
        reference
            .insert_branch(&Branch {
                id: id.to_string(),
                name: name.to_string(),
                address: Some(address.to_string()),
                created_at: Utc::now(),
            })
            .await?;
    }

    for (id, name, username, role, branch) in STAFF {
        reference
            .insert_staff(&StaffMember {
                id: id.to_string(),
                name: name.to_string(),
                username: username.to_string(),
                role: role.to_string(),
                branch_id: Some(branch.to_string()),
            })
            .await?;
    }

    reference
        .insert_customer(&Customer {
            id: "c-walkin".to_string(),
            first_name: "Sofia".to_string(),
            last_name: Some("Mendez".to_string()),
        })
        .await?;

    let today = Utc::now().date_naive();
    for (id, name, unit, price, min, _, expires_in) in MATERIALS {
        reference
            .insert_raw_material(&RawMaterial {
                id: id.to_string(),
                name: name.to_string(),
                unit: *unit,
                base_price_cents: *price,
                min_stock: Quantity::from_hundredths(*min),
                expires_on: expires_in.map(|days| today + Duration::days(days)),
            })
            .await?;
    }

    for (id, name, price, is_ice_cream, _) in CATALOG {
        reference
            .insert_catalog_item(&CatalogItem {
                id: id.to_string(),
                name: name.to_string(),
                base_price_cents: *price,
                is_ice_cream: *is_ice_cream,
            })
            .await?;
    }

    let inventory = db.inventory();
    for (branch, _, _) in BRANCHES {
        for (id, _, _, _, stock) in CATALOG {
            inventory
                .assign_finished_good(
                    branch,
                    AssignFinishedGood {
                        catalog_item_id: id.to_string(),
                        initial: *stock,
                    },
                )
                .await?;
        }
        for (id, _, _, _, _, stock, _) in MATERIALS {
            inventory
                .assign_raw_material(
                    branch,
                    AssignRawMaterial {
                        raw_material_id: id.to_string(),
                        initial: Quantity::from_hundredths(*stock),
                    },
                )
                .await?;
        }
    }
    info!(
        branches = BRANCHES.len(),
        catalog = CATALOG.len(),
        materials = MATERIALS.len(),
        "Reference data and stock seeded"
    );

    let orders = db.orders();
    let first = orders
        .create(NewOrder {
            branch_id: "centro".to_string(),
            staff_id: "s-centro".to_string(),
            customer_id: Some("c-walkin".to_string()),
            payment_method: Some(PaymentMethod::Card),
            lines: vec![
                LineRequest::Catalog {
                    catalog_item_id: "cone-vanilla".to_string(),
                    quantity: 2,
                },
                LineRequest::Customized(CustomizationRequest {
                    name: Some("Cocoa nut cup".to_string()),
                    margin: None,
                    components: vec![
                        ComponentRequest {
                            raw_material_id: "cocoa".to_string(),
                            quantity: Quantity::from_hundredths(15),
                        },
                        ComponentRequest {
                            raw_material_id: "cream".to_string(),
                            quantity: Quantity::from_hundredths(20),
                        },
                        ComponentRequest {
                            raw_material_id: "nuts".to_string(),
                            quantity: Quantity::from_hundredths(5),
                        },
                    ],
                }),
            ],
        })
        .await?;
    orders.confirm(&first.id).await?;

    let second = orders
        .create(NewOrder {
            branch_id: "centro".to_string(),
            staff_id: "s-centro".to_string(),
            customer_id: None,
            payment_method: None,
            lines: vec![
                LineRequest::Catalog {
                    catalog_item_id: "sundae".to_string(),
                    quantity: 1,
                },
                LineRequest::Catalog {
                    catalog_item_id: "sprinkles".to_string(),
                    quantity: 3,
                },
            ],
        })
        .await?;

    info!(paid = %first.id, pending = %second.id, "Demo orders created");

    let alerts = inventory.low_stock_alerts("centro").await?;
    for alert in &alerts {
        info!(
            material = %alert.name,
            current = %alert.current,
            minimum = %alert.minimum,
            "Low stock"
        );
    }

    db.close().await;
    info!("Seed complete");
    Ok(())
}
