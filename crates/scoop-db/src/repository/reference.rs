//! # Reference Data Repository
//!
//! Branches, staff, customers, catalog items and raw materials.
//!
//! The fulfillment engine only reads these rows. Lookups are free functions
//! generic over the executor so they run either on the pool or on the
//! connection of an open write transaction:
//!
//! ```rust,ignore
//! let branch = find_branch(db.pool(), "centro").await?;      // pool
//! let branch = require_branch(&mut *tx, "centro").await?;    // inside tx
//! ```
//!
//! Inserts exist for the seed binary and tests.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use scoop_core::{
    Branch, CatalogItem, CoreError, Customer, MeasureUnit, Quantity, RawMaterial, StaffMember,
};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct BranchRow {
    id: String,
    name: String,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Branch {
            id: row.id,
            name: row.name,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct StaffRow {
    id: String,
    name: String,
    username: String,
    role: String,
    branch_id: Option<String>,
}

impl From<StaffRow> for StaffMember {
    fn from(row: StaffRow) -> Self {
        StaffMember {
            id: row.id,
            name: row.name,
            username: row.username,
            role: row.role,
            branch_id: row.branch_id,
        }
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: String,
    first_name: String,
    last_name: Option<String>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[derive(Debug, FromRow)]
struct CatalogItemRow {
    id: String,
    name: String,
    base_price_cents: i64,
    is_ice_cream: bool,
}

impl From<CatalogItemRow> for CatalogItem {
    fn from(row: CatalogItemRow) -> Self {
        CatalogItem {
            id: row.id,
            name: row.name,
            base_price_cents: row.base_price_cents,
            is_ice_cream: row.is_ice_cream,
        }
    }
}

#[derive(Debug, FromRow)]
struct RawMaterialRow {
    id: String,
    name: String,
    unit: MeasureUnit,
    base_price_cents: i64,
    min_stock_hundredths: i64,
    expires_on: Option<NaiveDate>,
}

impl From<RawMaterialRow> for RawMaterial {
    fn from(row: RawMaterialRow) -> Self {
        RawMaterial {
            id: row.id,
            name: row.name,
            unit: row.unit,
            base_price_cents: row.base_price_cents,
            min_stock: Quantity::from_hundredths(row.min_stock_hundredths),
            expires_on: row.expires_on,
        }
    }
}

// =============================================================================
// Lookups
// =============================================================================

pub async fn find_branch<'e, E>(executor: E, id: &str) -> DbResult<Option<Branch>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, BranchRow>(
        "SELECT id, name, address, created_at FROM branches WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(Branch::from))
}

pub async fn find_staff<'e, E>(executor: E, id: &str) -> DbResult<Option<StaffMember>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, StaffRow>(
        "SELECT id, name, username, role, branch_id FROM staff WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(StaffMember::from))
}

pub async fn find_customer<'e, E>(executor: E, id: &str) -> DbResult<Option<Customer>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, first_name, last_name FROM customers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(Customer::from))
}

pub async fn find_catalog_item<'e, E>(executor: E, id: &str) -> DbResult<Option<CatalogItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, CatalogItemRow>(
        "SELECT id, name, base_price_cents, is_ice_cream FROM catalog_items WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(CatalogItem::from))
}

pub async fn find_raw_material<'e, E>(executor: E, id: &str) -> DbResult<Option<RawMaterial>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, RawMaterialRow>(
        r#"
        SELECT id, name, unit, base_price_cents, min_stock_hundredths, expires_on
        FROM raw_materials
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row.map(RawMaterial::from))
}

/// Like [`find_branch`] but a missing branch is `NotFound`.
pub async fn require_branch<'e, E>(executor: E, id: &str) -> DbResult<Branch>
where
    E: Executor<'e, Database = Sqlite>,
{
    find_branch(executor, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Branch", id).into())
}

pub async fn require_staff<'e, E>(executor: E, id: &str) -> DbResult<StaffMember>
where
    E: Executor<'e, Database = Sqlite>,
{
    find_staff(executor, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Staff member", id).into())
}

pub async fn require_customer<'e, E>(executor: E, id: &str) -> DbResult<Customer>
where
    E: Executor<'e, Database = Sqlite>,
{
    find_customer(executor, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Customer", id).into())
}

pub async fn require_catalog_item<'e, E>(executor: E, id: &str) -> DbResult<CatalogItem>
where
    E: Executor<'e, Database = Sqlite>,
{
    find_catalog_item(executor, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Catalog item", id).into())
}

pub async fn require_raw_material<'e, E>(executor: E, id: &str) -> DbResult<RawMaterial>
where
    E: Executor<'e, Database = Sqlite>,
{
    find_raw_material(executor, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Raw material", id).into())
}

// =============================================================================
// Repository
// =============================================================================

/// Pool-backed access to reference data.
#[derive(Debug, Clone)]
pub struct ReferenceRepository {
    pool: SqlitePool,
}

impl ReferenceRepository {
    /// Creates a new ReferenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReferenceRepository { pool }
    }

    pub async fn get_branch(&self, id: &str) -> DbResult<Option<Branch>> {
        find_branch(&self.pool, id).await
    }

    pub async fn get_staff(&self, id: &str) -> DbResult<Option<StaffMember>> {
        find_staff(&self.pool, id).await
    }

    pub async fn get_catalog_item(&self, id: &str) -> DbResult<Option<CatalogItem>> {
        find_catalog_item(&self.pool, id).await
    }

    pub async fn get_raw_material(&self, id: &str) -> DbResult<Option<RawMaterial>> {
        find_raw_material(&self.pool, id).await
    }

    pub async fn list_branches(&self) -> DbResult<Vec<Branch>> {
        let rows = sqlx::query_as::<_, BranchRow>(
            "SELECT id, name, address, created_at FROM branches ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Branch::from).collect())
    }

    pub async fn insert_branch(&self, branch: &Branch) -> DbResult<()> {
        debug!(id = %branch.id, name = %branch.name, "Inserting branch");

        sqlx::query("INSERT INTO branches (id, name, address, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&branch.id)
            .bind(&branch.name)
            .bind(&branch.address)
            .bind(branch.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_staff(&self, staff: &StaffMember) -> DbResult<()> {
        debug!(id = %staff.id, username = %staff.username, "Inserting staff member");

        sqlx::query(
            r#"
            INSERT INTO staff (id, name, username, role, branch_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&staff.id)
        .bind(&staff.name)
        .bind(&staff.username)
        .bind(&staff.role)
        .bind(&staff.branch_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_customer(&self, customer: &Customer) -> DbResult<()> {
        sqlx::query("INSERT INTO customers (id, first_name, last_name) VALUES (?1, ?2, ?3)")
            .bind(&customer.id)
            .bind(&customer.first_name)
            .bind(&customer.last_name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_catalog_item(&self, item: &CatalogItem) -> DbResult<()> {
        debug!(id = %item.id, price = item.base_price_cents, "Inserting catalog item");

        sqlx::query(
            r#"
            INSERT INTO catalog_items (id, name, base_price_cents, is_ice_cream)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.base_price_cents)
        .bind(item.is_ice_cream)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_raw_material(&self, material: &RawMaterial) -> DbResult<()> {
        debug!(id = %material.id, price = material.base_price_cents, "Inserting raw material");

        sqlx::query(
            r#"
            INSERT INTO raw_materials (
                id, name, unit, base_price_cents, min_stock_hundredths, expires_on
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&material.id)
        .bind(&material.name)
        .bind(material.unit)
        .bind(material.base_price_cents)
        .bind(material.min_stock.hundredths())
        .bind(material.expires_on)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_reference_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.reference();

        repo.insert_branch(&Branch {
            id: "centro".to_string(),
            name: "Centro".to_string(),
            address: Some("Main St 1".to_string()),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        repo.insert_raw_material(&RawMaterial {
            id: "choc".to_string(),
            name: "Chocolate base".to_string(),
            unit: MeasureUnit::Kg,
            base_price_cents: 400,
            min_stock: Quantity::from_hundredths(150),
            expires_on: NaiveDate::from_ymd_opt(2026, 12, 31),
        })
        .await
        .unwrap();

        let branch = repo.get_branch("centro").await.unwrap().unwrap();
        assert_eq!(branch.name, "Centro");

        let material = repo.get_raw_material("choc").await.unwrap().unwrap();
        assert_eq!(material.unit, MeasureUnit::Kg);
        assert_eq!(material.min_stock, Quantity::from_hundredths(150));
        assert!(material.expires_on.is_some());
    }

    #[tokio::test]
    async fn test_require_missing_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = require_catalog_item(db.pool(), "ghost").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotFound { ref entity, .. }) if entity == "Catalog item"
        ));
    }
}
