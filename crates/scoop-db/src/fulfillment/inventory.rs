//! Inventory operations: transfers, adjustments, assignments and listings.

use sqlx::SqlitePool;

use super::movements;
use crate::error::DbResult;
use crate::pool::begin_write;
use crate::repository::reference::require_branch;
use crate::repository::stock;
use scoop_core::{
    AssignFinishedGood, AssignRawMaterial, FinishedGoodLevel, FinishedGoodStock,
    FinishedGoodStockView, LowStockAlert, RawMaterialAdjustment, RawMaterialLevel,
    RawMaterialStock, RawMaterialStockView, TransferOutcome, TransferRequest,
};

/// Stock use cases over a connection pool.
#[derive(Debug, Clone)]
pub struct InventoryService {
    pool: SqlitePool,
}

impl InventoryService {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryService { pool }
    }

    /// Moves finished goods from one branch to another atomically.
    pub async fn transfer(&self, request: TransferRequest) -> DbResult<TransferOutcome> {
        request.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let outcome = movements::transfer(&mut tx, &request).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    pub async fn adjust_finished_good(
        &self,
        branch_id: &str,
        catalog_item_id: &str,
        level: FinishedGoodLevel,
    ) -> DbResult<FinishedGoodStock> {
        level.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let record = movements::adjust_finished_good(&mut tx, branch_id, catalog_item_id, &level).await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn adjust_raw_material(
        &self,
        branch_id: &str,
        raw_material_id: &str,
        level: RawMaterialLevel,
    ) -> DbResult<RawMaterialAdjustment> {
        level.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let adjustment =
            movements::adjust_raw_material(&mut tx, branch_id, raw_material_id, &level).await?;
        tx.commit().await?;
        Ok(adjustment)
    }

    /// Creates a finished-good record. An existing record is a conflict.
    pub async fn assign_finished_good(
        &self,
        branch_id: &str,
        assignment: AssignFinishedGood,
    ) -> DbResult<FinishedGoodStock> {
        assignment.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let record = movements::assign_finished_good(&mut tx, branch_id, &assignment).await?;
        tx.commit().await?;
        Ok(record)
    }

    /// Creates a raw-material record. An existing record is a conflict.
    pub async fn assign_raw_material(
        &self,
        branch_id: &str,
        assignment: AssignRawMaterial,
    ) -> DbResult<RawMaterialStock> {
        assignment.validate()?;

        let mut tx = begin_write(&self.pool).await?;
        let record = movements::assign_raw_material(&mut tx, branch_id, &assignment).await?;
        tx.commit().await?;
        Ok(record)
    }

    pub async fn list_finished_goods(&self, branch_id: &str) -> DbResult<Vec<FinishedGoodStockView>> {
        let mut conn = self.pool.acquire().await?;
        require_branch(&mut *conn, branch_id).await?;
        stock::list_finished_goods(&mut *conn, branch_id).await
    }

    /// Raw-material inventory with a `low_stock` flag per row.
    pub async fn list_raw_materials(
        &self,
        branch_id: &str,
        low_stock_only: bool,
    ) -> DbResult<Vec<RawMaterialStockView>> {
        let mut conn = self.pool.acquire().await?;
        require_branch(&mut *conn, branch_id).await?;
        stock::list_raw_materials(&mut *conn, branch_id, low_stock_only).await
    }

    pub async fn low_stock_alerts(&self, branch_id: &str) -> DbResult<Vec<LowStockAlert>> {
        let mut conn = self.pool.acquire().await?;
        require_branch(&mut *conn, branch_id).await?;
        stock::low_stock_alerts(&mut *conn, branch_id).await
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::testing::{seeded_db, BRANCH, OTHER_BRANCH};
    use scoop_core::{CoreError, Quantity, RawMaterialLevel};

    #[tokio::test]
    async fn test_product_listing_is_per_branch() {
        let db = seeded_db().await;
        let inventory = db.inventory();

        let centro = inventory.list_finished_goods(BRANCH).await.unwrap();
        let ids: Vec<_> = centro.iter().map(|row| row.catalog_item_id.as_str()).collect();
        assert_eq!(ids, ["cone", "waffle"]);
        assert!(centro.iter().all(|row| row.available == 10));

        assert!(inventory.list_finished_goods(OTHER_BRANCH).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_low_stock_filter_and_alert_order() {
        let db = seeded_db().await;
        let inventory = db.inventory();

        assert!(inventory.low_stock_alerts(BRANCH).await.unwrap().is_empty());

        for (material, hundredths) in [("milk", 150), ("choc", 20)] {
            inventory
                .adjust_raw_material(
                    BRANCH,
                    material,
                    RawMaterialLevel {
                        stock: Quantity::from_hundredths(hundredths),
                        reason: None,
                    },
                )
                .await
                .unwrap();
        }

        let low = inventory.list_raw_materials(BRANCH, true).await.unwrap();
        assert_eq!(low.len(), 2);
        assert!(low.iter().all(|row| row.low_stock));

        let alerts = inventory.low_stock_alerts(BRANCH).await.unwrap();
        assert_eq!(alerts[0].raw_material_id, "choc");
        assert_eq!(alerts[0].shortfall, Quantity::from_hundredths(80));
        assert_eq!(alerts[1].raw_material_id, "milk");
        assert_eq!(alerts[1].shortfall, Quantity::from_hundredths(50));
    }

    #[tokio::test]
    async fn test_listings_reject_unknown_branch() {
        let db = seeded_db().await;
        let err = db.inventory().low_stock_alerts("sur").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::NotFound { .. }) | DbError::NotFound { .. }
        ));
    }
}
