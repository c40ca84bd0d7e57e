//! Registry of the tables the demo service owns, with seed and reset
//! pipelines over them.

use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::entities;
use crate::errors::ServiceError;

/// Every table the demo service may seed or wipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedTable {
    Supplier,
    Product,
    DistributionCenter,
    Inventory,
    Retailer,
    Shipment,
    LineItem,
    Demo,
    ErpUser,
    ErpUserRole,
}

/// Runs `$body` with `$module` bound to the entity module backing `$table`.
macro_rules! with_entity {
    ($table:expr, $module:ident => $body:expr) => {
        match $table {
            ManagedTable::Supplier => {
                use entities::supplier as $module;
                $body
            }
            ManagedTable::Product => {
                use entities::product as $module;
                $body
            }
            ManagedTable::DistributionCenter => {
                use entities::distribution_center as $module;
                $body
            }
            ManagedTable::Inventory => {
                use entities::inventory as $module;
                $body
            }
            ManagedTable::Retailer => {
                use entities::retailer as $module;
                $body
            }
            ManagedTable::Shipment => {
                use entities::shipment as $module;
                $body
            }
            ManagedTable::LineItem => {
                use entities::line_item as $module;
                $body
            }
            ManagedTable::Demo => {
                use entities::demo as $module;
                $body
            }
            ManagedTable::ErpUser => {
                use entities::erp_user as $module;
                $body
            }
            ManagedTable::ErpUserRole => {
                use entities::erp_user_role as $module;
                $body
            }
        }
    };
}

impl ManagedTable {
    /// Reference data, in the order it is seeded
    pub const SEEDED: [ManagedTable; 7] = [
        ManagedTable::Supplier,
        ManagedTable::Product,
        ManagedTable::DistributionCenter,
        ManagedTable::Inventory,
        ManagedTable::Retailer,
        ManagedTable::Shipment,
        ManagedTable::LineItem,
    ];

    /// Order in which a reset wipes tables
    pub const RESET_ORDER: [ManagedTable; 10] = [
        ManagedTable::Supplier,
        ManagedTable::Product,
        ManagedTable::DistributionCenter,
        ManagedTable::Inventory,
        ManagedTable::Retailer,
        ManagedTable::Shipment,
        ManagedTable::LineItem,
        ManagedTable::Demo,
        ManagedTable::ErpUser,
        ManagedTable::ErpUserRole,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ManagedTable::Supplier => "Supplier",
            ManagedTable::Product => "Product",
            ManagedTable::DistributionCenter => "DistributionCenter",
            ManagedTable::Inventory => "Inventory",
            ManagedTable::Retailer => "Retailer",
            ManagedTable::Shipment => "Shipment",
            ManagedTable::LineItem => "LineItem",
            ManagedTable::Demo => "Demo",
            ManagedTable::ErpUser => "ERPUser",
            ManagedTable::ErpUserRole => "ERPUserRole",
        }
    }

    /// Seed file for this table, e.g. `distributioncenter.json`
    pub fn seed_file_name(self) -> String {
        format!("{}.json", self.name().to_lowercase())
    }

    pub async fn count(self, db: &DatabaseConnection) -> Result<u64, ServiceError> {
        with_entity!(self, entity => {
            Ok(entity::Entity::find().count(db).await?)
        })
    }

    /// Deletes every row, returning how many went away
    pub async fn delete_all(self, db: &DatabaseConnection) -> Result<u64, ServiceError> {
        with_entity!(self, entity => {
            Ok(entity::Entity::delete_many().exec(db).await?.rows_affected)
        })
    }

    /// Inserts the records of a JSON array document, returning how many were written.
    pub async fn insert_from_json(
        self,
        db: &DatabaseConnection,
        raw: &str,
    ) -> Result<u64, ServiceError> {
        with_entity!(self, entity => {
            let records: Vec<entity::Model> = serde_json::from_str(raw).map_err(|e| {
                ServiceError::SeedData(format!("{}: {}", self.seed_file_name(), e))
            })?;
            let inserted = records.len() as u64;
            if records.is_empty() {
                return Ok(0);
            }

            let models: Vec<entity::ActiveModel> =
                records.into_iter().map(Into::into).collect();
            entity::Entity::insert_many(models).exec(db).await?;
            Ok(inserted)
        })
    }

    /// Loads `<seed_dir>/<seed file>` into an empty table.
    pub async fn seed_from(
        self,
        db: &DatabaseConnection,
        seed_dir: &Path,
    ) -> Result<u64, ServiceError> {
        let path = seed_dir.join(self.seed_file_name());
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ServiceError::SeedData(format!("{}: {}", path.display(), e)))?;
        self.insert_from_json(db, &raw).await
    }
}

impl fmt::Display for ManagedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of seeding one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeededTable {
    pub table: String,
    /// Rows found before seeding; non-zero means the table was skipped
    pub existing: u64,
    pub inserted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub tables: Vec<SeededTable>,
}

impl SeedReport {
    pub fn total_inserted(&self) -> u64 {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn table(&self, name: &str) -> Option<&SeededTable> {
        self.tables.iter().find(|t| t.table == name)
    }
}

/// Outcome of wiping one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearedTable {
    pub table: String,
    pub deleted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub tables: Vec<ClearedTable>,
}

impl ResetReport {
    pub fn total_deleted(&self) -> u64 {
        self.tables.iter().map(|t| t.deleted).sum()
    }
}

/// Seeds every empty reference table; tables holding rows are left alone.
pub async fn seed_tables(
    db: &DatabaseConnection,
    seed_dir: &Path,
) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport::default();

    for table in ManagedTable::SEEDED {
        let existing = table.count(db).await?;
        let inserted = if existing == 0 {
            let inserted = table.seed_from(db, seed_dir).await?;
            info!(table = %table, inserted, "Seeded table");
            inserted
        } else {
            debug!(table = %table, existing, "Table already populated, skipping");
            0
        };

        report.tables.push(SeededTable {
            table: table.name().to_string(),
            existing,
            inserted,
        });
    }

    Ok(report)
}

/// Deletes all rows of every managed table in reset order.
pub async fn reset_tables(db: &DatabaseConnection) -> Result<ResetReport, ServiceError> {
    let mut report = ResetReport::default();

    for table in ManagedTable::RESET_ORDER {
        let deleted = table.delete_all(db).await?;
        debug!(table = %table, deleted, "Cleared table");
        report.tables.push(ClearedTable {
            table: table.name().to_string(),
            deleted,
        });
    }

    Ok(report)
}
