use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_reference_tables::Migration),
            Box::new(m20240301_000002_create_demo_tables::Migration),
            Box::new(m20240301_000003_create_retailers_table::Migration),
        ]
    }
}

// No foreign keys: reset deletes parents before children.

mod m20240301_000001_create_reference_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_reference_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Street).string().not_null())
                        .col(ColumnDef::new(Suppliers::City).string().not_null())
                        .col(ColumnDef::new(Suppliers::State).string().not_null())
                        .col(ColumnDef::new(Suppliers::Country).string().not_null())
                        .col(ColumnDef::new(Suppliers::Latitude).double().not_null())
                        .col(ColumnDef::new(Suppliers::Longitude).double().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(ColumnDef::new(Products::SupplierId).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DistributionCenters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DistributionCenters::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DistributionCenters::Name).string().not_null())
                        .col(ColumnDef::new(DistributionCenters::Street).string().not_null())
                        .col(ColumnDef::new(DistributionCenters::City).string().not_null())
                        .col(ColumnDef::new(DistributionCenters::State).string().not_null())
                        .col(ColumnDef::new(DistributionCenters::Country).string().not_null())
                        .col(ColumnDef::new(DistributionCenters::Latitude).double().not_null())
                        .col(ColumnDef::new(DistributionCenters::Longitude).double().not_null())
                        .col(ColumnDef::new(DistributionCenters::ContactName).string().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Inventories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Inventories::ProductId).integer().not_null())
                        .col(ColumnDef::new(Inventories::LocationId).integer().not_null())
                        .col(ColumnDef::new(Inventories::LocationType).string().not_null())
                        .col(
                            ColumnDef::new(Inventories::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Shipments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Shipments::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Shipments::Status).string().not_null())
                        .col(ColumnDef::new(Shipments::FromId).integer().not_null())
                        .col(ColumnDef::new(Shipments::ToId).integer().not_null())
                        .col(
                            ColumnDef::new(Shipments::EstimatedTimeOfArrival)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Shipments::DeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Shipments::DemoId).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LineItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LineItems::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(LineItems::ProductId).integer().not_null())
                        .col(ColumnDef::new(LineItems::ShipmentId).integer().not_null())
                        .col(ColumnDef::new(LineItems::Quantity).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_line_items_shipment_id")
                        .table(LineItems::Table)
                        .col(LineItems::ShipmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LineItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Shipments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Inventories::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DistributionCenters::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        Street,
        City,
        State,
        Country,
        Latitude,
        Longitude,
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Description,
        SupplierId,
    }

    #[derive(DeriveIden)]
    enum DistributionCenters {
        Table,
        Id,
        Name,
        Street,
        City,
        State,
        Country,
        Latitude,
        Longitude,
        ContactName,
    }

    #[derive(DeriveIden)]
    enum Inventories {
        Table,
        Id,
        ProductId,
        LocationId,
        LocationType,
        Quantity,
    }

    #[derive(DeriveIden)]
    enum Shipments {
        Table,
        Id,
        Status,
        FromId,
        ToId,
        EstimatedTimeOfArrival,
        DeliveredAt,
        DemoId,
    }

    #[derive(DeriveIden)]
    enum LineItems {
        Table,
        Id,
        ProductId,
        ShipmentId,
        Quantity,
    }
}

mod m20240301_000002_create_demo_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_demo_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Demos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Demos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Demos::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Demos::Guid).string().null())
                        .col(
                            ColumnDef::new(Demos::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_demos_guid")
                        .table(Demos::Table)
                        .col(Demos::Guid)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ErpUsers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ErpUsers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ErpUsers::Email).string().not_null())
                        .col(ColumnDef::new(ErpUsers::Username).string().not_null())
                        .col(ColumnDef::new(ErpUsers::Password).string().not_null())
                        .col(ColumnDef::new(ErpUsers::DemoId).integer().not_null())
                        .col(
                            ColumnDef::new(ErpUsers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_erp_users_email")
                        .table(ErpUsers::Table)
                        .col(ErpUsers::Email)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_erp_users_username")
                        .table(ErpUsers::Table)
                        .col(ErpUsers::Username)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_erp_users_demo_id")
                        .table(ErpUsers::Table)
                        .col(ErpUsers::DemoId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ErpUserRoles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ErpUserRoles::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ErpUserRoles::UserId).integer().not_null())
                        .col(ColumnDef::new(ErpUserRoles::Role).string().not_null())
                        .col(
                            ColumnDef::new(ErpUserRoles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_erp_user_roles_user_id")
                        .table(ErpUserRoles::Table)
                        .col(ErpUserRoles::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ErpUserRoles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ErpUsers::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Demos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Demos {
        Table,
        Id,
        Name,
        Guid,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ErpUsers {
        Table,
        Id,
        Email,
        Username,
        Password,
        DemoId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum ErpUserRoles {
        Table,
        Id,
        UserId,
        Role,
        CreatedAt,
    }
}

mod m20240301_000003_create_retailers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_retailers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Retailers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Retailers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Retailers::Street).string().not_null())
                        .col(ColumnDef::new(Retailers::City).string().not_null())
                        .col(ColumnDef::new(Retailers::State).string().not_null())
                        .col(ColumnDef::new(Retailers::Country).string().not_null())
                        .col(ColumnDef::new(Retailers::Latitude).double().not_null())
                        .col(ColumnDef::new(Retailers::Longitude).double().not_null())
                        .col(ColumnDef::new(Retailers::DemoId).integer().null())
                        .col(ColumnDef::new(Retailers::ManagerId).integer().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_retailers_demo_id")
                        .table(Retailers::Table)
                        .col(Retailers::DemoId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Retailers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Retailers {
        Table,
        Id,
        Street,
        City,
        State,
        Country,
        Latitude,
        Longitude,
        DemoId,
        ManagerId,
    }
}
