use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create milk_receptions ledger table
        manager
            .create_table(
                Table::create()
                    .table(MilkReceptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MilkReceptions::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MilkReceptions::TankNumber).string().not_null())
                    .col(
                        // Signed liters: positive rows are deliveries, negative rows offloads
                        ColumnDef::new(MilkReceptions::MilkVolume)
                            .decimal_len(19, 4)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MilkReceptions::BatchId).string().null())
                    .col(ColumnDef::new(MilkReceptions::SupplierName).string().null())
                    .col(ColumnDef::new(MilkReceptions::Destination).string().null())
                    .col(
                        ColumnDef::new(MilkReceptions::Temperature)
                            .decimal_len(5, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MilkReceptions::FatPercentage)
                            .decimal_len(5, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MilkReceptions::ProteinPercentage)
                            .decimal_len(5, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MilkReceptions::Acidity)
                            .decimal_len(5, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(MilkReceptions::TotalPlateCount)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(MilkReceptions::QualityCheck).string().null())
                    .col(ColumnDef::new(MilkReceptions::Notes).text().null())
                    .col(
                        ColumnDef::new(MilkReceptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Balance reads scan one tank's full history
        manager
            .create_index(
                Index::create()
                    .name("idx_milk_receptions_tank_created")
                    .table(MilkReceptions::Table)
                    .col(MilkReceptions::TankNumber)
                    .col((MilkReceptions::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MilkReceptions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum MilkReceptions {
    Table,
    Id,
    TankNumber,
    MilkVolume,
    BatchId,
    SupplierName,
    Destination,
    Temperature,
    FatPercentage,
    ProteinPercentage,
    Acidity,
    TotalPlateCount,
    QualityCheck,
    Notes,
    CreatedAt,
}
