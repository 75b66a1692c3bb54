use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduledJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduledJobs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScheduledJobs::Query).string().not_null())
                    .col(
                        ColumnDef::new(ScheduledJobs::IntervalMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduledJobs::Location).string().null())
                    .col(
                        ColumnDef::new(ScheduledJobs::Device)
                            .string()
                            .not_null()
                            .default("desktop"),
                    )
                    .col(ColumnDef::new(ScheduledJobs::NotifyChatId).string().null())
                    .col(
                        ColumnDef::new(ScheduledJobs::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ScheduledJobs::NextRunAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SearchLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SearchLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SearchLogs::Query).string().not_null())
                    .col(ColumnDef::new(SearchLogs::HasAds).boolean().not_null())
                    .col(ColumnDef::new(SearchLogs::AdsCount).integer().not_null())
                    .col(ColumnDef::new(SearchLogs::Types).string().not_null())
                    .col(ColumnDef::new(SearchLogs::Device).string().not_null())
                    .col(ColumnDef::new(SearchLogs::Gl).string().not_null())
                    .col(ColumnDef::new(SearchLogs::Hl).string().not_null())
                    .col(ColumnDef::new(SearchLogs::LatencyMs).big_integer().not_null())
                    .col(
                        ColumnDef::new(SearchLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_logs_created_at")
                    .table(SearchLogs::Table)
                    .col(SearchLogs::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SearchLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScheduledJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduledJobs {
    Table,
    Id,
    Query,
    IntervalMinutes,
    Location,
    Device,
    NotifyChatId,
    IsActive,
    NextRunAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SearchLogs {
    Table,
    Id,
    Query,
    HasAds,
    AdsCount,
    Types,
    Device,
    Gl,
    Hl,
    LatencyMs,
    CreatedAt,
}
