use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Covers the due-jobs lookup done on every scheduler pass.
        manager
            .create_index(
                Index::create()
                    .name("idx_scheduled_jobs_due")
                    .table(ScheduledJobs::Table)
                    .col(ScheduledJobs::IsActive)
                    .col(ScheduledJobs::NextRunAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_scheduled_jobs_due")
                    .table(ScheduledJobs::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduledJobs {
    Table,
    IsActive,
    NextRunAt,
}
