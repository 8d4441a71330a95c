use sea_orm_migration::prelude::*;

/// Draws (抽奖活动)
#[derive(DeriveIden)]
enum Draws {
    Table,
    Id,
    BusinessId,
    Title,
    Description,
    DrawType,
    DrawDate,
    TriggerValue,
    WinningProbability,
    Status,
    WinnerUserId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 状态取值: draft / active / closed / completed
/// 类型取值: fixed_date / condition
/// 时间默认值使用 CURRENT_TIMESTAMP，Postgres 与 SQLite 均可用
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Draws::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Draws::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Draws::BusinessId).uuid().not_null())
                    .col(ColumnDef::new(Draws::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Draws::Description).text().null())
                    .col(ColumnDef::new(Draws::DrawType).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Draws::DrawDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Draws::TriggerValue).integer().null()) // NULL = 永不自动开奖
                    .col(
                        ColumnDef::new(Draws::WinningProbability)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Draws::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Draws::WinnerUserId).string_len(64).null())
                    .col(
                        ColumnDef::new(Draws::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Draws::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Draws::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 按商家 + 状态查询列表
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draws_business_status")
                    .table(Draws::Table)
                    .col(Draws::BusinessId)
                    .col(Draws::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Draws::Table).to_owned())
            .await?;
        Ok(())
    }
}
