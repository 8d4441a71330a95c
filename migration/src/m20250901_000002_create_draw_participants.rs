use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Draws {
    Table,
    Id,
}

/// Draw Participants (参与记录)
#[derive(DeriveIden)]
enum DrawParticipants {
    Table,
    Id,
    DrawId,
    UserId,
    ParticipatedAt,
    IsWinner,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 外键在建表时声明（SQLite 不支持 ALTER TABLE ADD CONSTRAINT）
        manager
            .create_table(
                Table::create()
                    .table(DrawParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrawParticipants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DrawParticipants::DrawId).uuid().not_null())
                    .col(
                        ColumnDef::new(DrawParticipants::UserId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DrawParticipants::ParticipatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(DrawParticipants::IsWinner)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_draw_participants_draw")
                            .from(DrawParticipants::Table, DrawParticipants::DrawId)
                            .to(Draws::Table, Draws::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一用户在同一抽奖中只能有一条参与记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_participants_draw_user_unique")
                    .table(DrawParticipants::Table)
                    .col(DrawParticipants::DrawId)
                    .col(DrawParticipants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_draw_participants_user")
                    .table(DrawParticipants::Table)
                    .col(DrawParticipants::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(DrawParticipants::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
