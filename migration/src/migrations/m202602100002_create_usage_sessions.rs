// migration: create_usage_sessions
use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202602100002_create_usage_sessions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("usage_sessions"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("machine_id"))
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("user_name")).string_len(100).null())
                    .col(
                        ColumnDef::new(Alias::new("start_at"))
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("end_at")).timestamp().null())
                    .col(
                        ColumnDef::new(Alias::new("duration_seconds"))
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("paid_status"))
                            .string_len(16)
                            .not_null()
                            .default("UNPAID"),
                    )
                    .col(ColumnDef::new(Alias::new("amount_due")).double().null())
                    .col(ColumnDef::new(Alias::new("amount_paid")).double().null())
                    .col(ColumnDef::new(Alias::new("notes")).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_usage_sessions_machine")
                            .from(Alias::new("usage_sessions"), Alias::new("machine_id"))
                            .to(Alias::new("machines"), Alias::new("machine_id"))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The open-session lookup filters on (machine_id, end_at IS NULL).
        manager
            .create_index(
                Index::create()
                    .name("idx_usage_sessions_machine_end")
                    .table(Alias::new("usage_sessions"))
                    .col(Alias::new("machine_id"))
                    .col(Alias::new("end_at"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("usage_sessions")).to_owned())
            .await
    }
}
