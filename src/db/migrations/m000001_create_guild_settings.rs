use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GuildSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GuildSettings::GuildId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GuildSettings::LogChannelId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(toggle(GuildSettings::LogJoin))
                    .col(toggle(GuildSettings::LogInvites))
                    .col(toggle(GuildSettings::LogNickname))
                    .col(toggle(GuildSettings::LogRoles))
                    .col(toggle(GuildSettings::LogMessageEdit))
                    .col(toggle(GuildSettings::LogMessageDelete))
                    .col(toggle(GuildSettings::LogBan))
                    .col(toggle(GuildSettings::LogKick))
                    .col(toggle(GuildSettings::LogTimeout))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GuildSettings::Table).to_owned())
            .await
    }
}

fn toggle(column: GuildSettings) -> ColumnDef {
    ColumnDef::new(column)
        .integer()
        .not_null()
        .default(1)
        .to_owned()
}

#[derive(DeriveIden)]
enum GuildSettings {
    Table,
    GuildId,
    LogChannelId,
    LogJoin,
    LogInvites,
    LogNickname,
    LogRoles,
    LogMessageEdit,
    LogMessageDelete,
    LogBan,
    LogKick,
    LogTimeout,
}
