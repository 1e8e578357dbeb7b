use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string_len(Users::Role, 10))
                    .col(string(Users::FullName))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create agents table
        manager
            .create_table(
                Table::create()
                    .table(Agents::Table)
                    .if_not_exists()
                    .col(pk_auto(Agents::Id))
                    .col(string(Agents::Username).unique_key())
                    .col(string(Agents::Email).unique_key())
                    .col(string(Agents::PasswordHash))
                    .col(timestamp_with_time_zone(Agents::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create installments table.
        //
        // Owner references are plain nullable columns: existence is checked
        // by lookup in the handlers, not by a schema constraint, matching
        // the denormalized ownership model.
        manager
            .create_table(
                Table::create()
                    .table(Installments::Table)
                    .if_not_exists()
                    .col(pk_auto(Installments::Id))
                    .col(string(Installments::Title))
                    .col(decimal(Installments::Amount).decimal_len(16, 2))
                    .col(date(Installments::DueDate))
                    .col(string_len(Installments::Status, 10))
                    .col(integer_null(Installments::AgentId))
                    .col(string_null(Installments::AgentName))
                    .col(integer_null(Installments::UserId))
                    .col(timestamp_with_time_zone(Installments::CreatedAt))
                    .col(timestamp_with_time_zone_null(Installments::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create admin_amounts table
        manager
            .create_table(
                Table::create()
                    .table(AdminAmounts::Table)
                    .if_not_exists()
                    .col(pk_auto(AdminAmounts::Id))
                    .col(string(AdminAmounts::Username))
                    .col(decimal(AdminAmounts::Amount).decimal_len(16, 2))
                    .col(decimal(AdminAmounts::WasoolAmount).decimal_len(16, 2))
                    .col(decimal(AdminAmounts::BakayaAmount).decimal_len(16, 2))
                    .col(date(AdminAmounts::Date))
                    .col(string(AdminAmounts::CreatedBy))
                    .col(timestamp_with_time_zone(AdminAmounts::CreatedAt))
                    .col(timestamp_with_time_zone_null(AdminAmounts::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create agent_amounts table
        manager
            .create_table(
                Table::create()
                    .table(AgentAmounts::Table)
                    .if_not_exists()
                    .col(pk_auto(AgentAmounts::Id))
                    .col(string(AgentAmounts::Username))
                    .col(decimal(AgentAmounts::Amount).decimal_len(16, 2))
                    .col(decimal(AgentAmounts::WasoolAmount).decimal_len(16, 2))
                    .col(decimal(AgentAmounts::BakayaAmount).decimal_len(16, 2))
                    .col(date(AgentAmounts::Date))
                    .col(string(AgentAmounts::CreatedBy))
                    .col(timestamp_with_time_zone(AgentAmounts::CreatedAt))
                    .col(timestamp_with_time_zone_null(AgentAmounts::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AgentAmounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminAmounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Installments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Agents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Role,
    FullName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Agents {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Installments {
    Table,
    Id,
    Title,
    Amount,
    DueDate,
    Status,
    AgentId,
    AgentName,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AdminAmounts {
    Table,
    Id,
    Username,
    Amount,
    WasoolAmount,
    BakayaAmount,
    Date,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AgentAmounts {
    Table,
    Id,
    Username,
    Amount,
    WasoolAmount,
    BakayaAmount,
    Date,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
