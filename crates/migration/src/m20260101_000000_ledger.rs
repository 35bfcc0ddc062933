//! Ledger schema.
//!
//! - `accounts`: groups of persons sharing expenses
//! - `persons`: members of one account
//! - `transfers`: money handed from one person to another
//! - `deals`: purchases paid by one person for another
//! - `debts`: raw pairwise debts, keyed by the record that generated them

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Persons {
    Table,
    Id,
    AccountId,
    Name,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    AccountId,
    Sender,
    Receiver,
    AmountMinor,
    Note,
    OccurredAt,
}

#[derive(Iden)]
enum Deals {
    Table,
    Id,
    AccountId,
    Title,
    Sender,
    Receiver,
    AmountMinor,
    OccurredAt,
}

#[derive(Iden)]
enum Debts {
    Table,
    Id,
    AccountId,
    Sender,
    Receiver,
    AmountMinor,
    SourceKind,
    SourceId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Persons
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Persons::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Persons::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Persons::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Persons::Name).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-persons-account_id")
                            .from(Persons::Table, Persons::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-persons-account_id")
                    .table(Persons::Table)
                    .col(Persons::AccountId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Transfers::Sender).uuid().not_null())
                    .col(ColumnDef::new(Transfers::Receiver).uuid().not_null())
                    .col(
                        ColumnDef::new(Transfers::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transfers::Note).string())
                    .col(
                        ColumnDef::new(Transfers::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-account_id")
                            .from(Transfers::Table, Transfers::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-sender")
                            .from(Transfers::Table, Transfers::Sender)
                            .to(Persons::Table, Persons::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-receiver")
                            .from(Transfers::Table, Transfers::Receiver)
                            .to(Persons::Table, Persons::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-account_id-occurred_at")
                    .table(Transfers::Table)
                    .col(Transfers::AccountId)
                    .col(Transfers::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Deals
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Deals::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Deals::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Deals::Title).string().not_null())
                    .col(ColumnDef::new(Deals::Sender).uuid().not_null())
                    .col(ColumnDef::new(Deals::Receiver).uuid().not_null())
                    .col(ColumnDef::new(Deals::AmountMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Deals::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-deals-account_id")
                            .from(Deals::Table, Deals::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-deals-sender")
                            .from(Deals::Table, Deals::Sender)
                            .to(Persons::Table, Persons::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-deals-receiver")
                            .from(Deals::Table, Deals::Receiver)
                            .to(Persons::Table, Persons::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-deals-account_id-occurred_at")
                    .table(Deals::Table)
                    .col(Deals::AccountId)
                    .col(Deals::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Debts
        // ───────────────────────────────────────────────────────────────────
        // `source_id` points at a transfer or a deal depending on `source_kind`.
        manager
            .create_table(
                Table::create()
                    .table(Debts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Debts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Debts::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Debts::Sender).uuid().not_null())
                    .col(ColumnDef::new(Debts::Receiver).uuid().not_null())
                    .col(ColumnDef::new(Debts::AmountMinor).big_integer().not_null())
                    .col(ColumnDef::new(Debts::SourceKind).string().not_null())
                    .col(ColumnDef::new(Debts::SourceId).uuid().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-source")
                    .table(Debts::Table)
                    .col(Debts::SourceKind)
                    .col(Debts::SourceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-sender")
                    .table(Debts::Table)
                    .col(Debts::Sender)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debts-receiver")
                    .table(Debts::Table)
                    .col(Debts::Receiver)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Debts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Persons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
