use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(pk_uuid(Events::Id))
                    .col(string(Events::Title))
                    .col(text(Events::Description).default(""))
                    .col(string_null(Events::ImgUrl))
                    .col(string(Events::EventUrl))
                    .col(boolean(Events::Remote).default(false))
                    .col(timestamp_with_time_zone(Events::Date))
                    .col(
                        timestamp_with_time_zone(Events::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_date")
                    .table(Events::Table)
                    .col(Events::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(pk_uuid(Addresses::Id))
                    .col(string(Addresses::City))
                    .col(string(Addresses::Uf))
                    .col(uuid(Addresses::EventId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_addresses_event_id")
                            .from(Addresses::Table, Addresses::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One address per event
        manager
            .create_index(
                Index::create()
                    .name("idx_addresses_event_id")
                    .table(Addresses::Table)
                    .col(Addresses::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Coupons::Table)
                    .if_not_exists()
                    .col(pk_uuid(Coupons::Id))
                    .col(string(Coupons::Code))
                    .col(integer(Coupons::Discount))
                    .col(timestamp_with_time_zone(Coupons::Valid))
                    .col(uuid(Coupons::EventId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_coupons_event_id")
                            .from(Coupons::Table, Coupons::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_coupons_event_id_valid")
                    .table(Coupons::Table)
                    .col(Coupons::EventId)
                    .col(Coupons::Valid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Coupons::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Addresses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    Title,
    Description,
    ImgUrl,
    EventUrl,
    Remote,
    Date,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Addresses {
    Table,
    Id,
    City,
    Uf,
    EventId,
}

#[derive(DeriveIden)]
enum Coupons {
    Table,
    Id,
    Code,
    Discount,
    Valid,
    EventId,
}
