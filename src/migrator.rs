use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customer_tables::Migration),
            Box::new(m20240101_000002_create_user_tables::Migration),
            Box::new(m20240101_000003_create_company_table::Migration),
            Box::new(m20240101_000004_create_item_tables::Migration),
            Box::new(m20240101_000005_create_order_tables::Migration),
            Box::new(m20240101_000006_create_inventory_tables::Migration),
            Box::new(m20240101_000007_create_vendor_tables::Migration),
        ]
    }
}

fn unique_index<T, C>(name: &str, table: T, col: C) -> IndexCreateStatement
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    Index::create()
        .if_not_exists()
        .unique()
        .name(name)
        .table(table)
        .col(col)
        .to_owned()
}

fn index<T, C>(name: &str, table: T, col: C) -> IndexCreateStatement
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    Index::create()
        .if_not_exists()
        .name(name)
        .table(table)
        .col(col)
        .to_owned()
}

mod m20240101_000001_create_customer_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_customer_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::CustomerId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Customers::CustomerNumber)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::CustomerType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Notes).text().null())
                        .col(ColumnDef::new(Customers::Country).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(unique_index(
                    "uq_customers_number",
                    Customers::Table,
                    Customers::CustomerNumber,
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(IndividualCustomers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(IndividualCustomers::IndividualCustomerId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(IndividualCustomers::FirstName)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IndividualCustomers::MiddleName)
                                .string_len(50)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(IndividualCustomers::LastName)
                                .string_len(50)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(IndividualCustomers::PersonalId)
                                .string_len(50)
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_individual_customers_customer")
                                .from(
                                    IndividualCustomers::Table,
                                    IndividualCustomers::IndividualCustomerId,
                                )
                                .to(Customers::Table, Customers::CustomerId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(unique_index(
                    "uq_individual_customers_personal_id",
                    IndividualCustomers::Table,
                    IndividualCustomers::PersonalId,
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BusinessCustomers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BusinessCustomers::BusinessCustomerId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BusinessCustomers::BusinessName)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BusinessCustomers::IsTaxRegistered)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(BusinessCustomers::TaxRegistrationNumber)
                                .string_len(50)
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_business_customers_customer")
                                .from(
                                    BusinessCustomers::Table,
                                    BusinessCustomers::BusinessCustomerId,
                                )
                                .to(Customers::Table, Customers::CustomerId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(unique_index(
                    "uq_business_customers_name",
                    BusinessCustomers::Table,
                    BusinessCustomers::BusinessName,
                ))
                .await?;
            manager
                .create_index(unique_index(
                    "uq_business_customers_trn",
                    BusinessCustomers::Table,
                    BusinessCustomers::TaxRegistrationNumber,
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Address::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Address::AddressId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Address::Address1).string_len(255).null())
                        .col(ColumnDef::new(Address::Address2).string_len(255).null())
                        .col(ColumnDef::new(Address::City).string_len(100).not_null())
                        .col(ColumnDef::new(Address::Country).string_len(100).not_null())
                        .col(ColumnDef::new(Address::PostalCode).string_len(20).null())
                        .col(
                            ColumnDef::new(Address::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Address::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EntityAddresses::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(EntityAddresses::EntityId).uuid().not_null())
                        .col(
                            ColumnDef::new(EntityAddresses::EntityType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(EntityAddresses::AddressId).uuid().not_null())
                        .col(
                            ColumnDef::new(EntityAddresses::AddressType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EntityAddresses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(EntityAddresses::EntityId)
                                .col(EntityAddresses::AddressId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_entity_addresses_address")
                                .from(EntityAddresses::Table, EntityAddresses::AddressId)
                                .to(Address::Table, Address::AddressId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ContactDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ContactDetails::ContactDetailsId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ContactDetails::ContactType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContactDetails::ContactData)
                                .string_len(255)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContactDetails::IsPrimary)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ContactDetails::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContactDetails::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EntityContactDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(EntityContactDetails::EntityId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EntityContactDetails::EntityType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EntityContactDetails::ContactDetailsId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EntityContactDetails::ContactType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(EntityContactDetails::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(EntityContactDetails::EntityId)
                                .col(EntityContactDetails::ContactDetailsId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_entity_contact_details_contact")
                                .from(
                                    EntityContactDetails::Table,
                                    EntityContactDetails::ContactDetailsId,
                                )
                                .to(ContactDetails::Table, ContactDetails::ContactDetailsId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                EntityContactDetails::Table.into_iden(),
                ContactDetails::Table.into_iden(),
                EntityAddresses::Table.into_iden(),
                Address::Table.into_iden(),
                BusinessCustomers::Table.into_iden(),
                IndividualCustomers::Table.into_iden(),
                Customers::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20240101_000002_create_user_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_user_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::UserId).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Users::Email).string_len(255).not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::FirstName).string_len(50).not_null())
                        .col(ColumnDef::new(Users::LastName).string_len(50).not_null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::IsAdmin)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Users::UserType)
                                .string_len(20)
                                .not_null()
                                .default("CUSTOMER"),
                        )
                        .col(ColumnDef::new(Users::CustomerId).uuid().null())
                        .col(
                            ColumnDef::new(Users::LastLogin)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Users::LoginCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_users_customer")
                                .from(Users::Table, Users::CustomerId)
                                .to(Customers::Table, Customers::CustomerId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(unique_index("uq_users_email", Users::Table, Users::Email))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(LoginAttempts::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(LoginAttempts::LoginAttemptId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(LoginAttempts::UserId).uuid().null())
                        .col(ColumnDef::new(LoginAttempts::Email).string_len(255).not_null())
                        .col(ColumnDef::new(LoginAttempts::Success).boolean().not_null())
                        .col(ColumnDef::new(LoginAttempts::IpAddress).string_len(64).null())
                        .col(ColumnDef::new(LoginAttempts::UserAgent).string_len(512).null())
                        .col(ColumnDef::new(LoginAttempts::ErrorMessage).text().null())
                        .col(
                            ColumnDef::new(LoginAttempts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_login_attempts_user")
                                .from(LoginAttempts::Table, LoginAttempts::UserId)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(index(
                    "idx_login_attempts_user",
                    LoginAttempts::Table,
                    LoginAttempts::UserId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(LoginAttempts::Table).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
                .await
        }
    }
}

mod m20240101_000003_create_company_table {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_company_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Company::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Company::CompanyId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Company::CompanyNumber).big_integer().not_null())
                        .col(ColumnDef::new(Company::CompanyName).string_len(100).not_null())
                        .col(ColumnDef::new(Company::Email).string_len(255).null())
                        .col(ColumnDef::new(Company::Trn).string_len(50).null())
                        .col(ColumnDef::new(Company::Mobile).string_len(30).null())
                        .col(ColumnDef::new(Company::Landline).string_len(30).null())
                        .col(ColumnDef::new(Company::AddressId).uuid().null())
                        .col(ColumnDef::new(Company::Notes).text().null())
                        .col(
                            ColumnDef::new(Company::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Company::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_company_address")
                                .from(Company::Table, Company::AddressId)
                                .to(Address::Table, Address::AddressId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            for (name, col) in [
                ("uq_company_number", Company::CompanyNumber),
                ("uq_company_email", Company::Email),
                ("uq_company_trn", Company::Trn),
                ("uq_company_mobile", Company::Mobile),
                ("uq_company_landline", Company::Landline),
            ] {
                manager
                    .create_index(unique_index(name, Company::Table, col))
                    .await?;
            }
            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Company::Table).if_exists().to_owned())
                .await
        }
    }
}

mod m20240101_000004_create_item_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_item_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::ItemId).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Items::ItemNumber).big_integer().not_null())
                        .col(ColumnDef::new(Items::ItemName).string_len(50).not_null())
                        .col(ColumnDef::new(Items::ItemType).string_len(20).null())
                        .col(ColumnDef::new(Items::ItemBrand).string_len(100).null())
                        .col(ColumnDef::new(Items::ItemModel).string_len(100).null())
                        .col(ColumnDef::new(Items::ItemBarcode).string_len(100).null())
                        .col(ColumnDef::new(Items::Dimensions).json().null())
                        .col(
                            ColumnDef::new(Items::WeightGrams)
                                .decimal_len(10, 2)
                                .null()
                                .check(Expr::col(Items::WeightGrams).gte(0)),
                        )
                        .col(ColumnDef::new(Items::Notes).text().null())
                        .col(ColumnDef::new(Items::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Items::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_created_by")
                                .from(Items::Table, Items::CreatedBy)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(unique_index("uq_items_number", Items::Table, Items::ItemNumber))
                .await?;
            manager
                .create_index(unique_index("uq_items_barcode", Items::Table, Items::ItemBarcode))
                .await?;
            manager
                .create_index(index("idx_items_created_at", Items::Table, Items::CreatedAt))
                .await?;
            manager
                .create_index(index("idx_items_updated_at", Items::Table, Items::UpdatedAt))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeletedItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeletedItems::ItemId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(DeletedItems::DeletedBy).uuid().null())
                        .col(
                            ColumnDef::new(DeletedItems::DeletedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deleted_items_item")
                                .from(DeletedItems::Table, DeletedItems::ItemId)
                                .to(Items::Table, Items::ItemId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_deleted_items_user")
                                .from(DeletedItems::Table, DeletedItems::DeletedBy)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(index(
                    "idx_deleted_items_deleted_at",
                    DeletedItems::Table,
                    DeletedItems::DeletedAt,
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemOwners::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ItemOwners::ItemId).uuid().not_null())
                        .col(ColumnDef::new(ItemOwners::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(ItemOwners::OwnerType).string_len(20).not_null())
                        .primary_key(
                            Index::create()
                                .col(ItemOwners::ItemId)
                                .col(ItemOwners::OwnerId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_owners_item")
                                .from(ItemOwners::Table, ItemOwners::ItemId)
                                .to(Items::Table, Items::ItemId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                ItemOwners::Table.into_iden(),
                DeletedItems::Table.into_iden(),
                Items::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

mod m20240101_000005_create_order_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::OrderId).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Orders::OrderNumber).big_integer().not_null())
                        .col(ColumnDef::new(Orders::CreatorId).uuid().not_null())
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::OrderType).string_len(30).not_null())
                        .col(ColumnDef::new(Orders::Movement).string_len(10).not_null())
                        .col(ColumnDef::new(Orders::PackingType).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::DeliveryMethod).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::Notes).text().null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string_len(20)
                                .not_null()
                                .default("PENDING"),
                        )
                        .col(ColumnDef::new(Orders::AddressId).uuid().null())
                        .col(
                            ColumnDef::new(Orders::FulfilledAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_creator")
                                .from(Orders::Table, Orders::CreatorId)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_customer")
                                .from(Orders::Table, Orders::CustomerId)
                                .to(Customers::Table, Customers::CustomerId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_address")
                                .from(Orders::Table, Orders::AddressId)
                                .to(Address::Table, Address::AddressId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(unique_index("uq_orders_number", Orders::Table, Orders::OrderNumber))
                .await?;
            manager
                .create_index(index("idx_orders_customer_id", Orders::Table, Orders::CustomerId))
                .await?;
            manager
                .create_index(index("idx_orders_status", Orders::Table, Orders::Status))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::OrderItemId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ItemId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(OrderItems::Quantity).gt(0)),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::OrderId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_item")
                                .from(OrderItems::Table, OrderItems::ItemId)
                                .to(Items::Table, Items::ItemId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(index(
                    "idx_order_items_order_id",
                    OrderItems::Table,
                    OrderItems::OrderId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).if_exists().to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).if_exists().to_owned())
                .await
        }
    }
}

mod m20240101_000006_create_inventory_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventory::InventoryId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Inventory::ItemId).uuid().not_null())
                        .col(ColumnDef::new(Inventory::LocationCode).string_len(50).not_null())
                        .col(
                            ColumnDef::new(Inventory::Quantity)
                                .integer()
                                .not_null()
                                .default(0)
                                .check(Expr::col(Inventory::Quantity).gte(0)),
                        )
                        .col(
                            ColumnDef::new(Inventory::LastUpdated)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_item")
                                .from(Inventory::Table, Inventory::ItemId)
                                .to(Items::Table, Items::ItemId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("uq_inventory_item_location")
                        .table(Inventory::Table)
                        .col(Inventory::ItemId)
                        .col(Inventory::LocationCode)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemTransactions::ItemTxId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ItemTransactions::OrderId).uuid().null())
                        .col(ColumnDef::new(ItemTransactions::ItemId).uuid().not_null())
                        .col(ColumnDef::new(ItemTransactions::InventoryId).uuid().not_null())
                        .col(
                            ColumnDef::new(ItemTransactions::Movement)
                                .string_len(10)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemTransactions::MovementAmt)
                                .integer()
                                .not_null()
                                .check(Expr::col(ItemTransactions::MovementAmt).gt(0)),
                        )
                        .col(
                            ColumnDef::new(ItemTransactions::PrevStock)
                                .integer()
                                .not_null()
                                .check(Expr::col(ItemTransactions::PrevStock).gte(0)),
                        )
                        .col(
                            ColumnDef::new(ItemTransactions::NewStock)
                                .integer()
                                .not_null()
                                .check(Expr::col(ItemTransactions::NewStock).gte(0)),
                        )
                        .col(ColumnDef::new(ItemTransactions::Notes).text().null())
                        .col(
                            ColumnDef::new(ItemTransactions::TxDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .check(Expr::cust(
                            "(movement <> 'IN' OR new_stock = prev_stock + movement_amt) \
                             AND (movement <> 'OUT' OR new_stock = prev_stock - movement_amt)",
                        ))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_transactions_order")
                                .from(ItemTransactions::Table, ItemTransactions::OrderId)
                                .to(Orders::Table, Orders::OrderId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_transactions_item")
                                .from(ItemTransactions::Table, ItemTransactions::ItemId)
                                .to(Items::Table, Items::ItemId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_transactions_inventory")
                                .from(ItemTransactions::Table, ItemTransactions::InventoryId)
                                .to(Inventory::Table, Inventory::InventoryId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(index(
                    "idx_item_transactions_inventory",
                    ItemTransactions::Table,
                    ItemTransactions::InventoryId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(ItemTransactions::Table)
                        .if_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(Inventory::Table).if_exists().to_owned())
                .await
        }
    }
}

mod m20240101_000007_create_vendor_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_vendor_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Vendors::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Vendors::VendorId).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Vendors::VendorNumber).big_integer().not_null())
                        .col(ColumnDef::new(Vendors::VendorName).string_len(100).not_null())
                        .col(ColumnDef::new(Vendors::VendorType).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Vendors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vendors::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(unique_index(
                    "uq_vendors_number",
                    Vendors::Table,
                    Vendors::VendorNumber,
                ))
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VendorServices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VendorServices::VendorServiceId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(VendorServices::VendorId).uuid().not_null())
                        .col(
                            ColumnDef::new(VendorServices::ServiceName)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorServices::Rate)
                                .decimal_len(12, 2)
                                .not_null()
                                .check(Expr::col(VendorServices::Rate).gte(0)),
                        )
                        .col(ColumnDef::new(VendorServices::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(VendorServices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorServices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_services_vendor")
                                .from(VendorServices::Table, VendorServices::VendorId)
                                .to(Vendors::Table, Vendors::VendorId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_services_created_by")
                                .from(VendorServices::Table, VendorServices::CreatedBy)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VendorTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VendorTransactions::VendorTxId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(VendorTransactions::VendorId).uuid().not_null())
                        .col(ColumnDef::new(VendorTransactions::OrderId).uuid().null())
                        .col(ColumnDef::new(VendorTransactions::CustomerId).uuid().null())
                        .col(
                            ColumnDef::new(VendorTransactions::VendorServiceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorTransactions::Rate)
                                .decimal_len(12, 2)
                                .not_null()
                                .check(Expr::col(VendorTransactions::Rate).gte(0)),
                        )
                        .col(
                            ColumnDef::new(VendorTransactions::Quantity)
                                .integer()
                                .not_null()
                                .check(Expr::col(VendorTransactions::Quantity).gt(0)),
                        )
                        .col(
                            ColumnDef::new(VendorTransactions::TotalCost)
                                .decimal_len(14, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(VendorTransactions::EmpId).uuid().not_null())
                        .col(
                            ColumnDef::new(VendorTransactions::TxDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorTransactions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_transactions_vendor")
                                .from(VendorTransactions::Table, VendorTransactions::VendorId)
                                .to(Vendors::Table, Vendors::VendorId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_transactions_order")
                                .from(VendorTransactions::Table, VendorTransactions::OrderId)
                                .to(Orders::Table, Orders::OrderId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_transactions_customer")
                                .from(VendorTransactions::Table, VendorTransactions::CustomerId)
                                .to(Customers::Table, Customers::CustomerId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_transactions_service")
                                .from(
                                    VendorTransactions::Table,
                                    VendorTransactions::VendorServiceId,
                                )
                                .to(VendorServices::Table, VendorServices::VendorServiceId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_transactions_emp")
                                .from(VendorTransactions::Table, VendorTransactions::EmpId)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VendorPayment::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(VendorPayment::PayId).uuid().not_null().primary_key())
                        .col(ColumnDef::new(VendorPayment::VendorId).uuid().not_null())
                        .col(
                            ColumnDef::new(VendorPayment::Amount)
                                .decimal_len(14, 2)
                                .not_null()
                                .check(Expr::col(VendorPayment::Amount).gt(0)),
                        )
                        .col(ColumnDef::new(VendorPayment::EmpId).uuid().not_null())
                        .col(
                            ColumnDef::new(VendorPayment::PaymentDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(VendorPayment::Notes).text().null())
                        .col(
                            ColumnDef::new(VendorPayment::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_payment_vendor")
                                .from(VendorPayment::Table, VendorPayment::VendorId)
                                .to(Vendors::Table, Vendors::VendorId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_payment_emp")
                                .from(VendorPayment::Table, VendorPayment::EmpId)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(VendorLedger::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(VendorLedger::LedgerId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(VendorLedger::VendorId).uuid().not_null())
                        .col(
                            ColumnDef::new(VendorLedger::TransactionDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorLedger::TransactionType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(VendorLedger::Debit)
                                .decimal_len(14, 2)
                                .not_null()
                                .default(0)
                                .check(Expr::col(VendorLedger::Debit).gte(0)),
                        )
                        .col(
                            ColumnDef::new(VendorLedger::Credit)
                                .decimal_len(14, 2)
                                .not_null()
                                .default(0)
                                .check(Expr::col(VendorLedger::Credit).gte(0)),
                        )
                        .col(ColumnDef::new(VendorLedger::Description).text().null())
                        .col(ColumnDef::new(VendorLedger::RelatedTransactionId).uuid().null())
                        .col(ColumnDef::new(VendorLedger::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(VendorLedger::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .check(Expr::cust(
                            "(debit > 0 AND credit = 0) OR (debit = 0 AND credit > 0)",
                        ))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_ledger_vendor")
                                .from(VendorLedger::Table, VendorLedger::VendorId)
                                .to(Vendors::Table, Vendors::VendorId)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_vendor_ledger_created_by")
                                .from(VendorLedger::Table, VendorLedger::CreatedBy)
                                .to(Users::Table, Users::UserId)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(index(
                    "idx_vendor_ledger_vendor",
                    VendorLedger::Table,
                    VendorLedger::VendorId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                VendorLedger::Table.into_iden(),
                VendorPayment::Table.into_iden(),
                VendorTransactions::Table.into_iden(),
                VendorServices::Table.into_iden(),
                Vendors::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).if_exists().to_owned())
                    .await?;
            }
            Ok(())
        }
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    CustomerId,
    CustomerNumber,
    CustomerType,
    Notes,
    Country,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum IndividualCustomers {
    Table,
    IndividualCustomerId,
    FirstName,
    MiddleName,
    LastName,
    PersonalId,
}

#[derive(DeriveIden)]
enum BusinessCustomers {
    Table,
    BusinessCustomerId,
    BusinessName,
    IsTaxRegistered,
    TaxRegistrationNumber,
}

#[derive(DeriveIden)]
enum Address {
    Table,
    AddressId,
    #[sea_orm(iden = "address_1")]
    Address1,
    #[sea_orm(iden = "address_2")]
    Address2,
    City,
    Country,
    PostalCode,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EntityAddresses {
    Table,
    EntityId,
    EntityType,
    AddressId,
    AddressType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ContactDetails {
    Table,
    ContactDetailsId,
    ContactType,
    ContactData,
    IsPrimary,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EntityContactDetails {
    Table,
    EntityId,
    EntityType,
    ContactDetailsId,
    ContactType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    UserId,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    IsActive,
    IsAdmin,
    UserType,
    CustomerId,
    LastLogin,
    LoginCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum LoginAttempts {
    Table,
    LoginAttemptId,
    UserId,
    Email,
    Success,
    IpAddress,
    UserAgent,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Company {
    Table,
    CompanyId,
    CompanyNumber,
    CompanyName,
    Email,
    Trn,
    Mobile,
    Landline,
    AddressId,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Items {
    Table,
    ItemId,
    ItemNumber,
    ItemName,
    ItemType,
    ItemBrand,
    ItemModel,
    ItemBarcode,
    Dimensions,
    WeightGrams,
    Notes,
    CreatedBy,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum DeletedItems {
    Table,
    ItemId,
    DeletedBy,
    DeletedAt,
}

#[derive(DeriveIden)]
enum ItemOwners {
    Table,
    ItemId,
    OwnerId,
    OwnerType,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    OrderId,
    OrderNumber,
    CreatorId,
    CustomerId,
    OrderType,
    Movement,
    PackingType,
    DeliveryMethod,
    Notes,
    Status,
    AddressId,
    FulfilledAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    OrderItemId,
    OrderId,
    ItemId,
    Quantity,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Inventory {
    Table,
    InventoryId,
    ItemId,
    LocationCode,
    Quantity,
    LastUpdated,
}

#[derive(DeriveIden)]
enum ItemTransactions {
    Table,
    ItemTxId,
    OrderId,
    ItemId,
    InventoryId,
    Movement,
    MovementAmt,
    PrevStock,
    NewStock,
    Notes,
    TxDate,
}

#[derive(DeriveIden)]
enum Vendors {
    Table,
    VendorId,
    VendorNumber,
    VendorName,
    VendorType,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VendorServices {
    Table,
    VendorServiceId,
    VendorId,
    ServiceName,
    Rate,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VendorTransactions {
    Table,
    VendorTxId,
    VendorId,
    OrderId,
    CustomerId,
    VendorServiceId,
    Rate,
    Quantity,
    TotalCost,
    EmpId,
    TxDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VendorPayment {
    Table,
    PayId,
    VendorId,
    Amount,
    EmpId,
    PaymentDate,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum VendorLedger {
    Table,
    LedgerId,
    VendorId,
    TransactionDate,
    TransactionType,
    Debit,
    Credit,
    Description,
    RelatedTransactionId,
    CreatedBy,
    CreatedAt,
}

/// Connects to `db_url` and applies every pending migration.
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(2)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");
    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

    async fn migrated() -> sea_orm::DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn ledger_rejects_debit_and_credit_together() {
        let db = migrated().await;
        let now = "2024-01-01T00:00:00+00:00";
        db.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!(
                "INSERT INTO vendors (vendor_id, vendor_number, vendor_name, vendor_type, created_at, updated_at) \
                 VALUES ('v1', 1, 'Lift Co', 'FORKLIFT', '{now}', '{now}')"
            ),
        ))
        .await
        .unwrap();

        let both = db
            .execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                format!(
                    "INSERT INTO vendor_ledger (ledger_id, vendor_id, transaction_date, transaction_type, debit, credit, created_at) \
                     VALUES ('l1', 'v1', '{now}', 'ADJUSTMENT', 10, 5, '{now}')"
                ),
            ))
            .await;
        assert!(both.is_err());

        let neither = db
            .execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                format!(
                    "INSERT INTO vendor_ledger (ledger_id, vendor_id, transaction_date, transaction_type, debit, credit, created_at) \
                     VALUES ('l2', 'v1', '{now}', 'ADJUSTMENT', 0, 0, '{now}')"
                ),
            ))
            .await;
        assert!(neither.is_err());

        let debit_only = db
            .execute(Statement::from_string(
                DatabaseBackend::Sqlite,
                format!(
                    "INSERT INTO vendor_ledger (ledger_id, vendor_id, transaction_date, transaction_type, debit, credit, created_at) \
                     VALUES ('l3', 'v1', '{now}', 'INVOICE', 10, 0, '{now}')"
                ),
            ))
            .await;
        assert!(debit_only.is_ok());
    }

    #[tokio::test]
    async fn migrations_roll_back_cleanly() {
        let db = migrated().await;
        Migrator::down(&db, None).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
    }
}
