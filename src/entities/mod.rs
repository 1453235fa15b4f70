pub mod enums;

// Customers and contact data
pub mod address;
pub mod business_customer;
pub mod contact_detail;
pub mod customer;
pub mod entity_address;
pub mod entity_contact_detail;
pub mod individual_customer;

// Users
pub mod login_attempt;
pub mod user;

pub mod company;

// Items and stock
pub mod deleted_item;
pub mod inventory;
pub mod item;
pub mod item_owner;
pub mod item_transaction;

// Orders
pub mod order;
pub mod order_item;

// Vendors
pub mod vendor;
pub mod vendor_ledger;
pub mod vendor_payment;
pub mod vendor_service;
pub mod vendor_transaction;
