// Catalogue and delta sync
pub mod items;

// Parties
pub mod companies;
pub mod customers;
pub mod users;

// Stock and fulfilment
pub mod inventory;
pub mod orders;

// Vendor accounts
pub mod vendors;
