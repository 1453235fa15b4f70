pub mod auth;
pub mod common;
pub mod companies;
pub mod customers;
pub mod inventory;
pub mod items;
pub mod orders;
pub mod users;
pub mod vendors;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    companies::CompanyService, customers::CustomerService, inventory::InventoryService,
    items::ItemService, orders::OrderService, users::UserService, vendors::VendorService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub items: Arc<ItemService>,
    pub customers: Arc<CustomerService>,
    pub users: Arc<UserService>,
    pub companies: Arc<CompanyService>,
    pub inventory: Arc<InventoryService>,
    pub orders: Arc<OrderService>,
    pub vendors: Arc<VendorService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let events = Some(event_sender);
        Self {
            items: Arc::new(ItemService::new(db_pool.clone(), events.clone())),
            customers: Arc::new(CustomerService::new(db_pool.clone(), events.clone())),
            users: Arc::new(UserService::new(db_pool.clone())),
            companies: Arc::new(CompanyService::new(db_pool.clone())),
            inventory: Arc::new(InventoryService::new(db_pool.clone(), events.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone(), events.clone())),
            vendors: Arc::new(VendorService::new(db_pool, events)),
        }
    }
}
