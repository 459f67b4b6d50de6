use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    db_types::{Order, OrderId, OrderUpdate, Product, ProductId, Rating, Role, User, UserId},
    mem_store::{orders, products, users},
    traits::{MarketplaceDatabase, StorageError},
};

#[derive(Default)]
pub(crate) struct Documents {
    pub users: RwLock<HashMap<UserId, User>>,
    pub products: RwLock<HashMap<ProductId, Product>>,
    pub orders: RwLock<HashMap<OrderId, Order>>,
}

/// A cheap-to-clone handle over the shared document maps.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    docs: Arc<Documents>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InMemoryDatabase")
    }
}

/// A poisoned lock means another writer panicked mid-update; surface it as a backend failure instead of propagating
/// the panic into request handlers.
pub(crate) fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, StorageError> {
    lock.read().map_err(|_| StorageError::Internal("document lock poisoned".to_string()))
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, StorageError> {
    lock.write().map_err(|_| StorageError::Internal("document lock poisoned".to_string()))
}

impl MarketplaceDatabase for InMemoryDatabase {
    async fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        users::fetch_user(&self.docs, id)
    }

    async fn upsert_user(&self, user: User) -> Result<(), StorageError> {
        users::upsert_user(&self.docs, user)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, StorageError> {
        products::fetch_product(&self.docs, id)
    }

    async fn upsert_product(&self, product: Product) -> Result<(), StorageError> {
        products::upsert_product(&self.docs, product)
    }

    async fn reserve_stock(&self, id: &ProductId, qty: i64) -> Result<Product, StorageError> {
        products::reserve_stock(&self.docs, id, qty)
    }

    async fn release_stock(&self, id: &ProductId, qty: i64) -> Result<(), StorageError> {
        products::release_stock(&self.docs, id, qty)
    }

    async fn insert_order(&self, order: Order) -> Result<(), StorageError> {
        orders::insert_order(&self.docs, order)
    }

    async fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, StorageError> {
        orders::fetch_order(&self.docs, id)
    }

    async fn fetch_orders_for_user(&self, user: &UserId, role: Role) -> Result<Vec<Order>, StorageError> {
        orders::fetch_orders_for_user(&self.docs, user, role)
    }

    async fn update_order(&self, id: &OrderId, update: OrderUpdate) -> Result<Order, StorageError> {
        orders::update_order(&self.docs, id, update)
    }

    async fn set_rating(&self, id: &OrderId, rating: Rating) -> Result<Order, StorageError> {
        orders::set_rating(&self.docs, id, rating)
    }
}
