use log::trace;

use crate::{
    db_types::{Product, ProductId},
    mem_store::db::{read, write, Documents},
    traits::StorageError,
};

pub(crate) fn fetch_product(docs: &Documents, id: &ProductId) -> Result<Option<Product>, StorageError> {
    Ok(read(&docs.products)?.get(id).cloned())
}

pub(crate) fn upsert_product(docs: &Documents, mut product: Product) -> Result<(), StorageError> {
    // Availability tracks stock on every write, so a product can never sit at zero stock and still read available.
    if product.quantity == 0 {
        product.is_available = false;
    }
    write(&docs.products)?.insert(product.id.clone(), product);
    Ok(())
}

/// The conditional stock decrement. The check and the decrement happen under one write lock, so two concurrent
/// checkouts racing the same product cannot both succeed when only one of them fits the remaining stock.
pub(crate) fn reserve_stock(docs: &Documents, id: &ProductId, qty: i64) -> Result<Product, StorageError> {
    let mut guard = write(&docs.products)?;
    let product = guard.get_mut(id).ok_or_else(|| StorageError::ProductNotFound(id.clone()))?;
    if !product.is_available || product.quantity < qty {
        return Err(StorageError::InsufficientStock {
            product_id: id.clone(),
            requested: qty,
            available: product.quantity,
        });
    }
    product.quantity -= qty;
    if product.quantity == 0 {
        product.is_available = false;
    }
    trace!("🗃️ Reserved {qty} x {id}; {} remaining", product.quantity);
    Ok(product.clone())
}

pub(crate) fn release_stock(docs: &Documents, id: &ProductId, qty: i64) -> Result<(), StorageError> {
    let mut guard = write(&docs.products)?;
    let product = guard.get_mut(id).ok_or_else(|| StorageError::ProductNotFound(id.clone()))?;
    product.quantity += qty;
    if product.quantity > 0 {
        product.is_available = true;
    }
    trace!("🗃️ Released {qty} x {id}; {} on hand", product.quantity);
    Ok(())
}
