mod marketplace_database;

pub use marketplace_database::{MarketplaceDatabase, StorageError};
