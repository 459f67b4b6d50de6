use crate::{
    db_types::{User, UserId},
    mem_store::db::{read, write, Documents},
    traits::StorageError,
};

pub(crate) fn fetch_user(docs: &Documents, id: &UserId) -> Result<Option<User>, StorageError> {
    Ok(read(&docs.users)?.get(id).cloned())
}

pub(crate) fn upsert_user(docs: &Documents, user: User) -> Result<(), StorageError> {
    write(&docs.users)?.insert(user.id.clone(), user);
    Ok(())
}
