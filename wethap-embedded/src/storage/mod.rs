mod memory;

pub use memory::*;

use alloc::string::String;
use core::fmt::Debug;

/// Key under which the last label the server acknowledged is kept.
pub const LAB_ID_KEY: &str = "labID";

#[allow(async_fn_in_trait)]
pub trait LocalStorage {
    type Error: Debug;

    async fn get_item(&self, key: &str) -> Result<Option<String>, Self::Error>;

    async fn set_item(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;

    async fn remove_item(&mut self, key: &str) -> Result<(), Self::Error>;
}

/// Cached label, ignoring unreadable or blank entries.
pub async fn load_lab_id<S: LocalStorage>(storage: &S) -> Option<String> {
    match storage.get_item(LAB_ID_KEY).await {
        Ok(Some(value)) => wethap_api::label::normalize(&value).map(String::from),
        Ok(None) => None,
        Err(e) => {
            log::warn!("Reading cached labID failed: {:?}", e);
            None
        }
    }
}

pub async fn store_lab_id<S: LocalStorage>(storage: &mut S, lab_id: &str) -> crate::Result<()> {
    storage.set_item(LAB_ID_KEY, lab_id).await.map_err(|e| {
        log::warn!("Caching labID failed: {:?}", e);
        crate::Error::StorageError
    })
}
