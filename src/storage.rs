//! JSON values in LocalStorage
//!
//! Unreadable or missing values fall back to `Default`. Natively nothing is
//! stored and every read yields the default.

use serde::Serialize;
use serde::de::DeserializeOwned;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Read `key`, or the default if absent or unreadable
#[cfg(target_arch = "wasm32")]
pub fn load<T: DeserializeOwned + Default>(key: &str) -> T {
    let Some(json) = local_storage().and_then(|s| s.get_item(key).ok().flatten()) else {
        log::info!("Nothing stored under {}", key);
        return T::default();
    };
    match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Ignoring unreadable {}: {}", key, e);
            T::default()
        }
    }
}

/// Write `value` under `key`. Failures are logged and otherwise ignored.
#[cfg(target_arch = "wasm32")]
pub fn save<T: Serialize>(key: &str, value: &T) {
    let Some(storage) = local_storage() else {
        log::warn!("LocalStorage unavailable; {} not saved", key);
        return;
    };
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("Could not encode {}: {}", key, e);
            return;
        }
    };
    match storage.set_item(key, &json) {
        Ok(()) => log::debug!("Saved {}", key),
        Err(e) => log::warn!("Could not save {}: {:?}", key, e),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load<T: DeserializeOwned + Default>(_key: &str) -> T {
    T::default()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save<T: Serialize>(_key: &str, _value: &T) {}
