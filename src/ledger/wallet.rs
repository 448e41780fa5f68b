//! Wallet providers

use std::cell::RefCell;

use super::{WALLET_PERMISSIONS, WalletProvider};
use crate::error::WalletError;

/// A wallet with a fixed address that can be told to refuse connections
#[derive(Debug, Default)]
pub struct MemoryWallet {
    address: String,
    refuse: bool,
    granted: RefCell<Vec<String>>,
}

impl MemoryWallet {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_owned(),
            ..Default::default()
        }
    }

    /// A wallet whose user declines every connection prompt
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Default::default()
        }
    }
}

impl WalletProvider for MemoryWallet {
    async fn connect(&self) -> Result<String, WalletError> {
        if self.refuse {
            return Err(WalletError::Rejected("user declined".into()));
        }
        *self.granted.borrow_mut() = WALLET_PERMISSIONS.iter().map(|p| p.to_string()).collect();
        Ok(self.address.clone())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.granted.borrow_mut().clear();
        Ok(())
    }

    async fn active_address(&self) -> Option<String> {
        (!self.granted.borrow().is_empty()).then(|| self.address.clone())
    }

    async fn permissions(&self) -> Vec<String> {
        self.granted.borrow().clone()
    }
}

#[cfg(target_arch = "wasm32")]
pub use injected::InjectedWallet;

#[cfg(target_arch = "wasm32")]
mod injected {
    use js_sys::{Array, Function, Promise, Reflect};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    use super::super::{WALLET_PERMISSIONS, WalletProvider};
    use crate::error::WalletError;

    const WALLET_GLOBAL: &str = "arweaveWallet";

    /// The wallet extension object injected into `window`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct InjectedWallet;

    fn describe(err: &JsValue) -> String {
        err.as_string()
            .or_else(|| {
                Reflect::get(err, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", err))
    }

    impl InjectedWallet {
        pub fn is_available() -> bool {
            Self::handle().is_ok()
        }

        fn handle() -> Result<JsValue, WalletError> {
            let window = web_sys::window().ok_or(WalletError::Unavailable)?;
            let wallet = Reflect::get(&window, &JsValue::from_str(WALLET_GLOBAL)).map_err(|_| WalletError::Unavailable)?;
            if wallet.is_undefined() || wallet.is_null() {
                return Err(WalletError::Unavailable);
            }
            Ok(wallet)
        }

        /// Call `wallet[method](...args)` and await the returned promise
        async fn call(method: &str, args: &Array) -> Result<JsValue, WalletError> {
            let wallet = Self::handle()?;
            let func: Function = Reflect::get(&wallet, &JsValue::from_str(method))
                .map_err(|e| WalletError::Call(describe(&e)))?
                .dyn_into()
                .map_err(|_| WalletError::Call(format!("{} is not a function", method)))?;
            let result = func
                .apply(&wallet, args)
                .map_err(|e| WalletError::Call(describe(&e)))?;
            let promise: Promise = result
                .dyn_into()
                .unwrap_or_else(|value| Promise::resolve(&value));
            JsFuture::from(promise)
                .await
                .map_err(|e| WalletError::Call(describe(&e)))
        }
    }

    impl WalletProvider for InjectedWallet {
        async fn connect(&self) -> Result<String, WalletError> {
            let permissions: Array = WALLET_PERMISSIONS.iter().map(|p| JsValue::from_str(p)).collect();
            Self::call("connect", &Array::of1(&permissions))
                .await
                .map_err(|e| match e {
                    WalletError::Call(msg) => WalletError::Rejected(msg),
                    other => other,
                })?;
            let address = Self::call("getActiveAddress", &Array::new()).await?;
            let address = address
                .as_string()
                .ok_or_else(|| WalletError::Call("wallet returned no address".into()))?;
            log::info!("Wallet connected: {}", address);
            Ok(address)
        }

        async fn disconnect(&self) -> Result<(), WalletError> {
            Self::call("disconnect", &Array::new()).await?;
            log::info!("Wallet disconnected");
            Ok(())
        }

        async fn active_address(&self) -> Option<String> {
            // Without granted permissions the extension prompts, so check first
            if self.permissions().await.is_empty() {
                return None;
            }
            match Self::call("getActiveAddress", &Array::new()).await {
                Ok(address) => address.as_string(),
                Err(e) => {
                    log::warn!("Error checking wallet connection: {}", e);
                    None
                }
            }
        }

        async fn permissions(&self) -> Vec<String> {
            match Self::call("getPermissions", &Array::new()).await {
                Ok(value) => Array::from(&value)
                    .iter()
                    .filter_map(|p| p.as_string())
                    .collect(),
                Err(_) => Vec::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_grants_permissions() {
        let wallet = MemoryWallet::new("addr-1");
        pollster::block_on(async {
            assert_eq!(wallet.active_address().await, None);
            assert_eq!(wallet.connect().await, Ok("addr-1".to_string()));
            assert_eq!(wallet.active_address().await.as_deref(), Some("addr-1"));
            assert_eq!(wallet.permissions().await, vec!["ACCESS_ADDRESS", "SIGN_TRANSACTION"]);
            wallet.disconnect().await.unwrap();
            assert_eq!(wallet.active_address().await, None);
        });
    }

    #[test]
    fn test_refused_connection() {
        let wallet = MemoryWallet::refusing();
        let err = pollster::block_on(wallet.connect()).unwrap_err();
        assert!(matches!(err, WalletError::Rejected(_)));
        assert!(pollster::block_on(wallet.permissions()).is_empty());
    }
}
