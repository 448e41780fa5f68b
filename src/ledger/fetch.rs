//! Browser transport: POSTs each request as JSON to the ledger gateway

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::client::Transport;
use super::wire::{LedgerRequest, LedgerResponse};
use crate::error::LedgerError;

#[derive(Debug, Clone)]
pub struct FetchTransport {
    endpoint: String,
}

fn network(err: JsValue) -> LedgerError {
    LedgerError::Network(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

impl FetchTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for FetchTransport {
    async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse, LedgerError> {
        let body = serde_json::to_string(request)?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::Cors);
        init.set_body(&JsValue::from_str(&body));

        let req = Request::new_with_str_and_init(&self.endpoint, &init).map_err(network)?;
        req.headers().set("Content-Type", "application/json").map_err(network)?;

        let window = web_sys::window().ok_or_else(|| LedgerError::Network("no window".into()))?;
        let resp: Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(network)?
            .dyn_into()
            .map_err(|_| LedgerError::InvalidResponse("not a Response".into()))?;

        match resp.status() {
            401 | 403 => return Err(LedgerError::Permission(resp.status_text())),
            s if !resp.ok() => return Err(LedgerError::Network(format!("HTTP {}", s))),
            _ => {}
        }

        let text = JsFuture::from(resp.text().map_err(network)?)
            .await
            .map_err(network)?
            .as_string()
            .ok_or_else(|| LedgerError::InvalidResponse("empty body".into()))?;
        Ok(serde_json::from_str(&text)?)
    }
}
