//! Remote result submission
//!
//! Best effort only: no retries, and failures never reach the caller.

use super::records::GameRecord;

/// Fire-and-forget destination for result records
pub trait ResultSink {
    fn submit(&self, record: &GameRecord);
}

impl<K: ResultSink + ?Sized> ResultSink for Box<K> {
    fn submit(&self, record: &GameRecord) {
        (**self).submit(record)
    }
}

/// Drops records (native builds have no server to talk to)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ResultSink for NullSink {
    fn submit(&self, record: &GameRecord) {
        log::debug!("Result not submitted ({:?} for {})", record.status, record.name);
    }
}

/// POSTs records as JSON with `fetch` (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct HttpSink {
    endpoint: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpSink {
    pub const DEFAULT_ENDPOINT: &'static str = "api/save_result.php";

    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl Default for HttpSink {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ENDPOINT)
    }
}

#[cfg(target_arch = "wasm32")]
impl ResultSink for HttpSink {
    fn submit(&self, record: &GameRecord) {
        let Ok(body) = serde_json::to_string(record) else {
            return;
        };
        let endpoint = self.endpoint.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match post_json(&endpoint, &body).await {
                Ok(true) => log::debug!("Result posted to {endpoint}"),
                Ok(false) => log::debug!("Server rejected result at {endpoint}"),
                Err(e) => log::debug!("Result post failed: {e:?}"),
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
async fn post_json(endpoint: &str, body: &str) -> Result<bool, wasm_bindgen::JsValue> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::SameOrigin);
    opts.set_body(&JsValue::from_str(body));

    let request = Request::new_with_str_and_init(endpoint, &opts)?;
    request.headers().set("Content-Type", "application/json")?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into()?;
    Ok(response.ok())
}
