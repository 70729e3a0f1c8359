use evoview::error::{Error, Result};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

fn js_err(context: &str, e: wasm_bindgen::JsValue) -> Error {
    Error::Fetch(format!("{context}: {}", e.as_string().unwrap_or_else(|| format!("{e:?}"))))
}

/// GET `url` and return the body as text. Non-2xx responses are failures.
pub(super) async fn fetch_text(url: &str) -> Result<String> {
    let window = web_sys::window().ok_or_else(|| Error::Fetch("no window".to_string()))?;

    let init = web_sys::RequestInit::new();
    init.set_method("GET");
    init.set_cache(web_sys::RequestCache::NoStore);

    let promise = window.fetch_with_str_and_init(url, &init);
    let resp = JsFuture::from(promise).await.map_err(|e| js_err("fetch", e))?;
    let resp: web_sys::Response = resp
        .dyn_into()
        .map_err(|_| Error::Fetch("fetch: not a Response".to_string()))?;

    if !resp.ok() {
        return Err(Error::Fetch(format!("HTTP {} from {url}", resp.status())));
    }

    let text = resp.text().map_err(|e| js_err("body", e))?;
    let text = JsFuture::from(text).await.map_err(|e| js_err("body", e))?;
    text.as_string()
        .ok_or_else(|| Error::Fetch("body is not text".to_string()))
}

/// Resolve after `ms` milliseconds.
pub(super) async fn sleep_ms(ms: u32) {
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        if let Some(w) = web_sys::window() {
            let _ = w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms as i32);
        }
    });
    let _ = JsFuture::from(promise).await;
}
