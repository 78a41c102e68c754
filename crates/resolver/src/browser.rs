//! Browser probe: loads the URI into an image element and reads its natural
//! size once the `load` event fires.

use lightbox_cache::Dimensions;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlImageElement;

use crate::error::ProbeError;
use crate::identifier::Headers;
use crate::platform::{boxed_probe, ProbeFuture};
use crate::probe::RemoteProbe;

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserProbe;

impl BrowserProbe {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteProbe for BrowserProbe {
    fn probe(&self, uri: &str, headers: Option<&Headers>) -> ProbeFuture {
        if headers.is_some_and(|headers| !headers.is_empty()) {
            tracing::debug!(uri, "image elements cannot send request headers; ignoring them");
        }

        let uri = uri.to_string();
        boxed_probe(async move { load_natural_size(&uri).await })
    }
}

async fn load_natural_size(uri: &str) -> Result<Dimensions, ProbeError> {
    let img = HtmlImageElement::new()
        .map_err(|_| ProbeError::Unsupported("image elements are unavailable".to_string()))?;

    let promise = js_sys::Promise::new(&mut |resolve, reject| {
        let onload = Closure::once(move || {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let onerror = Closure::once(move || {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("image_load_failed"));
        });
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();
    });

    img.set_src(uri);

    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|_| ProbeError::Transport(format!("failed to load {uri}")))?;

    Ok(Dimensions::new(img.natural_width(), img.natural_height()))
}
