//! Browser `fetch` transport.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, Response};

use super::{FetchRequest, FetchResponse};
use crate::error::{DtviewError, Result};

fn transport(err: JsValue) -> DtviewError {
    DtviewError::Transport(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

/// GET the request URL with same-origin credentials and decode the page.
pub async fn fetch_page(request: &FetchRequest) -> Result<FetchResponse> {
    let url = request.to_url();

    let headers = Headers::new().map_err(transport)?;
    headers
        .set("Accept", "application/json")
        .map_err(transport)?;
    headers
        .set("Content-Type", "application/json")
        .map_err(transport)?;

    let init = RequestInit::new();
    init.set_method("GET");
    init.set_credentials(RequestCredentials::SameOrigin);
    init.set_headers(&headers);

    let req = Request::new_with_str_and_init(&url, &init).map_err(transport)?;
    let window = web_sys::window().ok_or_else(|| DtviewError::Transport("no window".into()))?;

    let value = JsFuture::from(window.fetch_with_request(&req))
        .await
        .map_err(transport)?;
    let response: Response = value.dyn_into().map_err(transport)?;
    if !response.ok() {
        return Err(DtviewError::Transport(format!(
            "{url} answered {}",
            response.status()
        )));
    }

    let body = JsFuture::from(response.text().map_err(transport)?)
        .await
        .map_err(transport)?;
    let text = body
        .as_string()
        .ok_or_else(|| DtviewError::Transport("response body is not text".into()))?;
    FetchResponse::from_json(&text)
}
