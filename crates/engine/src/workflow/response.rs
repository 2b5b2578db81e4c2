//! Request and response helpers shared by workflow steps.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use veil_api::{HttpRequest, HttpResponse, Transport};
use veil_types::{ProtocolError, StepError, TransportError};

/// Sends `request` and returns the response regardless of status.
pub(crate) fn send(transport: &dyn Transport, request: HttpRequest) -> Result<HttpResponse, StepError> {
    Ok(transport.send(request)?)
}

/// Sends `request` and fails with `UnexpectedStatus` on anything but 2xx.
pub(crate) fn send_expecting_success(transport: &dyn Transport, request: HttpRequest) -> Result<HttpResponse, StepError> {
    let url = request.url.clone();
    let response = send(transport, request)?;
    Ok(expect_success(response, &url)?)
}

pub(crate) fn expect_success(response: HttpResponse, url: &str) -> Result<HttpResponse, ProtocolError> {
    if response.is_success() {
        Ok(response)
    } else {
        debug!(status = response.status, url, "unexpected response status");
        Err(ProtocolError::UnexpectedStatus {
            status: response.status,
            url: url.to_string(),
        })
    }
}

/// Decodes a JSON body, naming `context` in the error.
pub(crate) fn decode_json<T: DeserializeOwned>(context: &str, body: &str) -> Result<T, ProtocolError> {
    serde_json::from_str(body).map_err(|error| ProtocolError::malformed(context, error))
}

/// Appends query parameters to `base`, encoding values.
pub(crate) fn with_query<'a, I>(base: &str, pairs: I) -> Result<String, TransportError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    Url::parse_with_params(base, pairs)
        .map(String::from)
        .map_err(|error| TransportError::InvalidRequest(format!("{base}: {error}")))
}
