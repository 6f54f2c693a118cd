mod basic;
mod client;
mod error;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use error::FetchFailure;

use serde::de::DeserializeOwned;
use tracing::debug;

/// GETs `url` and decodes the JSON body.
///
/// Transport errors, non-2xx statuses and undecodable bodies all come back
/// as a [`FetchFailure`].
pub async fn fetch_json<C, T>(client: &C, url: reqwest::Url) -> Result<T, FetchFailure>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchFailure::Status(status));
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), %status, "Response received");
    Ok(serde_json::from_slice(&bytes)?)
}
