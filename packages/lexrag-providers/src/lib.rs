pub mod embedding;
pub mod generation;
pub mod resolution;

pub use generation::ChatCompletion;

use color_eyre::Result;
use reqwest::header::{HeaderMap, HeaderValue};

/// The embedding and generation services authenticate with a plain `api-key`
/// header rather than a bearer token.
pub fn auth_headers(api_key: &str) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();
	let mut value: HeaderValue = api_key.parse()?;

	value.set_sensitive(true);
	headers.insert("api-key", value);

	Ok(headers)
}
