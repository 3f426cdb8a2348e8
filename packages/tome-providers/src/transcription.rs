use std::time::Duration;

use reqwest::{
	Client,
	multipart::{Form, Part},
};
use serde_json::Value;

use crate::{Error, Result};

/// Uploads an audio file to an OpenAI-compatible transcription endpoint.
pub async fn transcribe(
	cfg: &tome_config::ProviderConfig,
	file_name: &str,
	audio: Vec<u8>,
) -> Result<String> {
	let headers = crate::auth_headers(&cfg.provider_id, &cfg.api_key, &cfg.default_headers)?;
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let form = Form::new()
		.text("model", cfg.model.clone())
		.part("file", Part::bytes(audio).file_name(file_name.to_string()));
	let res = client.post(url).headers(headers).multipart(form).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_transcript(json)
}

fn parse_transcript(json: Value) -> Result<String> {
	let text = json.get("text").and_then(|v| v.as_str()).ok_or_else(|| Error::InvalidResponse {
		message: "Transcription response is missing text.".to_string(),
	})?;

	Ok(text.trim().to_string())
}
