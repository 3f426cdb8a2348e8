//! Note content encryption with ChaCha20-Poly1305.
//!
//! Ciphertext is stored as base64 of the 12-byte nonce followed by the sealed content.

use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::{
	ChaCha20Poly1305, Nonce,
	aead::{Aead, AeadCore, KeyInit, OsRng},
};

use crate::{Error, Result};
use tome_config::Config;
use tome_domain::Note;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

pub struct ContentCipher {
	cipher: ChaCha20Poly1305,
}
impl ContentCipher {
	/// Builds a cipher from a base64 encoded 32-byte key.
	pub fn new(encoded_key: &str) -> Result<Self> {
		let key = STANDARD.decode(encoded_key.trim()).map_err(|err| Error::Config {
			message: format!("security.encryption_key is not valid base64: {err}."),
		})?;

		if key.len() != KEY_LEN {
			return Err(Error::Config {
				message: format!(
					"security.encryption_key must decode to {KEY_LEN} bytes, got {}.",
					key.len()
				),
			});
		}

		let cipher = ChaCha20Poly1305::new_from_slice(&key)
			.map_err(|_| Error::Config { message: "Invalid encryption key length.".to_string() })?;

		Ok(Self { cipher })
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		let key = cfg.security.encryption_key.as_deref().ok_or_else(|| Error::Config {
			message: "security.encryption_key is required for encrypted notes.".to_string(),
		})?;

		Self::new(key)
	}

	pub fn encrypt(&self, plaintext: &str) -> Result<String> {
		let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
		let sealed = self
			.cipher
			.encrypt(&nonce, plaintext.as_bytes())
			.map_err(|_| Error::Crypto { message: "Failed to encrypt note content.".to_string() })?;
		let mut payload = Vec::with_capacity(NONCE_LEN + sealed.len());

		payload.extend_from_slice(&nonce);
		payload.extend_from_slice(&sealed);

		Ok(STANDARD.encode(payload))
	}

	pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
		let payload = STANDARD.decode(ciphertext.trim()).map_err(|err| Error::Crypto {
			message: format!("Ciphertext is not valid base64: {err}."),
		})?;

		if payload.len() < NONCE_LEN {
			return Err(Error::Crypto { message: "Ciphertext is too short.".to_string() });
		}

		let (nonce, sealed) = payload.split_at(NONCE_LEN);
		let plaintext = self.cipher.decrypt(Nonce::from_slice(nonce), sealed).map_err(|_| {
			Error::Crypto { message: "Failed to decrypt note content; wrong key?".to_string() }
		})?;

		String::from_utf8(plaintext).map_err(|err| Error::Crypto {
			message: format!("Decrypted content is not UTF-8: {err}."),
		})
	}

	/// Replaces the content of an encrypted note with its plaintext. Plain notes pass through.
	pub fn decrypt_note(&self, mut note: Note) -> Result<Note> {
		if note.encrypted {
			note.content = self.decrypt(&note.content)?;
			note.encrypted = false;
		}

		Ok(note)
	}
}

/// A fresh random key, base64 encoded for `security.encryption_key`.
pub fn generate_key() -> String {
	STANDARD.encode(ChaCha20Poly1305::generate_key(&mut OsRng))
}
