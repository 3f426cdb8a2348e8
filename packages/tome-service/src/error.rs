pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Configuration error: {message}")]
	Config { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Transcription error: {message}")]
	Transcription { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Vector index error: {message}")]
	Index { message: String },
	#[error("Crypto error: {message}")]
	Crypto { message: String },
}
impl Error {
	pub(crate) fn transcription(err: tome_providers::Error) -> Self {
		match err {
			tome_providers::Error::MissingCredential { .. } => Self::Config { message: err.to_string() },
			other => Self::Transcription { message: other.to_string() },
		}
	}

	pub(crate) fn index(err: tome_storage::Error) -> Self {
		Self::Index { message: err.to_string() }
	}
}

impl From<tome_storage::Error> for Error {
	fn from(err: tome_storage::Error) -> Self {
		match err {
			tome_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			other => Self::Storage { message: other.to_string() },
		}
	}
}

impl From<tome_providers::Error> for Error {
	fn from(err: tome_providers::Error) -> Self {
		match err {
			tome_providers::Error::MissingCredential { .. } => Self::Config { message: err.to_string() },
			other => Self::Provider { message: other.to_string() },
		}
	}
}

/// Failure of a single agent action. Logged by the engine and never propagated.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
	#[error(transparent)]
	Io(#[from] std::io::Error),
	#[error(transparent)]
	Service(#[from] Error),
	#[error("{message}")]
	Failed { message: String },
}
