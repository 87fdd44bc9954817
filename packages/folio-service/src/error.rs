pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Cache unavailable: {message}")]
	CacheUnavailable { message: String },
	#[error("The knowledge base has not been indexed yet.")]
	NotIndexed,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<folio_storage::Error> for Error {
	fn from(err: folio_storage::Error) -> Self {
		Self::CacheUnavailable { message: err.to_string() }
	}
}
