use crate::error::{DocIntelError, DocIntelResult};
use secrecy::{ExposeSecret, SecretString};

/// HTTP header carrying the Document Intelligence subscription key.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// API-key credential for an Azure Document Intelligence resource.
///
/// The key is taken from the "Keys and Endpoint" section of the Azure portal
/// and is injected into every request as the `Ocp-Apim-Subscription-Key`
/// header. The key is never mutated after construction.
#[derive(Clone)]
pub struct DocIntelCredential {
    key: SecretString,
}

impl DocIntelCredential {
    /// Create a credential from an API key.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
        }
    }

    /// Create a credential from the `AZURE_DOCINTEL_API_KEY` environment variable.
    pub fn from_env() -> DocIntelResult<Self> {
        match std::env::var("AZURE_DOCINTEL_API_KEY") {
            Ok(key) if !key.is_empty() => Ok(Self::api_key(key)),
            _ => Err(DocIntelError::MissingConfig(
                "API key is required. Set it via builder or AZURE_DOCINTEL_API_KEY env var."
                    .into(),
            )),
        }
    }

    /// Resolve the credential to the subscription-key header value.
    pub fn header_value(&self) -> String {
        self.key.expose_secret().to_string()
    }
}

impl std::fmt::Debug for DocIntelCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocIntelCredential(****)")
    }
}
