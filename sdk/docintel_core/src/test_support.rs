//! Helpers for tests that exercise a client against a wiremock server.
//!
//! Enabled by the `test-support` feature so sibling crates can share the
//! same setup in their own tests.

use crate::auth::DocIntelCredential;
use crate::client::DocIntelClient;
use wiremock::MockServer;

/// Test API key (not a real key).
pub const TEST_API_KEY: &str = "test-api-key";

/// Create a test client pointed at a mock server.
pub async fn setup_mock_client(server: &MockServer) -> DocIntelClient {
    DocIntelClient::builder()
        .endpoint(server.uri())
        .credential(DocIntelCredential::api_key(TEST_API_KEY))
        .build()
        .expect("should build client")
}
