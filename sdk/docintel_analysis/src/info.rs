//! Resource information call, used as the credential connectivity test.
//!
//! `GET {endpoint}/documentintelligence/info` is the cheapest authenticated
//! call the service offers; a credential editor runs it before saving to
//! verify the endpoint and key.

use docintel_core::client::DocIntelClient;
use docintel_core::error::DocIntelResult;
use serde::Deserialize;

/// Custom document model quota for the resource.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomDocumentModelLimits {
    /// Number of custom models currently trained.
    pub count: u64,
    /// Maximum number of custom models for this resource tier.
    pub limit: u64,
}

/// Information about a Document Intelligence resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInfo {
    /// Custom model quota, when reported by the service.
    #[serde(rename = "customDocumentModels")]
    pub custom_document_models: Option<CustomDocumentModelLimits>,
}

/// Fetch resource information for the configured endpoint.
///
/// Succeeds only when both the endpoint and the subscription key are valid,
/// which makes it suitable as a credential test.
///
/// # Tracing
///
/// Emits a span named `docintel::service_info`.
#[tracing::instrument(name = "docintel::service_info", skip(client))]
pub async fn service_info(client: &DocIntelClient) -> DocIntelResult<ServiceInfo> {
    let path = format!(
        "/documentintelligence/info?api-version={}",
        client.api_version(),
    );

    let response = client.get(&path).await?;
    let info = response.json::<ServiceInfo>().await?;

    tracing::debug!("service info fetched");
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_mock_client;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_service_info_success() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/documentintelligence/info"))
            .and(query_param("api-version", "2024-11-30"))
            .and(header("Ocp-Apim-Subscription-Key", "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "customDocumentModels": { "count": 2, "limit": 500 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = service_info(&client).await.expect("should succeed");
        let models = info.custom_document_models.expect("should have quota");
        assert_eq!(models.count, 2);
        assert_eq!(models.limit, 500);
    }

    #[tokio::test]
    async fn test_service_info_unauthorized() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/documentintelligence/info"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "code": "Unauthorized", "message": "Invalid subscription key" }
            })))
            .mount(&server)
            .await;

        let err = service_info(&client).await.expect_err("should fail");
        assert!(
            err.to_string().contains("Unauthorized") || err.to_string().contains("401"),
            "error: {err}",
        );
    }

    #[tokio::test]
    async fn test_service_info_tolerates_extra_fields() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        Mock::given(method("GET"))
            .and(path("/documentintelligence/info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "customDocumentModels": { "count": 0, "limit": 100 },
                "customNeuralDocumentModelBuilds": { "used": 0, "quota": 10 }
            })))
            .mount(&server)
            .await;

        let info = service_info(&client).await.expect("should succeed");
        assert!(info.custom_document_models.is_some());
    }
}
