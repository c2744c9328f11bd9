use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::envelope::ApiEnvelope;

/// Thin JSON client for the external appointment API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.appointment_api_url.trim_end_matches('/').to_string(),
            api_key: config.appointment_api_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        if let Some(key) = &self.api_key {
            headers.insert("apikey", HeaderValue::from_str(key).context("Invalid API key header")?);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Invalid bearer token header")?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let headers = self.get_headers(auth_token)?;

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => anyhow!("Authentication error: {}", error_text),
                404 => anyhow!("Resource not found: {}", error_text),
                _ => anyhow!("API error ({}): {}", status, error_text),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Like [`ApiClient::request`], but narrows the body through [`ApiEnvelope`].
    pub async fn request_data<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let envelope: ApiEnvelope<T> = self.request(method, path, auth_token, body).await?;
        envelope.into_result().map_err(|e| {
            error!("API reported failure for {}: {}", path, e);
            anyhow!("API error: {}", e)
        })
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&AppConfig {
            appointment_api_url: format!("{}/", server.uri()),
            appointment_api_key: Some("test-key".to_string()),
            ..AppConfig::default()
        })
    }

    #[tokio::test]
    async fn forwards_token_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("apikey", "test-key"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        let value: i32 = client_for(&server)
            .request_data(Method::GET, "/ping", Some("abc"), None)
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn maps_non_success_status_to_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request::<Value>(Method::GET, "/nope", None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Resource not found"));
    }

    #[tokio::test]
    async fn envelope_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "success": false, "error": "boom" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .request_data::<Vec<String>>(Method::GET, "/x", None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = ApiClient::new(&AppConfig {
            appointment_api_url: "http://api.local/".to_string(),
            ..AppConfig::default()
        });
        assert_eq!(client.get_base_url(), "http://api.local");
    }
}
