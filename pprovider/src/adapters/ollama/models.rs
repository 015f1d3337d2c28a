use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::adapters::completions::{error_for_status, map_send_error};
use crate::{ModelCatalog, ModelDetails, ProviderError, ProviderFuture};

use super::OLLAMA_HOST_URL;

/// Model store of a local Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaModelRegistry {
    client: Client,
    host_url: String,
}

impl OllamaModelRegistry {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            host_url: OLLAMA_HOST_URL.to_string(),
        }
    }

    pub fn with_host_url(mut self, host_url: impl Into<String>) -> Self {
        self.host_url = host_url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.host_url.trim_end_matches('/'), path)
    }

    async fn checked(response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }
}

impl ModelCatalog for OllamaModelRegistry {
    fn list_models<'a>(&'a self) -> ProviderFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.endpoint("tags"))
                .send()
                .await
                .map_err(map_send_error)?;

            let parsed = Self::checked(response)
                .await?
                .json::<OllamaTagsResponse>()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            Ok(parsed.into_names())
        })
    }

    fn show_model<'a>(
        &'a self,
        name: &'a str,
    ) -> ProviderFuture<'a, Result<ModelDetails, ProviderError>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.endpoint("show"))
                .json(&OllamaModelRequest { model: name, stream: None })
                .send()
                .await
                .map_err(map_send_error)?;

            let parsed = Self::checked(response)
                .await?
                .json::<OllamaShowResponse>()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            Ok(parsed.into_details(name))
        })
    }

    fn pull_model<'a>(&'a self, name: &'a str) -> ProviderFuture<'a, Result<(), ProviderError>> {
        Box::pin(async move {
            tracing::info!(model = %name, "pulling model from registry");
            let response = self
                .client
                .post(self.endpoint("pull"))
                .json(&OllamaModelRequest {
                    model: name,
                    stream: Some(false),
                })
                .send()
                .await
                .map_err(map_send_error)?;

            let parsed = Self::checked(response)
                .await?
                .json::<OllamaPullResponse>()
                .await
                .map_err(|err| ProviderError::transport(err.to_string()))?;

            if parsed.status != "success" {
                return Err(ProviderError::transport(format!(
                    "pull of '{name}' ended with status '{}'",
                    parsed.status
                )));
            }

            Ok(())
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaModelRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModelTag>,
}

impl OllamaTagsResponse {
    fn into_names(self) -> Vec<String> {
        let mut names = self
            .models
            .into_iter()
            .map(|tag| tag.name)
            .collect::<Vec<_>>();
        names.sort();
        names
    }
}

#[derive(Debug, Deserialize)]
struct OllamaModelTag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OllamaShowResponse {
    #[serde(default)]
    modelfile: String,
    #[serde(default)]
    template: String,
}

impl OllamaShowResponse {
    fn into_details(self, name: &str) -> ModelDetails {
        let declared = if self.template.is_empty() {
            self.modelfile
        } else {
            format!("{}\n{}", self.modelfile, self.template)
        };
        ModelDetails::from_template(name, declared)
    }
}

#[derive(Debug, Deserialize)]
struct OllamaPullResponse {
    #[serde(default)]
    status: String,
}
