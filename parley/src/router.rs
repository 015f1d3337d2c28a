//! Backend construction keyed on the model identifier.
//!
//! Plain names run on the local Ollama daemon. `:<vendor>:<model>` names run remotely.
//!
//! ```rust
//! use parley::router::{BackendResolver, BackendRouter};
//! use parley::{BackendKind, ChatErrorKind};
//!
//! let router = BackendRouter::new().expect("http client builds");
//! let local = router.resolve("qwen3:4b").expect("local models need no credentials");
//! assert_eq!(local.kind(), BackendKind::Local);
//!
//! let error = router.resolve(":acme:model").expect_err("unknown vendor");
//! assert_eq!(error.kind, ChatErrorKind::BackendInit);
//! ```

use std::sync::Arc;
use std::time::Duration;

use pchat::{Backend, ChatError};
use pprovider::{
    ModelCatalog, ModelProvider, ModelRoute, ProviderId, ProviderRegistry, SecureCredentialManager,
};
use reqwest::Client;

/// Turns a model identifier into a ready backend.
pub trait BackendResolver: Send + Sync {
    fn resolve(&self, model_id: &str) -> Result<Backend, ChatError>;

    /// Whether a remote model can call tools. Local models are asked through the catalog.
    fn remote_supports_tools(&self, _route: &ModelRoute) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouterConfig {
    /// HTTP timeout for every request. `None` keeps the client default.
    pub timeout: Option<Duration>,
    pub ollama_base_url: Option<String>,
    pub ollama_host_url: Option<String>,
    pub openai_base_url: Option<String>,
}

impl RouterConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_ollama_host(mut self, host_url: impl Into<String>) -> Self {
        let host_url = host_url.into();
        self.ollama_base_url = Some(format!("{}/v1", host_url.trim_end_matches('/')));
        self.ollama_host_url = Some(host_url);
        self
    }

    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = Some(base_url.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct BackendRouter {
    http: Client,
    credentials: Arc<SecureCredentialManager>,
    providers: ProviderRegistry,
    config: RouterConfig,
}

impl BackendRouter {
    pub fn new() -> Result<Self, ChatError> {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Result<Self, ChatError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ChatError::backend_init(format!("http client: {err}")))?;

        let credentials = Arc::new(SecureCredentialManager::new());
        let providers = compiled_providers(&http, &credentials, &config);
        tracing::debug!(providers = ?providers, "backend router ready");

        Ok(Self {
            http,
            credentials,
            providers,
            config,
        })
    }

    pub fn credentials(&self) -> Arc<SecureCredentialManager> {
        Arc::clone(&self.credentials)
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Stores the remote key. OpenAI keys must start with `sk-`.
    pub fn with_openai_api_key(self, api_key: impl Into<String>) -> Result<Self, ChatError> {
        set_openai_key(&self.credentials, api_key.into())?;
        Ok(self)
    }

    /// Picks up `OPENAI_API_KEY` unless a key is already stored. Returns whether a key is present.
    pub fn load_env_credentials(&self) -> Result<bool, ChatError> {
        if self.credentials.has_credentials(ProviderId::OpenAi)? {
            return Ok(true);
        }
        load_openai_env(&self.credentials)
    }

    /// The local model store behind this router.
    pub fn model_catalog(&self) -> Result<Arc<dyn ModelCatalog>, ChatError> {
        build_ollama_catalog(self.http.clone(), self.config.ollama_host_url.as_deref())
    }

    fn provider(&self, vendor: ProviderId) -> Result<Arc<dyn ModelProvider>, ChatError> {
        self.providers.get(vendor).ok_or_else(|| {
            ChatError::backend_init(format!("{vendor} support is not enabled on parley"))
        })
    }
}

impl BackendResolver for BackendRouter {
    fn resolve(&self, model_id: &str) -> Result<Backend, ChatError> {
        let route = ModelRoute::parse(model_id)
            .map_err(|err| ChatError::backend_init(err.message).with_provider_kind(err.kind))?;

        tracing::debug!(route = %route, remote = route.is_remote(), "resolving backend");
        let provider = self.provider(route.provider())?;
        match route {
            ModelRoute::Local { model } => Ok(Backend::local(provider, model)),
            ModelRoute::Remote { vendor, model } => {
                if !self.credentials.has_credentials(vendor)? {
                    return Err(ChatError::backend_init(format!(
                        "no API key configured for remote model '{model}'; set remote_models.openai.api_key or OPENAI_API_KEY"
                    )));
                }
                Ok(Backend::remote(provider, model))
            }
        }
    }
}

fn compiled_providers(
    http: &Client,
    credentials: &Arc<SecureCredentialManager>,
    config: &RouterConfig,
) -> ProviderRegistry {
    let mut providers = ProviderRegistry::new();

    #[cfg(feature = "provider-ollama")]
    {
        use pprovider::adapters::ollama::OllamaProvider;

        let mut transport = OllamaProvider::default_http_transport(http.clone());
        if let Some(base_url) = &config.ollama_base_url {
            transport = transport.with_base_url(base_url.as_str());
        }
        providers.register(Arc::new(OllamaProvider::new(Arc::new(transport))));
    }

    #[cfg(feature = "provider-openai")]
    {
        use pprovider::adapters::openai::OpenAiProvider;

        let mut transport = OpenAiProvider::default_http_transport(http.clone());
        if let Some(base_url) = &config.openai_base_url {
            transport = transport.with_base_url(base_url.as_str());
        }
        providers.register(Arc::new(OpenAiProvider::new(
            Arc::clone(credentials),
            Arc::new(transport),
        )));
    }

    #[cfg(not(any(feature = "provider-ollama", feature = "provider-openai")))]
    let _ = (http, credentials, config);

    providers
}

#[cfg(feature = "provider-openai")]
fn set_openai_key(credentials: &SecureCredentialManager, api_key: String) -> Result<(), ChatError> {
    credentials
        .set_openai_api_key(api_key.trim())
        .map_err(|err| ChatError::backend_init(err.message).with_provider_kind(err.kind))
}

#[cfg(not(feature = "provider-openai"))]
fn set_openai_key(_credentials: &SecureCredentialManager, _api_key: String) -> Result<(), ChatError> {
    Err(ChatError::backend_init(
        "provider-openai feature is not enabled on parley",
    ))
}

#[cfg(feature = "provider-openai")]
fn load_openai_env(credentials: &SecureCredentialManager) -> Result<bool, ChatError> {
    Ok(credentials.load_api_key_from_env(
        ProviderId::OpenAi,
        pprovider::adapters::openai::OPENAI_API_KEY_ENV,
    )?)
}

#[cfg(not(feature = "provider-openai"))]
fn load_openai_env(_credentials: &SecureCredentialManager) -> Result<bool, ChatError> {
    Ok(false)
}

#[cfg(feature = "provider-ollama")]
fn build_ollama_catalog(
    http: Client,
    host_url: Option<&str>,
) -> Result<Arc<dyn ModelCatalog>, ChatError> {
    use pprovider::adapters::ollama::OllamaModelRegistry;

    let mut registry = OllamaModelRegistry::new(http);
    if let Some(host_url) = host_url {
        registry = registry.with_host_url(host_url);
    }
    Ok(Arc::new(registry))
}

#[cfg(not(feature = "provider-ollama"))]
fn build_ollama_catalog(
    _http: Client,
    _host_url: Option<&str>,
) -> Result<Arc<dyn ModelCatalog>, ChatError> {
    Err(ChatError::backend_init(
        "provider-ollama feature is not enabled on parley",
    ))
}
