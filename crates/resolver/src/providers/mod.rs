//! Provider adapters: one external zip-code source each, all answering with a
//! [`ProviderResult`].

use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use cep_gateway_domain::{LookupKey, UnifiedAddress};

use crate::http::Fetcher;

mod types;

pub use types::{AddressSchema, ApiCepResponse, BrasilApiResponse, OpenCepResponse, ViaCepResponse};

/// Placeholder substituted with the normalized key in URL templates.
const KEY_PLACEHOLDER: &str = "{key}";

/// Outcome of one provider call. Only `Found` wins a fan-out round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderResult {
    Found(UnifiedAddress),
    NoData,
    TransportError(String),
}

impl ProviderResult {
    /// Unification rule shared by every adapter: a record whose fields are
    /// all blank is "no data", never a success.
    pub fn from_address(address: UnifiedAddress) -> Self {
        if address.is_empty() {
            ProviderResult::NoData
        } else {
            ProviderResult::Found(address)
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            ProviderResult::Found(_) => "found",
            ProviderResult::NoData => "no_data",
            ProviderResult::TransportError(_) => "transport_error",
        }
    }
}

#[async_trait]
pub trait AddressProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn resolve(&self, key: &LookupKey) -> ProviderResult;
}

/// Adapter for providers that answer a GET with a JSON document.
pub struct JsonProvider<S> {
    name: &'static str,
    url_template: &'static str,
    fetcher: Arc<dyn Fetcher>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: AddressSchema> JsonProvider<S> {
    pub fn new(name: &'static str, url_template: &'static str, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            name,
            url_template,
            fetcher,
            _schema: PhantomData,
        }
    }

    pub fn url_for(&self, key: &LookupKey) -> String {
        self.url_template.replace(KEY_PLACEHOLDER, key.as_str())
    }

    fn map_body(body: &[u8]) -> ProviderResult {
        match serde_json::from_slice::<S>(body) {
            Ok(payload) => ProviderResult::from_address(payload.into_address()),
            Err(err) => ProviderResult::TransportError(format!("malformed payload: {err}")),
        }
    }
}

#[async_trait]
impl<S: AddressSchema + 'static> AddressProvider for JsonProvider<S> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn resolve(&self, key: &LookupKey) -> ProviderResult {
        let url = self.url_for(key);
        match self.fetcher.fetch(&url).await {
            Ok(body) => Self::map_body(&body),
            Err(err) if err.is_not_found() => ProviderResult::NoData,
            Err(err) => ProviderResult::TransportError(err.to_string()),
        }
    }
}

pub fn viacep(fetcher: Arc<dyn Fetcher>) -> JsonProvider<ViaCepResponse> {
    JsonProvider::new("viacep", "https://viacep.com.br/ws/{key}/json/", fetcher)
}

pub fn opencep(fetcher: Arc<dyn Fetcher>) -> JsonProvider<OpenCepResponse> {
    JsonProvider::new("opencep", "https://opencep.com/v1/{key}", fetcher)
}

pub fn brasilapi(fetcher: Arc<dyn Fetcher>) -> JsonProvider<BrasilApiResponse> {
    JsonProvider::new(
        "brasilapi",
        "https://brasilapi.com.br/api/cep/v2/{key}",
        fetcher,
    )
}

pub fn apicep(fetcher: Arc<dyn Fetcher>) -> JsonProvider<ApiCepResponse> {
    JsonProvider::new(
        "apicep",
        "https://cdn.apicep.com/file/apicep/{key}.json",
        fetcher,
    )
}

/// Every built-in provider sharing one transport.
pub fn default_providers(fetcher: Arc<dyn Fetcher>) -> Vec<Arc<dyn AddressProvider>> {
    vec![
        Arc::new(apicep(Arc::clone(&fetcher))),
        Arc::new(brasilapi(Arc::clone(&fetcher))),
        Arc::new(opencep(Arc::clone(&fetcher))),
        Arc::new(viacep(fetcher)),
    ]
}
