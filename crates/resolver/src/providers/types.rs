// Raw upstream payloads. Each schema only names the fields it maps; anything
// else in the body is ignored, and missing or null fields decode as empty.

use cep_gateway_domain::UnifiedAddress;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Maps one provider's private payload into the unified shape.
pub trait AddressSchema: DeserializeOwned + Send {
    fn into_address(self) -> UnifiedAddress;
}

/// https://viacep.com.br/ws/00000000/json/
#[derive(Debug, Default, Deserialize)]
pub struct ViaCepResponse {
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub localidade: Option<String>,
    #[serde(default)]
    pub uf: Option<String>,
}

impl AddressSchema for ViaCepResponse {
    fn into_address(self) -> UnifiedAddress {
        UnifiedAddress {
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            state: self.uf.unwrap_or_default(),
        }
    }
}

/// https://opencep.com/v1/00000000
#[derive(Debug, Default, Deserialize)]
pub struct OpenCepResponse {
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub localidade: Option<String>,
    #[serde(default)]
    pub uf: Option<String>,
}

impl AddressSchema for OpenCepResponse {
    fn into_address(self) -> UnifiedAddress {
        UnifiedAddress {
            street: self.logradouro.unwrap_or_default(),
            neighborhood: self.bairro.unwrap_or_default(),
            city: self.localidade.unwrap_or_default(),
            state: self.uf.unwrap_or_default(),
        }
    }
}

/// https://brasilapi.com.br/api/cep/v2/00000000
#[derive(Debug, Default, Deserialize)]
pub struct BrasilApiResponse {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl AddressSchema for BrasilApiResponse {
    fn into_address(self) -> UnifiedAddress {
        UnifiedAddress {
            street: self.street.unwrap_or_default(),
            neighborhood: self.neighborhood.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
        }
    }
}

/// https://cdn.apicep.com/file/apicep/00000000.json
#[derive(Debug, Default, Deserialize)]
pub struct ApiCepResponse {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl AddressSchema for ApiCepResponse {
    fn into_address(self) -> UnifiedAddress {
        UnifiedAddress {
            street: self.address.unwrap_or_default(),
            neighborhood: self.district.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
        }
    }
}
