use actix_web::{web, HttpResponse};
use cep_gateway_domain::{LookupKey, UnifiedAddress};
use cep_gateway_resolver::resolve_with_degradation;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::state::AppState;

use super::ApiError;

/// Success envelope: the address nested under `data`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub data: UnifiedAddress,
}

pub async fn zip_code_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let raw = path.into_inner();
    let key = LookupKey::parse(&raw).inspect_err(|_| {
        counter!("api_zipcode_requests_total", "status" => "invalid").increment(1);
    })?;

    match resolve_with_degradation(state.resolver(), key).await {
        Ok(address) => {
            counter!("api_zipcode_requests_total", "status" => "found").increment(1);
            Ok(HttpResponse::Ok().json(AddressResponse { data: address }))
        }
        Err(err) => {
            counter!("api_zipcode_requests_total", "status" => "not_found").increment(1);
            info!(zip_code = %raw, attempts = err.attempts(), error = %err, "zip code unresolved");
            Err(err.into())
        }
    }
}
