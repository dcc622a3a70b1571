use crate::errors::AppError;
use crate::models::Endereco;
use serde::Deserialize;
use std::time::Duration;

/// Client for the ViaCEP address lookup service.
///
/// One operation: resolve a CEP into address fields. No caching here; the
/// enderecos table is the cache.
#[derive(Clone)]
pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

/// ViaCEP response body. Unknown CEPs come back as HTTP 200 with
/// `{"erro": true}` instead of a non-success status.
#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: bool,
    logradouro: Option<String>,
    complemento: Option<String>,
    bairro: Option<String>,
    localidade: Option<String>,
    uf: Option<String>,
    ibge: Option<String>,
    gia: Option<String>,
    ddd: Option<String>,
    siafi: Option<String>,
}

impl ViaCepClient {
    pub fn new(base_url: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create ViaCEP client: {}", e))
            })?;

        Ok(Self { client, base_url })
    }

    /// Looks up a CEP, returning the resolved endereco keyed by the requested
    /// CEP. Fails with `Validation` when ViaCEP reports the CEP as
    /// nonexistent, and `ExternalApiError` on transport or server failures.
    /// No retries.
    pub async fn consultar_cep(&self, cep: &str) -> Result<Endereco, AppError> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep);
        tracing::info!("Consulting ViaCEP for CEP {}", cep);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("ViaCEP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "ViaCEP returned {}: {}",
                status, error_text
            )));
        }

        let body: ViaCepResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse ViaCEP response: {}", e))
        })?;

        if body.erro {
            return Err(AppError::Validation(format!(
                "endereco.cep: CEP {} não encontrado",
                cep
            )));
        }

        Ok(Endereco {
            cep: cep.to_string(),
            logradouro: body.logradouro,
            complemento: body.complemento,
            bairro: body.bairro,
            localidade: body.localidade,
            uf: body.uf,
            ibge: body.ibge,
            gia: body.gia,
            ddd: body.ddd,
            siafi: body.siafi,
        })
    }
}
