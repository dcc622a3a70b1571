use crate::errors::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::OnceLock;

// ============ Database Models ============

/// Address row resolved via ViaCEP and cached by CEP.
///
/// Rows are shared between clientes and never mutated after the first insert;
/// the table acts as a deduplicated lookup cache keyed by `cep`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Endereco {
    /// Postal code in canonical `00000-000` form, primary key.
    pub cep: String,
    /// Street name.
    pub logradouro: Option<String>,
    /// Address complement.
    pub complemento: Option<String>,
    /// Neighborhood.
    pub bairro: Option<String>,
    /// City.
    pub localidade: Option<String>,
    /// State abbreviation.
    pub uf: Option<String>,
    /// IBGE municipality code.
    pub ibge: Option<String>,
    /// GIA code (São Paulo state tax registry).
    pub gia: Option<String>,
    /// Phone area code.
    pub ddd: Option<String>,
    /// SIAFI code.
    pub siafi: Option<String>,
}

/// Customer record as returned by the API, with its endereco embedded.
#[derive(Debug, Clone, Serialize)]
pub struct Cliente {
    /// Generated numeric identifier.
    pub id: i64,
    pub nome: String,
    pub endereco: Endereco,
}

// ============ Request Payloads ============

/// Create/update request body: `{ "nome": ..., "endereco": { "cep": ... } }`.
///
/// Fields are optional at the serde level so missing values surface as
/// field-level validation errors instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientePayload {
    pub nome: Option<String>,
    pub endereco: Option<EnderecoPayload>,
}

/// Endereco portion of the request body. Only the CEP is taken from the
/// client; the remaining address fields come from the lookup service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnderecoPayload {
    pub cep: Option<String>,
}

/// Validated create/update input, with the CEP in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NovoCliente {
    pub nome: String,
    pub cep: String,
}

static CEP_REGEX: OnceLock<Regex> = OnceLock::new();

fn cep_regex() -> &'static Regex {
    // ASCII digits only; \d would also match other Unicode digit classes
    CEP_REGEX.get_or_init(|| Regex::new(r"^[0-9]{5}-?[0-9]{3}$").expect("invalid CEP regex"))
}

/// Normalizes an already shape-checked CEP to `00000-000`.
fn normalize_cep(cep: &str) -> String {
    let digits: String = cep.chars().filter(char::is_ascii_digit).collect();
    format!("{}-{}", &digits[..5], &digits[5..])
}

impl ClientePayload {
    /// Validates the payload, reporting the first failing field as
    /// `"{field}: {message}"`.
    ///
    /// Rules: `nome` is required with 2-30 characters (after trimming);
    /// `endereco.cep` is required and must match `00000-000` or `00000000`.
    pub fn validate(&self) -> Result<NovoCliente, AppError> {
        let nome = self.nome.as_deref().map(str::trim).unwrap_or("");
        if nome.is_empty() {
            return Err(AppError::Validation(
                "nome: O nome do cliente é obrigatório".to_string(),
            ));
        }
        let len = nome.chars().count();
        if !(2..=30).contains(&len) {
            return Err(AppError::Validation(
                "nome: O nome deve ter entre 2 e 30 caracteres".to_string(),
            ));
        }

        let cep = self
            .endereco
            .as_ref()
            .and_then(|e| e.cep.as_deref())
            .map(str::trim)
            .unwrap_or("");
        if cep.is_empty() {
            return Err(AppError::Validation(
                "endereco.cep: O CEP é obrigatório".to_string(),
            ));
        }
        if !cep_regex().is_match(cep) {
            return Err(AppError::Validation(
                "endereco.cep: O CEP deve estar no formato 00000-000".to_string(),
            ));
        }

        Ok(NovoCliente {
            nome: nome.to_string(),
            cep: normalize_cep(cep),
        })
    }
}
