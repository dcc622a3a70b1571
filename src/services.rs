use crate::db_storage::{ClienteStorage, EnderecoStorage};
use crate::errors::AppError;
use crate::models::{Cliente, Endereco, NovoCliente};
use crate::viacep::ViaCepClient;
use sqlx::PgPool;

/// Business operations over clientes.
///
/// Owns its collaborators explicitly (storage + ViaCEP client); constructed
/// per request from the shared pool, no global state.
pub struct ClienteService {
    clientes: ClienteStorage,
    enderecos: EnderecoStorage,
    viacep: ViaCepClient,
}

impl ClienteService {
    pub fn new(pool: PgPool, viacep: ViaCepClient) -> Self {
        Self {
            clientes: ClienteStorage::new(pool.clone()),
            enderecos: EnderecoStorage::new(pool),
            viacep,
        }
    }

    pub async fn listar_todos(&self) -> Result<Vec<Cliente>, AppError> {
        self.clientes.find_all().await
    }

    pub async fn buscar_por_id(&self, id: i64) -> Result<Cliente, AppError> {
        self.clientes
            .find_by_id(id)
            .await?
            .ok_or_else(|| cliente_not_found(id))
    }

    /// Resolves the endereco by CEP and persists the cliente, returning the
    /// record with its generated id.
    pub async fn inserir(&self, novo: NovoCliente) -> Result<Cliente, AppError> {
        let endereco = self.resolver_endereco(&novo.cep).await?;
        let cliente = self.clientes.insert(&novo.nome, &endereco.cep).await?;

        tracing::info!("Cliente {} created with CEP {}", cliente.id, endereco.cep);
        Ok(cliente)
    }

    /// Overwrites nome and re-resolves the endereco reference, preserving the
    /// id. The endereco goes through the same find-or-fetch flow as insert so
    /// an updated cliente still always references a cached row.
    pub async fn atualizar(&self, id: i64, novo: NovoCliente) -> Result<Cliente, AppError> {
        // Unknown ids fail before any external lookup happens
        self.buscar_por_id(id).await?;

        let endereco = self.resolver_endereco(&novo.cep).await?;

        self.clientes
            .update(id, &novo.nome, &endereco.cep)
            .await?
            .ok_or_else(|| cliente_not_found(id))
    }

    pub async fn deletar(&self, id: i64) -> Result<(), AppError> {
        if !self.clientes.delete_by_id(id).await? {
            return Err(cliente_not_found(id));
        }

        tracing::info!("Cliente {} deleted", id);
        Ok(())
    }

    /// Find-or-fetch address resolution: reuse the cached row for this CEP if
    /// present, otherwise consult ViaCEP and persist the result. A lookup
    /// failure propagates; there are no retries or fallbacks.
    async fn resolver_endereco(&self, cep: &str) -> Result<Endereco, AppError> {
        if let Some(existing) = self.enderecos.find_by_cep(cep).await? {
            tracing::debug!("Endereco cache hit for CEP {}", cep);
            return Ok(existing);
        }

        tracing::debug!("Endereco cache miss for CEP {}, consulting ViaCEP", cep);
        let novo = self.viacep.consultar_cep(cep).await?;
        self.enderecos.insert_if_absent(&novo).await
    }
}

fn cliente_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Cliente não encontrado com o ID: {}", id))
}
