use crate::errors::AppError;
use crate::models::{Cliente, Endereco};
use sqlx::{FromRow, PgPool};

const CLIENTE_SELECT: &str = r#"
    SELECT c.id, c.nome, e.cep, e.logradouro, e.complemento, e.bairro,
           e.localidade, e.uf, e.ibge, e.gia, e.ddd, e.siafi
    FROM clientes c
    JOIN enderecos e ON e.cep = c.endereco_cep
"#;

/// Flat projection of a cliente joined with its endereco.
#[derive(FromRow)]
struct ClienteRow {
    id: i64,
    nome: String,
    cep: String,
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

impl From<ClienteRow> for Cliente {
    fn from(row: ClienteRow) -> Self {
        Cliente {
            id: row.id,
            nome: row.nome,
            endereco: Endereco {
                cep: row.cep,
                logradouro: row.logradouro,
                complemento: row.complemento,
                bairro: row.bairro,
                localidade: row.localidade,
                uf: row.uf,
                ibge: row.ibge,
                gia: row.gia,
                ddd: row.ddd,
                siafi: row.siafi,
            },
        }
    }
}

/// Storage for the enderecos lookup cache.
pub struct EnderecoStorage {
    pool: PgPool,
}

impl EnderecoStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_cep(&self, cep: &str) -> Result<Option<Endereco>, AppError> {
        let endereco = sqlx::query_as::<_, Endereco>(
            "SELECT cep, logradouro, complemento, bairro, localidade, uf, ibge, gia, ddd, siafi \
             FROM enderecos WHERE cep = $1",
        )
        .bind(cep)
        .fetch_optional(&self.pool)
        .await?;

        Ok(endereco)
    }

    /// Inserts the endereco unless a row for its CEP already exists, then
    /// returns the committed row. ON CONFLICT DO NOTHING makes concurrent
    /// first inserts of the same CEP safe: the first writer wins and every
    /// caller reads back the same row.
    pub async fn insert_if_absent(&self, endereco: &Endereco) -> Result<Endereco, AppError> {
        sqlx::query(
            "INSERT INTO enderecos (cep, logradouro, complemento, bairro, localidade, uf, ibge, gia, ddd, siafi) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (cep) DO NOTHING",
        )
        .bind(&endereco.cep)
        .bind(&endereco.logradouro)
        .bind(&endereco.complemento)
        .bind(&endereco.bairro)
        .bind(&endereco.localidade)
        .bind(&endereco.uf)
        .bind(&endereco.ibge)
        .bind(&endereco.gia)
        .bind(&endereco.ddd)
        .bind(&endereco.siafi)
        .execute(&self.pool)
        .await?;

        self.find_by_cep(&endereco.cep).await?.ok_or_else(|| {
            AppError::InternalError(format!(
                "Endereco {} missing right after insert",
                endereco.cep
            ))
        })
    }
}

/// Storage for cliente records. All reads join the endereco row so the API
/// can return clientes with their address embedded.
pub struct ClienteStorage {
    pool: PgPool,
}

impl ClienteStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> Result<Vec<Cliente>, AppError> {
        let rows = sqlx::query_as::<_, ClienteRow>(&format!("{} ORDER BY c.id", CLIENTE_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Cliente::from).collect())
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Cliente>, AppError> {
        let row = sqlx::query_as::<_, ClienteRow>(&format!("{} WHERE c.id = $1", CLIENTE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Cliente::from))
    }

    pub async fn insert(&self, nome: &str, endereco_cep: &str) -> Result<Cliente, AppError> {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO clientes (nome, endereco_cep) VALUES ($1, $2) RETURNING id")
                .bind(nome)
                .bind(endereco_cep)
                .fetch_one(&self.pool)
                .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Cliente {} missing right after insert", id)))
    }

    /// Overwrites nome and endereco reference, preserving the id. Returns
    /// `None` when the id does not exist.
    pub async fn update(
        &self,
        id: i64,
        nome: &str,
        endereco_cep: &str,
    ) -> Result<Option<Cliente>, AppError> {
        let result = sqlx::query(
            "UPDATE clientes SET nome = $2, endereco_cep = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(nome)
        .bind(endereco_cep)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    /// Returns whether a row was deleted.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clientes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
