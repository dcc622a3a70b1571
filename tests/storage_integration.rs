use std::env;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clientes_api::db::Database;
use clientes_api::models::NovoCliente;
use clientes_api::services::ClienteService;
use clientes_api::viacep::ViaCepClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Integration smoke test for the full CRUD + address resolution flow.
/// Marked ignored to avoid running against production by accident; set
/// TEST_DATABASE_URL to run. ViaCEP is mocked, so the single .expect(1)
/// also proves the second insert reuses the cached endereco row.
#[tokio::test]
#[ignore]
async fn crud_flow_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;

    // Use a unique CEP to avoid conflicts on repeated runs.
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.subsec_nanos() as u64;
    let cep = format!("9{:04}-{:03}", nanos % 10_000, (nanos / 7) % 1_000);

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/ws/{}/json/", cep)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": cep,
            "logradouro": "Rua de Teste",
            "bairro": "Centro",
            "localidade": "São Paulo",
            "uf": "SP",
            "ddd": "11"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let viacep = ViaCepClient::new(mock_server.uri()).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let service = ClienteService::new(db.pool.clone(), viacep);

    // First insert triggers the external lookup and caches the endereco.
    let primeiro = service
        .inserir(NovoCliente {
            nome: "Cliente Teste".to_string(),
            cep: cep.clone(),
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(primeiro.nome, "Cliente Teste");
    assert_eq!(primeiro.endereco.cep, cep);
    assert_eq!(primeiro.endereco.logradouro.as_deref(), Some("Rua de Teste"));

    // Second insert with the same CEP reuses the cached row (mock expects 1 call).
    let segundo = service
        .inserir(NovoCliente {
            nome: "Segundo Cliente".to_string(),
            cep: cep.clone(),
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_ne!(segundo.id, primeiro.id);
    assert_eq!(segundo.endereco, primeiro.endereco);

    // Exactly one endereco row for the CEP.
    let enderecos: i64 = sqlx::query_scalar("SELECT count(*) FROM enderecos WHERE cep = $1")
        .bind(&cep)
        .fetch_one(&db.pool)
        .await?;
    assert_eq!(enderecos, 1);

    // Update preserves the id and only changes nome/endereco.
    let atualizado = service
        .atualizar(
            primeiro.id,
            NovoCliente {
                nome: "Nome Atualizado".to_string(),
                cep: cep.clone(),
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(atualizado.id, primeiro.id);
    assert_eq!(atualizado.nome, "Nome Atualizado");
    assert_eq!(atualizado.endereco.cep, cep);

    // Delete, then the id is gone.
    service
        .deletar(primeiro.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let sumido = service.buscar_por_id(primeiro.id).await;
    assert!(sumido.is_err());

    service
        .deletar(segundo.id)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    Ok(())
}

/// Concurrent first inserts of the same unseen CEP: every insert must
/// succeed and exactly one endereco row may exist afterwards. Racing callers
/// are allowed to each consult ViaCEP (no .expect on the mock); the
/// ON CONFLICT insert-if-absent in the store is what must collapse them to
/// one committed row.
#[tokio::test]
#[ignore]
async fn concurrent_first_inserts_share_one_endereco() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.subsec_nanos() as u64;
    let cep = format!("8{:04}-{:03}", nanos % 10_000, (nanos / 13) % 1_000);

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/ws/{}/json/", cep)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cep": cep,
            "logradouro": "Rua Concorrente",
            "localidade": "São Paulo",
            "uf": "SP"
        })))
        .mount(&mock_server)
        .await;

    let viacep = ViaCepClient::new(mock_server.uri()).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let service = Arc::new(ClienteService::new(db.pool.clone(), viacep));

    let mut handles = vec![];
    for i in 0..8 {
        let service = Arc::clone(&service);
        let cep = cep.clone();
        handles.push(tokio::spawn(async move {
            service
                .inserir(NovoCliente {
                    nome: format!("Cliente Concorrente {}", i),
                    cep,
                })
                .await
        }));
    }

    let mut ids = vec![];
    for handle in handles {
        let cliente = handle.await?.map_err(|e| anyhow::anyhow!(e.to_string()))?;
        assert_eq!(cliente.endereco.cep, cep);
        ids.push(cliente.id);
    }

    let enderecos: i64 = sqlx::query_scalar("SELECT count(*) FROM enderecos WHERE cep = $1")
        .bind(&cep)
        .fetch_one(&db.pool)
        .await?;
    assert_eq!(enderecos, 1);

    for id in ids {
        service
            .deletar(id)
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    }

    Ok(())
}

/// Unknown ids yield not-found errors naming the id, without touching ViaCEP.
#[tokio::test]
#[ignore]
async fn unknown_id_yields_not_found() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL or DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;

    // No mocks mounted: any ViaCEP call would fail the test via connection error.
    let mock_server = MockServer::start().await;
    let viacep = ViaCepClient::new(mock_server.uri()).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let service = ClienteService::new(db.pool.clone(), viacep);

    let missing_id = i64::MAX - 1;

    let err = service.buscar_por_id(missing_id).await.unwrap_err();
    assert!(err.to_string().contains(&missing_id.to_string()));

    let err = service
        .atualizar(
            missing_id,
            NovoCliente {
                nome: "Qualquer Nome".to_string(),
                cep: "01310-000".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains(&missing_id.to_string()));

    let err = service.deletar(missing_id).await.unwrap_err();
    assert!(err.to_string().contains(&missing_id.to_string()));

    Ok(())
}
