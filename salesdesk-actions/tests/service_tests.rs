mod support;

use pretty_assertions::assert_eq;
use salesdesk_actions::entities::{DealInput, PipelineInput};
use salesdesk_actions::{ActionError, ListQuery, SalesDesk, SalesDeskConfig, init_tracing};
use serde_json::json;
use support::{admin, alice, bob};

fn acme() -> DealInput {
    DealInput {
        title: "Acme".into(),
        value: 10_000.0,
        ..DealInput::default()
    }
}

// ── In memory ───────────────────────────────────────────────────

#[tokio::test]
async fn in_memory_bundle_wires_every_entity() {
    init_tracing("warn");
    let desk = SalesDesk::in_memory();
    assert!(!desk.is_persistent());
    let a = alice();

    let deal = desk.deals.create(Some(&a), acme()).await.unwrap();
    desk.contacts
        .create_json(Some(&a), json!({"name": "Ana"}))
        .await
        .unwrap();
    desk.leads
        .create_json(Some(&a), json!({"name": "Globex"}))
        .await
        .unwrap();
    desk.organizations
        .create_json(Some(&a), json!({"name": "Acme Ltda"}))
        .await
        .unwrap();
    desk.partners
        .create_json(Some(&a), json!({"name": "Canal Sul"}))
        .await
        .unwrap();
    desk.activities
        .create_json(Some(&a), json!({"subject": "Ligar", "deal_id": deal.id.as_str()}))
        .await
        .unwrap();
    desk.icps
        .create_json(Some(&a), json!({"name": "SaaS"}))
        .await
        .unwrap();
    desk.pipelines
        .create(
            Some(&bob()),
            PipelineInput {
                name: "Vendas".into(),
                ..PipelineInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(desk.deals.count(Some(&a), &ListQuery::new()).await.unwrap(), 1);
    assert_eq!(desk.contacts.count(Some(&a), &ListQuery::new()).await.unwrap(), 1);
    assert_eq!(desk.leads.count(Some(&bob()), &ListQuery::new()).await.unwrap(), 0);
    assert_eq!(desk.pipelines.list(Some(&a), &ListQuery::new()).await.unwrap().len(), 1);

    // Entities share one grant store
    desk.deals.share(Some(&a), &deal.id, &bob().user_id).await.unwrap();
    assert!(desk.deals.get_accessible(Some(&bob()), &deal.id).await.unwrap().is_some());

    desk.checkpoint().unwrap();
}

#[test]
fn open_without_data_dir_stays_in_memory() {
    let desk = SalesDesk::open(&SalesDeskConfig::default()).unwrap();
    assert!(!desk.is_persistent());
}

#[test]
fn open_rejects_invalid_config() {
    let config = SalesDeskConfig {
        default_page_size: 10,
        max_page_size: 5,
        ..SalesDeskConfig::default()
    };
    assert!(matches!(SalesDesk::open(&config), Err(ActionError::Config(_))));
}

// ── On disk ─────────────────────────────────────────────────────

#[tokio::test]
async fn persistent_bundle_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = SalesDeskConfig::persistent(dir.path().join("salesdesk"));
    let deal_id = {
        let desk = SalesDesk::open(&config).unwrap();
        assert!(desk.is_persistent());
        let deal = desk.deals.create(Some(&alice()), acme()).await.unwrap();
        desk.deals
            .share(Some(&alice()), &deal.id, &bob().user_id)
            .await
            .unwrap();
        desk.checkpoint().unwrap();
        deal.id
    };

    let desk = SalesDesk::open(&config).unwrap();
    let reloaded = desk.deals.get_by_id(Some(&alice()), &deal_id).await.unwrap().unwrap();
    assert_eq!(reloaded.title, "Acme");
    assert_eq!(reloaded.owner_id, alice().user_id);

    assert_eq!(desk.deals.get_by_id(Some(&bob()), &deal_id).await.unwrap(), None);
    assert!(desk.deals.get_accessible(Some(&bob()), &deal_id).await.unwrap().is_some());
    assert_eq!(desk.deals.list_shared_with_me(Some(&bob())).await.unwrap().len(), 1);

    let everyone = desk.deals.list(Some(&admin()), &ListQuery::new()).await.unwrap();
    assert_eq!(everyone.len(), 1);
}

#[tokio::test]
async fn persistent_paging_uses_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = SalesDeskConfig {
        default_page_size: 2,
        max_page_size: 3,
        ..SalesDeskConfig::persistent(dir.path())
    };
    let desk = SalesDesk::open(&config).unwrap();
    for i in 0..5 {
        desk.deals
            .create_json(Some(&alice()), json!({"title": format!("Deal {i}")}))
            .await
            .unwrap();
    }
    let first = desk.deals.list(Some(&alice()), &ListQuery::new()).await.unwrap();
    assert_eq!(first.len(), 2);

    let wide = ListQuery::new().page(salesdesk_actions::Page::new(100, 0));
    assert_eq!(desk.deals.list(Some(&alice()), &wide).await.unwrap().len(), 3);
    assert_eq!(desk.deals.count(Some(&alice()), &wide).await.unwrap(), 5);
}

// ── Config files ────────────────────────────────────────────────

#[test]
fn config_loads_partial_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("salesdesk.json");
    std::fs::write(&path, r#"{"data_dir": "/tmp/sd", "default_page_size": 25}"#).unwrap();

    let config = SalesDeskConfig::from_json_file(&path).unwrap();
    assert_eq!(config.default_page_size, 25);
    assert_eq!(config.max_page_size, 500);
    assert_eq!(config.records_file, "records.duckdb");
    assert_eq!(config.data_dir.as_deref(), Some(std::path::Path::new("/tmp/sd")));
}

#[test]
fn config_file_errors_surface() {
    let dir = tempfile::tempdir().unwrap();
    let missing = SalesDeskConfig::from_json_file(&dir.path().join("absent.json"));
    assert!(matches!(missing, Err(ActionError::Io(_))));

    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        SalesDeskConfig::from_json_file(&path),
        Err(ActionError::Json(_))
    ));

    std::fs::write(&path, r#"{"max_page_size": 1}"#).unwrap();
    assert!(matches!(
        SalesDeskConfig::from_json_file(&path),
        Err(ActionError::Config(_))
    ));
}
