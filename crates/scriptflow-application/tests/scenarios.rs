//! End-to-end session scenarios against on-disk documents and store.

use scriptflow_application::{AutoSaveBridge, GraphLoader, GraphOrigin, ScriptViewer};
use scriptflow_core::screen::{START_SCREEN_ID, ScreenDefinition, ScreenDocumentStore};
use scriptflow_core::session::{NavigationOutcome, PersonType, ServiceType};
use scriptflow_infrastructure::{FileScriptSource, InMemoryDocumentStore, JsonDirDocumentStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    viewer: ScriptViewer,
}

fn write_documents(dir: &TempDir) -> FileScriptSource {
    let physical = json!({
        "marcas": {
            "P": {
                "abordagem": {"id": "p1", "title": "Abordagem P", "body": "Bom dia", "buttons": [
                    {"label": "Seguir", "next": "p2"}
                ]},
                "oferta": {"id": "p2", "title": "Oferta P", "body": "Plano", "buttons": [
                    {"label": "Confirmar", "next": "p3"},
                    {"label": "Não confirma", "next": "nao_confirma"}
                ]},
                "fecho": {"id": "p3", "title": "Fechamento", "body": "Obrigado", "buttons": [
                    {"label": "Finalizar", "next": "fim"}
                ]}
            }
        }
    });
    let legal_entity = json!({
        "marcas": {
            "X": {"abordagem": {"id": "x1", "title": "X", "body": "", "buttons": []}},
            "Y": {"abordagem": {"id": "y1", "title": "Y", "body": "", "buttons": []}}
        }
    });
    let pf = dir.path().join("roteiros.json");
    let pj = dir.path().join("roteiros1.json");
    std::fs::write(&pf, physical.to_string()).unwrap();
    std::fs::write(&pj, legal_entity.to_string()).unwrap();
    FileScriptSource::new(pf, pj)
}

async fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let source = write_documents(&dir);
    let viewer = ScriptViewer::new(GraphLoader::new(Arc::new(source), Duration::from_secs(5)), None);
    viewer.bootstrap().await.unwrap();
    Fixture { _dir: dir, viewer }
}

async fn history(viewer: &ScriptViewer) -> Vec<String> {
    viewer.with_context(|ctx| ctx.history().as_slice().to_vec()).await
}

#[tokio::test]
async fn legal_entity_products_enter_at_their_approach_screen() {
    let Fixture { _dir, viewer } = fixture().await;

    viewer.select_service_type(ServiceType::Receptive).await;
    viewer.select_person_type(PersonType::LegalEntity).await.unwrap();

    let entries = viewer
        .with_context(|ctx| {
            ctx.graph()
                .entries()
                .iter()
                .map(|(p, id)| (p.to_string(), id.to_string()))
                .collect::<Vec<_>>()
        })
        .await;
    assert_eq!(
        entries,
        vec![("X".to_string(), "x1".to_string()), ("Y".to_string(), "y1".to_string())]
    );

    viewer.select_product("X").await.unwrap();
    let outcome = viewer.start().await.unwrap();

    assert!(outcome.is_moved());
    assert_eq!(history(&viewer).await.last().map(String::as_str), Some("x1"));
}

#[tokio::test]
async fn start_without_selections_is_blocked() {
    let Fixture { _dir, viewer } = fixture().await;
    let err = viewer.start().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(history(&viewer).await, vec![START_SCREEN_ID.to_string()]);
}

#[tokio::test]
async fn back_pops_twice_then_revisits() {
    let Fixture { _dir, viewer } = fixture().await;
    viewer.goto("p1").await;
    viewer.goto("p2").await;
    viewer.goto("p3").await;

    viewer.back().await;

    assert_eq!(
        history(&viewer).await,
        vec![START_SCREEN_ID.to_string(), "p1".to_string(), "p2".to_string()]
    );
}

#[tokio::test]
async fn deleted_active_screen_cannot_be_revisited() {
    let Fixture { _dir, viewer } = fixture().await;
    viewer.goto("p2").await;

    viewer.delete_screen("p2").await.unwrap();
    let outcome = viewer.goto("p2").await;

    assert_eq!(outcome, NavigationOutcome::Ignored);
    assert_eq!(history(&viewer).await.last().map(String::as_str), Some("p2"));
    assert!(viewer.goto("p1").await.is_moved());
}

#[tokio::test]
async fn progress_counts_product_steps() {
    let Fixture { _dir, viewer } = fixture().await;
    viewer.select_service_type(ServiceType::Active).await;
    viewer.select_person_type(PersonType::Physical).await.unwrap();
    viewer.select_product("P").await.unwrap();
    viewer.start().await.unwrap();
    viewer.press_button(0).await.unwrap();

    let progress = viewer.progress().await;
    assert_eq!((progress.traversed, progress.total, progress.percent), (2, 3, 67));
    assert_eq!(progress.label(), "Passo 2 de 3");

    viewer.goto("fim").await;
    assert_eq!(viewer.progress().await.percent, 0);
}

#[tokio::test]
async fn rename_leaves_no_document_at_old_id() {
    let dir = TempDir::new().unwrap();
    let source = write_documents(&dir);
    let store: Arc<dyn ScreenDocumentStore> =
        Arc::new(JsonDirDocumentStore::new(&dir.path().join("store"), "roteiros"));
    store
        .upsert(&ScreenDefinition::new("p2", "Oferta P", "Plano").with_product("P"))
        .await
        .unwrap();
    let bridge = AutoSaveBridge::new(store.clone(), Duration::from_millis(800), 64);
    let viewer = ScriptViewer::new(
        GraphLoader::new(Arc::new(source), Duration::from_secs(5)).with_store(store.clone()),
        Some(bridge),
    );
    assert_eq!(viewer.bootstrap().await.unwrap(), GraphOrigin::Store);

    viewer.begin_edit("p2").await.unwrap();
    viewer.update_buffer(|b| b.title = "Oferta revisada".to_string()).await;
    viewer.apply_edit().await.unwrap();

    // The write for p2 is still waiting in its quiet window.
    viewer.update_buffer(|b| b.id = "oferta_p".to_string()).await;
    let applied = viewer.apply_edit().await.unwrap();
    assert_eq!(applied.previous_id, "p2");
    viewer
        .with_context(|ctx| {
            assert!(!ctx.graph().contains("p2"));
            assert!(ctx.graph().contains("oferta_p"));
        })
        .await;

    assert_eq!(viewer.flush().await, 1);
    let saved = store.list_all().await.unwrap();
    let ids: Vec<&str> = saved.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["oferta_p"]);
    assert_eq!(saved[0].title, "Oferta revisada");
    assert_eq!(viewer.autosave_stats().unwrap().failures, 0);
}

#[tokio::test]
async fn two_quick_edits_write_once_with_final_values() {
    let dir = TempDir::new().unwrap();
    let source = write_documents(&dir);
    let store = Arc::new(InMemoryDocumentStore::new());
    let bridge = AutoSaveBridge::new(store.clone(), Duration::from_millis(800), 64);
    let viewer = ScriptViewer::new(
        GraphLoader::new(Arc::new(source), Duration::from_secs(5)),
        Some(bridge),
    );
    viewer.bootstrap().await.unwrap();
    tokio::time::pause();

    viewer.begin_edit("p1").await.unwrap();
    viewer.update_buffer(|b| b.title = "Primeira".to_string()).await;
    viewer.apply_edit().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    viewer.update_buffer(|b| b.title = "Segunda".to_string()).await;
    viewer.apply_edit().await.unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;

    let stats = viewer.autosave_stats().unwrap();
    assert_eq!(stats.upserts, 1);
    assert_eq!(store.get("p1").unwrap()["title"], "Segunda");
}
