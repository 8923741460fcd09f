//! End-to-end integration test for the vertical slice
//!
//! This test exercises the complete flow: config file -> catalog -> git and
//! filesystem sources -> persisted registry and status.

use std::fs;

use catalog_core::{Catalog, FileRegistry, SourceState, load_snapshot};
use catalog_fs::NormalizedPath;
use catalog_git::checkout_dir_name;
use catalog_meta::{CatalogConfig, load_config};
use catalog_test_utils::git::{commit_files, init_repo};
use catalog_test_utils::{SourceTree, manifest};
use tempfile::TempDir;

struct Setup {
    config_dir: TempDir,
    remote_dir: TempDir,
    repo: git2::Repository,
    local: SourceTree,
}

impl Setup {
    fn new() -> Self {
        let remote_dir = TempDir::new().unwrap();
        let repo = init_repo(remote_dir.path());
        let api = manifest("api").id("svc-api").team("platform").build();
        let billing = manifest("billing").maintainers(&["ana", "raj"]).build();
        commit_files(
            &repo,
            &[
                ("services/api/manifest.yaml", api.as_str()),
                ("services/billing/manifest.yml", billing.as_str()),
                ("README.md", "# services"),
            ],
            "Initial",
        );

        let local = SourceTree::new();
        local.write_manifest("docs", &manifest("docs-site"));

        let config_dir = TempDir::new().unwrap();
        let yaml = format!(
            r#"engine:
  dataDir: state
sources:
  - type: git
    id: services
    url: "{remote}"
    interval: 5m
  - type: filesystem
    id: docs
    path: "{local}"
    interval: 30s
"#,
            remote = remote_dir.path().display(),
            local = local.root().display(),
        );
        fs::write(config_dir.path().join("catalog.yaml"), yaml).unwrap();

        Self {
            config_dir,
            remote_dir,
            repo,
            local,
        }
    }

    fn config(&self) -> CatalogConfig {
        load_config(&self.config_dir.path().join("catalog.yaml")).unwrap()
    }
}

#[tokio::test]
async fn test_config_to_registry_round_trip() {
    let setup = Setup::new();
    let config = setup.config();
    assert_eq!(
        config.engine.data_dir,
        NormalizedPath::new(setup.config_dir.path().join("state"))
    );

    let catalog = Catalog::open(config.clone()).unwrap();
    let reports = catalog.run_once().await;

    let ids: Vec<&str> = reports.iter().map(|r| r.source_id.as_str()).collect();
    assert_eq!(ids, vec!["docs", "services"]);
    assert!(reports.iter().all(|r| r.is_success()));

    let keys: Vec<String> = catalog
        .components()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.key)
        .collect();
    assert_eq!(keys, vec!["billing", "docs-site", "svc-api"]);

    let billing = catalog.component("billing").await.unwrap().unwrap();
    assert_eq!(billing.maintainers, vec!["ana", "raj"]);
    assert_eq!(billing.last_source, "services");

    // Checkout lives under the data directory
    let checkout = config
        .engine
        .checkouts_dir()
        .join(&checkout_dir_name("services"));
    assert!(checkout.join("services/api/manifest.yaml").is_file());

    // Another process sees the same registry and status
    let on_disk = FileRegistry::read(&config.engine.registry_path()).unwrap();
    assert_eq!(on_disk.len(), 3);
    let statuses = load_snapshot(&config.engine.status_path()).unwrap();
    assert!(statuses.iter().all(|s| s.status == SourceState::Completed));
    let services = statuses.iter().find(|s| s.source_id == "services").unwrap();
    assert_eq!(services.components_count, 2);
    assert!(services.revision.is_some());
}

#[tokio::test]
async fn test_new_commit_and_local_edit_are_picked_up() {
    let setup = Setup::new();
    let catalog = Catalog::open(setup.config()).unwrap();
    catalog.run_once().await;
    let first_revision = catalog.status("services").unwrap().revision;

    let db = manifest("db").description("primary database").build();
    let tip = commit_files(&setup.repo, &[("libs/db/manifest.yaml", db.as_str())], "Add db");
    setup
        .local
        .write_manifest("docs", &manifest("docs-site").team("writers"));

    let reports = catalog.run_once().await;
    let services = reports.iter().find(|r| r.source_id == "services").unwrap();
    assert_eq!((services.created, services.unchanged), (1, 2));
    assert_eq!(services.revision.as_deref(), Some(tip.to_string().as_str()));
    assert_ne!(catalog.status("services").unwrap().revision, first_revision);

    let docs = reports.iter().find(|r| r.source_id == "docs").unwrap();
    assert_eq!(docs.updated, 1);
    assert_eq!(
        catalog
            .component("docs-site")
            .await
            .unwrap()
            .unwrap()
            .team
            .as_deref(),
        Some("writers")
    );
}

#[tokio::test]
async fn test_reopened_catalog_keeps_history() {
    let setup = Setup::new();
    {
        let catalog = Catalog::open(setup.config()).unwrap();
        catalog.run_once().await;
    }

    let config = setup.config();
    drop(setup.remote_dir);
    let catalog = Catalog::open(config).unwrap();
    let before = catalog.status("services").unwrap();
    assert_eq!(before.status, SourceState::Idle);
    assert_eq!(before.components_count, 2);

    let report = catalog.run_source("services").await.unwrap();
    assert_eq!(report.status, SourceState::Failed);

    let after = catalog.status("services").unwrap();
    assert_eq!(after.status, SourceState::Failed);
    assert_eq!(after.components_count, 2);
    assert_eq!(after.last_sync, before.last_sync);
    assert_eq!(catalog.components().await.unwrap().len(), 3);
}
