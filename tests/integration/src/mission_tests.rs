//! Behavioural tests for git-backed sources
//!
//! Each module drives a real git remote through a `Catalog` and checks what
//! operators would observe in the registry and in the source status.

use std::fs;

use catalog_core::{Catalog, SourceState};
use catalog_meta::load_config;
use catalog_test_utils::git::{commit_files, create_branch, init_repo};
use catalog_test_utils::manifest;
use tempfile::TempDir;

/// A remote repository plus a config directory holding `catalog.yaml`.
struct Remote {
    dir: TempDir,
    repo: git2::Repository,
    config_dir: TempDir,
}

impl Remote {
    fn new(files: &[(&str, String)]) -> Self {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path());
        let files: Vec<(&str, &str)> = files.iter().map(|(p, c)| (*p, c.as_str())).collect();
        commit_files(&repo, &files, "Initial");
        Self {
            dir,
            repo,
            config_dir: TempDir::new().unwrap(),
        }
    }

    fn url(&self) -> String {
        self.dir.path().to_string_lossy().into_owned()
    }

    /// Catalog with one git source `remote`; `extra` is appended to the
    /// source entry verbatim.
    fn catalog(&self, extra: &str) -> Catalog {
        let yaml = format!(
            "engine:\n  dataDir: data\nsources:\n  - type: git\n    id: remote\n    url: \"{}\"\n    interval: 1m\n{extra}",
            self.url()
        );
        let path = self.config_dir.path().join("catalog.yaml");
        fs::write(&path, yaml).unwrap();
        Catalog::open(load_config(&path).unwrap()).unwrap()
    }

    fn commit(&self, files: &[(&str, String)], message: &str) {
        let files: Vec<(&str, &str)> = files.iter().map(|(p, c)| (*p, c.as_str())).collect();
        commit_files(&self.repo, &files, message);
    }
}

mod m1_idempotence {
    use super::*;

    #[tokio::test]
    async fn rerun_creates_nothing_new() {
        let remote = Remote::new(&[
            ("a/manifest.yaml", manifest("a").build()),
            ("b/manifest.yaml", manifest("b").build()),
        ]);
        let catalog = remote.catalog("");

        let first = catalog.run_source("remote").await.unwrap();
        let second = catalog.run_source("remote").await.unwrap();

        assert_eq!(first.created, 2);
        assert_eq!((second.created, second.updated, second.unchanged), (0, 0, 2));
        assert_eq!(catalog.components().await.unwrap().len(), 2);
    }
}

mod m2_keying {
    use super::*;

    #[tokio::test]
    async fn description_change_updates_component_keyed_by_name() {
        let remote = Remote::new(&[(
            "svc/manifest.yaml",
            manifest("checkout").description("v1").build(),
        )]);
        let catalog = remote.catalog("");
        catalog.run_source("remote").await.unwrap();

        remote.commit(
            &[(
                "svc/manifest.yaml",
                manifest("checkout").description("v2").build(),
            )],
            "Describe",
        );
        let report = catalog.run_source("remote").await.unwrap();

        assert_eq!(report.updated, 1);
        let components = catalog.components().await.unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].key, "checkout");
        assert_eq!(components[0].description.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn renaming_with_stable_id_keeps_one_component() {
        let remote = Remote::new(&[(
            "svc/manifest.yaml",
            manifest("Old Name").id("svc-1").build(),
        )]);
        let catalog = remote.catalog("");
        catalog.run_source("remote").await.unwrap();

        remote.commit(
            &[("svc/manifest.yaml", manifest("New Name").id("svc-1").build())],
            "Rename",
        );
        catalog.run_source("remote").await.unwrap();

        let component = catalog.component("svc-1").await.unwrap().unwrap();
        assert_eq!(component.name, "New Name");
        assert_eq!(catalog.components().await.unwrap().len(), 1);
    }
}

mod m3_partial_failure {
    use super::*;

    #[tokio::test]
    async fn malformed_manifest_is_reported_not_fatal() {
        let remote = Remote::new(&[
            ("good/manifest.yaml", manifest("good").build()),
            ("bad/manifest.yaml", "version: v1\nowners: [".to_string()),
        ]);
        let catalog = remote.catalog("");

        catalog.run_source("remote").await.unwrap();

        let status = catalog.status("remote").unwrap();
        assert_eq!(status.status, SourceState::Completed);
        assert_eq!(status.components_count, 1);
        assert!(
            status
                .last_error
                .unwrap()
                .starts_with("1 manifest(s) failed to parse: bad/manifest.yaml")
        );

        remote.commit(
            &[("bad/manifest.yaml", manifest("fixed").build())],
            "Fix",
        );
        catalog.run_source("remote").await.unwrap();

        let status = catalog.status("remote").unwrap();
        assert_eq!(status.last_error, None);
        assert_eq!(status.components_count, 2);
    }
}

mod m4_base_path {
    use super::*;

    #[tokio::test]
    async fn only_the_base_path_subtree_is_reconciled() {
        let remote = Remote::new(&[
            ("services/api/manifest.yaml", manifest("api").build()),
            ("servicesx/manifest.yaml", manifest("lookalike").build()),
            ("libs/db/manifest.yaml", manifest("db").build()),
        ]);
        let catalog = remote.catalog("    basePath: services\n");

        let report = catalog.run_source("remote").await.unwrap();

        assert_eq!(report.components_count, 1);
        let keys: Vec<String> = catalog
            .components()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec!["api"]);
    }
}

mod m5_unreachable {
    use super::*;

    #[tokio::test]
    async fn vanished_remote_keeps_last_good_status() {
        let remote = Remote::new(&[("a/manifest.yaml", manifest("a").build())]);
        let catalog = remote.catalog("");
        catalog.run_source("remote").await.unwrap();
        let good = catalog.status("remote").unwrap();

        let Remote { dir, repo, config_dir } = remote;
        drop(repo);
        dir.close().unwrap();
        let report = catalog.run_source("remote").await.unwrap();

        assert_eq!(report.status, SourceState::Failed);
        let status = catalog.status("remote").unwrap();
        assert_eq!(status.status, SourceState::Failed);
        assert!(status.last_error.is_some());
        assert_eq!(status.components_count, good.components_count);
        assert_eq!(status.last_sync, good.last_sync);
        assert!(catalog.component("a").await.unwrap().is_some());
        drop(config_dir);
    }
}

mod m6_branches {
    use super::*;

    #[tokio::test]
    async fn explicit_branch_is_followed() {
        let remote = Remote::new(&[("a/manifest.yaml", manifest("a").build())]);
        create_branch(&remote.repo, "release");
        remote.commit(
            &[("b/manifest.yaml", manifest("only-on-release").build())],
            "Release only",
        );

        let catalog = remote.catalog("    branch: release\n");
        let report = catalog.run_source("remote").await.unwrap();

        assert_eq!(report.components_count, 2);
        assert!(catalog.component("only-on-release").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn default_branch_ignores_other_branches() {
        let remote = Remote::new(&[("a/manifest.yaml", manifest("a").build())]);
        create_branch(&remote.repo, "feature");
        remote.commit(
            &[("b/manifest.yaml", manifest("feature-only").build())],
            "Feature",
        );
        remote.repo.set_head("refs/heads/main").unwrap();

        let catalog = remote.catalog("");
        let report = catalog.run_source("remote").await.unwrap();

        assert_eq!(report.components_count, 1);
        assert!(catalog.component("feature-only").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_branch_fails_the_run() {
        let remote = Remote::new(&[("a/manifest.yaml", manifest("a").build())]);
        let catalog = remote.catalog("    branch: does-not-exist\n");

        let report = catalog.run_source("remote").await.unwrap();

        assert_eq!(report.status, SourceState::Failed);
        assert!(catalog.status("remote").unwrap().last_error.is_some());
        assert!(catalog.components().await.unwrap().is_empty());
    }
}
