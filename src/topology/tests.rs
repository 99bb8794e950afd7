//! Topology Module Tests
//!
//! ## Test Scopes
//! - **Role table**: Rank assignment, group size validation.
//! - **Bootstrap**: Output sink selection, local groups, and a two-process
//!   group simulated with two node tasks talking over loopback TCP.

#[cfg(test)]
mod tests {
    use crate::config::{ClusterConfig, OutputMode};
    use crate::dispatcher::InputSource;
    use crate::error::ClusterError;
    use crate::topology::{
        DISPATCHER_RANK, NodeOutcome, Role, RoleTable, check_output_path, open_sink, run_local,
        run_node,
    };
    use crate::transform::registry::{COMEDY, FANTASY, HORROR, SCIENCE_FICTION};
    use crate::transform::{TransformRegistry, rules};
    use crate::unit::Tag;
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;

    // ============================================================
    // TEST 1: Role table
    // ============================================================

    #[test]
    fn test_standard_group_layout() {
        let table = RoleTable::from_registry(&TransformRegistry::standard());

        assert_eq!(table.group_size(), 5);
        assert_eq!(table.role(DISPATCHER_RANK).unwrap(), &Role::Dispatcher);
        assert_eq!(table.role(DISPATCHER_RANK).unwrap().to_string(), "Master");
        assert_eq!(table.role(4).unwrap().to_string(), "SciFi");

        let workers: Vec<(usize, &str)> = table.workers().map(|(r, t)| (r, t.as_str())).collect();
        assert_eq!(
            workers,
            vec![(1, HORROR), (2, COMEDY), (3, FANTASY), (4, SCIENCE_FICTION)]
        );
        assert_eq!(table.rank_of(&Tag::new(FANTASY)), Some(3));
        assert_eq!(table.rank_of(&Tag::new("thriller")), None);
    }

    #[test]
    fn test_group_size_must_match_registry() {
        let table = RoleTable::from_registry(&TransformRegistry::standard());

        assert!(table.validate_group_size(5).is_ok());
        assert!(matches!(table.validate_group_size(4), Err(ClusterError::Startup(_))));
        assert!(matches!(table.validate_group_size(6), Err(ClusterError::Startup(_))));
        assert!(matches!(table.role(5), Err(ClusterError::Startup(_))));
    }

    #[test]
    fn test_custom_registry_changes_group_size() {
        let mut registry = TransformRegistry::new();
        registry.register("poetry", "Poet", rules::title_case);

        let table = RoleTable::from_registry(&registry);

        assert_eq!(table.group_size(), 2);
        assert_eq!(
            table.role(1).unwrap(),
            &Role::Worker {
                tag: Tag::new("poetry"),
                name: "Poet".to_string()
            }
        );
    }

    // ============================================================
    // TEST 2: Bootstrap
    // ============================================================

    #[tokio::test]
    async fn test_open_sink_file_mode_writes_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.txt");
        let config = ClusterConfig {
            output: OutputMode::File,
            ..ClusterConfig::default()
        };

        let mut sink = open_sink(&config, &input).await.unwrap();
        sink.write_all(b"fantasy\n").await.unwrap();
        sink.flush().await.unwrap();
        drop(sink);

        let written = std::fs::read_to_string(dir.path().join("corpus.out")).unwrap();
        assert_eq!(written, "fantasy\n");
    }

    #[tokio::test]
    async fn test_open_sink_refuses_to_overwrite_input() {
        // ARRANGE: the derived output name of "corpus.out" is the input itself.
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.out");
        let corpus = "horror\nDark night\n\ncomedy\nhello there\n";
        std::fs::write(&input, corpus).unwrap();
        let config = ClusterConfig {
            output: OutputMode::File,
            ..ClusterConfig::default()
        };

        // ACT
        let result = open_sink(&config, &input).await;

        // ASSERT
        assert!(matches!(result, Err(ClusterError::Startup(_))));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), corpus);
    }

    #[tokio::test]
    async fn test_open_sink_refuses_extension_equal_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.txt");
        std::fs::write(&input, "fantasy\nelves\n").unwrap();
        let config = ClusterConfig {
            output: OutputMode::File,
            output_extension: "txt".to_string(),
            ..ClusterConfig::default()
        };

        let result = open_sink(&config, &input).await;

        assert!(matches!(result, Err(ClusterError::Startup(_))));
        assert_eq!(std::fs::read_to_string(&input).unwrap(), "fantasy\nelves\n");
    }

    #[tokio::test]
    async fn test_dispatcher_node_keeps_input_named_like_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.out");
        std::fs::write(&input, "horror\nDark night\n").unwrap();
        let config = ClusterConfig {
            output: OutputMode::File,
            ..ClusterConfig::default()
        };

        let mut registry = TransformRegistry::new();
        registry.register(HORROR, "Horror", rules::double_consonants);

        let result = run_node(DISPATCHER_RANK, 2, Arc::new(registry), &config, Some(input.clone())).await;

        match result {
            Err(ClusterError::Startup(message)) => assert!(message.contains("overwrite")),
            other => panic!("expected startup failure, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&input).unwrap(), "horror\nDark night\n");
    }

    #[tokio::test]
    async fn test_stdout_output_never_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.out");

        assert!(check_output_path(&ClusterConfig::default(), &input).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_local_full_registry() {
        let text = "fantasy\nthe misty mountain\n\nscience-fiction\na b c d e f ship\n";
        let config = ClusterConfig {
            chunk_lines: 1,
            pool_size: Some(2),
            ..ClusterConfig::default()
        };

        let (sink, report) = run_local(
            Arc::new(TransformRegistry::standard()),
            &config,
            InputSource::text(text),
            Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(
            String::from_utf8(sink).unwrap(),
            "fantasy\nThe Misty Mountain\n\nscience-fiction\na b c d e f pihs\n"
        );
        assert_eq!(report.units, 2);
    }

    #[tokio::test]
    async fn test_dispatcher_node_requires_input() {
        let result = run_node(
            DISPATCHER_RANK,
            5,
            Arc::new(TransformRegistry::standard()),
            &ClusterConfig::default(),
            None,
        )
        .await;

        match result {
            Err(ClusterError::Startup(message)) => {
                assert!(message.contains("Master: Input file not provided"));
            }
            other => panic!("expected startup failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_node_rejects_wrong_group_size() {
        let result = run_node(
            1,
            3,
            Arc::new(TransformRegistry::standard()),
            &ClusterConfig::default(),
            None,
        )
        .await;

        assert!(matches!(result, Err(ClusterError::Startup(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_two_node_group_over_tcp() {
        // ARRANGE: one genre, so the group is a dispatcher plus one worker.
        let mut registry = TransformRegistry::new();
        registry.register(HORROR, "Horror", rules::double_consonants);
        let registry = Arc::new(registry);

        let free_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = ClusterConfig {
            base_port: free_port - 1,
            connect_backoff_ms: 20,
            output: OutputMode::File,
            ..ClusterConfig::default()
        };

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("corpus.txt");
        std::fs::write(&input, "horror\nDark night\n\ncomedy\nignored\n\nhorror\ncrypt\n").unwrap();

        // ACT
        let worker = {
            let registry = registry.clone();
            let config = config.clone();
            tokio::spawn(async move { run_node(1, 2, registry, &config, None).await })
        };
        let dispatched = run_node(DISPATCHER_RANK, 2, registry, &config, Some(input.clone()))
            .await
            .unwrap();
        let served = worker.await.unwrap().unwrap();

        // ASSERT
        match dispatched {
            NodeOutcome::Dispatched(report) => assert_eq!(report.units, 2),
            other => panic!("unexpected outcome {:?}", other),
        }
        match served {
            NodeOutcome::Served { tag, stats } => {
                assert_eq!(tag, Tag::new(HORROR));
                assert_eq!(stats.units, 2);
                assert_eq!(stats.lines, 2);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let written = std::fs::read_to_string(dir.path().join("corpus.out")).unwrap();
        assert_eq!(written, "horror\nDdarrkk nnigghhtt\n\nhorror\nccrryypptt\n");
    }
}
