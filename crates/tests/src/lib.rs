//! # Integration Tests
//!
//! End-to-end runs of the whole chain.
//!
//! Covers:
//! - in-process runs driven by a loaded config file
//! - every stage hosted on its own JSON-lines or gRPC server
//! - hub degradation and fail-fast behaviour across the network

#[cfg(test)]
mod e2e_tests {
    use std::collections::BTreeMap;
    use std::io::Write;

    use config_loader::ConfigLoader;
    use contracts::{stage_names, Message, PipelineBlueprint, TransportKind};
    use pipeline::{Pipeline, PipelineError};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    const PROMPT: &str = "A space adventure about robots";

    /// Servers for every stage, stopped when dropped
    struct Cluster {
        blueprint: PipelineBlueprint,
        shutdowns: Vec<oneshot::Sender<()>>,
    }

    impl Cluster {
        /// Bind every stage on an ephemeral port, leaving out `skip`
        async fn start(mode: TransportKind, skip: &[&str]) -> Self {
            let mut listeners = Vec::new();
            let mut endpoints = BTreeMap::new();
            for name in stage_names::ALL {
                let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                endpoints.insert(name.to_string(), listener.local_addr().unwrap().to_string());
                listeners.push((name, listener));
            }

            let blueprint = PipelineBlueprint {
                mode,
                rpc_timeout_ms: 5_000,
                endpoints,
                ..Default::default()
            };
            config_loader::validate(&blueprint).unwrap();

            let mut shutdowns = Vec::new();
            for (name, listener) in listeners {
                if skip.contains(&name) {
                    // closed port: connections are refused
                    drop(listener);
                    continue;
                }
                let stage = pipeline::hosted_stage(name, &blueprint).unwrap();
                let (tx, rx) = oneshot::channel::<()>();
                tokio::spawn(transport::serve_stage(mode, listener, stage, async move {
                    let _ = rx.await;
                }));
                shutdowns.push(tx);
            }

            Self {
                blueprint,
                shutdowns,
            }
        }

        fn stop(self) {
            for tx in self.shutdowns {
                let _ = tx.send(());
            }
        }
    }

    fn assert_complete(out: &Message) {
        assert_eq!(out.user_input, PROMPT);
        assert_eq!(out.metadata["theme"], "space");
        assert_eq!(out.metadata["summary"]["pipeline_complete"], true);
        assert_eq!(out.metadata["summary"]["components_received"], 6);
        assert_eq!(
            out.metadata["statistics"]["formats_available"],
            serde_json::json!(["html", "markdown", "title"])
        );

        let analysis = out.analysis.as_ref().unwrap();
        assert_eq!(analysis.word_count, out.story_word_count());
        let translations = out.translations.as_ref().unwrap();
        assert!(translations.contains_key("spanish"));
        assert!(translations.contains_key("french"));

        for name in stage_names::ALL {
            let record = out
                .timestamp(name)
                .unwrap_or_else(|| panic!("no timestamps for {name}"));
            assert!(record.duration_ms().is_some(), "{name} not completed");
        }
    }

    #[tokio::test]
    async fn test_local_run_from_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(b"mode = \"local\"\nrpc_timeout_ms = 2000\n").unwrap();

        let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();
        let pipeline = Pipeline::from_blueprint(&blueprint).unwrap();
        let out = pipeline.run(Message::new(PROMPT)).await.unwrap();

        assert_complete(&out);
    }

    #[tokio::test]
    async fn test_json_rpc_cluster() {
        let cluster = Cluster::start(TransportKind::JsonRpc, &[]).await;
        let pipeline = Pipeline::from_blueprint(&cluster.blueprint).unwrap();
        assert!(matches!(
            pipeline.binding(stage_names::AGGREGATOR).unwrap().transport(),
            TransportKind::JsonRpc
        ));

        let out = pipeline.run(Message::new(PROMPT)).await.unwrap();
        assert_complete(&out);
        cluster.stop();
    }

    #[tokio::test]
    async fn test_grpc_cluster() {
        let cluster = Cluster::start(TransportKind::Grpc, &[]).await;
        let pipeline = Pipeline::from_blueprint(&cluster.blueprint).unwrap();

        let out = pipeline.run(Message::new(PROMPT)).await.unwrap();
        assert_complete(&out);
        cluster.stop();
    }

    #[tokio::test]
    async fn test_dead_sub_stage_degrades_hub() {
        let cluster = Cluster::start(TransportKind::JsonRpc, &[stage_names::IMAGE_CONCEPT]).await;
        let pipeline = Pipeline::from_blueprint(&cluster.blueprint).unwrap();

        let out = pipeline.run(Message::new(PROMPT)).await.unwrap();

        assert!(out.image_concept.is_none());
        assert!(out.audio_script.is_some());
        assert!(out.translations.is_some());
        assert!(out.formatted_output.is_some());
        assert_eq!(out.metadata["summary"]["pipeline_complete"], false);
        assert_eq!(out.metadata["summary"]["components_received"], 5);
        assert_eq!(out.metadata["summary"]["validation"]["image_concept"], false);
        cluster.stop();
    }

    #[tokio::test]
    async fn test_dead_aggregator_fails_with_partial_message() {
        let cluster = Cluster::start(TransportKind::Grpc, &[stage_names::AGGREGATOR]).await;
        let pipeline = Pipeline::from_blueprint(&cluster.blueprint).unwrap();

        let err = pipeline.run(Message::new(PROMPT)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Transport { ref stage, .. } if stage == stage_names::AGGREGATOR));

        let partial = err.partial().unwrap();
        assert!(partial.story_text.is_some());
        assert!(partial.formatted_output.is_some());
        assert!(!partial.metadata.contains_key("summary"));
        let record = partial.timestamp(stage_names::AGGREGATOR).unwrap();
        assert!(record.started_at.is_some());
        assert!(record.completed_at.is_none());
        cluster.stop();
    }

    #[tokio::test]
    async fn test_unregistered_stage_runs_nothing() {
        let pipeline = Pipeline::from_blueprint(&PipelineBlueprint::default()).unwrap();
        let err = pipeline
            .execute(
                Message::new(PROMPT),
                &[stage_names::STORY_GENERATOR, "service_z_missing"],
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "stage not registered: `service_z_missing`");
        assert!(err.partial().is_none());
    }

    #[tokio::test]
    async fn test_output_dictionary_form() {
        let pipeline = Pipeline::from_blueprint(&PipelineBlueprint::default()).unwrap();
        let out = pipeline.run(Message::new(PROMPT)).await.unwrap();

        let dict = transport::to_dict(&out);
        assert_eq!(dict["user_input"], PROMPT);
        assert!(dict["story"]["text"].is_string());
        assert_eq!(dict["story"]["word_count"], out.story_word_count());
        assert!(dict.get("story_text").is_none());
        assert!(dict["timestamps"][stage_names::PARALLEL_HUB]["duration_ms"].is_number());

        let back = transport::from_dict(&dict);
        assert_eq!(back.story_text, out.story_text);
        assert_eq!(back.translations, out.translations);
    }
}
