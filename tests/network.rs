//! Network orchestration tests
//!
//! Runs full `Network::execute` calls against the scripted backend.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ensemble::agent::{Agent, AgentParams};
use ensemble::llm::{
    GenerateRequest, LanguageModel, ModelRef, ObjectResult, ScriptedModel, StreamResult,
    TextResult,
};
use ensemble::network::{ExecuteOptions, FixedSelector, ModelSelector, Network};
use ensemble::EnsembleError;
use serde_json::json;
use tokio::sync::Barrier;
use tokio::time::timeout;

/// Backend that answers only once `parties` requests are in flight together
///
/// Replies echo the model name; streams yield `<model>1`, `<model>2`.
struct RendezvousModel {
    barrier: Barrier,
}

impl RendezvousModel {
    fn new(parties: usize) -> Self {
        Self {
            barrier: Barrier::new(parties),
        }
    }

    fn fragments(model: &str) -> StreamResult {
        let fragments: Vec<ensemble::Result<String>> =
            vec![Ok(format!("{model}1")), Ok(format!("{model}2"))];
        StreamResult::new(Box::pin(futures::stream::iter(fragments)))
    }
}

#[async_trait]
impl LanguageModel for RendezvousModel {
    async fn generate_text(&self, request: &GenerateRequest) -> ensemble::Result<TextResult> {
        self.barrier.wait().await;
        Ok(TextResult {
            text: request.model.clone(),
            tool_calls: Vec::new(),
            usage: None,
            model: request.model.clone(),
        })
    }

    async fn stream_text(&self, request: &GenerateRequest) -> ensemble::Result<StreamResult> {
        self.barrier.wait().await;
        Ok(Self::fragments(&request.model))
    }

    async fn generate_object(&self, request: &GenerateRequest) -> ensemble::Result<ObjectResult> {
        self.barrier.wait().await;
        Ok(ObjectResult {
            object: json!({ "model": request.model }),
            usage: None,
            model: request.model.clone(),
        })
    }

    async fn stream_object(&self, request: &GenerateRequest) -> ensemble::Result<StreamResult> {
        self.barrier.wait().await;
        Ok(Self::fragments(&request.model))
    }

    fn name(&self) -> &str {
        "rendezvous"
    }
}

/// Two agents on the rendezvous backend, one text and one object
fn rendezvous_network() -> Network {
    let backend: Arc<dyn LanguageModel> = Arc::new(RendezvousModel::new(2));
    let mut network = Network::new(FixedSelector::new(["a", "b"]));
    network.register_agent(
        "a",
        Agent::text(AgentParams::new().model(ModelRef::new(backend.clone(), "a"))),
    );
    network.register_agent(
        "b",
        Agent::object(
            AgentParams::new()
                .model(ModelRef::new(backend, "b"))
                .schema(json!({"type": "object"})),
        ),
    );
    network
}

/// Collects streamed fragments for later inspection
fn recorder() -> (Arc<Mutex<Vec<String>>>, ExecuteOptions) {
    let fragments = Arc::new(Mutex::new(Vec::new()));
    let sink = fragments.clone();
    let options = ExecuteOptions::new().stream_to(move |fragment| {
        sink.lock().unwrap().push(fragment.to_string());
    });
    (fragments, options)
}

#[tokio::test]
async fn test_single_agent_mode_dispatches_first_name_only() {
    let backend = Arc::new(ScriptedModel::new().route_text("m", "output"));
    let mut network = Network::new(FixedSelector::new(["a", "b"]))
        .with_default_model(ModelRef::new(backend.clone(), "m"));
    network.register_agent("a", Agent::text(AgentParams::new()));
    network.register_agent("b", Agent::text(AgentParams::new()));

    let results = network.execute("hello", ExecuteOptions::new()).await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results.contains_key("a"));
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_multiple_agents_mode_runs_all() {
    let backend = Arc::new(
        ScriptedModel::new()
            .route_text("model-a", "from a")
            .route_text("model-b", json!({"ok": true}).to_string()),
    );
    let mut network = Network::new(FixedSelector::new(["a", "b"]));
    network.register_agent(
        "a",
        Agent::text(AgentParams::new().model(ModelRef::new(backend.clone(), "model-a"))),
    );
    network.register_agent(
        "b",
        Agent::object(
            AgentParams::new()
                .model(ModelRef::new(backend.clone(), "model-b"))
                .schema(json!({"type": "object"})),
        ),
    );

    let results = network
        .execute("hello", ExecuteOptions::new().multiple_agents(true))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results["a"].text(), Some("from a"));
    assert_eq!(results["b"].object(), Some(&json!({"ok": true})));
}

#[tokio::test]
async fn test_empty_selection_reply_is_no_applicable_agents() {
    let backend = Arc::new(ScriptedModel::new().route_text("router", ""));
    let mut network = Network::new(ModelSelector::new(ModelRef::new(backend.clone(), "router")));
    network.register_agent("a", Agent::text(AgentParams::new()));

    let err = network
        .execute("hello", ExecuteOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, EnsembleError::NoApplicableAgents));
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_model_selection_end_to_end() {
    let backend = Arc::new(
        ScriptedModel::new()
            .route_text("router", " weather , news")
            .route_text("worker", "done"),
    );
    let mut network = Network::new(ModelSelector::new(ModelRef::new(backend.clone(), "router")));
    for name in ["weather", "news", "sports"] {
        network.register_agent(
            name,
            Agent::text(AgentParams::new().model(ModelRef::new(backend.clone(), "worker"))),
        );
    }

    let results = network
        .execute("Rain and headlines?", ExecuteOptions::new().multiple_agents(true))
        .await
        .unwrap();

    let mut names: Vec<_> = results.keys().cloned().collect();
    names.sort();
    assert_eq!(names, vec!["news", "weather"]);

    let requests = backend.requests();
    let selection = &requests[0];
    assert_eq!(selection.model, "router");
    assert!(selection.prompt.contains("news, sports, weather"));
    assert!(selection.prompt.contains("Rain and headlines?"));
    assert_eq!(selection.max_tokens, Some(ModelSelector::DEFAULT_MAX_TOKENS));
}

#[tokio::test]
async fn test_unregistered_name_aborts_whole_call() {
    let backend = Arc::new(ScriptedModel::new().route_text("m", "fine"));
    let mut network = Network::new(FixedSelector::new(["a", "ghost"]))
        .with_default_model(ModelRef::new(backend, "m"));
    network.register_agent("a", Agent::text(AgentParams::new()));

    let err = network
        .execute("hello", ExecuteOptions::new().multiple_agents(true))
        .await
        .unwrap_err();

    match err {
        EnsembleError::AgentNotRegistered(name) => assert_eq!(name, "ghost"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unregistered_first_name_in_single_mode() {
    let mut network = Network::new(FixedSelector::new(["ghost", "a"]));
    network.register_agent("a", Agent::text(AgentParams::new()));

    let err = network
        .execute("hello", ExecuteOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EnsembleError::AgentNotRegistered(_)));
}

#[tokio::test]
async fn test_one_failing_agent_fails_the_batch() {
    let backend = Arc::new(
        ScriptedModel::new()
            .route_text("good", "ok")
            .route_error("bad", "backend down"),
    );
    let mut network = Network::new(FixedSelector::new(["good", "bad"]));
    network.register_agent(
        "good",
        Agent::text(AgentParams::new().model(ModelRef::new(backend.clone(), "good"))),
    );
    network.register_agent(
        "bad",
        Agent::text(AgentParams::new().model(ModelRef::new(backend.clone(), "bad"))),
    );

    let err = network
        .execute("hello", ExecuteOptions::new().multiple_agents(true))
        .await
        .unwrap_err();
    assert!(matches!(err, EnsembleError::Provider(_)));
}

#[tokio::test]
async fn test_agent_model_overrides_network_default() {
    let backend = Arc::new(
        ScriptedModel::new()
            .route_text("m1", "own model")
            .route_text("m2", "default model"),
    );
    let mut network = Network::new(FixedSelector::new(["a"]))
        .with_default_model(ModelRef::new(backend.clone(), "m2"));
    network.register_agent(
        "a",
        Agent::text(AgentParams::new().model(ModelRef::new(backend.clone(), "m1"))),
    );

    let results = network.execute("hello", ExecuteOptions::new()).await.unwrap();

    assert_eq!(results["a"].text(), Some("own model"));
    assert_eq!(backend.requests()[0].model, "m1");
}

#[tokio::test]
async fn test_network_prompt_replaces_agent_prompt() {
    let backend = Arc::new(ScriptedModel::new().route_text("m", "ok"));
    let agent = Agent::text(AgentParams::new().prompt("stale prompt").system("keep me"));
    let mut network = Network::new(FixedSelector::new(["a"]))
        .with_default_model(ModelRef::new(backend.clone(), "m"));
    network.register_agent("a", agent.clone());

    network.execute("fresh prompt", ExecuteOptions::new()).await.unwrap();

    let requests = backend.requests();
    let request = &requests[0];
    assert_eq!(request.prompt, "fresh prompt");
    assert_eq!(request.system.as_deref(), Some("keep me"));

    // The caller's handle sees the merged parameters
    let params = agent.parameters();
    assert_eq!(params.prompt.as_deref(), Some("fresh prompt"));
    assert_eq!(params.model.unwrap().name(), "m");
}

#[tokio::test]
async fn test_no_model_anywhere_is_missing_parameter() {
    let backend = Arc::new(ScriptedModel::new());
    let mut network = Network::new(FixedSelector::new(["a"]));
    network.register_agent("a", Agent::text(AgentParams::new()));

    let err = network
        .execute("hello", ExecuteOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, EnsembleError::MissingParameter("model")));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_object_agent_without_schema_fails_through_network() {
    let backend = Arc::new(ScriptedModel::new().route_text("m", "{}"));
    let mut network = Network::new(FixedSelector::new(["extract"]))
        .with_default_model(ModelRef::new(backend.clone(), "m"));
    network.register_agent("extract", Agent::object(AgentParams::new()));

    let err = network
        .execute("hello", ExecuteOptions::new())
        .await
        .unwrap_err();

    assert!(matches!(err, EnsembleError::MissingParameter("schema")));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_streaming_delivers_fragments_and_skips_result_map() {
    let backend = Arc::new(ScriptedModel::new().route_fragments("m", vec!["The ", "quick ", "fox"]));
    let mut network = Network::new(FixedSelector::new(["a"]))
        .with_default_model(ModelRef::new(backend, "m"));
    network.register_agent("a", Agent::text(AgentParams::new()));

    let full = network.execute("story", ExecuteOptions::new()).await.unwrap();
    let full_text = full["a"].text().unwrap().to_string();

    let (fragments, options) = recorder();
    let streamed = network.execute("story", options).await.unwrap();

    assert!(streamed.is_empty());
    let fragments = fragments.lock().unwrap();
    assert_eq!(*fragments, vec!["The ", "quick ", "fox"]);
    assert_eq!(fragments.concat(), full_text);
}

#[tokio::test]
async fn test_streaming_without_callback_drains_silently() {
    let backend = Arc::new(ScriptedModel::new().route_fragments("m", vec!["a", "b"]));
    let mut network = Network::new(FixedSelector::new(["a"]))
        .with_default_model(ModelRef::new(backend, "m"));
    network.register_agent("a", Agent::text(AgentParams::new()));

    let options = ExecuteOptions {
        stream: true,
        ..Default::default()
    };
    let results = network.execute("story", options).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_duplicate_names_run_twice_but_map_once() {
    let backend = Arc::new(ScriptedModel::new().route_text("m", "ok"));
    let mut network = Network::new(FixedSelector::from_reply("a, a"))
        .with_default_model(ModelRef::new(backend.clone(), "m"));
    network.register_agent("a", Agent::text(AgentParams::new()));

    let results = network
        .execute("hello", ExecuteOptions::new().multiple_agents(true))
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(backend.requests().len(), 2);
}

#[tokio::test]
async fn test_multiple_agents_are_in_flight_together() {
    let network = rendezvous_network();

    let results = timeout(
        Duration::from_secs(5),
        network.execute("hello", ExecuteOptions::new().multiple_agents(true)),
    )
    .await
    .expect("agents were dispatched one after another")
    .unwrap();

    assert_eq!(results["a"].text(), Some("a"));
    assert_eq!(results["b"].object(), Some(&json!({"model": "b"})));
}

#[tokio::test]
async fn test_multiple_agents_stream_into_one_callback() {
    let network = rendezvous_network();
    let (fragments, options) = recorder();

    let results = timeout(
        Duration::from_secs(5),
        network.execute("hello", options.multiple_agents(true)),
    )
    .await
    .expect("agents were dispatched one after another")
    .unwrap();
    assert!(results.is_empty());

    let fragments = fragments.lock().unwrap().clone();
    assert_eq!(fragments.len(), 4);

    // Interleaving across agents is free; order within one agent is not
    for agent in ["a", "b"] {
        let own: Vec<&String> = fragments.iter().filter(|f| f.starts_with(agent)).collect();
        assert_eq!(own, vec![&format!("{agent}1"), &format!("{agent}2")]);
    }
}
