//! End-to-end runs of the bridge against a fake host over real TCP.

mod common;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::FakeHost;
use hostlink::commands::{
    AddBlackboardKey, AddBlueprintVariable, AddEqsGenerator, AddEqsTest, CreateBlackboard, CreateEqsQuery,
    GeneratorType, KeyType, ListBlackboardKeys, ScoringEquation, TestPurpose, TestType,
};
use hostlink::config::{ImageGenConfig, KnowledgeConfig, SessionConfig, TemplateConfig};
use hostlink::image_gen::ImageGenClient;
use hostlink::knowledge::KnowledgeClient;
use hostlink::result::{FAILED_TO_CONNECT, NO_RESPONSE};
use hostlink::templates::TemplateStore;
use hostlink::{Bridge, GeneratorIndex, RationaleHook, Session, TestIndex, Toolkit};

fn toolkit(bridge: Bridge, image_gen: ImageGenConfig, knowledge_url: Option<String>) -> Toolkit {
    let knowledge = match knowledge_url {
        Some(url) => KnowledgeConfig::default().with_base_url(url).with_enabled(true),
        None => KnowledgeConfig::default().with_enabled(false),
    };
    let knowledge = Arc::new(KnowledgeClient::new(&knowledge).unwrap());
    Toolkit::new(
        bridge,
        ImageGenClient::new(&image_gen).unwrap(),
        TemplateStore::new(&TemplateConfig::default(), knowledge),
    )
}

#[tokio::test]
async fn blackboard_key_is_listed_once() {
    let host = FakeHost::start().await;
    let bridge = host.bridge();

    assert!(bridge.execute(CreateBlackboard::new("BB_Test")).await.is_success());
    let added = bridge
        .execute(AddBlackboardKey::new("BB_Test", "IsAlerted", KeyType::Bool))
        .await;
    assert!(added.is_success(), "{added:?}");

    let listed = bridge.execute(ListBlackboardKeys::new("BB_Test")).await;
    assert_eq!(listed.get("count"), Some(&json!(1)));
    assert_eq!(listed.get("keys"), Some(&json!([{"name": "IsAlerted", "type": "Bool"}])));
    assert_eq!(bridge.session().connect_count(), 1);

    host.stop().await;
}

#[tokio::test]
async fn duplicate_key_is_sent_again_not_deduplicated() {
    let host = FakeHost::start().await;
    let bridge = host.bridge();

    bridge.execute(CreateBlackboard::new("BB_Test")).await;
    for _ in 0..2 {
        bridge
            .execute(AddBlackboardKey::new("BB_Test", "IsAlerted", KeyType::Bool))
            .await;
    }

    let listed = bridge.execute(ListBlackboardKeys::new("BB_Test")).await;
    assert_eq!(listed.get("count"), Some(&json!(2)));
    let sent = host
        .requests()
        .await
        .iter()
        .filter(|r| r.name == "add_blackboard_key")
        .count();
    assert_eq!(sent, 2);

    host.stop().await;
}

#[tokio::test]
async fn host_rejection_is_passed_through() {
    let host = FakeHost::start().await;
    let bridge = host.bridge();

    bridge.execute(CreateBlackboard::new("BB_Test")).await;
    let again = bridge.execute(CreateBlackboard::new("BB_Test")).await;
    assert!(!again.is_success());
    assert_eq!(again.error(), Some("Blackboard already exists: BB_Test"));

    host.stop().await;
}

#[tokio::test]
async fn eqs_indices_come_from_the_host() {
    let host = FakeHost::start().await;
    let bridge = host.bridge();

    bridge.execute(CreateEqsQuery::new("EQS_FindCover")).await;
    let mut grid = AddEqsGenerator::new("EQS_FindCover", GeneratorType::SimpleGrid);
    grid.grid_size = 2000.0;
    grid.space_between = 200.0;
    let first = bridge.execute(grid).await;
    assert_eq!(first.generator_index(), Some(GeneratorIndex::new(0)));

    let mut test = AddEqsTest::new("EQS_FindCover", TestType::Distance, GeneratorIndex::new(0));
    test.scoring_factor = 1.5;
    let added = bridge.execute(test).await;
    assert_eq!(added.test_index(), Some(TestIndex::new(0)));
    assert_eq!(added.generator_index(), Some(GeneratorIndex::new(0)));

    let second = bridge
        .execute(AddEqsGenerator::new("EQS_FindCover", GeneratorType::Donut))
        .await;
    let second_index = second.generator_index().unwrap();
    assert_eq!(second_index, GeneratorIndex::new(1));

    // Both generators stay addressable by the index the host handed out.
    let trace = bridge
        .execute(AddEqsTest::new("EQS_FindCover", TestType::Trace, second_index))
        .await;
    assert_eq!(trace.generator_index(), Some(GeneratorIndex::new(1)));
    assert_eq!(trace.test_index(), Some(TestIndex::new(0)));

    let under_first = host.eqs_tests("EQS_FindCover", 0).await;
    assert_eq!(under_first.len(), 1);
    assert_eq!(under_first[0]["test_type"], json!("Distance"));
    assert_eq!(under_first[0]["scoring_factor"], json!(1.5));
    let under_second = host.eqs_tests("EQS_FindCover", 1).await;
    assert_eq!(under_second.len(), 1);
    assert_eq!(under_second[0]["test_type"], json!("Trace"));

    let requests = host.requests().await;
    let sent = requests.iter().find(|r| r.name == "add_eqs_generator").unwrap();
    assert_eq!(sent.params["grid_size"], json!(2000.0));
    assert_eq!(sent.params["space_between"], json!(200.0));
    let sent = requests.iter().find(|r| r.name == "add_eqs_test").unwrap();
    assert_eq!(sent.params["scoring_factor"], json!(1.5));
    assert_eq!(sent.params["test_purpose"], json!("Score"));
    assert_eq!(sent.params["scoring_equation"], json!("Linear"));

    host.stop().await;
}

#[tokio::test]
async fn stale_index_is_reported_by_the_host() {
    let host = FakeHost::start().await;
    let bridge = host.bridge();

    bridge.execute(CreateEqsQuery::new("EQS_Empty")).await;
    let mut test = AddEqsTest::new("EQS_Empty", TestType::Trace, GeneratorIndex::new(3));
    test.test_purpose = TestPurpose::Filter;
    test.scoring_equation = ScoringEquation::Constant;
    let result = bridge.execute(test).await;
    assert!(!result.is_success());
    assert_eq!(result.error_code(), Some(&json!("InvalidIndex")));

    host.stop().await;
}

#[tokio::test]
async fn host_reset_is_followed_by_reconnect() {
    let host = FakeHost::start().await;
    let bridge = host.bridge();

    assert!(bridge.execute(CreateBlackboard::new("BB_One")).await.is_success());
    host.reset_connections().await;

    let result = bridge.execute(CreateBlackboard::new("BB_Two")).await;
    assert!(result.is_success(), "{result:?}");
    assert_eq!(bridge.session().connect_count(), 2);

    host.stop().await;
}

#[tokio::test]
async fn hang_up_after_read_is_no_response() {
    let host = FakeHost::start().await;
    let bridge = host.bridge();
    host.drop_after_read(true);

    let result = bridge.execute(CreateBlackboard::new("BB_Test")).await;
    assert_eq!(result.error(), Some(NO_RESPONSE));
    assert!(!bridge.session().is_connected().await);

    // The next command gets a fresh connection and no retry of the first.
    host.drop_after_read(false);
    let result = bridge.execute(CreateBlackboard::new("BB_Other")).await;
    assert!(result.is_success());
    let names: Vec<_> = host.requests().await.into_iter().map(|r| r.params["name"].clone()).collect();
    assert_eq!(names, vec![json!("BB_Test"), json!("BB_Other")]);

    host.stop().await;
}

#[tokio::test]
async fn nothing_listening_is_failed_to_connect() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = SessionConfig::default().with_addr("127.0.0.1", port);
    let bridge = Bridge::new(Arc::new(Session::tcp(config)));
    let result = bridge.execute(CreateBlackboard::new("BB_Test")).await;
    assert_eq!(result.into_value(), json!({"success": false, "error": FAILED_TO_CONNECT}));
}

#[tokio::test]
async fn invalid_size_is_rejected_without_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let host = FakeHost::start().await;
    let toolkit = toolkit(
        host.bridge(),
        ImageGenConfig::default().with_server_url(server.uri()),
        None,
    );

    let result = toolkit
        .call("generate_image", json!({"prompt": "stone wall", "width": 500}))
        .await;
    assert!(!result.is_success());
    assert_eq!(result.error_code(), Some(&json!("InvalidParameter")));
    assert!(host.requests().await.is_empty());

    host.stop().await;
}

#[tokio::test]
async fn generated_texture_is_imported_and_cleaned_up() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [STANDARD.encode(b"\x89PNG fake")],
            "info": "{\"seed\": 4242}"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let host = FakeHost::start().await;
    let temp = tempfile::tempdir().unwrap();
    let toolkit = toolkit(
        host.bridge(),
        ImageGenConfig::default()
            .with_server_url(server.uri())
            .with_temp_dir(temp.path()),
        None,
    );

    let result = toolkit
        .call(
            "generate_and_import_texture",
            json!({"prompt": "mossy stone", "asset_name": "T_Moss"}),
        )
        .await;
    assert!(result.is_success(), "{result:?}");

    let requests = host.requests().await;
    let import = requests.iter().find(|r| r.name == "import_texture").unwrap();
    assert_eq!(import.params["source_type"], json!("file"));
    assert_eq!(import.params["destination_path"], json!("/Game/Generated"));
    let source = import.params["source"].as_str().unwrap();
    assert!(source.ends_with("T_Moss_generated.png"));
    assert!(!std::path::Path::new(source).exists());

    host.stop().await;
}

#[tokio::test]
async fn material_from_builtin_template_reaches_the_host() {
    let host = FakeHost::start().await;
    let toolkit = toolkit(host.bridge(), ImageGenConfig::default(), None);

    let result = toolkit
        .call(
            "create_material_from_template",
            json!({
                "name": "M_DetectionSphere",
                "template": "unlit_translucent",
                "color": [1.0, 0.0, 0.0]
            }),
        )
        .await;
    assert!(result.is_success(), "{result:?}");

    let requests = host.requests().await;
    assert_eq!(requests.len(), 1);
    let params = &requests[0].params;
    assert_eq!(requests[0].name, "create_simple_material");
    assert_eq!(params["shading_model"], json!("Unlit"));
    assert_eq!(params["blend_mode"], json!("Translucent"));
    assert_eq!(params["emissive_color"], json!([1.0, 0.0, 0.0]));
    assert_eq!(params["emissive_strength"], json!(1.0));
    assert_eq!(params["opacity"], json!(0.3));
    assert!(params.get("base_color").is_none());

    host.stop().await;
}

#[tokio::test]
async fn rationale_is_recorded_but_never_sent() {
    let knowledge = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/knowledge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1"})))
        .expect(1)
        .mount(&knowledge)
        .await;
    let host = FakeHost::start().await;
    let client = Arc::new(
        KnowledgeClient::new(&KnowledgeConfig::default().with_base_url(knowledge.uri()).with_enabled(true)).unwrap(),
    );
    let bridge = host.bridge().with_hook(Arc::new(RationaleHook::new(client)));

    let command: AddBlueprintVariable = serde_json::from_value(json!({
        "blueprint_name": "BP_Guard",
        "variable_name": "AlertLevel",
        "variable_type": "Float",
        "rationale": "Drives the guard's escalation"
    }))
    .unwrap();
    assert!(bridge.execute(command).await.is_success());

    let sent = &host.requests().await[0];
    assert!(sent.params.get("rationale").is_none());

    let recorded = knowledge.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&recorded[0].body).unwrap();
    assert_eq!(body["category"], json!("blueprint_variable"));
    assert_eq!(body["tags"], json!("rationale,add_blueprint_variable"));

    host.stop().await;
}
