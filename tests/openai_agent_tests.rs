#![cfg(feature = "openai")]

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{object_tool, MockConnector, MockSession};
use mcp_host::agent::OpenAiAgent;
use mcp_host::error::HostError;
use mcp_host::host::{GenerateOptions, Host};
use mcp_host::registry::SessionRegistry;
use mcp_host::types::{Message, Part, ToolCallOutput, ToolId, ToolUsePart};

fn tool_call_response(function: &str, arguments: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": { "name": function, "arguments": arguments }
                }]
            }
        }]
    }))
}

fn text_response(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-2",
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": { "role": "assistant", "content": text }
        }]
    }))
}

async fn host_for(server: &MockServer, sessions: Vec<MockSession>, config: &str) -> Host {
    let registry = SessionRegistry::build(config, &MockConnector::with(sessions))
        .await
        .expect("registry should build");
    let agent = OpenAiAgent::new("gpt-test", Some("test-key".into()), Some(server.uri()));
    Host::new(registry, Arc::new(agent))
}

#[tokio::test]
async fn tool_call_then_answer() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("greet__greet"))
        .respond_with(tool_call_response("greet__greet", r#"{"name":"Ada"}"#))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Hello, Ada!"))
        .respond_with(text_response("I said hello to Ada."))
        .expect(1)
        .mount(&server)
        .await;

    let host = host_for(&server, vec![MockSession::greeter("greet")], "![.][greet] run-cmd").await;
    let reply = host
        .generate(&[Message::user("say hi to Ada")], GenerateOptions::default())
        .await
        .expect("generation should succeed");

    assert_eq!(
        reply.parts,
        vec![
            Part::ToolUse(ToolUsePart::succeeded(
                ToolId::new("greet", "greet"),
                json!({ "name": "Ada" }),
                ToolCallOutput::text("Hello, Ada!"),
            )),
            Part::text("I said hello to Ada."),
        ]
    );
}

#[tokio::test]
async fn patched_arguments_reach_the_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(tool_call_response("math__add", r#"{"a":1,"b":2}"#))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(text_response("done"))
        .mount(&server)
        .await;

    let math = MockSession::new("math", vec![object_tool("add", &["a", "b"])]);
    let calls = math.calls.clone();
    let host = host_for(&server, vec![math], "![.][math] run-cmd").await;

    let options: GenerateOptions = serde_json::from_value(json!({
        "toolConfigs": [{
            "toolId": { "serverName": "math", "name": "add" },
            "toolPatch": { "input": { "a": 3 } }
        }]
    }))
    .expect("options should decode");

    host.generate(&[Message::user("add")], options)
        .await
        .expect("generation should succeed");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "add");
    assert_eq!(
        calls[0].1.clone().map(serde_json::Value::Object),
        Some(json!({ "a": 3, "b": 2 }))
    );

    let requests = server.received_requests().await.expect("recording is on");
    let first: serde_json::Value = requests[0].body_json().expect("request is JSON");
    let schema = &first["tools"][0]["function"]["parameters"];
    assert!(schema["properties"].get("a").is_none());
    assert_eq!(schema["required"], json!(["b"]));
}

#[tokio::test]
async fn final_round_offers_no_tools() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(tool_call_response("greet__greet", r#"{"name":"Bo"}"#))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(text_response("finished"))
        .mount(&server)
        .await;

    let host = host_for(&server, vec![MockSession::greeter("greet")], "![.][greet] run-cmd").await;
    let reply = host
        .generate(&[Message::user("greet forever")], GenerateOptions::default())
        .await
        .expect("generation should succeed");

    let requests = server.received_requests().await.expect("recording is on");
    assert_eq!(requests.len(), 3);
    let last: serde_json::Value = requests[2].body_json().expect("request is JSON");
    assert!(last.get("tools").is_none());
    assert_eq!(reply.parts.last(), Some(&Part::text("finished")));
}

#[tokio::test]
async fn unknown_function_becomes_text_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(tool_call_response("nowhere__nothing", "{}"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(text_response("sorry"))
        .mount(&server)
        .await;

    let host = host_for(&server, vec![MockSession::greeter("greet")], "![.][greet] run-cmd").await;
    let reply = host
        .generate(&[Message::user("hi")], GenerateOptions::default())
        .await
        .expect("generation should succeed");

    assert_eq!(
        reply.parts,
        vec![
            Part::text_error("unknown tool requested: nowhere__nothing"),
            Part::text("sorry"),
        ]
    );
}

#[tokio::test]
async fn provider_error_fails_the_generation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })),
        )
        .mount(&server)
        .await;

    let host = host_for(&server, Vec::new(), "").await;
    let err = host
        .generate(&[Message::user("hi")], GenerateOptions::default())
        .await
        .expect_err("401 must fail");
    assert!(matches!(err, HostError::Api { status: 401, ref message } if message == "bad key"));
}
