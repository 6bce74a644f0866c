//! End-to-end tests for the streaming search endpoint.
//!
//! These tests drive the full HTTP stack with a scripted model backend
//! and assert on the NDJSON event stream the way the web client reads it.

mod common;

use anyhow::Result;
use nexus_llm::{LlmError, ModelResponse, Part};
use nexus_server::NDJSON_CONTENT_TYPE;
use serde_json::json;

/// Number of terminal events (answer or error) in a stream.
fn terminal_count(events: &[serde_json::Value]) -> usize {
    events
        .iter()
        .filter(|e| e["type"] == "answer" || e["type"] == "error")
        .count()
}

#[tokio::test]
async fn test_server_starts_and_responds_to_health() -> Result<()> {
    let server = common::TestServer::start().await?;

    let healthy = server.health().await?;
    assert!(healthy, "Server should be healthy");

    Ok(())
}

#[tokio::test]
async fn test_chat_query_streams_status_then_text_answer() -> Result<()> {
    let server = common::TestServer::start().await?;

    let events = server.search("hello").await?;

    assert!(events.len() >= 2);
    assert_eq!(events[0]["type"], "status");

    let last = events.last().unwrap();
    assert_eq!(last["type"], "answer");
    assert_eq!(last["format"], "text");
    assert!(last["content"].as_str().unwrap().contains("Hello"));

    assert_eq!(terminal_count(&events), 1);

    Ok(())
}

#[tokio::test]
async fn test_search_query_streams_artifacts_and_json_answer() -> Result<()> {
    let answer = "```json\n[{\"name\": \"Jordan Reyes\", \"role\": \"CTO\", \
                  \"company\": \"TechCorp\", \"location\": \"Austin\", \
                  \"summary\": \"Found via web search.\"}]\n```";

    let server = common::TestServer::start_with_script(vec![
        Ok(ModelResponse::text_reply("mock-model", "SEARCH")),
        Ok(ModelResponse::new(
            "mock-model",
            vec![Part::function_call(
                "search_local_entities",
                json!({"query": "TechCorp"}),
            )],
        )),
        Ok(ModelResponse::new(
            "mock-model",
            vec![Part::function_call(
                "search_web",
                json!({"query": "CTO of TechCorp"}),
            )],
        )),
        Ok(ModelResponse::text_reply("mock-model", answer)),
    ])
    .await?;

    let events = server.search("find me the CTO of TechCorp").await?;

    // Every tool call is announced by a status event immediately before it.
    let artifacts: Vec<(usize, &serde_json::Value)> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e["type"] == "tool_artifact")
        .collect();
    assert_eq!(artifacts.len(), 2);
    for (idx, _) in &artifacts {
        assert_eq!(events[idx - 1]["type"], "status");
        assert!(
            events[idx - 1]["message"]
                .as_str()
                .unwrap()
                .starts_with("Calling ")
        );
    }

    // No local record and no search key, so both lookups fail.
    let (_, local) = artifacts[0];
    assert_eq!(local["tool_name"], "search_local_entities");
    assert_eq!(local["query"], "TechCorp");
    assert_eq!(local["status"], "fail");
    assert_eq!(local["result"], "No records found");

    let (_, web) = artifacts[1];
    assert_eq!(web["tool_name"], "search_web");
    assert_eq!(web["query"], "CTO of TechCorp");
    assert_eq!(web["status"], "fail");
    assert!(web["result"].as_str().unwrap().contains("SERPER_API_KEY"));

    // The answer arrives last, fenced, and parses after client-side cleanup.
    let last = events.last().unwrap();
    assert_eq!(last["type"], "answer");
    assert_eq!(last["format"], "json");

    let raw = last["content"].as_str().unwrap();
    let cleaned = raw.replace("```json", "").replace("```", "");
    let parsed: serde_json::Value = serde_json::from_str(cleaned.trim())?;
    assert!(parsed.is_array());
    assert_eq!(parsed[0]["name"], "Jordan Reyes");

    assert_eq!(terminal_count(&events), 1);

    Ok(())
}

#[tokio::test]
async fn test_local_hit_artifact_carries_matching_records() -> Result<()> {
    let server = common::TestServer::start_with_script(vec![
        Ok(ModelResponse::text_reply("mock-model", "SEARCH")),
        Ok(ModelResponse::new(
            "mock-model",
            vec![Part::function_call(
                "search_local_entities",
                json!({"query": "Elena"}),
            )],
        )),
        Ok(ModelResponse::text_reply(
            "mock-model",
            "[{\"name\": \"Elena Silva\"}]",
        )),
    ])
    .await?;

    let events = server.search("who is elena?").await?;

    let artifact = events
        .iter()
        .find(|e| e["type"] == "tool_artifact")
        .expect("expected a tool artifact");

    assert_eq!(artifact["status"], "success");
    assert!(artifact["result"].as_str().unwrap().contains("Elena Silva"));

    Ok(())
}

#[tokio::test]
async fn test_missing_query_parameter_is_a_400() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .client
        .get(format!("{}/api/search", server.base_url()))
        .send()
        .await?;

    assert_eq!(resp.status().as_u16(), 400);

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "bad_request");

    Ok(())
}

#[tokio::test]
async fn test_trailing_slash_route_also_streams() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .client
        .get(format!("{}/api/search/", server.base_url()))
        .query(&[("q", "hello")])
        .send()
        .await?;

    assert!(resp.status().is_success());

    let body = resp.text().await?;
    let last: serde_json::Value = serde_json::from_str(body.lines().last().unwrap())?;
    assert_eq!(last["type"], "answer");

    Ok(())
}

#[tokio::test]
async fn test_status_endpoint_reports_key_flags() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .client
        .get(format!("{}/api/status", server.base_url()))
        .send()
        .await?;

    assert!(resp.status().is_success());

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["gemini_api_key_loaded"], true);
    assert_eq!(body["serper_api_key_loaded"], false);

    Ok(())
}

#[tokio::test]
async fn test_search_responds_with_ndjson_content_type() -> Result<()> {
    let server = common::TestServer::start().await?;

    let resp = server
        .client
        .get(format!("{}/api/search", server.base_url()))
        .query(&[("q", "hello")])
        .send()
        .await?;

    assert!(resp.status().is_success());

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(content_type, NDJSON_CONTENT_TYPE);

    Ok(())
}

#[tokio::test]
async fn test_model_outage_streams_single_error_event() -> Result<()> {
    // Both models report quota exhaustion for the intent call, which fails
    // open to chat, and again for the chat call, which is fatal.
    let server = common::TestServer::start_with_script(vec![
        Err(LlmError::QuotaExhausted("429".to_string())),
        Err(LlmError::QuotaExhausted("429".to_string())),
        Err(LlmError::QuotaExhausted("429".to_string())),
        Err(LlmError::QuotaExhausted("429".to_string())),
    ])
    .await?;

    let events = server.search("hello").await?;

    let last = events.last().unwrap();
    assert_eq!(last["type"], "error");
    assert!(
        last["message"]
            .as_str()
            .unwrap()
            .contains("All models exhausted")
    );

    // The fail-open note from the intent stage still streams as a status.
    assert!(events.iter().any(|e| {
        e["type"] == "status"
            && e["message"]
                .as_str()
                .unwrap_or_default()
                .contains("conversationally")
    }));

    assert_eq!(terminal_count(&events), 1);

    Ok(())
}
