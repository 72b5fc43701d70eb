/*!
 * Tests for translator implementations
 */

use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use doctwin::errors::ProviderError;
use doctwin::providers::blocking::{BlockingTranslator, BlockingTranslatorAdapter};
use doctwin::providers::mock::MockTranslator;
use doctwin::providers::openai::{ModelCapabilities, OpenAI, OpenAITranslator, strip_code_fence};
use doctwin::providers::{Translator, TranslatorCapabilities};

/// Read one HTTP request, headers and body
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buffer);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let lower = line.to_ascii_lowercase();
                    lower
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if buffer.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buffer).to_string()
}

/// Serve a single canned response; the handle yields the raw request
async fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local address");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write response");
        let _ = socket.shutdown().await;
        request
    });
    (format!("http://{}/v1", address), handle)
}

fn chat_body(content: &str) -> String {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
    })
    .to_string()
}

fn translator_for(endpoint: &str, model: &str) -> OpenAITranslator {
    let client = OpenAI::new_with_config("sk-test", endpoint, 5, 0, 10, None);
    OpenAITranslator::new(client, model, 0.3)
}

/// Test a single translation against a local endpoint
#[tokio::test]
async fn test_openai_translate_withLocalServer_shouldReturnContent() {
    let (endpoint, server) = serve_once("200 OK", chat_body("  Good morning  ")).await;
    let translator = translator_for(&endpoint, "gpt-4o-mini");

    let result = translator.translate("Goedemorgen", "en", "nl", None).await.unwrap();

    assert_eq!(result, "Good morning");
    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/chat/completions"));
    assert!(request.to_ascii_lowercase().contains("bearer sk-test"));
    assert!(request.contains("Goedemorgen"));
    assert!(request.contains("gpt-4o-mini"));
}

/// Test the JSON batch protocol, including blank items
#[tokio::test]
async fn test_openai_translate_batch_withBlankItem_shouldKeepPositions() {
    let content = json!({
        "translations": [
            { "id": "0", "translation": "One" },
            { "id": "1", "translation": "Two" }
        ]
    })
    .to_string();
    let (endpoint, server) = serve_once("200 OK", chat_body(&content)).await;
    let translator = translator_for(&endpoint, "gpt-4o");
    let texts = vec!["Een".to_string(), "   ".to_string(), "Twee".to_string()];

    let result = translator.translate_batch(&texts, "en", "nl", None).await.unwrap();

    assert_eq!(result, vec!["One", "   ", "Two"]);
    let request = server.await.unwrap();
    assert!(request.contains("INPUT_JSON"));
    assert!(request.contains("json_object"));
}

/// Test that a short batch answer is a length mismatch
#[tokio::test]
async fn test_openai_translate_batch_withMissingItem_shouldReportMismatch() {
    let content = json!({ "translations": [{ "id": "0", "translation": "One" }] }).to_string();
    let (endpoint, _server) = serve_once("200 OK", chat_body(&content)).await;
    let translator = translator_for(&endpoint, "gpt-4o");
    let texts = vec!["Een".to_string(), "Twee".to_string()];

    let result = translator.translate_batch(&texts, "en", "nl", None).await;

    assert!(matches!(
        result,
        Err(ProviderError::LengthMismatch { expected: 2, actual: 1 })
    ));
}

/// Test that authentication failures are not retried
#[tokio::test]
async fn test_openai_translate_withUnauthorized_shouldReturnAuthenticationError() {
    let (endpoint, _server) = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#.to_string()).await;
    let translator = translator_for(&endpoint, "gpt-4o-mini");

    let result = translator.translate("Hallo", "en", "nl", None).await;

    assert!(matches!(result, Err(ProviderError::AuthenticationError(_))));
}

/// Test that server errors surface once retries are exhausted
#[tokio::test]
async fn test_openai_translate_withServerError_shouldReturnApiError() {
    let (endpoint, _server) = serve_once("503 Service Unavailable", "{}".to_string()).await;
    let translator = translator_for(&endpoint, "gpt-4o-mini");

    let result = translator.translate("Hallo", "en", "nl", None).await;

    assert!(matches!(result, Err(ProviderError::ApiError { status_code: 503, .. })));
}

/// Test that blank text never reaches the endpoint
#[tokio::test]
async fn test_openai_translate_withBlankText_shouldReturnItUnchanged() {
    let translator = translator_for("http://127.0.0.1:9/v1", "gpt-4o-mini");

    assert_eq!(translator.translate("  ", "en", "nl", None).await.unwrap(), "  ");
}

/// Test batch response parsing variants
#[test]
fn test_parse_batch_response_withFencedJson_shouldParse() {
    let content = "```json\n{\"translations\": [{\"id\": 0, \"translation\": \"Hi\"}]}\n```";

    let parsed = OpenAITranslator::parse_batch_response(content).unwrap();

    assert_eq!(parsed.get("0").map(String::as_str), Some("Hi"));
}

/// Test that a wrong shape is a parse error
#[test]
fn test_parse_batch_response_withWrongShape_shouldFail() {
    let result = OpenAITranslator::parse_batch_response(r#"{"items": []}"#);

    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}

/// Test fence stripping without a closing fence
#[test]
fn test_strip_code_fence_withUnclosedFence_shouldReturnBody() {
    assert_eq!(strip_code_fence("```\n{\"a\": 1}"), "{\"a\": 1}");
}

/// Test the batch message carries ids and context
#[test]
fn test_build_batch_message_withContext_shouldListItems() {
    let message =
        OpenAITranslator::build_batch_message(&["Een", "Twee"], "EN-US", "NL", Some("contract")).unwrap();

    assert!(message.contains("from Dutch to American English"));
    assert!(message.contains(r#""id":"1""#));
    assert!(message.contains("Batch context: contract"));
}

/// Test the system prompt includes the document context once set
#[test]
fn test_build_system_prompt_withDocumentContext_shouldAppendIt() {
    let translator = translator_for("http://127.0.0.1:9/v1", "gpt-4o-mini");
    assert!(!translator.build_system_prompt("en", "nl").contains("DOCUMENT CONTEXT"));

    translator.set_document_context("Document type: Contract/agreement");

    let prompt = translator.build_system_prompt("en", "nl");
    assert!(prompt.contains("DOCUMENT CONTEXT"));
    assert!(prompt.contains("Contract/agreement"));
}

/// Test capabilities follow the model table
#[test]
fn test_capabilities_withKnownModel_shouldReportModelLimits() {
    let translator = translator_for("http://127.0.0.1:9/v1", "gpt-4o");
    let expected = ModelCapabilities::for_model("gpt-4o");

    let capabilities = translator.capabilities();

    assert!(capabilities.supports_context);
    assert_eq!(capabilities.max_batch_size, Some(expected.max_batch_size));
    assert_eq!(capabilities.recommended_concurrency, Some(expected.recommended_concurrency));
    assert_eq!(capabilities.batch_char_budget, Some(expected.batch_char_budget));
}

/// Test failing mock behavior
#[tokio::test]
async fn test_mock_failing_withAnyCall_shouldFail() {
    let translator = MockTranslator::failing();
    let texts = vec!["a".to_string()];

    assert!(translator.translate("a", "en", "nl", None).await.is_err());
    assert!(translator.translate_batch(&texts, "en", "nl", None).await.is_err());
    assert_eq!(translator.call_count(), 2);
}

/// Test failing-batch mock behavior
#[tokio::test]
async fn test_mock_failing_batches_withSingleCall_shouldSucceed() {
    let translator = MockTranslator::failing_batches();
    let texts = vec!["a".to_string(), "b".to_string()];

    assert!(translator.translate_batch(&texts, "en", "nl", None).await.is_err());
    assert_eq!(translator.translate("a", "en", "nl", None).await.unwrap(), "A");
}

/// Test empty mock behavior
#[tokio::test]
async fn test_mock_empty_withBatch_shouldReturnEmptyStrings() {
    let translator = MockTranslator::empty();
    let texts = vec!["a".to_string(), "b".to_string()];

    assert_eq!(translator.translate_batch(&texts, "en", "nl", None).await.unwrap(), vec!["", ""]);
}

/// Test custom capabilities are reported
#[test]
fn test_mock_with_capabilities_withOverride_shouldReportIt() {
    let capabilities = TranslatorCapabilities {
        recommended_concurrency: Some(2),
        max_batch_size: Some(3),
        ..Default::default()
    };
    let translator = MockTranslator::uppercase().with_capabilities(capabilities.clone());

    assert_eq!(translator.capabilities(), capabilities);
}

#[derive(Debug)]
struct Reverser;

impl BlockingTranslator for Reverser {
    fn translate(&self, text: &str, _: &str, _: &str, _: Option<&str>) -> Result<String, ProviderError> {
        Ok(text.chars().rev().collect())
    }
}

/// Test blocking translators behind the async contract
#[tokio::test]
async fn test_blocking_adapter_withSyncTranslator_shouldTranslate() {
    let adapter: Arc<dyn Translator> = Arc::new(BlockingTranslatorAdapter::new(Reverser, 2));

    assert_eq!(adapter.translate("abc", "en", "nl", None).await.unwrap(), "cba");
    let texts = vec!["ab".to_string(), "cd".to_string()];
    assert_eq!(adapter.translate_batch(&texts, "en", "nl", None).await.unwrap(), vec!["ba", "dc"]);
    assert!(!adapter.capabilities().supports_async);
    assert_eq!(adapter.capabilities().recommended_concurrency, Some(2));
}
