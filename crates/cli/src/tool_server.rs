//! Model Context Protocol server over stdio.
//!
//! Speaks JSON-RPC 2.0 with one message per line. Supports `initialize`,
//! `ping`, `tools/list` and `tools/call`; notifications are accepted and
//! never answered.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use video_summary_core::pipeline::analyze_image_use_case::AnalyzeImageUseCase;
use video_summary_core::pipeline::summarize_video_use_case::SummarizeVideoUseCase;
use video_summary_core::remote::domain::summary_request::SummaryResult;
use video_summary_core::shared::error::SummaryError;

pub const SERVER_NAME: &str = "video-summarizer";

/// Protocol revisions this server can answer; the last one is preferred.
const PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

/// Parameters of a `tools/call` request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    SummarizeVideo {
        video_path: PathBuf,
        style: Option<String>,
    },
    AnalyzeImage {
        image_path: PathBuf,
        style: Option<String>,
    },
    CountItems {
        image_path: PathBuf,
        object_name: String,
    },
    AnalyzeImageWithPrompt {
        image_path: PathBuf,
        custom_prompt: String,
    },
}

/// Result of a `tools/call`. Pipeline failures are reported here with
/// `is_error` set rather than as JSON-RPC errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    kind: &'static str,
    pub text: String,
}

impl ToolResult {
    fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![TextContent { kind: "text", text }],
            is_error,
        }
    }
}

#[derive(Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl RpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// What the server needs from the core: one method per tool.
pub trait ToolBackend {
    fn summarize_video(
        &mut self,
        path: &Path,
        style: Option<&str>,
    ) -> Result<SummaryResult, SummaryError>;

    fn analyze_image(
        &mut self,
        path: &Path,
        style: Option<&str>,
    ) -> Result<SummaryResult, SummaryError>;

    fn count_items(
        &mut self,
        path: &Path,
        object_name: &str,
    ) -> Result<SummaryResult, SummaryError>;

    fn analyze_image_with_prompt(
        &mut self,
        path: &Path,
        prompt: &str,
    ) -> Result<SummaryResult, SummaryError>;
}

/// Routes tool calls to the video and image use cases.
pub struct UseCaseBackend {
    pub video: SummarizeVideoUseCase,
    pub image: AnalyzeImageUseCase,
}

impl ToolBackend for UseCaseBackend {
    fn summarize_video(
        &mut self,
        path: &Path,
        style: Option<&str>,
    ) -> Result<SummaryResult, SummaryError> {
        self.video.summarize(path, style)
    }

    fn analyze_image(
        &mut self,
        path: &Path,
        style: Option<&str>,
    ) -> Result<SummaryResult, SummaryError> {
        self.image.analyze(path, style)
    }

    fn count_items(
        &mut self,
        path: &Path,
        object_name: &str,
    ) -> Result<SummaryResult, SummaryError> {
        self.image.count_items(path, object_name)
    }

    fn analyze_image_with_prompt(
        &mut self,
        path: &Path,
        prompt: &str,
    ) -> Result<SummaryResult, SummaryError> {
        self.image.analyze_with_prompt(path, prompt)
    }
}

pub fn dispatch(backend: &mut dyn ToolBackend, call: &ToolCall) -> ToolResult {
    let result = match call {
        ToolCall::SummarizeVideo { video_path, style } => {
            backend.summarize_video(video_path, style.as_deref())
        }
        ToolCall::AnalyzeImage { image_path, style } => {
            backend.analyze_image(image_path, style.as_deref())
        }
        ToolCall::CountItems {
            image_path,
            object_name,
        } => backend.count_items(image_path, object_name),
        ToolCall::AnalyzeImageWithPrompt {
            image_path,
            custom_prompt,
        } => backend.analyze_image_with_prompt(image_path, custom_prompt),
    };
    match result {
        Ok(result) => ToolResult::text(result.text, false),
        Err(e) => {
            log::warn!("Tool call failed: {e}");
            ToolResult::text(e.to_string(), true)
        }
    }
}

fn string_property(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn style_property(styles: &[&str], description: &str) -> Value {
    json!({"type": "string", "enum": styles, "default": "short", "description": description})
}

fn tool(name: &str, description: String, properties: Value, required: &[&str]) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {"type": "object", "properties": properties, "required": required}
    })
}

/// Tool names, descriptions and argument schemas for `tools/list`.
pub fn tool_definitions() -> Value {
    const IMAGE_FORMATS: &str = "JPEG, PNG, BMP, TIFF, WebP, PBM, PGM or PPM";
    let image_path = string_property("Local path to the image file");
    json!([
        tool(
            "summarize_video",
            "Summarize a local video file by sampling frames and sending them to a vision model."
                .to_string(),
            json!({
                "video_path": string_property("Local path to the video file"),
                "style": style_property(
                    &["short", "timeline", "detailed", "technical"],
                    "Summary style",
                ),
            }),
            &["video_path"],
        ),
        tool(
            "analyze_image",
            format!("Describe a local image ({IMAGE_FORMATS})."),
            json!({
                "image_path": image_path,
                "style": style_property(
                    &["short", "detailed", "technical", "descriptive"],
                    "Analysis style",
                ),
            }),
            &["image_path"],
        ),
        tool(
            "count_items",
            format!("Count a named kind of object in a local image ({IMAGE_FORMATS})."),
            json!({
                "image_path": image_path,
                "object_name": string_property("Object to count, e.g. \"person\" or \"car\""),
            }),
            &["image_path", "object_name"],
        ),
        tool(
            "analyze_image_with_prompt",
            format!("Ask a free-form question about a local image ({IMAGE_FORMATS})."),
            json!({
                "image_path": image_path,
                "custom_prompt": string_property("Question or instruction about the image"),
            }),
            &["image_path", "custom_prompt"],
        ),
    ])
}

fn initialize_result(params: &Value) -> Value {
    let latest = PROTOCOL_VERSIONS[PROTOCOL_VERSIONS.len() - 1];
    let version = params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .filter(|requested| PROTOCOL_VERSIONS.contains(requested))
        .unwrap_or(latest);
    json!({
        "protocolVersion": version,
        "capabilities": {"tools": {}},
        "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")}
    })
}

/// Handles one input line. Returns `None` for notifications.
fn handle_message(backend: &mut dyn ToolBackend, line: &str) -> Option<RpcResponse> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            return Some(RpcResponse::failure(
                Value::Null,
                PARSE_ERROR,
                format!("parse error: {e}"),
            ))
        }
    };
    let fallback_id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Some(RpcResponse::failure(
                fallback_id,
                INVALID_REQUEST,
                format!("invalid request: {e}"),
            ))
        }
    };

    let Some(id) = request.id else {
        log::debug!("Notification: {}", request.method);
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => RpcResponse::success(id, initialize_result(&request.params)),
        "ping" => RpcResponse::success(id, json!({})),
        "tools/list" => RpcResponse::success(id, json!({ "tools": tool_definitions() })),
        "tools/call" => match serde_json::from_value::<ToolCall>(request.params) {
            Ok(call) => {
                log::debug!("Tool call: {call:?}");
                let result = dispatch(backend, &call);
                match serde_json::to_value(result) {
                    Ok(result) => RpcResponse::success(id, result),
                    Err(e) => RpcResponse::failure(id, INTERNAL_ERROR, e.to_string()),
                }
            }
            Err(e) => RpcResponse::failure(id, INVALID_PARAMS, format!("invalid tool call: {e}")),
        },
        other => RpcResponse::failure(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
    };
    Some(response)
}

/// Reads messages line by line until EOF and writes one response line per
/// request. Per-message failures become error responses; only I/O errors on
/// the streams themselves end the loop. Returns the number of responses.
pub fn serve(
    backend: &mut dyn ToolBackend,
    input: impl BufRead,
    mut output: impl Write,
) -> std::io::Result<usize> {
    let mut answered = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_message(backend, &line) {
            serde_json::to_writer(&mut output, &response)?;
            output.write_all(b"\n")?;
            output.flush()?;
            answered += 1;
        }
    }
    Ok(answered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Records which tool ran and with what arguments.
    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<String>,
    }

    fn ok(text: &str) -> Result<SummaryResult, SummaryError> {
        Ok(SummaryResult {
            text: text.to_string(),
            frames_used: 1,
            model: "stub".into(),
        })
    }

    impl ToolBackend for RecordingBackend {
        fn summarize_video(
            &mut self,
            path: &Path,
            style: Option<&str>,
        ) -> Result<SummaryResult, SummaryError> {
            self.calls.push(format!("video {} {style:?}", path.display()));
            if style == Some("bogus") {
                return Err(SummaryError::UnknownStyle("bogus".into()));
            }
            ok("video summary")
        }

        fn analyze_image(
            &mut self,
            path: &Path,
            style: Option<&str>,
        ) -> Result<SummaryResult, SummaryError> {
            self.calls.push(format!("image {} {style:?}", path.display()));
            ok("image summary")
        }

        fn count_items(
            &mut self,
            path: &Path,
            object_name: &str,
        ) -> Result<SummaryResult, SummaryError> {
            self.calls
                .push(format!("count {} {object_name}", path.display()));
            ok("3")
        }

        fn analyze_image_with_prompt(
            &mut self,
            path: &Path,
            prompt: &str,
        ) -> Result<SummaryResult, SummaryError> {
            self.calls.push(format!("prompt {} {prompt}", path.display()));
            ok("answer")
        }
    }

    fn run(lines: &[&str]) -> (Vec<Value>, RecordingBackend) {
        let mut backend = RecordingBackend::default();
        let mut output = Vec::new();
        let input = lines.join("\n");
        serve(&mut backend, Cursor::new(input), &mut output).unwrap();
        let responses = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (responses, backend)
    }

    fn call(id: u64, name: &str, arguments: Value) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        })
        .to_string()
    }

    #[test]
    fn test_initialize_handshake() {
        let initialize = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0"}
            }
        });
        let (responses, _) = run(&[
            &initialize.to_string(),
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        ]);

        assert_eq!(responses.len(), 1);
        let result = &responses[0]["result"];
        assert_eq!(responses[0]["jsonrpc"], "2.0");
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }

    #[test]
    fn test_initialize_with_unknown_version_offers_latest() {
        let initialize = json!({
            "jsonrpc": "2.0",
            "id": "a",
            "method": "initialize",
            "params": {"protocolVersion": "1999-01-01"}
        });
        let (responses, _) = run(&[&initialize.to_string()]);
        assert_eq!(responses[0]["id"], "a");
        assert_eq!(
            responses[0]["result"]["protocolVersion"],
            *PROTOCOL_VERSIONS.last().unwrap()
        );
    }

    #[test]
    fn test_tools_list_describes_every_tool() {
        let (responses, _) = run(&[r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#]);

        let tools = responses[0]["result"]["tools"].as_array().unwrap();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                "summarize_video",
                "analyze_image",
                "count_items",
                "analyze_image_with_prompt"
            ]
        );
        for tool in tools {
            assert!(tool["description"].as_str().is_some_and(|d| !d.is_empty()));
            assert_eq!(tool["inputSchema"]["type"], "object");
            assert!(tool["inputSchema"]["required"].is_array());
        }
        assert_eq!(
            tools[2]["inputSchema"]["required"],
            json!(["image_path", "object_name"])
        );
    }

    #[test]
    fn test_tools_call_returns_summary_as_text_content() {
        let (responses, backend) = run(&[
            &call(
                3,
                "summarize_video",
                json!({"video_path": "a.mp4", "style": "timeline"}),
            ),
            &call(
                4,
                "count_items",
                json!({"image_path": "b.png", "object_name": "cars"}),
            ),
        ]);

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 3);
        assert_eq!(responses[0]["result"]["isError"], false);
        assert_eq!(responses[0]["result"]["content"][0]["type"], "text");
        assert_eq!(responses[0]["result"]["content"][0]["text"], "video summary");
        assert_eq!(responses[1]["result"]["content"][0]["text"], "3");
        assert_eq!(
            backend.calls,
            vec![
                "video a.mp4 Some(\"timeline\")".to_string(),
                "count b.png cars".to_string()
            ]
        );
    }

    #[test]
    fn test_style_is_optional() {
        let (_, backend) = run(&[&call(5, "analyze_image", json!({"image_path": "b.png"}))]);
        assert_eq!(backend.calls, vec!["image b.png None".to_string()]);
    }

    #[test]
    fn test_pipeline_failure_is_tool_error() {
        let (responses, _) = run(&[&call(
            6,
            "summarize_video",
            json!({"video_path": "a.mp4", "style": "bogus"}),
        )]);

        let result = &responses[0]["result"];
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "unknown style 'bogus'");
        assert!(responses[0].get("error").is_none());
    }

    #[test]
    fn test_protocol_errors_and_server_keeps_running() {
        let unknown_tool = call(8, "explode", json!({}));
        let missing_argument = call(9, "count_items", json!({"image_path": "b.png"}));
        let question = call(
            10,
            "analyze_image_with_prompt",
            json!({"image_path": "b.png", "custom_prompt": "Why?"}),
        );
        let (responses, backend) = run(&[
            "not json",
            r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#,
            &unknown_tool,
            &missing_argument,
            &question,
        ]);

        assert_eq!(responses.len(), 5);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[1]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses[2]["id"], 8);
        assert_eq!(responses[2]["error"]["code"], INVALID_PARAMS);
        assert_eq!(responses[3]["error"]["code"], INVALID_PARAMS);
        assert_eq!(responses[4]["result"]["content"][0]["text"], "answer");
        assert_eq!(backend.calls, vec!["prompt b.png Why?".to_string()]);
    }

    #[test]
    fn test_request_without_method_is_invalid() {
        let (responses, _) = run(&[r#"{"jsonrpc":"2.0","id":11}"#]);
        assert_eq!(responses[0]["id"], 11);
        assert_eq!(responses[0]["error"]["code"], INVALID_REQUEST);
    }

    #[test]
    fn test_ping() {
        let (responses, _) = run(&[r#"{"jsonrpc":"2.0","id":12,"method":"ping"}"#]);
        assert_eq!(responses[0]["result"], json!({}));
    }

    #[test]
    fn test_notifications_get_no_response() {
        let (responses, _) = run(&[
            r#"{"jsonrpc":"2.0","method":"notifications/cancelled","params":{"requestId":1}}"#,
            "",
        ]);
        assert!(responses.is_empty());
    }
}
