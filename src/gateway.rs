use std::sync::OnceLock;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::{sleep, Duration};

/// Failure taxonomy at the node boundary.
///
/// `Transport` means the request never produced a usable response (connect
/// failure, timeout, non-success HTTP status). `Remote` means the node
/// answered and the application rejected the request; its message is kept
/// verbatim for the status line.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("remote: {0}")]
    Remote(String),
}

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        reqwest::Client::builder()
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .build()
            .expect("reqwest client")
    })
}

/// Escape a user-supplied string for embedding in a double-quoted GraphQL
/// string literal. Backslash first, then quote, CR, LF. All request text is
/// built through `ops`, which routes every argument through here.
pub fn escape_str(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// GraphQL-over-HTTP transport to one node service. Cheap to clone; all
/// clones share the process-wide HTTP client.
#[derive(Debug, Clone)]
pub struct NodeClient {
    node_url: String,
    app_id: String,
    timeout_ms: u64,
}

impl NodeClient {
    pub fn new(node_url: &str, app_id: &str, timeout_ms: u64) -> Self {
        Self {
            node_url: node_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            timeout_ms,
        }
    }

    /// Per-chain application endpoint: `{node}/chains/{chain}/applications/{app}`.
    pub fn chain_endpoint(&self, chain_id: &str) -> String {
        format!(
            "{}/chains/{}/applications/{}",
            self.node_url,
            urlencoding::encode(chain_id),
            urlencoding::encode(&self.app_id)
        )
    }

    /// Post one GraphQL document (query or mutation) to `chain_id` and
    /// return the `data` payload. Transient HTTP statuses get a small,
    /// bounded retry before counting as transport failures.
    pub async fn query(&self, chain_id: &str, text: &str) -> Result<Value, GatewayError> {
        let url = self.chain_endpoint(chain_id);
        let body = json!({ "query": text });
        let mut attempt = 0u32;
        loop {
            let res = http_client()
                .post(&url)
                .json(&body)
                .timeout(Duration::from_millis(self.timeout_ms))
                .send()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;

            if !res.status().is_success() {
                if matches!(res.status().as_u16(), 429 | 500 | 502 | 503 | 504) && attempt < 2 {
                    attempt += 1;
                    log::debug!("retrying {url} after http {} (attempt {attempt})", res.status());
                    sleep(Duration::from_millis(150 * attempt as u64)).await;
                    continue;
                }
                return Err(GatewayError::Transport(format!("http {}", res.status())));
            }

            let v: Value = res
                .json()
                .await
                .map_err(|e| GatewayError::Transport(format!("invalid response body: {e}")))?;

            if let Some(errors) = v.get("errors").and_then(|e| e.as_array()) {
                if !errors.is_empty() {
                    let msg = errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                        .collect::<Vec<_>>()
                        .join("; ");
                    let msg = if msg.is_empty() { "unspecified error".to_string() } else { msg };
                    return Err(GatewayError::Remote(msg));
                }
            }

            return match v.get("data") {
                Some(Value::Null) | None => {
                    Err(GatewayError::Remote("response carried no data".into()))
                }
                Some(data) => Ok(data.clone()),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_the_four_special_chars() {
        assert_eq!(escape_str(r#"plain name"#), "plain name");
        assert_eq!(escape_str(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_str(r"a\b"), r"a\\b");
        assert_eq!(escape_str("a\r\nb"), "a\\r\\nb");
        // Backslash handled before quote so the pair does not double-escape.
        assert_eq!(escape_str(r#"\""#), r#"\\\""#);
    }

    #[test]
    fn escaped_text_round_trips_as_a_string_literal() {
        // GraphQL string literals share JSON escape syntax for these chars,
        // so parsing the quoted form back must recover the original.
        for raw in [
            "Ada \"the admiral\" Lovelace",
            "back\\slash",
            "multi\r\nline\nname",
            "\\\"\r\n",
        ] {
            let quoted = format!("\"{}\"", escape_str(raw));
            let parsed: String = serde_json::from_str(&quoted).unwrap();
            assert_eq!(parsed, raw);
        }
    }

    #[test]
    fn endpoint_joins_node_chain_and_app() {
        let client = NodeClient::new("http://localhost:8080/", "app123", 5000);
        assert_eq!(
            client.chain_endpoint("chainabc"),
            "http://localhost:8080/chains/chainabc/applications/app123"
        );
    }
}
