use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::client::graphql::GraphQlRequest;
use crate::client::transport::{Transport, TransportResponse};
use crate::error::{GhSubError, GhSubResult};
use crate::logging::log_debug;
use crate::models::{GraphQLErrorEntry, GraphQLResponse};

/// Executes GraphQL documents through `gh api graphql`, which reuses the
/// user's existing `gh auth` session. The request body goes over the child's
/// stdin (`--input -`), so a large aliased batch document never hits the
/// platform's argv length ceiling.
pub struct GhTransport {
    program: String,
}

impl GhTransport {
    pub fn new() -> Self {
        Self {
            program: "gh".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for GhTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for GhTransport {
    async fn execute(&self, request: &GraphQlRequest) -> GhSubResult<TransportResponse> {
        let body = serde_json::to_vec(request)?;
        log_debug(&format!("gh api graphql ({} byte body)", body.len()));

        let mut child = Command::new(&self.program)
            .args(["api", "graphql", "--input", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    GhSubError::GhNotFound
                } else {
                    GhSubError::IoError(e)
                }
            })?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| GhSubError::Unknown("child stdin unavailable".to_string()))?;
            stdin.write_all(&body).await?;
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            // gh exits non-zero whenever the body carries GraphQL errors,
            // even though `data` may hold sibling successes from the same
            // aliased batch. If stdout still parses as an envelope with data,
            // hand it up so the batch demux can attribute failures per alias.
            if let Ok(parsed) = serde_json::from_str::<GraphQLResponse<serde_json::Value>>(&stdout)
            {
                if parsed.data.as_ref().is_some_and(|d| !d.is_null()) {
                    return Ok(TransportResponse {
                        status: 200,
                        retry_after: None,
                        data: parsed.data,
                        errors: parsed.errors.unwrap_or_default(),
                    });
                }
            }
            return Err(classify_failure(&stdout, &stderr));
        }

        let parsed: GraphQLResponse<serde_json::Value> = serde_json::from_str(&stdout)
            .map_err(|e| GhSubError::MalformedResponse(format!("invalid response JSON: {}", e)))?;

        Ok(TransportResponse {
            status: 200,
            retry_after: None,
            data: parsed.data,
            errors: parsed.errors.unwrap_or_default(),
        })
    }
}

/// Map a failed `gh` invocation to a typed error the retry layer can
/// classify. gh reports HTTP failures on stderr (e.g. "HTTP 429") and echoes
/// any Retry-After the API sent.
fn classify_failure(stdout: &str, stderr: &str) -> GhSubError {
    let combined = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr
    };

    let lowered = combined.to_lowercase();
    if lowered.contains("timed out") || lowered.contains("timeout") {
        return GhSubError::Timeout(first_line(combined));
    }

    if let Some(status) = parse_http_status(combined) {
        return GhSubError::ApiStatus {
            status,
            message: first_line(combined),
            retry_after: parse_retry_after(combined),
        };
    }

    if lowered.contains("rate limit") {
        return GhSubError::RateLimited {
            retry_after: parse_retry_after(combined),
        };
    }

    GhSubError::Unknown(first_line(combined))
}

fn first_line(text: &str) -> String {
    text.lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("gh exited with an error")
        .trim()
        .to_string()
}

/// Find an "HTTP <code>" marker in gh's error output.
fn parse_http_status(text: &str) -> Option<u16> {
    let idx = text.find("HTTP ")?;
    let digits: String = text[idx + 5..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Find a "retry-after: N" header echo or a "retry after N second(s)" phrase.
fn parse_retry_after(text: &str) -> Option<u64> {
    let lowered = text.to_lowercase();
    let start = if let Some(idx) = lowered.find("retry-after:") {
        idx + "retry-after:".len()
    } else if let Some(idx) = lowered.find("retry after ") {
        idx + "retry after ".len()
    } else {
        return None;
    };

    let digits: String = lowered[start..]
        .chars()
        .skip_while(|c| c.is_whitespace())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
