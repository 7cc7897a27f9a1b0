// Assist interpretation tier.
//
// Sends (utterance, capped context) to the interpretation service and
// parses a structured result. One bounded-time request, no retries:
// interactive latency matters more than resilience here. Every failure
// mode (network, non-success status, malformed body, timeout) collapses
// into TierUnavailable so the dispatcher falls back silently.

use serde::{Deserialize, Serialize};

use gridmind_config::ResolvedAssistConfig;
use gridmind_core::{CellScalar, InterpretationResult, Operation, SpreadsheetContext};

use crate::dispatch::{Interpreter, TierUnavailable};

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct AssistRequest<'a> {
    utterance: &'a str,
    model: &'a str,
    context: ContextPayload<'a>,
}

#[derive(Serialize)]
struct ContextPayload<'a> {
    worksheet: &'a str,
    address: &'a str,
    row_count: usize,
    column_count: usize,
    values: &'a [Vec<CellScalar>],
    /// Omitted in privacy mode: typed values travel, rendered text stays.
    #[serde(skip_serializing_if = "Option::is_none")]
    display: Option<&'a [Vec<String>]>,
}

#[derive(Deserialize)]
struct AssistResponse {
    explanation: String,
    /// Raw operation values; unrecognized kinds are dropped, not fatal.
    #[serde(default)]
    operations: Vec<serde_json::Value>,
}

// ============================================================================
// Client
// ============================================================================

/// Blocking HTTP client for the interpretation service.
pub struct AssistClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    privacy_mode: bool,
}

impl AssistClient {
    /// Build from resolved configuration. Fails only if the HTTP client
    /// itself cannot be constructed.
    pub fn new(config: &ResolvedAssistConfig) -> Result<Self, TierUnavailable> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TierUnavailable::new("network", e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            privacy_mode: config.privacy_mode,
        })
    }

    /// One request, one bounded wait, one parsed result.
    pub fn interpret(
        &self,
        utterance: &str,
        context: &SpreadsheetContext,
    ) -> Result<InterpretationResult, TierUnavailable> {
        let request = AssistRequest {
            utterance,
            model: &self.model,
            context: ContextPayload {
                worksheet: &context.worksheet,
                address: &context.address,
                row_count: context.row_count,
                column_count: context.column_count,
                values: &context.values,
                display: if self.privacy_mode { None } else { Some(&context.display) },
            },
        };

        let mut req = self.http.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req.send().map_err(|e| {
            if e.is_timeout() {
                TierUnavailable::new("timeout", e.to_string())
            } else {
                TierUnavailable::new("network", e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TierUnavailable::new(
                "status",
                format!("HTTP {}: {}", status.as_u16(), body),
            ));
        }

        let body = response
            .text()
            .map_err(|e| TierUnavailable::new("malformed", e.to_string()))?;

        parse_assist_body(&body)
    }
}

/// Parse the service response. Tolerates a body wrapped in extra text or
/// markdown fencing by extracting the outermost JSON object.
fn parse_assist_body(body: &str) -> Result<InterpretationResult, TierUnavailable> {
    let parsed: AssistResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            let start = body.find('{');
            let end = body.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str(&body[start..=end]).map_err(|_| {
                        TierUnavailable::new(
                            "malformed",
                            format!("Unparseable response body: {}", e),
                        )
                    })?
                }
                _ => {
                    return Err(TierUnavailable::new(
                        "malformed",
                        format!("Response is not JSON: {}", e),
                    ));
                }
            }
        }
    };

    let (operations, dropped) = Operation::decode_lenient(&parsed.operations);
    if dropped > 0 {
        log::debug!("Dropped {} unrecognized operation(s) from assist response", dropped);
    }

    Ok(InterpretationResult::new(parsed.explanation, operations))
}

// ============================================================================
// Interpreter
// ============================================================================

/// The assist tier. Holds no client when the tier is disabled, in which
/// case it declines immediately without touching the network.
pub struct AssistInterpreter {
    client: Option<AssistClient>,
}

impl AssistInterpreter {
    pub fn from_config(config: &ResolvedAssistConfig) -> Self {
        let client = if config.status.is_ready() {
            match AssistClient::new(config) {
                Ok(client) => Some(client),
                Err(e) => {
                    log::warn!("Assist client construction failed: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self { client }
    }
}

impl Interpreter for AssistInterpreter {
    fn name(&self) -> &'static str {
        "assist"
    }

    fn try_interpret(
        &self,
        utterance: &str,
        context: &SpreadsheetContext,
    ) -> Result<InterpretationResult, TierUnavailable> {
        match &self.client {
            Some(client) => client.interpret(utterance, context),
            None => Err(TierUnavailable::new("disabled", "assist tier is disabled")),
        }
    }
}
