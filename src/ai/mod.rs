//! The lighting assistant.
//!
//! One outbound call to a hosted language-model completions endpoint:
//! the user's free-text description goes out, a fixed JSON schema comes
//! back and is parsed into a [`LightingSuggestion`]. The request runs on
//! a worker thread and reports over a channel polled by the frame loop,
//! so the UI never blocks on the network. No retry policy - a failed
//! request is logged, surfaced as a toast, and that's it.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT_SECS: u64 = 30;

const SYSTEM_PROMPT: &str = "You are a lighting designer for architectural \
visualization. Given a description of desired lighting, respond with ONLY a \
JSON object, no prose, of the shape: {\"ambient_intensity\": number (0..2), \
\"directional_intensity\": number (0..5), \"direction\": [x, y, z] (unit-ish \
vector, y negative means sunlight from above), \"shadow_bias\": number \
(0.0001..0.01)}";

/// Parsed, clamped lighting parameters from the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingSuggestion {
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub direction: [f32; 3],
    pub shadow_bias: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("no API key configured (set MAQUETTE_AI_KEY)")]
    MissingKey,
    #[error("request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("failed to read response: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Spawns requests and hands results back to the frame loop.
pub struct LightingAssistant {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    tx: Sender<Result<LightingSuggestion, AssistantError>>,
    rx: Receiver<Result<LightingSuggestion, AssistantError>>,
    pending: bool,
}

impl LightingAssistant {
    /// Reads endpoint configuration from the environment.
    pub fn from_env() -> Self {
        let endpoint = std::env::var("MAQUETTE_AI_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model =
            std::env::var("MAQUETTE_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let api_key = std::env::var("MAQUETTE_AI_KEY").ok().filter(|key| !key.is_empty());
        let (tx, rx) = channel();
        Self {
            endpoint,
            model,
            api_key,
            tx,
            rx,
            pending: false,
        }
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Kicks off a request on a worker thread. Rejected while an earlier
    /// request is still in flight.
    pub fn request(&mut self, description: &str) -> Result<(), AssistantError> {
        if self.pending {
            return Ok(());
        }
        let Some(api_key) = self.api_key.clone() else {
            return Err(AssistantError::MissingKey);
        };
        let endpoint = self.endpoint.clone();
        let model = self.model.clone();
        let description = description.to_string();
        let tx = self.tx.clone();
        self.pending = true;
        log::info!("Requesting lighting suggestion from {}", endpoint);

        std::thread::spawn(move || {
            let result = fetch_suggestion(&endpoint, &model, &api_key, &description);
            // The receiver only goes away on shutdown; nothing to do then.
            let _ = tx.send(result);
        });
        Ok(())
    }

    /// Polled once per frame; returns the finished result, if any.
    pub fn poll(&mut self) -> Option<Result<LightingSuggestion, AssistantError>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.pending = false;
                Some(result)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

fn fetch_suggestion(
    endpoint: &str,
    model: &str,
    api_key: &str,
    description: &str,
) -> Result<LightingSuggestion, AssistantError> {
    let body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": description },
        ],
        "temperature": 0.2,
    });
    let response: serde_json::Value = ureq::post(endpoint)
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .set("authorization", &format!("Bearer {}", api_key))
        .send_json(body)
        .map_err(Box::new)?
        .into_json()?;
    parse_response(&response)
}

/// Pulls the completion text out of the response envelope and parses the
/// schema JSON inside it.
fn parse_response(response: &serde_json::Value) -> Result<LightingSuggestion, AssistantError> {
    let content = response["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| AssistantError::Malformed("no completion content".to_string()))?;
    parse_suggestion(content)
}

fn parse_suggestion(content: &str) -> Result<LightingSuggestion, AssistantError> {
    // Models sometimes wrap the JSON in a code fence; strip it.
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let raw: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|err| AssistantError::Malformed(format!("not valid JSON: {}", err)))?;

    let number = |key: &str| -> Result<f32, AssistantError> {
        raw[key]
            .as_f64()
            .map(|value| value as f32)
            .ok_or_else(|| AssistantError::Malformed(format!("missing field '{}'", key)))
    };
    let direction = raw["direction"]
        .as_array()
        .filter(|values| values.len() == 3)
        .ok_or_else(|| AssistantError::Malformed("missing field 'direction'".to_string()))?
        .iter()
        .map(|value| value.as_f64().unwrap_or(0.0) as f32)
        .collect::<Vec<f32>>();

    Ok(clamp_suggestion(LightingSuggestion {
        ambient_intensity: number("ambient_intensity")?,
        directional_intensity: number("directional_intensity")?,
        direction: [direction[0], direction[1], direction[2]],
        shadow_bias: number("shadow_bias")?,
    }))
}

/// Keeps whatever the model said inside ranges the renderer can live with.
fn clamp_suggestion(mut suggestion: LightingSuggestion) -> LightingSuggestion {
    suggestion.ambient_intensity = sanitize(suggestion.ambient_intensity).clamp(0.0, 2.0);
    suggestion.directional_intensity =
        sanitize(suggestion.directional_intensity).clamp(0.0, 5.0);
    suggestion.shadow_bias = sanitize(suggestion.shadow_bias).clamp(0.0001, 0.01);

    let dir = glam::Vec3::new(
        sanitize(suggestion.direction[0]),
        sanitize(suggestion.direction[1]),
        sanitize(suggestion.direction[2]),
    );
    let dir = dir.normalize_or_zero();
    suggestion.direction = if dir == glam::Vec3::ZERO {
        [-0.4, -1.0, -0.3]
    } else {
        dir.to_array()
    };
    suggestion
}

fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_completion() {
        let response = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "{\"ambient_intensity\": 0.3, \
                        \"directional_intensity\": 2.0, \
                        \"direction\": [-0.5, -1.0, -0.2], \
                        \"shadow_bias\": 0.002}"
                }
            }]
        });
        let suggestion = parse_response(&response).unwrap();
        assert_eq!(suggestion.ambient_intensity, 0.3);
        assert_eq!(suggestion.directional_intensity, 2.0);
        assert_eq!(suggestion.shadow_bias, 0.002);
        // Direction comes back normalized.
        let len = suggestion
            .direction
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();
        assert!((len - 1.0).abs() < 1e-4);
    }

    #[test]
    fn strips_code_fences() {
        let content = "```json\n{\"ambient_intensity\": 0.5, \
            \"directional_intensity\": 1.0, \"direction\": [0.0, -1.0, 0.0], \
            \"shadow_bias\": 0.001}\n```";
        let suggestion = parse_suggestion(content).unwrap();
        assert_eq!(suggestion.ambient_intensity, 0.5);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let content = "{\"ambient_intensity\": 80.0, \
            \"directional_intensity\": -3.0, \"direction\": [0.0, -9.0, 0.0], \
            \"shadow_bias\": 5.0}";
        let suggestion = parse_suggestion(content).unwrap();
        assert_eq!(suggestion.ambient_intensity, 2.0);
        assert_eq!(suggestion.directional_intensity, 0.0);
        assert_eq!(suggestion.shadow_bias, 0.01);
        assert_eq!(suggestion.direction, [0.0, -1.0, 0.0]);
    }

    #[test]
    fn zero_direction_falls_back_to_the_default_sun() {
        let content = "{\"ambient_intensity\": 0.4, \
            \"directional_intensity\": 1.5, \"direction\": [0.0, 0.0, 0.0], \
            \"shadow_bias\": 0.001}";
        let suggestion = parse_suggestion(content).unwrap();
        assert_eq!(suggestion.direction, [-0.4, -1.0, -0.3]);
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        assert!(matches!(
            parse_suggestion("the sun should be warm"),
            Err(AssistantError::Malformed(_))
        ));
        assert!(matches!(
            parse_suggestion("{\"ambient_intensity\": 0.4}"),
            Err(AssistantError::Malformed(_))
        ));
        let response = serde_json::json!({ "choices": [] });
        assert!(matches!(
            parse_response(&response),
            Err(AssistantError::Malformed(_))
        ));
    }
}
