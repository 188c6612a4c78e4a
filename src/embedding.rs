//! Minimal client for an OpenAI-compatible `/embeddings` endpoint, used as
//! the embedding-similarity metric provider (reported as `BERT_F1`).
//!
//! The score is 100 × cosine similarity of the two embeddings, clamped to
//! [0, 100]. Calls are instrumented and log model names, latencies and
//! input sizes (never the texts or the API key).

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::engine::metrics::{Capability, MetricProvider, ProviderError, ProviderFuture};

#[derive(Clone)]
pub struct EmbeddingClient {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  input: [&'a str; 2],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
  #[serde(default)]
  index: usize,
  embedding: Vec<f64>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
  error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
  message: String,
}

fn extract_api_error(body: &str) -> Option<String> {
  serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error.message)
}

impl EmbeddingClient {
  /// Construct the client if we find EMBEDDING_API_KEY (or OPENAI_API_KEY); otherwise None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("EMBEDDING_API_KEY")
      .or_else(|_| std::env::var("OPENAI_API_KEY"))
      .ok()
      .filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("EMBEDDING_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model =
      std::env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  /// Embed hypothesis and reference in one request.
  #[instrument(level = "info", skip(self, hypothesis, reference), fields(model = %self.model, hyp_len = hypothesis.len(), ref_len = reference.len()))]
  async fn embed_pair(&self, hypothesis: &str, reference: &str) -> Result<(Vec<f64>, Vec<f64>), ProviderError> {
    let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
    let req = EmbeddingRequest { model: &self.model, input: [hypothesis, reference] };
    let start = Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "postedit-trainer/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| ProviderError::Remote(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_api_error(&body).unwrap_or(body);
      error!(target: "scoring", %status, elapsed = ?start.elapsed(), "Embedding request rejected");
      return Err(ProviderError::Remote(format!("HTTP {status}: {msg}")));
    }

    let body: EmbeddingResponse = res.json().await.map_err(|e| ProviderError::Remote(e.to_string()))?;
    info!(target: "scoring", elapsed = ?start.elapsed(), items = body.data.len(), "Embeddings received");
    split_pair(body.data)
  }
}

fn split_pair(mut data: Vec<EmbeddingDatum>) -> Result<(Vec<f64>, Vec<f64>), ProviderError> {
  if data.len() != 2 {
    return Err(ProviderError::Computation(format!("expected 2 embeddings, got {}", data.len())));
  }
  data.sort_by_key(|d| d.index);
  let reference = data.pop().map(|d| d.embedding).unwrap_or_default();
  let hypothesis = data.pop().map(|d| d.embedding).unwrap_or_default();
  Ok((hypothesis, reference))
}

/// Cosine similarity of two equally sized, non-zero vectors.
pub fn cosine(a: &[f64], b: &[f64]) -> Result<f64, ProviderError> {
  if a.len() != b.len() || a.is_empty() {
    return Err(ProviderError::Computation(format!("embedding size mismatch: {} vs {}", a.len(), b.len())));
  }
  let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
  let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
  let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
  if na == 0.0 || nb == 0.0 {
    return Err(ProviderError::Computation("zero-norm embedding".into()));
  }
  Ok(dot / (na * nb))
}

/// `100 × cosine`, clamped to [0, 100].
pub fn similarity_score(hypothesis: &[f64], reference: &[f64]) -> Result<f64, ProviderError> {
  Ok((cosine(hypothesis, reference)? * 100.0).clamp(0.0, 100.0))
}

impl MetricProvider for EmbeddingClient {
  fn capability(&self) -> Capability { Capability::EmbeddingSimilarity }

  fn compute<'a>(&'a self, hypothesis: &'a str, reference: &'a str) -> ProviderFuture<'a> {
    Box::pin(async move {
      if hypothesis.trim().is_empty() {
        return Err(ProviderError::EmptyInput);
      }
      let (h, r) = self.embed_pair(hypothesis, reference).await?;
      similarity_score(&h, &r)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cosine_basics() {
    assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]).unwrap() - 1.0).abs() < 1e-12);
    assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < 1e-12);
    assert!(cosine(&[0.0, 0.0], &[1.0, 0.0]).is_err());
    assert!(cosine(&[1.0], &[1.0, 2.0]).is_err());
  }

  #[test]
  fn score_is_clamped_percentage() {
    assert!((similarity_score(&[3.0, 4.0], &[3.0, 4.0]).unwrap() - 100.0).abs() < 1e-9);
    assert_eq!(similarity_score(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), 0.0);
  }

  #[test]
  fn response_pairs_follow_index_not_order() {
    let body = r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#;
    let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
    let (h, r) = split_pair(parsed.data).unwrap();
    assert_eq!(h, vec![1.0, 0.0]);
    assert_eq!(r, vec![0.0, 1.0]);

    let one: EmbeddingResponse = serde_json::from_str(r#"{"data":[{"embedding":[1.0]}]}"#).unwrap();
    assert!(split_pair(one.data).is_err());
  }

  #[test]
  fn api_error_message_is_extracted() {
    let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
    assert_eq!(extract_api_error(body).as_deref(), Some("Incorrect API key provided"));
    assert_eq!(extract_api_error("not json"), None);
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_a_provider_error() {
    let client = EmbeddingClient {
      client: reqwest::Client::new(),
      api_key: "test".into(),
      base_url: "http://127.0.0.1:9".into(),
      model: "m".into(),
    };
    let result = client.compute("hello there", "hello").await;
    assert!(matches!(result, Err(ProviderError::Remote(_))));
  }
}
