//! Application state: the submission store and the scoring engine.
//!
//! This module owns:
//!   - the in-memory store, preloaded with config-bank and seed exercises
//!   - the scoring engine (metric providers + points weights)
//!
//! Per-student practice sessions are not kept here; each WebSocket
//! connection owns its own `SessionBook`.

use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};

use crate::config::{load_config_from_env, MetricsCfg, TrainerConfig};
use crate::domain::ExerciseSource;
use crate::embedding::EmbeddingClient;
use crate::engine::metrics::{Capability, MetricAdapter};
use crate::engine::Engine;
use crate::seeds::{exercise_from_cfg, seed_exercises};
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub engine: Arc<Engine>,
}

impl AppState {
    /// Build state from env: load config, seed exercises, register metric providers.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        Self::from_parts(load_config_from_env().unwrap_or_default(), EmbeddingClient::from_env())
    }

    pub fn from_parts(cfg: TrainerConfig, embedding: Option<EmbeddingClient>) -> Self {
        // Config-bank exercises first so their ids win over built-in seeds.
        let mut exercises = Vec::new();
        for entry in &cfg.exercises {
            match exercise_from_cfg(entry) {
                Some(ex) => exercises.push(ex),
                None => warn!(target: "postedit", title = %entry.title, "Skipping bank exercise: missing source."),
            }
        }
        exercises.extend(seed_exercises());

        let mut inventory: HashMap<&'static str, usize> = HashMap::new();
        for ex in &exercises {
            let origin = match ex.origin {
                ExerciseSource::Seed => "seed",
                ExerciseSource::LocalBank => "local_bank",
                ExerciseSource::Instructor => "instructor",
            };
            *inventory.entry(origin).or_default() += 1;
        }
        for (origin, count) in &inventory {
            info!(target: "postedit", %origin, count, "Startup exercise inventory");
        }

        let adapter = build_adapter(&cfg.metrics, embedding);
        let engine = Engine::new(adapter, cfg.scoring.weights.clone(), cfg.scoring.max_examples);

        Self {
            store: Store::with_exercises(exercises),
            engine: Arc::new(engine),
        }
    }
}

/// Register the lexical providers enabled in config, plus embedding
/// similarity when a client is available.
pub fn build_adapter(metrics: &MetricsCfg, embedding: Option<EmbeddingClient>) -> MetricAdapter {
    let mut adapter = MetricAdapter::lexical();
    for (enabled, cap) in [
        (metrics.bleu, Capability::NgramPrecision),
        (metrics.chrf, Capability::CharNgram),
        (metrics.ter, Capability::EditRate),
    ] {
        if !enabled {
            adapter.unregister(cap);
        }
    }

    match embedding {
        Some(client) if metrics.embedding => {
            info!(target: "postedit", base_url = %client.base_url, model = %client.model, "Embedding similarity enabled.");
            adapter.register(Box::new(client));
        }
        Some(_) => info!(target: "postedit", "Embedding similarity disabled in config."),
        None => info!(target: "postedit", "Embedding similarity disabled (no EMBEDDING_API_KEY / OPENAI_API_KEY). BERT_F1 will be empty."),
    }

    info!(target: "postedit", capabilities = ?adapter.capabilities(), "Metric providers registered");
    adapter
}
