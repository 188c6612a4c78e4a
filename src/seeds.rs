//! Seed data so the trainer is usable without any config file.

use crate::config::ExerciseCfg;
use crate::domain::{Exercise, ExerciseSource};

fn seeded(id: &str, title: &str, source: &str, mt_output: &str, reference: &str) -> Exercise {
  let mut ex = Exercise::new(title, source, mt_output, reference, "seed", ExerciseSource::Seed);
  ex.id = id.into();
  ex
}

/// Minimal set of built-in exercises: one post-editing task with an MT
/// draft, one from-scratch translation.
pub fn seed_exercises() -> Vec<Exercise> {
  vec![
    seeded(
      "ex-weather",
      "Weather report",
      "Il fait très beau aujourd'hui, mais il pleuvra demain.",
      "It makes very beautiful today, but it will rain tomorrow.",
      "The weather is very nice today, but it will rain tomorrow.",
    ),
    seeded(
      "ex-library",
      "At the library",
      "La bibliothèque ferme à dix-huit heures le samedi.",
      "",
      "The library closes at six p.m. on Saturdays.",
    ),
  ]
}

/// Turn a config bank entry into an exercise. Entries with a blank source are skipped.
pub fn exercise_from_cfg(cfg: &ExerciseCfg) -> Option<Exercise> {
  if cfg.source.trim().is_empty() {
    return None;
  }
  let mut ex = Exercise::new(&cfg.title, &cfg.source, &cfg.mt_output, &cfg.reference, &cfg.created_by, ExerciseSource::LocalBank);
  if let Some(id) = cfg.id.as_deref().filter(|id| !id.trim().is_empty()) {
    ex.id = id.to_string();
  }
  Some(ex)
}
