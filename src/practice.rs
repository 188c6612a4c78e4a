//! Follow-up drills generated from a scored submission.
//!
//! Drills only quote the student's own text, never the hidden reference.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::engine::classify::EditExamples;
use crate::engine::tokenize::tokenize;

const BLANK: &str = "____";
const MAX_COLLOCATIONS: usize = 3;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Drills {
  pub exercises: Vec<String>,
  pub collocations: Vec<String>,
}

pub fn build_drills<R: Rng + ?Sized>(examples: &EditExamples, text: &str, rng: &mut R) -> Drills {
  let mut exercises: Vec<String> = examples
    .replace
    .iter()
    .map(|(_, hyp)| format!("Correct this: '{hyp}'"))
    .chain(examples.insert.iter().map(|hyp| format!("Is this needed? '{hyp}'")))
    .collect();
  if !examples.delete.is_empty() {
    exercises.push(format!("Something is missing: {} passage(s) of the reference have no counterpart.", examples.delete.len()));
  }
  if let Some(blank) = fill_in_the_blanks(text, rng) {
    exercises.push(format!("Fill in the blanks: {blank}"));
  }
  if exercises.is_empty() {
    exercises.push("Rewrite the translation.".into());
  }

  Drills { exercises, collocations: collocations(text) }
}

/// Mask every occurrence of two randomly chosen words. Needs more than four words.
pub fn fill_in_the_blanks<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Option<String> {
  let words = tokenize(Some(text));
  if words.len() <= 4 {
    return None;
  }
  let picked: Vec<&str> = words.choose_multiple(rng, 2).copied().collect();
  let masked: Vec<&str> = words.iter().map(|w| if picked.contains(w) { BLANK } else { *w }).collect();
  Some(masked.join(" "))
}

/// The first few adjacent word pairs.
pub fn collocations(text: &str) -> Vec<String> {
  tokenize(Some(text))
    .windows(2)
    .take(MAX_COLLOCATIONS)
    .map(|pair| pair.join(" "))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  #[test]
  fn short_text_without_edits_asks_for_rewrite() {
    let mut rng = StdRng::seed_from_u64(7);
    let drills = build_drills(&EditExamples::default(), "just three words", &mut rng);
    assert_eq!(drills.exercises, vec!["Rewrite the translation."]);
    assert_eq!(drills.collocations, vec!["just three", "three words"]);
  }

  #[test]
  fn edits_become_drills() {
    let mut rng = StdRng::seed_from_u64(7);
    let examples = EditExamples {
      insert: vec!["very".into()],
      delete: vec!["the".into()],
      replace: vec![("cat".into(), "dog".into())],
    };
    let drills = build_drills(&examples, "a dog", &mut rng);
    assert_eq!(drills.exercises[0], "Correct this: 'dog'");
    assert_eq!(drills.exercises[1], "Is this needed? 'very'");
    assert!(drills.exercises[2].starts_with("Something is missing: 1"));
    assert!(drills.exercises.iter().all(|e| !e.contains("cat")));
  }

  #[test]
  fn blanks_mask_two_words() {
    let mut rng = StdRng::seed_from_u64(42);
    let text = "one two three four five six";
    let masked = fill_in_the_blanks(text, &mut rng).unwrap();
    let tokens: Vec<&str> = masked.split(' ').collect();
    assert_eq!(tokens.len(), 6);
    assert_eq!(tokens.iter().filter(|t| **t == BLANK).count(), 2);
    assert!(fill_in_the_blanks("too short for it", &mut rng).is_none());
  }

  #[test]
  fn collocations_take_first_three_bigrams() {
    assert_eq!(collocations("a b c d e"), vec!["a b", "b c", "c d"]);
    assert!(collocations("alone").is_empty());
  }
}
