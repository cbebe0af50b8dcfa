use fastrand::Rng;

use crate::{card_ids, CardId};

pub fn make_rng(seed: Option<u64>) -> Rng {
  match seed {
    Some(seed) => Rng::with_seed(seed),
    None => Rng::new(),
  }
}

pub fn shuffle_deck<T>(ids: &mut [T], rng: &mut Rng) {
  for i in (1..ids.len()).rev() {
    let j = rng.usize(..=i);
    ids.swap(i, j);
  }
}

pub fn shuffled_ids(rng: &mut Rng) -> Vec<CardId> {
  let mut ids = card_ids();
  shuffle_deck(&mut ids, rng);
  ids
}
