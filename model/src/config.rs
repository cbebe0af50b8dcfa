use log::warn;
use serde::{Deserialize, Serialize};

/// Knobs for a [`Game`](crate::Game).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
  /// Seed for the deal generator. `None` seeds from entropy; `Some` makes
  /// every deal of the game reproducible.
  pub seed: Option<u64>,
}

impl GameConfig {
  pub const SEED_VAR: &'static str = "KLONDIKE_SEED";

  pub fn seeded(seed: u64) -> Self {
    Self { seed: Some(seed) }
  }

  /// Read the seed from `KLONDIKE_SEED`. A value that doesn't parse is
  /// ignored with a warning.
  pub fn from_env() -> Self {
    let seed = match std::env::var(Self::SEED_VAR) {
      Ok(raw) => match raw.trim().parse::<u64>() {
        Ok(seed) => Some(seed),
        Err(e) => {
          warn!("ignoring {}={:?}: {}", Self::SEED_VAR, raw, e);
          None
        }
      },
      Err(_) => None,
    };
    Self { seed }
  }
}
