use std::time::Duration;

/// Elapsed play time, advanced by explicit ticks from whoever hosts the game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameClock {
  elapsed: Duration,
  running: bool,
}

impl GameClock {
  pub fn started() -> Self {
    Self {
      elapsed: Duration::ZERO,
      running: true,
    }
  }

  pub fn advance(&mut self, by: Duration) {
    if self.running {
      self.elapsed = self.elapsed.saturating_add(by);
    }
  }

  pub fn stop(&mut self) {
    self.running = false;
  }

  pub fn reset(&mut self) {
    *self = Self::started();
  }

  pub fn elapsed(&self) -> Duration {
    self.elapsed
  }

  pub fn elapsed_ms(&self) -> u128 {
    self.elapsed.as_millis()
  }
}
