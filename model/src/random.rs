mod shuffled;

/// Shuffle any slice in place with Fisher–Yates.
pub use shuffled::shuffle_deck;
/// All 52 card ids in a fresh random order.
pub use shuffled::shuffled_ids;
/// Build the generator a game deals from.
pub use shuffled::make_rng;
