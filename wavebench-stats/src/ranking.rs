//! Relative Ranking
//!
//! Orders competitors ascending by a time metric and expresses each one as a
//! multiple of the fastest ("Nx slower"). Ties are broken by key so the order
//! never depends on input order or timing noise.

/// Times at or below this floor (1 ns, in ms) are treated as the floor when
/// computing factors, so sub-resolution means never divide by zero.
pub const MIN_RESOLVABLE_MS: f64 = 1e-6;

/// Position of one competitor within a group
#[derive(Debug, Clone, PartialEq)]
pub struct RankPosition<K> {
    /// Competitor identity (usually the library name)
    pub key: K,
    /// The metric that was ranked
    pub value: f64,
    /// 1-based rank; a total order over the group
    pub rank: usize,
    /// `value / fastest value`; exactly 1.0 for the fastest entry
    pub relative_factor: f64,
}

/// Rank entries ascending by value, ties broken by key
pub fn rank_ascending<K, I>(entries: I) -> Vec<RankPosition<K>>
where
    K: Ord,
    I: IntoIterator<Item = (K, f64)>,
{
    let mut sorted: Vec<(K, f64)> = entries.into_iter().collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let baseline = sorted
        .first()
        .map(|entry| entry.1.max(MIN_RESOLVABLE_MS))
        .unwrap_or(MIN_RESOLVABLE_MS);

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, (key, value))| RankPosition {
            key,
            value,
            rank: index + 1,
            relative_factor: value.max(MIN_RESOLVABLE_MS) / baseline,
        })
        .collect()
}
