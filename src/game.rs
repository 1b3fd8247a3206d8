//! Attacker/defender battlefield game.
//!
//! The attacker picks `attacker` battlefields, the defender picks `defender` battlefields,
//! and the attacker scores the value of every battlefield it attacks that is not defended.
use std::cmp::Ordering;
use std::collections::HashMap;

pub const MAX_BATTLEFIELDS: usize = 32;

/// A pure strategy: bit `i` set means battlefield `i` is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Strategy(pub u32);

impl Strategy {
    pub fn plays(self, i: usize) -> bool {
        self.0 >> i & 1 == 1
    }

    pub fn with(self, i: usize) -> Strategy {
        Strategy(self.0 | 1 << i)
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// one `0`/`1` character per battlefield, battlefield 0 first
    pub fn to_bits(self, n: usize) -> String {
        (0..n).map(|i| if self.plays(i) { '1' } else { '0' }).collect()
    }
}

/// A mixed strategy kept as play counts, as fictitious play accumulates them.
#[derive(Debug, Clone, Default)]
pub struct MixedStrategy {
    pub plays: HashMap<Strategy, u64>,
    pub size: u64,
}

impl MixedStrategy {
    pub fn add(&mut self, s: Strategy) {
        *self.plays.entry(s).or_insert(0) += 1;
        self.size += 1;
    }

    /// Every subset of `resources` out of `n` battlefields, once each.
    pub fn uniform(n: usize, resources: usize) -> MixedStrategy {
        let mut ms = MixedStrategy::default();
        for s in subsets(n, resources) {
            ms.add(s);
        }
        ms
    }

    pub fn probability(&self, s: Strategy) -> f64 {
        if self.size == 0 {
            return 0.;
        }
        self.plays.get(&s).copied().unwrap_or(0) as f64 / self.size as f64
    }

    /// probability that each battlefield is played
    pub fn battlefield_probabilities(&self, n: usize) -> Vec<f64> {
        let mut counts = vec![0u64; n];
        for (s, &c) in self.plays.iter() {
            for (i, count) in counts.iter_mut().enumerate() {
                if s.plays(i) {
                    *count += c;
                }
            }
        }
        counts
            .into_iter()
            .map(|c| {
                if self.size == 0 {
                    0.
                } else {
                    c as f64 / self.size as f64
                }
            })
            .collect()
    }

    /// (strategy, probability), most likely first; ties in strategy order
    pub fn distribution(&self) -> Vec<(Strategy, f64)> {
        let mut d: Vec<(Strategy, f64)> = self
            .plays
            .iter()
            .map(|(&s, &c)| (s, c as f64 / self.size as f64))
            .collect();
        d.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal).then(a.0.cmp(&b.0)));
        d
    }
}

/// All `k`-subsets of `n` battlefields in increasing bitmask order.
pub fn subsets(n: usize, k: usize) -> Vec<Strategy> {
    if k > n || n > MAX_BATTLEFIELDS {
        return Vec::new();
    }
    if k == 0 {
        return vec![Strategy(0)];
    }
    let limit: u64 = 1 << n;
    let mut v: u64 = (1 << k) - 1;
    let mut out = Vec::new();
    while v < limit {
        out.push(Strategy(v as u32));
        // next bigger integer with the same number of bits set
        let c = v & v.wrapping_neg();
        let r = v + c;
        v = (((r ^ v) >> 2) / c) | r;
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub values: Vec<u32>,
    pub attacker: usize,
    pub defender: usize,
}

impl Game {
    pub fn battlefields(&self) -> usize {
        self.values.len()
    }

    /// attacker payoff of two pure strategies
    pub fn payoff(&self, sa: Strategy, sd: Strategy) -> f64 {
        self.values
            .iter()
            .enumerate()
            .filter(|&(i, _)| sa.plays(i) && !sd.plays(i))
            .map(|(_, &v)| v as f64)
            .sum()
    }

    /// Expected attacker payoff of two independent mixed strategies,
    /// from the per battlefield marginals.
    pub fn expected_payoff(&self, msa: &MixedStrategy, msd: &MixedStrategy) -> f64 {
        let n = self.battlefields();
        let attacked = msa.battlefield_probabilities(n);
        let defended = msd.battlefield_probabilities(n);
        self.values
            .iter()
            .zip(attacked.iter().zip(defended.iter()))
            .map(|(&v, (&pa, &pd))| v as f64 * pa * (1. - pd))
            .sum()
    }

    /// Attack the battlefields with the largest expected undefended value,
    /// the highest index among equal ones.
    pub fn best_response_attacker(&self, msd: &MixedStrategy) -> (f64, Strategy) {
        let defended = msd.battlefield_probabilities(self.battlefields());
        let scores: Vec<f64> = self
            .values
            .iter()
            .zip(defended.iter())
            .map(|(&v, &pd)| v as f64 * (1. - pd))
            .collect();
        let ranked = rank_descending(&scores, true);
        let mut expected = 0.;
        let mut response = Strategy::default();
        for &i in ranked.iter().take(self.attacker) {
            response = response.with(i);
            expected += scores[i];
        }
        (expected, response)
    }

    /// Defend the battlefields with the largest expected attacked value,
    /// the lowest index among equal ones.
    /// The returned payoff is what the attacker still expects to score.
    pub fn best_response_defender(&self, msa: &MixedStrategy) -> (f64, Strategy) {
        let attacked = msa.battlefield_probabilities(self.battlefields());
        let scores: Vec<f64> = self
            .values
            .iter()
            .zip(attacked.iter())
            .map(|(&v, &pa)| v as f64 * pa)
            .collect();
        let ranked = rank_descending(&scores, false);
        let mut response = Strategy::default();
        for &i in ranked.iter().take(self.defender) {
            response = response.with(i);
        }
        let expected = ranked.iter().skip(self.defender).map(|&i| scores[i]).sum();
        (expected, response)
    }

    /// How far either player could gain by deviating; 0 at equilibrium.
    pub fn epsilon(&self, msa: &MixedStrategy, msd: &MixedStrategy) -> f64 {
        let current = self.expected_payoff(msa, msd);
        let (best_attacker, _) = self.best_response_attacker(msd);
        let (best_defender, _) = self.best_response_defender(msa);
        exploitability(current, best_attacker, best_defender)
    }
}

pub fn exploitability(current: f64, best_attacker: f64, best_defender: f64) -> f64 {
    0f64.max(best_attacker - current).max(current - best_defender)
}

/// battlefield indices by score, highest first;
/// equal scores go highest index first when `high_index_first`, lowest index first otherwise
fn rank_descending(scores: &[f64], high_index_first: bool) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| {
        let by_index = if high_index_first { b.cmp(&a) } else { a.cmp(&b) };
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then(by_index)
    });
    idx
}
