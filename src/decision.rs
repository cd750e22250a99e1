//! 决策源：根据当前节省额度决定是否投入索引工作
//!
//! 随机决策源在整个运行期间只维护一条随机流，不按查询重置；
//! 同样的种子、同样的调用顺序得到同样的决策序列。

use std::collections::VecDeque;

use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::SeedableRng;

pub const DEFAULT_SEED: u64 = 1337;

pub trait DecisionSource {
    /// `savings` 为当前账本余额；返回 true 表示投入
    fn accept(&mut self, savings: i64) -> bool;
}

impl<F: FnMut(i64) -> bool> DecisionSource for F {
    fn accept(&mut self, savings: i64) -> bool {
        self(savings)
    }
}

// ── RandomDecision ────────────────────────────────────────────────────────────

/// 从 `[0, max]` 均匀抽样，抽样值严格小于 savings 时接受
#[derive(Debug, Clone)]
pub struct RandomDecision {
    rng:  SmallRng,
    dist: Uniform<i64>,
}

impl RandomDecision {
    /// # Panics
    /// `max < 0` 时。
    pub fn new(max: i64) -> Self {
        Self::with_seed(max, DEFAULT_SEED)
    }

    pub fn with_seed(max: i64, seed: u64) -> Self {
        Self {
            rng:  SmallRng::seed_from_u64(seed),
            dist: Uniform::new_inclusive(0, max),
        }
    }

    /// 直接取一个抽样值（同一条随机流）
    pub fn next_value(&mut self) -> i64 {
        self.dist.sample(&mut self.rng)
    }
}

impl DecisionSource for RandomDecision {
    fn accept(&mut self, savings: i64) -> bool {
        self.next_value() < savings
    }
}

// ── 确定性决策源 ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAccept;

impl DecisionSource for AlwaysAccept {
    fn accept(&mut self, _savings: i64) -> bool { true }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NeverAccept;

impl DecisionSource for NeverAccept {
    fn accept(&mut self, _savings: i64) -> bool { false }
}

/// 按脚本依次回答；脚本耗尽后一律拒绝。记录每次被询问时的 savings。
#[derive(Debug, Default, Clone)]
pub struct ScriptedDecision {
    answers: VecDeque<bool>,
    pub seen: Vec<i64>,
}

impl ScriptedDecision {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self { answers: answers.into_iter().collect(), seen: Vec::new() }
    }

    pub fn consulted(&self) -> usize { self.seen.len() }
}

impl DecisionSource for ScriptedDecision {
    fn accept(&mut self, savings: i64) -> bool {
        self.seen.push(savings);
        self.answers.pop_front().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_never_accepts_non_positive_savings() {
        let mut d = RandomDecision::new(1000);
        for _ in 0..1000 {
            assert!(!d.accept(0));
            assert!(!d.accept(-5));
        }
    }

    #[test]
    fn random_saturates_above_range() {
        let mut d = RandomDecision::new(1000);
        for _ in 0..1000 {
            assert!(d.accept(1001));
        }
    }

    #[test]
    fn random_stream_is_reproducible() {
        let mut a = RandomDecision::with_seed(1_000_000, 9);
        let mut b = RandomDecision::with_seed(1_000_000, 9);
        let xs: Vec<bool> = (0..64).map(|_| a.accept(500_000)).collect();
        let ys: Vec<bool> = (0..64).map(|_| b.accept(500_000)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().any(|&x| x) && xs.iter().any(|&x| !x));
    }

    #[test]
    fn random_values_stay_in_range() {
        let mut d = RandomDecision::new(10);
        assert!((0..500).map(|_| d.next_value()).all(|v| (0..=10).contains(&v)));
    }

    #[test]
    fn scripted_answers_then_rejects() {
        let mut d = ScriptedDecision::new([true, false]);
        assert!(d.accept(1));
        assert!(!d.accept(2));
        assert!(!d.accept(3));
        assert_eq!(d.seen, vec![1, 2, 3]);
        assert_eq!(d.consulted(), 3);
    }

    #[test]
    fn closures_are_decision_sources() {
        let mut threshold = |s: i64| s > 10;
        assert!(threshold.accept(11));
        assert!(!threshold.accept(10));
        assert!(AlwaysAccept.accept(i64::MIN));
        assert!(!NeverAccept.accept(i64::MAX));
    }
}
