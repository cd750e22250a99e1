//! # adaptive-index-engine 演示
//!
//! 对若干个 base_quota 取值：
//!
//! 1. 生成一张两列的随机表
//! 2. 反复执行 `WHERE c1 = ?` 等值查询，值随机抽取
//! 3. 每个查询输出 `base_quota;query;elapsed_ms`
//!
//! `RUST_LOG=adaptive_index_engine=debug` 可查看索引的建立、组合与合并过程。

use std::time::Instant;

use adaptive_index_engine::{
    scan, CostModel, EqualityPredicate, RandomDecision, SumProjection, Table, Value,
};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

const NUM_FILES:   usize = 256;
const CHUNK_SIZE:  usize = 10_000;
const NUM_QUERIES: usize = 200;

/// 每列一个独立的随机流
struct ColumnGenerator {
    rng:  SmallRng,
    dist: Uniform<Value>,
}

impl ColumnGenerator {
    fn new(min: Value, max: Value, seed: u64) -> Self {
        Self { rng: SmallRng::seed_from_u64(seed), dist: Uniform::new_inclusive(min, max) }
    }

    fn chunk(&mut self, len: usize) -> Vec<Value> {
        (0..len).map(|_| self.dist.sample(&mut self.rng)).collect()
    }
}

fn main() -> adaptive_index_engine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    for base_quota in [0, 1, 4, 16, 64, 256] {
        let cost_model = CostModel::default().with_base_quota_per_file(base_quota);
        let mut table  = Table::new(cost_model, 2, CHUNK_SIZE);

        // 取值范围较窄，等值查询才有机会命中
        let mut c1 = ColumnGenerator::new(0, 1_000_000, 1337);
        let mut c2 = ColumnGenerator::new(0, 1_000_000_000, 1338);
        for _ in 0..NUM_FILES {
            table.append_row_group(vec![c1.chunk(CHUNK_SIZE), c2.chunk(CHUNK_SIZE)])?;
        }

        let mut decision = RandomDecision::new(1_000_000);
        let mut values   = RandomDecision::with_seed(1_000_000, 7);
        let mut total    = adaptive_index_engine::ScanStats::default();

        for query in 0..NUM_QUERIES {
            let predicate  = EqualityPredicate::new(0, values.next_value());
            let mut target = SumProjection::new(vec![0, 1]);

            let start = Instant::now();
            scan(&mut table, &mut decision, &mut target, &predicate)?;
            println!("{base_quota};{query};{}", start.elapsed().as_millis());

            total += target.stats;
        }

        println!(
            "# base_quota={base_quota} indexed_files={}/{} {total}",
            table.indexed_file_count(0),
            table.file_count(),
        );
    }
    Ok(())
}
