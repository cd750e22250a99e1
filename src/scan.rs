//! 扫描引擎
//!
//! 每次查询按文件顺序推进：
//! - 有索引：probe → 对命中的文件做 scan_file → 跳过索引覆盖的范围 → 记入节省额度，
//!   再由决策源决定是否继续增长索引
//! - 无索引：min/max 剪枝 → 全量 scan_file；一无所获时由决策源决定是否建 Leaf 索引

use tracing::trace;

use crate::common::{ColumnId, FileId, Result, ScanStats, Value};
use crate::decision::DecisionSource;
use crate::table::{ColumnChunk, File, Table};

// ── 谓词 ──────────────────────────────────────────────────────────────────────

/// `col = value` 等值谓词
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqualityPredicate {
    pub col_id:       ColumnId,
    pub equals_value: Value,
}

impl EqualityPredicate {
    pub fn new(col_id: ColumnId, equals_value: Value) -> Self {
        Self { col_id, equals_value }
    }

    pub fn matches(&self, v: Value) -> bool {
        v == self.equals_value
    }

    pub fn intersects_range(&self, min: Value, max: Value) -> bool {
        min <= self.equals_value && self.equals_value <= max
    }

    pub fn intersects_chunk(&self, chunk: &ColumnChunk) -> bool {
        self.intersects_range(chunk.min(), chunk.max())
    }
}

// ── 投影 ──────────────────────────────────────────────────────────────────────

/// 对每个命中行调用一次 `apply`，同时承载本次扫描的统计
pub trait Projection {
    fn stats(&mut self) -> &mut ScanStats;
    fn apply(&mut self, file: &File, row: usize);
}

/// 对命中行的若干列求和
#[derive(Debug, Clone, Default)]
pub struct SumProjection {
    pub stats:   ScanStats,
    pub columns: Vec<ColumnId>,
    pub sums:    Vec<Value>,
}

impl SumProjection {
    pub fn new(columns: Vec<ColumnId>) -> Self {
        let sums = vec![0; columns.len()];
        Self { stats: ScanStats::default(), columns, sums }
    }
}

impl Projection for SumProjection {
    fn stats(&mut self) -> &mut ScanStats { &mut self.stats }

    fn apply(&mut self, file: &File, row: usize) {
        for (sum, &col) in self.sums.iter_mut().zip(&self.columns) {
            *sum = sum.wrapping_add(file.column(col).values()[row]);
        }
    }
}

/// 统计命中行数
#[derive(Debug, Clone, Default)]
pub struct CountProjection {
    pub stats: ScanStats,
    pub rows:  usize,
}

impl Projection for CountProjection {
    fn stats(&mut self) -> &mut ScanStats { &mut self.stats }

    fn apply(&mut self, _file: &File, _row: usize) {
        self.rows += 1;
    }
}

// ── 扫描 ──────────────────────────────────────────────────────────────────────

/// 线性扫描一个文件的谓词列，返回是否有命中行
pub fn scan_file<P: Projection + ?Sized>(
    table:      &Table,
    file_id:    FileId,
    projection: &mut P,
    predicate:  &EqualityPredicate,
) -> bool {
    let file = table.file(file_id);
    let mut hits = 0usize;
    for (row, &v) in file.column(predicate.col_id).values().iter().enumerate() {
        if predicate.matches(v) {
            hits += 1;
            projection.apply(file, row);
        }
    }

    let stats = projection.stats();
    stats.cost += 1;
    stats.row_groups_scanned += 1;
    if hits > 0 {
        stats.row_groups_matched += 1;
    }
    hits > 0
}

/// 执行一次自适应扫描。扫描开始时账本重置为 `file_count × base_quota_per_file`。
pub fn scan<D, P>(
    table:      &mut Table,
    decision:   &mut D,
    projection: &mut P,
    predicate:  &EqualityPredicate,
) -> Result<()>
where
    D: DecisionSource + ?Sized,
    P: Projection + ?Sized,
{
    table.check_column(predicate.col_id)?;
    let col_id = predicate.col_id;
    table.savings = table.cost_model.quota_for(table.file_count());
    trace!(col_id, value = predicate.equals_value, savings = table.savings, "scan started");

    let mut r = 0;
    while r < table.file_count() {
        if let Some(index) = table.index_at(r, col_id) {
            let hits = index.probe(predicate.equals_value);
            projection.stats().cost += 1;
            // 游标之前的文件本次已处理过（索引可能在扫描途中向左组合）
            for fid in hits.into_iter().filter(|&fid| fid >= r) {
                scan_file(table, fid, projection, predicate);
            }
            r = index.last_file();
            table.savings += table.cost_model.savings_per_index_use;

            if decision.accept(table.savings) {
                table.grow_index(r, col_id, projection.stats());
            }
        } else if predicate.intersects_chunk(table.chunk(r, col_id))
            && !scan_file(table, r, projection, predicate)
            && decision.accept(table.savings)
        {
            table.build_leaf(r, col_id);
            projection.stats().indexes_created += 1;
        }
        r += 1;
    }

    trace!(col_id, savings = table.savings, "scan finished");
    Ok(())
}

/// 不使用也不创建索引的基线扫描，只做 min/max 剪枝；账本不变
pub fn scan_unindexed<P: Projection + ?Sized>(
    table:      &Table,
    projection: &mut P,
    predicate:  &EqualityPredicate,
) -> Result<()> {
    table.check_column(predicate.col_id)?;
    for r in 0..table.file_count() {
        if predicate.intersects_chunk(table.chunk(r, predicate.col_id)) {
            scan_file(table, r, projection, predicate);
        }
    }
    Ok(())
}
