//! # adaptive-index-engine
//!
//! 分块列存表上的自适应二级索引：索引不在写入时一次建好，而是随等值查询逐步构建、
//! 组合与合并，每一步都受“节省账本”约束，单次查询只承担一小块建索引的开销。
//!
//! ## 整体架构
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  scan(table, decision, projection, predicate)                │
//! │    ├─ 有索引：probe → scan_file(命中文件) → 跳过覆盖范围       │
//! │    │          savings += savings_per_index_use                │
//! │    │          decision.accept(savings) → Table::grow_index    │
//! │    └─ 无索引：min/max 剪枝 → scan_file                        │
//! │               无命中且 decision.accept(savings) → 建 Leaf     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Table ─ CostModel / savings                                 │
//! │    └─ File × N                                               │
//! │         └─ ColumnChunk × num_columns (values, min, max)      │
//! │               └─ Option<IndexHandle>  ← 同一桶内共享          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Index                                                       │
//! │    Leaf ──combine──▶ Merging ──merge_some × k──▶ Completed   │
//! │    跨度：1 → 2 → 4 → …，按跨度对齐                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod common;
pub mod cost;
pub mod index;
pub mod table;
pub mod grower;
pub mod decision;
pub mod scan;

pub use common::{AdaptiveError, ColumnId, FileId, IndexInvariant, Result, ScanStats, Value};
pub use cost::CostModel;
pub use decision::{AlwaysAccept, DecisionSource, NeverAccept, RandomDecision, ScriptedDecision};
pub use index::{Index, IndexEntry, IndexHandle};
pub use scan::{scan, scan_file, scan_unindexed, CountProjection, EqualityPredicate, Projection, SumProjection};
pub use table::{ColumnChunk, File, Table};
