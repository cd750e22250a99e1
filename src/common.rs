//! 全局基础类型、扫描统计与错误定义

use thiserror::Error;

// ── 类型别名 ──────────────────────────────────────────────────────────────────

/// 列值：定宽有符号整数，只依赖有序与相等
pub type Value    = i64;
/// 文件（Row Group）在表中的位置
pub type FileId   = usize;
pub type ColumnId = usize;

// ── ScanStats ─────────────────────────────────────────────────────────────────

/// 单次扫描累计的统计量
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub row_groups_scanned: usize,
    pub row_groups_matched: usize,
    /// 代价单位：每次 scan_file 与每次索引 probe 各计 1
    pub cost:               usize,
    pub indexes_created:    usize,
    pub indexes_combined:   usize,
    pub indexes_merged:     usize,
}

impl std::ops::AddAssign for ScanStats {
    fn add_assign(&mut self, rhs: Self) {
        self.row_groups_scanned += rhs.row_groups_scanned;
        self.row_groups_matched += rhs.row_groups_matched;
        self.cost               += rhs.cost;
        self.indexes_created    += rhs.indexes_created;
        self.indexes_combined   += rhs.indexes_combined;
        self.indexes_merged     += rhs.indexes_merged;
    }
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "scanned={} matched={} cost={} created={} combined={} merged={}",
            self.row_groups_scanned, self.row_groups_matched, self.cost,
            self.indexes_created, self.indexes_combined, self.indexes_merged,
        )
    }
}

// ── 错误 ──────────────────────────────────────────────────────────────────────

/// 调用方可恢复的错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdaptiveError {
    #[error("row group has {got} columns, table has {expected}")]
    ColumnCountMismatch { expected: usize, got: usize },
    #[error("column {column} has {got} values, chunk size is {expected}")]
    ChunkSizeMismatch { column: ColumnId, expected: usize, got: usize },
    #[error("column out of range: col_id={col_id} num_columns={num_columns}")]
    ColumnOutOfRange { col_id: ColumnId, num_columns: usize },
}

/// 索引结构已损坏。只用于 panic 信息，绝不作为 Result 返回。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexInvariant {
    #[error(
        "neighbor index at file {file_id} spans {neighbor_span} files, \
         bucket [{bucket_start},{bucket_end}) expects at most {expected_span}"
    )]
    OversizedNeighbor {
        file_id:       FileId,
        neighbor_span: usize,
        expected_span: usize,
        bucket_start:  FileId,
        bucket_end:    FileId,
    },
}

pub type Result<T> = std::result::Result<T, AdaptiveError>;
