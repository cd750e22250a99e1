//! 分块列存表：Table → File（Row Group）→ ColumnChunk

use tracing::debug;

use crate::common::{AdaptiveError, ColumnId, FileId, Result, Value};
use crate::cost::CostModel;
use crate::index::IndexHandle;

// ── ColumnChunk ───────────────────────────────────────────────────────────────

/// 一个文件内一列的值，附带构造时算好的 min/max
///
/// 值与 min/max 构造后只读；索引只能由扫描引擎与增长器安装或替换。
#[derive(Debug)]
pub struct ColumnChunk {
    pub(crate) values: Vec<Value>,
    pub(crate) min:    Value,
    pub(crate) max:    Value,
    /// 覆盖本文件（可能还有相邻文件）的索引
    pub(crate) index:  Option<IndexHandle>,
}

impl ColumnChunk {
    pub fn new(values: Vec<Value>) -> Self {
        // 空 chunk：min > max，任何等值谓词都不会命中
        let min = values.iter().copied().min().unwrap_or(Value::MAX);
        let max = values.iter().copied().max().unwrap_or(Value::MIN);
        Self { values, min, max, index: None }
    }

    pub fn values(&self) -> &[Value] { &self.values }
    pub fn min(&self) -> Value { self.min }
    pub fn max(&self) -> Value { self.max }
    pub fn index(&self) -> Option<&IndexHandle> { self.index.as_ref() }
}

// ── File ──────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct File {
    pub(crate) column_chunks: Vec<ColumnChunk>,
}

impl File {
    pub fn column(&self, col_id: ColumnId) -> &ColumnChunk {
        &self.column_chunks[col_id]
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Table {
    pub cost_model:  CostModel,
    /// 节省账本，可以为负（未偿还的建索引开销）
    pub savings:     i64,
    pub num_columns: usize,
    pub chunk_size:  usize,
    pub(crate) files: Vec<File>,
}

impl Table {
    pub fn new(cost_model: CostModel, num_columns: usize, chunk_size: usize) -> Self {
        Self { cost_model, savings: 0, num_columns, chunk_size, files: Vec::new() }
    }

    /// 追加一个 Row Group，每列一组长度为 `chunk_size` 的值
    pub fn append_row_group(&mut self, columns: Vec<Vec<Value>>) -> Result<FileId> {
        if columns.len() != self.num_columns {
            return Err(AdaptiveError::ColumnCountMismatch {
                expected: self.num_columns,
                got:      columns.len(),
            });
        }
        if let Some((column, values)) = columns.iter()
            .enumerate()
            .find(|(_, v)| v.len() != self.chunk_size)
        {
            return Err(AdaptiveError::ChunkSizeMismatch {
                column,
                expected: self.chunk_size,
                got:      values.len(),
            });
        }

        let file_id = self.files.len();
        self.files.push(File {
            column_chunks: columns.into_iter().map(ColumnChunk::new).collect(),
        });
        Ok(file_id)
    }

    pub fn file_count(&self) -> usize { self.files.len() }

    pub fn file(&self, file_id: FileId) -> &File {
        &self.files[file_id]
    }

    pub fn chunk(&self, file_id: FileId, col_id: ColumnId) -> &ColumnChunk {
        &self.files[file_id].column_chunks[col_id]
    }

    pub(crate) fn chunk_mut(&mut self, file_id: FileId, col_id: ColumnId) -> &mut ColumnChunk {
        &mut self.files[file_id].column_chunks[col_id]
    }

    pub fn index_at(&self, file_id: FileId, col_id: ColumnId) -> Option<IndexHandle> {
        self.chunk(file_id, col_id).index.clone()
    }

    /// 该列有索引覆盖的文件数
    pub fn indexed_file_count(&self, col_id: ColumnId) -> usize {
        self.files.iter().filter(|f| f.column(col_id).index.is_some()).count()
    }

    pub(crate) fn check_column(&self, col_id: ColumnId) -> Result<()> {
        if col_id >= self.num_columns {
            return Err(AdaptiveError::ColumnOutOfRange { col_id, num_columns: self.num_columns });
        }
        Ok(())
    }

    /// 在 `(file_id, col_id)` 上建 Leaf 索引并扣除建索引代价，返回新句柄
    pub(crate) fn build_leaf(&mut self, file_id: FileId, col_id: ColumnId) -> IndexHandle {
        let chunk = self.chunk_mut(file_id, col_id);
        let handle = IndexHandle::leaf(&chunk.values, file_id);
        chunk.index = Some(handle.clone());
        self.savings -= self.cost_model.cost_for_index_build;
        debug!(file_id, col_id, savings = self.savings, "leaf index installed");
        handle
    }
}
