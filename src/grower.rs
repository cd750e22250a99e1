//! 自适应索引增长（growIndex）
//!
//! 以桶为单位递归增长：桶大小 = 当前索引跨度 × FAN_OUT，桶起点按桶大小对齐。
//! 每次调用只做一个单位的工作：
//!   1. 当前索引仍在合并 → 推进一步合并
//!   2. 桶内某个邻居没有索引 → 为它建 Leaf
//!   3. 邻居跨度不足 → 递归增长邻居
//!   4. 桶内所有索引跨度一致 → 组合成新的合并索引并安装到整个桶
//!
//! 跨度始终是 2 的幂并按自身大小对齐；表尾凑不满一个桶的部分保持不组合。

use tracing::{debug, trace};

use crate::common::{ColumnId, FileId, IndexInvariant, ScanStats};
use crate::index::IndexHandle;
use crate::table::Table;

pub const FAN_OUT: usize = 2;

impl Table {
    /// 在 `(file_id, col_id)` 处投入一个单位的索引工作，返回是否有进展
    ///
    /// # Panics
    /// 桶内邻居的跨度大于当前索引跨度时（索引结构已损坏）。
    pub fn grow_index(&mut self, file_id: FileId, col_id: ColumnId, stats: &mut ScanStats) -> bool {
        let Some(index) = self.index_at(file_id, col_id) else {
            self.build_leaf(file_id, col_id);
            stats.indexes_created += 1;
            return true;
        };

        if index.merge_some() {
            self.savings -= self.cost_model.cost_for_index_grow;
            stats.indexes_merged += 1;
            return true;
        }

        let index_size   = index.num_files_spanned();
        let index_start  = index.first_file();
        let bucket_size  = index_size * FAN_OUT;
        let bucket_start = file_id / bucket_size * bucket_size;
        let bucket_end   = (bucket_start + bucket_size).min(self.file_count());
        if bucket_start == index_start && bucket_end == bucket_start + index_size {
            trace!(file_id, col_id, index_size, "index reached end of table");
            return false;
        }

        let mut blocked = false;
        for i in (bucket_start..bucket_end).step_by(index_size) {
            if i == index_start {
                continue;
            }
            let Some(neighbor) = self.index_at(i, col_id) else {
                self.build_leaf(i, col_id);
                stats.indexes_created += 1;
                return true;
            };
            let neighbor_span = neighbor.num_files_spanned();
            if neighbor_span < index_size {
                if self.grow_index(i, col_id, stats) {
                    return true;
                }
                // 邻居已抵达表尾，无法再长
                blocked = true;
            } else if neighbor_span > index_size {
                panic!("{}", IndexInvariant::OversizedNeighbor {
                    file_id:       i,
                    neighbor_span,
                    expected_span: index_size,
                    bucket_start,
                    bucket_end,
                });
            }
        }
        if blocked {
            return false;
        }

        let siblings: Vec<IndexHandle> = (bucket_start..bucket_end)
            .step_by(index_size)
            .filter_map(|i| self.index_at(i, col_id))
            .collect();
        debug_assert_eq!(siblings.len(), FAN_OUT);

        let combined = IndexHandle::combine(&siblings[0], &siblings[1]);
        stats.indexes_combined += 1;
        for i in bucket_start..bucket_end {
            self.chunk_mut(i, col_id).index = Some(combined.clone());
        }
        debug!(col_id, bucket_start, bucket_end, "installed combined index");

        if combined.merge_some() {
            self.savings -= self.cost_model.cost_for_index_grow;
            stats.indexes_merged += 1;
        }
        true
    }
}
