//! 单列自适应索引
//!
//! 一个索引覆盖闭区间 `[first_file, last_file]`，有三种状态：
//! - **Leaf**      — 由单个文件的列值排序得到，构造后不可变
//! - **Merging**   — 由两个等跨度的兄弟索引组合而成，`entries` 只是最终结果的有序前缀，
//!                   其余部分仍留在两个兄弟的游标之后，由 `merge_some` 分批推进
//! - **Completed** — 两个游标都耗尽后释放兄弟句柄，行为与 Leaf 相同，只是跨多个文件
//!
//! 多个 ColumnChunk 共享同一个 `IndexHandle`，任何一处的 merge 对所有持有者可见。

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use tracing::debug;

use crate::common::{FileId, Value};

/// 每次 `merge_some` 最多比较的条目数
pub const MERGE_BUDGET: usize = 1_600_000;

// ── IndexEntry ────────────────────────────────────────────────────────────────

/// 先按 value、再按 file_id 排序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IndexEntry {
    pub value:   Value,
    pub file_id: FileId,
}

// ── 合并状态 ──────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct MergeInput {
    index: IndexHandle,
    /// 兄弟 `entries` 中尚未消费的第一个位置
    pos:   usize,
}

#[derive(Debug)]
struct PendingMerge {
    left:  MergeInput,
    right: MergeInput,
}

// ── Index ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Index {
    first_file: FileId,
    last_file:  FileId,
    entries:    Vec<IndexEntry>,
    pending:    Option<PendingMerge>,
}

impl Index {
    /// 由单个文件的列值构建 Leaf 索引
    pub fn build(values: &[Value], file_id: FileId) -> Self {
        let mut entries: Vec<IndexEntry> = values.iter()
            .map(|&value| IndexEntry { value, file_id })
            .collect();
        entries.sort_unstable();
        debug!(file_id, entries = entries.len(), "built leaf index");
        Self { first_file: file_id, last_file: file_id, entries, pending: None }
    }

    /// 组合两个相邻、等跨度的兄弟索引。只预留空间，不拷贝数据。
    pub fn combine(left: &IndexHandle, right: &IndexHandle) -> Self {
        let (first_file, left_len)  = { let l = left.borrow();  (l.first_file, l.len()) };
        let (last_file,  right_len) = { let r = right.borrow(); (r.last_file,  r.len()) };
        debug_assert!(first_file <= last_file);
        debug!(first_file, last_file, "combined indexes");
        Self {
            first_file,
            last_file,
            entries: Vec::with_capacity(left_len + right_len),
            pending: Some(PendingMerge {
                left:  MergeInput { index: left.clone(),  pos: 0 },
                right: MergeInput { index: right.clone(), pos: 0 },
            }),
        }
    }

    pub fn first_file(&self) -> FileId { self.first_file }
    pub fn last_file(&self)  -> FileId { self.last_file }
    pub fn num_files_spanned(&self) -> usize { self.last_file - self.first_file + 1 }

    /// 已合并（有序）前缀的长度；合并中的索引尚未计入兄弟游标之后的条目
    pub fn len(&self) -> usize { self.entries.len() }
    /// 已合并前缀是否为空，与 `len() == 0` 一致
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn is_merging(&self) -> bool { self.pending.is_some() }
    pub fn entries(&self) -> &[IndexEntry] { &self.entries }

    /// 返回包含 `value` 的文件 id，升序且去重
    pub fn probe(&self, value: Value) -> Vec<FileId> {
        let mut out = Vec::new();
        self.probe_from(0, value, &mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    /// 在 `entries[start..]` 上做 equal-range，合并中时再递归探查两个兄弟的未消费区域
    fn probe_from(&self, start: usize, value: Value, out: &mut Vec<FileId>) {
        let tail = &self.entries[start.min(self.entries.len())..];
        let lo = tail.partition_point(|e| e.value < value);
        let hi = lo + tail[lo..].partition_point(|e| e.value <= value);
        out.extend(tail[lo..hi].iter().map(|e| e.file_id));

        if let Some(pending) = &self.pending {
            for input in [&pending.left, &pending.right] {
                input.index.borrow().probe_from(input.pos, value, out);
            }
        }
    }

    /// 推进一步有界合并。未处于合并状态时返回 false。
    pub fn merge_some(&mut self) -> bool {
        self.merge_step(MERGE_BUDGET)
    }

    pub(crate) fn merge_step(&mut self, budget: usize) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        // 兄弟自身仍在合并时，其 entries 还不完整，先推进兄弟
        for input in [&pending.left, &pending.right] {
            if input.index.is_merging() {
                input.index.merge_step(budget);
                return true;
            }
        }
        let before = self.entries.len();

        let done = {
            let left  = pending.left.index.borrow();
            let right = pending.right.index.borrow();
            let (l, r)   = (&left.entries, &right.entries);
            let lp = &mut pending.left.pos;
            let rp = &mut pending.right.pos;

            let mut budget = budget;
            while budget > 0 && *lp < l.len() && *rp < r.len() {
                // 相等时先取左边，保证稳定
                if r[*rp] < l[*lp] {
                    self.entries.push(r[*rp]);
                    *rp += 1;
                } else {
                    self.entries.push(l[*lp]);
                    *lp += 1;
                }
                budget -= 1;
            }

            // 一侧耗尽后，另一侧剩余部分整体拷贝
            if *lp == l.len() {
                self.entries.extend_from_slice(&r[*rp..]);
                *rp = r.len();
            } else if *rp == r.len() {
                self.entries.extend_from_slice(&l[*lp..]);
                *lp = l.len();
            }
            *lp == l.len() && *rp == r.len()
        };

        if done {
            self.pending = None;
        }
        debug!(
            first_file = self.first_file,
            files      = self.num_files_spanned(),
            merged     = self.entries.len() - before,
            done,
            "merged index entries"
        );
        true
    }
}

// ── IndexHandle ───────────────────────────────────────────────────────────────

/// 共享、可原地修改的索引句柄
#[derive(Debug, Clone)]
pub struct IndexHandle(Rc<RefCell<Index>>);

impl IndexHandle {
    pub fn new(index: Index) -> Self {
        Self(Rc::new(RefCell::new(index)))
    }

    pub fn leaf(values: &[Value], file_id: FileId) -> Self {
        Self::new(Index::build(values, file_id))
    }

    pub fn combine(left: &IndexHandle, right: &IndexHandle) -> Self {
        Self::new(Index::combine(left, right))
    }

    pub fn borrow(&self) -> Ref<'_, Index> {
        self.0.borrow()
    }

    pub fn probe(&self, value: Value) -> Vec<FileId> {
        self.0.borrow().probe(value)
    }

    pub fn merge_some(&self) -> bool {
        self.0.borrow_mut().merge_some()
    }

    pub(crate) fn merge_step(&self, budget: usize) -> bool {
        self.0.borrow_mut().merge_step(budget)
    }

    pub fn first_file(&self) -> FileId { self.0.borrow().first_file }
    pub fn last_file(&self)  -> FileId { self.0.borrow().last_file }
    pub fn num_files_spanned(&self) -> usize { self.0.borrow().num_files_spanned() }
    pub fn is_merging(&self) -> bool { self.0.borrow().is_merging() }

    /// 两个句柄是否指向同一个索引对象
    pub fn same_as(&self, other: &IndexHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// 当前持有该索引的句柄数（ColumnChunk + 父索引的合并输入）
    #[cfg(test)]
    pub(crate) fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_chunk(rng: &mut SmallRng, len: usize, max: Value) -> Vec<Value> {
        (0..len).map(|_| rng.gen_range(0..=max)).collect()
    }

    fn brute_force(chunks: &[(FileId, Vec<Value>)], value: Value) -> Vec<FileId> {
        chunks.iter()
            .filter(|(_, values)| values.contains(&value))
            .map(|(fid, _)| *fid)
            .collect()
    }

    fn is_sorted(entries: &[IndexEntry]) -> bool {
        entries.windows(2).all(|w| w[0] <= w[1])
    }

    #[test]
    fn leaf_is_sorted_and_tagged() {
        let idx = Index::build(&[5, 1, 5, 2], 7);
        assert_eq!(idx.first_file(), 7);
        assert_eq!(idx.last_file(), 7);
        assert_eq!(idx.num_files_spanned(), 1);
        assert!(!idx.is_merging());
        let values: Vec<Value> = idx.entries().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![1, 2, 5, 5]);
        assert!(idx.entries().iter().all(|e| e.file_id == 7));
    }

    #[test]
    fn leaf_probe_reports_file_once() {
        let idx = Index::build(&[5, 1, 5, 2], 3);
        assert_eq!(idx.probe(5), vec![3]);
        assert_eq!(idx.probe(4), Vec::<FileId>::new());
    }

    #[test]
    fn empty_leaf_is_legal() {
        let mut idx = Index::build(&[], 0);
        assert!(idx.is_empty());
        assert!(idx.probe(1).is_empty());
        assert!(!idx.merge_some());
    }

    #[test]
    fn merge_some_on_leaf_is_noop() {
        let h = IndexHandle::leaf(&[3, 2, 1], 0);
        assert!(!h.merge_some());
        assert_eq!(h.borrow().len(), 3);
    }

    #[test]
    fn combine_copies_nothing_until_merged() {
        let a = IndexHandle::leaf(&[4, 2], 0);
        let b = IndexHandle::leaf(&[3, 1], 1);
        let c = IndexHandle::combine(&a, &b);
        assert_eq!(c.first_file(), 0);
        assert_eq!(c.last_file(), 1);
        assert_eq!(c.num_files_spanned(), 2);
        assert!(c.is_merging());
        assert_eq!(c.borrow().len(), 0);
        assert!(c.borrow().is_empty());
        assert_eq!(c.probe(3), vec![1]);
        assert_eq!(c.probe(4), vec![0]);
    }

    #[test]
    fn single_call_finishes_small_merge() {
        let a = IndexHandle::leaf(&[4, 2, 2], 0);
        let b = IndexHandle::leaf(&[3, 1, 2], 1);
        let c = IndexHandle::combine(&a, &b);
        assert!(c.merge_some());
        assert!(!c.is_merging());
        assert!(!c.merge_some());

        let idx = c.borrow();
        let got: Vec<(Value, FileId)> = idx.entries().iter().map(|e| (e.value, e.file_id)).collect();
        assert_eq!(got, vec![(1, 1), (2, 0), (2, 0), (2, 1), (3, 1), (4, 0)]);
    }

    #[test]
    fn completed_merge_releases_siblings() {
        let a = IndexHandle::leaf(&[1, 2], 0);
        let b = IndexHandle::leaf(&[1, 3], 1);
        let c = IndexHandle::combine(&a, &b);
        assert_eq!(a.holders(), 2);
        assert_eq!(b.holders(), 2);
        while c.merge_step(1) {}
        assert_eq!(a.holders(), 1);
        assert_eq!(b.holders(), 1);
    }

    #[test]
    fn drained_side_triggers_bulk_copy() {
        // 左侧全部小于右侧：两次比较后左侧耗尽，右侧一次性拷贝
        let a = IndexHandle::leaf(&[1, 2], 0);
        let b = IndexHandle::leaf(&[10, 11, 12, 13, 14], 1);
        let c = IndexHandle::combine(&a, &b);
        assert!(c.merge_step(2));
        assert!(!c.is_merging());
        assert_eq!(c.borrow().len(), 7);
    }

    #[test]
    fn probe_matches_brute_force_at_every_merge_state() {
        let mut rng = SmallRng::seed_from_u64(42);
        let chunks: Vec<(FileId, Vec<Value>)> = (0..4)
            .map(|fid| (fid, random_chunk(&mut rng, 16, 20)))
            .collect();

        let leaves: Vec<IndexHandle> = chunks.iter()
            .map(|(fid, values)| IndexHandle::leaf(values, *fid))
            .collect();
        let lo = IndexHandle::combine(&leaves[0], &leaves[1]);
        let hi = IndexHandle::combine(&leaves[2], &leaves[3]);
        lo.merge_step(3);
        let root = IndexHandle::combine(&lo, &hi);

        let mut calls = 0;
        loop {
            for v in 0..=21 {
                assert_eq!(root.probe(v), brute_force(&chunks, v), "value {v} after {calls} steps");
            }
            if !root.merge_step(5) {
                break;
            }
            calls += 1;
            assert!(calls <= 64, "merge did not terminate");
        }
        assert!(!lo.is_merging());
        assert!(!hi.is_merging());

        let idx = root.borrow();
        assert_eq!(idx.len(), 64);
        assert!(is_sorted(idx.entries()));
    }

    #[test]
    fn probe_recurses_into_merging_sibling() {
        let leaves: Vec<IndexHandle> = (0..4)
            .map(|fid| IndexHandle::leaf(&[fid as Value, 100], fid))
            .collect();
        let lo = IndexHandle::combine(&leaves[0], &leaves[1]);
        let hi = IndexHandle::combine(&leaves[2], &leaves[3]);
        lo.merge_step(1);
        let root = IndexHandle::combine(&lo, &hi);
        root.merge_step(1);

        assert_eq!(root.probe(100), vec![0, 1, 2, 3]);
        assert_eq!(root.probe(2), vec![2]);
        assert_eq!(root.probe(0), vec![0]);
    }

    #[test]
    fn merge_is_stable_and_conserves_entries() {
        let mut rng = SmallRng::seed_from_u64(7);
        let va = random_chunk(&mut rng, 33, 5);
        let vb = random_chunk(&mut rng, 17, 5);
        let a = IndexHandle::leaf(&va, 0);
        let b = IndexHandle::leaf(&vb, 1);
        let c = IndexHandle::combine(&a, &b);

        let mut prev_len = 0;
        while c.merge_step(4) {
            let len = c.borrow().len();
            assert!(len > prev_len);
            prev_len = len;
        }

        let mut expected: Vec<IndexEntry> = a.borrow().entries().to_vec();
        expected.extend_from_slice(b.borrow().entries());
        expected.sort();
        assert_eq!(c.borrow().entries(), expected.as_slice());
    }
}
