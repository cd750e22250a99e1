//! 代价模型：所有自适应决策的可调参数

/// 四个可调代价，单位与 `Table::savings` 相同
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostModel {
    /// 每次扫描开始时，每个文件发放的基础额度
    pub base_quota_per_file:   i64,
    pub cost_for_index_build:  i64,
    /// 每个成功的 merge / grow 步骤的代价
    pub cost_for_index_grow:   i64,
    /// 每次走索引路径节省下来的额度
    pub savings_per_index_use: i64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            base_quota_per_file:   10,
            cost_for_index_build:  1000,
            cost_for_index_grow:   1000,
            savings_per_index_use: 100,
        }
    }
}

impl CostModel {
    pub fn with_base_quota_per_file(mut self, quota: i64) -> Self {
        self.base_quota_per_file = quota; self
    }
    pub fn with_cost_for_index_build(mut self, cost: i64) -> Self {
        self.cost_for_index_build = cost; self
    }
    pub fn with_cost_for_index_grow(mut self, cost: i64) -> Self {
        self.cost_for_index_grow = cost; self
    }
    pub fn with_savings_per_index_use(mut self, savings: i64) -> Self {
        self.savings_per_index_use = savings; self
    }

    /// 扫描开始时重置的额度
    pub fn quota_for(&self, file_count: usize) -> i64 {
        file_count as i64 * self.base_quota_per_file
    }
}
