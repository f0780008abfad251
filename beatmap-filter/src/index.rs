use indexmap::IndexMap;
use utils_common::Item;

/// 结果索引 - 条目标识到最近一次提取结果的映射
///
/// 覆盖整个筛选会话中见过的所有条目，包括已经不在页面上的条目，
/// 迭代顺序为首次出现的顺序。重置时清空。
#[derive(Debug, Default)]
pub struct ResultIndex {
    items: IndexMap<String, Item>,
}

impl ResultIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖，后写入者生效，位置保持首次插入时的位置
    pub fn upsert(&mut self, id: impl Into<String>, item: Item) {
        self.items.insert(id.into(), item);
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn for_each(&self, mut f: impl FnMut(&str, &Item)) {
        for (id, item) in &self.items {
            f(id, item);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.items.iter().map(|(id, item)| (id.as_str(), item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
