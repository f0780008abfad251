use indexmap::IndexSet;

/// 歌单累加器 - 当前通过筛选的条目的内容哈希集合
///
/// 同一个哈希无论记录多少次都只出现一次，快照顺序为首次记录的顺序。
#[derive(Debug, Default)]
pub struct PlaylistAccumulator {
    hashes: IndexSet<String>,
}

impl PlaylistAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录哈希，返回是否为新加入
    pub fn record(&mut self, hash: &str) -> bool {
        if self.hashes.contains(hash) {
            return false;
        }
        self.hashes.insert(hash.to_string())
    }

    /// 条目不再通过筛选时移出集合
    pub fn discard(&mut self, hash: &str) -> bool {
        self.hashes.shift_remove(hash)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.hashes.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn clear(&mut self) {
        self.hashes.clear();
    }
}
