use std::collections::HashMap;

use crate::types::IndexedContentItem;

/// 已嵌入的条目，`seq` 为写入序号，用于相似度相同时保持插入顺序
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub item: IndexedContentItem,
    pub vector: Vec<f32>,
    pub seq: u64,
}

/// 存储的累计写入与删除计数
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreMetadata {
    pub total_writes: u64,
    pub total_removals: u64,
}

/// 按命名空间隔离的向量存储
#[derive(Debug, Default)]
pub struct NamespaceStore {
    data: HashMap<String, HashMap<String, StoredEntry>>,
    metadata: StoreMetadata,
    next_seq: u64,
}

impl NamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入条目，同一 id 覆盖旧值
    pub fn insert(&mut self, namespace: &str, item: IndexedContentItem, vector: Vec<f32>) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let id = item.id.clone();
        self.data
            .entry(namespace.to_string())
            .or_default()
            .insert(id, StoredEntry { item, vector, seq });

        self.metadata.total_writes += 1;
    }

    pub fn get(&self, namespace: &str, id: &str) -> Option<&StoredEntry> {
        self.data.get(namespace).and_then(|entries| entries.get(id))
    }

    pub fn remove(&mut self, namespace: &str, id: &str) -> Option<StoredEntry> {
        let entries = self.data.get_mut(namespace)?;
        let removed = entries.remove(id);
        if entries.is_empty() {
            self.data.remove(namespace);
        }
        if removed.is_some() {
            self.metadata.total_removals += 1;
        }
        removed
    }

    /// 删除命名空间下的全部条目，返回删除数量
    pub fn clear_namespace(&mut self, namespace: &str) -> usize {
        let removed = self.data.remove(namespace).map(|e| e.len()).unwrap_or(0);
        self.metadata.total_removals += removed as u64;
        removed
    }

    /// 命名空间内的条目，按写入顺序
    pub fn entries(&self, namespace: &str) -> Vec<&StoredEntry> {
        let mut entries: Vec<&StoredEntry> = self
            .data
            .get(namespace)
            .map(|e| e.values().collect())
            .unwrap_or_default();
        entries.sort_by_key(|e| e.seq);
        entries
    }

    pub fn len(&self, namespace: &str) -> usize {
        self.data.get(namespace).map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn namespaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn namespace_count(&self) -> usize {
        self.data.len()
    }

    pub fn metadata(&self) -> StoreMetadata {
        self.metadata
    }
}
