use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// 按命名空间分配的互斥锁表，无人持有或等待的锁会被回收
#[derive(Clone, Default)]
pub struct NamespaceLocks {
    table: LockTable,
}

impl NamespaceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 独占命名空间，直到返回的租约被释放
    pub async fn acquire(&self, namespace: &str) -> NamespaceLease {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            table
                .entry(namespace.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        let guard = lock.lock_owned().await;
        NamespaceLease {
            namespace: namespace.to_string(),
            table: self.table.clone(),
            guard: Some(guard),
        }
    }

    /// 当前登记的命名空间锁数量
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 命名空间独占租约
pub struct NamespaceLease {
    namespace: String,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl NamespaceLease {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Drop for NamespaceLease {
    fn drop(&mut self) {
        self.guard.take();

        // 表本身持有一份引用；没有其他等待者时移除
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(lock) = table.get(&self.namespace) {
            if Arc::strong_count(lock) == 1 {
                table.remove(&self.namespace);
            }
        }
    }
}
