//! 班级课表写锁
//!
//! 同一进程内对同一班级课表的修改串行执行。多班级操作按班级 ID 升序加锁。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct ScheduleLocks {
    locks: DashMap<i64, Arc<Mutex<()>>>,
}

/// 持有期间对应班级的课表不会被其他请求修改
pub struct ScheduleGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ScheduleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, class_ids: &[i64]) -> ScheduleGuard {
        let mut ids = class_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            let lock = self
                .locks
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }
        ScheduleGuard { _guards: guards }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_overlapping_sets_wait() {
        let locks = Arc::new(ScheduleLocks::new());
        let guard = locks.acquire(&[3, 1]).await;

        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[1, 2])).await;
        assert!(blocked.is_err());

        // 不相交的班级互不影响
        let free = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[2, 4])).await;
        assert!(free.is_ok());
        drop(free);

        drop(guard);
        let acquired = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[1, 2])).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_ids_do_not_deadlock() {
        let locks = ScheduleLocks::new();
        let acquired =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire(&[5, 5, 5])).await;
        assert!(acquired.is_ok());
    }
}
