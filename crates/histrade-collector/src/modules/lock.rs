//! 범위별 상호 배제.
//!
//! 같은 `RangeId`에 대한 수집은 load/merge/save가 서로 경쟁하므로 직렬화합니다.
//! 서로 다른 범위는 독립적으로 동시에 실행됩니다. 단일 프로세스 내 잠금이며,
//! 여러 프로세스가 같은 데이터 디렉토리를 공유하는 배포는 다루지 않습니다.

use histrade_core::RangeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<RangeId, Arc<AsyncMutex<()>>>;

/// `RangeId` 단위 비동기 잠금 테이블.
#[derive(Debug, Clone, Default)]
pub struct RangeLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl RangeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, LockMap> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 범위 잠금을 획득합니다. 같은 범위의 다른 실행이 끝날 때까지 대기합니다.
    pub async fn acquire(&self, id: &RangeId) -> RangeGuard {
        let mutex = self
            .table()
            .entry(id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        RangeGuard {
            id: id.clone(),
            locks: self.clone(),
            guard: Some(guard),
        }
    }

    /// 해당 범위가 현재 잠겨 있는지 확인.
    pub fn is_locked(&self, id: &RangeId) -> bool {
        self.table()
            .get(id)
            .map(|mutex| mutex.try_lock().is_err())
            .unwrap_or(false)
    }

    /// 추적 중인 범위 수.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }
}

/// 획득한 범위 잠금. 드롭 시 해제되며, 대기자가 없으면 테이블에서 제거됩니다.
#[derive(Debug)]
pub struct RangeGuard {
    id: RangeId,
    locks: RangeLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RangeGuard {
    pub fn range_id(&self) -> &RangeId {
        &self.id
    }
}

impl Drop for RangeGuard {
    fn drop(&mut self) {
        let mut table = self.locks.table();
        // 테이블 1개 + 이 가드 1개만 남았으면 대기자가 없음
        if let Some(mutex) = table.get(&self.id) {
            if Arc::strong_count(mutex) <= 2 {
                table.remove(&self.id);
            }
        }
        self.guard.take();
    }
}
