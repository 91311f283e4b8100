//! 체크포인트 저장소.
//!
//! 수집 범위(`RangeId`)별 누적 체결을 영속화합니다. 수집기는 저장소 trait에만
//! 의존하므로 백엔드(파일, 키-값 저장소 등)를 교체할 수 있습니다.
//!
//! # 파일 레이아웃
//!
//! `{data_dir}/{symbol}_{YYYYMMDD}_{YYYYMMDD}.json` 파일 하나에 체결 시각
//! 내림차순으로 정렬된 JSON 배열을 저장합니다. 쓰기는 임시 파일에 기록한 뒤
//! `rename`으로 교체하므로 읽는 쪽은 병합 전 또는 병합 후 상태만 봅니다.

use async_trait::async_trait;
use histrade_core::{is_safe_entry_name, Checkpoint, Execution, RangeId, CHECKPOINT_EXTENSION};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

use crate::error::CollectorResult;

/// 병합 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// 저장된 체크포인트
    pub checkpoint: Checkpoint,
    /// 새로 추가된 체결 수
    pub added: usize,
}

/// 체크포인트 영속화 인터페이스.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// 저장된 체크포인트를 읽습니다. 없으면 `None`.
    async fn load(&self, id: &RangeId) -> CollectorResult<Option<Checkpoint>>;

    /// 체크포인트 전체를 원자적으로 교체합니다.
    async fn save(&self, id: &RangeId, checkpoint: &Checkpoint) -> CollectorResult<()>;

    /// 새 체결 페이지를 병합하고 즉시 저장합니다.
    ///
    /// 같은 페이지를 다시 병합해도 결과는 같습니다 (orderId 기준 중복 제거).
    /// 추가된 체결이 없어도 저장은 수행합니다.
    async fn merge(&self, id: &RangeId, page: Vec<Execution>) -> CollectorResult<MergeOutcome> {
        let mut checkpoint = self.load(id).await?.unwrap_or_default();
        let added = checkpoint.merge(page);
        self.save(id, &checkpoint).await?;
        Ok(MergeOutcome { checkpoint, added })
    }

    /// 저장된 항목 이름 목록 (정렬됨).
    async fn list_entries(&self) -> CollectorResult<Vec<String>>;

    /// 항목의 원본 JSON 내용. 없거나 허용되지 않는 이름이면 `None`.
    async fn read_entry(&self, name: &str) -> CollectorResult<Option<serde_json::Value>>;
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 디렉토리 기반 체크포인트 저장소.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// 새 저장소 생성. 디렉토리는 첫 저장 시 만들어집니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &RangeId) -> PathBuf {
        self.dir.join(id.entry_name())
    }

    fn temp_path_for(&self, id: &RangeId) -> PathBuf {
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{}.{}-{}.tmp", id.as_str(), std::process::id(), seq))
    }

    async fn read_optional(path: &Path) -> CollectorResult<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(&self, id: &RangeId, bytes: &[u8]) -> CollectorResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self.temp_path_for(id);
        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, self.path_for(id)).await
        }
        .await;

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, id: &RangeId) -> CollectorResult<Option<Checkpoint>> {
        let Some(bytes) = Self::read_optional(&self.path_for(id)).await? else {
            return Ok(None);
        };
        let executions: Vec<Execution> = serde_json::from_slice(&bytes)?;
        Ok(Some(Checkpoint::from_executions(executions)))
    }

    async fn save(&self, id: &RangeId, checkpoint: &Checkpoint) -> CollectorResult<()> {
        let bytes = serde_json::to_vec_pretty(checkpoint.executions())?;
        self.write_atomic(id, &bytes).await?;
        tracing::debug!(range_id = %id, entries = checkpoint.len(), "체크포인트 저장");
        Ok(())
    }

    async fn list_entries(&self) -> CollectorResult<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{}", CHECKPOINT_EXTENSION);
        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(&suffix) && is_safe_entry_name(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    async fn read_entry(&self, name: &str) -> CollectorResult<Option<serde_json::Value>> {
        let Some(id) = RangeId::from_entry_name(name) else {
            return Ok(None);
        };
        match Self::read_optional(&self.path_for(&id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use histrade_core::{CollectionRange, Side};
    use rust_decimal_macros::dec;

    fn exec(order_id: &str, time: i64) -> Execution {
        Execution::new("BTCUSDT", Side::Buy, dec!(100), dec!(1), time, order_id)
    }

    fn range_id() -> RangeId {
        CollectionRange::new("BTCUSDT", 1_704_067_200_000, 1_705_881_600_000).range_id()
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("data"));

        assert!(store.load(&range_id()).await.unwrap().is_none());
        assert!(store.list_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_merge_persists_sorted_and_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = range_id();

        let first = store
            .merge(&id, vec![exec("a", 1), exec("b", 3)])
            .await
            .unwrap();
        assert_eq!(first.added, 2);

        let second = store
            .merge(&id, vec![exec("b", 3), exec("c", 2)])
            .await
            .unwrap();
        assert_eq!(second.added, 1);

        let loaded = store.load(&id).await.unwrap().unwrap();
        let order: Vec<&str> = loaded
            .executions()
            .iter()
            .map(|e| e.order_id.as_str())
            .collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(loaded, second.checkpoint);
    }

    #[tokio::test]
    async fn test_merge_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = range_id();
        let page = vec![exec("a", 1), exec("b", 2)];

        let once = store.merge(&id, page.clone()).await.unwrap();
        let twice = store.merge(&id, page).await.unwrap();

        assert_eq!(twice.added, 0);
        assert_eq!(once.checkpoint, twice.checkpoint);
    }

    #[tokio::test]
    async fn test_empty_merge_still_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = range_id();

        store.merge(&id, Vec::new()).await.unwrap();

        let loaded = store.load(&id).await.unwrap().expect("persisted");
        assert!(loaded.is_empty());
        assert_eq!(
            store.list_entries().await.unwrap(),
            vec!["BTCUSDT_20240101_20240122.json".to_string()]
        );
    }

    #[tokio::test]
    async fn test_file_format_and_no_temp_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = range_id();

        store.merge(&id, vec![exec("42", 1_704_067_200_000)]).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(id.entry_name())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["orderId"], "42");
        assert_eq!(value[0]["timestamp"], 1_704_067_200_000i64);

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_legacy_duplicates_normalized_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = range_id();
        let legacy = vec![exec("a", 1), exec("a", 1), exec("b", 5)];
        std::fs::write(
            dir.path().join(id.entry_name()),
            serde_json::to_vec(&legacy).unwrap(),
        )
        .unwrap();

        let loaded = store.load(&id).await.unwrap().unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.executions()[0].order_id, "b");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = range_id();
        std::fs::write(dir.path().join(id.entry_name()), b"{not json").unwrap();

        let err = store.load(&id).await.unwrap_err();
        assert!(matches!(err, crate::CollectorError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_read_entry_rejects_unsafe_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        let id = range_id();
        store.merge(&id, vec![exec("a", 1)]).await.unwrap();

        let value = store.read_entry(&id.entry_name()).await.unwrap().unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));

        assert!(store.read_entry("../secret.json").await.unwrap().is_none());
        assert!(store.read_entry("missing.json").await.unwrap().is_none());
        assert!(store.read_entry("notes.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_entries_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointStore::new(dir.path());
        std::fs::write(dir.path().join("SOLUSDT_20240101_20240108.json"), b"[]").unwrap();
        std::fs::write(dir.path().join("BTCUSDT_20240101_20240108.json"), b"[]").unwrap();
        std::fs::write(dir.path().join("README.md"), b"").unwrap();
        std::fs::write(dir.path().join(".partial.tmp"), b"").unwrap();

        let names = store.list_entries().await.unwrap();

        assert_eq!(
            names,
            vec![
                "BTCUSDT_20240101_20240108.json".to_string(),
                "SOLUSDT_20240101_20240108.json".to_string(),
            ]
        );
    }
}
