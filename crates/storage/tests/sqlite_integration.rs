use course_core::model::{Level, ModuleId, RecordSet, VideoId};
use course_core::time::fixed_now;
use storage::builtin::BuiltinCatalog;
use storage::repository::{CatalogSource, KeyValueStore, Storage};
use storage::snapshot::{PROGRESS_KEY, decode_progress, encode_progress};
use storage::sqlite::SqliteRepository;

async fn fresh(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

#[tokio::test]
async fn kv_store_overwrites_and_removes() {
    let repo = fresh("memdb_kv").await;

    assert_eq!(repo.get(PROGRESS_KEY).await.unwrap(), None);
    repo.set(PROGRESS_KEY, b"[]").await.unwrap();
    repo.set(PROGRESS_KEY, b"[{}]").await.unwrap();
    assert_eq!(
        repo.get(PROGRESS_KEY).await.unwrap().as_deref(),
        Some(&b"[{}]"[..])
    );

    repo.remove(PROGRESS_KEY).await.unwrap();
    repo.remove(PROGRESS_KEY).await.unwrap();
    assert_eq!(repo.get(PROGRESS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn catalog_round_trips_in_order() {
    let repo = fresh("memdb_catalog").await;
    assert_eq!(repo.module_count().await.unwrap(), 0);

    let bundled = BuiltinCatalog::modules().unwrap();
    repo.replace_catalog(&bundled).await.unwrap();
    // Upserting twice keeps one copy of every row.
    repo.replace_catalog(&bundled).await.unwrap();
    assert_eq!(repo.module_count().await.unwrap(), 4);

    let loaded = repo.fetch_modules().await.unwrap();
    assert_eq!(loaded, bundled);

    let m4 = &loaded[3];
    assert_eq!(m4.id(), &ModuleId::new("m4"));
    assert_eq!(m4.level(), Level::Advanced);
    let orders: Vec<u32> = m4.videos().iter().map(|v| v.order()).collect();
    assert_eq!(orders, [1, 2, 3, 4, 5, 6, 7]);
}

#[tokio::test]
async fn seeding_only_fills_an_empty_catalog() {
    let repo = fresh("memdb_seed").await;
    assert!(repo.seed_builtin_if_empty().await.unwrap());
    assert!(!repo.seed_builtin_if_empty().await.unwrap());
    assert_eq!(repo.module_count().await.unwrap(), 4);
}

#[tokio::test]
async fn sqlite_storage_persists_progress_snapshot() {
    let storage = Storage::sqlite("sqlite:file:memdb_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let modules = storage.catalog.fetch_modules().await.unwrap();
    assert_eq!(modules.len(), 4);

    let records = RecordSet::seed(modules.iter().map(|m| m.id()))
        .with_video_watched(&ModuleId::new("m1"), &VideoId::new("v4"), 8, 720, fixed_now())
        .unwrap();
    storage
        .kv
        .set(PROGRESS_KEY, &encode_progress(&records).unwrap())
        .await
        .unwrap();

    let bytes = storage.kv.get(PROGRESS_KEY).await.unwrap().unwrap();
    let snapshot = decode_progress(&bytes).unwrap();
    assert_eq!(snapshot.records.len(), 4);
    assert!(snapshot.records[0].completed.contains(&VideoId::new("v4")));
}
