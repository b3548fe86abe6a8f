use bytes::Bytes;
use http::Uri;
use interpose_backend::{Backend, BincodeFormat, CacheKey, DeleteStatus};
use interpose_moka::MokaBackend;

fn key(path: &str) -> CacheKey {
    CacheKey::get(&format!("http://example.com/{path}").parse::<Uri>().unwrap())
}

#[tokio::test]
async fn write_read_remove() {
    let backend = MokaBackend::builder(16).build();
    let value = Bytes::from_static(b"{\"status\":200}");

    assert_eq!(backend.read(&key("a")).await.unwrap(), None);
    backend.write(&key("a"), value.clone()).await.unwrap();
    assert_eq!(backend.read(&key("a")).await.unwrap(), Some(value));

    assert_eq!(backend.remove(&key("a")).await.unwrap(), DeleteStatus::Deleted(1));
    assert_eq!(backend.remove(&key("a")).await.unwrap(), DeleteStatus::Missing);
}

#[tokio::test]
async fn capacity_is_bounded() {
    let backend = MokaBackend::builder(2).build();
    for path in ["a", "b", "c", "d"] {
        backend.write(&key(path), Bytes::from_static(b"x")).await.unwrap();
    }
    backend.cache().run_pending_tasks().await;

    assert!(backend.cache().entry_count() <= 2);
}

#[tokio::test]
async fn builder_settings_are_applied() {
    let backend = MokaBackend::builder(8)
        .label("pages")
        .value_format(BincodeFormat)
        .build();

    assert_eq!(backend.label(), "pages");
    assert_eq!(backend.value_format().name(), "bincode");
}
