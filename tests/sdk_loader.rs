mod support;

use async_trait::async_trait;
use placemap::domain::ports::MapSdk;
use placemap::sdk::headless::HeadlessSdk;
use placemap::sdk::loader::{LoaderStatus, SdkBootstrap, SdkScript};
use placemap::{SdkConfig, SdkLoader};
use placemap::sdk::SdkError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use support::ScriptedGeocoder;

/// Takes a few scheduler turns per load and fails the first `failures` loads.
struct SlowBootstrap {
    sdk: Arc<HeadlessSdk>,
    failures: usize,
    calls: AtomicUsize,
}

impl SlowBootstrap {
    fn new(failures: usize) -> Self {
        Self {
            sdk: Arc::new(HeadlessSdk::new(Arc::new(ScriptedGeocoder::new()))),
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SdkBootstrap for SlowBootstrap {
    async fn bootstrap(&self, script: &SdkScript) -> Result<Arc<dyn MapSdk>, SdkError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        if attempt < self.failures {
            return Err(SdkError::ScriptLoad(format!("{} unreachable", script.url())));
        }
        let sdk: Arc<dyn MapSdk> = self.sdk.clone();
        Ok(sdk)
    }
}

fn config() -> SdkConfig {
    SdkConfig::new(Some("test-js-key".to_string()))
}

#[tokio::test]
async fn test_concurrent_loads_share_one_bootstrap() {
    let bootstrap = Arc::new(SlowBootstrap::new(0));
    let loader = SdkLoader::new(config(), bootstrap.clone());
    assert_eq!(loader.status(), LoaderStatus::Uninitialized);

    let (a, b, c) = tokio::join!(loader.load(), loader.load(), loader.load());

    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(bootstrap.calls(), 1);
    assert_eq!(loader.status(), LoaderStatus::Ready);

    loader.load().await.unwrap();
    assert_eq!(bootstrap.calls(), 1);
}

#[tokio::test]
async fn test_waiters_on_a_failed_load_see_the_same_error() {
    let bootstrap = Arc::new(SlowBootstrap::new(1));
    let loader = SdkLoader::new(config(), bootstrap.clone());

    let (a, b) = tokio::join!(loader.load(), loader.load());

    let (a, b) = (a.err().unwrap(), b.err().unwrap());
    assert_eq!(a, b);
    assert!(matches!(a, SdkError::ScriptLoad(_)));
    assert!(!a.is_configuration());
    assert_eq!(bootstrap.calls(), 1);
    assert_eq!(loader.status(), LoaderStatus::Uninitialized);
}

#[tokio::test]
async fn test_failed_load_is_retried_on_next_call() {
    let bootstrap = Arc::new(SlowBootstrap::new(1));
    let loader = SdkLoader::new(config(), bootstrap.clone());

    assert!(loader.load().await.is_err());
    assert!(loader.load().await.is_ok());
    assert_eq!(bootstrap.calls(), 2);
    assert_eq!(loader.status(), LoaderStatus::Ready);
}

#[tokio::test]
async fn test_missing_key_never_reaches_the_bootstrap() {
    let bootstrap = Arc::new(SlowBootstrap::new(0));
    let loader = SdkLoader::new(SdkConfig::new(Some("   ".to_string())), bootstrap.clone());

    let err = loader.load().await.err().unwrap();
    assert_eq!(err, SdkError::MissingAppKey);
    assert!(err.is_configuration());
    assert_eq!(bootstrap.calls(), 0);
    assert_eq!(loader.status(), LoaderStatus::Uninitialized);
}
