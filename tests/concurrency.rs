//! Many threads driving the cache, metrics and manager at once.

use chrono::{DateTime, Utc};
use licenseward::{
    Clock, FileLicenseStore, LicenseDuration, LicenseManager, LicenseSnapshot, LicenseStatus,
    LicensewardConfig, LicensewardError, PerformanceTracker, RemoteAuthority, SystemClock,
    ValidationCache, ValidationResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const THREADS: usize = 8;
const ROUNDS: usize = 200;

/// Accepts every key except those starting with "DENY".
struct FlakyFreeAuthority {
    validate_calls: AtomicUsize,
}

impl RemoteAuthority for FlakyFreeAuthority {
    fn validate(&self, license_key: &str) -> Result<ValidationResult, LicensewardError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if license_key.starts_with("DENY") {
            return Err(LicensewardError::InvalidLicense {
                reason: "REVOKED".to_string(),
            });
        }
        Ok(ValidationResult::valid(Utc::now()))
    }

    fn activate(&self, license_key: &str, user_email: &str) -> Result<LicenseSnapshot, LicensewardError> {
        let now = Utc::now();
        Ok(LicenseSnapshot {
            license_key: license_key.to_string(),
            user_email: user_email.to_string(),
            expiry_date: now + chrono::Duration::days(365),
            issued_date: now,
            duration: "1y".to_string(),
            status: LicenseStatus::Active,
            last_checked: None,
        })
    }

    fn revoke(&self, _license_key: &str) -> Result<(), LicensewardError> {
        Ok(())
    }

    fn extend(
        &self,
        _license_key: &str,
        duration: LicenseDuration,
    ) -> Result<DateTime<Utc>, LicensewardError> {
        Ok(Utc::now() + duration.as_chrono())
    }

    fn generate(&self, _user_email: &str, _duration: LicenseDuration) -> Result<String, LicensewardError> {
        Ok("KEY-NEW".to_string())
    }
}

/// Parks every `validate` call until the test releases it.
struct GatedAuthority {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
    inner: FlakyFreeAuthority,
}

impl RemoteAuthority for GatedAuthority {
    fn validate(&self, license_key: &str) -> Result<ValidationResult, LicensewardError> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        self.inner.validate(license_key)
    }

    fn activate(&self, license_key: &str, user_email: &str) -> Result<LicenseSnapshot, LicensewardError> {
        self.inner.activate(license_key, user_email)
    }

    fn revoke(&self, license_key: &str) -> Result<(), LicensewardError> {
        self.inner.revoke(license_key)
    }

    fn extend(
        &self,
        license_key: &str,
        duration: LicenseDuration,
    ) -> Result<DateTime<Utc>, LicensewardError> {
        self.inner.extend(license_key, duration)
    }

    fn generate(&self, user_email: &str, duration: LicenseDuration) -> Result<String, LicensewardError> {
        self.inner.generate(user_email, duration)
    }
}

#[test]
fn revoke_during_inflight_validation_is_not_undone() {
    let dir = TempDir::new().unwrap();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let authority = Arc::new(GatedAuthority {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
        inner: FlakyFreeAuthority {
            validate_calls: AtomicUsize::new(0),
        },
    });
    let store = Arc::new(FileLicenseStore::with_dir(dir.path().to_path_buf()).unwrap());
    let manager = Arc::new(
        LicenseManager::new(
            LicensewardConfig::new("revoke-race", "licenseward-revoke-race"),
            authority,
            store,
        )
        .unwrap(),
    );

    let validator = {
        let manager = Arc::clone(&manager);
        thread::spawn(move || manager.validate_key("KEY-1"))
    };

    // Validation is parked inside the authority call
    entered_rx.recv().unwrap();
    manager.revoke("KEY-1").unwrap();
    release_tx.send(()).unwrap();

    let outcome = validator.join().unwrap().unwrap();
    assert!(!outcome.from_cache);
    assert!(manager.cached_result("KEY-1").unwrap().is_none());
    assert!(manager.cache().is_empty());
}

#[test]
fn cache_counters_sum_across_threads() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(ValidationCache::new(Duration::from_secs(3600), 32, clock));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    let key = format!("key-{}", (t * 7 + i) % 64);
                    if i % 3 == 0 {
                        cache.set(&key, ValidationResult::valid(Utc::now()));
                    } else {
                        cache.get(&key);
                    }
                    if i % 50 == 0 {
                        cache.purge_expired();
                        let _ = cache.stats();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let gets_per_thread = (0..ROUNDS).filter(|i| i % 3 != 0).count();
    let stats = cache.stats();
    assert_eq!(
        (stats.hit_count + stats.miss_count) as usize,
        THREADS * gets_per_thread
    );
    assert!(stats.entries <= 32);
}

#[test]
fn tracker_counters_sum_across_threads() {
    let tracker = Arc::new(PerformanceTracker::new());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let tracker = Arc::clone(&tracker);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    let name = if i % 2 == 0 { "even" } else { "odd" };
                    let _: Result<usize, String> = tracker.track(name, || {
                        if (t + i) % 4 == 0 {
                            Err("boom".to_string())
                        } else {
                            Ok(i)
                        }
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = tracker.snapshot();
    let total: u64 = snapshot.values().map(|m| m.count).sum();
    assert_eq!(total as usize, THREADS * ROUNDS);
    for metric in snapshot.values() {
        assert_eq!(metric.count, metric.success_count + metric.error_count);
        assert!(metric.min_duration <= metric.max_duration);
    }
}

#[test]
fn manager_handles_parallel_validations() {
    let dir = TempDir::new().unwrap();
    let authority = Arc::new(FlakyFreeAuthority {
        validate_calls: AtomicUsize::new(0),
    });
    let store = Arc::new(FileLicenseStore::with_dir(dir.path().to_path_buf()).unwrap());
    let manager = Arc::new(
        LicenseManager::new(
            LicensewardConfig::new("concurrency-test", "licenseward-concurrency"),
            authority.clone(),
            store,
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                let mut denied = 0usize;
                for i in 0..ROUNDS {
                    let key = if (t + i) % 10 == 0 {
                        format!("DENY-{}", i % 5)
                    } else {
                        format!("KEY-{}", i % 20)
                    };
                    match manager.validate_key(&key) {
                        Ok(outcome) => assert!(outcome.result.is_valid),
                        Err(LicensewardError::InvalidLicense { .. }) => denied += 1,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                    let _ = manager.validation_state();
                    let _ = manager.status();
                }
                denied
            })
        })
        .collect();
    let denied: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let status = manager.status();
    let metric = &status.metrics["validate"];
    assert_eq!(metric.count as usize, THREADS * ROUNDS);
    assert_eq!(metric.error_count as usize, denied);
    assert_eq!(
        (status.cache.hit_count + status.cache.miss_count) as usize,
        THREADS * ROUNDS
    );
    // Every miss went to the authority; 25 distinct keys were cached
    assert_eq!(
        authority.validate_calls.load(Ordering::SeqCst),
        status.cache.miss_count as usize
    );
    assert_eq!(status.cache.entries, 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sweeper_shutdown_under_load() {
    let dir = TempDir::new().unwrap();
    let authority = Arc::new(FlakyFreeAuthority {
        validate_calls: AtomicUsize::new(0),
    });
    let store = Arc::new(FileLicenseStore::with_dir(dir.path().to_path_buf()).unwrap());
    let mut config = LicensewardConfig::new("sweep-test", "licenseward-sweep");
    config.sweep_interval = Duration::from_millis(5);
    let manager = Arc::new(LicenseManager::new(config, authority, store).unwrap());

    manager.start_sweeper();

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..ROUNDS {
                    manager.validate_key(&format!("KEY-{}-{}", t, i % 10)).unwrap();
                }
            })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(20)).await;
    manager.shutdown().await;
    manager.shutdown().await;

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(manager.cache().len(), 40);
}
