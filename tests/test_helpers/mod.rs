//! Environment guards for tests that read configuration overrides.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Holds the process-wide environment lock while variables are overridden,
/// and puts the original values back on drop.
pub struct EnvVarGuard {
    saved: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Sets each variable given `Some(value)` and unsets each given `None`.
    pub fn set_many(overrides: &[(&str, Option<&str>)]) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let saved = overrides
            .iter()
            .map(|&(key, value)| {
                let original = env::var_os(key);
                apply(key.as_ref(), value.map(OsString::from));
                (OsString::from(key), original)
            })
            .collect();

        Self { saved, _lock: lock }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, original) in self.saved.drain(..).rev() {
            apply(&key, original);
        }
    }
}

fn apply(key: &std::ffi::OsStr, value: Option<OsString>) {
    // SAFETY: callers hold `ENV_LOCK`, so no other test mutates the
    // environment concurrently.
    unsafe {
        match value {
            Some(present) => env::set_var(key, present),
            None => env::remove_var(key),
        }
    }
}
