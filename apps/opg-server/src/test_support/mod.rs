use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub(crate) mod env {
    use super::*;

    pub(crate) struct EnvGuard {
        _lock: MutexGuard<'static, ()>,
        saved: HashMap<String, Option<String>>,
    }

    pub(crate) fn guard() -> EnvGuard {
        EnvGuard {
            _lock: ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner()),
            saved: HashMap::new(),
        }
    }

    impl EnvGuard {
        fn remember(&mut self, key: &str) {
            self.saved
                .entry(key.to_string())
                .or_insert_with(|| std::env::var(key).ok());
        }

        pub(crate) fn set(&mut self, key: &str, value: impl AsRef<str>) {
            self.remember(key);
            std::env::set_var(key, value.as_ref());
        }

        pub(crate) fn remove(&mut self, key: &str) {
            self.remember(key);
            std::env::remove_var(key);
        }

        /// Clear every variable the service reads so defaults apply.
        pub(crate) fn clear_service_vars(&mut self) {
            for key in crate::config::ENV_KEYS {
                self.remove(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain() {
                match value {
                    Some(val) => std::env::set_var(&key, val),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}

pub(crate) mod stubs {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::generate::{GenerateError, Generator};
    use crate::AppState;

    #[derive(Clone, Debug)]
    pub(crate) struct RecordedCall {
        pub model: String,
        pub prompt: String,
        pub system: String,
    }

    /// Always answers with the same text and records what it was asked.
    pub(crate) struct FixedGenerator {
        reply: String,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl FixedGenerator {
        pub(crate) fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl Generator for FixedGenerator {
        async fn generate(
            &self,
            model: &str,
            prompt: &str,
            system: &str,
        ) -> Result<String, GenerateError> {
            self.calls.lock().expect("calls lock").push(RecordedCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
                system: system.to_string(),
            });
            Ok(self.reply.clone())
        }
    }

    pub(crate) struct FailingGenerator {
        message: String,
    }

    impl FailingGenerator {
        pub(crate) fn new(message: &str) -> Self {
            Self {
                message: message.to_string(),
            }
        }
    }

    #[async_trait]
    impl Generator for FailingGenerator {
        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _system: &str,
        ) -> Result<String, GenerateError> {
            Err(GenerateError::Status {
                url: "http://stub/api/generate".into(),
                status: 503,
                message: self.message.clone(),
            })
        }
    }

    pub(crate) struct SlowGenerator {
        delay: Duration,
        reply: String,
    }

    impl SlowGenerator {
        pub(crate) fn new(delay: Duration, reply: &str) -> Self {
            Self {
                delay,
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl Generator for SlowGenerator {
        async fn generate(
            &self,
            _model: &str,
            _prompt: &str,
            _system: &str,
        ) -> Result<String, GenerateError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.reply.clone())
        }
    }

    pub(crate) fn state(generator: Arc<dyn Generator>) -> AppState {
        AppState::builder(generator).build()
    }
}
