use std::sync::Arc;
use std::time::Duration;

use opg_core::{Persona, DEFAULT_MODEL};

use crate::generate::Generator;
use crate::inversion::InversionService;
use crate::sessions::SessionStore;

#[derive(Clone)]
pub(crate) struct AppState {
    sessions: Arc<SessionStore>,
    inversion: Arc<InversionService>,
    default_model: Arc<str>,
}

impl AppState {
    pub fn builder(generator: Arc<dyn Generator>) -> AppStateBuilder {
        AppStateBuilder::new(generator)
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn inversion(&self) -> &InversionService {
        &self.inversion
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }
}

pub(crate) struct AppStateBuilder {
    generator: Arc<dyn Generator>,
    persona: Persona,
    timeout: Option<Duration>,
    default_model: String,
}

impl AppStateBuilder {
    fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            persona: Persona::default(),
            timeout: None,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    pub fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn build(self) -> AppState {
        AppState {
            sessions: Arc::new(SessionStore::new()),
            inversion: Arc::new(InversionService::new(
                self.generator,
                self.persona,
                self.timeout,
            )),
            default_model: Arc::from(self.default_model),
        }
    }
}
