use std::sync::Arc;
use std::time::Duration;

use opg_core::{clamp_probability, reverse_words, swap_languages, Persona};
use rand::Rng;
use tracing::{debug, warn};

use crate::generate::{GenerateError, Generator};

/// Post-processing knobs for one inversion. Probabilities are clamped on use.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MutationOptions {
    pub word_reversal: f64,
    pub language_swap: f64,
    pub languages: Vec<String>,
}

impl MutationOptions {
    /// Apply word reversal, then language markers, to `text`.
    pub fn apply<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> String {
        let reversal = clamp_probability(self.word_reversal);
        let swap = clamp_probability(self.language_swap);
        let mut out = text.to_string();
        if reversal > 0.0 {
            out = reverse_words(&out, reversal, rng);
        }
        if swap > 0.0 {
            out = swap_languages(&out, swap, &self.languages, rng);
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum InvertError {
    #[error(transparent)]
    Generation(#[from] GenerateError),
    #[error("generation timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

pub(crate) struct InversionService {
    generator: Arc<dyn Generator>,
    persona: Persona,
    timeout: Option<Duration>,
}

impl InversionService {
    pub fn new(generator: Arc<dyn Generator>, persona: Persona, timeout: Option<Duration>) -> Self {
        Self {
            generator,
            persona,
            timeout,
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn invert(
        &self,
        prompt: &str,
        model: &str,
        opts: &MutationOptions,
    ) -> Result<String, InvertError> {
        let raw = self.generate(prompt, model).await?;
        let mut rng = rand::rng();
        Ok(opts.apply(&raw, &mut rng))
    }

    pub async fn invert_with_rng<R: Rng + Send + ?Sized>(
        &self,
        prompt: &str,
        model: &str,
        opts: &MutationOptions,
        rng: &mut R,
    ) -> Result<String, InvertError> {
        let raw = self.generate(prompt, model).await?;
        Ok(opts.apply(&raw, rng))
    }

    async fn generate(&self, prompt: &str, model: &str) -> Result<String, InvertError> {
        debug!(
            target: "opg::invert",
            model,
            persona = %self.persona,
            prompt_chars = prompt.chars().count(),
            "requesting inversion"
        );
        let call = self
            .generator
            .generate(model, prompt, self.persona.system_prompt());
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(inner) => inner.map_err(InvertError::from),
                Err(_) => Err(InvertError::TimedOut(limit)),
            },
            None => call.await.map_err(InvertError::from),
        };
        if let Err(err) = &result {
            warn!(target: "opg::invert", model, error = %err, "inversion failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::stubs::{FailingGenerator, FixedGenerator, SlowGenerator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn service(generator: Arc<dyn Generator>) -> InversionService {
        InversionService::new(generator, Persona::Opposite, None)
    }

    #[tokio::test]
    async fn zero_probabilities_return_generated_text_verbatim() {
        let svc = service(Arc::new(FixedGenerator::new("I hate hiking")));
        let out = svc
            .invert("I love hiking", "llama2", &MutationOptions::default())
            .await
            .expect("invert");
        assert_eq!(out, "I hate hiking");
    }

    #[tokio::test]
    async fn passes_persona_instruction_and_model() {
        let generator = Arc::new(FixedGenerator::new("ok"));
        let svc = InversionService::new(generator.clone(), Persona::Adversary, None);
        svc.invert("hello", "mistral", &MutationOptions::default())
            .await
            .expect("invert");
        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "mistral");
        assert_eq!(calls[0].prompt, "hello");
        assert_eq!(calls[0].system, Persona::Adversary.system_prompt());
    }

    #[tokio::test]
    async fn reversal_runs_before_language_markers() {
        let svc = service(Arc::new(FixedGenerator::new("Hello, world!")));
        let opts = MutationOptions {
            word_reversal: 1.0,
            language_swap: 1.0,
            languages: vec!["es".into()],
        };
        let mut rng = StdRng::seed_from_u64(3);
        let out = svc
            .invert_with_rng("x", "llama2", &opts, &mut rng)
            .await
            .expect("invert");
        assert_eq!(out, "[es:olleH,] [es:dlrow!]");
    }

    #[tokio::test]
    async fn out_of_range_probabilities_are_clamped() {
        let svc = service(Arc::new(FixedGenerator::new("abc def")));
        let opts = MutationOptions {
            word_reversal: 4.0,
            language_swap: -2.0,
            languages: vec!["fr".into()],
        };
        let out = svc.invert("x", "llama2", &opts).await.expect("invert");
        assert_eq!(out, "cba fed");
    }

    #[tokio::test]
    async fn language_probability_without_languages_is_noop() {
        let svc = service(Arc::new(FixedGenerator::new("keep  it")));
        let opts = MutationOptions {
            word_reversal: 0.0,
            language_swap: 1.0,
            languages: Vec::new(),
        };
        let out = svc.invert("x", "llama2", &opts).await.expect("invert");
        assert_eq!(out, "keep  it");
    }

    #[tokio::test]
    async fn generator_failure_is_propagated() {
        let svc = service(Arc::new(FailingGenerator::new("model offline")));
        let err = svc
            .invert("x", "llama2", &MutationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InvertError::Generation(_)));
        assert!(err.to_string().contains("model offline"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_generation_times_out() {
        let generator = Arc::new(SlowGenerator::new(Duration::from_secs(30), "late"));
        let svc = InversionService::new(
            generator,
            Persona::Inverter,
            Some(Duration::from_secs(2)),
        );
        let err = svc
            .invert("x", "llama2", &MutationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InvertError::TimedOut(d) if d == Duration::from_secs(2)));
        assert_eq!(err.to_string(), "generation timed out after 2s");
    }
}
