use std::time::Duration;

use colored::*;
use tracing::info;

/// USD prices per 1000 tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl ModelPricing {
    pub fn cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (f64::from(prompt_tokens) / 1000.0) * self.prompt_per_1k
            + (f64::from(completion_tokens) / 1000.0) * self.completion_per_1k
    }
}

pub fn model_pricing(model: &str) -> Option<ModelPricing> {
    // Longest prefix first so the 32k tier is not priced as base gpt-4.
    const TABLE: &[(&str, ModelPricing)] = &[
        (
            "gpt-4-32k",
            ModelPricing {
                prompt_per_1k: 0.06,
                completion_per_1k: 0.12,
            },
        ),
        (
            "gpt-4",
            ModelPricing {
                prompt_per_1k: 0.03,
                completion_per_1k: 0.06,
            },
        ),
        (
            "gpt-3.5-turbo",
            ModelPricing {
                prompt_per_1k: 0.002,
                completion_per_1k: 0.002,
            },
        ),
    ];

    TABLE
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map(|(_, pricing)| *pricing)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiCallStats {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub elapsed: Duration,
    /// `None` when the model has no known price.
    pub cost: Option<f64>,
}

impl ApiCallStats {
    pub fn tokens_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= f64::EPSILON {
            return 0.0;
        }
        f64::from(self.completion_tokens) / secs
    }

    pub fn summary(&self) -> String {
        let cost = match self.cost {
            Some(cost) => format!("${cost:.2}"),
            None => "unknown".to_string(),
        };
        format!(
            "Speed: {:.2} tkns/s | Cost: {}",
            self.tokens_per_second(),
            cost
        )
    }
}

/// Token and cost accounting for one session.
#[derive(Debug, Default)]
pub struct CostTracker {
    total_cost: f64,
    total_prompt_tokens: u64,
    total_completion_tokens: u64,
    calls: usize,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_api_call(
        &mut self,
        prompt_tokens: u32,
        completion_tokens: u32,
        model: &str,
        elapsed: Duration,
    ) -> ApiCallStats {
        let cost =
            model_pricing(model).map(|pricing| pricing.cost(prompt_tokens, completion_tokens));

        self.calls += 1;
        self.total_prompt_tokens += u64::from(prompt_tokens);
        self.total_completion_tokens += u64::from(completion_tokens);
        self.total_cost += cost.unwrap_or(0.0);

        let stats = ApiCallStats {
            model: model.to_string(),
            prompt_tokens,
            completion_tokens,
            elapsed,
            cost,
        };
        info!(
            model = %stats.model,
            prompt_tokens,
            completion_tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            cost = ?stats.cost,
            "api call recorded"
        );
        stats
    }

    /// Record a call and print its speed and cost.
    pub fn display_api_call_stats(
        &mut self,
        prompt_tokens: u32,
        completion_tokens: u32,
        model: &str,
        elapsed: Duration,
    ) -> ApiCallStats {
        let stats = self.record_api_call(prompt_tokens, completion_tokens, model, elapsed);
        println!("{}", stats.summary().cyan());
        stats
    }

    pub fn display_total_cost(&self) {
        println!(
            "{}",
            format!("Total session cost: ${:.2}", self.total_cost).cyan()
        );
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_tokens(&self) -> (u64, u64) {
        (self.total_prompt_tokens, self.total_completion_tokens)
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn extended_tier_is_priced_separately() {
        let base = model_pricing("gpt-4-0314").unwrap();
        let extended = model_pricing("gpt-4-32k-0314").unwrap();

        assert!(close(base.prompt_per_1k, 0.03));
        assert!(close(extended.prompt_per_1k, 0.06));
        assert!(model_pricing("llama-3").is_none());
    }

    #[test]
    fn record_computes_cost_and_accumulates_totals() {
        let mut tracker = CostTracker::new();

        let stats = tracker.record_api_call(2000, 500, "gpt-4-0314", Duration::from_secs(5));
        assert!(close(stats.cost.unwrap(), 0.06 + 0.03));
        assert!(close(stats.tokens_per_second(), 100.0));

        tracker.record_api_call(1000, 1000, "gpt-4-32k-0314", Duration::from_secs(1));

        assert_eq!(tracker.calls(), 2);
        assert_eq!(tracker.total_tokens(), (3000, 1500));
        assert!(close(tracker.total_cost(), 0.09 + 0.18));
    }

    #[test]
    fn unknown_model_has_no_cost() {
        let mut tracker = CostTracker::new();

        let stats = tracker.record_api_call(100, 100, "local-model", Duration::ZERO);

        assert_eq!(stats.cost, None);
        assert_eq!(stats.tokens_per_second(), 0.0);
        assert_eq!(stats.summary(), "Speed: 0.00 tkns/s | Cost: unknown");
        assert!(close(tracker.total_cost(), 0.0));
    }
}
