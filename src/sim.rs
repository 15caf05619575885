// Simulated play-log generation: fan out LLM-refereed games for a rule set
// and collect the reports.

use futures::future::join_all;
use thiserror::Error;
use uuid::Uuid;

use crate::extract::{self, ExtractError};
use crate::llm::{self, ChatSettings, LlmError};
use crate::model::{RuleSet, SimulationDraft, SimulationReport};
use crate::prompts;

/// How many games one request may fan out; each game is an LLM call.
pub const MAX_GAMES_PER_REQUEST: usize = 5;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("simulated game reply could not be parsed: {0}")]
    Extract(#[from] ExtractError),
    #[error("rule set could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Resolve the requested game count: default 1, capped, never 0.
pub fn effective_count(requested: Option<usize>) -> usize {
    requested.unwrap_or(1).clamp(1, MAX_GAMES_PER_REQUEST)
}

/// Run `count` simulated games concurrently. Every report gets a fresh
/// server-assigned game id; turn counts are clamped to the requested limit.
pub async fn run_batch(
    settings: &ChatSettings,
    rules: &RuleSet,
    player_names: &[String],
    max_turns: i64,
    enable_penalty: bool,
    count: usize,
) -> Result<Vec<SimulationReport>, SimulationError> {
    let rule_json = serde_json::to_string_pretty(rules)?;
    let system = prompts::referee_system();
    let user = prompts::simulation(&rule_json, player_names, max_turns, enable_penalty);

    let games = (0..count).map(|_| {
        let system = system.clone();
        let user = user.clone();
        async move {
            let reply = llm::generate(settings, &system, &user).await?;
            let draft: SimulationDraft = extract::payload(&reply)?;
            Ok::<_, SimulationError>(draft.into_report(Uuid::new_v4().to_string(), max_turns))
        }
    });

    join_all(games).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_count_defaults_to_one() {
        assert_eq!(effective_count(None), 1);
    }

    #[test]
    fn test_effective_count_caps_fan_out() {
        assert_eq!(effective_count(Some(3)), 3);
        assert_eq!(effective_count(Some(50)), MAX_GAMES_PER_REQUEST);
        assert_eq!(effective_count(Some(0)), 1);
    }
}
