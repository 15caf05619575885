// Domain records for the design pipeline. All wire JSON is camelCase.
//
// Each generated record has a `*Draft` twin used to parse LLM replies. The
// model cannot be trusted with identity: drafts carry ids only where the
// handler inspects the model's candidate (concepts), and the handlers patch
// ids and timestamps in afterwards.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Current time as an RFC 3339 string with second precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ── Concepts ──────────────────────────────────────────────────────────

/// A generated board-game idea, keyed by `concept_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub concept_id: i64,
    pub plan_id: i64,
    pub theme: String,
    pub player_count: String,
    pub average_weight: f64,
    pub idea_text: String,
    pub mechanics: String,
    pub storyline: String,
    pub created_at: String,
}

/// Concept as parsed out of an LLM reply, before ids and timestamp are fixed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptDraft {
    #[serde(default)]
    pub concept_id: Option<i64>,
    #[serde(default)]
    pub plan_id: Option<i64>,
    pub theme: String,
    pub player_count: String,
    pub average_weight: f64,
    pub idea_text: String,
    pub mechanics: String,
    pub storyline: String,
}

impl ConceptDraft {
    pub fn into_concept(self, concept_id: i64, plan_id: i64, created_at: String) -> Concept {
        Concept {
            concept_id,
            plan_id,
            theme: self.theme,
            player_count: self.player_count,
            average_weight: self.average_weight,
            idea_text: self.idea_text,
            mechanics: self.mechanics,
            storyline: self.storyline,
            created_at,
        }
    }
}

// ── World and objective ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorldSetting {
    pub era: String,
    pub location: String,
    pub factions: Vec<String>,
    pub conflict: String,
}

/// Narrative backdrop attached to a concept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameWorld {
    pub storyline: String,
    pub setting: WorldSetting,
    pub tone: String,
}

/// Win-condition design for a concept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameObjective {
    pub concept_id: i64,
    pub main_goal: String,
    pub sub_goals: Vec<String>,
    pub win_condition_type: String,
    pub design_note: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObjectiveDraft {
    pub main_goal: String,
    pub sub_goals: Vec<String>,
    pub win_condition_type: String,
    pub design_note: String,
}

impl GameObjectiveDraft {
    pub fn into_objective(self, concept_id: i64) -> GameObjective {
        GameObjective {
            concept_id,
            main_goal: self.main_goal,
            sub_goals: self.sub_goals,
            win_condition_type: self.win_condition_type,
            design_note: self.design_note,
        }
    }
}

/// A concept together with whatever world/objective detail exists for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub concept: Concept,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world: Option<GameWorld>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<GameObjective>,
}

// ── Rule sets ─────────────────────────────────────────────────────────

/// A generated rule set, keyed by `rule_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    pub rule_id: i64,
    pub turn_structure: String,
    pub action_rules: Vec<String>,
    pub victory_condition: String,
    pub penalty_rules: Vec<String>,
    pub design_note: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetDraft {
    pub turn_structure: String,
    pub action_rules: Vec<String>,
    pub victory_condition: String,
    pub penalty_rules: Vec<String>,
    pub design_note: String,
}

impl RuleSetDraft {
    pub fn into_rule_set(self, rule_id: i64) -> RuleSet {
        RuleSet {
            rule_id,
            turn_structure: self.turn_structure,
            action_rules: self.action_rules,
            victory_condition: self.victory_condition,
            penalty_rules: self.penalty_rules,
            design_note: self.design_note,
        }
    }
}

// ── Components ────────────────────────────────────────────────────────

/// One physical component of a game (board, card deck, token pool, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentItem {
    pub name: String,
    pub kind: String,
    pub quantity: i64,
    pub description: String,
}

/// The full component list for a plan, keyed by `component_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSet {
    pub component_id: i64,
    pub plan_id: i64,
    pub components: Vec<ComponentItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSetDraft {
    pub components: Vec<ComponentItem>,
}

impl ComponentSetDraft {
    pub fn into_component_set(self, component_id: i64, plan_id: i64) -> ComponentSet {
        ComponentSet {
            component_id,
            plan_id,
            components: self.components,
        }
    }
}

// ── Simulation ────────────────────────────────────────────────────────

/// One logged action inside a simulated turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActionLog {
    pub player: String,
    pub action: String,
    pub details: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TurnLog {
    pub turn: i64,
    pub actions: Vec<ActionLog>,
}

/// A full simulated playthrough of one rule set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub game_id: String,
    pub winner: String,
    pub total_turns: i64,
    pub duration_minutes: i64,
    pub victory_condition: String,
    pub turns: Vec<TurnLog>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationDraft {
    pub winner: String,
    pub total_turns: i64,
    pub duration_minutes: i64,
    pub victory_condition: String,
    pub turns: Vec<TurnLog>,
}

impl SimulationDraft {
    pub fn into_report(self, game_id: String, max_turns: i64) -> SimulationReport {
        SimulationReport {
            game_id,
            winner: self.winner,
            total_turns: self.total_turns.min(max_turns),
            duration_minutes: self.duration_minutes,
            victory_condition: self.victory_condition,
            turns: self.turns,
        }
    }
}

// ── Balance feedback ──────────────────────────────────────────────────

/// LLM verdict on how balanced the simulated games looked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAnalysis {
    pub balance_score: f64,
    pub simulation_summary: String,
    pub issues_detected: Vec<String>,
    pub recommendations: Vec<String>,
}

impl BalanceAnalysis {
    /// Clamp the score into the 0..=10 band the UI expects.
    pub fn clamped(mut self) -> Self {
        self.balance_score = self.balance_score.clamp(0.0, 10.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_wire_format_is_camel_case() {
        let concept = Concept {
            concept_id: 12,
            plan_id: 13,
            theme: "Sci-fi survival".into(),
            player_count: "2-4 players".into(),
            average_weight: 3.5,
            idea_text: "Crash survivors build a base.".into(),
            mechanics: "Resource management, tower defense".into(),
            storyline: "A colony ship breaks apart over an uncharted world.".into(),
            created_at: "2026-08-01T10:00:00Z".into(),
        };
        let json = serde_json::to_value(&concept).unwrap();
        assert_eq!(json["conceptId"], 12);
        assert_eq!(json["planId"], 13);
        assert_eq!(json["averageWeight"], 3.5);
        assert!(json["ideaText"].is_string());
        assert!(json.get("concept_id").is_none());
    }

    #[test]
    fn test_concept_draft_tolerates_missing_ids() {
        let draft: ConceptDraft = serde_json::from_str(
            r#"{
                "theme": "Exploration",
                "playerCount": "1-2 players",
                "averageWeight": 4,
                "ideaText": "t",
                "mechanics": "m",
                "storyline": "s"
            }"#,
        )
        .unwrap();
        assert_eq!(draft.concept_id, None);
        assert_eq!(draft.plan_id, None);
        // Integer weight in the reply still parses as f64
        assert_eq!(draft.average_weight, 4.0);

        let concept = draft.into_concept(1003, 2003, timestamp_now());
        assert_eq!(concept.concept_id, 1003);
        assert_eq!(concept.plan_id, 2003);
    }

    #[test]
    fn test_rule_set_draft_pins_rule_id() {
        let draft: RuleSetDraft = serde_json::from_str(
            r#"{
                "ruleId": 999,
                "turnStructure": "1. Move 2. Act",
                "actionRules": ["Move one space"],
                "victoryCondition": "Defeat the boss",
                "penaltyRules": ["Lose all resources at 0 HP"],
                "designNote": "Fast turns"
            }"#,
        )
        .unwrap();
        // The handler pins the id regardless of what the model wrote
        let rules = draft.into_rule_set(23);
        assert_eq!(rules.rule_id, 23);
    }

    #[test]
    fn test_simulation_draft_clamps_turns() {
        let draft = SimulationDraft {
            winner: "Explorer A".into(),
            total_turns: 42,
            duration_minutes: 55,
            victory_condition: "Repaired the beacon".into(),
            turns: vec![],
        };
        let report = draft.into_report("g-1".into(), 10);
        assert_eq!(report.total_turns, 10);
        assert_eq!(report.game_id, "g-1");
    }

    #[test]
    fn test_balance_score_clamped() {
        let analysis = BalanceAnalysis {
            balance_score: 14.2,
            simulation_summary: "s".into(),
            issues_detected: vec![],
            recommendations: vec![],
        }
        .clamped();
        assert_eq!(analysis.balance_score, 10.0);
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        // RFC 3339 with second precision: 2026-08-07T12:34:56Z
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
    }
}
