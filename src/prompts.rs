// Prompt builders for every LLM task. Each generation prompt echoes the
// JSON schema the caller will parse and demands exactly one fenced block.

/// System prompt shared by the design tasks (concept, objective, components,
/// rules, and their regeneration variants).
pub fn designer_system() -> String {
    "You are a veteran board-game designer. You turn briefs, reference games, and \
     playtester feedback into coherent, original tabletop designs. Theme, story, and \
     mechanics must reinforce each other, and every description must be concrete enough \
     to picture at the table. Reference material is inspiration only; never copy it. \
     Respond with exactly one fenced ```json block matching the requested schema and \
     nothing else: no greetings, no commentary."
        .to_string()
}

/// System prompt for play-log simulation.
pub fn referee_system() -> String {
    "You are a meticulous board-game referee simulating a full playthrough. Follow the \
     provided rules exactly, give every player plausible, distinct decisions, and log \
     each turn. Respond with exactly one fenced ```json block matching the requested \
     schema and nothing else."
        .to_string()
}

/// System prompt for balance analysis.
pub fn analyst_system() -> String {
    "You are a board-game balance analyst. You read simulated play logs, identify \
     degenerate strategies, runaway leaders, and dead mechanics, and score overall \
     balance. Be specific and actionable. Respond with exactly one fenced ```json \
     block matching the requested schema and nothing else."
        .to_string()
}

/// The similarity-search query used to pick reference games for a concept
/// request.
pub fn retrieval_query(theme: &str, player_count: &str, average_weight: f64) -> String {
    format!(
        "Theme: {theme}, players: {player_count}, weight: {average_weight}. \
         Find existing board games with similar descriptions and mechanics."
    )
}

/// Concept generation: brief plus retrieved reference games.
pub fn concept(
    theme: &str,
    player_count: &str,
    average_weight: f64,
    retrieved_games: &[String],
) -> String {
    let references = retrieved_games.join("\n\n");
    format!(
        r#"Design one new board-game concept.

## Brief
- Theme: {theme}
- Player count: {player_count}
- Target weight (1.0 light - 5.0 heavy): {average_weight}

## Reference games (inspiration only -- do not copy ideas or mechanics)
---
{references}
---

## Requirements
- The concept must be original: blend mechanics in a new way or invent a rule
  that none of the references use.
- ideaText describes the core play experience and how a session ends.
- mechanics lists the core mechanisms and ties each one to the theme.
- storyline gives the setting and the players' role in it.

Reply with exactly this JSON shape:

```json
{{
    "conceptId": 0,
    "planId": 0,
    "theme": "{theme}",
    "playerCount": "{player_count}",
    "averageWeight": {average_weight},
    "ideaText": "...",
    "mechanics": "...",
    "storyline": "..."
}}
```"#
    )
}

/// Concept regeneration: original record plus free-text feedback.
pub fn regenerate_concept(original_json: &str, feedback: &str, plan_id: i64) -> String {
    format!(
        r#"Revise an existing board-game concept using playtester feedback.

Read the feedback for intent, not just wording: "more casual" implies lower
weight, shorter sessions, and more direct interaction. Decide whether a
partial tweak or a full overhaul serves the feedback best, then produce a
concept whose theme, mechanics, and storyline still fit together.

## Original concept
```json
{original_json}
```

## Feedback
{feedback}

## Plan id to keep
{plan_id}

Reply with exactly this JSON shape. Pick a fresh 4-digit conceptId that is
unlikely to collide with earlier ones; adjust averageWeight in the direction
the feedback points.

```json
{{
    "conceptId": 0,
    "planId": {plan_id},
    "theme": "...",
    "playerCount": "...",
    "averageWeight": 0.0,
    "ideaText": "...",
    "mechanics": "...",
    "storyline": "..."
}}
```"#
    )
}

/// Objective generation from a stored concept (and world, when present).
pub fn objective(concept_json: &str) -> String {
    format!(
        r#"Design the victory objective for this board-game concept.

## Concept
```json
{concept_json}
```

mainGoal is the single win condition; subGoals are two or three ongoing
incentives that shape play toward it; winConditionType names the pattern
(e.g. "Objective race", "Point majority", "Last player standing").

Reply with exactly this JSON shape:

```json
{{
    "mainGoal": "...",
    "subGoals": ["...", "..."],
    "winConditionType": "...",
    "designNote": "..."
}}
```"#
    )
}

/// Component list generation from a full plan record.
pub fn components(plan_json: &str) -> String {
    format!(
        r#"List the physical components this board game ships with.

## Plan (concept, world, objective)
```json
{plan_json}
```

Cover everything the rules will need: board or tiles, cards, tokens, dice or
other randomizers, player pieces. Quantities must be realistic for the player
count. kind is one of: board, card, token, dice, miniature, sheet, other.

Reply with exactly this JSON shape:

```json
{{
    "components": [
        {{ "name": "...", "kind": "...", "quantity": 0, "description": "..." }}
    ]
}}
```"#
    )
}

/// Component regeneration from feedback.
pub fn regenerate_components(original_json: &str, feedback: &str, component_id: i64) -> String {
    format!(
        r#"Revise this component list using the feedback. Keep items the feedback does
not touch; add, remove, or rework the rest.

## Original component list
```json
{original_json}
```

## Feedback
{feedback}

## Component id to keep
{component_id}

Reply with exactly this JSON shape:

```json
{{
    "componentId": {component_id},
    "components": [
        {{ "name": "...", "kind": "...", "quantity": 0, "description": "..." }}
    ]
}}
```"#
    )
}

/// Rule-set generation from a full plan record.
pub fn rules(plan_json: &str) -> String {
    format!(
        r#"Write the rule set for this board-game plan.

## Plan (concept, world, objective)
```json
{plan_json}
```

turnStructure is a numbered arrow chain of the phases in one turn.
actionRules spell out each action a player may take, specific enough to
resolve disputes. victoryCondition must realize the plan's objective.
penaltyRules cover failure states and their costs.

Reply with exactly this JSON shape:

```json
{{
    "turnStructure": "1. ... -> 2. ... -> 3. ...",
    "actionRules": ["...", "..."],
    "victoryCondition": "...",
    "penaltyRules": ["...", "..."],
    "designNote": "..."
}}
```"#
    )
}

/// Rule-set regeneration from feedback. The rule id never changes.
pub fn regenerate_rules(original_json: &str, feedback: &str, rule_id: i64) -> String {
    format!(
        r#"Revise this board-game rule set using the feedback. Apply the feedback
aggressively: rework or replace any rule it criticizes.

## Original rules
```json
{original_json}
```

## Feedback
{feedback}

## Rule id to keep
{rule_id}

Reply with exactly this JSON shape:

```json
{{
    "ruleId": {rule_id},
    "turnStructure": "1. ... -> 2. ... -> 3. ...",
    "actionRules": ["...", "..."],
    "victoryCondition": "...",
    "penaltyRules": ["...", "..."],
    "designNote": "..."
}}
```"#
    )
}

/// Simulated playthrough of a rule set.
pub fn simulation(
    rule_json: &str,
    player_names: &[String],
    max_turns: i64,
    enable_penalty: bool,
) -> String {
    let players = player_names.join(", ");
    let penalty_line = if enable_penalty {
        "Penalty rules are in force; apply them whenever triggered."
    } else {
        "Penalty rules are suspended for this session; never apply them."
    };
    format!(
        r#"Simulate one full game under these rules.

## Rules
```json
{rule_json}
```

## Session
- Players: {players}
- Maximum turns: {max_turns}
- {penalty_line}

Play until the victory condition triggers or the turn limit is reached. Each
player acts every turn; details states what happened and rationale why the
player chose it. Players should pursue different strategies. totalTurns must
not exceed {max_turns}.

Reply with exactly this JSON shape:

```json
{{
    "winner": "...",
    "totalTurns": 0,
    "durationMinutes": 0,
    "victoryCondition": "...",
    "turns": [
        {{
            "turn": 1,
            "actions": [
                {{ "player": "...", "action": "...", "details": "...", "rationale": "..." }}
            ]
        }}
    ]
}}
```"#
    )
}

/// Balance analysis over the simulated play logs of one rule set.
pub fn balance(rule_json: &str, reports_json: &str) -> String {
    format!(
        r#"Analyze the balance of this rule set from its simulated play logs.

## Rules
```json
{rule_json}
```

## Simulated games
```json
{reports_json}
```

Look for dominant strategies, dead actions, snowballing leaders, and turn
lengths that miss the intended pacing. balanceScore is 0.0 (broken) to 10.0
(excellent). issuesDetected and recommendations must reference concrete rules
or log events.

Reply with exactly this JSON shape:

```json
{{
    "balanceScore": 0.0,
    "simulationSummary": "...",
    "issuesDetected": ["...", "..."],
    "recommendations": ["...", "..."]
}}
```"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_prompt_embeds_brief_and_references() {
        let refs = vec!["Game: Settlers".to_string(), "Game: Pandemic".to_string()];
        let prompt = concept("Medieval fantasy", "2-4 players", 2.5, &refs);
        assert!(prompt.contains("Theme: Medieval fantasy"));
        assert!(prompt.contains("Player count: 2-4 players"));
        assert!(prompt.contains("2.5"));
        assert!(prompt.contains("Game: Settlers"));
        assert!(prompt.contains("Game: Pandemic"));
        assert!(prompt.contains("```json"));
    }

    #[test]
    fn test_regenerate_concept_prompt_pins_plan_id() {
        let prompt = regenerate_concept("{\"conceptId\": 12}", "make it casual", 13);
        assert!(prompt.contains("\"planId\": 13"));
        assert!(prompt.contains("make it casual"));
        assert!(prompt.contains("{\"conceptId\": 12}"));
    }

    #[test]
    fn test_regenerate_rules_prompt_pins_rule_id() {
        let prompt = regenerate_rules("{}", "too simple", 23);
        assert!(prompt.contains("\"ruleId\": 23"));
        assert!(prompt.contains("too simple"));
    }

    #[test]
    fn test_simulation_prompt_lists_players_and_limits() {
        let players = vec!["Explorer A".to_string(), "Engineer B".to_string()];
        let prompt = simulation("{}", &players, 10, true);
        assert!(prompt.contains("Explorer A, Engineer B"));
        assert!(prompt.contains("Maximum turns: 10"));
        assert!(prompt.contains("in force"));

        let without = simulation("{}", &players, 10, false);
        assert!(without.contains("suspended"));
    }

    #[test]
    fn test_retrieval_query_mentions_all_inputs() {
        let q = retrieval_query("Exploration", "1-2 players", 4.0);
        assert!(q.contains("Exploration"));
        assert!(q.contains("1-2 players"));
        assert!(q.contains('4'));
    }

    #[test]
    fn test_every_generation_prompt_requests_fenced_json() {
        let prompts = [
            concept("t", "p", 1.0, &[]),
            regenerate_concept("{}", "f", 1),
            objective("{}"),
            components("{}"),
            regenerate_components("{}", "f", 1),
            rules("{}"),
            regenerate_rules("{}", "f", 1),
            simulation("{}", &["a".to_string()], 5, false),
            balance("{}", "[]"),
        ];
        for p in prompts {
            assert!(p.contains("```json"), "missing fence in: {p}");
        }
    }
}
