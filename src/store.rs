// In-process design-record store. All state lives in locked maps keyed by
// integer id; there is no persistence. The maps are seeded with fixture
// records so regeneration endpoints work out of the box.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::Rng;

use crate::model::{
    ComponentItem, ComponentSet, Concept, GameObjective, GameWorld, PlanRecord, RuleSet,
    SimulationReport, WorldSetting,
};

/// Thread-safe store for every record family the design pipeline produces.
#[derive(Debug, Clone, Default)]
pub struct DesignStore {
    concepts: Arc<Mutex<HashMap<i64, Concept>>>,
    worlds: Arc<Mutex<HashMap<i64, GameWorld>>>,
    objectives: Arc<Mutex<HashMap<i64, GameObjective>>>,
    rules: Arc<Mutex<HashMap<i64, RuleSet>>>,
    components: Arc<Mutex<HashMap<i64, ComponentSet>>>,
    simulations: Arc<Mutex<HashMap<i64, Vec<SimulationReport>>>>,
    last_simulated_rule: Arc<Mutex<Option<i64>>>,
}

impl DesignStore {
    /// An empty store (used by tests).
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with the demo fixtures.
    pub fn seeded() -> Self {
        let store = Self::new();
        for concept in seed_concepts() {
            store.insert_concept(concept);
        }
        for (concept_id, world) in seed_worlds() {
            store.worlds.lock().unwrap().insert(concept_id, world);
        }
        for objective in seed_objectives() {
            store.set_objective(objective);
        }
        for rules in seed_rules() {
            store.insert_rule(rules);
        }
        store.insert_component_set(seed_components());
        store
    }

    // ── Concepts ──────────────────────────────────────────────────────

    pub fn get_concept(&self, concept_id: i64) -> Option<Concept> {
        self.concepts.lock().unwrap().get(&concept_id).cloned()
    }

    pub fn insert_concept(&self, concept: Concept) {
        self.concepts
            .lock()
            .unwrap()
            .insert(concept.concept_id, concept);
    }

    /// Pick a concept id for a regenerated record: keep the model's candidate
    /// when it is positive and unused, otherwise allocate `max + 1` floored
    /// at 1000 so fixture ids stay clear of generated ones.
    pub fn unique_concept_id(&self, candidate: Option<i64>) -> i64 {
        let concepts = self.concepts.lock().unwrap();
        match candidate {
            Some(id) if id > 0 && !concepts.contains_key(&id) => id,
            _ => {
                let max_id = concepts.keys().max().copied().unwrap_or(0);
                (max_id + 1).max(1000)
            }
        }
    }

    /// Draw an unused 4-digit concept id for a freshly generated record.
    pub fn fresh_concept_id(&self) -> i64 {
        let concepts = self.concepts.lock().unwrap();
        let mut rng = rand::thread_rng();
        for _ in 0..32 {
            let id = rng.gen_range(1000..10000);
            if !concepts.contains_key(&id) {
                return id;
            }
        }
        let max_id = concepts.keys().max().copied().unwrap_or(0);
        (max_id + 1).max(1000)
    }

    /// Draw a 4-digit plan id for a freshly generated concept.
    pub fn fresh_plan_id(&self) -> i64 {
        rand::thread_rng().gen_range(2000..10000)
    }

    // ── Worlds and objectives ─────────────────────────────────────────

    pub fn get_world(&self, concept_id: i64) -> Option<GameWorld> {
        self.worlds.lock().unwrap().get(&concept_id).cloned()
    }

    pub fn get_objective(&self, concept_id: i64) -> Option<GameObjective> {
        self.objectives.lock().unwrap().get(&concept_id).cloned()
    }

    pub fn set_objective(&self, objective: GameObjective) {
        self.objectives
            .lock()
            .unwrap()
            .insert(objective.concept_id, objective);
    }

    /// Assemble the plan view for a concept: the concept itself plus
    /// whatever world/objective detail exists for it.
    pub fn plan(&self, concept_id: i64) -> Option<PlanRecord> {
        let concept = self.get_concept(concept_id)?;
        Some(PlanRecord {
            world: self.get_world(concept_id),
            objective: self.get_objective(concept_id),
            concept,
        })
    }

    /// Look up a plan by its `plan_id` (components are requested per plan,
    /// not per concept).
    pub fn plan_by_plan_id(&self, plan_id: i64) -> Option<PlanRecord> {
        let concept_id = self
            .concepts
            .lock()
            .unwrap()
            .values()
            .find(|c| c.plan_id == plan_id)
            .map(|c| c.concept_id)?;
        self.plan(concept_id)
    }

    // ── Rule sets ─────────────────────────────────────────────────────

    pub fn get_rule(&self, rule_id: i64) -> Option<RuleSet> {
        self.rules.lock().unwrap().get(&rule_id).cloned()
    }

    pub fn insert_rule(&self, rules: RuleSet) {
        self.rules.lock().unwrap().insert(rules.rule_id, rules);
    }

    pub fn next_rule_id(&self) -> i64 {
        let rules = self.rules.lock().unwrap();
        let max_id = rules.keys().max().copied().unwrap_or(0);
        (max_id + 1).max(1000)
    }

    // ── Component sets ────────────────────────────────────────────────

    pub fn get_component_set(&self, component_id: i64) -> Option<ComponentSet> {
        self.components.lock().unwrap().get(&component_id).cloned()
    }

    pub fn insert_component_set(&self, set: ComponentSet) {
        self.components
            .lock()
            .unwrap()
            .insert(set.component_id, set);
    }

    pub fn next_component_id(&self) -> i64 {
        let components = self.components.lock().unwrap();
        let max_id = components.keys().max().copied().unwrap_or(0);
        (max_id + 1).max(1000)
    }

    // ── Simulations ───────────────────────────────────────────────────

    /// Record a batch of simulated games for a rule set and mark it as the
    /// latest, which is what the balance endpoint analyzes.
    pub fn record_simulations(&self, rule_id: i64, reports: Vec<SimulationReport>) {
        self.simulations
            .lock()
            .unwrap()
            .entry(rule_id)
            .or_default()
            .extend(reports);
        *self.last_simulated_rule.lock().unwrap() = Some(rule_id);
    }

    /// The most recently simulated rule and all of its reports, if any games
    /// have been simulated this process.
    pub fn latest_simulations(&self) -> Option<(i64, Vec<SimulationReport>)> {
        let rule_id = (*self.last_simulated_rule.lock().unwrap())?;
        let reports = self
            .simulations
            .lock()
            .unwrap()
            .get(&rule_id)
            .cloned()
            .unwrap_or_default();
        Some((rule_id, reports))
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────
// Stand-ins for a real project database; ids are referenced by the demo
// front end, so keep them stable.

fn seed_concepts() -> Vec<Concept> {
    vec![
        Concept {
            concept_id: 1001,
            plan_id: 2001,
            theme: "Strategy".into(),
            player_count: "2-4 players".into(),
            average_weight: 3.0,
            idea_text: "Players fight turn-based battles across varied terrain, checking \
                        their rivals while drafting new cards each round to summon units, \
                        expand territory, and secure resources."
                .into(),
            mechanics: "Area control, card drafting, hand management, resource management"
                .into(),
            storyline: "Heirs of an ancient empire clash over a legendary relic. Desert \
                        sandstorms, forest predators, and frozen ridges shape every battle, \
                        and each house leans on a unique ability to claim victory."
                .into(),
            created_at: "2025-07-24T15:00:00Z".into(),
        },
        Concept {
            concept_id: 1002,
            plan_id: 2002,
            theme: "Exploration".into(),
            player_count: "1-2 players".into(),
            average_weight: 4.0,
            idea_text: "Players explore an uncharted planet, fight off hostile alien \
                        wildlife, and dig into the secrets of ancient ruins, gathering \
                        resources and upgrading gear to survive long enough to finish the \
                        expedition."
                .into(),
            mechanics: "Deck building, tile placement, dice rolling, cooperative play".into(),
            storyline: "With Earth's resources spent, humanity set out for a new home. The \
                        planet they found hides predatory life and dormant ruins; crews must \
                        band together, bargain over scarce supplies, or betray each other to \
                        survive."
                .into(),
            created_at: "2025-07-24T16:00:00Z".into(),
        },
        Concept {
            concept_id: 12,
            plan_id: 13,
            theme: "Sci-fi survival strategy".into(),
            player_count: "2-4 players".into(),
            average_weight: 3.5,
            idea_text: "Survivors of a crash landing build a base from limited salvage, \
                        defend it against a hostile environment and alien creatures, and \
                        race to escape. Players may pool resources or raid each other's \
                        stockpiles."
                .into(),
            mechanics: "Resource management, base building, tower defense, asymmetric \
                        abilities, co-op and betrayal"
                .into(),
            storyline: "The colony ship carrying humanity's last hope breaks apart over an \
                        uncharted planet. The world below is beautiful and lethal, and \
                        something intelligent is watching the wreckage."
                .into(),
            created_at: "2025-07-25T10:00:00Z".into(),
        },
    ]
}

fn seed_worlds() -> Vec<(i64, GameWorld)> {
    vec![
        (
            1001,
            GameWorld {
                storyline: "On a continent ruined by long war, the last relic of the old \
                            empire, the Aether Crystal, has resurfaced. Whoever claims it \
                            will rule; every house marches."
                    .into(),
                setting: WorldSetting {
                    era: "Five hundred years after the empire fell".into(),
                    location: "The blighted continent of Arkadia".into(),
                    factions: vec![
                        "House of the Black Eagle".into(),
                        "House of the Golden Lion".into(),
                        "House of the White Wolf".into(),
                    ],
                    conflict: "Territorial and resource war over the Aether Crystal".into(),
                },
                tone: "Strategic rivalry and territorial expansion".into(),
            },
        ),
        (
            1002,
            GameWorld {
                storyline: "Humanity's last hope is the unknown planet Xenon. Beneath its \
                            calm surface lie the remains of an older civilization, lethal \
                            native life, and energy fields nobody can explain. The survey \
                            team must survive while decoding the planet's secret."
                    .into(),
                setting: WorldSetting {
                    era: "Year 2242".into(),
                    location: "Planet Xenon".into(),
                    factions: vec![
                        "Earth survey team".into(),
                        "Precursor relic hunters".into(),
                        "Native Xenon lifeforms".into(),
                    ],
                    conflict: "Survival in a hostile biosphere while deciphering precursor \
                               ruins"
                        .into(),
                },
                tone: "Tense survival and mystery exploration".into(),
            },
        ),
        (
            12,
            GameWorld {
                storyline: "The ark ship Archon was torn apart above Xenos-7. The few \
                            survivors crashed into a wasteland of red dust storms, strange \
                            flora, and the burrowing creatures the crew call Coral. They \
                            must rebuild a shattered distress beacon and hold out until \
                            rescue."
                    .into(),
                setting: WorldSetting {
                    era: "2350, post-collapse spacefaring age".into(),
                    location: "The Red Barrens of Xenos-7".into(),
                    factions: vec![
                        "Archon survivors".into(),
                        "Native Coral swarms".into(),
                        "A dormant machine intelligence".into(),
                    ],
                    conflict: "Securing beacon parts while surviving the planet's threats"
                        .into(),
                },
                tone: "Desperate survival, cooperation and betrayal".into(),
            },
        ),
    ]
}

fn seed_objectives() -> Vec<GameObjective> {
    vec![
        GameObjective {
            concept_id: 1001,
            main_goal: "Be the first house to collect three Aether Crystals.".into(),
            sub_goals: vec![
                "Gain bonus resources each turn for every unclaimed crystal field inside \
                 your territory"
                    .into(),
                "Capturing a rival stronghold unlocks a unique elite unit".into(),
            ],
            win_condition_type: "Objective race".into(),
            design_note: "Rewards territorial expansion and relic hunting while keeping \
                          direct combat attractive."
                .into(),
        },
        GameObjective {
            concept_id: 1002,
            main_goal: "Activate all five core relics of Xenon and repair the escape \
                        shuttle before the expedition collapses."
                .into(),
            sub_goals: vec![
                "Explore a new tile each turn to open the map and bank rewards".into(),
                "Defeat apex predators to collect rare materials for gear upgrades".into(),
            ],
            win_condition_type: "Objective race".into(),
            design_note: "Leans on cooperation and tight resource play; exploration should \
                          feel rewarding and threatening at once."
                .into(),
        },
        GameObjective {
            concept_id: 12,
            main_goal: "Repair all three core parts of the distress beacon and transmit \
                        the rescue signal."
                .into(),
            sub_goals: vec![
                "Certain resource buildings grant a defense bonus the turn they are built"
                    .into(),
                "Defeating a Coral broodmother drops a rare upgrade item".into(),
            ],
            win_condition_type: "Objective race".into(),
            design_note: "Base building and resource triage carry the tension; co-op and \
                          betrayal stay viable to the end."
                .into(),
        },
    ]
}

fn seed_rules() -> Vec<RuleSet> {
    vec![
        RuleSet {
            rule_id: 2222,
            turn_structure: "1. Collect resources -> 2. Choose an action -> 3. Fight or \
                             negotiate -> 4. End-of-turn upkeep"
                .into(),
            action_rules: vec![
                "Collecting resources grants two random cards and one token".into(),
                "Negotiation offers to a rival camp may be made in secret".into(),
                "Combat is resolved with dice; extra cards may be committed".into(),
            ],
            victory_condition: "First player to collect three relics wins immediately".into(),
            penalty_rules: vec![
                "A player at zero resources loses their action phase".into(),
                "Betraying an alliance blocks negotiation for the next two turns".into(),
            ],
            design_note: "Keeps the flow intuitive while letting negotiation and betrayal \
                          emerge naturally."
                .into(),
        },
        RuleSet {
            rule_id: 23,
            turn_structure: "1. Start of turn -> 2. Move -> 3. Act (gather or play a card) \
                             -> 4. End of turn"
                .into(),
            action_rules: vec![
                "Move: shift your miniature one adjacent space".into(),
                "Gather: take one resource token from your current tile".into(),
                "Play a card: discard one card from hand for its effect, such as an extra \
                 move or an attack"
                    .into(),
            ],
            victory_condition: "Defeat the boss monster at the center of the map".into(),
            penalty_rules: vec![
                "At zero health you lose all resources and skip a turn".into(),
                "Certain event cards force movement".into(),
            ],
            design_note: "Aims for short, fast turns.".into(),
        },
    ]
}

fn seed_components() -> ComponentSet {
    ComponentSet {
        component_id: 3543,
        plan_id: 13,
        components: vec![
            ComponentItem {
                name: "Modular crash-site board".into(),
                kind: "board".into(),
                quantity: 1,
                description: "Nine double-sided terrain plates forming the Red Barrens"
                    .into(),
            },
            ComponentItem {
                name: "Terrain tokens".into(),
                kind: "token".into(),
                quantity: 40,
                description: "Dust storm, crater, and ruin markers placed during setup"
                    .into(),
            },
            ComponentItem {
                name: "Salvage cards".into(),
                kind: "card".into(),
                quantity: 60,
                description: "Scrap, fuel, and circuitry drawn when scavenging".into(),
            },
            ComponentItem {
                name: "Survivor miniatures".into(),
                kind: "miniature".into(),
                quantity: 4,
                description: "One sculpted figure per playable survivor".into(),
            },
            ComponentItem {
                name: "Coral swarm dice".into(),
                kind: "dice".into(),
                quantity: 6,
                description: "Custom dice driving creature attacks and storm events".into(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::timestamp_now;

    fn concept(concept_id: i64, plan_id: i64) -> Concept {
        Concept {
            concept_id,
            plan_id,
            theme: "t".into(),
            player_count: "2-4 players".into(),
            average_weight: 2.5,
            idea_text: "i".into(),
            mechanics: "m".into(),
            storyline: "s".into(),
            created_at: timestamp_now(),
        }
    }

    #[test]
    fn test_seeded_fixtures_present() {
        let store = DesignStore::seeded();
        assert!(store.get_concept(1001).is_some());
        assert!(store.get_concept(1002).is_some());
        assert_eq!(store.get_concept(12).unwrap().plan_id, 13);
        assert!(store.get_world(12).is_some());
        assert!(store.get_objective(1002).is_some());
        assert!(store.get_rule(2222).is_some());
        assert!(store.get_rule(23).is_some());
        assert_eq!(store.get_component_set(3543).unwrap().plan_id, 13);
        assert!(store.get_concept(555).is_none());
    }

    #[test]
    fn test_plan_assembles_concept_world_objective() {
        let store = DesignStore::seeded();
        let plan = store.plan(12).unwrap();
        assert_eq!(plan.concept.concept_id, 12);
        assert!(plan.world.is_some());
        assert!(plan.objective.is_some());

        // Plans are also addressable by plan id
        let by_plan = store.plan_by_plan_id(13).unwrap();
        assert_eq!(by_plan.concept.concept_id, 12);
        assert!(store.plan_by_plan_id(999).is_none());
    }

    #[test]
    fn test_unique_concept_id_keeps_unused_candidate() {
        let store = DesignStore::seeded();
        assert_eq!(store.unique_concept_id(Some(4242)), 4242);
    }

    #[test]
    fn test_unique_concept_id_rejects_taken_and_invalid() {
        let store = DesignStore::seeded();
        // 1002 is seeded, so max+1 (floored at 1000) is used instead
        let id = store.unique_concept_id(Some(1002));
        assert_eq!(id, 1003);
        assert_eq!(store.unique_concept_id(Some(-5)), 1003);
        assert_eq!(store.unique_concept_id(None), 1003);
    }

    #[test]
    fn test_unique_concept_id_floors_at_1000() {
        let store = DesignStore::new();
        store.insert_concept(concept(7, 8));
        assert_eq!(store.unique_concept_id(None), 1000);
    }

    #[test]
    fn test_fresh_concept_id_avoids_collisions() {
        let store = DesignStore::seeded();
        for _ in 0..50 {
            let id = store.fresh_concept_id();
            assert!((1000..10000).contains(&id));
            assert!(store.get_concept(id).is_none());
        }
    }

    #[test]
    fn test_insert_overwrites_existing_id() {
        let store = DesignStore::new();
        store.insert_concept(concept(5000, 1));
        let mut replacement = concept(5000, 2);
        replacement.theme = "replaced".into();
        store.insert_concept(replacement);
        let stored = store.get_concept(5000).unwrap();
        assert_eq!(stored.theme, "replaced");
        assert_eq!(stored.plan_id, 2);
    }

    #[test]
    fn test_next_rule_and_component_ids() {
        let store = DesignStore::seeded();
        // Seeded rules are 23 and 2222
        assert_eq!(store.next_rule_id(), 2223);
        assert_eq!(store.next_component_id(), 3544);

        let empty = DesignStore::new();
        assert_eq!(empty.next_rule_id(), 1000);
        assert_eq!(empty.next_component_id(), 1000);
    }

    #[test]
    fn test_simulations_tracking() {
        let store = DesignStore::new();
        assert!(store.latest_simulations().is_none());

        let report = SimulationReport {
            game_id: "g-1".into(),
            winner: "A".into(),
            total_turns: 8,
            duration_minutes: 30,
            victory_condition: "v".into(),
            turns: vec![],
        };
        store.record_simulations(23, vec![report.clone()]);
        let (rule_id, reports) = store.latest_simulations().unwrap();
        assert_eq!(rule_id, 23);
        assert_eq!(reports.len(), 1);

        // A second batch for the same rule accumulates
        store.record_simulations(23, vec![report.clone()]);
        let (_, reports) = store.latest_simulations().unwrap();
        assert_eq!(reports.len(), 2);

        // Simulating another rule moves the latest marker
        store.record_simulations(2222, vec![report]);
        let (rule_id, reports) = store.latest_simulations().unwrap();
        assert_eq!(rule_id, 2222);
        assert_eq!(reports.len(), 1);
    }
}
