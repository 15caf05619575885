// HTTP API routes: concept/objective/component/rule generation and
// regeneration, rule simulation, and balance feedback.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::extract::{self, ExtractError};
use crate::llm::{self, ChatSettings, LlmError};
use crate::metrics;
use crate::model::{
    timestamp_now, BalanceAnalysis, ComponentSetDraft, ConceptDraft, GameObjectiveDraft,
    RuleSetDraft,
};
use crate::prompts;
use crate::retrieval::Retriever;
use crate::sim::{self, SimulationError};
use crate::store::DesignStore;

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConceptRequest {
    pub theme: String,
    pub player_count: String,
    pub average_weight: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateConceptRequest {
    pub concept_id: i64,
    pub plan_id: i64,
    pub feedback: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateGoalRequest {
    pub concept_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateComponentsRequest {
    pub plan_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateComponentsRequest {
    pub component_id: i64,
    pub feedback: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRuleRequest {
    pub concept_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRuleRequest {
    pub rule_id: i64,
    pub feedback: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRuleRequest {
    pub rule_id: i64,
    pub player_names: Vec<String>,
    pub max_turns: i64,
    #[serde(default = "default_enable_penalty")]
    pub enable_penalty: bool,
    #[serde(default)]
    pub simulation_count: Option<usize>,
}

fn default_enable_penalty() -> bool {
    true
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub store: DesignStore,
    pub retriever: Option<Retriever>,
    pub config: Config,
}

impl AppState {
    /// Settings for a generation task (concept/objective/components/rules,
    /// simulation, balance).
    fn generate_settings(&self, temperature: f32) -> ChatSettings {
        ChatSettings::new(
            &self.config.llm_provider,
            &self.config.generate_model,
            &self.config.api_key,
            temperature,
        )
    }

    /// Settings for a regeneration task; these run on the stronger model.
    fn regenerate_settings(&self, temperature: f32) -> ChatSettings {
        ChatSettings::new(
            &self.config.llm_provider,
            &self.config.regenerate_model,
            &self.config.api_key,
            temperature,
        )
    }
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn llm_error(task: &str, e: &LlmError) -> impl IntoResponse {
    tracing::error!("{task}: LLM call failed: {e}");
    json_error(StatusCode::BAD_GATEWAY, &format!("LLM call failed: {e}"))
}

fn reply_error(task: &str, reply: &str, e: &ExtractError) -> impl IntoResponse {
    tracing::error!("{task}: unusable model reply: {e}");
    tracing::debug!("{task}: raw reply: {}", extract::snippet(reply));
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!(
            "could not parse the model reply: {e}; reply started with: {}",
            extract::snippet(reply)
        ),
    )
}

/// Serialize a record for embedding into a prompt.
fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Run one chat call with latency and outcome metrics attached.
async fn timed_generate(
    task: &str,
    settings: &ChatSettings,
    system: &str,
    user: &str,
) -> Result<String, LlmError> {
    let timer = std::time::Instant::now();
    let result = llm::generate(settings, system, user).await;
    metrics::LLM_REQUEST_DURATION_SECONDS
        .with_label_values(&[task])
        .observe(timer.elapsed().as_secs_f64());
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::LLM_REQUESTS_TOTAL
        .with_label_values(&[task, status])
        .inc();
    result
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(store: DesignStore, retriever: Option<Retriever>, config: Config) -> Router {
    let state = AppState {
        store,
        retriever,
        config,
    };

    Router::new()
        .route("/health", get(health_check))
        // Concepts
        .route("/api/plans/generate-concept", post(generate_concept))
        .route("/api/plans/regenerate-concept", post(regenerate_concept))
        // Objectives
        .route("/api/plans/generate-goal", post(generate_goal))
        // Components
        .route("/api/plans/generate-components", post(generate_components))
        .route(
            "/api/plans/regenerate-components",
            post(regenerate_components),
        )
        // Rules
        .route("/api/plans/generate-rule", post(generate_rule))
        .route("/api/plans/regenerate-rule", post(regenerate_rule))
        // Simulation and balance
        .route("/api/simulate/rule-test", post(simulate_rule_test))
        .route("/api/feedback/balance", get(balance_feedback))
        // Observability
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "boardsmith-backend" }))
}

// ── Concept handlers ──────────────────────────────────────────────────

async fn generate_concept(
    State(state): State<AppState>,
    Json(req): Json<GenerateConceptRequest>,
) -> impl IntoResponse {
    if req.theme.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "theme is required").into_response();
    }
    if req.player_count.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "playerCount is required").into_response();
    }
    if !(1.0..=5.0).contains(&req.average_weight) {
        return json_error(
            StatusCode::BAD_REQUEST,
            "averageWeight must be between 1.0 and 5.0",
        )
        .into_response();
    }

    let retriever = match &state.retriever {
        Some(r) => r,
        None => {
            return json_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "reference retriever unavailable: no catalog was loaded at startup",
            )
            .into_response()
        }
    };

    let query = prompts::retrieval_query(&req.theme, &req.player_count, req.average_weight);
    metrics::RETRIEVER_QUERIES_TOTAL.inc();
    let retrieved = match retriever.query(&query).await {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!("generate-concept: similarity lookup failed: {e}");
            return json_error(StatusCode::BAD_GATEWAY, "similarity lookup failed")
                .into_response();
        }
    };

    let user = prompts::concept(&req.theme, &req.player_count, req.average_weight, &retrieved);
    let settings = state.generate_settings(0.7);
    let reply =
        match timed_generate("generate-concept", &settings, &prompts::designer_system(), &user)
            .await
        {
            Ok(reply) => reply,
            Err(e) => return llm_error("generate-concept", &e).into_response(),
        };

    let draft: ConceptDraft = match extract::payload(&reply) {
        Ok(draft) => draft,
        Err(e) => return reply_error("generate-concept", &reply, &e).into_response(),
    };

    // Keep the model's ids when it produced usable ones, otherwise draw
    // 4-digit fallbacks.
    let concept_id = match draft.concept_id {
        Some(id) if id > 0 => id,
        _ => state.store.fresh_concept_id(),
    };
    let plan_id = match draft.plan_id {
        Some(id) if id > 0 => id,
        _ => state.store.fresh_plan_id(),
    };

    let concept = draft.into_concept(concept_id, plan_id, timestamp_now());
    state.store.insert_concept(concept.clone());
    metrics::CONCEPTS_GENERATED_TOTAL.inc();

    (StatusCode::OK, Json(json!(concept))).into_response()
}

async fn regenerate_concept(
    State(state): State<AppState>,
    Json(req): Json<RegenerateConceptRequest>,
) -> impl IntoResponse {
    let original = match state.store.get_concept(req.concept_id) {
        Some(concept) => concept,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No concept found for conceptId {}", req.concept_id),
            )
            .into_response()
        }
    };

    // The stored plan id wins over whatever the client sent.
    let plan_id = if original.plan_id == req.plan_id {
        req.plan_id
    } else {
        tracing::warn!(
            "regenerate-concept: requested planId {} does not match stored planId {}; \
             keeping the stored one",
            req.plan_id,
            original.plan_id
        );
        original.plan_id
    };

    let user = prompts::regenerate_concept(&pretty_json(&original), &req.feedback, plan_id);
    let settings = state.regenerate_settings(0.9);
    let reply = match timed_generate(
        "regenerate-concept",
        &settings,
        &prompts::designer_system(),
        &user,
    )
    .await
    {
        Ok(reply) => reply,
        Err(e) => return llm_error("regenerate-concept", &e).into_response(),
    };

    let draft: ConceptDraft = match extract::payload(&reply) {
        Ok(draft) => draft,
        Err(e) => return reply_error("regenerate-concept", &reply, &e).into_response(),
    };

    let concept_id = state.store.unique_concept_id(draft.concept_id);
    if draft.concept_id != Some(concept_id) {
        tracing::warn!(
            "regenerate-concept: model conceptId {:?} was missing or taken; assigned {}",
            draft.concept_id,
            concept_id
        );
    }

    let concept = draft.into_concept(concept_id, plan_id, timestamp_now());
    state.store.insert_concept(concept.clone());
    metrics::CONCEPTS_GENERATED_TOTAL.inc();
    tracing::info!("regenerate-concept: stored new concept {}", concept_id);

    (StatusCode::OK, Json(json!(concept))).into_response()
}

// ── Objective handler ─────────────────────────────────────────────────

async fn generate_goal(
    State(state): State<AppState>,
    Json(req): Json<GenerateGoalRequest>,
) -> impl IntoResponse {
    let concept = match state.store.get_concept(req.concept_id) {
        Some(concept) => concept,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No concept found for conceptId {}", req.concept_id),
            )
            .into_response()
        }
    };

    // World detail enriches the prompt when it exists.
    let mut context = json!({ "concept": concept });
    if let Some(world) = state.store.get_world(req.concept_id) {
        context["world"] = json!(world);
    }

    let user = prompts::objective(&pretty_json(&context));
    let settings = state.generate_settings(0.7);
    let reply =
        match timed_generate("generate-goal", &settings, &prompts::designer_system(), &user).await
        {
            Ok(reply) => reply,
            Err(e) => return llm_error("generate-goal", &e).into_response(),
        };

    let draft: GameObjectiveDraft = match extract::payload(&reply) {
        Ok(draft) => draft,
        Err(e) => return reply_error("generate-goal", &reply, &e).into_response(),
    };

    let objective = draft.into_objective(req.concept_id);
    state.store.set_objective(objective.clone());

    (StatusCode::OK, Json(json!(objective))).into_response()
}

// ── Component handlers ────────────────────────────────────────────────

async fn generate_components(
    State(state): State<AppState>,
    Json(req): Json<GenerateComponentsRequest>,
) -> impl IntoResponse {
    let plan = match state.store.plan_by_plan_id(req.plan_id) {
        Some(plan) => plan,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No plan found for planId {}", req.plan_id),
            )
            .into_response()
        }
    };

    let user = prompts::components(&pretty_json(&plan));
    let settings = state.generate_settings(0.7);
    let reply = match timed_generate(
        "generate-components",
        &settings,
        &prompts::designer_system(),
        &user,
    )
    .await
    {
        Ok(reply) => reply,
        Err(e) => return llm_error("generate-components", &e).into_response(),
    };

    let draft: ComponentSetDraft = match extract::payload(&reply) {
        Ok(draft) => draft,
        Err(e) => return reply_error("generate-components", &reply, &e).into_response(),
    };

    let set = draft.into_component_set(state.store.next_component_id(), req.plan_id);
    state.store.insert_component_set(set.clone());

    (StatusCode::OK, Json(json!(set))).into_response()
}

async fn regenerate_components(
    State(state): State<AppState>,
    Json(req): Json<RegenerateComponentsRequest>,
) -> impl IntoResponse {
    let original = match state.store.get_component_set(req.component_id) {
        Some(set) => set,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No component set found for componentId {}", req.component_id),
            )
            .into_response()
        }
    };

    let user = prompts::regenerate_components(
        &pretty_json(&original),
        &req.feedback,
        req.component_id,
    );
    let settings = state.regenerate_settings(0.7);
    let reply = match timed_generate(
        "regenerate-components",
        &settings,
        &prompts::designer_system(),
        &user,
    )
    .await
    {
        Ok(reply) => reply,
        Err(e) => return llm_error("regenerate-components", &e).into_response(),
    };

    let draft: ComponentSetDraft = match extract::payload(&reply) {
        Ok(draft) => draft,
        Err(e) => return reply_error("regenerate-components", &reply, &e).into_response(),
    };

    // The set keeps its identity; only the contents change.
    let set = draft.into_component_set(req.component_id, original.plan_id);
    state.store.insert_component_set(set.clone());

    (StatusCode::OK, Json(json!(set))).into_response()
}

// ── Rule handlers ─────────────────────────────────────────────────────

async fn generate_rule(
    State(state): State<AppState>,
    Json(req): Json<GenerateRuleRequest>,
) -> impl IntoResponse {
    let plan = match state.store.plan(req.concept_id) {
        Some(plan) => plan,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No concept found for conceptId {}", req.concept_id),
            )
            .into_response()
        }
    };

    let user = prompts::rules(&pretty_json(&plan));
    let settings = state.generate_settings(0.6);
    let reply =
        match timed_generate("generate-rule", &settings, &prompts::designer_system(), &user).await
        {
            Ok(reply) => reply,
            Err(e) => return llm_error("generate-rule", &e).into_response(),
        };

    let draft: RuleSetDraft = match extract::payload(&reply) {
        Ok(draft) => draft,
        Err(e) => return reply_error("generate-rule", &reply, &e).into_response(),
    };

    let rules = draft.into_rule_set(state.store.next_rule_id());
    state.store.insert_rule(rules.clone());
    metrics::RULESETS_GENERATED_TOTAL.inc();

    (StatusCode::OK, Json(json!(rules))).into_response()
}

async fn regenerate_rule(
    State(state): State<AppState>,
    Json(req): Json<RegenerateRuleRequest>,
) -> impl IntoResponse {
    let original = match state.store.get_rule(req.rule_id) {
        Some(rules) => rules,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No rule set found for ruleId {}", req.rule_id),
            )
            .into_response()
        }
    };

    let user = prompts::regenerate_rules(&pretty_json(&original), &req.feedback, req.rule_id);
    let settings = state.regenerate_settings(0.7);
    let reply = match timed_generate(
        "regenerate-rule",
        &settings,
        &prompts::designer_system(),
        &user,
    )
    .await
    {
        Ok(reply) => reply,
        Err(e) => return llm_error("regenerate-rule", &e).into_response(),
    };

    let draft: RuleSetDraft = match extract::payload(&reply) {
        Ok(draft) => draft,
        Err(e) => return reply_error("regenerate-rule", &reply, &e).into_response(),
    };

    // Pin the id to the original no matter what the model wrote.
    let rules = draft.into_rule_set(req.rule_id);
    state.store.insert_rule(rules.clone());
    metrics::RULESETS_GENERATED_TOTAL.inc();

    (StatusCode::OK, Json(json!(rules))).into_response()
}

// ── Simulation handlers ───────────────────────────────────────────────

async fn simulate_rule_test(
    State(state): State<AppState>,
    Json(req): Json<SimulateRuleRequest>,
) -> impl IntoResponse {
    let rules = match state.store.get_rule(req.rule_id) {
        Some(rules) => rules,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No rule set found for ruleId {}", req.rule_id),
            )
            .into_response()
        }
    };

    let player_names: Vec<String> = req
        .player_names
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if player_names.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "playerNames is required").into_response();
    }
    if req.max_turns < 1 {
        return json_error(StatusCode::BAD_REQUEST, "maxTurns must be at least 1")
            .into_response();
    }

    let count = sim::effective_count(req.simulation_count);
    let settings = state.generate_settings(0.8);
    let reports = match sim::run_batch(
        &settings,
        &rules,
        &player_names,
        req.max_turns,
        req.enable_penalty,
        count,
    )
    .await
    {
        Ok(reports) => reports,
        Err(SimulationError::Llm(e)) => {
            return llm_error("simulate-rule-test", &e).into_response()
        }
        Err(e) => {
            tracing::error!("simulate-rule-test: {e}");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
                .into_response();
        }
    };

    metrics::SIMULATIONS_RUN_TOTAL.inc_by(reports.len() as u64);
    state.store.record_simulations(req.rule_id, reports.clone());

    (
        StatusCode::OK,
        Json(json!({
            "ruleId": req.rule_id,
            "simulationHistory": reports,
        })),
    )
        .into_response()
}

async fn balance_feedback(State(state): State<AppState>) -> impl IntoResponse {
    let (rule_id, reports) = match state.store.latest_simulations() {
        Some(latest) => latest,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                "No simulation has been run yet; call /api/simulate/rule-test first",
            )
            .into_response()
        }
    };
    let rules = match state.store.get_rule(rule_id) {
        Some(rules) => rules,
        None => {
            return json_error(
                StatusCode::NOT_FOUND,
                &format!("No rule set found for ruleId {rule_id}"),
            )
            .into_response()
        }
    };

    let user = prompts::balance(&pretty_json(&rules), &pretty_json(&reports));
    let settings = state.generate_settings(0.4);
    let reply = match timed_generate(
        "feedback-balance",
        &settings,
        &prompts::analyst_system(),
        &user,
    )
    .await
    {
        Ok(reply) => reply,
        Err(e) => return llm_error("feedback-balance", &e).into_response(),
    };

    let analysis: BalanceAnalysis = match extract::payload(&reply) {
        Ok(analysis) => analysis,
        Err(e) => return reply_error("feedback-balance", &reply, &e).into_response(),
    };

    (
        StatusCode::OK,
        Json(json!({
            "ruleId": rule_id,
            "balanceAnalysis": analysis.clamped(),
        })),
    )
        .into_response()
}

// ── Observability ─────────────────────────────────────────────────────

async fn get_metrics() -> impl IntoResponse {
    (StatusCode::OK, metrics::gather_metrics())
}
