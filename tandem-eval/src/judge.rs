//! Judge fan-out: seven independent rubric judges.
//!
//! Each judge is a stateless function of `(rubric prompt, query, response)`
//! returning `{score, reasoning}` as strict JSON. Judges never see another
//! judge's output; the only shared state is the provider client. Callers pin
//! temperature 0 on the LLM they pass in.

use std::collections::HashMap;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tandem::llm::LlmClient;
use tandem::message::Message;

use crate::error::EvalError;

/// The seven rubric judges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JudgeKind {
    PlanningQuality,
    ExecutionCompleteness,
    SourceQuality,
    CitationAccuracy,
    AnswerCompleteness,
    FactualAccuracy,
    AutonomyScore,
}

impl JudgeKind {
    pub const ALL: [JudgeKind; 7] = [
        JudgeKind::PlanningQuality,
        JudgeKind::ExecutionCompleteness,
        JudgeKind::SourceQuality,
        JudgeKind::CitationAccuracy,
        JudgeKind::AnswerCompleteness,
        JudgeKind::FactualAccuracy,
        JudgeKind::AutonomyScore,
    ];

    /// Rubric field name; matches the `EvaluationResult` field.
    pub fn name(&self) -> &'static str {
        match self {
            JudgeKind::PlanningQuality => "planning_quality",
            JudgeKind::ExecutionCompleteness => "execution_completeness",
            JudgeKind::SourceQuality => "source_quality",
            JudgeKind::CitationAccuracy => "citation_accuracy",
            JudgeKind::AnswerCompleteness => "answer_completeness",
            JudgeKind::FactualAccuracy => "factual_accuracy",
            JudgeKind::AutonomyScore => "autonomy_score",
        }
    }

    /// Binary rubrics score {0, 1}; scaled rubrics score 1–5.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            JudgeKind::PlanningQuality
                | JudgeKind::CitationAccuracy
                | JudgeKind::FactualAccuracy
                | JudgeKind::AutonomyScore
        )
    }

    fn rubric_question(&self) -> &'static str {
        match self {
            JudgeKind::PlanningQuality => {
                "Did the agent create an appropriate research plan for this query?"
            }
            JudgeKind::ExecutionCompleteness => {
                "How thoroughly were the plan steps executed?"
            }
            JudgeKind::SourceQuality => {
                "How credible and recent are the sources used?"
            }
            JudgeKind::CitationAccuracy => {
                "Are the citations correct and attributable to their sources?"
            }
            JudgeKind::AnswerCompleteness => {
                "How fully does the response address every part of the query?"
            }
            JudgeKind::FactualAccuracy => {
                "Is the information in the response factually accurate?"
            }
            JudgeKind::AutonomyScore => {
                "Did the agent act autonomously, without asking for guidance?"
            }
        }
    }

    /// Full system prompt for this judge.
    pub fn rubric_prompt(&self) -> String {
        let scale = if self.is_binary() {
            "Score 1.0 if yes, 0.0 if no."
        } else {
            "Score an integer from 1 (worst) to 5 (best)."
        };
        format!(
            "You judge one narrow rubric of a research agent's response.\n\
             Rubric: {}\n{}\n\
             Reply with strict JSON only: {{\"score\": <number>, \"reasoning\": \"<one paragraph>\"}}",
            self.rubric_question(),
            scale
        )
    }
}

/// One judge's raw decision, persisted per query before aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeDecision {
    pub score: serde_json::Value,
    pub reasoning: String,
}

fn parse_decision(text: &str) -> Result<JudgeDecision, EvalError> {
    // Tolerate code fences around the JSON; nothing else.
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|_| EvalError::MalformedJudgeOutput(text.chars().take(200).collect()))?;
    let score = value
        .get("score")
        .cloned()
        .ok_or_else(|| EvalError::MalformedJudgeOutput("missing 'score'".into()))?;
    let reasoning = value
        .get("reasoning")
        .and_then(|r| r.as_str())
        .unwrap_or_default()
        .to_string();
    Ok(JudgeDecision { score, reasoning })
}

/// Runs one judge over a response. A single LLM call; no tools, no state.
pub async fn run_judge(
    llm: &dyn LlmClient,
    kind: JudgeKind,
    query: &str,
    response: &str,
) -> Result<JudgeDecision, EvalError> {
    let messages = [
        Message::system(kind.rubric_prompt()),
        Message::user(format!("Query:\n{query}\n\nResponse:\n{response}")),
    ];
    let out = llm
        .invoke(&messages)
        .await
        .map_err(|e| EvalError::Run(e.to_string()))?;
    debug!(judge = kind.name(), "judge replied");
    parse_decision(&out.content)
}

/// Fans all seven judges over one response concurrently and collects their
/// decisions by rubric name. Any failed judge fails the whole map so the
/// query is skipped, never partially recorded.
pub async fn run_all_judges(
    llm: &dyn LlmClient,
    query: &str,
    response: &str,
) -> Result<HashMap<String, JudgeDecision>, EvalError> {
    let futures = JudgeKind::ALL
        .iter()
        .map(|kind| async move {
            let decision = run_judge(llm, *kind, query, response).await?;
            Ok::<_, EvalError>((kind.name().to_string(), decision))
        })
        .collect::<Vec<_>>();
    let mut map = HashMap::new();
    for result in join_all(futures).await {
        let (name, decision) = result?;
        map.insert(name, decision);
    }
    Ok(map)
}
