//! The fixed evaluation query set.
//!
//! Thirty-two queries across four categories. Ids are stable: artifacts are
//! keyed by `(prompt_version, query_id)` and re-runs must hit the same cache
//! entries.

use serde::{Deserialize, Serialize};

/// Category of an evaluation query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryCategory {
    Simple,
    MultiAspect,
    TimeConstrained,
    Comprehensive,
}

/// One evaluation query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalQuery {
    pub id: u32,
    pub text: &'static str,
    pub category: QueryCategory,
}

const fn q(id: u32, text: &'static str, category: QueryCategory) -> EvalQuery {
    EvalQuery { id, text, category }
}

/// The full fixed set, ordered by id.
pub fn query_set() -> Vec<EvalQuery> {
    use QueryCategory::*;
    vec![
        // Simple factual
        q(1, "When did GPT-4 release?", Simple),
        q(2, "Who won the 2024 Nobel Prize in Physics?", Simple),
        q(3, "What is the current version of the Rust compiler?", Simple),
        q(4, "What company acquired Figma, and did the deal close?", Simple),
        q(5, "What is the tallest building completed in 2024?", Simple),
        q(6, "When was the James Webb Space Telescope launched?", Simple),
        q(7, "What is the population of Tokyo?", Simple),
        q(8, "Who is the current CEO of Microsoft?", Simple),
        // Multi-aspect
        q(9, "Compare the safety records and costs of nuclear and offshore wind power.", MultiAspect),
        q(10, "What are the main arguments for and against remote work productivity?", MultiAspect),
        q(11, "Compare Rust and Go for building network services: performance, tooling, and hiring.", MultiAspect),
        q(12, "What are the health effects of intermittent fasting, and what do critics say?", MultiAspect),
        q(13, "Compare the iPhone and Pixel camera systems and their computational photography.", MultiAspect),
        q(14, "What are the environmental and economic impacts of lithium mining?", MultiAspect),
        q(15, "Compare PostgreSQL and MySQL for analytical workloads and replication.", MultiAspect),
        q(16, "What are the arguments around school smartphone bans and their measured effects?", MultiAspect),
        // Time-constrained
        q(17, "What happened in AI regulation in the EU since 2024?", TimeConstrained),
        q(18, "What were the major CPU releases of the past year?", TimeConstrained),
        q(19, "How has the price of solar panels changed since 2020?", TimeConstrained),
        q(20, "What large language models were released in the last six months?", TimeConstrained),
        q(21, "What major security breaches were disclosed in 2025?", TimeConstrained),
        q(22, "How did global EV sales develop between 2022 and 2025?", TimeConstrained),
        q(23, "What changed in the Python release cycle since version 3.11?", TimeConstrained),
        q(24, "Which countries changed interest rates in the past quarter?", TimeConstrained),
        // Comprehensive
        q(25, "Give a comprehensive overview of CRISPR-based therapies approved or in trials.", Comprehensive),
        q(26, "Write a detailed report on the state of quantum error correction.", Comprehensive),
        q(27, "Provide a comprehensive analysis of the global semiconductor supply chain.", Comprehensive),
        q(28, "Give an in-depth review of evidence on microplastics and human health.", Comprehensive),
        q(29, "Write a comprehensive survey of post-quantum cryptography standardization.", Comprehensive),
        q(30, "Provide a detailed report on fusion energy milestones and remaining obstacles.", Comprehensive),
        q(31, "Give a comprehensive comparison of battery chemistries for grid storage.", Comprehensive),
        q(32, "Write an in-depth analysis of the economics of vertical farming.", Comprehensive),
    ]
}

/// Subset of the fixed set by id, preserving id order. Unknown ids error.
pub fn queries_by_ids(ids: &[u32]) -> Result<Vec<EvalQuery>, crate::EvalError> {
    let all = query_set();
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let q = all
            .iter()
            .find(|q| q.id == *id)
            .ok_or(crate::EvalError::UnknownQuery(*id))?;
        out.push(q.clone());
    }
    out.sort_by_key(|q| q.id);
    Ok(out)
}
