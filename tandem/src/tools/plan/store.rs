//! Session-scoped plan storage.

use dashmap::DashMap;

use crate::plan::{Plan, PlanError};

/// Plans keyed by session id. A new top-level query may replace the plan;
/// step transitions go through [`Plan`]'s own state machine.
#[derive(Default)]
pub struct PlanStore {
    plans: DashMap<String, Plan>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the session's plan. Returns whether a previous
    /// plan was replaced.
    pub fn install(&self, session_id: &str, plan: Plan) -> bool {
        self.plans.insert(session_id.to_string(), plan).is_some()
    }

    /// Clone of the session's plan, if any.
    pub fn get(&self, session_id: &str) -> Option<Plan> {
        self.plans.get(session_id).map(|p| p.clone())
    }

    /// Applies a mutation to the session's plan under the map shard lock.
    pub fn update<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Plan) -> Result<T, PlanError>,
    ) -> Result<T, PlanError> {
        let mut entry = self.plans.get_mut(session_id).ok_or(PlanError::NotFound)?;
        f(entry.value_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: install/get/update are session-scoped; updates on a
    /// missing session report NotFound.
    #[test]
    fn store_roundtrip() {
        let store = PlanStore::new();
        let plan = Plan::new(vec![("find".into(), "search".into())]).unwrap();
        assert!(!store.install("s1", plan));
        assert!(store.get("s1").is_some());
        assert!(store.get("s2").is_none());

        store.update("s1", |p| p.start_step(0)).unwrap();
        assert_eq!(store.get("s1").unwrap().in_progress(), Some(0));

        assert!(matches!(
            store.update("s2", |p| p.start_step(0)),
            Err(PlanError::NotFound)
        ));
    }
}
