//! Pipeline definitions: tiers of agent tasks.
//!
//! ```json
//! {
//!   "tiers": {
//!     "0": [{"id": "1", "agent": "researcher", "instruction": "Find facts"}],
//!     "1": [{"id": "2", "agent": "writer", "instruction": "Summarize", "depends_on": ["1"]}]
//!   }
//! }
//! ```
//!
//! `unique_id` and `accepts_inputs_from` are accepted as aliases, and ids
//! may be strings or integers.

use crate::PipelineError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTask {
    #[serde(alias = "unique_id", deserialize_with = "id_string")]
    pub id: String,
    pub agent: String,
    pub instruction: String,
    #[serde(
        default,
        alias = "accepts_inputs_from",
        deserialize_with = "id_strings",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub depends_on: Vec<String>,
}

impl PipelineTask {
    pub fn new(id: impl Into<String>, agent: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent: agent.into(),
            instruction: instruction.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = ids.into_iter().map(Into::into).collect();
        self
    }

    /// The instruction followed by each dependency's output on its own
    /// line. Unknown dependencies contribute an empty line.
    pub fn input(&self, outputs: &BTreeMap<String, String>) -> String {
        if self.depends_on.is_empty() {
            return self.instruction.clone();
        }
        let deps: Vec<&str> = self
            .depends_on
            .iter()
            .map(|id| outputs.get(id).map(String::as_str).unwrap_or(""))
            .collect();
        format!("{}\n{}", self.instruction, deps.join("\n"))
    }
}

/// Tier index to tasks. Tiers run in ascending index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    pub tiers: BTreeMap<u32, Vec<PipelineTask>>,
}

impl Pipeline {
    /// Build from a list of tiers, numbered from 0.
    pub fn from_tiers(tiers: Vec<Vec<PipelineTask>>) -> Self {
        Self {
            tiers: (0u32..).zip(tiers).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub async fn load(path: &Path) -> Result<Self, PipelineError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &PipelineTask> {
        self.tiers.values().flatten()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn id_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Vec::<RawId>::deserialize(deserializer).map(|ids| ids.into_iter().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_appends_dependency_outputs_in_order() {
        let mut outputs = BTreeMap::new();
        outputs.insert("a".to_string(), "alpha".to_string());
        outputs.insert("b".to_string(), "beta".to_string());

        let task = PipelineTask::new("c", "writer", "Combine").depends_on(["b", "missing", "a"]);
        assert_eq!(task.input(&outputs), "Combine\nbeta\n\nalpha");

        let solo = PipelineTask::new("d", "writer", "Alone");
        assert_eq!(solo.input(&outputs), "Alone");
    }

    #[test]
    fn parses_aliases_and_numeric_ids() {
        let pipeline = Pipeline::from_json(
            r#"{"tiers": {
                "1": [{"unique_id": 2, "agent": "B", "instruction": "use it", "accepts_inputs_from": [1]}],
                "0": [{"id": "1", "agent": "A", "instruction": "make it"}]
            }}"#,
        )
        .unwrap();

        let ids: Vec<_> = pipeline.tasks().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(pipeline.tiers[&1][0].depends_on, vec!["1"]);
    }

    #[test]
    fn from_tiers_numbers_from_zero() {
        let pipeline = Pipeline::from_tiers(vec![
            vec![PipelineTask::new("1", "A", "x")],
            vec![PipelineTask::new("2", "B", "y")],
        ]);
        assert_eq!(pipeline.tiers.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            Pipeline::from_json(r#"{"tiers": {"0": [{"agent": "A"}]}}"#),
            Err(PipelineError::Parse(_))
        ));
    }
}
