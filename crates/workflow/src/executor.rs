//! Runs pipelines against a set of named agents.

use crate::PipelineError;
use crate::pipeline::Pipeline;
use agentsuite_agent::Agent;
use agentsuite_core::error::Error;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Anything that can run one pipeline task.
#[async_trait]
pub trait PipelineAgent: Send + Sync {
    async fn run_task(&self, input: &str) -> Result<String, Error>;
}

#[async_trait]
impl PipelineAgent for Agent {
    async fn run_task(&self, input: &str) -> Result<String, Error> {
        self.run(input).await
    }
}

/// Task id to output text.
pub type PipelineOutputs = BTreeMap<String, String>;

#[derive(Default)]
pub struct PipelineExecutor {
    agents: HashMap<String, Arc<dyn PipelineAgent>>,
}

impl PipelineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn PipelineAgent>) -> &mut Self {
        self.agents.insert(name.into(), agent);
        self
    }

    pub fn with_agent(mut self, name: impl Into<String>, agent: Arc<dyn PipelineAgent>) -> Self {
        self.register(name, agent);
        self
    }

    /// Run every tier in ascending order. Tasks in a tier run concurrently
    /// and the whole tier settles before the next starts.
    pub async fn execute(&self, pipeline: &Pipeline) -> Result<PipelineOutputs, PipelineError> {
        let mut outputs = PipelineOutputs::new();

        for (tier, tasks) in &pipeline.tiers {
            let mut runnable = Vec::with_capacity(tasks.len());
            for task in tasks {
                let agent = self.agents.get(&task.agent).ok_or_else(|| PipelineError::UnknownAgent {
                    task: task.id.clone(),
                    agent: task.agent.clone(),
                })?;
                runnable.push((task.id.clone(), task.input(&outputs), agent.clone()));
            }
            info!(tier, tasks = runnable.len(), "Running pipeline tier");

            let mut set = JoinSet::new();
            for (id, input, agent) in runnable {
                set.spawn(async move {
                    let result = agent.run_task(&input).await;
                    (id, result)
                });
            }

            let mut failure = None;
            while let Some(joined) = set.join_next().await {
                match joined {
                    Ok((id, Ok(output))) => {
                        info!(tier, task = %id, "Pipeline task finished");
                        outputs.insert(id, output);
                    }
                    Ok((id, Err(source))) => {
                        error!(tier, task = %id, error = %source, "Pipeline task failed");
                        failure.get_or_insert(PipelineError::TaskFailed { task: id, source });
                    }
                    Err(e) => {
                        failure.get_or_insert(PipelineError::Join(e.to_string()));
                    }
                }
            }
            if let Some(failure) = failure {
                return Err(failure);
            }
        }

        Ok(outputs)
    }
}
