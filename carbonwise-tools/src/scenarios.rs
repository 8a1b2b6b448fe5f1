//! Fixed onboarding prompts showing what the server can answer.

use async_trait::async_trait;
use carbonwise_core::error::ToolError;
use carbonwise_core::types::{RiskLevel, ToolOutput};
use serde::Serialize;
use serde_json::json;

use crate::registry::{Tool, json_output};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scenario {
    pub title: &'static str,
    pub prompt: &'static str,
    /// The tool invocation the prompt is expected to lead to.
    pub tool_chain: &'static str,
}

pub const DEMO_SCENARIOS: [Scenario; 5] = [
    Scenario {
        title: "Experiment Consumption - Desktop Ben",
        prompt: "What is the consumption of my experiment 'Desktop Ben' (GTX 1080 ti)?",
        tool_chain: "get_experiment_consumption_by_name",
    },
    Scenario {
        title: "Experiment Consumption - Laptop",
        prompt: "What is the consumption of my experiment 'Laptop' (Laptop with RAPL Intel(R) Core(TM) Ultra 7 265H)?",
        tool_chain: "get_experiment_consumption_by_name",
    },
    Scenario {
        title: "Comparison with Accuracy Constraint",
        prompt: "Which model consumes the least with a minimum accuracy of 92%?",
        tool_chain: "recommend_lowest_emission_experiment(min_accuracy=92)",
    },
    Scenario {
        title: "Project Inventory",
        prompt: "List the available experiments in my project.",
        tool_chain: "list_experiments",
    },
    Scenario {
        title: "Create a Simple Experiment",
        prompt: "Create a new experiment named 'test experiment' in my project",
        tool_chain: "create_experiment",
    },
];

pub struct DemoPromptScenariosTool;

#[async_trait]
impl Tool for DemoPromptScenariosTool {
    fn name(&self) -> &str {
        "demo_prompt_scenarios"
    }

    fn description(&self) -> &str {
        "Example prompts, each paired with the tool it exercises."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolOutput, ToolError> {
        json_output(self.name(), &DEMO_SCENARIOS)
    }

    fn risk_level(&self) -> RiskLevel {
        RiskLevel::ReadOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scenarios_output() {
        let output = DemoPromptScenariosTool.execute(json!({})).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output.content).unwrap();
        let scenarios = value.as_array().unwrap();

        assert_eq!(scenarios.len(), 5);
        assert_eq!(scenarios[2]["title"], "Comparison with Accuracy Constraint");
        assert_eq!(
            scenarios[2]["tool_chain"],
            "recommend_lowest_emission_experiment(min_accuracy=92)"
        );
        for scenario in scenarios {
            assert_eq!(scenario.as_object().unwrap().len(), 3);
        }
    }
}
