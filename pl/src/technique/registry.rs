//! Static catalog of prompting techniques

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;
use tracing::debug;

/// Id of the catch-all technique used when nothing else fits
pub const FALLBACK_TECHNIQUE_ID: &str = "custom";

/// One slot in a technique's prompt layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionDef {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
    pub placeholder: &'static str,
}

/// A named prompting technique and the sections it expects, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Technique {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub recommendation: &'static str,
    pub sections: &'static [SectionDef],
}

impl Technique {
    pub fn is_fallback(&self) -> bool {
        self.id == FALLBACK_TECHNIQUE_ID
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.sections.iter().any(|s| s.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sections.iter().map(|s| s.key)
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sections.iter().filter(|s| s.required).map(|s| s.key)
    }

    pub fn section(&self, key: &str) -> Option<&'static SectionDef> {
        self.sections.iter().find(|s| s.key == key)
    }
}

const fn section(
    key: &'static str,
    label: &'static str,
    description: &'static str,
    required: bool,
    placeholder: &'static str,
) -> SectionDef {
    SectionDef {
        key,
        label,
        description,
        required,
        placeholder,
    }
}

/// Declaration order is significant: inference breaks score ties with it
pub static TECHNIQUES: &[Technique] = &[
    Technique {
        id: "taco",
        name: "TACO",
        description: "Task, Actor, Context, Output - Best for clear, structured tasks",
        recommendation: "Great for straightforward tasks with clear inputs and outputs",
        sections: &[
            section("task", "Task", "What needs to be accomplished", true, "Describe the main task..."),
            section("actor", "Actor", "Who or what is performing the task", false, "You are a..."),
            section("context", "Context", "Background information and constraints", false, "Additional context..."),
            section("output", "Output", "Expected format and structure of the result", true, "The output should be..."),
        ],
    },
    Technique {
        id: "risen",
        name: "RISEN",
        description: "Role, Instructions, Steps, End goal, Narrowing - Best for complex workflows",
        recommendation: "Ideal for multi-step processes requiring detailed guidance",
        sections: &[
            section("role", "Role", "Identity and perspective to adopt", true, "You are a..."),
            section("instructions", "Instructions", "What to do", true, "Your task is to..."),
            section("steps", "Steps", "How to accomplish the task", true, "First... Second... Third..."),
            section("endGoal", "End Goal", "Success criteria and desired outcome", true, "The final result should..."),
            section("narrowing", "Narrowing", "Constraints, focus areas, and boundaries", false, "Focus specifically on..."),
        ],
    },
    Technique {
        id: "chainOfThought",
        name: "Chain of Thought",
        description: "Systematic step-by-step reasoning - Best for analytical tasks",
        recommendation: "Perfect for tasks requiring logical reasoning and decision-making",
        sections: &[
            section("task", "Task", "The main objective", true, "You are analyzing..."),
            section("steps", "Reasoning Steps", "The step-by-step thought process", true, "First... Second... Third... Finally..."),
            section("triggerPhrase", "Trigger Phrase", "Phrase to activate systematic thinking", false, "Let's think step by step"),
            section("examples", "Examples", "Sample inputs to demonstrate the process", false, "Example inputs..."),
        ],
    },
    Technique {
        id: "multipleOutputs",
        name: "Multiple Outputs & Self-Consistency",
        description: "Generate multiple variations and select the best",
        recommendation: "Useful when you want diverse perspectives or options",
        sections: &[
            section("task", "Task", "What to generate", true, "Generate..."),
            section("numberOfOutputs", "Number of Outputs", "How many variations to create", true, "3"),
            section("selectionCriteria", "Selection Criteria", "How to evaluate and choose the best option", false, "Select based on..."),
        ],
    },
    Technique {
        id: "treeOfThought",
        name: "Tree of Thought",
        description: "Explore multiple reasoning paths systematically",
        recommendation: "Best for complex problems with multiple solution approaches",
        sections: &[
            section("task", "Task", "The problem to solve", true, "Solve..."),
            section("explorationPaths", "Exploration Paths", "Different approaches to consider", true, "Path 1:... Path 2:... Path 3:..."),
            section("evaluation", "Evaluation", "How to assess each path", true, "Evaluate each path based on..."),
        ],
    },
    Technique {
        id: "systemPrompting",
        name: "System Prompting",
        description: "Define system-level behavior and constraints",
        recommendation: "Great for setting consistent AI behavior across interactions",
        sections: &[
            section("systemRole", "System Role", "Overall behavior and personality", true, "You are an AI assistant that..."),
            section("userInstructions", "User Instructions", "Specific task for the user", true, "Help the user with..."),
            section("constraints", "Constraints", "Rules and limitations", false, "Always... Never..."),
        ],
    },
    Technique {
        id: FALLBACK_TECHNIQUE_ID,
        name: "Custom Prompt",
        description: "Build your own structure",
        recommendation: "For unique use cases that don't fit standard techniques",
        sections: &[section("freeform", "Prompt Content", "Your custom prompt structure", true, "Write your prompt...")],
    },
];

static BY_ID: LazyLock<HashMap<&'static str, &'static Technique>> =
    LazyLock::new(|| TECHNIQUES.iter().map(|t| (t.id, t)).collect());

/// Look up a technique by id
pub fn get_technique(id: &str) -> Option<&'static Technique> {
    debug!(%id, "get_technique: called");
    BY_ID.get(id).copied()
}

/// All techniques in declaration order
pub fn all_techniques() -> &'static [Technique] {
    TECHNIQUES
}

/// The catch-all technique
pub fn fallback_technique() -> &'static Technique {
    // The fallback is declared last
    &TECHNIQUES[TECHNIQUES.len() - 1]
}

/// Resolve a stored technique reference, which may be an id or a display label
///
/// Saved prompts keep the inferred label ("Custom RISEN"), so a bare id lookup
/// is not enough when reloading them.
pub fn resolve_technique(reference: &str) -> Option<&'static Technique> {
    debug!(%reference, "resolve_technique: called");
    let reference = reference.trim();
    if let Some(t) = get_technique(reference) {
        return Some(t);
    }
    if let Some(t) = TECHNIQUES.iter().find(|t| t.name.eq_ignore_ascii_case(reference)) {
        return Some(t);
    }
    reference
        .strip_prefix("Custom ")
        .and_then(|base| TECHNIQUES.iter().find(|t| t.name.eq_ignore_ascii_case(base)))
}
