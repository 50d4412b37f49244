// MCP prompts: guided conversations for common Home Assistant tasks

use crate::protocol::{
    GetPromptResult, Prompt, PromptArgument, PromptMessage, Role, ToolContent,
};
use anyhow::{anyhow, bail, Result};
use serde_json::{Map, Value};

struct PromptDef {
    name: &'static str,
    description: &'static str,
    /// (name, description, required)
    arguments: &'static [(&'static str, &'static str, bool)],
    guidance: &'static str,
}

const PROMPTS: &[PromptDef] = &[
    PromptDef {
        name: "create_automation",
        description: "Guide the user through creating an automation for a trigger type",
        arguments: &[
            ("trigger_type", "Trigger type: state, time, numeric_state, zone, sun or template", true),
            ("entity_id", "Entity used as the trigger source", false),
        ],
        guidance: "You help the user create a Home Assistant automation. Work through it step by step:\n\
1. Define the trigger for the requested trigger type.\n\
2. Decide which actions to run.\n\
3. Add conditions if the user wants any.\n\
4. Show the final configuration, and once the user confirms, save it with `configure_component`.",
    },
    PromptDef {
        name: "debug_automation",
        description: "Troubleshoot an automation that does not work",
        arguments: &[("automation_id", "Entity id of the automation, e.g. automation.porch_light", true)],
        guidance: "You troubleshoot Home Assistant automations. Check, in order:\n\
1. Find the automation with `list_automations` or `get_entity`.\n\
2. Look at `last_triggered` with `get_entity` to see whether it fires at all.\n\
3. Read its triggers, conditions and actions and look for logic errors.\n\
4. Verify the states of the entities it depends on with `get_entity`.\n\
5. Search `get_error_log` for related errors.\n\
6. Propose a fix, and apply it with `configure_component` once the user agrees.",
    },
    PromptDef {
        name: "troubleshoot_entity",
        description: "Diagnose an entity that misbehaves",
        arguments: &[("entity_id", "Entity id with problems", true)],
        guidance: "You troubleshoot Home Assistant entities. Check, in order:\n\
1. Current state and all attributes with `get_entity` and `detailed=true`.\n\
2. Ask what the user expected and what actually happens.\n\
3. Recent changes with `get_history` and `get_logbook`.\n\
4. Automations and scripts that touch the entity (`list_automations`).\n\
5. Errors from its integration in `get_error_log`.\n\
6. Likely causes (connectivity, integration, configuration) and concrete fixes.",
    },
    PromptDef {
        name: "routine_optimizer",
        description: "Suggest routines based on how the home is actually used",
        arguments: &[],
        guidance: "You optimize Home Assistant routines from real usage. Proceed as follows:\n\
1. Get the big picture with `system_overview`.\n\
2. Study when lights, climate and media are used with `get_history` and `get_logbook`.\n\
3. Look for devices that are regularly used together.\n\
4. Suggest new automations for recurring patterns, created with `configure_component`.\n\
5. Point out existing automations that could be simplified.\n\
6. Highlight energy saving opportunities.",
    },
    PromptDef {
        name: "automation_health_check",
        description: "Review all automations for conflicts, redundancy and improvements",
        arguments: &[],
        guidance: "You audit Home Assistant automations. Proceed as follows:\n\
1. Collect every automation with `list_automations`.\n\
2. Look for automations that conflict with or duplicate each other.\n\
3. Flag missing conditions, overly broad triggers and possible race conditions.\n\
4. Suggest simpler templates and better structure.\n\
5. Offer to apply agreed changes with `configure_component`.",
    },
    PromptDef {
        name: "entity_naming_consistency",
        description: "Audit entity names and propose a consistent scheme",
        arguments: &[],
        guidance: "You organize Home Assistant entity names. Proceed as follows:\n\
1. Gather entity ids and friendly names with `list_entities` or `system_overview`.\n\
2. Identify the naming patterns in use and where they break.\n\
3. Propose a scheme such as `domain.area_device_function`.\n\
4. List concrete renames. Entity ids are changed in the Home Assistant UI, not through this API.\n\
5. Write short guidelines for naming future entities.",
    },
    PromptDef {
        name: "dashboard_layout_generator",
        description: "Design dashboards around the user's rooms and habits",
        arguments: &[],
        guidance: "You design Home Assistant dashboards. Proceed as follows:\n\
1. Find out which entities matter, from `system_overview`, `get_history` or the user.\n\
2. Group them by room or function.\n\
3. Propose views and card types for each group, including a compact mobile view.\n\
4. Mention custom cards only where the built-in ones fall short.\n\
5. Build the result with `manage_dashboard`.",
    },
];

fn trigger_description(trigger_type: &str) -> &str {
    match trigger_type {
        "state" => "an entity changing state",
        "time" => "a specific time of day",
        "numeric_state" => "a numeric value crossing a threshold",
        "zone" => "entering or leaving a zone",
        "sun" => "sun events (sunrise/sunset)",
        "template" => "a template condition becoming true",
        other => other,
    }
}

fn argument<'a>(arguments: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn required<'a>(arguments: &'a Map<String, Value>, prompt: &str, name: &str) -> Result<&'a str> {
    argument(arguments, name)
        .ok_or_else(|| anyhow!("Prompt {} requires argument '{}'", prompt, name))
}

fn user_message(name: &str, arguments: &Map<String, Value>) -> Result<String> {
    let message = match name {
        "create_automation" => {
            let trigger = trigger_description(required(arguments, name, "trigger_type")?);
            match argument(arguments, "entity_id") {
                Some(entity_id) => {
                    format!("I want to create an automation triggered by {trigger} for {entity_id}.")
                }
                None => format!("I want to create an automation triggered by {trigger}."),
            }
        }
        "debug_automation" => format!(
            "My automation {} isn't working properly. Can you help me troubleshoot it?",
            required(arguments, name, "automation_id")?
        ),
        "troubleshoot_entity" => format!(
            "My entity {} isn't working properly. Can you help me troubleshoot it?",
            required(arguments, name, "entity_id")?
        ),
        "routine_optimizer" => "I'd like to optimize my home automations based on how I actually \
            use my smart home. Can you analyze my usage and suggest better routines?"
            .to_string(),
        "automation_health_check" => "I'd like a health check of all my automations. Can you \
            review them for conflicts, redundancies and possible improvements?"
            .to_string(),
        "entity_naming_consistency" => "I'd like my entity names to be more consistent. Can you \
            audit my current naming and suggest improvements?"
            .to_string(),
        "dashboard_layout_generator" => "I'd like to redesign my dashboards to be more useful. \
            Can you help me build layouts around how I actually use my system?"
            .to_string(),
        other => bail!("Unknown prompt: {}", other),
    };
    Ok(message)
}

/// Prompt listing and rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptCatalog;

impl PromptCatalog {
    pub fn list(&self) -> Vec<Prompt> {
        PROMPTS
            .iter()
            .map(|def| Prompt {
                name: def.name.to_string(),
                description: def.description.to_string(),
                arguments: def
                    .arguments
                    .iter()
                    .map(|(name, description, required)| PromptArgument {
                        name: name.to_string(),
                        description: description.to_string(),
                        required: *required,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Guidance goes out as the assistant message, followed by the user request.
    pub fn get(&self, name: &str, arguments: Option<&Map<String, Value>>) -> Result<GetPromptResult> {
        let def = PROMPTS
            .iter()
            .find(|def| def.name == name)
            .ok_or_else(|| anyhow!("Unknown prompt: {}", name))?;

        let empty = Map::new();
        let user = user_message(def.name, arguments.unwrap_or(&empty))?;

        Ok(GetPromptResult {
            description: def.description.to_string(),
            messages: vec![
                PromptMessage {
                    role: Role::Assistant,
                    content: ToolContent::text(def.guidance),
                },
                PromptMessage {
                    role: Role::User,
                    content: ToolContent::text(user),
                },
            ],
        })
    }
}
