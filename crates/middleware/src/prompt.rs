//! System prompt that teaches the model the activate-before-use workflow.

use skillgate_skills::{PermissionContext, SkillCatalog, TransitionMode, visible_for_listing};

/// Build the system prompt for a session.
///
/// Only skills the session may list are named, so the prompt leaks no more
/// than the tool surface does.
pub fn system_prompt(
    catalog: &SkillCatalog, permissions: &PermissionContext, mode: TransitionMode, custom_instructions: &str,
) -> String {
    let loaders: Vec<String> = catalog
        .list()
        .iter()
        .filter(|skill| visible_for_listing(permissions, skill))
        .map(|skill| format!("- {}: {}", skill.activation_tool_name(), skill.description))
        .collect();

    let loaders = if loaders.is_empty() { "(none available)".to_string() } else { loaders.join("\n") };

    let mut prompt = format!(
        "You are an AI assistant with modular skills.\n\n\
         Operating principle:\n\
         You start with minimal capabilities. When a task needs specific functionality:\n\
         1. Identify which skill you need based on the task\n\
         2. Call the corresponding skill_* tool first\n\
         3. Read the instructions returned by the activation\n\
         4. Then use the newly available tools to complete the task\n\n\
         Available skills:\n{loaders}\n\n\
         Key rules:\n\
         - Always activate a skill before trying to use its tools\n\
         - Do not assume a tool exists unless it is in your current tool list\n\
         - {persistence}",
        persistence = persistence_rule(mode),
    );

    let custom = custom_instructions.trim();
    if !custom.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(custom);
    }

    prompt
}

fn persistence_rule(mode: TransitionMode) -> &'static str {
    match mode {
        TransitionMode::Replace => "Only one skill is active at a time; activating another replaces the current one",
        TransitionMode::Accumulate => "Activated skills stay available for the rest of the conversation",
        TransitionMode::Fifo => "A limited number of skills stay active; activating a new one may retire the oldest",
    }
}
