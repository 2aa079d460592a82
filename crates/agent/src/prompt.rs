//! System prompt rendering.

const ANSWER_CONTRACT: &str = r#"Produce output in JSON:
{
  "response": "the final user-facing answer",
  "is_final": boolean
}
If is_final=true, the conversation ends. Any tool calls you make are run and their results shown to you in the next step, so proceed step by step."#;

/// Render the system message. `memory_context` is omitted entirely when `None`.
pub fn system_prompt(name: &str, instruction: &str, tools: &str, memory_context: Option<&str>) -> String {
    let instruction = if instruction.trim().is_empty() {
        "(no instructions)"
    } else {
        instruction
    };

    let mut prompt = format!(
        "You are an AI agent named '{name}'.\nYour instructions: {instruction}\nYou have these tools available:\n{tools}\n"
    );
    if let Some(context) = memory_context {
        prompt.push_str("\nMemory context:\n");
        prompt.push_str(context);
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(ANSWER_CONTRACT);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_name_instruction_and_tools() {
        let prompt = system_prompt("weather", "Answer weather questions", "- get_weather(city: string): Look up", None);
        assert!(prompt.starts_with("You are an AI agent named 'weather'."));
        assert!(prompt.contains("Your instructions: Answer weather questions"));
        assert!(prompt.contains("- get_weather(city: string)"));
        assert!(prompt.contains("\"is_final\": boolean"));
        assert!(!prompt.contains("Memory context"));
    }

    #[test]
    fn memory_block_precedes_contract() {
        let prompt = system_prompt("a", "", "(none)", Some("## Recent Short-Term Text:"));
        assert!(prompt.contains("(no instructions)"));
        let memory = prompt.find("## Recent Short-Term Text:").unwrap();
        let contract = prompt.find("Produce output in JSON").unwrap();
        assert!(memory < contract);
    }
}
