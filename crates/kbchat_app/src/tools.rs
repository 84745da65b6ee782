use kbchat_domain::{LookupToolInput, ToolDefinition, ToolName};

pub const LOOKUP_TOOL_NAME: &str = "dbpedia_lookup";

/// Declaration of the entity lookup tool sent to the model.
pub fn lookup_tool() -> ToolDefinition {
    ToolDefinition::new(LOOKUP_TOOL_NAME)
        .description(
            "Look up top 3 matching entities in DBpedia and return dbo:abstract and 5 further \
             properties for each entity.",
        )
        .input_schema_for::<LookupToolInput>()
}

pub fn lookup_tool_name() -> ToolName {
    ToolName::new(LOOKUP_TOOL_NAME)
}
