//! MCP tool definitions.

use serde_json::json;

use crate::protocol::ToolDefinition;

fn tool(name: &str, description: &str, input_schema: serde_json::Value) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn format_property() -> serde_json::Value {
    json!({
        "type": "string",
        "enum": ["board_report", "summary", "detailed", "trends", "json"],
        "description": "Output format (default: board_report)"
    })
}

fn collection_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "epic_updates_data": {
                "type": ["string", "object"],
                "description": "Collected EPIC updates as returned by collect_epic_updates with format=json, or a saved report file's contents"
            }
        },
        "required": ["epic_updates_data"]
    })
}

/// Tools exposed by the server.
pub fn available_tools() -> Vec<ToolDefinition> {
    vec![
        tool(
            "collect_epic_updates",
            "Collect EPIC update comments from GitHub issues and render them as a report",
            json!({
                "type": "object",
                "properties": {
                    "repo": {
                        "type": "string",
                        "description": "Repository in owner/repo form, e.g. LDFLK/launch"
                    },
                    "issue_numbers": {
                        "type": ["array", "string"],
                        "items": { "type": "integer", "minimum": 1 },
                        "description": "Issue numbers, as an array or a comma-separated string"
                    },
                    "date": {
                        "type": "string",
                        "description": "Keep only updates dated this day (YYYY-MM-DD)"
                    },
                    "start_date": {
                        "type": "string",
                        "description": "Start of an inclusive date range (YYYY-MM-DD)"
                    },
                    "end_date": {
                        "type": "string",
                        "description": "End of an inclusive date range (YYYY-MM-DD)"
                    },
                    "format": format_property()
                },
                "required": ["repo", "issue_numbers"]
            }),
        ),
        tool(
            "crawl_epic_updates",
            "Scan every open issue of a repository updated in a date window for EPIC updates",
            json!({
                "type": "object",
                "properties": {
                    "repo": {
                        "type": "string",
                        "description": "Repository in owner/repo form, e.g. LDFLK/launch"
                    },
                    "days_back": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Look back this many days from today (default: 30)"
                    },
                    "start_date": {
                        "type": "string",
                        "description": "Start of an inclusive date range (YYYY-MM-DD); overrides days_back"
                    },
                    "end_date": {
                        "type": "string",
                        "description": "End of the range (YYYY-MM-DD, default: today)"
                    },
                    "format": format_property()
                },
                "required": ["repo"]
            }),
        ),
        tool(
            "get_epic_updates_from_issue",
            "Collect EPIC updates from a single GitHub issue URL",
            json!({
                "type": "object",
                "properties": {
                    "issue_url": {
                        "type": "string",
                        "description": "Issue URL, e.g. https://github.com/LDFLK/launch/issues/151"
                    },
                    "target_date": {
                        "type": "string",
                        "description": "Keep only updates dated this day (YYYY-MM-DD)"
                    },
                    "format": format_property()
                },
                "required": ["issue_url"]
            }),
        ),
        tool(
            "parse_epic_update",
            "Parse one EPIC update comment body into structured fields",
            json!({
                "type": "object",
                "properties": {
                    "body": {
                        "type": "string",
                        "description": "Raw Markdown comment body"
                    }
                },
                "required": ["body"]
            }),
        ),
        tool(
            "generate_board_report",
            "Render a board report from previously collected EPIC updates",
            collection_schema(),
        ),
        tool(
            "generate_epic_status_summary",
            "Render a status summary (status and progress per update) from collected EPIC updates",
            collection_schema(),
        ),
        tool(
            "analyze_epic_trends",
            "Analyze contributors, issue activity and update frequency in collected EPIC updates",
            collection_schema(),
        ),
    ]
}
