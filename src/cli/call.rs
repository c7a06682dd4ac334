use crate::config::Config;
use crate::error::{AppError, Result};
use crate::tools::{self, TOOLS, ToolCall};
use serde_json::Value;
use tracing::info;

pub fn list_tools() -> Result<()> {
    for tool in TOOLS {
        println!("{:<24} {}", tool.name, tool.description);
    }
    Ok(())
}

pub async fn execute(tool: &str, args: Option<&str>) -> Result<()> {
    let args = parse_json_args(args)?;
    let call = ToolCall::parse(tool, args)?;

    let config = Config::load()?;
    let output = tools::invoke(&config, call).await?;

    println!("{}", serde_json::to_string(&output)?);
    info!(tool, "Tool completed");

    Ok(())
}

fn parse_json_args(args: Option<&str>) -> Result<Value> {
    let Some(raw) = args else {
        return Ok(Value::Object(Default::default()));
    };

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("arguments are not valid JSON: {}", e)))?;

    match value {
        Value::Object(_) => Ok(value),
        _ => Err(AppError::Validation(
            "arguments must be a JSON object".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_args_default_to_empty_object() {
        assert_eq!(parse_json_args(None).unwrap(), json!({}));
    }

    #[test]
    fn test_args_must_be_an_object() {
        assert!(matches!(
            parse_json_args(Some("[1, 2]")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_json_args(Some("{not json")),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            parse_json_args(Some(r#"{"title": "T"}"#)).unwrap(),
            json!({"title": "T"})
        );
    }
}
