//! `current_time` action.

use agentsuite_core::action::{Action, ParamType};
use chrono::{FixedOffset, Utc};
use serde_json::Value;

pub const NAME: &str = "current_time";

pub fn action() -> Action {
    Action::builder(NAME)
        .description("Get the current date and time. Defaults to UTC in RFC 3339 format.")
        .param(
            "format",
            ParamType::String,
            "Optional strftime format, e.g. '%Y-%m-%d %H:%M'",
            false,
        )
        .param(
            "utc_offset_hours",
            ParamType::Number,
            "Optional offset from UTC in hours, e.g. -5 or 5.5",
            false,
        )
        .sync(|args| current_time(args.get("format").and_then(Value::as_str), offset_arg(&args)?).map(Value::String))
}

fn offset_arg(args: &Value) -> Result<Option<f64>, String> {
    match args.get("utc_offset_hours") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| "'utc_offset_hours' must be a number".to_string()),
    }
}

fn current_time(format: Option<&str>, offset_hours: Option<f64>) -> Result<String, String> {
    let offset_secs = (offset_hours.unwrap_or(0.0) * 3600.0).round() as i32;
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| format!("Invalid UTC offset: {} hours", offset_hours.unwrap_or(0.0)))?;
    let now = Utc::now().with_timezone(&offset);

    match format {
        None => Ok(now.to_rfc3339()),
        Some(fmt) => {
            use std::fmt::Write;
            let mut out = String::new();
            write!(out, "{}", now.format(fmt)).map_err(|_| format!("Invalid time format: {fmt}"))?;
            Ok(out)
        }
    }
}
