use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde_json::{Value, json};

use crate::{ToolArgs, ToolCatalog, ToolError, object_definition, required_number};

pub(super) fn register(catalog: &mut ToolCatalog) {
    catalog.register_sync_fn(
        object_definition(
            "add_two_numbers",
            "Add two numbers and return the sum.",
            json!({
                "a": {"type": "number", "description": "The first number"},
                "b": {"type": "number", "description": "The second number"}
            }),
            &["a", "b"],
        ),
        add_two_numbers,
    );

    catalog.register_sync_fn(
        object_definition(
            "get_current_datetime",
            "Return the current local date and time.",
            json!({}),
            &[],
        ),
        |_args| Ok(current_datetime(Local::now().naive_local())),
    );
}

/// Integer inputs produce an integer sum.
pub fn add_two_numbers(args: ToolArgs) -> Result<Value, ToolError> {
    let a = required_number(&args, "a")?;
    let b = required_number(&args, "b")?;
    Ok(number_value(a + b))
}

/// Whole numbers render without a fractional part.
pub(super) fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        json!(number as i64)
    } else {
        json!(number)
    }
}

pub fn current_datetime(now: NaiveDateTime) -> Value {
    json!({
        "iso": now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "year": now.year(),
        "month": now.month(),
        "day": now.day(),
        "hour": now.hour(),
        "minute": now.minute(),
        "second": now.second(),
    })
}
