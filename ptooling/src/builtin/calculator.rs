//! `calculator`: arithmetic over a closed set of names.
//!
//! Expressions are evaluated by `evalexpr` against a read-only context, so the model
//! can use operators, a few math functions and `pi`/`e`, but cannot assign or call
//! anything else. Integer literals are promoted to floats first, which makes `7 / 2`
//! mean 3.5 rather than integer division.

use std::f64::consts::{E, PI};

use evalexpr::{
    ContextWithMutableFunctions, ContextWithMutableVariables, EvalexprResult, Function,
    HashMapContext, Value as Evaluated, eval_with_context,
};
use serde_json::{Value, json};

use super::basic::number_value;
use crate::{ToolArgs, ToolCatalog, ToolError, object_definition, required_string};

const UNARY_FUNCTIONS: [(&str, fn(f64) -> f64); 10] = [
    ("abs", f64::abs),
    ("sqrt", f64::sqrt),
    ("exp", f64::exp),
    ("log", f64::ln),
    ("ln", f64::ln),
    ("log10", f64::log10),
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("trunc", f64::trunc),
];

pub(super) fn register(catalog: &mut ToolCatalog) {
    catalog.register_sync_fn(
        object_definition(
            "calculator",
            "Evaluate a mathematical expression such as \"2 + 3 * (4 - 1)\" or \"sqrt(16) / 3\".",
            json!({
                "expression": {
                    "type": "string",
                    "description": "Arithmetic using + - * / % ^ (or **), parentheses, pi, e, \
                                    abs, sqrt, exp, log, log10, sin, cos, tan, min, max, round, floor, ceil"
                }
            }),
            &["expression"],
        ),
        calculator,
    );
}

pub fn calculator(args: ToolArgs) -> Result<Value, ToolError> {
    let expression = required_string(&args, "expression")?;
    evaluate(&expression)
}

/// Evaluates `expression` and returns the result as a JSON number or boolean.
pub fn evaluate(expression: &str) -> Result<Value, ToolError> {
    if expression.trim().is_empty() {
        return Err(ToolError::invalid_arguments("expression must not be empty"));
    }

    let context = math_context()
        .map_err(|err| ToolError::other(format!("calculator context: {err}")))?;
    let prepared = promote_integer_literals(&expression.replace("**", "^"));
    let evaluated = eval_with_context(&prepared, &context)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid expression: {err}")))?;

    match evaluated {
        Evaluated::Float(number) if number.is_finite() => Ok(number_value(number)),
        Evaluated::Float(number) => Err(ToolError::execution(format!(
            "'{expression}' does not have a finite value ({number})"
        ))),
        Evaluated::Int(number) => Ok(json!(number)),
        Evaluated::Boolean(flag) => Ok(json!(flag)),
        other => Err(ToolError::invalid_arguments(format!(
            "'{expression}' evaluates to {other}, not a number"
        ))),
    }
}

fn math_context() -> EvalexprResult<HashMapContext> {
    let mut context = HashMapContext::new();
    context.set_value("pi".into(), Evaluated::Float(PI))?;
    context.set_value("e".into(), Evaluated::Float(E))?;
    for (name, apply) in UNARY_FUNCTIONS {
        context.set_function(
            name.into(),
            Function::new(move |argument| Ok(Evaluated::Float(apply(argument.as_number()?)))),
        )?;
    }
    Ok(context)
}

/// Appends `.0` to every bare integer literal.
fn promote_integer_literals(expression: &str) -> String {
    let chars = expression.chars().collect::<Vec<_>>();
    let mut promoted = String::with_capacity(expression.len() + 8);
    let mut index = 0;

    while index < chars.len() {
        let current = chars[index];
        let previous = index.checked_sub(1).map(|previous| chars[previous]);
        let starts_literal = current.is_ascii_digit()
            && !previous.is_some_and(|previous| is_identifier_char(previous) || previous == '.');

        if !starts_literal {
            promoted.push(current);
            index += 1;
            continue;
        }

        let start = index;
        while index < chars.len() && chars[index].is_ascii_digit() {
            index += 1;
        }
        promoted.extend(&chars[start..index]);

        let continues = chars
            .get(index)
            .is_some_and(|next| *next == '.' || is_identifier_char(*next));
        if !continues {
            promoted.push_str(".0");
        }
    }

    promoted
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':'
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{evaluate, promote_integer_literals};
    use crate::ToolErrorKind;

    #[test]
    fn operators_follow_precedence() {
        assert_eq!(evaluate("2 + 3 * (4 - 1)").expect("valid"), json!(11));
        assert_eq!(evaluate("2 ** 10").expect("valid"), json!(1024));
        assert_eq!(evaluate("10 % 4").expect("valid"), json!(2));
    }

    #[test]
    fn division_is_never_truncated() {
        assert_eq!(evaluate("7 / 2").expect("valid"), json!(3.5));
        assert_eq!(evaluate("-7 / 2").expect("valid"), json!(-3.5));
    }

    #[test]
    fn named_functions_and_constants_are_available() {
        assert_eq!(evaluate("sqrt(16) + abs(-2)").expect("valid"), json!(6));
        assert_eq!(evaluate("trunc(7 / 2)").expect("valid"), json!(3));
        let circle = evaluate("2 * pi").expect("valid");
        assert!((circle.as_f64().expect("float") - std::f64::consts::TAU).abs() < 1e-12);
    }

    #[test]
    fn anything_outside_the_context_is_rejected() {
        for expression in ["import os", "secret + 1", "x = 5", "   "] {
            let error = evaluate(expression).expect_err(expression);
            assert_eq!(error.kind, ToolErrorKind::InvalidArguments, "{expression}");
        }
    }

    #[test]
    fn non_finite_results_are_errors() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("sqrt(-1)").is_err());
    }

    #[test]
    fn only_bare_integers_are_promoted() {
        assert_eq!(promote_integer_literals("7/2"), "7.0/2.0");
        assert_eq!(promote_integer_literals("1.5 + 2"), "1.5 + 2.0");
        assert_eq!(promote_integer_literals("log10(100)"), "log10(100.0)");
        assert_eq!(promote_integer_literals("1e3"), "1e3");
    }
}
