//! ABOUTME: Pure template rendering over a flattened artifacts+config view
//! ABOUTME: Supports `{{a.b.c}}` dotted lookup, `{{k|default:'x'}}`, and `{% if %}...{% else %}...{% endif %}`
//!
//! A general template engine (`tera`) ships elsewhere in this workspace's
//! dependency closure for file-processing tools, but its strict
//! undefined-variable behavior and Jinja-flavored filter syntax do not match
//! this contract's documented grammar (bare dotted lookup that renders empty
//! on a missing key, a Django-style `|default:'x'` filter). Per the design
//! note this contract is built against, a minimal hand-written renderer for
//! exactly these forms is simpler than coercing a heavier engine into
//! tolerant semantics it was not built for.

use recipe_core::{Context, RecipeError, Result};
use serde_json::{Map, Value};

/// Render `template` against a flattened view of `context` (artifacts merged
/// over config, artifacts winning on collision). Pure: never reads from or
/// writes to `context` beyond the initial flattened snapshot.
pub fn render(template: &str, context: &Context) -> Result<String> {
    let view = context.flattened_view();
    render_block(template, &view)
}

/// Render every string leaf of a JSON value against `context`, recursing
/// through arrays and objects and leaving non-string scalars untouched. Used
/// where a whole config fragment (MCP server entries, `write_files` specs)
/// needs templating rather than a single string field.
pub fn render_json(value: &Value, context: &Context) -> Result<Value> {
    let view = context.flattened_view();
    render_json_view(value, &view)
}

fn render_json_view(value: &Value, view: &Map<String, Value>) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(render_block(s, view)?)),
        Value::Array(items) => items
            .iter()
            .map(|item| render_json_view(item, view))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut rendered = Map::new();
            for (k, v) in map {
                rendered.insert(k.clone(), render_json_view(v, view)?);
            }
            Ok(Value::Object(rendered))
        }
        other => Ok(other.clone()),
    }
}

fn template_err(message: impl Into<String>) -> RecipeError {
    RecipeError::Template {
        message: message.into(),
    }
}

fn render_block(text: &str, view: &Map<String, Value>) -> Result<String> {
    let mut out = String::new();
    let mut rest = text;
    loop {
        let var_pos = rest.find("{{");
        let tag_pos = rest.find("{%");
        match (var_pos, tag_pos) {
            (None, None) => {
                out.push_str(rest);
                break;
            }
            (Some(vi), tag_opt) if tag_opt.is_none_or(|ti| vi < ti) => {
                out.push_str(&rest[..vi]);
                let after = &rest[vi + 2..];
                let end = after
                    .find("}}")
                    .ok_or_else(|| template_err("unterminated '{{' expression"))?;
                let expr = &after[..end];
                out.push_str(&render_variable(expr, view)?);
                rest = &after[end + 2..];
            }
            (_, Some(ti)) => {
                out.push_str(&rest[..ti]);
                let tag_slice = &rest[ti..];
                let (rendered, consumed) = render_if_tag(tag_slice, view)?;
                out.push_str(&rendered);
                rest = &rest[ti + consumed..];
            }
        }
    }
    Ok(out)
}

/// Render a `{% if %}...{% else %}...{% endif %}` block starting at the
/// beginning of `tag_slice`. Returns the rendered text and how many bytes of
/// `tag_slice` the whole block (through `{% endif %}`) consumed.
fn render_if_tag(tag_slice: &str, view: &Map<String, Value>) -> Result<(String, usize)> {
    let close = tag_slice
        .find("%}")
        .ok_or_else(|| template_err("unterminated '{%' tag"))?;
    let inner = tag_slice[2..close].trim();
    let Some(condition_expr) = inner.strip_prefix("if ") else {
        return Err(template_err(format!("unsupported tag: '{inner}'")));
    };
    let condition_expr = condition_expr.trim();
    let body_start = close + 2;

    let mut depth: u32 = 1;
    let mut scan_from = body_start;
    let mut else_span: Option<(usize, usize)> = None;

    loop {
        let next_open = tag_slice[scan_from..]
            .find("{%")
            .ok_or_else(|| template_err("unterminated '{% if %}' (missing endif)"))?;
        let tag_start = scan_from + next_open;
        let tag_close_rel = tag_slice[tag_start..]
            .find("%}")
            .ok_or_else(|| template_err("unterminated '{%' tag"))?;
        let tag_end = tag_start + tag_close_rel + 2;
        let tag_inner = tag_slice[tag_start + 2..tag_start + tag_close_rel].trim();

        if tag_inner.starts_with("if ") {
            depth += 1;
        } else if tag_inner == "endif" {
            depth -= 1;
            if depth == 0 {
                let if_end = else_span.map_or(tag_start, |(start, _)| start);
                let if_body = &tag_slice[body_start..if_end];
                let else_body = else_span.map(|(_, end)| &tag_slice[end..tag_start]);

                let rendered = if is_truthy_path(condition_expr, view) {
                    render_block(if_body, view)?
                } else {
                    render_block(else_body.unwrap_or(""), view)?
                };
                return Ok((rendered, tag_end));
            }
        } else if tag_inner == "else" && depth == 1 && else_span.is_none() {
            else_span = Some((tag_start, tag_end));
        }
        scan_from = tag_end;
    }
}

fn render_variable(expr: &str, view: &Map<String, Value>) -> Result<String> {
    let mut parts = expr.splitn(2, '|');
    let var_expr = parts.next().unwrap_or("").trim();
    let filter_expr = parts.next().map(str::trim);
    let resolved = lookup_path(view, var_expr);

    if let Some(filter) = filter_expr {
        let default_text = parse_default_filter(filter)?;
        let falsy = resolved.as_ref().is_none_or(|v| !truthy(v));
        if falsy {
            return Ok(default_text);
        }
    }

    Ok(resolved.as_ref().map_or_else(String::new, value_to_string))
}

fn parse_default_filter(filter: &str) -> Result<String> {
    let Some(literal) = filter.strip_prefix("default:") else {
        return Err(template_err(format!("unsupported filter: '{filter}'")));
    };
    let literal = literal.trim();
    if literal.len() >= 2 {
        let bytes = literal.as_bytes();
        let (first, last) = (bytes[0] as char, bytes[bytes.len() - 1] as char);
        if (first == '\'' && last == '\'') || (first == '"' && last == '"') {
            return Ok(literal[1..literal.len() - 1].to_string());
        }
    }
    Ok(literal.to_string())
}

fn is_truthy_path(path: &str, view: &Map<String, Value>) -> bool {
    lookup_path(view, path).is_some_and(|v| truthy(&v))
}

/// Dotted-path lookup identical in semantics to `Context::get_path`, over an
/// already-flattened map; missing intermediate keys resolve to `None`.
fn lookup_path(view: &Map<String, Value>, path: &str) -> Option<Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = view.get(first)?.clone();
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?.clone(),
            _ => return None,
        };
    }
    Some(current)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx_with(artifacts: Map<String, Value>) -> Context {
        Context::with_initial(artifacts, Map::new())
    }

    #[test]
    fn render_json_walks_nested_structures() {
        let mut artifacts = Map::new();
        artifacts.insert("name".to_string(), json!("search"));
        let ctx = ctx_with(artifacts);
        let value = json!({
            "tool_prefix": "{{name}}",
            "args": ["--root", "{{name}}/data"],
            "retries": 3,
        });
        let rendered = render_json(&value, &ctx).unwrap();
        assert_eq!(rendered["tool_prefix"], json!("search"));
        assert_eq!(rendered["args"][1], json!("search/data"));
        assert_eq!(rendered["retries"], json!(3));
    }

    #[test]
    fn idempotent_on_marker_free_text() {
        let ctx = Context::new();
        let s = "no markers here, just plain text.";
        assert_eq!(render(s, &ctx).unwrap(), s);
    }

    #[test]
    fn renders_dotted_lookup() {
        let mut artifacts = Map::new();
        artifacts.insert("a".to_string(), json!({"b": {"c": "deep"}}));
        let ctx = ctx_with(artifacts);
        assert_eq!(render("{{a.b.c}}", &ctx).unwrap(), "deep");
    }

    #[test]
    fn missing_middle_key_renders_empty() {
        let mut artifacts = Map::new();
        artifacts.insert("a".to_string(), json!({"b": {}}));
        let ctx = ctx_with(artifacts);
        assert_eq!(render("[{{a.b.c}}]", &ctx).unwrap(), "[]");
        assert_eq!(render("[{{nope.x}}]", &ctx).unwrap(), "[]");
    }

    #[test]
    fn default_filter_on_missing_key() {
        let ctx = Context::new();
        assert_eq!(render("{{key|default:'x'}}", &ctx).unwrap(), "x");
    }

    #[test]
    fn default_filter_on_falsy_value() {
        let mut artifacts = Map::new();
        artifacts.insert("key".to_string(), json!(""));
        let ctx = ctx_with(artifacts);
        assert_eq!(render("{{key|default:'x'}}", &ctx).unwrap(), "x");
    }

    #[test]
    fn default_filter_skipped_when_present() {
        let mut artifacts = Map::new();
        artifacts.insert("key".to_string(), json!("value"));
        let ctx = ctx_with(artifacts);
        assert_eq!(render("{{key|default:'x'}}", &ctx).unwrap(), "value");
    }

    #[test]
    fn if_else_picks_true_branch() {
        let mut artifacts = Map::new();
        artifacts.insert("ready".to_string(), json!(true));
        let ctx = ctx_with(artifacts);
        assert_eq!(
            render("{% if ready %}yes{% else %}no{% endif %}", &ctx).unwrap(),
            "yes"
        );
    }

    #[test]
    fn if_else_picks_false_branch() {
        let mut artifacts = Map::new();
        artifacts.insert("ready".to_string(), json!(false));
        let ctx = ctx_with(artifacts);
        assert_eq!(
            render("{% if ready %}yes{% else %}no{% endif %}", &ctx).unwrap(),
            "no"
        );
    }

    #[test]
    fn if_without_else_on_false_renders_empty() {
        let ctx = Context::new();
        assert_eq!(render("[{% if ready %}yes{% endif %}]", &ctx).unwrap(), "[]");
    }

    #[test]
    fn nested_if_blocks_resolve_independently() {
        let mut artifacts = Map::new();
        artifacts.insert("outer".to_string(), json!(true));
        artifacts.insert("inner".to_string(), json!(false));
        let ctx = ctx_with(artifacts);
        let template = "{% if outer %}O[{% if inner %}I{% else %}J{% endif %}]{% else %}X{% endif %}";
        assert_eq!(render(template, &ctx).unwrap(), "O[J]");
    }

    #[test]
    fn unterminated_variable_is_template_error() {
        let ctx = Context::new();
        assert!(matches!(
            render("{{oops", &ctx),
            Err(RecipeError::Template { .. })
        ));
    }

    #[test]
    fn unknown_tag_is_template_error() {
        let ctx = Context::new();
        assert!(matches!(
            render("{% for x in y %}{% endfor %}", &ctx),
            Err(RecipeError::Template { .. })
        ));
    }

    #[test]
    fn config_and_artifacts_merge_with_artifact_precedence() {
        let mut ctx = Context::new();
        ctx.config_set("name", json!("config-name"));
        ctx.set("name", json!("artifact-name"));
        assert_eq!(render("{{name}}", &ctx).unwrap(), "artifact-name");
    }
}
