//! Template context building and rendering.
//!
//! Settings templates use one of two placeholder syntaxes, selected per
//! project: percent (`%(NAME)s`, escape `%%`) or dollar (`$name`/`${name}`,
//! escape `$$`). Rendering a placeholder whose name is absent from the
//! context is an error; text without placeholders renders to itself, so
//! rendered output is stable under a second render.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::local_files::local;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateSyntax {
    #[default]
    Percent,
    Dollar,
}

fn percent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"%%|%\(([A-Za-z_][A-Za-z0-9_]*)\)s").expect("Invalid regex pattern")
    })
}

fn dollar_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .expect("Invalid regex pattern")
    })
}

/// Build the substitution context from the project settings store plus
/// command-line overrides. Every name in `required` must resolve to a
/// non-empty value; all missing names are reported in a single error
/// rather than prompting mid-pipeline.
pub fn build_context(
    settings: &HashMap<String, String>,
    overrides: &HashMap<String, String>,
    required: &[String],
) -> Result<HashMap<String, String>> {
    let mut context = settings.clone();
    for (key, value) in overrides {
        context.insert(key.clone(), value.clone());
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|name| !context.get(*name).is_some_and(|v| !v.is_empty()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        return Err(Error::config_missing_keys(missing));
    }

    Ok(context)
}

/// Substitute every placeholder in `text` with its context value.
pub fn render_str(
    text: &str,
    context: &HashMap<String, String>,
    syntax: TemplateSyntax,
) -> Result<String> {
    render_internal(text, context, syntax, None)
}

fn render_internal(
    text: &str,
    context: &HashMap<String, String>,
    syntax: TemplateSyntax,
    source: Option<&Path>,
) -> Result<String> {
    let (re, literal) = match syntax {
        TemplateSyntax::Percent => (percent_re(), "%"),
        TemplateSyntax::Dollar => (dollar_re(), "$"),
    };

    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        out.push_str(&text[last..m.start()]);

        let name = caps.get(1).or_else(|| caps.get(2));
        match name {
            Some(name) => {
                let key = name.as_str();
                let value = context.get(key).ok_or_else(|| {
                    Error::template_missing_key(
                        key,
                        source.map(|p| p.display().to_string()),
                    )
                })?;
                out.push_str(value);
            }
            // Matched the escape sequence (%% or $$)
            None => out.push_str(literal),
        }

        last = m.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}

/// Render a template file to a destination, creating parent directories
/// as needed.
pub fn render_file(
    source: &Path,
    dest: &Path,
    context: &HashMap<String, String>,
    syntax: TemplateSyntax,
) -> Result<()> {
    let text = local().read(source)?;
    let rendered = render_internal(&text, context, syntax, Some(source))?;
    local().write(dest, &rendered)
}

/// Render every file under `source_dir` into `dest_dir`, preserving the
/// directory layout.
pub fn render_tree(
    source_dir: &Path,
    dest_dir: &Path,
    context: &HashMap<String, String>,
    syntax: TemplateSyntax,
) -> Result<Vec<std::path::PathBuf>> {
    let mut rendered = Vec::new();
    render_tree_into(source_dir, dest_dir, context, syntax, &mut rendered)?;
    Ok(rendered)
}

fn render_tree_into(
    source_dir: &Path,
    dest_dir: &Path,
    context: &HashMap<String, String>,
    syntax: TemplateSyntax,
    rendered: &mut Vec<std::path::PathBuf>,
) -> Result<()> {
    for entry in local().list(source_dir)? {
        let Some(name) = entry.path.file_name() else {
            continue;
        };
        let target = dest_dir.join(name);
        if entry.is_dir {
            render_tree_into(&entry.path, &target, context, syntax, rendered)?;
        } else {
            render_file(&entry.path, &target, context, syntax)?;
            rendered.push(target);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn percent_substitution() {
        let out = render_str("host=%(DB_HOST)s", &ctx(&[("DB_HOST", "db1")]), TemplateSyntax::Percent)
            .unwrap();
        assert_eq!(out, "host=db1");
    }

    #[test]
    fn percent_escape() {
        let out = render_str("100%% free", &ctx(&[]), TemplateSyntax::Percent).unwrap();
        assert_eq!(out, "100% free");
    }

    #[test]
    fn percent_missing_key() {
        let err = render_str("port=%(DB_PORT)s", &ctx(&[]), TemplateSyntax::Percent).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::TemplateMissingKey);
        assert!(err.message.contains("DB_PORT"));
    }

    #[test]
    fn dollar_substitution_both_forms() {
        let context = ctx(&[("name", "blog"), ("port", "9000")]);
        let out = render_str("app=$name http=${port}", &context, TemplateSyntax::Dollar).unwrap();
        assert_eq!(out, "app=blog http=9000");
    }

    #[test]
    fn dollar_escape() {
        let out = render_str("cost=$$5", &ctx(&[]), TemplateSyntax::Dollar).unwrap();
        assert_eq!(out, "cost=$5");
    }

    #[test]
    fn rendering_is_idempotent_once_placeholders_are_gone() {
        let context = ctx(&[("DB_HOST", "db1")]);
        let once = render_str("host=%(DB_HOST)s", &context, TemplateSyntax::Percent).unwrap();
        let twice = render_str(&once, &context, TemplateSyntax::Percent).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn build_context_reports_all_missing_keys() {
        let settings = ctx(&[("DB_HOST", "db1"), ("EMPTY", "")]);
        let required = vec![
            "DB_HOST".to_string(),
            "DB_PORT".to_string(),
            "EMPTY".to_string(),
        ];
        let err = build_context(&settings, &HashMap::new(), &required).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ConfigMissingKey);
        assert!(err.message.contains("DB_PORT"));
        assert!(err.message.contains("EMPTY"));
        assert!(!err.message.contains("DB_HOST"));
    }

    #[test]
    fn build_context_overrides_win() {
        let settings = ctx(&[("DB_HOST", "db1")]);
        let overrides = ctx(&[("DB_HOST", "db2")]);
        let context = build_context(&settings, &overrides, &["DB_HOST".to_string()]).unwrap();
        assert_eq!(context.get("DB_HOST").map(String::as_str), Some("db2"));
    }
}
