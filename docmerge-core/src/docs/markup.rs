//! Extraction of documentation fragments from inline markup.
//!
//! Only a fixed set of section markers is located:
//! `summary`, `remarks`, `returns`, `value`, `param`, `typeparam`,
//! `exception` and `seealso`. Everything inside a section, including inline
//! tags such as `<see cref="..."/>` or `<c>`, is kept verbatim for renderers.
//!
//! Pre-compiled regex patterns (compile once, use many).

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::fragments::{DocFragments, ExceptionDoc, TypeParamDoc};
use crate::common::normalize_cref;

/// Markup that cannot be trusted; the entity degrades to absent fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed documentation markup: {message}")]
pub struct MarkupError {
    pub message: String,
}

impl MarkupError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of extracting one entity's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocs {
    pub fragments: DocFragments,
    /// Parameter name -> description
    pub params: HashMap<String, String>,
}

struct Patterns {
    comment: Regex,
    tag: Regex,
    summary: Regex,
    remarks: Regex,
    returns: Regex,
    value: Regex,
    param: Regex,
    typeparam: Regex,
    exception: Regex,
    seealso: Regex,
}

fn section(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}\s*>(.*?)</{tag}\s*>")).expect("Hardcoded regex pattern is valid")
}

fn named_section(tag: &str, attr: &str) -> Regex {
    Regex::new(&format!(
        r#"(?s)<{tag}\s+{attr}\s*=\s*["']([^"']*)["']\s*(?:/>|>(.*?)</{tag}\s*>)"#
    ))
    .expect("Hardcoded regex pattern is valid")
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        comment: Regex::new(r"(?s)<!--.*?-->").expect("Hardcoded regex pattern is valid"),
        tag: Regex::new(r#"<(/?)([A-Za-z_][\w:.-]*)((?:\s+[^<>]*?)?)\s*(/?)>"#)
            .expect("Hardcoded regex pattern is valid"),
        summary: section("summary"),
        remarks: section("remarks"),
        returns: section("returns"),
        value: section("value"),
        param: named_section("param", "name"),
        typeparam: named_section("typeparam", "name"),
        exception: named_section("exception", "cref"),
        seealso: named_section("seealso", "cref"),
    })
}

/// Check that tags are balanced.
fn check_well_formed(markup: &str) -> Result<(), MarkupError> {
    let mut stack: Vec<&str> = Vec::new();

    for caps in patterns().tag.captures_iter(markup) {
        let closing = !caps[1].is_empty();
        let self_closing = !caps[4].is_empty();
        let Some(name) = caps.get(2).map(|m| m.as_str()) else {
            continue;
        };

        if self_closing {
            continue;
        }
        if closing {
            match stack.pop() {
                Some(open) if open == name => {}
                Some(open) => {
                    return Err(MarkupError::new(format!(
                        "</{}> closes <{}>",
                        name, open
                    )))
                }
                None => return Err(MarkupError::new(format!("unexpected </{}>", name))),
            }
        } else {
            stack.push(name);
        }
    }

    match stack.last() {
        Some(open) => Err(MarkupError::new(format!("unclosed <{}>", open))),
        None => Ok(()),
    }
}

/// Dedent and trim section text; whitespace-only content is absent.
///
/// The indentation shared by the non-blank lines is removed, so relative
/// indentation (inside `<code>` blocks, say) survives. Text on the opening
/// tag's line had its indentation consumed by the tag and is not counted.
fn clean(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let dedented: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.trim().is_empty() {
                return line.trim();
            }
            let cut = line.char_indices().nth(indent).map_or(line.len(), |(at, _)| at);
            line[cut..].trim_end()
        })
        .collect();

    let joined = dedented.join("\n");
    let trimmed = joined.trim_matches('\n');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn first_section(re: &Regex, markup: &str) -> Option<String> {
    re.captures_iter(markup)
        .find_map(|caps| caps.get(1).and_then(|m| clean(m.as_str())))
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Extract structured documentation from raw markup.
///
/// Empty or whitespace-only markup yields all-absent fragments. Unbalanced
/// tags yield an error; callers degrade the entity and record a diagnostic.
pub fn extract(markup: &str) -> Result<ParsedDocs, MarkupError> {
    let p = patterns();
    let stripped = p.comment.replace_all(markup, "");
    let text = stripped.as_ref();

    if text.trim().is_empty() {
        return Ok(ParsedDocs::default());
    }
    check_well_formed(text)?;

    let mut params = HashMap::new();
    for caps in p.param.captures_iter(text) {
        let name = caps[1].trim().to_string();
        if let Some(desc) = caps.get(2).and_then(|m| clean(m.as_str())) {
            params.entry(name).or_insert(desc);
        }
    }

    let type_parameters: Vec<TypeParamDoc> = p
        .typeparam
        .captures_iter(text)
        .map(|caps| TypeParamDoc {
            name: caps[1].trim().to_string(),
            description: caps.get(2).and_then(|m| clean(m.as_str())),
        })
        .filter(|tp| !tp.name.is_empty())
        .collect();

    let exceptions: Vec<ExceptionDoc> = p
        .exception
        .captures_iter(text)
        .map(|caps| ExceptionDoc {
            type_name: normalize_cref(&caps[1]),
            description: caps.get(2).and_then(|m| clean(m.as_str())),
        })
        .filter(|ex| !ex.type_name.is_empty())
        .collect();

    let mut see_also: Vec<String> = Vec::new();
    for caps in p.seealso.captures_iter(text) {
        let target = normalize_cref(&caps[1]);
        if !target.is_empty() && !see_also.contains(&target) {
            see_also.push(target);
        }
    }

    let fragments = DocFragments {
        summary: first_section(&p.summary, text),
        remarks: first_section(&p.remarks, text),
        returns: first_section(&p.returns, text),
        value: first_section(&p.value, text),
        exceptions: non_empty(exceptions),
        type_parameters: non_empty(type_parameters),
        see_also: non_empty(see_also),
        ..DocFragments::default()
    };

    Ok(ParsedDocs { fragments, params })
}
