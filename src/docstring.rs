//! Handler documentation read from `///` doc comments.
//!
//! The layout follows rustdoc conventions:
//!
//! ```text
//! /// Fetch a user.
//! ///
//! /// Looks the user up by id and returns it when found.
//! ///
//! /// # Arguments
//! ///
//! /// * `id` - The user id
//! /// * `verbose` (query) - Include the audit trail
//! ```
//!
//! The first line is the summary, the paragraphs up to the first heading are the description and
//! the bullets under `# Arguments` or `# Parameters` describe parameters.

use crate::document::ParameterLocation;
use crate::routes::{DocstringInfo, DocstringParameter};
use log::debug;

/// Collect the text of `#[doc = "..."]` attributes
pub fn doc_text(attrs: &[syn::Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            syn::Meta::NameValue(name_value) => match &name_value.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(text),
                    ..
                }) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').unwrap_or(&line).to_string())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[derive(PartialEq)]
enum Section {
    Description,
    Parameters,
    Other,
}

/// Parse doc comment text into summary, description and parameter descriptions
pub fn parse_docstring(text: &str) -> Option<DocstringInfo> {
    let mut lines = text.lines().map(str::trim).skip_while(|line| line.is_empty());
    let summary = lines.next()?.to_string();

    let mut info = DocstringInfo {
        summary: Some(summary),
        ..DocstringInfo::default()
    };
    let mut description: Vec<&str> = Vec::new();
    let mut section = Section::Description;
    let mut current: Option<String> = None;

    for line in lines {
        if let Some(heading) = line.strip_prefix('#') {
            let heading = heading.trim_start_matches('#').trim().to_ascii_lowercase();
            section = match heading.as_str() {
                "arguments" | "parameters" => Section::Parameters,
                _ => Section::Other,
            };
            current = None;
            continue;
        }

        match section {
            Section::Description => description.push(line),
            Section::Parameters => {
                if let Some((name, parameter)) = parse_parameter_line(line) {
                    info.parameters.insert(name.clone(), parameter);
                    current = Some(name);
                } else if line.is_empty() {
                    current = None;
                } else if let Some(parameter) =
                    current.as_ref().and_then(|name| info.parameters.get_mut(name))
                {
                    parameter.description.push(' ');
                    parameter.description.push_str(line);
                }
            }
            Section::Other => {}
        }
    }

    let description = join_paragraphs(&description);
    if !description.is_empty() {
        info.description = Some(description);
    }

    debug!(
        "Parsed doc comment with {} parameter descriptions",
        info.parameters.len()
    );
    Some(info)
}

/// `* `name` - text` or `* `name` (source) - text`
fn parse_parameter_line(line: &str) -> Option<(String, DocstringParameter)> {
    let rest = line
        .strip_prefix('*')
        .or_else(|| line.strip_prefix('-'))?
        .trim_start();
    let rest = rest.strip_prefix('`')?;
    let (name, rest) = rest.split_once('`')?;
    let mut rest = rest.trim_start();

    let mut source = None;
    if let Some(inner) = rest.strip_prefix('(') {
        let (location, after) = inner.split_once(')')?;
        source = match location.trim() {
            "query" => Some(ParameterLocation::Query),
            "path" => Some(ParameterLocation::Path),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        };
        rest = after.trim_start();
    }

    let description = rest
        .strip_prefix('-')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest)
        .trim();

    Some((
        name.to_string(),
        DocstringParameter {
            description: description.to_string(),
            source,
            ..DocstringParameter::default()
        },
    ))
}

fn join_paragraphs(lines: &[&str]) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    paragraphs.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "Fetch a user.

Looks the user up by id
and returns it when found.

Admins see deleted users too.

# Arguments

* `id` - The user id
* `verbose` (query) - Include the audit trail,
  sorted by date

# Errors

* `NotFound` - not documented as a parameter
";

    #[test]
    fn test_summary_and_description() {
        let info = parse_docstring(DOC).unwrap();
        assert_eq!(info.summary.as_deref(), Some("Fetch a user."));
        assert_eq!(
            info.description.as_deref(),
            Some("Looks the user up by id and returns it when found.\n\nAdmins see deleted users too.")
        );
    }

    #[test]
    fn test_parameters_section() {
        let info = parse_docstring(DOC).unwrap();
        let names: Vec<&String> = info.parameters.keys().collect();
        assert_eq!(names, vec!["id", "verbose"]);

        assert_eq!(info.parameters["id"].description, "The user id");
        assert!(info.parameters["id"].source.is_none());

        let verbose = &info.parameters["verbose"];
        assert_eq!(verbose.source, Some(ParameterLocation::Query));
        assert_eq!(
            verbose.description,
            "Include the audit trail, sorted by date"
        );
    }

    #[test]
    fn test_summary_only() {
        let info = parse_docstring("\n  Ping the service\n").unwrap();
        assert_eq!(info.summary.as_deref(), Some("Ping the service"));
        assert!(info.description.is_none());
        assert!(info.parameters.is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_docstring("   \n\n").is_none());
    }

    #[test]
    fn test_doc_text_from_attributes() {
        let item: syn::ItemFn = syn::parse_str(
            r#"
            /// Create a user.
            ///
            /// * `payload` - the user
            #[allow(unused)]
            fn create_user() {}
            "#,
        )
        .unwrap();

        let text = doc_text(&item.attrs).unwrap();
        assert_eq!(text, "Create a user.\n\n* `payload` - the user");
    }
}
