use crate::error::{Result, SelectorError};
use crate::language::{EndDetection, LanguageRegistry};
use crate::types::FunctionSpan;

/// Finds where a named function starts and ends in full source text
pub struct FunctionLocator<'a> {
    registry: &'a LanguageRegistry,
}

impl<'a> FunctionLocator<'a> {
    #[must_use]
    pub const fn new(registry: &'a LanguageRegistry) -> Self {
        Self { registry }
    }

    /// Locate `function_name` in `full_text`.
    ///
    /// The first line matching the language's start anchor opens the function; the
    /// template's end strategy closes it. Line numbers are 1-indexed and inclusive.
    pub fn locate(
        &self,
        language: &str,
        function_name: &str,
        full_text: &str,
    ) -> Result<FunctionSpan> {
        let Some(template) = self.registry.get(language) else {
            log::warn!("templates not defined for language: {language}");
            return Err(SelectorError::unsupported_language(language));
        };

        let language_id = self.registry.resolve_id(language);
        let start_pattern = template.start_pattern(&language_id, function_name)?;
        let lines: Vec<&str> = full_text.split('\n').collect();

        let Some(start_idx) = lines.iter().position(|line| start_pattern.is_match(line)) else {
            log::debug!("function {function_name} could not be found ({language_id})");
            return Err(SelectorError::function_not_found(function_name));
        };

        let end_idx = match &template.end {
            EndDetection::Indent => indent_end(&lines, start_idx),
            EndDetection::Brackets => brackets_end(&lines, start_idx),
            EndDetection::Other(method) => {
                log::warn!("unsupported end detection method: {method}");
                return Err(SelectorError::UnsupportedEndDetection {
                    language: language_id,
                    method: method.clone(),
                });
            }
        };

        Ok(FunctionSpan::new(start_idx + 1, end_idx + 1))
    }

    /// Locate several functions independently, in the order given
    pub fn locate_all<S: AsRef<str>>(
        &self,
        language: &str,
        function_names: &[S],
        full_text: &str,
    ) -> Result<Vec<FunctionSpan>> {
        function_names
            .iter()
            .map(|name| self.locate(language, name.as_ref(), full_text))
            .collect()
    }
}

/// Count of leading whitespace characters, `None` for a blank line
#[must_use]
pub fn indentation_width(line: &str) -> Option<usize> {
    if line.trim().is_empty() {
        return None;
    }
    Some(line.chars().take_while(|c| c.is_whitespace()).count())
}

/// Index of the last non-blank line before the first dedent.
///
/// Blank lines never end the body. Without a dedent the body runs to the last
/// non-blank line of the text; a definition with no body ends on itself.
fn indent_end(lines: &[&str], start_idx: usize) -> usize {
    let start_indent = indentation_width(lines[start_idx]).unwrap_or(0);
    let mut last_valid = start_idx;

    for (idx, line) in lines.iter().enumerate().skip(start_idx + 1) {
        let Some(indent) = indentation_width(line) else {
            continue;
        };
        if indent <= start_indent {
            break;
        }
        last_valid = idx;
    }

    last_valid
}

/// Index of the first line where the running `{`/`}` balance is zero again,
/// counting from the start line itself. Unbalanced bodies run to the last line.
fn brackets_end(lines: &[&str], start_idx: usize) -> usize {
    let mut balance: i64 = 0;

    for (idx, line) in lines.iter().enumerate().skip(start_idx) {
        for ch in line.chars() {
            match ch {
                '{' => balance += 1,
                '}' => balance -= 1,
                _ => {}
            }
        }
        if balance == 0 {
            return idx;
        }
    }

    lines.len() - 1
}
