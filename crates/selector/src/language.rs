use crate::error::{Result, SelectorError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Placeholder substituted with the (escaped) function name in a start template
pub const NAME_PLACEHOLDER: &str = "{name}";

/// How the end of a function body is found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EndDetection {
    /// Body ends before the first non-blank line indented no deeper than the start line
    Indent,
    /// Body ends where `{`/`}` balance returns to zero
    Brackets,
    /// Tag read from a template file that no strategy implements
    Other(String),
}

impl EndDetection {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Indent => "indent",
            Self::Brackets => "brackets",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for EndDetection {
    fn from(tag: String) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "indent" => Self::Indent,
            "brackets" => Self::Brackets,
            _ => Self::Other(tag),
        }
    }
}

impl From<EndDetection> for String {
    fn from(end: EndDetection) -> Self {
        end.as_str().to_string()
    }
}

impl fmt::Display for EndDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start anchor plus end strategy for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTemplate {
    /// Regex with a `{name}` placeholder matching the first line of a function
    pub start: String,

    /// End-detection strategy
    pub end: EndDetection,
}

impl LanguageTemplate {
    pub fn new(start: impl Into<String>, end: EndDetection) -> Self {
        Self {
            start: start.into(),
            end,
        }
    }

    /// Compile the start anchor for `function_name`
    pub fn start_pattern(&self, language: &str, function_name: &str) -> Result<Regex> {
        let pattern = self
            .start
            .replace(NAME_PLACEHOLDER, &regex::escape(function_name.trim()));
        Regex::new(&pattern).map_err(|source| SelectorError::InvalidTemplate {
            language: language.to_string(),
            source,
        })
    }
}

const BUILTIN_TEMPLATES: &[(&str, &str, &str)] = &[
    ("python", r"def\s+{name}\s*\(", "indent"),
    (
        "c",
        r"(?:int|void|char)\s+{name}\s*\([^)]*\)\s*\{",
        "brackets",
    ),
    (
        "csharp",
        r"(?:public|private|protected)\s+(?:static\s+)?(?:void|int|string)\s+{name}\s*\([^)]*\)\s*\{",
        "brackets",
    ),
    ("bash", r"{name}\s*\(\)\s*\{", "brackets"),
    ("ruby", r"def\s+(?:self\.)?{name}(?:[\s(;]|$)", "indent"),
    ("javascript", r"{name}\([\w, ]*\)\s*\{", "brackets"),
    (
        "typescript",
        r"{name}\s*(?:<[^>]*>)?\s*\([^)]*\)[^{;]*\{",
        "brackets",
    ),
    ("rust", r"\bfn\s+{name}\s*[<(]", "brackets"),
    ("go", r"\bfunc\s+(?:\([^)]*\)\s*)?{name}\s*[\[(]", "brackets"),
    ("java", r"\s{name}\s*\([^)]*\)[^;{]*\{", "brackets"),
];

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("py", "python"),
    ("python3", "python"),
    ("h", "c"),
    ("cs", "csharp"),
    ("c#", "csharp"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
    ("rb", "ruby"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("rs", "rust"),
    ("golang", "go"),
];

#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    languages: BTreeMap<String, LanguageTemplate>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

/// Mapping from language identifier to its template.
///
/// Adding a language is a data change: register a template (or load one from TOML);
/// the locator itself never branches on the language.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    templates: BTreeMap<String, LanguageTemplate>,
    aliases: BTreeMap<String, String>,
}

impl LanguageRegistry {
    /// Registry without any language
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in templates and aliases
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (id, start, end) in BUILTIN_TEMPLATES {
            let end = EndDetection::from((*end).to_string());
            registry.register(*id, LanguageTemplate::new(*start, end));
        }
        for (alias, target) in BUILTIN_ALIASES {
            registry.alias(*alias, *target);
        }
        registry
    }

    /// Add or replace a template
    pub fn register(&mut self, language: impl Into<String>, template: LanguageTemplate) {
        self.templates.insert(normalize_id(&language.into()), template);
    }

    /// Make `alias` resolve to `target`
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases
            .insert(normalize_id(&alias.into()), normalize_id(&target.into()));
    }

    /// Look up the template for a language identifier or alias
    #[must_use]
    pub fn get(&self, language: &str) -> Option<&LanguageTemplate> {
        let id = self.resolve_id(language);
        self.templates.get(&id)
    }

    /// Canonical identifier for `language` (aliases followed once)
    #[must_use]
    pub fn resolve_id(&self, language: &str) -> String {
        let id = normalize_id(language);
        if self.templates.contains_key(&id) {
            return id;
        }
        self.aliases.get(&id).cloned().unwrap_or(id)
    }

    #[must_use]
    pub fn supports(&self, language: &str) -> bool {
        self.get(language).is_some()
    }

    /// Registered language identifiers (aliases excluded), sorted
    pub fn languages(&self) -> impl Iterator<Item = (&str, &LanguageTemplate)> {
        self.templates.iter().map(|(id, tpl)| (id.as_str(), tpl))
    }

    /// Aliases as `(alias, target)` pairs, sorted
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, t)| (a.as_str(), t.as_str()))
    }

    /// Merge templates from a TOML document:
    ///
    /// ```toml
    /// [languages.kotlin]
    /// start = 'fun\s+{name}\s*\('
    /// end = "brackets"
    ///
    /// [aliases]
    /// kt = "kotlin"
    /// ```
    pub fn extend_from_toml(&mut self, content: &str) -> Result<usize> {
        let file: TemplateFile = toml::from_str(content)?;
        let added = file.languages.len();
        for (id, template) in file.languages {
            if let EndDetection::Other(tag) = &template.end {
                log::warn!("template for {id} uses unknown end detection method {tag:?}");
            }
            self.register(id, template);
        }
        for (alias, target) in file.aliases {
            self.alias(alias, target);
        }
        Ok(added)
    }

    /// Merge templates from a TOML file on disk
    pub fn extend_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let added = self.extend_from_toml(&content)?;
        log::debug!(
            "loaded {added} language template(s) from {}",
            path.as_ref().display()
        );
        Ok(added)
    }
}

fn normalize_id(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}
