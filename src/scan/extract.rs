use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

const MAX_DESCRIPTION_LEN: usize = 100;

// Loose C-family patterns also match control-flow statements.
const C_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "return", "sizeof", "else", "do", "catch",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LanguageTag {
    Python,
    JavaScript,
    TypeScript,
    Php,
    Kotlin,
    Swift,
    C,
    Cpp,
    Other,
}

impl LanguageTag {
    /// Map a dotted extension such as ".py" to its language tag.
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            ".py" => LanguageTag::Python,
            ".js" | ".jsx" | ".mjs" => LanguageTag::JavaScript,
            ".ts" | ".tsx" => LanguageTag::TypeScript,
            ".php" | ".phtml" => LanguageTag::Php,
            ".kt" | ".kts" => LanguageTag::Kotlin,
            ".swift" => LanguageTag::Swift,
            ".c" | ".h" => LanguageTag::C,
            ".cpp" | ".cc" | ".hpp" | ".cxx" => LanguageTag::Cpp,
            _ => LanguageTag::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LanguageTag::Python => "Python",
            LanguageTag::JavaScript => "JavaScript",
            LanguageTag::TypeScript => "TypeScript",
            LanguageTag::Php => "PHP",
            LanguageTag::Kotlin => "Kotlin",
            LanguageTag::Swift => "Swift",
            LanguageTag::C => "C",
            LanguageTag::Cpp => "C++",
            LanguageTag::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    /// 1-based line of the declaration.
    pub line: usize,
    pub description: String,
}

/// Best-effort declaration matcher keyed by language tag. Patterns
/// recognize common shapes, not the full grammar; unsupported languages
/// yield an empty list.
pub struct FunctionExtractor {
    patterns: HashMap<LanguageTag, Vec<Regex>>,
}

impl FunctionExtractor {
    pub fn new() -> Result<Self> {
        let mut extractor = Self {
            patterns: HashMap::new(),
        };
        extractor.initialize_patterns()?;
        Ok(extractor)
    }

    fn initialize_patterns(&mut self) -> Result<()> {
        self.add_patterns(
            LanguageTag::Python,
            &[r"(?m)^\s*def\s+(\w+)\s*\(", r"(?m)^\s*class\s+(\w+)"],
        )?;

        let script_patterns = &[
            r"(?m)\bfunction\s+(\w+)\s*\(",
            r"(?m)\b(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:function\b|\([^)\n]*\)\s*=>|\w+\s*=>)",
            r"(?m)^\s*(?:export\s+)?(?:abstract\s+)?class\s+(\w+)",
        ];
        self.add_patterns(LanguageTag::JavaScript, script_patterns)?;
        self.add_patterns(LanguageTag::TypeScript, script_patterns)?;

        self.add_patterns(
            LanguageTag::Php,
            &[r"(?m)\bfunction\s+(\w+)\s*\(", r"(?m)^\s*class\s+(\w+)"],
        )?;

        self.add_patterns(
            LanguageTag::Kotlin,
            &[
                r"(?m)\bfun\s+(\w+)\s*\(",
                r"(?m)^\s*(?:class|interface|object)\s+(\w+)",
            ],
        )?;

        self.add_patterns(
            LanguageTag::Swift,
            &[
                r"(?m)\bfunc\s+(\w+)\s*\(",
                r"(?m)^\s*(?:class|struct|protocol|enum)\s+(\w+)",
            ],
        )?;

        let c_patterns = &[r"(?m)^[A-Za-z_][\w\s\*]*?\b(\w+)\s*\([^;{]*\)\s*\{"];
        self.add_patterns(LanguageTag::C, c_patterns)?;
        self.add_patterns(LanguageTag::Cpp, c_patterns)?;

        Ok(())
    }

    fn add_patterns(&mut self, language: LanguageTag, patterns: &[&str]) -> Result<()> {
        let compiled = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.patterns.insert(language, compiled);
        Ok(())
    }

    /// Returns declarations ordered by line, deduplicated by (line, name).
    pub fn extract(&self, language: LanguageTag, text: &str) -> Vec<FunctionInfo> {
        let patterns = match self.patterns.get(&language) {
            Some(patterns) => patterns,
            None => return Vec::new(),
        };

        let lines: Vec<&str> = text.lines().collect();
        let mut found = Vec::new();

        for pattern in patterns {
            for captures in pattern.captures_iter(text) {
                let group = match captures.get(1) {
                    Some(group) => group,
                    None => continue,
                };
                let name = group.as_str().to_string();

                if matches!(language, LanguageTag::C | LanguageTag::Cpp)
                    && C_KEYWORDS.contains(&name.as_str())
                {
                    continue;
                }

                let line = line_of_offset(text, group.start());
                let description = describe(&lines, line);
                found.push(FunctionInfo {
                    name,
                    line,
                    description,
                });
            }
        }

        found.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
        found.dedup_by(|a, b| a.line == b.line && a.name == b.name);
        found
    }
}

fn line_of_offset(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset].iter().filter(|b| **b == b'\n').count() + 1
}

/// One-line description: the adjacent preceding comment if there is one,
/// otherwise an echo of the signature line.
fn describe(lines: &[&str], declaration_line: usize) -> String {
    if declaration_line >= 2 {
        let previous = lines[declaration_line - 2].trim();
        if let Some(comment) = strip_comment_markers(previous) {
            if !comment.is_empty() {
                return truncate(comment);
            }
        }
    }

    let signature = lines
        .get(declaration_line - 1)
        .map(|l| l.trim())
        .unwrap_or_default();
    truncate(signature)
}

fn strip_comment_markers(line: &str) -> Option<&str> {
    for marker in ["///", "//", "#", "/*", "*", "\"\"\""] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim_end_matches("*/").trim());
        }
    }
    None
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_LEN {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX_DESCRIPTION_LEN).collect();
    format!("{}...", truncated.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FunctionExtractor {
        FunctionExtractor::new().unwrap()
    }

    #[test]
    fn python_functions_and_classes() {
        let source = "import os\n\nclass Walker:\n    def scan(self):\n        pass\n\ndef main():\n    pass\n";
        let found = extractor().extract(LanguageTag::Python, source);

        let names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Walker", "scan", "main"]);
        assert_eq!(found[0].line, 3);
        assert_eq!(found[1].line, 4);
        assert_eq!(found[2].line, 7);
    }

    #[test]
    fn javascript_declaration_shapes() {
        let source = "function render(tree) {}\nconst handler = async (req) => {};\nlet shorthand = x => x + 1;\nclass Watcher {}\n";
        let found = extractor().extract(LanguageTag::JavaScript, source);

        let names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["render", "handler", "shorthand", "Watcher"]);
    }

    #[test]
    fn preceding_comment_becomes_description() {
        let source = "# Walks the tree once per cycle\ndef scan():\n    pass\n";
        let found = extractor().extract(LanguageTag::Python, source);

        assert_eq!(found[0].description, "Walks the tree once per cycle");
    }

    #[test]
    fn signature_echo_without_comment() {
        let source = "def scan(root, config):\n    pass\n";
        let found = extractor().extract(LanguageTag::Python, source);

        assert_eq!(found[0].description, "def scan(root, config):");
    }

    #[test]
    fn unsupported_language_is_empty_not_an_error() {
        let found = extractor().extract(LanguageTag::Other, "anything at all");
        assert!(found.is_empty());
    }

    #[test]
    fn c_control_flow_is_not_a_function() {
        let source = "int main(int argc, char **argv) {\n    if (argc > 1) {\n    }\n    return 0;\n}\n";
        let found = extractor().extract(LanguageTag::C, source);

        let names: Vec<&str> = found.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["main"]);
    }

    #[test]
    fn results_are_ordered_and_deduplicated() {
        let source = "def beta():\n    pass\ndef alpha():\n    pass\n";
        let found = extractor().extract(LanguageTag::Python, source);

        assert_eq!(found[0].name, "beta");
        assert_eq!(found[1].name, "alpha");
        assert!(found[0].line < found[1].line);
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(LanguageTag::from_extension(".py"), LanguageTag::Python);
        assert_eq!(LanguageTag::from_extension(".tsx"), LanguageTag::TypeScript);
        assert_eq!(LanguageTag::from_extension(".rs"), LanguageTag::Other);
    }

    #[test]
    fn long_descriptions_are_truncated() {
        let comment = "x".repeat(150);
        let source = format!("# {}\ndef f():\n    pass\n", comment);
        let found = extractor().extract(LanguageTag::Python, &source);

        assert!(found[0].description.ends_with("..."));
        assert!(found[0].description.chars().count() <= MAX_DESCRIPTION_LEN + 3);
    }
}
