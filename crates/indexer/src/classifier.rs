use pattern_protocol::Tag;
use regex::Regex;
use std::sync::OnceLock;

/// Rule table, most specific first. A constructor also looks like a method, an annotation or
/// import line can look like a property; the order settles those overlaps.
const RULES: &[(Tag, &str)] = &[
    (Tag::Annotation, r"^@\w+"),
    (Tag::Import, r"^import\s+[\w.]+\s*;"),
    (
        Tag::Class,
        r"^(public\s+)?(final\s+)?(abstract\s+)?class\s+\w+",
    ),
    (
        Tag::Constructor,
        r"^(public|protected|private)?\s+[A-Z]\w*\s*\(.*?\)\s*\{?",
    ),
    (
        Tag::Function,
        r"^(public|private|protected)?\s*(static\s+)?[\w<>\[\]]+\s+\w+\s*\(.*?\)\s*\{?",
    ),
    (
        Tag::BuildDependency,
        r#"^(implementation|api|compile|runtimeOnly|testImplementation|.*Implementation)\s+(platform|enforcedPlatform)?\s*[('"]"#,
    ),
    (Tag::Property, r"^[\w.\-]+\s*=\s*.+"),
];

struct Rule {
    tag: Tag,
    pattern: Regex,
}

/// Ordered (predicate, tag) rules evaluated short-circuit over the trimmed line.
pub struct LineClassifier {
    rules: Vec<Rule>,
}

impl LineClassifier {
    /// Shared instance; the rule set is compiled once per process.
    pub fn standard() -> &'static LineClassifier {
        static STANDARD: OnceLock<LineClassifier> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let rules = RULES
                .iter()
                .map(|(tag, pattern)| Rule {
                    tag: *tag,
                    pattern: Regex::new(pattern).expect("classifier rule must compile"),
                })
                .collect();
            LineClassifier { rules }
        })
    }

    #[must_use]
    pub fn classify(&self, line: &str) -> Tag {
        let stripped = line.trim();
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(stripped))
            .map_or(Tag::Generic, |rule| rule.tag)
    }

    /// Tags in evaluation order, `Generic` excluded (it is the fallback, not a rule).
    pub fn precedence(&self) -> impl Iterator<Item = Tag> + '_ {
        self.rules.iter().map(|rule| rule.tag)
    }
}
