//! Static rejection of script sources that reference host capabilities.
//!
//! The interpreter cannot reach any of these, so a match means the file was
//! written for a different, capability-bearing runtime. Such files are
//! refused before they are parsed.

use std::sync::OnceLock;

use regex::Regex;

/// A forbidden construct found in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub pattern: String,
    pub description: &'static str,
}

// A free-standing identifier: not preceded by `.`, a word char or `$`.
const FREE: &str = r"(?:^|[^.\w$])";

const RULES: &[(&str, &str)] = &[
    (r"\beval\s*\(", "dynamic code evaluation"),
    (r"\bnew\s+Function\b", "dynamic function construction"),
    (r"\bFunction\s*\(", "dynamic function construction"),
    (r"\brequire\s*\(", "module loading"),
    (r"\bimport\s*\(", "dynamic import"),
    (r"(?m)^\s*import\s", "module import"),
    (r"\bchild_process\b", "process spawning"),
    (r"process\s*\.", "process access"),
    (r"fs\s*\.", "filesystem access"),
    (r"\bglobalThis\b", "global object access"),
    (r"global\s*\.", "global object access"),
    (r"__proto__", "prototype manipulation"),
    (r"\bconstructor\s*\[", "constructor access"),
    (r"Reflect\s*\.", "reflection"),
    (r"Deno\s*\.", "runtime API access"),
    (r"Bun\s*\.", "runtime API access"),
    (r"os\s*\.", "operating system access"),
    (r"\bstd\s*::", "host library access"),
    (r"\bsetTimeout\b", "timer scheduling"),
    (r"\bsetInterval\b", "timer scheduling"),
];

fn rules() -> &'static [(Regex, &'static str, &'static str)] {
    static COMPILED: OnceLock<Vec<(Regex, &'static str, &'static str)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .map(|(pattern, description)| {
                // Member-style patterns must start at a free identifier.
                let source = if pattern.ends_with(r"\s*\.") {
                    format!("{FREE}{pattern}")
                } else {
                    (*pattern).to_string()
                };
                let regex = Regex::new(&source).expect("valid scan pattern");
                (regex, *pattern, *description)
            })
            .collect()
    })
}

/// Returns the first forbidden construct in `source`, if any.
pub fn find_violation(source: &str) -> Option<Violation> {
    rules()
        .iter()
        .find(|(regex, _, _)| regex.is_match(source))
        .map(|(_, pattern, description)| Violation {
            pattern: (*pattern).to_string(),
            description,
        })
}
