//! Identifier naming shared by the generators.

use std::sync::LazyLock;

use regex::Regex;

static WORD_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("static regex"));
static CASE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

/// PascalCase / camelCase to snake_case, keeping acronyms together
/// (`ResolvesToAnAST` -> `resolves_to_an_ast`). Already snake_case names
/// are unchanged. Characters other than letters are kept as they are.
pub fn to_snake_case(name: &str) -> String {
    let s1 = WORD_BOUNDARY.replace_all(name, "${1}_${2}");
    CASE_BOUNDARY
        .replace_all(&s1, "${1}_${2}")
        .to_lowercase()
}
