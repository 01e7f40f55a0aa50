/// User variables a root scope may hold, on top of `TRUE` and `FALSE`.
pub const DEFAULT_MAX_VARIABLES: usize = 3;
/// `IF` or `WHILE` occurrences per script that make lexing fail.
pub const DEFAULT_MAX_NESTED: usize = 3;
/// How deep parsing and evaluation may recurse before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 200;

/// Resource guards applied while lexing, parsing and evaluating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub max_variables: usize,
    pub max_nested: usize,
    pub max_depth: usize,
    pub min_result: f64,
    pub max_result: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_variables: DEFAULT_MAX_VARIABLES,
            max_nested: DEFAULT_MAX_NESTED,
            max_depth: DEFAULT_MAX_DEPTH,
            min_result: f64::from(i32::MIN),
            max_result: f64::from(i32::MAX),
        }
    }
}
