use std::collections::HashMap;
use std::sync::Mutex;
use lazy_static::lazy_static;
use regex::Regex;

use crate::function::FunctionId;

lazy_static! {
    static ref RETURN_STATEMENT: Regex = Regex::new(r"(^| |:)return($| |\()")
        .expect("return statement pattern is valid");

    // key: function id, value: has return statement?
    static ref HAS_RETURN_STATEMENT: Mutex<HashMap<FunctionId, bool>> = Mutex::new(HashMap::new());
}

/// Textual check for a `return` statement in `source`, one line at a time.
///
/// This is a pattern match, not a parse: a `return` inside a string literal
/// or a comment counts too.
pub fn scan_source(source: &str) -> bool {
    source.lines().any(|line| RETURN_STATEMENT.is_match(line))
}

/// [scan_source], computed once per function and cached.
pub fn has_return_statement(id: FunctionId, source: &str) -> bool {
    let mut cache = match HAS_RETURN_STATEMENT.lock() {
        Ok(cache) => cache,
        Err(poisoned) => poisoned.into_inner(),
    };

    *cache.entry(id).or_insert_with(|| scan_source(source))
}

pub fn cached(id: FunctionId) -> Option<bool> {
    match HAS_RETURN_STATEMENT.lock() {
        Ok(cache) => cache.get(&id).copied(),
        Err(poisoned) => poisoned.into_inner().get(&id).copied(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn finds_return_statements() {
        assert!(scan_source("def f():\n    return 1"));
        assert!(scan_source("def f(): return"));
        assert!(scan_source("if x:return(1)"));
        assert!(!scan_source("def f():\n    pass"));
        assert!(!scan_source("def f():\n    x = returned"));
    }

    #[test]
    fn word_in_a_comment_still_counts() {
        assert!(scan_source("def f():\n    # we never return anything\n    pass"));
    }

    #[test]
    fn result_is_cached_per_function() {
        let id = FunctionId::next();

        assert_eq!(cached(id), None);
        assert!(has_return_statement(id, "    return 1"));
        // cached value wins over new source text
        assert!(has_return_statement(id, "    pass"));
        assert_eq!(cached(id), Some(true));
    }
}
