//! Name resolution against the data store.
//!
//! A tag name is relative to the sections around it. Resolution tries the
//! full enclosing path first and then shorter and shorter prefixes, so an
//! inner name shadows an outer one.

use thiserror::Error;

use crate::store::{DataStore, PathStep, ResolvedPath};
use crate::value::Value;

/// Suffix that turns a missing name into the text of its own path.
pub const PATH_SUFFIX: &str = "_path";

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// The path exists in the store.
    Found {
        path: ResolvedPath,
        value: &'a Value,
    },
    /// The name ended in `_path` and the path without the suffix is
    /// missing; the path itself stands in as a string.
    PathLiteral(ResolvedPath),
}

impl Resolution<'_> {
    pub fn path(&self) -> &ResolvedPath {
        match self {
            Resolution::Found { path, .. } | Resolution::PathLiteral(path) => path,
        }
    }

    /// Section repeat count for this resolution.
    pub fn iteration_count(&self) -> usize {
        match self {
            Resolution::Found { value, .. } => value.iteration_count(),
            Resolution::PathLiteral(path) => {
                Value::Scalar(path.to_string()).iteration_count()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("'{name}' not found under '{scope}'")]
    NotFound { name: String, scope: String },
}

/// Resolve `name` as seen from inside the sections at `scope`.
///
/// Candidates keep the iteration indices of `scope`, so inside
/// `{{#hosts}}` a name is looked up in the current element rather than in
/// the first element of the list.
pub fn resolve<'a>(
    store: &'a DataStore,
    scope: &ResolvedPath,
    name: &str,
) -> Result<Resolution<'a>, ResolveError> {
    let local = ResolvedPath::parse(name);

    let mut prefix = scope.steps().len();
    loop {
        let candidate = scope.prefix_join(prefix, local.steps());
        if let Some(value) = store.get(candidate.steps()) {
            return Ok(Resolution::Found {
                path: candidate,
                value,
            });
        }
        if prefix == 0 {
            break;
        }
        prefix = scope.parent_len(prefix);
    }

    if let Some((PathStep::Key(last), rest)) = local.steps().split_last() {
        if let Some(stripped) = last.strip_suffix(PATH_SUFFIX) {
            let mut tail = rest.to_vec();
            if !stripped.is_empty() {
                tail.push(PathStep::Key(stripped.to_string()));
            }
            let path = scope.prefix_join(scope.steps().len(), &tail);
            tracing::trace!(name, %path, "using path text for missing name");
            return Ok(Resolution::PathLiteral(path));
        }
    }

    Err(ResolveError::NotFound {
        name: name.to_string(),
        scope: scope.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> DataStore {
        DataStore::from_json(json!({
            "c": "root-c",
            "a": {
                "c": "a-c",
                "b": {"c": "a-b-c"}
            },
            "host": {"name": "esp1"},
            "hosts": [
                {"name": "first", "ip": "10.0.0.1"},
                {"name": "second"}
            ]
        }))
        .unwrap()
    }

    fn found(store: &DataStore, scope: &str, name: &str) -> String {
        match resolve(store, &ResolvedPath::parse(scope), name).unwrap() {
            Resolution::Found { path, .. } => path.to_string(),
            other => panic!("expected found, got {other:?}"),
        }
    }

    #[test]
    fn test_prefers_longest_prefix() {
        let store = store();
        assert_eq!(found(&store, "a.b", "c"), "a.b.c");
        assert_eq!(found(&store, "a", "c"), "a.c");
        assert_eq!(found(&store, "", "c"), "c");
        assert_eq!(found(&store, "a.x", "c"), "a.c");
    }

    #[test]
    fn test_dotted_local_name() {
        assert_eq!(found(&store(), "a", "b.c"), "a.b.c");
        assert_eq!(found(&store(), "hosts.0", "host.name"), "host.name");
    }

    #[test]
    fn test_index_threads_into_lists() {
        let store = store();
        let scope = ResolvedPath::parse("hosts.1");
        let resolution = resolve(&store, &scope, "name").unwrap();
        assert_eq!(resolution.path().to_string(), "hosts.1.name");
        assert!(matches!(resolution, Resolution::Found { value, .. } if value.as_scalar() == Some("second")));
    }

    #[test]
    fn test_missing_in_element_does_not_borrow_first_element() {
        // hosts.1 has no ip; falling back to "hosts.ip" would read hosts.0
        let store = store();
        let result = resolve(&store, &ResolvedPath::parse("hosts.1"), "ip");
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    }

    #[test]
    fn test_numeric_segment_indexes_list() {
        assert_eq!(found(&store(), "", "hosts.1.name"), "hosts.1.name");
    }

    #[test]
    fn test_dot_is_current_context() {
        let store = store();
        assert_eq!(found(&store, "hosts.0", "."), "hosts.0");
        assert_eq!(found(&store, "", "."), "");
    }

    #[test]
    fn test_path_suffix_fallback() {
        let store = store();
        let resolution = resolve(&store, &ResolvedPath::root(), "host.ip_path").unwrap();
        assert_eq!(resolution, Resolution::PathLiteral(ResolvedPath::parse("host.ip")));
        assert_eq!(resolution.path().to_string(), "host.ip");

        let nested = resolve(&store, &ResolvedPath::parse("hosts.1"), "ip_path").unwrap();
        assert_eq!(nested.path().to_string(), "hosts.1.ip");
    }

    #[test]
    fn test_existing_path_suffix_key_wins() {
        let store = DataStore::from_json(json!({"ip_path": "set"})).unwrap();
        assert_eq!(found(&store, "", "ip_path"), "ip_path");
    }

    #[test]
    fn test_not_found() {
        let err = resolve(&store(), &ResolvedPath::parse("a"), "missing").unwrap_err();
        assert_eq!(err.to_string(), "'missing' not found under 'a'");
    }
}
