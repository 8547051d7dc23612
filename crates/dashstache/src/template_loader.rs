//! Template loading and the parsed-template cache.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashstache_ast::{ParseOptions, Template};

use crate::error::{DashstacheError, Result};

/// File extension of templates found by [`DirectorySource::list`].
pub const TEMPLATE_EXTENSION: &str = "mustache";

/// Where raw template text comes from.
pub trait TemplateSource {
    /// Raw text of the template called `name`.
    fn load(&self, name: &str) -> Result<String>;

    /// Names of all templates this source can load.
    fn list(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

impl TemplateSource for HashMap<String, String> {
    fn load(&self, name: &str) -> Result<String> {
        self.get(name).cloned().ok_or_else(|| DashstacheError::Template {
            message: format!("Template not found: {name}"),
        })
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Templates stored as files under one root directory.
///
/// Names are relative paths with `/` separators (`status.mustache`,
/// `rooms/kitchen.mustache`).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref();
        let root = path.canonicalize().map_err(|e| DashstacheError::Template {
            message: format!("Invalid template root {}: {e}", path.display()),
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        validate_template_name(name)?;
        let path = name
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment));

        if !path.is_file() {
            return Err(DashstacheError::Template {
                message: format!("Template file not found: {name} ({})", path.display()),
            });
        }
        self.ensure_within_root(&path)?;
        Ok(path)
    }

    /// Symlinks may still point outside the root after name validation.
    fn ensure_within_root(&self, path: &Path) -> Result<()> {
        let resolved = path.canonicalize()?;
        if resolved.starts_with(&self.root) {
            return Ok(());
        }
        Err(DashstacheError::Template {
            message: format!("Path traversal detected: {}", path.display()),
        })
    }

    fn collect(&self, dir: &Path, names: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect(&path, names)?;
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            let name: Vec<&str> = relative
                .components()
                .filter_map(|c| c.as_os_str().to_str())
                .collect();
            names.push(name.join("/"));
        }
        Ok(())
    }
}

impl TemplateSource for DirectorySource {
    fn load(&self, name: &str) -> Result<String> {
        let path = self.resolve(name)?;
        tracing::debug!(name, path = %path.display(), "loading template");
        Ok(fs::read_to_string(path)?)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.collect(&self.root, &mut names)?;
        names.sort();
        Ok(names)
    }
}

fn validate_template_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('/') {
        return Err(DashstacheError::Template {
            message: format!("Template name must be a relative path: {name:?}"),
        });
    }
    if name.contains("..") || name.contains('\\') || name.contains(':') {
        return Err(DashstacheError::Template {
            message: format!("Invalid template name (path traversal): {name}"),
        });
    }
    Ok(())
}

struct CacheEntry {
    raw: String,
    template: Arc<Template>,
}

/// Parsed templates keyed by name.
///
/// The tag tree for a name is rebuilt only when its raw text changes, so
/// repeated loads of an unchanged file hand out the same `Arc`.
pub struct TemplateCache<S> {
    source: S,
    parse_options: ParseOptions,
    entries: HashMap<String, CacheEntry>,
}

impl<S: TemplateSource> TemplateCache<S> {
    pub fn new(source: S) -> Self {
        Self::with_parse_options(source, ParseOptions::default())
    }

    pub fn with_parse_options(source: S, parse_options: ParseOptions) -> Self {
        Self {
            source,
            parse_options,
            entries: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load `name` from the source and return its parsed template.
    pub fn get(&mut self, name: &str) -> Result<Arc<Template>> {
        let raw = self.source.load(name)?;
        self.insert_raw(name, raw)
    }

    /// Cache `raw` under `name`, parsing it unless it matches what is
    /// already cached.
    pub fn insert_raw(&mut self, name: &str, raw: String) -> Result<Arc<Template>> {
        if let Some(entry) = self.entries.get(name) {
            if entry.raw == raw {
                tracing::debug!(name, "template cache hit");
                return Ok(Arc::clone(&entry.template));
            }
        }

        let template = Arc::new(Template::parse_with_options(raw.as_str(), self.parse_options)?);
        tracing::debug!(name, tags = template.tree().len() - 1, "parsed template");
        self.entries.insert(
            name.to_string(),
            CacheEntry {
                raw,
                template: Arc::clone(&template),
            },
        );
        Ok(template)
    }

    /// Load every template the source lists.
    pub fn load_all(&mut self) -> Result<Vec<(String, Arc<Template>)>> {
        self.source
            .list()?
            .into_iter()
            .map(|name| {
                let template = self.get(&name)?;
                Ok((name, template))
            })
            .collect()
    }

    /// The cached template for `name`, without touching the source.
    pub fn cached(&self, name: &str) -> Option<Arc<Template>> {
        self.entries.get(name).map(|entry| Arc::clone(&entry.template))
    }

    pub fn invalidate(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, text: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_template_name("status.mustache").is_ok());
        assert!(validate_template_name("rooms/kitchen.mustache").is_ok());
        assert!(validate_template_name("").is_err());
        assert!(validate_template_name("/etc/passwd").is_err());
        assert!(validate_template_name("../secret.mustache").is_err());
        assert!(validate_template_name("rooms\\kitchen").is_err());
        assert!(validate_template_name("c:status").is_err());
    }

    #[test]
    fn test_directory_source_load_and_list() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "status.mustache", "{{name}}");
        write(dir.path(), "rooms/kitchen.mustache", "{{temp}}");
        write(dir.path(), "notes.txt", "ignored");

        let source = DirectorySource::new(dir.path()).unwrap();
        assert_eq!(source.load("status.mustache").unwrap(), "{{name}}");
        assert_eq!(
            source.list().unwrap(),
            vec!["rooms/kitchen.mustache", "status.mustache"]
        );
        assert!(matches!(
            source.load("missing.mustache"),
            Err(DashstacheError::Template { .. })
        ));
    }

    #[test]
    fn test_directory_source_rejects_missing_root() {
        let result = DirectorySource::new("/nonexistent/dashstache/templates");
        assert!(matches!(result, Err(DashstacheError::Template { .. })));
    }

    #[test]
    fn test_cache_reuses_unchanged_template() {
        let mut source = HashMap::new();
        source.insert("a".to_string(), "{{x}}".to_string());
        let mut cache = TemplateCache::new(source);

        let first = cache.get("a").unwrap();
        let second = cache.get("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_rebuilds_on_change() {
        let mut cache = TemplateCache::new(HashMap::<String, String>::new());
        let first = cache.insert_raw("a", "{{x}}".to_string()).unwrap();
        let second = cache.insert_raw("a", "{{y}}".to_string()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.cached("a").unwrap().source(), "{{y}}");
    }

    #[test]
    fn test_cache_invalidate() {
        let mut cache = TemplateCache::new(HashMap::<String, String>::new());
        cache.insert_raw("a", "x".to_string()).unwrap();
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert!(cache.cached("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_strict_parse_error() {
        let options = ParseOptions { strict: true };
        let mut cache = TemplateCache::with_parse_options(HashMap::<String, String>::new(), options);
        let result = cache.insert_raw("a", "{{#open}}never closed".to_string());
        assert!(matches!(result, Err(DashstacheError::Parse(_))));
        assert!(cache.cached("a").is_none());
    }

    #[test]
    fn test_load_all_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.mustache", "A");
        write(dir.path(), "b.mustache", "B");

        let mut cache = TemplateCache::new(DirectorySource::new(dir.path()).unwrap());
        let loaded = cache.load_all().unwrap();
        let names: Vec<&str> = loaded.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["a.mustache", "b.mustache"]);
        assert_eq!(loaded[1].1.source(), "B");
    }
}
