//! Page template registry.
//!
//! The registry maps a page identifier (`home.tmpl`) to a compiled template
//! set. Each set is its own [`minijinja::Environment`] holding the root layout
//! under [`ROOT_TEMPLATE`], every partial under its relative path and the page
//! itself under its identifier. Pages extend the root layout:
//!
//! ```html
//! {% extends "base" %}
//! {% block title %}Home{% endblock %}
//! {% block main %}...{% endblock %}
//! ```
//!
//! The registry is built once at startup and is read-only afterwards, so any
//! number of request tasks can look pages up concurrently without locking.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use rust_embed::{Embed, RustEmbed};
use serde::Serialize;
use thiserror::Error;

use super::helpers;
use crate::config::TemplateConfig;

/// Name under which the root layout is registered in every template set.
pub const ROOT_TEMPLATE: &str = "base";

/// File name of the root layout inside a template directory.
const ROOT_FILE: &str = "base.tmpl";
const PARTIALS_DIR: &str = "partials";
const PAGES_DIR: &str = "pages";
const TEMPLATE_EXT: &str = "tmpl";

/// Page templates compiled into the binary.
///
/// Used when the configured template directory does not exist and
/// `templates.embedded_fallback` is enabled.
#[derive(Embed)]
#[folder = "ui/html/"]
pub struct EmbeddedPages;

/// Failure to build the registry. Always fatal to startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No root layout was supplied.
    #[error("root layout `{0}` is missing")]
    MissingRoot(String),

    /// The configured template directory does not exist.
    #[error("template directory {} does not exist", .0.display())]
    MissingDir(PathBuf),

    /// A template file could not be read.
    #[error("failed to read template {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An embedded template is not valid UTF-8.
    #[error("template {0} is not valid UTF-8")]
    Encoding(String),

    /// Two pages share an identifier.
    #[error("page {0} is defined more than once")]
    DuplicatePage(String),

    /// A template failed to compile.
    #[error("failed to compile template {name} for page {page}: {source}")]
    Compile {
        /// Page whose set was being built.
        page: String,
        /// Template within the set that failed.
        name: String,
        /// Compiler error.
        #[source]
        source: minijinja::Error,
    },
}

/// A compiled, immutable template set for one page.
pub struct PageTemplate {
    id: String,
    env: Environment<'static>,
}

impl PageTemplate {
    /// Page identifier, e.g. `home.tmpl`.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Execute the page against `data` into a fresh buffer.
    ///
    /// Nothing is written anywhere else; on error the partially filled buffer
    /// is dropped.
    pub fn execute<S: Serialize>(&self, data: &S) -> Result<Vec<u8>, minijinja::Error> {
        let template = self.env.get_template(&self.id)?;
        Ok(template.render(data)?.into_bytes())
    }
}

impl fmt::Debug for PageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageTemplate").field("id", &self.id).finish()
    }
}

/// Read-only mapping from page identifier to compiled template set.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    pages: BTreeMap<String, PageTemplate>,
}

impl TemplateRegistry {
    /// Start building a registry from in-memory sources.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Build the registry the configuration asks for.
    ///
    /// Reads from `config.dir`; when that directory is missing and
    /// `config.embedded_fallback` is set, the pages compiled into the binary
    /// are used instead.
    pub fn load(config: &TemplateConfig) -> Result<Self, RegistryError> {
        if config.dir.is_dir() {
            return Self::from_dir(&config.dir);
        }

        if config.embedded_fallback {
            tracing::warn!(
                "Template directory {} not found, using embedded pages",
                config.dir.display()
            );
            return Self::from_embedded::<EmbeddedPages>();
        }

        Err(RegistryError::MissingDir(config.dir.clone()))
    }

    /// Build from a directory laid out as `base.tmpl`, `partials/*.tmpl` and
    /// `pages/*.tmpl`.
    pub fn from_dir(dir: &Path) -> Result<Self, RegistryError> {
        if !dir.is_dir() {
            return Err(RegistryError::MissingDir(dir.to_path_buf()));
        }

        let mut builder = RegistryBuilder::default();

        let root_path = dir.join(ROOT_FILE);
        if root_path.is_file() {
            builder = builder.root(read_source(&root_path)?);
        }

        for path in template_files(&dir.join(PARTIALS_DIR))? {
            let name = format!("{PARTIALS_DIR}/{}", file_name(&path));
            builder = builder.partial(name, read_source(&path)?);
        }

        for path in template_files(&dir.join(PAGES_DIR))? {
            builder = builder.page(file_name(&path), read_source(&path)?);
        }

        let registry = builder.build()?;
        tracing::info!(
            "Loaded {} page templates from {}",
            registry.len(),
            dir.display()
        );
        Ok(registry)
    }

    /// Build from an embedded asset bundle using the same layout as
    /// [`from_dir`](Self::from_dir).
    pub fn from_embedded<E: RustEmbed>() -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::default();

        for path in E::iter() {
            let Some(file) = E::get(&path) else {
                continue;
            };
            let source = String::from_utf8(file.data.into_owned())
                .map_err(|_| RegistryError::Encoding(path.to_string()))?;

            if path == ROOT_FILE {
                builder = builder.root(source);
            } else if let Some(name) = path.strip_prefix(&format!("{PAGES_DIR}/")) {
                builder = builder.page(name, source);
            } else if path.starts_with(&format!("{PARTIALS_DIR}/")) {
                builder = builder.partial(path.to_string(), source);
            } else {
                tracing::debug!("Ignoring embedded file {}", path);
            }
        }

        builder.build()
    }

    /// Look up a page. Never mutates the registry.
    #[must_use]
    pub fn lookup(&self, page: &str) -> Option<&PageTemplate> {
        self.pages.get(page)
    }

    /// Whether a page is registered.
    #[must_use]
    pub fn contains(&self, page: &str) -> bool {
        self.pages.contains_key(page)
    }

    /// Registered page identifiers, sorted.
    pub fn page_ids(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Number of registered pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the registry has no pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Collects template sources and compiles them into a [`TemplateRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    root: Option<String>,
    partials: Vec<(String, String)>,
    pages: Vec<(String, String)>,
}

impl RegistryBuilder {
    /// Set the root layout source.
    #[must_use]
    pub fn root(mut self, source: impl Into<String>) -> Self {
        self.root = Some(source.into());
        self
    }

    /// Add a partial, shared by every page set.
    #[must_use]
    pub fn partial(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.partials.push((name.into(), source.into()));
        self
    }

    /// Add a page.
    #[must_use]
    pub fn page(mut self, id: impl Into<String>, source: impl Into<String>) -> Self {
        self.pages.push((id.into(), source.into()));
        self
    }

    /// Compile every page set. Any failure aborts the whole build.
    pub fn build(self) -> Result<TemplateRegistry, RegistryError> {
        let root = self
            .root
            .ok_or_else(|| RegistryError::MissingRoot(ROOT_TEMPLATE.to_string()))?;

        let mut pages = BTreeMap::new();
        for (id, source) in self.pages {
            if pages.contains_key(&id) {
                return Err(RegistryError::DuplicatePage(id));
            }

            let env = compile_set(&id, &root, &self.partials, source)?;
            tracing::debug!("Compiled page template {}", id);
            pages.insert(id.clone(), PageTemplate { id, env });
        }

        if pages.is_empty() {
            tracing::warn!("Template registry contains no pages");
        }

        Ok(TemplateRegistry { pages })
    }
}

fn compile_set(
    id: &str,
    root: &str,
    partials: &[(String, String)],
    source: String,
) -> Result<Environment<'static>, RegistryError> {
    let compile_err = |name: &str| {
        let page = id.to_string();
        let name = name.to_string();
        move |source| RegistryError::Compile { page, name, source }
    };

    let mut env = new_environment();
    env.add_template_owned(ROOT_TEMPLATE, root.to_string())
        .map_err(compile_err(ROOT_TEMPLATE))?;
    for (name, partial) in partials {
        env.add_template_owned(name.clone(), partial.clone())
            .map_err(compile_err(name))?;
    }
    env.add_template_owned(id.to_string(), source)
        .map_err(compile_err(id))?;

    Ok(env)
}

fn new_environment() -> Environment<'static> {
    let mut env = Environment::new();
    // `.tmpl` is not an extension minijinja escapes by default.
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    helpers::register(&mut env);
    env
}

fn template_files(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| RegistryError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| RegistryError::Read {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == TEMPLATE_EXT) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_source(path: &Path) -> Result<String, RegistryError> {
    fs::read_to_string(path).map_err(|source| RegistryError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ROOT: &str =
        "<title>{% block title %}{% endblock %}</title>{% include \"partials/nav.tmpl\" %}<main>{% block main %}{% endblock %}</main>";
    const NAV: &str = "<nav>{% if is_authenticated %}Logout{% else %}Login{% endif %}</nav>";

    fn builder() -> RegistryBuilder {
        TemplateRegistry::builder().root(ROOT).partial("partials/nav.tmpl", NAV)
    }

    #[test]
    fn test_build_and_execute() {
        let registry = builder()
            .page(
                "home.tmpl",
                "{% extends \"base\" %}{% block title %}Home{% endblock %}{% block main %}Hi {{ name }}{% endblock %}",
            )
            .build()
            .unwrap();

        let page = registry.lookup("home.tmpl").unwrap();
        assert_eq!(page.id(), "home.tmpl");

        let out = page
            .execute(&json!({"name": "Ada", "is_authenticated": false}))
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<title>Home</title><nav>Login</nav><main>Hi Ada</main>"
        );
    }

    #[test]
    fn test_lookup_miss() {
        let registry = builder().build().unwrap();
        assert!(registry.lookup("missing.tmpl").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let err = TemplateRegistry::builder()
            .page("home.tmpl", "{% extends \"base\" %}")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingRoot(_)));
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let err = builder()
            .page("ok.tmpl", "{% extends \"base\" %}")
            .page("broken.tmpl", "{% extends \"base\" %}{% block main %}{{ oops {% endblock %}")
            .build()
            .unwrap_err();

        match err {
            RegistryError::Compile { page, name, .. } => {
                assert_eq!(page, "broken.tmpl");
                assert_eq!(name, "broken.tmpl");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_page_is_fatal() {
        let err = builder()
            .page("home.tmpl", "{% extends \"base\" %}")
            .page("home.tmpl", "{% extends \"base\" %}")
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePage(id) if id == "home.tmpl"));
    }

    #[test]
    fn test_output_is_html_escaped() {
        let registry = builder()
            .page("home.tmpl", "{% extends \"base\" %}{% block main %}{{ name }}{% endblock %}")
            .build()
            .unwrap();

        let out = registry
            .lookup("home.tmpl")
            .unwrap()
            .execute(&json!({"name": "<script>", "is_authenticated": true}))
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("&lt;script&gt;"));
        assert!(out.contains("<nav>Logout</nav>"));
    }

    #[test]
    fn test_undefined_variable_fails_execution() {
        let registry = builder()
            .page("home.tmpl", "{% extends \"base\" %}{% block main %}{{ nope }}{% endblock %}")
            .build()
            .unwrap();

        let result = registry
            .lookup("home.tmpl")
            .unwrap()
            .execute(&json!({"is_authenticated": false}));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("partials")).unwrap();
        fs::create_dir_all(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("base.tmpl"), ROOT).unwrap();
        fs::write(dir.path().join("partials/nav.tmpl"), NAV).unwrap();
        fs::write(
            dir.path().join("pages/home.tmpl"),
            "{% extends \"base\" %}{% block main %}home{% endblock %}",
        )
        .unwrap();
        fs::write(
            dir.path().join("pages/about.tmpl"),
            "{% extends \"base\" %}{% block main %}about{% endblock %}",
        )
        .unwrap();
        fs::write(dir.path().join("pages/notes.txt"), "not a template").unwrap();

        let registry = TemplateRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(
            registry.page_ids().collect::<Vec<_>>(),
            vec!["about.tmpl", "home.tmpl"]
        );
    }

    #[test]
    fn test_from_dir_missing() {
        let err = TemplateRegistry::from_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, RegistryError::MissingDir(_)));
    }

    #[test]
    fn test_load_embedded_fallback() {
        let config = TemplateConfig {
            dir: PathBuf::from("/definitely/not/here"),
            embedded_fallback: true,
        };
        let registry = TemplateRegistry::load(&config).unwrap();
        assert!(registry.contains("home.tmpl"));
        assert!(registry.contains("create.tmpl"));
    }

    #[test]
    fn test_load_without_fallback_fails() {
        let config = TemplateConfig {
            dir: PathBuf::from("/definitely/not/here"),
            embedded_fallback: false,
        };
        assert!(matches!(
            TemplateRegistry::load(&config),
            Err(RegistryError::MissingDir(_))
        ));
    }
}
