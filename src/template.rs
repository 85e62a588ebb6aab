//! Project templates: a directory store and a minijinja project generator.
//!
//! Each template is a directory under the templates root. An optional
//! `template.json` descriptor names it and declares its variables. Generation
//! mirrors the directory into an output directory, rendering every path
//! segment and every file body with the merged variables.

use std::{
    collections::BTreeMap,
    fs,
    path::{Component, Path, PathBuf},
};

use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Descriptor file name inside a template directory.
pub const DESCRIPTOR_FILE: &str = "template.json";

/// Version recorded for templates created without one.
pub const DEFAULT_TEMPLATE_VERSION: &str = "1.0.0";

/// Version shown for directories without a descriptor.
const UNKNOWN_VERSION: &str = "unknown";

/// Declaration of one template variable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// What the variable is for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when the caller gives none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Whether generation fails without a value.
    #[serde(default)]
    pub required: bool,
}

/// Contents of `template.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Template name.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Template version.
    #[serde(default = "unknown_version")]
    pub version: String,
    /// Declared variables by name.
    #[serde(default)]
    pub variables: BTreeMap<String, VariableSpec>,
}

/// Serde default for [`TemplateDescriptor::version`].
fn unknown_version() -> String {
    UNKNOWN_VERSION.to_string()
}

impl TemplateDescriptor {
    /// Descriptor for a freshly created template.
    pub(crate) fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            version: DEFAULT_TEMPLATE_VERSION.to_string(),
            variables: BTreeMap::new(),
        }
    }

    /// Record a version other than the default.
    pub(crate) fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Declare variables from `name=default` pairs and required names.
    pub(crate) fn with_variables(
        mut self,
        defaults: &BTreeMap<String, String>,
        required: &[String],
    ) -> Self {
        for (name, default) in defaults {
            self.variables.entry(name.clone()).or_default().default =
                Some(Value::String(default.clone()));
        }
        for name in required {
            self.variables.entry(name.clone()).or_default().required = true;
        }
        self
    }

    /// Stand-in for a template directory without a descriptor.
    fn implicit(dir_name: &str) -> Self {
        Self {
            name: dir_name.to_string(),
            description: format!("Template directory: {dir_name}"),
            version: UNKNOWN_VERSION.to_string(),
            variables: BTreeMap::new(),
        }
    }
}

/// A template found in the store.
#[derive(Debug, Clone)]
pub struct TemplateInfo {
    /// Parsed or implicit descriptor.
    pub descriptor: TemplateDescriptor,
    /// Template directory.
    pub directory: PathBuf,
}

/// A template directory whose descriptor could not be read.
#[derive(Debug, Clone)]
pub struct BrokenTemplate {
    /// Template directory.
    pub directory: PathBuf,
    /// Why the descriptor was rejected.
    pub reason: String,
}

/// Templates under one root directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    /// Directory holding one subdirectory per template.
    root: PathBuf,
}

impl TemplateStore {
    /// Open the store at `root`.
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// All templates sorted by name, plus directories with broken descriptors.
    pub(crate) fn list(&self) -> Result<(Vec<TemplateInfo>, Vec<BrokenTemplate>)> {
        fs::create_dir_all(&self.root).map_err(|source| Error::FileWrite {
            path: self.root.clone(),
            source,
        })?;
        let entries = fs::read_dir(&self.root).map_err(|source| Error::FileRead {
            path: self.root.clone(),
            source,
        })?;

        let mut templates = Vec::new();
        let mut broken = Vec::new();
        for entry in entries.flatten() {
            let directory = entry.path();
            if !directory.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().to_string();
            match read_descriptor(&directory) {
                Ok(Some(descriptor)) => templates.push(TemplateInfo {
                    descriptor,
                    directory,
                }),
                Ok(None) => templates.push(TemplateInfo {
                    descriptor: TemplateDescriptor::implicit(&dir_name),
                    directory,
                }),
                Err(error) => {
                    warn!(template = %dir_name, %error, "skipping template");
                    broken.push(BrokenTemplate {
                        directory,
                        reason: error.to_string(),
                    });
                }
            }
        }
        templates.sort_by(|a, b| a.descriptor.name.cmp(&b.descriptor.name));
        info!(count = templates.len(), root = %self.root.display(), "listed templates");
        Ok((templates, broken))
    }

    /// Find a template by its descriptor name.
    pub(crate) fn get(&self, name: &str) -> Result<TemplateInfo> {
        let (templates, _) = self.list()?;
        templates
            .into_iter()
            .find(|template| template.descriptor.name == name)
            .ok_or_else(|| Error::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Copy `source` into the store as a new template.
    pub(crate) fn create(
        &self,
        source: &Path,
        descriptor: TemplateDescriptor,
    ) -> Result<TemplateInfo> {
        if !source.is_dir() {
            return Err(Error::PathMissing {
                path: source.to_path_buf(),
            });
        }
        self.install(descriptor, |target| copy_tree(source, target))
    }

    /// Add a template whose files `populate` writes into the new directory.
    ///
    /// The directory is removed again when `populate` or the descriptor write
    /// fails.
    pub(crate) fn install<F>(
        &self,
        descriptor: TemplateDescriptor,
        populate: F,
    ) -> Result<TemplateInfo>
    where
        F: FnOnce(&Path) -> Result<()>,
    {
        let directory = self.root.join(&descriptor.name);
        if directory.exists() {
            return Err(Error::TemplateExists {
                name: descriptor.name,
            });
        }
        fs::create_dir_all(&directory).map_err(|source| Error::FileWrite {
            path: directory.clone(),
            source,
        })?;

        let result = populate(&directory).and_then(|()| write_descriptor(&directory, &descriptor));
        if let Err(error) = result {
            if let Err(cleanup) = fs::remove_dir_all(&directory) {
                warn!(path = %directory.display(), %cleanup, "failed to remove partial template");
            }
            return Err(error);
        }
        info!(template = %descriptor.name, "created template");
        Ok(TemplateInfo {
            descriptor,
            directory,
        })
    }

    /// Remove a template directory.
    pub(crate) fn delete(&self, name: &str) -> Result<PathBuf> {
        let template = self.get(name)?;
        fs::remove_dir_all(&template.directory).map_err(|source| Error::FileWrite {
            path: template.directory.clone(),
            source,
        })?;
        info!(template = name, "deleted template");
        Ok(template.directory)
    }

    /// Variables a template declares.
    pub(crate) fn variables(&self, name: &str) -> Result<BTreeMap<String, VariableSpec>> {
        Ok(self.get(name)?.descriptor.variables)
    }

    /// Render a template into `output`, returning the files written.
    pub(crate) fn generate(
        &self,
        name: &str,
        output: &Path,
        values: &BTreeMap<String, String>,
    ) -> Result<Vec<PathBuf>> {
        let template = self.get(name)?;
        let context = merge_variables(&template.descriptor.variables, values)?;
        let written = render_tree(&template.directory, output, &context)?;
        info!(template = name, files = written.len(), output = %output.display(), "generated project");
        Ok(written)
    }
}

/// Read `template.json` from a template directory, `None` when absent.
fn read_descriptor(directory: &Path) -> Result<Option<TemplateDescriptor>> {
    let path = directory.join(DESCRIPTOR_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path).map_err(|source| Error::FileRead {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|error| Error::TemplateDescriptor {
            path,
            message: error.to_string(),
        })
}

/// Write `template.json` into a template directory.
fn write_descriptor(directory: &Path, descriptor: &TemplateDescriptor) -> Result<()> {
    let path = directory.join(DESCRIPTOR_FILE);
    let mut contents =
        serde_json::to_string_pretty(descriptor).map_err(|error| Error::TemplateDescriptor {
            path: path.clone(),
            message: error.to_string(),
        })?;
    contents.push('\n');
    fs::write(&path, contents).map_err(|source| Error::FileWrite { path, source })
}

/// Recursively copy a directory's contents into `target`.
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|error| Error::FileRead {
            path: error.path().unwrap_or(source).to_path_buf(),
            source: error.into(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| Error::PathMissing {
                path: entry.path().to_path_buf(),
            })?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).map_err(|source| Error::FileWrite {
                path: destination.clone(),
                source,
            })?;
        } else {
            fs::copy(entry.path(), &destination).map_err(|source| Error::FileWrite {
                path: destination.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Merge declared defaults with caller values and check required variables.
pub fn merge_variables(
    declared: &BTreeMap<String, VariableSpec>,
    provided: &BTreeMap<String, String>,
) -> Result<Map<String, Value>> {
    let mut merged = Map::new();
    for (name, spec) in declared {
        if let Some(default) = &spec.default {
            merged.insert(name.clone(), default.clone());
        }
    }
    for (name, value) in provided {
        merged.insert(name.clone(), Value::String(value.clone()));
    }

    let missing: Vec<&str> = declared
        .iter()
        .filter(|(name, spec)| {
            spec.required && merged.get(name.as_str()).is_none_or(Value::is_null)
        })
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingVariables {
            names: missing.join(", "),
        });
    }
    Ok(merged)
}

/// A rendered path segment, which must stay a single normal component.
fn checked_segment<'a>(rendered: &'a str, template_path: &Path) -> Result<&'a str> {
    let mut parts = Path::new(rendered).components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(_)), None) if !rendered.contains(['/', '\\']) => Ok(rendered),
        _ => Err(Error::validation(format!(
            "{} renders to an invalid path segment '{rendered}'",
            template_path.display()
        ))),
    }
}

/// Mirror `source` into `output`, rendering names and contents.
fn render_tree(
    source: &Path,
    output: &Path,
    context: &Map<String, Value>,
) -> Result<Vec<PathBuf>> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    let render = |text: &str, label: &Path| {
        env.render_str(text, context)
            .map_err(|error| Error::TemplateRender {
                path: label.display().to_string(),
                message: error.to_string(),
            })
    };

    fs::create_dir_all(output).map_err(|source| Error::FileWrite {
        path: output.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !(entry.depth() == 1 && entry.file_name() == DESCRIPTOR_FILE));
    for entry in walker {
        let entry = entry.map_err(|error| Error::FileRead {
            path: error.path().unwrap_or(source).to_path_buf(),
            source: error.into(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| Error::PathMissing {
                path: entry.path().to_path_buf(),
            })?;

        let mut destination = output.to_path_buf();
        for segment in relative.components() {
            let segment = segment.as_os_str().to_string_lossy();
            let rendered = render(&segment, relative)?;
            destination.push(checked_segment(&rendered, relative)?);
        }

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination).map_err(|source| Error::FileWrite {
                path: destination.clone(),
                source,
            })?;
            continue;
        }
        let contents = fs::read_to_string(entry.path()).map_err(|source| Error::FileRead {
            path: entry.path().to_path_buf(),
            source,
        })?;
        let rendered = render(&contents, relative)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&destination, rendered).map_err(|source| Error::FileWrite {
            path: destination.clone(),
            source,
        })?;
        debug!(path = %destination.display(), "rendered");
        written.push(destination);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, fs, path::Path};

    use serde_json::Value;
    use tempfile::tempdir;

    use super::{
        TemplateDescriptor, TemplateStore, VariableSpec, checked_segment, merge_variables,
    };
    use crate::{
        error::Error,
        testutil::{TemplateFixture, descriptor_with_default},
    };

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn renders_file_names_and_contents() {
        let fixture = TemplateFixture::new()
            .file("greet", "{{ name }}.txt", "Hello {{ name }}");
        let output = tempdir().expect("tempdir");

        let written = fixture
            .store()
            .generate("greet", output.path(), &values(&[("name", "world")]))
            .expect("generate");

        assert_eq!(written, vec![output.path().join("world.txt")]);
        assert_eq!(
            fs::read_to_string(output.path().join("world.txt")).expect("read"),
            "Hello world"
        );
    }

    #[test]
    fn renders_nested_directories_and_skips_descriptor() {
        let fixture = TemplateFixture::new()
            .file("pkg", "src/{{ module }}/__init__.py", "# {{ module }}\n")
            .descriptor("pkg", &descriptor_with_default("pkg", "module", "core"));
        let output = tempdir().expect("tempdir");

        fixture
            .store()
            .generate("pkg", output.path(), &BTreeMap::new())
            .expect("generate");

        assert_eq!(
            fs::read_to_string(output.path().join("src/core/__init__.py")).expect("read"),
            "# core\n"
        );
        assert!(!output.path().join("template.json").exists());
    }

    #[test]
    fn missing_required_variable_is_rejected() {
        let mut declared = BTreeMap::new();
        declared.insert(
            "author".to_string(),
            VariableSpec {
                required: true,
                ..VariableSpec::default()
            },
        );
        declared.insert(
            "license".to_string(),
            VariableSpec {
                default: Some(Value::from("MIT")),
                required: true,
                ..VariableSpec::default()
            },
        );
        let error = merge_variables(&declared, &BTreeMap::new()).expect_err("missing");
        assert!(matches!(error, Error::MissingVariables { ref names } if names == "author"));

        let merged = merge_variables(&declared, &values(&[("author", "Ann")])).expect("merge");
        assert_eq!(merged["license"], "MIT");
        assert_eq!(merged["author"], "Ann");
    }

    #[test]
    fn lists_implicit_and_broken_templates() {
        let fixture = TemplateFixture::new()
            .file("plain", "README.md", "plain")
            .descriptor("broken", "{ not json");

        let (templates, broken) = fixture.store().list().expect("list");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].descriptor.description, "Template directory: plain");
        assert_eq!(templates[0].descriptor.version, "unknown");
        assert_eq!(broken.len(), 1);
    }

    #[test]
    fn create_rejects_name_collision() {
        let fixture = TemplateFixture::new().file("web", "index.html", "hi");
        let source = tempdir().expect("tempdir");
        fs::write(source.path().join("main.rs"), "fn main() {}").expect("write");

        let store = fixture.store();
        let created = store
            .create(source.path(), TemplateDescriptor::new("cli", "A CLI"))
            .expect("create");
        assert!(created.directory.join("main.rs").is_file());
        assert!(created.directory.join("template.json").is_file());
        assert_eq!(store.get("cli").expect("get").descriptor.version, "1.0.0");

        let error = store
            .create(source.path(), TemplateDescriptor::new("web", "dup"))
            .expect_err("collision");
        assert!(matches!(error, Error::TemplateExists { .. }));
    }

    #[test]
    fn failed_install_removes_partial_directory() {
        let root = tempdir().expect("tempdir");
        let store = TemplateStore::new(root.path());
        let error = store
            .install(TemplateDescriptor::new("half", ""), |dir| {
                fs::write(dir.join("a.txt"), "a").expect("write");
                Err(Error::validation("boom"))
            })
            .expect_err("fails");
        assert!(matches!(error, Error::Validation { .. }));
        assert!(!root.path().join("half").exists());
    }

    #[test]
    fn unknown_template_is_not_found() {
        let root = tempdir().expect("tempdir");
        let store = TemplateStore::new(root.path());
        let error = store.delete("ghost").expect_err("missing");
        assert!(matches!(error, Error::TemplateNotFound { .. }));
    }

    #[test]
    fn created_template_defaults_flow_into_generation() {
        let root = tempdir().expect("tempdir");
        let source = tempdir().expect("tempdir");
        fs::write(source.path().join("{{ project }}.md"), "# {{ project }} by {{ author }}")
            .expect("write");
        let store = TemplateStore::new(root.path());
        let descriptor = TemplateDescriptor::new("doc", "Docs")
            .with_version("2.1.0")
            .with_variables(&values(&[("project", "demo")]), &["author".to_string()]);
        store.create(source.path(), descriptor).expect("create");

        let stored = store.get("doc").expect("get").descriptor;
        assert_eq!(stored.version, "2.1.0");
        assert!(stored.variables["author"].required);

        let output = tempdir().expect("tempdir");
        let error = store
            .generate("doc", output.path(), &BTreeMap::new())
            .expect_err("author missing");
        assert!(matches!(error, Error::MissingVariables { ref names } if names == "author"));

        let written = store
            .generate("doc", output.path(), &values(&[("author", "Ann")]))
            .expect("generate");
        assert_eq!(written, vec![output.path().join("demo.md")]);
        assert_eq!(
            fs::read_to_string(output.path().join("demo.md")).expect("read"),
            "# demo by Ann"
        );
    }

    #[test]
    fn rendered_names_cannot_leave_the_output() {
        let fixture = TemplateFixture::new().file("greet", "{{ name }}.txt", "hi");
        let parent = tempdir().expect("tempdir");
        let output = parent.path().join("out");

        for name in ["../escape", "a/b"] {
            let error = fixture
                .store()
                .generate("greet", &output, &values(&[("name", name)]))
                .expect_err("unsafe name");
            assert!(matches!(error, Error::Validation { .. }), "{name}: {error}");
        }
        assert!(!parent.path().join("escape.txt").exists());
        assert!(!output.join("a").exists());
    }

    #[test]
    fn path_segments_must_be_single_normal_components() {
        let label = Path::new("{{ name }}");
        assert_eq!(checked_segment("main.rs", label).expect("valid"), "main.rs");
        for segment in ["", ".", "..", "/etc", "a/b"] {
            assert!(checked_segment(segment, label).is_err(), "{segment}");
        }
    }
}
