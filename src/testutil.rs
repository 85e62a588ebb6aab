//! Test utilities for setting up template stores.
//!
//! This module provides a `TemplateFixture` builder that lays out template
//! directories in a temporary templates root.

#![allow(dead_code)]

use std::{fs, path::Path};

use tempfile::TempDir;

use crate::template::{DESCRIPTOR_FILE, TemplateStore};

/// Descriptor JSON declaring one variable with a default.
pub fn descriptor_with_default(name: &str, variable: &str, default: &str) -> String {
    format!(
        r#"{{"name": "{name}", "description": "Fixture {name}", "version": "0.1.0", "variables": {{"{variable}": {{"default": "{default}"}}}}}}"#
    )
}

/// Temporary templates root with a fluent builder for its contents.
pub struct TemplateFixture {
    /// Root temp directory holding one subdirectory per template.
    root: TempDir,
}

impl TemplateFixture {
    /// Create an empty templates root.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create temp dir");
        Self { root }
    }

    /// Add a file (creating parent directories) inside a template.
    pub fn file(self, template: &str, relative: &str, contents: &str) -> Self {
        let path = self.root.path().join(template).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create template dir");
        }
        fs::write(&path, contents).expect("write template file");
        self
    }

    /// Write a raw `template.json` for a template.
    pub fn descriptor(self, template: &str, json: &str) -> Self {
        let dir = self.root.path().join(template);
        fs::create_dir_all(&dir).expect("create template dir");
        fs::write(dir.join(DESCRIPTOR_FILE), json).expect("write descriptor");
        self
    }

    /// Templates root path.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Store opened on the fixture root.
    pub fn store(&self) -> TemplateStore {
        TemplateStore::new(self.root.path())
    }
}
