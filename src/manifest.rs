//! Typed package manifest builder and serializer.
//!
//! The manifest is an ordered list of member names sharing one component
//! type, serialized to the platform's `package.xml` descriptor. Serialization
//! preserves the exact on-disk shape the platform expects, so validation
//! happens up front instead of escaping at write time.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::DeployError;

pub const DEFAULT_API_VERSION: &str = "45.0";
const DESCRIPTOR_FILE_NAME: &str = "package.xml";

/// Ordered set of component members of a single type, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    component_type: String,
    members: Vec<String>,
    api_version: String,
}

/// Accumulates members for one manifest. Members keep insertion order;
/// duplicates are dropped.
#[derive(Debug)]
pub struct ManifestBuilder {
    component_type: String,
    members: Vec<String>,
    api_version: String,
}

impl PackageManifest {
    pub fn builder(component_type: impl Into<String>) -> ManifestBuilder {
        ManifestBuilder {
            component_type: component_type.into(),
            members: Vec::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Renders the descriptor in the platform's exact on-disk shape.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push_str("\n<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">");
        xml.push_str("\n<types>");
        for member in &self.members {
            xml.push_str(&format!("\n<members>{member}</members>"));
        }
        xml.push_str(&format!("\n<name>{}</name>", self.component_type));
        xml.push_str("\n</types>");
        xml.push_str(&format!("\n<version>{}</version>", self.api_version));
        xml.push_str("\n</Package>");
        xml
    }

    /// Writes `package.xml` into the given directory, creating it if needed.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, DeployError> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(DESCRIPTOR_FILE_NAME);
        fs::write(&path, self.to_xml()).await?;
        Ok(path)
    }
}

impl ManifestBuilder {
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn member(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.members.contains(&name) {
            self.members.push(name);
        }
        self
    }

    pub fn members<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.member(name);
        }
        self
    }

    /// Validates and produces the immutable manifest.
    pub fn build(self) -> Result<PackageManifest, DeployError> {
        if self.component_type.trim().is_empty() {
            return Err(DeployError::Manifest(
                "component type must not be empty".to_string(),
            ));
        }
        if self.members.is_empty() {
            return Err(DeployError::Manifest(format!(
                "manifest for type '{}' has no members",
                self.component_type
            )));
        }
        for name in [&self.component_type, &self.api_version] {
            validate_text(name)?;
        }
        for member in &self.members {
            if member.trim().is_empty() {
                return Err(DeployError::Manifest(
                    "member names must not be empty".to_string(),
                ));
            }
            validate_text(member)?;
        }

        Ok(PackageManifest {
            component_type: self.component_type,
            members: self.members,
            api_version: self.api_version,
        })
    }
}

// The serializer emits names verbatim, so anything needing XML escaping is
// rejected rather than silently rewritten.
fn validate_text(value: &str) -> Result<(), DeployError> {
    if value.contains(['<', '>', '&']) {
        return Err(DeployError::Manifest(format!(
            "'{value}' contains characters not allowed in a package descriptor"
        )));
    }
    Ok(())
}
