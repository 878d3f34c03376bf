//! Fragments — the named text blocks a model is assembled from.
//!
//! Each fragment lives in its own file next to the model prefix:
//!
//! - `{model}_data_block.{ext}`
//! - `{model}_hyperparameters_block.{ext}`
//! - `{model}_parameters_block.{ext}`
//! - `{model}_model_block.{ext}`
//! - `{model}_extra_blocks.{ext}` (optional)
//!
//! Content is opaque: it is read once and inserted verbatim.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Error, Result};

/// The role a fragment plays in an assembled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Data,
    Hyperparameters,
    Parameters,
    Model,
    /// Trailing content after the `model { }` section (e.g. generated quantities).
    Extra,
}

impl Role {
    /// Every role, in the order fragments are read.
    pub const ALL: [Role; 5] = [
        Role::Data,
        Role::Model,
        Role::Parameters,
        Role::Hyperparameters,
        Role::Extra,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Data => "data",
            Role::Hyperparameters => "hyperparameters",
            Role::Parameters => "parameters",
            Role::Model => "model",
            Role::Extra => "extra",
        }
    }

    /// Only the extra fragment may be absent.
    pub fn is_required(self) -> bool {
        !matches!(self, Role::Extra)
    }

    /// File name for this role under the given model prefix and extension.
    pub fn file_name(self, model_name: &str, extension: &str) -> String {
        let stem = match self {
            Role::Extra => "extra_blocks",
            Role::Data => "data_block",
            Role::Hyperparameters => "hyperparameters_block",
            Role::Parameters => "parameters_block",
            Role::Model => "model_block",
        };
        format!("{model_name}_{stem}.{extension}")
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Where fragments come from.
pub trait FragmentSource {
    /// Read the fragment for `role`.
    ///
    /// Returns `Ok(None)` when the fragment does not exist and `Err` for any
    /// other failure.
    fn read(&self, role: Role) -> Result<Option<String>>;

    /// Human-readable location of the fragment, used in error messages.
    fn locate(&self, role: Role) -> String;
}

/// Reads fragments from files named after a model prefix.
#[derive(Debug, Clone)]
pub struct FsFragmentSource {
    model_name: String,
    extension: String,
}

impl FsFragmentSource {
    pub fn new(model_name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            extension: extension.into(),
        }
    }

    /// Path of the fragment file for `role`.
    pub fn path(&self, role: Role) -> PathBuf {
        PathBuf::from(role.file_name(&self.model_name, &self.extension))
    }
}

impl FragmentSource for FsFragmentSource {
    fn read(&self, role: Role) -> Result<Option<String>> {
        let path = self.path(role);
        // Anything but a regular file at an optional fragment's path counts as absent.
        if !role.is_required() && !path.is_file() {
            debug!(role = %role, file = %path.display(), "Optional fragment file not present");
            return Ok(None);
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(role = %role, file = %path.display(), bytes = content.len(), "Read fragment");
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(role = %role, file = %path.display(), "Fragment file not present");
                Ok(None)
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }

    fn locate(&self, role: Role) -> String {
        self.path(role).display().to_string()
    }
}

/// Fragments held in memory, keyed by role.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFragmentSource {
    fragments: HashMap<Role, String>,
}

impl InMemoryFragmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, role: Role, content: impl Into<String>) -> Self {
        self.insert(role, content);
        self
    }

    pub fn insert(&mut self, role: Role, content: impl Into<String>) {
        self.fragments.insert(role, content.into());
    }
}

impl FragmentSource for InMemoryFragmentSource {
    fn read(&self, role: Role) -> Result<Option<String>> {
        Ok(self.fragments.get(&role).cloned())
    }

    fn locate(&self, role: Role) -> String {
        format!("<memory:{role}>")
    }
}

/// The complete set of fragments for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSet {
    pub data: String,
    pub hyperparameters: String,
    pub parameters: String,
    pub model: String,
    /// `None` when no extra fragment exists.
    pub extra: Option<String>,
}

impl FragmentSet {
    /// Read every fragment from `source`.
    ///
    /// Fails on the first required fragment that is missing. The extra
    /// fragment is read last and may be absent.
    pub fn load(source: &dyn FragmentSource) -> Result<Self> {
        let data = Self::require(source, Role::Data)?;
        let model = Self::require(source, Role::Model)?;
        let parameters = Self::require(source, Role::Parameters)?;
        let hyperparameters = Self::require(source, Role::Hyperparameters)?;
        let extra = source.read(Role::Extra)?;

        Ok(Self {
            data,
            hyperparameters,
            parameters,
            model,
            extra,
        })
    }

    fn require(source: &dyn FragmentSource, role: Role) -> Result<String> {
        source.read(role)?.ok_or_else(|| Error::MissingFragment {
            role,
            location: source.locate(role),
        })
    }

    /// Text of the fragment for `role`; an absent extra fragment is empty.
    pub fn get(&self, role: Role) -> &str {
        match role {
            Role::Data => &self.data,
            Role::Hyperparameters => &self.hyperparameters,
            Role::Parameters => &self.parameters,
            Role::Model => &self.model,
            Role::Extra => self.extra.as_deref().unwrap_or(""),
        }
    }

    pub fn has_extra(&self) -> bool {
        self.extra.is_some()
    }
}
