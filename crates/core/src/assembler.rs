//! Model assembler — reads a model's fragments and writes both Stan programs.
//!
//! A run is a single linear pass:
//!
//! 1. Read the required fragments, then the optional extra fragment.
//! 2. Render the baseline and sensitivity documents in memory.
//! 3. Write `{model}.stan`, then `{model}_sensitivity.stan`.
//!
//! Nothing is written until every fragment has been read, so a missing
//! fragment never leaves output behind. A failed write is not rolled back.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::document::{Document, Variant};
use crate::error::{Error, Result};
use crate::fragment::{FragmentSet, FragmentSource, FsFragmentSource, Role};

pub const DEFAULT_FRAGMENT_EXTENSION: &str = "stanblock";
pub const DEFAULT_OUTPUT_EXTENSION: &str = "stan";
pub const DEFAULT_SENSITIVITY_SUFFIX: &str = "_sensitivity";

/// File naming knobs for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblerOptions {
    /// Extension of fragment files, without the leading dot.
    pub fragment_extension: String,
    /// Extension of generated programs, without the leading dot.
    pub output_extension: String,
    /// Inserted between the model name and extension of the sensitivity output.
    pub sensitivity_suffix: String,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            fragment_extension: DEFAULT_FRAGMENT_EXTENSION.into(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.into(),
            sensitivity_suffix: DEFAULT_SENSITIVITY_SUFFIX.into(),
        }
    }
}

/// A fragment file the assembler will look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedInput {
    pub role: Role,
    pub path: PathBuf,
    pub required: bool,
}

/// A program file the assembler will write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedOutput {
    pub variant: Variant,
    pub path: PathBuf,
}

/// Every path a run touches, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyPlan {
    pub model_name: String,
    pub inputs: Vec<PlannedInput>,
    pub outputs: Vec<PlannedOutput>,
}

/// One document written by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenDocument {
    pub variant: Variant,
    pub path: PathBuf,
    pub bytes: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub model_name: String,
    pub extra_present: bool,
    pub written: Vec<WrittenDocument>,
}

/// Assembles the baseline and sensitivity programs for one model prefix.
#[derive(Debug, Clone)]
pub struct ModelAssembler {
    model_name: String,
    options: AssemblerOptions,
}

impl ModelAssembler {
    pub fn new(model_name: impl Into<String>, options: AssemblerOptions) -> Self {
        Self {
            model_name: model_name.into(),
            options,
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// The filesystem source for this model's fragments.
    pub fn source(&self) -> FsFragmentSource {
        FsFragmentSource::new(&self.model_name, &self.options.fragment_extension)
    }

    pub fn output_path(&self, variant: Variant) -> PathBuf {
        PathBuf::from(variant.output_file_name(&self.model_name, &self.options))
    }

    /// Resolve input and output paths without touching the filesystem.
    pub fn plan(&self) -> AssemblyPlan {
        let source = self.source();
        let inputs = Role::ALL
            .into_iter()
            .map(|role| PlannedInput {
                role,
                path: source.path(role),
                required: role.is_required(),
            })
            .collect();
        let outputs = Variant::ALL
            .into_iter()
            .map(|variant| PlannedOutput {
                variant,
                path: self.output_path(variant),
            })
            .collect();

        AssemblyPlan {
            model_name: self.model_name.clone(),
            inputs,
            outputs,
        }
    }

    /// Load fragments from `source` and render (baseline, sensitivity).
    pub fn render(&self, source: &dyn FragmentSource) -> Result<(Document, Document)> {
        let fragments = FragmentSet::load(source)?;
        Ok(Self::render_set(&fragments))
    }

    fn render_set(fragments: &FragmentSet) -> (Document, Document) {
        (
            Document::assemble(fragments, Variant::Baseline),
            Document::assemble(fragments, Variant::Sensitivity),
        )
    }

    /// Read this model's fragment files and write both programs.
    pub fn assemble(&self) -> Result<AssemblyReport> {
        self.assemble_from(&self.source())
    }

    /// Like [`assemble`](Self::assemble), with fragments from `source`.
    pub fn assemble_from(&self, source: &dyn FragmentSource) -> Result<AssemblyReport> {
        let fragments = FragmentSet::load(source)?;
        debug!(
            model = %self.model_name,
            extra = fragments.has_extra(),
            "All fragments loaded"
        );

        let (baseline, sensitivity) = Self::render_set(&fragments);

        let mut written = Vec::with_capacity(2);
        for document in [&baseline, &sensitivity] {
            let path = self.output_path(document.variant());
            Self::write_document(document, &path)?;
            info!(
                variant = %document.variant(),
                file = %path.display(),
                bytes = document.len(),
                "Wrote model"
            );
            written.push(WrittenDocument {
                variant: document.variant(),
                path,
                bytes: document.len(),
            });
        }

        Ok(AssemblyReport {
            model_name: self.model_name.clone(),
            extra_present: fragments.has_extra(),
            written,
        })
    }

    /// Create or truncate `path` and write the document to it.
    fn write_document(document: &Document, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        document
            .write_to(&mut writer)
            .map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::InMemoryFragmentSource;
    use std::fs;

    fn write_fragments(prefix: &str, extra: Option<&str>) {
        fs::write(Role::Data.file_name(prefix, "stanblock"), "real x;").unwrap();
        fs::write(Role::Hyperparameters.file_name(prefix, "stanblock"), "real w;").unwrap();
        fs::write(Role::Parameters.file_name(prefix, "stanblock"), "real mu;").unwrap();
        fs::write(Role::Model.file_name(prefix, "stanblock"), "mu ~ normal(0,1);").unwrap();
        if let Some(extra) = extra {
            fs::write(Role::Extra.file_name(prefix, "stanblock"), extra).unwrap();
        }
    }

    fn prefix_in(dir: &Path) -> String {
        dir.join("toy").to_str().unwrap().to_string()
    }

    #[test]
    fn default_options() {
        let options = AssemblerOptions::default();
        assert_eq!(options.fragment_extension, "stanblock");
        assert_eq!(options.output_extension, "stan");
        assert_eq!(options.sensitivity_suffix, "_sensitivity");
    }

    #[test]
    fn plan_lists_all_paths() {
        let assembler = ModelAssembler::new("models/censored", AssemblerOptions::default());
        let plan = assembler.plan();

        assert_eq!(plan.inputs.len(), 5);
        assert_eq!(plan.inputs.iter().filter(|i| i.required).count(), 4);
        assert!(plan.inputs.iter().any(|i| {
            i.role == Role::Extra && i.path == Path::new("models/censored_extra_blocks.stanblock")
        }));
        assert_eq!(
            plan.outputs
                .iter()
                .map(|o| o.path.clone())
                .collect::<Vec<_>>(),
            vec![
                PathBuf::from("models/censored.stan"),
                PathBuf::from("models/censored_sensitivity.stan"),
            ]
        );
    }

    #[test]
    fn render_from_memory() {
        let source = InMemoryFragmentSource::new()
            .with(Role::Data, "real x;")
            .with(Role::Hyperparameters, "real w;")
            .with(Role::Parameters, "real mu;")
            .with(Role::Model, "mu ~ normal(0,1);");
        let assembler = ModelAssembler::new("toy", AssemblerOptions::default());
        let (a, b) = assembler.render(&source).unwrap();
        assert_eq!(a.variant(), Variant::Baseline);
        assert_eq!(b.variant(), Variant::Sensitivity);
        assert!(a.as_str().starts_with("data {\nreal x;real w;\n}\n"));
        assert!(b.as_str().contains("parameters {\nreal mu;real w;\n}\n"));
    }

    #[test]
    fn assemble_writes_both_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = prefix_in(tmp.path());
        write_fragments(&prefix, None);

        let report = ModelAssembler::new(&prefix, AssemblerOptions::default())
            .assemble()
            .unwrap();

        assert!(!report.extra_present);
        assert_eq!(report.written.len(), 2);

        let baseline = fs::read_to_string(format!("{prefix}.stan")).unwrap();
        let sensitivity = fs::read_to_string(format!("{prefix}_sensitivity.stan")).unwrap();
        assert_eq!(
            baseline,
            "data {\nreal x;real w;\n}\nparameters {\nreal mu;\n}\nmodel {\nmu ~ normal(0,1);\n}\n\n"
        );
        assert_eq!(
            sensitivity,
            "data {\nreal x;\n}\nparameters {\nreal mu;real w;\n}\nmodel {\nmu ~ normal(0,1);\n}\n\n"
        );
        assert_eq!(report.written[0].bytes, baseline.len());
    }

    #[test]
    fn assemble_includes_extra_when_present() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = prefix_in(tmp.path());
        write_fragments(&prefix, Some("generated quantities { }"));

        let report = ModelAssembler::new(&prefix, AssemblerOptions::default())
            .assemble()
            .unwrap();

        assert!(report.extra_present);
        for written in &report.written {
            let text = fs::read_to_string(&written.path).unwrap();
            assert!(text.ends_with("}\ngenerated quantities { }\n"));
        }
    }

    #[test]
    fn extra_path_that_is_a_directory_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = prefix_in(tmp.path());
        write_fragments(&prefix, None);
        fs::create_dir(Role::Extra.file_name(&prefix, "stanblock")).unwrap();

        let report = ModelAssembler::new(&prefix, AssemblerOptions::default())
            .assemble()
            .unwrap();

        assert!(!report.extra_present);
        for written in &report.written {
            let text = fs::read_to_string(&written.path).unwrap();
            assert!(text.ends_with("mu ~ normal(0,1);\n}\n\n"));
        }
    }

    #[test]
    fn missing_fragment_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = prefix_in(tmp.path());
        write_fragments(&prefix, None);
        fs::remove_file(Role::Parameters.file_name(&prefix, "stanblock")).unwrap();

        let err = ModelAssembler::new(&prefix, AssemblerOptions::default())
            .assemble()
            .unwrap_err();

        assert!(err.is_missing_fragment());
        assert!(!Path::new(&format!("{prefix}.stan")).exists());
        assert!(!Path::new(&format!("{prefix}_sensitivity.stan")).exists());
    }

    #[test]
    fn assemble_is_idempotent_and_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = prefix_in(tmp.path());
        write_fragments(&prefix, None);
        fs::write(format!("{prefix}.stan"), "stale content that is much longer than the output").unwrap();

        let assembler = ModelAssembler::new(&prefix, AssemblerOptions::default());
        assembler.assemble().unwrap();
        let first = fs::read(format!("{prefix}.stan")).unwrap();
        assembler.assemble().unwrap();
        let second = fs::read(format!("{prefix}.stan")).unwrap();

        assert_eq!(first, second);
        assert!(!String::from_utf8(first).unwrap().contains("stale"));
    }

    #[test]
    fn unwritable_output_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = prefix_in(tmp.path());
        write_fragments(&prefix, None);
        // A directory squatting on the output path cannot be opened for writing.
        fs::create_dir(format!("{prefix}.stan")).unwrap();

        let err = ModelAssembler::new(&prefix, AssemblerOptions::default())
            .assemble()
            .unwrap_err();
        match err {
            Error::Io { path, .. } => assert_eq!(path, PathBuf::from(format!("{prefix}.stan"))),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        let prefix = prefix_in(tmp.path());
        for role in Role::ALL.into_iter().filter(|r| r.is_required()) {
            fs::write(role.file_name(&prefix, "txt"), role.as_str()).unwrap();
        }
        let options = AssemblerOptions {
            fragment_extension: "txt".into(),
            output_extension: "stanfile".into(),
            sensitivity_suffix: "_sens".into(),
        };

        let report = ModelAssembler::new(&prefix, options).assemble().unwrap();

        assert_eq!(report.written[1].path, PathBuf::from(format!("{prefix}_sens.stanfile")));
        let text = fs::read_to_string(&report.written[1].path).unwrap();
        assert!(text.contains("parameters {\nparametershyperparameters\n}\n"));
    }
}
