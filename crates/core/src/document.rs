//! Document layout — how fragments are wrapped into a Stan program.
//!
//! Both variants share the same three sections followed by the extra
//! fragment and a final newline:
//!
//! ```text
//! data {\n        <fragments>\n}\n
//! parameters {\n  <fragments>\n}\n
//! model {\n       <fragments>\n}\n
//! <extra>\n
//! ```
//!
//! The only difference is where the hyperparameters fragment goes: inside
//! `data` for the baseline model, inside `parameters` for the sensitivity
//! model. Adjacent fragments within a section are concatenated with no
//! separator.

use serde::{Deserialize, Serialize};
use std::io;

use crate::assembler::AssemblerOptions;
use crate::fragment::{FragmentSet, Role};

const SECTION_CLOSE: &str = "\n}\n";
const TRAILER: &str = "\n";

/// One `name { ... }` block of an assembled document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    /// Opening line, including its newline.
    pub open: &'static str,
    /// Fragments written inside the block, in order.
    pub roles: &'static [Role],
}

static BASELINE_SECTIONS: [Section; 3] = [
    Section {
        name: "data",
        open: "data {\n",
        roles: &[Role::Data, Role::Hyperparameters],
    },
    Section {
        name: "parameters",
        open: "parameters {\n",
        roles: &[Role::Parameters],
    },
    Section {
        name: "model",
        open: "model {\n",
        roles: &[Role::Model],
    },
];

static SENSITIVITY_SECTIONS: [Section; 3] = [
    Section {
        name: "data",
        open: "data {\n",
        roles: &[Role::Data],
    },
    Section {
        name: "parameters",
        open: "parameters {\n",
        roles: &[Role::Parameters, Role::Hyperparameters],
    },
    Section {
        name: "model",
        open: "model {\n",
        roles: &[Role::Model],
    },
];

/// Which of the two output models a document is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Hyperparameters are data: the model as normally fit.
    Baseline,
    /// Hyperparameters are parameters, so their sensitivity can be computed.
    Sensitivity,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Baseline, Variant::Sensitivity];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Baseline => "baseline",
            Variant::Sensitivity => "sensitivity",
        }
    }

    pub fn sections(self) -> &'static [Section] {
        match self {
            Variant::Baseline => &BASELINE_SECTIONS,
            Variant::Sensitivity => &SENSITIVITY_SECTIONS,
        }
    }

    /// The section `role` is written into; `None` for the extra fragment,
    /// which follows the last section.
    pub fn section_of(self, role: Role) -> Option<&'static Section> {
        self.sections().iter().find(|s| s.roles.contains(&role))
    }

    /// `{model}.{ext}` for the baseline, `{model}{suffix}.{ext}` for the
    /// sensitivity model.
    pub fn output_file_name(self, model_name: &str, options: &AssemblerOptions) -> String {
        let ext = &options.output_extension;
        match self {
            Variant::Baseline => format!("{model_name}.{ext}"),
            Variant::Sensitivity => {
                format!("{model_name}{}.{ext}", options.sensitivity_suffix)
            }
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// An assembled Stan program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    variant: Variant,
    text: String,
}

impl Document {
    /// Lay out `fragments` according to `variant`.
    pub fn assemble(fragments: &FragmentSet, variant: Variant) -> Self {
        let mut text = String::new();
        for section in variant.sections() {
            text.push_str(section.open);
            for role in section.roles {
                text.push_str(fragments.get(*role));
            }
            text.push_str(SECTION_CLOSE);
        }
        text.push_str(fragments.get(Role::Extra));
        text.push_str(TRAILER);

        Self { variant, text }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.text.as_bytes())?;
        writer.flush()
    }
}
