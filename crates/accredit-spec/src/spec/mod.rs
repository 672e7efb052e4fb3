pub mod step;
pub mod wizard;

pub use step::{AreaRef, FieldKind, FieldSpec, OptionChoice, StepSpec};
pub use wizard::{SpecError, WizardSpec};
