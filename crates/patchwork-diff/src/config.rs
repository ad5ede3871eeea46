use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{DiffError, DiffResult};

/// How an instruction whose target is absent is handled at apply time.
///
/// A target is absent when an `Update` names an index or key that is not
/// there, an `UpdateService` names an unbound tag, an `UpdateLeft` or
/// `UpdateRight` meets the other branch, or a `Slice` reaches past the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTarget {
    /// Skip the instruction.
    #[default]
    Ignore,
    /// Abort the apply with [`DiffError::MissingTarget`].
    Reject,
}

/// Configuration for patch application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Policy for instructions whose target is absent.
    pub missing_target: MissingTarget,
    /// Initial capacity reserved for the interpreter worklist.
    pub worklist_capacity: usize,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            missing_target: MissingTarget::Ignore,
            worklist_capacity: 16,
        }
    }
}

impl PatchConfig {
    /// A configuration that rejects instructions with absent targets.
    ///
    /// Patches produced by `diff` and `combine` and applied to the value
    /// they were computed against never trip this.
    pub fn strict() -> Self {
        Self {
            missing_target: MissingTarget::Reject,
            ..Default::default()
        }
    }

    /// Resolve an instruction that found nothing to act on.
    pub(crate) fn resolve_missing(
        &self,
        container: &'static str,
        instruction: &'static str,
    ) -> DiffResult<()> {
        match self.missing_target {
            MissingTarget::Ignore => {
                trace!(container, instruction, "skipping instruction with absent target");
                Ok(())
            }
            MissingTarget::Reject => {
                debug!(container, instruction, "rejecting instruction with absent target");
                Err(DiffError::MissingTarget {
                    container,
                    instruction,
                })
            }
        }
    }
}
