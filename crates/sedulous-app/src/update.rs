//! Update stages and update-function registration types.

use std::fmt;

use sedulous_core::Time;
use serde::{Deserialize, Serialize};

use crate::context::Context;

/// A phase of a frame.
///
/// Within one `Context::update` the stages always run as
/// pre → fixed (zero or more passes) → variable → post.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStage {
    /// Runs once per frame before everything else.
    PreUpdate,
    /// Runs once per accumulated fixed step, with a constant elapsed time.
    FixedUpdate,
    /// Runs once per frame with the real frame delta.
    #[default]
    VariableUpdate,
    /// Runs once per frame after everything else.
    PostUpdate,
}

impl UpdateStage {
    /// All stages, in execution order.
    pub const ALL: [Self; 4] = [
        Self::PreUpdate,
        Self::FixedUpdate,
        Self::VariableUpdate,
        Self::PostUpdate,
    ];

    pub(crate) const COUNT: usize = Self::ALL.len();

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreUpdate => "pre_update",
            Self::FixedUpdate => "fixed_update",
            Self::VariableUpdate => "variable_update",
            Self::PostUpdate => "post_update",
        }
    }
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an update function receives on each invocation.
pub struct ContextUpdateInfo<'a> {
    /// The context running the update. Registration changes made through it
    /// are applied at the start of the next `Context::update`.
    pub context: &'a Context,
    /// Elapsed and total time of the stage being dispatched.
    pub time: Time,
}

/// A callback run by the context during one stage of a frame.
pub type UpdateFunction = Box<dyn FnMut(&ContextUpdateInfo<'_>)>;

/// A request to register an update function.
///
/// Defaults to priority 0 in [`UpdateStage::VariableUpdate`]. Higher
/// priorities run first; equal priorities run in registration order.
pub struct ContextUpdateFunctionInfo {
    pub priority: i32,
    pub stage: UpdateStage,
    pub function: UpdateFunction,
}

impl ContextUpdateFunctionInfo {
    pub fn new(function: impl FnMut(&ContextUpdateInfo<'_>) + 'static) -> Self {
        Self {
            priority: 0,
            stage: UpdateStage::default(),
            function: Box::new(function),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_stage(mut self, stage: UpdateStage) -> Self {
        self.stage = stage;
        self
    }
}

impl fmt::Debug for ContextUpdateFunctionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextUpdateFunctionInfo")
            .field("priority", &self.priority)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

/// Token issued on registration and required to unregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UpdateFunctionHandle {
    id: u64,
    stage: UpdateStage,
}

impl UpdateFunctionHandle {
    pub(crate) const fn new(id: u64, stage: UpdateStage) -> Self {
        Self { id, stage }
    }

    #[inline]
    #[must_use]
    pub const fn id(self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn stage(self) -> UpdateStage {
        self.stage
    }
}

/// An update function applied to a stage's registry.
pub(crate) struct RegisteredUpdateFunction {
    pub id: u64,
    pub priority: i32,
    pub function: UpdateFunction,
}

/// Registration changes queued between frames.
#[derive(Default)]
pub(crate) struct PendingUpdateFunctions {
    pub to_register: Vec<(UpdateFunctionHandle, ContextUpdateFunctionInfo)>,
    pub to_unregister: Vec<UpdateFunctionHandle>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_indices_follow_execution_order() {
        for (index, stage) in UpdateStage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), index);
        }
        assert_eq!(UpdateStage::COUNT, 4);
    }

    #[test]
    fn function_info_defaults() {
        let info = ContextUpdateFunctionInfo::new(|_| {});
        assert_eq!(info.priority, 0);
        assert_eq!(info.stage, UpdateStage::VariableUpdate);

        let info = info
            .with_priority(7)
            .with_stage(UpdateStage::FixedUpdate);
        assert_eq!(info.priority, 7);
        assert_eq!(info.stage, UpdateStage::FixedUpdate);
    }

    #[test]
    fn stage_serializes_as_snake_case() {
        let json = serde_json::to_string(&UpdateStage::FixedUpdate).unwrap();
        assert_eq!(json, "\"fixed_update\"");
        assert_eq!(UpdateStage::PostUpdate.to_string(), "post_update");
    }
}
