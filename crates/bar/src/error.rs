//! Error types of the bar core.

use thiserror::Error;

use crate::modal::ModeKey;
use crate::module::ModuleId;

/// Invalid registration, detected before the render loop starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("module `{0}` is registered twice")]
    DuplicateModule(ModuleId),
    #[error("mode `{0}` is registered twice")]
    DuplicateMode(ModeKey),
    #[error("mode `{mode}` references unregistered module `{module}`")]
    UnknownModeModule { mode: ModeKey, module: ModuleId },
    #[error("module `{0}` is not registered")]
    UnknownModule(ModuleId),
    #[error("module `{0}` is placed more than once")]
    PlacedTwice(ModuleId),
    #[error("module `{0}` is registered but never placed")]
    Unplaced(ModuleId),
    #[error("modes are registered but the mode group is never placed")]
    ModesNotPlaced,
    #[error("the mode group is placed more than once")]
    ModesPlacedTwice,
    #[error("a click action targets unregistered mode `{0}`")]
    UnregisteredMode(ModeKey),
    #[error("module `{module}` has a click action for mode `{mode}` it never declared")]
    UndeclaredTarget { module: ModuleId, mode: ModeKey },
}

/// Modal operation on a mode that was never registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModalError {
    #[error("mode `{0}` is not registered")]
    UnregisteredMode(ModeKey),
}
