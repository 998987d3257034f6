//! Modal shift derived from the Menu/Start chord.

use super::state::{Button, ControllerState};

/// How the preset inputs are interpreted this cycle.
///
/// Recomputed from every snapshot; never stored across cycles.
///
/// | Menu | Start | Mode |
/// |------|-------|------|
/// | - | - | `Normal` (recall 0-7) |
/// | - | held | `PresetRecallHidden` (recall 8-15) |
/// | held | - | `PresetSet` (overwrite 0-7) |
/// | held | held | `PresetSetHidden` (overwrite 8-15) |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftMode {
    Normal,
    PresetRecallHidden,
    PresetSet,
    PresetSetHidden,
}

impl ShiftMode {
    /// Every shift mode.
    pub const ALL: [ShiftMode; 4] = [
        ShiftMode::Normal,
        ShiftMode::PresetRecallHidden,
        ShiftMode::PresetSet,
        ShiftMode::PresetSetHidden,
    ];

    /// Resolves the shift mode from the current chord.
    #[must_use]
    pub fn from_state(state: &ControllerState) -> Self {
        match (state.pressed(Button::Menu), state.pressed(Button::Start)) {
            (false, false) => ShiftMode::Normal,
            (false, true) => ShiftMode::PresetRecallHidden,
            (true, false) => ShiftMode::PresetSet,
            (true, true) => ShiftMode::PresetSetHidden,
        }
    }

    /// Returns true if preset inputs overwrite rather than recall.
    #[must_use]
    pub fn overwrites_presets(self) -> bool {
        matches!(self, ShiftMode::PresetSet | ShiftMode::PresetSetHidden)
    }

    /// First preset index of the bank this mode addresses.
    #[must_use]
    pub fn bank_offset(self) -> u8 {
        match self {
            ShiftMode::Normal | ShiftMode::PresetSet => 0,
            ShiftMode::PresetRecallHidden | ShiftMode::PresetSetHidden => 8,
        }
    }
}
