//! # Input Bindings Module
//!
//! Dispatch table from `(ShiftMode, InputId)` to the discrete action it
//! triggers.
//!
//! ## Preset inputs
//!
//! | Input | Normal | Start | Menu | Menu + Start |
//! |-------|--------|-------|------|--------------|
//! | North | recall 0 | recall 8 | set 0 | set 8 |
//! | East | recall 1 | recall 9 | set 1 | set 9 |
//! | South | recall 2 | recall 10 | set 2 | set 10 |
//! | West | recall 3 | recall 11 | set 3 | set 11 |
//! | Hat up | recall 4 | recall 12 | set 4 | set 12 |
//! | Hat right | recall 5 | recall 13 | set 5 | set 13 |
//! | Hat down | recall 6 | recall 14 | set 6 | set 14 |
//! | Hat left | recall 7 | recall 15 | set 7 | set 15 |
//!
//! ## Shoulder inputs in set modes
//!
//! | Input | Menu | Menu + Start |
//! |-------|------|--------------|
//! | L1 | iris up | gain up |
//! | L2 | iris down | gain down |
//! | R1 | bright up | aperture up |
//! | R2 | bright down | aperture down |
//!
//! ## Stick clicks in normal mode
//!
//! - L3: home
//! - R3: autofocus
//!
//! Holding Menu or Start moves out of normal mode, so building a power
//! chord from Menu/Start first never fires home or autofocus.
//!
//! ## Chords (any mode)
//!
//! - L3 + R3 + Start: power off
//! - L3 + R3 + Menu: power on

use std::fmt;

use crate::controller::shift::ShiftMode;
use crate::controller::state::{Button, ControllerState, Hat};

/// Number of presets in one bank.
pub const PRESETS_PER_BANK: u8 = 8;

/// One of the four hat directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HatDirection {
    Up,
    Right,
    Down,
    Left,
}

impl HatDirection {
    /// Exact hat position this direction matches. Diagonals match nothing.
    #[must_use]
    pub fn position(self) -> Hat {
        match self {
            HatDirection::Up => Hat { x: 0, y: 1 },
            HatDirection::Right => Hat { x: 1, y: 0 },
            HatDirection::Down => Hat { x: 0, y: -1 },
            HatDirection::Left => Hat { x: -1, y: 0 },
        }
    }
}

/// Multi-button chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chord {
    PowerOn,
    PowerOff,
}

impl Chord {
    /// Buttons that must all be held.
    #[must_use]
    pub fn buttons(self) -> &'static [Button] {
        match self {
            Chord::PowerOn => &[Button::L3, Button::R3, Button::Menu],
            Chord::PowerOff => &[Button::L3, Button::R3, Button::Start],
        }
    }
}

/// Physical input that can trigger a discrete action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputId {
    Button(Button),
    Hat(HatDirection),
    Chord(Chord),
}

impl InputId {
    /// Returns true if the input's triggering condition holds in `state`.
    #[must_use]
    pub fn is_active(self, state: &ControllerState) -> bool {
        match self {
            InputId::Button(button) => state.pressed(button),
            InputId::Hat(direction) => state.hat == direction.position(),
            InputId::Chord(chord) => state.chord_held(chord.buttons()),
        }
    }

    /// Returns true if the input has been physically let go.
    ///
    /// Hat directions only count as released once the hat is back at
    /// neutral, so moving directly from one direction to another does not
    /// re-arm the first.
    #[must_use]
    pub fn is_released(self, state: &ControllerState) -> bool {
        match self {
            InputId::Button(button) => !state.pressed(button),
            InputId::Hat(_) => state.hat.is_neutral(),
            InputId::Chord(chord) => !state.chord_held(chord.buttons()),
        }
    }
}

/// Exposure adjustment primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureAdjust {
    IrisUp,
    IrisDown,
    BrightUp,
    BrightDown,
    GainUp,
    GainDown,
    ApertureUp,
    ApertureDown,
}

impl fmt::Display for ExposureAdjust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExposureAdjust::IrisUp => "iris_up",
            ExposureAdjust::IrisDown => "iris_down",
            ExposureAdjust::BrightUp => "bright_up",
            ExposureAdjust::BrightDown => "bright_down",
            ExposureAdjust::GainUp => "gain_up",
            ExposureAdjust::GainDown => "gain_down",
            ExposureAdjust::ApertureUp => "aperture_up",
            ExposureAdjust::ApertureDown => "aperture_down",
        };
        f.write_str(name)
    }
}

/// Discrete action identifier. One latch slot exists per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    PresetRecall(u8),
    PresetSet(u8),
    Exposure(ExposureAdjust),
    Home,
    Autofocus,
    PowerOn,
    PowerOff,
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionId::PresetRecall(n) => write!(f, "preset-recall-{}", n),
            ActionId::PresetSet(n) => write!(f, "preset-set-{}", n),
            ActionId::Exposure(adjust) => write!(f, "{}", adjust.to_string().replace('_', "-")),
            ActionId::Home => f.write_str("home"),
            ActionId::Autofocus => f.write_str("autofocus"),
            ActionId::PowerOn => f.write_str("power-on"),
            ActionId::PowerOff => f.write_str("power-off"),
        }
    }
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    /// Mode in which the binding applies; `None` for every mode
    pub mode: Option<ShiftMode>,
    pub input: InputId,
    pub action: ActionId,
}

impl Binding {
    /// Returns true if the binding applies in `mode`.
    #[must_use]
    pub fn applies_in(&self, mode: ShiftMode) -> bool {
        self.mode.map_or(true, |m| m == mode)
    }
}

/// Preset inputs in bank slot order.
pub const PRESET_INPUTS: [InputId; PRESETS_PER_BANK as usize] = [
    InputId::Button(Button::North),
    InputId::Button(Button::East),
    InputId::Button(Button::South),
    InputId::Button(Button::West),
    InputId::Hat(HatDirection::Up),
    InputId::Hat(HatDirection::Right),
    InputId::Hat(HatDirection::Down),
    InputId::Hat(HatDirection::Left),
];

const EXPOSURE_BINDINGS: [(ShiftMode, Button, ExposureAdjust); 8] = [
    (ShiftMode::PresetSet, Button::L1, ExposureAdjust::IrisUp),
    (ShiftMode::PresetSet, Button::L2, ExposureAdjust::IrisDown),
    (ShiftMode::PresetSet, Button::R1, ExposureAdjust::BrightUp),
    (ShiftMode::PresetSet, Button::R2, ExposureAdjust::BrightDown),
    (ShiftMode::PresetSetHidden, Button::L1, ExposureAdjust::GainUp),
    (ShiftMode::PresetSetHidden, Button::L2, ExposureAdjust::GainDown),
    (ShiftMode::PresetSetHidden, Button::R1, ExposureAdjust::ApertureUp),
    (ShiftMode::PresetSetHidden, Button::R2, ExposureAdjust::ApertureDown),
];

/// Immutable `(ShiftMode, InputId) -> ActionId` table.
#[derive(Debug, Clone)]
pub struct BindingTable {
    bindings: Vec<Binding>,
}

impl Default for BindingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BindingTable {
    /// Builds the default table.
    ///
    /// Chords come first so power changes are evaluated before preset
    /// traffic in the same cycle.
    #[must_use]
    pub fn new() -> Self {
        let mut bindings = vec![
            Binding {
                mode: None,
                input: InputId::Chord(Chord::PowerOff),
                action: ActionId::PowerOff,
            },
            Binding {
                mode: None,
                input: InputId::Chord(Chord::PowerOn),
                action: ActionId::PowerOn,
            },
        ];

        for mode in ShiftMode::ALL {
            for (slot, &input) in (0u8..).zip(PRESET_INPUTS.iter()) {
                let index = mode.bank_offset() + slot;
                let action = if mode.overwrites_presets() {
                    ActionId::PresetSet(index)
                } else {
                    ActionId::PresetRecall(index)
                };
                bindings.push(Binding {
                    mode: Some(mode),
                    input,
                    action,
                });
            }
        }

        bindings.push(Binding {
            mode: Some(ShiftMode::Normal),
            input: InputId::Button(Button::L3),
            action: ActionId::Home,
        });
        bindings.push(Binding {
            mode: Some(ShiftMode::Normal),
            input: InputId::Button(Button::R3),
            action: ActionId::Autofocus,
        });

        for (mode, button, adjust) in EXPOSURE_BINDINGS {
            bindings.push(Binding {
                mode: Some(mode),
                input: InputId::Button(button),
                action: ActionId::Exposure(adjust),
            });
        }

        Self { bindings }
    }

    /// Every binding, in evaluation order.
    #[must_use]
    pub fn all(&self) -> &[Binding] {
        &self.bindings
    }

    /// Action bound to `input` in `mode`, if any.
    #[must_use]
    pub fn lookup(&self, mode: ShiftMode, input: InputId) -> Option<ActionId> {
        self.bindings
            .iter()
            .find(|b| b.input == input && b.applies_in(mode))
            .map(|b| b.action)
    }
}
