//! # Command Dispatcher
//!
//! Per-cycle decision function: given the latest [`ControllerState`], decide
//! which camera commands to issue.
//!
//! ## Continuous axes
//!
//! Pan, tilt and zoom each track a phase (rest, negative, positive). A
//! directional command is issued only when an axis enters a new phase;
//! holding the stick issues nothing further. Pan and tilt share one stop
//! command, sent once when both return to rest. Each pan-tilt drive
//! primitive halts the other axis, so when one axis rests while the other
//! keeps moving, the moving axis is re-issued.
//!
//! In relative mode pan and tilt instead issue a relative step every
//! eligible cycle while deflected, alternating between the two axes.
//!
//! ## Discrete actions
//!
//! Presets, exposure and power are resolved through the
//! [`BindingTable`] for the current [`ShiftMode`] and debounced by the
//! [`EdgeTracker`].
//!
//! ## Power
//!
//! Power-on opens a settle window during which nothing is dispatched.
//! Discrete inputs seen during the window are latched so they cannot fire
//! the moment it closes. When it closes the port is reset before any other
//! command. A power command that fails to send is rolled back through
//! [`Dispatcher::command_failed`].
//!
//! Buttons that belong to a held power chord are absorbed, so letting go of
//! Menu or Start before L3/R3 does not fire home or autofocus.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::bindings::{ActionId, Binding, BindingTable, Chord, InputId};
use super::command::Command;
use super::governor::{Category, RateGovernor};
use super::latch::{Condition, Edge, EdgeTracker};
use crate::config::{Config, DebounceStrategy, MotionMode};
use crate::controller::analog::{DeadZone, Direction, MotionIntent};
use crate::controller::shift::ShiftMode;
use crate::controller::state::{Axis, Button, ControllerState};

/// Dispatcher tuning, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    pub motion_mode: MotionMode,
    pub debounce: DebounceStrategy,
    pub pan_dead_zone: DeadZone,
    pub tilt_dead_zone: DeadZone,
    pub zoom_dead_zone: DeadZone,
    /// Max pan-tilt speed with no shoulder, L1, L2
    pub pan_tilt_speeds: [u8; 3],
    /// Max zoom speed with no shoulder, R1, R2
    pub zoom_speeds: [u8; 3],
    pub min_step: u16,
    pub max_step: u16,
    pub min_command_interval: Duration,
    pub power_on_settle: Duration,
}

impl DispatcherSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            motion_mode: config.motion.mode,
            debounce: config.controller.debounce,
            pan_dead_zone: DeadZone::new(config.controller.rest_threshold_pan),
            tilt_dead_zone: DeadZone::new(config.controller.rest_threshold_tilt),
            zoom_dead_zone: DeadZone::new(config.controller.rest_threshold_zoom),
            pan_tilt_speeds: config.motion.pan_tilt_speeds,
            zoom_speeds: config.motion.zoom_speeds,
            min_step: config.motion.min_step,
            max_step: config.motion.max_step,
            min_command_interval: config.timing.min_command_interval(),
            power_on_settle: config.timing.power_on_settle(),
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Camera power as seen by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    /// Not queried, or the query failed
    Unknown,
    Off,
    /// Power-on sent, settle window open
    PoweringOn,
    On,
}

/// Turns controller snapshots into camera commands.
#[derive(Debug)]
pub struct Dispatcher {
    settings: DispatcherSettings,
    bindings: BindingTable,
    edges: EdgeTracker,
    governor: RateGovernor,
    power: PowerState,
    /// Power state before the last power command, restored if it fails
    power_before: PowerState,
    pan_phase: Direction,
    tilt_phase: Direction,
    zoom_phase: Direction,
    pan_tilt_stopped: bool,
    relative_tilt_next: bool,
}

impl Dispatcher {
    #[must_use]
    pub fn new(settings: DispatcherSettings) -> Self {
        Self {
            bindings: BindingTable::new(),
            edges: EdgeTracker::new(settings.debounce),
            governor: RateGovernor::new(settings.min_command_interval, settings.power_on_settle),
            power: PowerState::Unknown,
            power_before: PowerState::Unknown,
            pan_phase: Direction::Rest,
            tilt_phase: Direction::Rest,
            zoom_phase: Direction::Rest,
            pan_tilt_stopped: true,
            relative_tilt_next: false,
            settings,
        }
    }

    /// Seeds the power state from the camera's reply, if there was one.
    pub fn seed_power(&mut self, powered: Option<bool>) {
        self.power = match powered {
            Some(true) => PowerState::On,
            Some(false) => PowerState::Off,
            None => PowerState::Unknown,
        };
        info!("Camera power state: {:?}", self.power);
    }

    #[must_use]
    pub fn power_state(&self) -> PowerState {
        self.power
    }

    /// Rolls back what the dispatcher committed for `command` when the
    /// camera never received it.
    ///
    /// Only power commands change dispatcher state beyond their own cycle:
    /// a failed power-on closes the settle window at once.
    pub fn command_failed(&mut self, command: &Command) {
        match *command {
            Command::Power { on: true } if self.power == PowerState::PoweringOn => {
                self.governor.cancel_settle();
                self.power = self.power_before;
                info!("Power-on not delivered, camera power {:?}", self.power);
            }
            Command::Power { on: false } if self.power == PowerState::Off => {
                self.power = self.power_before;
                info!("Power-off not delivered, camera power {:?}", self.power);
            }
            _ => {}
        }
    }

    /// Time left before commands resume after power-on.
    #[must_use]
    pub fn settle_remaining(&self, now: Instant) -> Duration {
        self.governor.settle_remaining(now)
    }

    /// Runs one dispatch cycle.
    ///
    /// # Arguments
    ///
    /// * `state` - Latest controller snapshot
    /// * `now` - Cycle time, used for rate limiting
    ///
    /// # Returns
    ///
    /// Commands to send, in order. Empty when nothing changed or everything
    /// was deferred.
    pub fn cycle(&mut self, state: &ControllerState, now: Instant) -> Vec<Command> {
        let mut out = Vec::new();

        if self.power == PowerState::PoweringOn {
            if !self.governor.end_settle(now) {
                self.track_blackout(state);
                return out;
            }
            info!("Camera settle complete, resetting port");
            self.power = PowerState::On;
            self.emit(Command::ResetPort, now, &mut out);
        }

        let mode = ShiftMode::from_state(state);
        if self.dispatch_discrete(state, mode, now, &mut out) {
            return out;
        }

        let pan = self.settings.pan_dead_zone.intent(state.axis(Axis::LeftX));
        let tilt = self.settings.tilt_dead_zone.intent(state.axis(Axis::LeftY));
        let pan_tilt_max = tier(&self.settings.pan_tilt_speeds, state, Button::L1, Button::L2);
        match self.settings.motion_mode {
            MotionMode::Continuous => self.drive_pan_tilt(pan, tilt, pan_tilt_max, now, &mut out),
            MotionMode::Relative => self.step_pan_tilt(pan, tilt, pan_tilt_max, now, &mut out),
        }

        let zoom = self.settings.zoom_dead_zone.intent(state.axis(Axis::RightY));
        let zoom_max = tier(&self.settings.zoom_speeds, state, Button::R1, Button::R2);
        self.drive_zoom(zoom, zoom_max, now, &mut out);

        out
    }

    fn emit(&mut self, command: Command, now: Instant, out: &mut Vec<Command>) {
        self.governor.record(command.category(), now);
        out.push(command);
    }

    fn condition(binding: &Binding, mode: ShiftMode, state: &ControllerState) -> Condition {
        if binding.input.is_released(state) {
            Condition::Released
        } else if binding.applies_in(mode) && binding.input.is_active(state) {
            Condition::Triggered
        } else {
            Condition::Holding
        }
    }

    /// Keeps latches current while the camera boots without dispatching.
    fn track_blackout(&mut self, state: &ControllerState) {
        let mode = ShiftMode::from_state(state);
        for binding in self.bindings.all() {
            match Self::condition(binding, mode, state) {
                Condition::Triggered => {
                    if self.edges.absorb(binding.action) {
                        debug!("Ignoring {} while camera settles", binding.action);
                    }
                }
                condition => {
                    self.edges.observe(binding.action, condition, false);
                }
            }
        }
    }

    /// Absorbs single-button actions whose button is part of a held chord.
    fn absorb_chord_members(&mut self, state: &ControllerState) {
        for chord in [Chord::PowerOn, Chord::PowerOff] {
            let buttons = chord.buttons();
            if !state.chord_held(buttons) {
                continue;
            }
            for binding in self.bindings.all() {
                if let InputId::Button(button) = binding.input {
                    if buttons.contains(&button) && self.edges.absorb(binding.action) {
                        debug!("{} absorbed by {:?} chord", binding.action, chord);
                    }
                }
            }
        }
    }

    fn power_applies(&self, action: ActionId) -> bool {
        match action {
            ActionId::PowerOn => matches!(self.power, PowerState::Off | PowerState::Unknown),
            ActionId::PowerOff => matches!(self.power, PowerState::On | PowerState::Unknown),
            _ => true,
        }
    }

    /// Returns true if power-on was issued and the cycle must end.
    fn dispatch_discrete(
        &mut self,
        state: &ControllerState,
        mode: ShiftMode,
        now: Instant,
        out: &mut Vec<Command>,
    ) -> bool {
        self.absorb_chord_members(state);

        for index in 0..self.bindings.all().len() {
            let binding = self.bindings.all()[index];
            let condition = Self::condition(&binding, mode, state);

            if condition == Condition::Triggered && !self.power_applies(binding.action) {
                if self.edges.absorb(binding.action) {
                    debug!("Ignoring {} while camera is {:?}", binding.action, self.power);
                }
                continue;
            }

            let command = command_for(binding.action);
            let admit = self.governor.ready(command.category(), now);
            match self.edges.observe(binding.action, condition, admit) {
                Edge::Activated => {}
                Edge::Deferred => {
                    debug!("Deferred {}", binding.action);
                    continue;
                }
                _ => continue,
            }

            info!("{} -> {}", binding.action, command);
            self.emit(command, now, out);

            match binding.action {
                ActionId::PowerOn => {
                    self.power_before = self.power;
                    self.power = PowerState::PoweringOn;
                    self.governor.begin_settle(now);
                    self.pan_phase = Direction::Rest;
                    self.tilt_phase = Direction::Rest;
                    self.zoom_phase = Direction::Rest;
                    self.pan_tilt_stopped = true;
                    return true;
                }
                ActionId::PowerOff => {
                    self.power_before = self.power;
                    self.power = PowerState::Off;
                }
                _ => {}
            }
        }
        false
    }

    fn drive_pan_tilt(
        &mut self,
        pan: MotionIntent,
        tilt: MotionIntent,
        max_speed: u8,
        now: Instant,
        out: &mut Vec<Command>,
    ) {
        if pan.is_rest() && tilt.is_rest() {
            self.stop_pan_tilt(now, out);
            return;
        }

        let pan_enters = !pan.is_rest() && pan.direction != self.pan_phase;
        let tilt_enters = !tilt.is_rest() && tilt.direction != self.tilt_phase;
        let pan_rests = pan.is_rest() && self.pan_phase != Direction::Rest;
        let tilt_rests = tilt.is_rest() && self.tilt_phase != Direction::Rest;

        if !(pan_enters || tilt_enters || pan_rests || tilt_rests) {
            return;
        }
        if !self.governor.ready(Category::Movement, now) {
            return;
        }

        let command = if pan_enters {
            self.pan_phase = pan.direction;
            pan_command(pan, max_speed)
        } else if tilt_enters {
            self.tilt_phase = tilt.direction;
            tilt_command(tilt, max_speed)
        } else if pan_rests {
            tilt_command(tilt, max_speed)
        } else {
            pan_command(pan, max_speed)
        };
        if pan_rests {
            self.pan_phase = Direction::Rest;
        }
        if tilt_rests {
            self.tilt_phase = Direction::Rest;
        }

        self.pan_tilt_stopped = false;
        self.emit(command, now, out);
    }

    fn step_pan_tilt(
        &mut self,
        pan: MotionIntent,
        tilt: MotionIntent,
        max_speed: u8,
        now: Instant,
        out: &mut Vec<Command>,
    ) {
        if pan.is_rest() && tilt.is_rest() {
            self.stop_pan_tilt(now, out);
            return;
        }
        if !self.governor.ready(Category::Movement, now) {
            return;
        }

        let (min, max) = (self.settings.min_step, self.settings.max_step);
        let use_tilt = if pan.is_rest() {
            true
        } else if tilt.is_rest() {
            false
        } else {
            self.relative_tilt_next
        };
        self.relative_tilt_next = !use_tilt;

        let command = if use_tilt {
            Command::TiltRelative {
                step: tilt.signed_step(min, max),
                speed: tilt.speed(max_speed),
            }
        } else {
            Command::PanRelative {
                step: pan.signed_step(min, max),
                speed: pan.speed(max_speed),
            }
        };
        self.pan_phase = pan.direction;
        self.tilt_phase = tilt.direction;
        self.pan_tilt_stopped = false;
        self.emit(command, now, out);
    }

    fn stop_pan_tilt(&mut self, now: Instant, out: &mut Vec<Command>) {
        if self.pan_tilt_stopped || !self.governor.ready(Category::Movement, now) {
            return;
        }
        self.pan_phase = Direction::Rest;
        self.tilt_phase = Direction::Rest;
        self.pan_tilt_stopped = true;
        self.emit(Command::Stop, now, out);
    }

    fn drive_zoom(&mut self, zoom: MotionIntent, max_speed: u8, now: Instant, out: &mut Vec<Command>) {
        if zoom.direction == self.zoom_phase || !self.governor.ready(Category::Zoom, now) {
            return;
        }
        let command = match zoom.direction {
            Direction::Positive => Command::ZoomIn {
                speed: zoom.speed(max_speed),
            },
            Direction::Negative => Command::ZoomOut {
                speed: zoom.speed(max_speed),
            },
            Direction::Rest => Command::ZoomStop,
        };
        self.zoom_phase = zoom.direction;
        self.emit(command, now, out);
    }
}

/// Max speed for the shoulder tier: none, `low` held, `high` held (wins).
fn tier(speeds: &[u8; 3], state: &ControllerState, low: Button, high: Button) -> u8 {
    if state.pressed(high) {
        speeds[2]
    } else if state.pressed(low) {
        speeds[1]
    } else {
        speeds[0]
    }
}

fn pan_command(pan: MotionIntent, max_speed: u8) -> Command {
    let speed = pan.speed(max_speed);
    match pan.direction {
        Direction::Negative => Command::PanLeft { speed },
        _ => Command::PanRight { speed },
    }
}

fn tilt_command(tilt: MotionIntent, max_speed: u8) -> Command {
    let speed = tilt.speed(max_speed);
    match tilt.direction {
        Direction::Negative => Command::TiltDown { speed },
        _ => Command::TiltUp { speed },
    }
}

fn command_for(action: ActionId) -> Command {
    match action {
        ActionId::PresetRecall(index) => Command::PresetRecall { index },
        ActionId::PresetSet(index) => Command::PresetSet { index },
        ActionId::Home => Command::Home,
        ActionId::Autofocus => Command::Autofocus,
        ActionId::Exposure(adjust) => Command::Exposure { adjust },
        ActionId::PowerOn => Command::Power { on: true },
        ActionId::PowerOff => Command::Power { on: false },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::bindings::ExposureAdjust;

    const STEP: Duration = Duration::from_millis(20);

    fn dispatcher() -> Dispatcher {
        let mut d = Dispatcher::new(DispatcherSettings::default());
        d.seed_power(Some(true));
        d
    }

    fn idle() -> ControllerState {
        ControllerState::new()
    }

    /// Runs `states` on consecutive 20 ms cycles and returns every command.
    fn run(d: &mut Dispatcher, start: Instant, states: &[ControllerState]) -> Vec<Vec<Command>> {
        states
            .iter()
            .enumerate()
            .map(|(i, s)| d.cycle(s, start + STEP * i as u32))
            .collect()
    }

    fn flatten(cycles: Vec<Vec<Command>>) -> Vec<Command> {
        cycles.into_iter().flatten().collect()
    }

    #[test]
    fn test_idle_issues_nothing() {
        let mut d = dispatcher();
        let cycles = run(&mut d, Instant::now(), &vec![idle(); 20]);
        assert!(flatten(cycles).is_empty());
    }

    #[test]
    fn test_hat_up_recalls_preset_four_once() {
        let mut d = dispatcher();
        let up = idle().with_hat(0, 1);
        let cycles = run(&mut d, Instant::now(), &[idle(), up.clone(), up.clone(), up, idle(), idle()]);
        assert_eq!(flatten(cycles), vec![Command::PresetRecall { index: 4 }]);
    }

    #[test]
    fn test_hat_direction_change_without_neutral_keeps_first_latched() {
        let mut d = dispatcher();
        let states = [
            idle().with_hat(0, 1),
            idle().with_hat(0, 1),
            idle().with_hat(1, 0),
            idle().with_hat(1, 0),
            idle().with_hat(1, 0),
            idle().with_hat(1, 0),
            idle().with_hat(0, 1),
            idle().with_hat(0, 1),
            idle().with_hat(0, 1),
        ];
        let commands = flatten(run(&mut d, Instant::now(), &states));
        // Up fires, right fires, up stays latched until neutral
        assert_eq!(
            commands,
            vec![Command::PresetRecall { index: 4 }, Command::PresetRecall { index: 5 }]
        );
    }

    #[test]
    fn test_hat_neutral_rearms_every_direction() {
        let up = idle().with_hat(0, 1);
        let right = idle().with_hat(1, 0);
        let states = [
            up.clone(),
            up.clone(),
            right.clone(),
            right.clone(),
            right.clone(),
            idle(),
            up.clone(),
            up,
            right.clone(),
            right.clone(),
            right,
        ];

        let mut d = dispatcher();
        let commands = flatten(run(&mut d, Instant::now(), &states));
        assert_eq!(
            commands,
            vec![
                Command::PresetRecall { index: 4 },
                Command::PresetRecall { index: 5 },
                Command::PresetRecall { index: 4 },
                Command::PresetRecall { index: 5 },
            ]
        );

        // Same sequence with Menu held overwrites instead
        let with_menu: Vec<_> = states
            .iter()
            .cloned()
            .map(|s| s.with_button(Button::Menu, true))
            .collect();
        let mut d = dispatcher();
        let commands = flatten(run(&mut d, Instant::now(), &with_menu));
        assert_eq!(
            commands,
            vec![
                Command::PresetSet { index: 4 },
                Command::PresetSet { index: 5 },
                Command::PresetSet { index: 4 },
                Command::PresetSet { index: 5 },
            ]
        );
    }

    #[test]
    fn test_stick_clicks_home_and_autofocus() {
        let mut d = dispatcher();
        let l3 = idle().with_button(Button::L3, true);
        let r3 = idle().with_button(Button::R3, true);
        let states = [l3.clone(), l3, idle(), r3.clone(), r3, idle()];

        let commands = flatten(run(&mut d, Instant::now(), &states));
        assert_eq!(commands, vec![Command::Home, Command::Autofocus]);
    }

    #[test]
    fn test_power_chord_release_order_does_not_fire_stick_clicks() {
        let mut d = dispatcher();
        let start = idle().with_button(Button::Start, true);
        let off = start
            .clone()
            .with_button(Button::L3, true)
            .with_button(Button::R3, true);
        // Start let go first, L3 and R3 still held
        let sticks = idle().with_button(Button::L3, true).with_button(Button::R3, true);

        let states = [start, off.clone(), off, sticks.clone(), sticks.clone(), sticks, idle()];
        let commands = flatten(run(&mut d, Instant::now(), &states));
        assert_eq!(commands, vec![Command::Power { on: false }]);

        // Clicked again after release: fires normally
        let l3 = idle().with_button(Button::L3, true);
        assert_eq!(
            d.cycle(&l3, Instant::now() + Duration::from_secs(1)),
            vec![Command::Home]
        );
    }

    #[test]
    fn test_hidden_recall_bank() {
        let mut d = dispatcher();
        let state = idle().with_button(Button::Start, true).with_button(Button::South, true);
        assert_eq!(d.cycle(&state, Instant::now()), vec![Command::PresetRecall { index: 10 }]);
    }

    #[test]
    fn test_shift_mid_press() {
        let mut d = dispatcher();
        let north = idle().with_button(Button::North, true);
        let north_menu = north.clone().with_button(Button::Menu, true);

        let states = [
            north.clone(),
            north.clone(),
            north_menu.clone(),
            north_menu.clone(),
            north_menu,
            north.clone(),
            north.clone(),
            north.clone(),
            idle(),
            idle(),
            idle(),
            north,
        ];
        let commands = flatten(run(&mut d, Instant::now(), &states));
        assert_eq!(
            commands,
            vec![
                Command::PresetRecall { index: 0 },
                Command::PresetSet { index: 0 },
                Command::PresetRecall { index: 0 },
            ]
        );
    }

    #[test]
    fn test_exposure_in_set_modes() {
        let mut d = dispatcher();
        let t0 = Instant::now();
        let iris = idle().with_button(Button::Menu, true).with_button(Button::L1, true);
        assert_eq!(
            d.cycle(&iris, t0),
            vec![Command::Exposure { adjust: ExposureAdjust::IrisUp }]
        );

        let aperture = idle()
            .with_button(Button::Menu, true)
            .with_button(Button::Start, true)
            .with_button(Button::R2, true);
        assert_eq!(
            d.cycle(&aperture, t0 + Duration::from_millis(100)),
            vec![Command::Exposure { adjust: ExposureAdjust::ApertureDown }]
        );
    }

    #[test]
    fn test_repeat_debounce_resends_while_held() {
        let settings = DispatcherSettings {
            debounce: DebounceStrategy::Repeat,
            ..DispatcherSettings::default()
        };
        let mut d = Dispatcher::new(settings);
        let north = idle().with_button(Button::North, true);
        // Eligible at 0, 60 and 120 ms with a 50 ms interval
        let commands = flatten(run(&mut d, Instant::now(), &vec![north; 7]));
        assert_eq!(commands, vec![Command::PresetRecall { index: 0 }; 3]);
    }

    #[test]
    fn test_pan_enters_once_and_stops_once() {
        let mut d = dispatcher();
        let right = idle().with_axis(Axis::LeftX, 1.0).with_button(Button::L1, true);
        let mut states = vec![right; 10];
        states.extend(vec![idle(); 10]);

        let commands = flatten(run(&mut d, Instant::now(), &states));
        assert_eq!(commands, vec![Command::PanRight { speed: 7 }, Command::Stop]);
    }

    #[test]
    fn test_rest_threshold_is_rest() {
        let mut d = dispatcher();
        let jitter = idle().with_axis(Axis::LeftX, 0.004).with_axis(Axis::LeftY, -0.004);
        assert!(flatten(run(&mut d, Instant::now(), &vec![jitter; 5])).is_empty());
    }

    #[test]
    fn test_tier_selection() {
        let mut d = dispatcher();
        let t0 = Instant::now();
        let slow = idle().with_axis(Axis::LeftY, -1.0);
        assert_eq!(d.cycle(&slow, t0), vec![Command::TiltDown { speed: 1 }]);

        let mut d = dispatcher();
        let fast = idle()
            .with_axis(Axis::LeftY, 1.0)
            .with_button(Button::L1, true)
            .with_button(Button::L2, true);
        assert_eq!(d.cycle(&fast, t0), vec![Command::TiltUp { speed: 14 }]);
    }

    #[test]
    fn test_direction_change_is_rate_limited_not_dropped() {
        let mut d = dispatcher();
        let t0 = Instant::now();
        let right = idle().with_axis(Axis::LeftX, 0.5);
        let left = idle().with_axis(Axis::LeftX, -0.5);

        assert_eq!(d.cycle(&right, t0), vec![Command::PanRight { speed: 1 }]);
        assert!(d.cycle(&left, t0 + Duration::from_millis(20)).is_empty());
        assert!(d.cycle(&left, t0 + Duration::from_millis(40)).is_empty());
        assert_eq!(
            d.cycle(&left, t0 + Duration::from_millis(60)),
            vec![Command::PanLeft { speed: 1 }]
        );
    }

    #[test]
    fn test_tilt_resting_reissues_pan() {
        let mut d = dispatcher();
        let t0 = Instant::now();
        let pan = idle().with_axis(Axis::LeftX, 1.0);
        let both = pan.clone().with_axis(Axis::LeftY, 1.0);

        assert_eq!(d.cycle(&pan, t0), vec![Command::PanRight { speed: 1 }]);
        assert_eq!(
            d.cycle(&both, t0 + Duration::from_millis(60)),
            vec![Command::TiltUp { speed: 1 }]
        );
        assert_eq!(
            d.cycle(&pan, t0 + Duration::from_millis(120)),
            vec![Command::PanRight { speed: 1 }]
        );
        assert!(d.cycle(&pan, t0 + Duration::from_millis(180)).is_empty());
    }

    #[test]
    fn test_zoom_in_and_stop() {
        let mut d = dispatcher();
        let t0 = Instant::now();
        let zoom = idle().with_axis(Axis::RightY, 1.0).with_button(Button::R2, true);

        assert_eq!(d.cycle(&zoom, t0), vec![Command::ZoomIn { speed: 7 }]);
        assert!(d.cycle(&zoom, t0 + Duration::from_millis(60)).is_empty());
        assert_eq!(
            d.cycle(&idle(), t0 + Duration::from_millis(120)),
            vec![Command::ZoomStop]
        );
        assert!(d.cycle(&idle(), t0 + Duration::from_millis(180)).is_empty());
    }

    #[test]
    fn test_relative_mode_steps_every_eligible_cycle() {
        let settings = DispatcherSettings {
            motion_mode: MotionMode::Relative,
            ..DispatcherSettings::default()
        };
        let mut d = Dispatcher::new(settings);
        let t0 = Instant::now();
        let left = idle().with_axis(Axis::LeftX, -0.5);
        let expected = Command::PanRelative { step: -8, speed: 1 };

        assert_eq!(d.cycle(&left, t0), vec![expected]);
        assert!(d.cycle(&left, t0 + Duration::from_millis(20)).is_empty());
        assert_eq!(d.cycle(&left, t0 + Duration::from_millis(60)), vec![expected]);
        assert_eq!(
            d.cycle(&idle(), t0 + Duration::from_millis(120)),
            vec![Command::Stop]
        );
    }

    #[test]
    fn test_relative_mode_alternates_axes() {
        let settings = DispatcherSettings {
            motion_mode: MotionMode::Relative,
            ..DispatcherSettings::default()
        };
        let mut d = Dispatcher::new(settings);
        let t0 = Instant::now();
        let both = idle().with_axis(Axis::LeftX, 1.0).with_axis(Axis::LeftY, 1.0);

        assert_eq!(d.cycle(&both, t0), vec![Command::PanRelative { step: 10, speed: 1 }]);
        assert_eq!(
            d.cycle(&both, t0 + Duration::from_millis(60)),
            vec![Command::TiltRelative { step: 10, speed: 1 }]
        );
    }

    #[test]
    fn test_relative_pan_does_not_starve_zoom() {
        let settings = DispatcherSettings {
            motion_mode: MotionMode::Relative,
            ..DispatcherSettings::default()
        };
        let mut d = Dispatcher::new(settings);
        let zoom = idle().with_axis(Axis::LeftX, 1.0).with_axis(Axis::RightY, 1.0);
        let pan = idle().with_axis(Axis::LeftX, 1.0);

        let mut states = vec![zoom];
        states.extend(vec![pan; 99]);
        let commands = flatten(run(&mut d, Instant::now(), &states));

        assert_eq!(commands[0], Command::PanRelative { step: 10, speed: 1 });
        assert_eq!(commands[1], Command::ZoomIn { speed: 1 });
        let zoom_stops = commands.iter().filter(|&&c| c == Command::ZoomStop).count();
        assert_eq!(zoom_stops, 1);
        assert!(commands.iter().filter(|c| matches!(c, Command::PanRelative { .. })).count() > 10);
    }

    #[test]
    fn test_pan_and_zoom_enter_in_same_cycle() {
        let mut d = dispatcher();
        let both = idle().with_axis(Axis::LeftX, -1.0).with_axis(Axis::RightY, -1.0);
        assert_eq!(
            d.cycle(&both, Instant::now()),
            vec![Command::PanLeft { speed: 1 }, Command::ZoomOut { speed: 1 }]
        );
    }

    fn power_on_chord() -> ControllerState {
        idle()
            .with_button(Button::L3, true)
            .with_button(Button::R3, true)
            .with_button(Button::Menu, true)
    }

    #[test]
    fn test_power_on_blackout_then_reset() {
        let mut d = Dispatcher::new(DispatcherSettings::default());
        d.seed_power(Some(false));
        let t0 = Instant::now();
        let settle = DispatcherSettings::default().power_on_settle;

        assert_eq!(d.cycle(&power_on_chord(), t0), vec![Command::Power { on: true }]);
        assert_eq!(d.power_state(), PowerState::PoweringOn);

        let pan = idle().with_axis(Axis::LeftX, 1.0);
        for secs in [1, 5, 20, 29] {
            assert!(d.cycle(&pan, t0 + Duration::from_secs(secs)).is_empty());
        }
        assert!(d.settle_remaining(t0 + Duration::from_secs(29)) > Duration::ZERO);

        assert_eq!(
            d.cycle(&pan, t0 + settle),
            vec![Command::ResetPort, Command::PanRight { speed: 1 }]
        );
        assert_eq!(d.power_state(), PowerState::On);
        assert!(d.cycle(&pan, t0 + settle + Duration::from_millis(100)).is_empty());
    }

    #[test]
    fn test_failed_power_on_is_rolled_back() {
        let mut d = Dispatcher::new(DispatcherSettings::default());
        d.seed_power(Some(false));
        let t0 = Instant::now();

        let commands = d.cycle(&power_on_chord(), t0);
        assert_eq!(commands, vec![Command::Power { on: true }]);
        d.command_failed(&commands[0]);

        assert_eq!(d.power_state(), PowerState::Off);
        assert_eq!(d.settle_remaining(t0), Duration::ZERO);

        let pan = idle().with_axis(Axis::LeftX, 1.0);
        assert_eq!(
            d.cycle(&pan, t0 + Duration::from_millis(100)),
            vec![Command::PanRight { speed: 1 }]
        );

        // Chord pressed again retries power-on
        d.cycle(&idle(), t0 + Duration::from_millis(200));
        assert_eq!(
            d.cycle(&power_on_chord(), t0 + Duration::from_millis(300)),
            vec![Command::Power { on: true }]
        );
    }

    #[test]
    fn test_failed_power_off_restores_previous_state() {
        let mut d = Dispatcher::new(DispatcherSettings::default());
        let off = idle()
            .with_button(Button::L3, true)
            .with_button(Button::R3, true)
            .with_button(Button::Start, true);

        d.command_failed(&Command::Power { on: false });
        assert_eq!(d.power_state(), PowerState::Unknown);

        let commands = d.cycle(&off, Instant::now());
        assert_eq!(d.power_state(), PowerState::Off);
        d.command_failed(&commands[0]);
        assert_eq!(d.power_state(), PowerState::Unknown);

        // Other failures leave power alone
        d.command_failed(&Command::PresetRecall { index: 0 });
        assert_eq!(d.power_state(), PowerState::Unknown);
    }

    #[test]
    fn test_button_pressed_during_blackout_does_not_fire_after() {
        let mut d = Dispatcher::new(DispatcherSettings::default());
        d.seed_power(Some(false));
        let t0 = Instant::now();
        let settle = DispatcherSettings::default().power_on_settle;
        let north = idle().with_button(Button::North, true);

        d.cycle(&power_on_chord(), t0);
        assert!(d.cycle(&north, t0 + Duration::from_secs(10)).is_empty());
        assert_eq!(d.cycle(&north, t0 + settle), vec![Command::ResetPort]);

        // Released and pressed again: fires normally
        d.cycle(&idle(), t0 + settle + Duration::from_millis(100));
        assert_eq!(
            d.cycle(&north, t0 + settle + Duration::from_millis(200)),
            vec![Command::PresetRecall { index: 0 }]
        );
    }

    #[test]
    fn test_power_on_ignored_when_on() {
        let mut d = dispatcher();
        let t0 = Instant::now();
        let cycles = run(&mut d, t0, &vec![power_on_chord(); 5]);
        assert!(flatten(cycles).is_empty());
        assert_eq!(d.power_state(), PowerState::On);
    }

    #[test]
    fn test_power_off_then_on() {
        let mut d = dispatcher();
        let t0 = Instant::now();
        let off = idle()
            .with_button(Button::L3, true)
            .with_button(Button::R3, true)
            .with_button(Button::Start, true);

        assert_eq!(d.cycle(&off, t0), vec![Command::Power { on: false }]);
        assert_eq!(d.power_state(), PowerState::Off);
        assert!(d.cycle(&off, t0 + Duration::from_millis(100)).is_empty());

        d.cycle(&idle(), t0 + Duration::from_millis(200));
        assert_eq!(
            d.cycle(&power_on_chord(), t0 + Duration::from_millis(300)),
            vec![Command::Power { on: true }]
        );
    }

    #[test]
    fn test_unknown_power_accepts_either_chord() {
        let mut d = Dispatcher::new(DispatcherSettings::default());
        assert_eq!(d.power_state(), PowerState::Unknown);
        assert_eq!(d.cycle(&power_on_chord(), Instant::now()), vec![Command::Power { on: true }]);
    }
}
