//! # Camera Commands
//!
//! [`Command`] is the dispatcher's output: one camera primitive with its
//! integer parameters. [`PtzCamera`] is the transport collaborator that
//! carries it out.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use super::bindings::ExposureAdjust;
use super::governor::Category;
use crate::error::Result;

/// A single camera command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Command {
    PanLeft { speed: u8 },
    PanRight { speed: u8 },
    TiltUp { speed: u8 },
    TiltDown { speed: u8 },
    /// Relative pan; negative steps move left
    PanRelative { step: i16, speed: u8 },
    /// Relative tilt; negative steps move down
    TiltRelative { step: i16, speed: u8 },
    ZoomIn { speed: u8 },
    ZoomOut { speed: u8 },
    /// Stops pan and tilt
    Stop,
    ZoomStop,
    PresetRecall { index: u8 },
    PresetSet { index: u8 },
    /// Returns pan and tilt to the home position
    Home,
    /// One-push autofocus
    Autofocus,
    Exposure { adjust: ExposureAdjust },
    Power { on: bool },
    /// Re-establishes the serial channel after the camera boots
    ResetPort,
}

impl Command {
    /// Rate governor category of this command.
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Command::PanLeft { .. }
            | Command::PanRight { .. }
            | Command::TiltUp { .. }
            | Command::TiltDown { .. }
            | Command::PanRelative { .. }
            | Command::TiltRelative { .. }
            | Command::Stop => Category::Movement,
            Command::ZoomIn { .. } | Command::ZoomOut { .. } | Command::ZoomStop => Category::Zoom,
            Command::PresetRecall { .. }
            | Command::PresetSet { .. }
            | Command::Home
            | Command::Autofocus
            | Command::Exposure { .. } => Category::Discrete,
            Command::Power { .. } | Command::ResetPort => Category::Power,
        }
    }

    /// Carries out the command on `camera`.
    ///
    /// # Errors
    ///
    /// Returns whatever the camera reports; see [`PtzCamera`].
    pub async fn execute<C: PtzCamera + ?Sized>(&self, camera: &mut C) -> Result<()> {
        match *self {
            Command::PanLeft { speed } => camera.pan_left(speed).await,
            Command::PanRight { speed } => camera.pan_right(speed).await,
            Command::TiltUp { speed } => camera.tilt_up(speed).await,
            Command::TiltDown { speed } => camera.tilt_down(speed).await,
            Command::PanRelative { step, speed } => camera.pan_relative(step, speed).await,
            Command::TiltRelative { step, speed } => camera.tilt_relative(step, speed).await,
            Command::ZoomIn { speed } => camera.zoom_in(speed).await,
            Command::ZoomOut { speed } => camera.zoom_out(speed).await,
            Command::Stop => camera.stop().await,
            Command::ZoomStop => camera.zoom_stop().await,
            Command::PresetRecall { index } => camera.preset_recall(index).await,
            Command::PresetSet { index } => camera.preset_set(index).await,
            Command::Home => camera.home().await,
            Command::Autofocus => camera.autofocus().await,
            Command::Exposure { adjust } => match adjust {
                ExposureAdjust::IrisUp => camera.iris_up().await,
                ExposureAdjust::IrisDown => camera.iris_down().await,
                ExposureAdjust::BrightUp => camera.bright_up().await,
                ExposureAdjust::BrightDown => camera.bright_down().await,
                ExposureAdjust::GainUp => camera.gain_up().await,
                ExposureAdjust::GainDown => camera.gain_down().await,
                ExposureAdjust::ApertureUp => camera.aperture_up().await,
                ExposureAdjust::ApertureDown => camera.aperture_down().await,
            },
            Command::Power { on } => camera.power(on).await,
            Command::ResetPort => camera.reset_port().await,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PanLeft { speed } => write!(f, "pan_left({})", speed),
            Command::PanRight { speed } => write!(f, "pan_right({})", speed),
            Command::TiltUp { speed } => write!(f, "tilt_up({})", speed),
            Command::TiltDown { speed } => write!(f, "tilt_down({})", speed),
            Command::PanRelative { step, speed } => write!(f, "pan_relative({}, {})", step, speed),
            Command::TiltRelative { step, speed } => {
                write!(f, "tilt_relative({}, {})", step, speed)
            }
            Command::ZoomIn { speed } => write!(f, "zoom_in({})", speed),
            Command::ZoomOut { speed } => write!(f, "zoom_out({})", speed),
            Command::Stop => f.write_str("stop()"),
            Command::ZoomStop => f.write_str("zoom_stop()"),
            Command::PresetRecall { index } => write!(f, "preset_recall({})", index),
            Command::PresetSet { index } => write!(f, "preset_set({})", index),
            Command::Home => f.write_str("home()"),
            Command::Autofocus => f.write_str("autofocus()"),
            Command::Exposure { adjust } => write!(f, "{}()", adjust),
            Command::Power { on } => write!(f, "power({})", on),
            Command::ResetPort => f.write_str("reset_port()"),
        }
    }
}

/// PTZ camera transport.
///
/// Each primitive either completes or returns an error:
/// [`TransportSend`](crate::error::PtzBridgeError::TransportSend) when only
/// that command failed, [`TransportLink`](crate::error::PtzBridgeError::TransportLink)
/// when the connection is gone.
#[async_trait]
pub trait PtzCamera: Send {
    async fn pan_left(&mut self, speed: u8) -> Result<()>;
    async fn pan_right(&mut self, speed: u8) -> Result<()>;
    async fn tilt_up(&mut self, speed: u8) -> Result<()>;
    async fn tilt_down(&mut self, speed: u8) -> Result<()>;
    async fn pan_relative(&mut self, step: i16, speed: u8) -> Result<()>;
    async fn tilt_relative(&mut self, step: i16, speed: u8) -> Result<()>;
    async fn zoom_in(&mut self, speed: u8) -> Result<()>;
    async fn zoom_out(&mut self, speed: u8) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
    async fn zoom_stop(&mut self) -> Result<()>;
    async fn preset_recall(&mut self, index: u8) -> Result<()>;
    async fn preset_set(&mut self, index: u8) -> Result<()>;
    async fn home(&mut self) -> Result<()>;
    async fn autofocus(&mut self) -> Result<()>;
    async fn iris_up(&mut self) -> Result<()>;
    async fn iris_down(&mut self) -> Result<()>;
    async fn bright_up(&mut self) -> Result<()>;
    async fn bright_down(&mut self) -> Result<()>;
    async fn gain_up(&mut self) -> Result<()>;
    async fn gain_down(&mut self) -> Result<()>;
    async fn aperture_up(&mut self) -> Result<()>;
    async fn aperture_down(&mut self) -> Result<()>;
    async fn power(&mut self, on: bool) -> Result<()>;

    /// Queries whether the camera is powered on.
    async fn get_power(&mut self) -> Result<bool>;

    /// Reopens the transport and clears the camera's command buffers.
    async fn reset_port(&mut self) -> Result<()>;
}

#[cfg(test)]
pub mod mocks {
    //! Recording camera for dispatcher and bridge tests.

    use super::*;
    use crate::error::PtzBridgeError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Camera that records every call by name and can be told to fail.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingCamera {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub failures: Arc<Mutex<VecDeque<PtzBridgeError>>>,
        pub powered: Arc<Mutex<Option<bool>>>,
    }

    impl RecordingCamera {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_power(on: bool) -> Self {
            let camera = Self::default();
            *camera.powered.lock().unwrap() = Some(on);
            camera
        }

        /// Makes the next call fail with `err`.
        pub fn fail_next(&self, err: PtzBridgeError) {
            self.failures.lock().unwrap().push_back(err);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn call(&self, name: String) -> Result<()> {
            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            self.calls.lock().unwrap().push(name);
            Ok(())
        }
    }

    #[async_trait]
    impl PtzCamera for RecordingCamera {
        async fn pan_left(&mut self, speed: u8) -> Result<()> {
            self.call(format!("pan_left({})", speed))
        }
        async fn pan_right(&mut self, speed: u8) -> Result<()> {
            self.call(format!("pan_right({})", speed))
        }
        async fn tilt_up(&mut self, speed: u8) -> Result<()> {
            self.call(format!("tilt_up({})", speed))
        }
        async fn tilt_down(&mut self, speed: u8) -> Result<()> {
            self.call(format!("tilt_down({})", speed))
        }
        async fn pan_relative(&mut self, step: i16, speed: u8) -> Result<()> {
            self.call(format!("pan_relative({}, {})", step, speed))
        }
        async fn tilt_relative(&mut self, step: i16, speed: u8) -> Result<()> {
            self.call(format!("tilt_relative({}, {})", step, speed))
        }
        async fn zoom_in(&mut self, speed: u8) -> Result<()> {
            self.call(format!("zoom_in({})", speed))
        }
        async fn zoom_out(&mut self, speed: u8) -> Result<()> {
            self.call(format!("zoom_out({})", speed))
        }
        async fn stop(&mut self) -> Result<()> {
            self.call("stop()".into())
        }
        async fn zoom_stop(&mut self) -> Result<()> {
            self.call("zoom_stop()".into())
        }
        async fn preset_recall(&mut self, index: u8) -> Result<()> {
            self.call(format!("preset_recall({})", index))
        }
        async fn preset_set(&mut self, index: u8) -> Result<()> {
            self.call(format!("preset_set({})", index))
        }
        async fn home(&mut self) -> Result<()> {
            self.call("home()".into())
        }
        async fn autofocus(&mut self) -> Result<()> {
            self.call("autofocus()".into())
        }
        async fn iris_up(&mut self) -> Result<()> {
            self.call("iris_up()".into())
        }
        async fn iris_down(&mut self) -> Result<()> {
            self.call("iris_down()".into())
        }
        async fn bright_up(&mut self) -> Result<()> {
            self.call("bright_up()".into())
        }
        async fn bright_down(&mut self) -> Result<()> {
            self.call("bright_down()".into())
        }
        async fn gain_up(&mut self) -> Result<()> {
            self.call("gain_up()".into())
        }
        async fn gain_down(&mut self) -> Result<()> {
            self.call("gain_down()".into())
        }
        async fn aperture_up(&mut self) -> Result<()> {
            self.call("aperture_up()".into())
        }
        async fn aperture_down(&mut self) -> Result<()> {
            self.call("aperture_down()".into())
        }
        async fn power(&mut self, on: bool) -> Result<()> {
            self.call(format!("power({})", on))?;
            *self.powered.lock().unwrap() = Some(on);
            Ok(())
        }
        async fn get_power(&mut self) -> Result<bool> {
            if let Some(err) = self.failures.lock().unwrap().pop_front() {
                return Err(err);
            }
            self.powered
                .lock()
                .unwrap()
                .ok_or_else(|| PtzBridgeError::Protocol("no power reply".into()))
        }
        async fn reset_port(&mut self) -> Result<()> {
            self.call("reset_port()".into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::RecordingCamera;
    use super::*;

    #[test]
    fn test_display_names_parameters() {
        assert_eq!(Command::PanLeft { speed: 7 }.to_string(), "pan_left(7)");
        assert_eq!(
            Command::PanRelative { step: -8, speed: 4 }.to_string(),
            "pan_relative(-8, 4)"
        );
        assert_eq!(Command::PresetRecall { index: 12 }.to_string(), "preset_recall(12)");
        assert_eq!(
            Command::Exposure { adjust: ExposureAdjust::GainDown }.to_string(),
            "gain_down()"
        );
        assert_eq!(Command::Power { on: false }.to_string(), "power(false)");
    }

    #[test]
    fn test_categories() {
        assert_eq!(Command::Stop.category(), Category::Movement);
        assert_eq!(Command::ZoomIn { speed: 3 }.category(), Category::Zoom);
        assert_eq!(Command::ZoomStop.category(), Category::Zoom);
        assert_eq!(Command::Home.category(), Category::Discrete);
        assert_eq!(Command::PresetSet { index: 0 }.category(), Category::Discrete);
        assert_eq!(
            Command::Exposure { adjust: ExposureAdjust::IrisUp }.category(),
            Category::Discrete
        );
        assert_eq!(Command::ResetPort.category(), Category::Power);
    }

    #[test]
    fn test_serializes_with_name_tag() {
        let json = serde_json::to_value(Command::TiltRelative { step: 5, speed: 2 }).unwrap();
        assert_eq!(json["name"], "tilt_relative");
        assert_eq!(json["step"], 5);
        assert_eq!(json["speed"], 2);

        let json = serde_json::to_value(Command::Exposure {
            adjust: ExposureAdjust::BrightUp,
        })
        .unwrap();
        assert_eq!(json["name"], "exposure");
        assert_eq!(json["adjust"], "bright_up");
    }

    #[tokio::test]
    async fn test_execute_calls_matching_primitive() {
        let mut camera = RecordingCamera::new();
        let commands = [
            Command::PanRight { speed: 14 },
            Command::ZoomOut { speed: 1 },
            Command::Home,
            Command::Autofocus,
            Command::Exposure { adjust: ExposureAdjust::ApertureUp },
            Command::Power { on: true },
            Command::ResetPort,
        ];
        for command in commands {
            command.execute(&mut camera).await.unwrap();
        }
        assert_eq!(
            camera.calls(),
            vec![
                "pan_right(14)",
                "zoom_out(1)",
                "home()",
                "autofocus()",
                "aperture_up()",
                "power(true)",
                "reset_port()"
            ]
        );
    }
}
