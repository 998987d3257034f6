//! # VISCA Camera
//!
//! [`PtzCamera`] implementation that writes VISCA packets to a serial port.
//!
//! Commands are sent without waiting for the camera's acknowledgement; the
//! dispatch loop's rate limit keeps the camera's two command sockets from
//! overflowing. Only the power inquiry reads a reply.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::decoder::{decode_power_reply, decode_reply, Reply, ReplyBuffer};
use super::encoder::*;
use super::protocol::*;
use crate::dispatch::bindings::ExposureAdjust;
use crate::dispatch::command::PtzCamera;
use crate::error::{PtzBridgeError, Result};
use crate::serial::SerialPortIO;

/// Camera reached through a [`SerialPortIO`]
pub struct ViscaCamera<P: SerialPortIO> {
    port: P,
    address: CameraAddress,
    reply_timeout: Duration,
    replies: ReplyBuffer,
}

impl<P: SerialPortIO> std::fmt::Debug for ViscaCamera<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViscaCamera")
            .field("address", &self.address)
            .field("reply_timeout", &self.reply_timeout)
            .finish_non_exhaustive()
    }
}

impl<P: SerialPortIO> ViscaCamera<P> {
    /// Wrap an open port
    ///
    /// # Arguments
    ///
    /// * `port` - Open serial port
    /// * `address` - Camera address on the chain
    /// * `reply_timeout` - How long inquiries wait for an answer
    pub fn new(port: P, address: CameraAddress, reply_timeout: Duration) -> Self {
        Self {
            port,
            address,
            reply_timeout,
            replies: ReplyBuffer::new(),
        }
    }

    pub fn address(&self) -> CameraAddress {
        self.address
    }

    async fn send(&mut self, command: &str, packet: &[u8]) -> Result<()> {
        self.port
            .write_all(packet)
            .await
            .map_err(|e| PtzBridgeError::from_write_error(command, &e))?;
        self.port
            .flush()
            .await
            .map_err(|e| PtzBridgeError::from_write_error(command, &e))?;
        debug!("Sent {} ({:02X?})", command, packet);
        Ok(())
    }

    /// Read until a reply for this camera that is not an ACK arrives.
    async fn read_reply(&mut self, command: &str) -> Result<Reply> {
        let mut buf = [0u8; VISCA_MAX_PACKET_SIZE];
        loop {
            while let Some(frame) = self.replies.next_frame() {
                match decode_reply(self.address, &frame) {
                    Ok(Reply::Ack { .. }) => continue,
                    Ok(reply) => return Ok(reply),
                    Err(e) => debug!("Skipping frame {:02X?}: {}", frame.as_ref(), e),
                }
            }
            let n = self
                .port
                .read(&mut buf)
                .await
                .map_err(|e| PtzBridgeError::from_write_error(command, &e))?;
            if n == 0 {
                return Err(PtzBridgeError::TransportLink(format!(
                    "{}: serial port closed",
                    command
                )));
            }
            self.replies.extend(&buf[..n]);
        }
    }
}

#[async_trait]
impl<P: SerialPortIO> PtzCamera for ViscaCamera<P> {
    async fn pan_left(&mut self, speed: u8) -> Result<()> {
        let packet = encode_pan(self.address, speed, DRIVE_LEFT);
        self.send(&format!("pan_left({})", speed), &packet).await
    }

    async fn pan_right(&mut self, speed: u8) -> Result<()> {
        let packet = encode_pan(self.address, speed, DRIVE_RIGHT);
        self.send(&format!("pan_right({})", speed), &packet).await
    }

    async fn tilt_up(&mut self, speed: u8) -> Result<()> {
        let packet = encode_tilt(self.address, speed, DRIVE_UP);
        self.send(&format!("tilt_up({})", speed), &packet).await
    }

    async fn tilt_down(&mut self, speed: u8) -> Result<()> {
        let packet = encode_tilt(self.address, speed, DRIVE_DOWN);
        self.send(&format!("tilt_down({})", speed), &packet).await
    }

    async fn pan_relative(&mut self, step: i16, speed: u8) -> Result<()> {
        let packet = encode_relative_move(self.address, step, 0, speed, TILT_SPEED_MIN);
        self.send(&format!("pan_relative({}, {})", step, speed), &packet)
            .await
    }

    async fn tilt_relative(&mut self, step: i16, speed: u8) -> Result<()> {
        let packet = encode_relative_move(self.address, 0, step, PAN_SPEED_MIN, speed);
        self.send(&format!("tilt_relative({}, {})", step, speed), &packet)
            .await
    }

    async fn zoom_in(&mut self, speed: u8) -> Result<()> {
        let packet = encode_zoom_tele(self.address, speed);
        self.send(&format!("zoom_in({})", speed), &packet).await
    }

    async fn zoom_out(&mut self, speed: u8) -> Result<()> {
        let packet = encode_zoom_wide(self.address, speed);
        self.send(&format!("zoom_out({})", speed), &packet).await
    }

    async fn stop(&mut self) -> Result<()> {
        let packet = encode_pan_tilt_stop(self.address);
        self.send("stop()", &packet).await
    }

    async fn zoom_stop(&mut self) -> Result<()> {
        let packet = encode_zoom_stop(self.address);
        self.send("zoom_stop()", &packet).await
    }

    async fn preset_recall(&mut self, index: u8) -> Result<()> {
        let packet = encode_preset_recall(self.address, index);
        self.send(&format!("preset_recall({})", index), &packet).await
    }

    async fn preset_set(&mut self, index: u8) -> Result<()> {
        let packet = encode_preset_set(self.address, index);
        self.send(&format!("preset_set({})", index), &packet).await
    }

    async fn home(&mut self) -> Result<()> {
        let packet = encode_home(self.address);
        self.send("home()", &packet).await
    }

    async fn autofocus(&mut self) -> Result<()> {
        let packet = encode_autofocus(self.address);
        self.send("autofocus()", &packet).await
    }

    async fn iris_up(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::IrisUp);
        self.send("iris_up()", &packet).await
    }

    async fn iris_down(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::IrisDown);
        self.send("iris_down()", &packet).await
    }

    async fn bright_up(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::BrightUp);
        self.send("bright_up()", &packet).await
    }

    async fn bright_down(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::BrightDown);
        self.send("bright_down()", &packet).await
    }

    async fn gain_up(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::GainUp);
        self.send("gain_up()", &packet).await
    }

    async fn gain_down(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::GainDown);
        self.send("gain_down()", &packet).await
    }

    async fn aperture_up(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::ApertureUp);
        self.send("aperture_up()", &packet).await
    }

    async fn aperture_down(&mut self) -> Result<()> {
        let packet = encode_exposure(self.address, ExposureAdjust::ApertureDown);
        self.send("aperture_down()", &packet).await
    }

    async fn power(&mut self, on: bool) -> Result<()> {
        let packet = encode_power(self.address, on);
        self.send(&format!("power({})", on), &packet).await
    }

    async fn get_power(&mut self) -> Result<bool> {
        const COMMAND: &str = "get_power()";

        if let Err(e) = self.port.clear_input() {
            warn!("Could not clear serial input: {}", e);
        }
        self.replies.clear();
        self.send(COMMAND, &encode_power_inquiry(self.address)).await?;

        let wait = self.reply_timeout;
        let reply = timeout(wait, self.read_reply(COMMAND))
            .await
            .map_err(|_| PtzBridgeError::TransportSend {
                command: COMMAND.to_string(),
                reason: format!("no reply within {:?}", wait),
            })??;

        let powered = decode_power_reply(&reply)?;
        info!("Camera reports power {}", if powered { "on" } else { "off" });
        Ok(powered)
    }

    async fn reset_port(&mut self) -> Result<()> {
        self.port
            .reopen()
            .await
            .map_err(|e| PtzBridgeError::TransportLink(format!("reset_port() failed: {}", e)))?;
        self.replies.clear();
        self.send("reset_port()", &encode_if_clear(self.address)).await
    }
}
