use anyhow::{Context, Result};
use jack::Client;
use log::{debug, error};

use crate::audio::ports::Ports;
use crate::engine::Engine;

pub struct NotificationHandler;

pub struct ProcessHandler {
    ports: Ports,
    engine: Engine,
}

impl jack::NotificationHandler for NotificationHandler {
    fn sample_rate(&mut self, _: &Client, sample_rate: jack::Frames) -> jack::Control {
        debug!(">> JACK sample_rate changed to {sample_rate}");

        jack::Control::Continue
    }

    fn xrun(&mut self, _: &Client) -> jack::Control {
        debug!(">> JACK xrun");

        jack::Control::Continue
    }
}

impl ProcessHandler {
    pub fn new(client: &Client, engine: Engine) -> Result<Self> {
        let ports = Ports::new(client).context("failed to create audio ports")?;
        Ok(Self { ports, engine })
    }
}

impl jack::ProcessHandler for ProcessHandler {
    fn process(&mut self, client: &jack::Client, ps: &jack::ProcessScope) -> jack::Control {
        // A graph rate change does not always come with a buffer_size call.
        let sample_rate = client.sample_rate() as f32;
        if self.engine.sample_rate() != Some(sample_rate) {
            let frames = client.buffer_size() as usize;
            if self.engine.update_stream(sample_rate, frames).is_err() {
                self.ports.silence_output(ps);
                return jack::Control::Quit;
            }
        }

        let (inputs, mut outputs) = self.ports.buffers(ps);
        self.engine.process(&inputs, &mut outputs);
        jack::Control::Continue
    }

    fn buffer_size(&mut self, client: &jack::Client, frames: jack::Frames) -> jack::Control {
        debug!(">> JACK buffer_size changed to {frames} frames");

        let sample_rate = client.sample_rate() as f32;
        if let Err(e) = self.engine.update_stream(sample_rate, frames as usize) {
            error!("Failed to re-prepare for {sample_rate} Hz, {frames} frames: {e:#}");
            return jack::Control::Quit;
        }

        jack::Control::Continue
    }
}
