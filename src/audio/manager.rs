use anyhow::{Context, Result};
use jack::{AsyncClient, Client, ClientOptions};
use log::{error, info, warn};
use std::sync::Arc;

use crate::audio::CLIENT_NAME;
use crate::audio::jack::{NotificationHandler, ProcessHandler};
use crate::audio::ports::{INPUT_LEFT, INPUT_RIGHT, OUTPUT_LEFT, OUTPUT_RIGHT};
use crate::buffer::MAX_CHANNELS;
use crate::engine::{Engine, EngineHandle};
use crate::params::ParameterStore;
use crate::settings::AudioSettings;

pub struct Manager {
    active_client: AsyncClient<NotificationHandler, ProcessHandler>,
    engine_handle: EngineHandle,
}

impl Manager {
    pub fn new(settings: &AudioSettings, store: Arc<ParameterStore>) -> Result<Self> {
        let (client, _) = Client::new(CLIENT_NAME, ClientOptions::NO_START_SERVER)
            .context("failed to create JACK client")?;

        let sample_rate = client.sample_rate();
        let buffer_size = client.buffer_size() as usize;
        info!("JACK running at {sample_rate} Hz, {buffer_size} frames");

        let (engine, engine_handle) =
            Engine::new(store, sample_rate as f32, buffer_size, MAX_CHANNELS)?;
        let jack_handler =
            ProcessHandler::new(&client, engine).context("failed to create process handler")?;

        let active_client = client
            .activate_async(NotificationHandler, jack_handler)
            .context("failed to activate async client")?;

        let manager = Self {
            active_client,
            engine_handle,
        };
        manager.connect_ports(settings);

        Ok(manager)
    }

    /// Connect audio ports based on settings. Failures are logged, not fatal.
    fn connect_ports(&self, settings: &AudioSettings) {
        let client = self.active_client.as_client();
        let own = |port: &str| format!("{CLIENT_NAME}:{port}");

        let connections = [
            (settings.input_left_port.clone(), own(INPUT_LEFT)),
            (settings.input_right_port.clone(), own(INPUT_RIGHT)),
            (own(OUTPUT_LEFT), settings.output_left_port.clone()),
            (own(OUTPUT_RIGHT), settings.output_right_port.clone()),
        ];

        for (source, destination) in &connections {
            if source.is_empty() || destination.is_empty() {
                continue;
            }
            if let Err(e) = client.connect_ports_by_name(source, destination) {
                warn!("Failed to connect '{source}' -> '{destination}': {e}");
            } else {
                info!("Connected {source} -> {destination}");
            }
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine_handle
    }

    /// Disconnect all audio connections
    pub fn disconnect_all(&self) {
        let client = self.active_client.as_client();

        for port_name in [INPUT_LEFT, INPUT_RIGHT, OUTPUT_LEFT, OUTPUT_RIGHT] {
            let full_name = format!("{CLIENT_NAME}:{port_name}");
            if let Some(port) = client.port_by_name(&full_name) {
                client.disconnect(&port).unwrap_or_else(|e| {
                    error!("Failed to disconnect {port_name}: {e}");
                });
            }
        }
    }

    /// Get available input ports
    pub fn get_available_inputs(&self) -> Vec<String> {
        self.available_ports(jack::PortFlags::IS_OUTPUT)
    }

    /// Get available output ports
    pub fn get_available_outputs(&self) -> Vec<String> {
        self.available_ports(jack::PortFlags::IS_INPUT)
    }

    fn available_ports(&self, flags: jack::PortFlags) -> Vec<String> {
        let own_prefix = format!("{CLIENT_NAME}:");
        self.active_client
            .as_client()
            .ports(None, Some("audio"), flags)
            .into_iter()
            .filter(|p| !p.starts_with(&own_prefix))
            .collect()
    }

    pub fn sample_rate(&self) -> usize {
        self.active_client.as_client().sample_rate() as usize
    }

    pub fn buffer_size(&self) -> usize {
        self.active_client.as_client().buffer_size() as usize
    }
}
