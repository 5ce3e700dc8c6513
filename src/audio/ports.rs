use anyhow::{Context, Result};
use jack::{AudioIn, AudioOut, Client, Port, ProcessScope};

pub const INPUT_LEFT: &str = "in_left";
pub const INPUT_RIGHT: &str = "in_right";
pub const OUTPUT_LEFT: &str = "out_left";
pub const OUTPUT_RIGHT: &str = "out_right";

/// Stereo in, stereo out.
pub struct Ports {
    input_left: Port<AudioIn>,
    input_right: Port<AudioIn>,
    output_left: Port<AudioOut>,
    output_right: Port<AudioOut>,
}

impl Ports {
    pub fn new(client: &Client) -> Result<Self> {
        Ok(Self {
            input_left: client
                .register_port(INPUT_LEFT, AudioIn::default())
                .context("failed to register in port left")?,
            input_right: client
                .register_port(INPUT_RIGHT, AudioIn::default())
                .context("failed to register in port right")?,
            output_left: client
                .register_port(OUTPUT_LEFT, AudioOut::default())
                .context("failed to register out port left")?,
            output_right: client
                .register_port(OUTPUT_RIGHT, AudioOut::default())
                .context("failed to register out port right")?,
        })
    }

    /// Input and output slices for this cycle.
    pub fn buffers<'a>(&'a mut self, ps: &'a ProcessScope) -> ([&'a [f32]; 2], [&'a mut [f32]; 2]) {
        (
            [self.input_left.as_slice(ps), self.input_right.as_slice(ps)],
            [
                self.output_left.as_mut_slice(ps),
                self.output_right.as_mut_slice(ps),
            ],
        )
    }

    pub fn silence_output(&mut self, ps: &ProcessScope) {
        self.output_left.as_mut_slice(ps).fill(0.0);
        self.output_right.as_mut_slice(ps).fill(0.0);
    }
}
