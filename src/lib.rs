// Enable pedantic lints globally, then allow the noisy ones we're not fixing.
#![warn(clippy::pedantic, clippy::nursery)]
// Not a public API, adding #[must_use] everywhere is noise
#![allow(clippy::must_use_candidate, clippy::return_self_not_must_use)]
// DSP variable names (lp1 vs hp1, etc.) are intentionally similar
#![allow(clippy::similar_names)]
// Audio code performs intentional casts
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::cast_possible_wrap
)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(
    clippy::module_name_repetitions,
    clippy::doc_markdown,
    clippy::float_cmp,
    clippy::match_same_arms,
    clippy::struct_field_names,
    clippy::needless_pass_by_value,
    clippy::suboptimal_flops
)]
#![allow(clippy::redundant_pub_crate, clippy::significant_drop_tightening)]

pub mod atomic;
pub mod audio;
pub mod buffer;
pub mod control;
pub mod dsp;
pub mod engine;
pub mod params;
pub mod preset;
pub mod processor;
pub mod render;
pub mod settings;
