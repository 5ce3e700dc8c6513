use anyhow::Result;
use std::f32::consts::PI;
use std::sync::Arc;
use triband::buffer::AudioBuffer;
use triband::dsp::biquad::{FilterType, LinkwitzRiley};
use triband::dsp::common::lin_to_db;
use triband::dsp::crossover::effective_frequencies;
use triband::params::{Band, ParamId, ParameterStore};
use triband::processor::{Processor, resolve_audible};

fn noise(len: usize, seed: u32) -> Vec<f32> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5
        })
        .collect()
}

fn sine(len: usize, freq: f32, amplitude: f32, sample_rate: f32) -> Vec<f32> {
    (0..len)
        .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin() * amplitude)
        .collect()
}

fn rms(samples: &[f32]) -> f32 {
    let sum: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum / samples.len() as f64).sqrt() as f32
}

/// Runs `channels` through the processor in blocks of `block`.
fn run(processor: &mut Processor, channels: &[Vec<f32>], block: usize) -> Vec<Vec<f32>> {
    let len = channels[0].len();
    let mut output = vec![Vec::with_capacity(len); channels.len()];
    let mut offset = 0;
    while offset < len {
        let end = (offset + block).min(len);
        let slices: Vec<&[f32]> = channels.iter().map(|c| &c[offset..end]).collect();
        let mut buffer = AudioBuffer::from_channels(&slices);
        processor.process(&mut buffer);
        for (ch, out) in output.iter_mut().enumerate() {
            out.extend_from_slice(buffer.channel(ch));
        }
        offset = end;
    }
    output
}

fn bypassed_processor(
    sample_rate: f32,
    block: usize,
    channels: usize,
    low_mid: f32,
    mid_high: f32,
) -> Result<Processor> {
    let store = Arc::new(ParameterStore::new());
    store.set_global_bypass(true);
    store.set(ParamId::LowMidCrossover, low_mid);
    store.set(ParamId::MidHighCrossover, mid_high);
    let mut processor = Processor::new(store);
    processor.prepare(sample_rate, block, channels)?;
    Ok(processor)
}

fn allpass_reference(input: &[f32], low_mid: f32, mid_high: f32, sample_rate: f32) -> Vec<f32> {
    let (low_mid, mid_high) = effective_frequencies(low_mid, mid_high, sample_rate);
    let mut ap1 = LinkwitzRiley::new(FilterType::Allpass, low_mid, sample_rate);
    let mut ap2 = LinkwitzRiley::new(FilterType::Allpass, mid_high, sample_rate);
    input.iter().map(|&x| ap2.process(ap1.process(x))).collect()
}

#[test]
fn bypassed_bands_reconstruct_the_allpass_response() -> Result<()> {
    for (sample_rate, block) in [(44_100.0, 64), (48_000.0, 512), (96_000.0, 37)] {
        let mut processor = bypassed_processor(sample_rate, block, 2, 400.0, 4000.0)?;
        let left = noise(20_000, 1);
        let right = noise(20_000, 2);
        let output = run(&mut processor, &[left.clone(), right.clone()], block);

        for (input, out) in [(&left, &output[0]), (&right, &output[1])] {
            let reference = allpass_reference(input, 400.0, 4000.0, sample_rate);
            for (i, (&o, &r)) in out.iter().zip(&reference).enumerate() {
                assert!(
                    (o - r).abs() < 1e-4,
                    "{sample_rate} Hz / {block}: sample {i} {o} vs {r}"
                );
            }
            let ratio_db = lin_to_db(rms(out)) - lin_to_db(rms(input));
            assert!(ratio_db.abs() < 0.1, "level changed by {ratio_db} dB");
        }
    }
    Ok(())
}

#[test]
fn reconstruction_holds_at_extreme_crossovers() -> Result<()> {
    let sample_rate = 48_000.0;
    let mut processor = bypassed_processor(sample_rate, 256, 1, 20.0, 20_000.0)?;
    let input = noise(20_000, 7);
    let output = run(&mut processor, &[input.clone()], 256);
    let reference = allpass_reference(&input, 20.0, 20_000.0, sample_rate);
    for (&o, &r) in output[0].iter().zip(&reference) {
        assert!((o - r).abs() < 1e-3);
    }
    Ok(())
}

#[test]
fn bypassed_sine_keeps_its_level() -> Result<()> {
    let sample_rate = 48_000.0;
    let mut processor = bypassed_processor(sample_rate, 480, 2, 400.0, 4000.0)?;
    let amplitude = 10f32.powf(-6.0 / 20.0);
    let input = sine(48_000, 1000.0, amplitude, sample_rate);
    let output = run(&mut processor, &[input.clone(), input.clone()], 480);

    // Skip the first 100 ms, then compare whole periods.
    let diff = lin_to_db(rms(&output[0][4800..])) - lin_to_db(rms(&input[4800..]));
    assert!(diff.abs() < 0.1, "1 kHz level changed by {diff} dB");
    Ok(())
}

#[test]
fn solo_and_mute_select_audible_bands() -> Result<()> {
    let sample_rate = 48_000.0;
    let tones = [(Band::Low, 100.0), (Band::Mid, 1200.0), (Band::High, 12_000.0)];

    for combo in 0..64u32 {
        let mute = [combo & 1 != 0, combo & 2 != 0, combo & 4 != 0];
        let solo = [combo & 8 != 0, combo & 16 != 0, combo & 32 != 0];
        let audible = resolve_audible(mute, solo);
        let any_solo = solo.iter().any(|&s| s);

        for band in Band::ALL {
            let expected = if any_solo {
                solo[band.index()]
            } else {
                !mute[band.index()]
            };
            assert_eq!(audible[band.index()], expected);
        }

        for &(band, freq) in &tones {
            let store = Arc::new(ParameterStore::new());
            store.set(ParamId::LowMidCrossover, 400.0);
            store.set(ParamId::MidHighCrossover, 4000.0);
            for b in Band::ALL {
                store.set_bool(b.keys().mute, mute[b.index()]);
                store.set_bool(b.keys().solo, solo[b.index()]);
            }
            let mut processor = Processor::new(store);
            processor.prepare(sample_rate, 256, 1)?;

            let input = sine(9600, freq, 0.5, sample_rate);
            let output = run(&mut processor, &[input.clone()], 256);
            let energy = rms(&output[0][4800..]) / rms(&input[4800..]);

            if audible[band.index()] {
                assert!(energy > 0.7, "combo {combo:06b}: {band} tone lost ({energy})");
            } else {
                assert!(energy < 0.05, "combo {combo:06b}: {band} tone leaked ({energy})");
            }
        }
    }
    Ok(())
}

#[test]
fn unmuting_resumes_exactly_where_an_unmuted_run_would_be() -> Result<()> {
    let sample_rate = 48_000.0;
    let block = 128;
    let input = sine(48_000, 1000.0, 1.0, sample_rate);

    let make = || -> Result<(Arc<ParameterStore>, Processor)> {
        let store = Arc::new(ParameterStore::new());
        store.set(Band::Mid.keys().threshold, -30.0);
        store.set(Band::Mid.keys().ratio, 4.0);
        let mut processor = Processor::new(Arc::clone(&store));
        processor.prepare(sample_rate, block, 1)?;
        Ok((store, processor))
    };
    let (_, mut reference) = make()?;
    let (store, mut muted) = make()?;

    let mute_until = 188 * block;
    let mut ref_out = Vec::new();
    let mut muted_out = Vec::new();
    for (i, chunk) in input.chunks(block).enumerate() {
        store.set_bool(Band::Mid.keys().mute, i * block < mute_until);

        let mut a = AudioBuffer::from_channels(&[chunk]);
        reference.process(&mut a);
        ref_out.extend_from_slice(a.channel(0));

        let mut b = AudioBuffer::from_channels(&[chunk]);
        muted.process(&mut b);
        muted_out.extend_from_slice(b.channel(0));
    }

    // Muting only ever removes energy.
    assert!(rms(&muted_out[4800..mute_until]) < rms(&ref_out[4800..mute_until]));
    // The envelope kept running, so the outputs match bit for bit once unmuted.
    assert_eq!(&muted_out[mute_until..], &ref_out[mute_until..]);
    Ok(())
}

#[test]
fn bypass_ignores_threshold_and_ratio_changes() -> Result<()> {
    let sample_rate = 48_000.0;
    let block = 64;
    let input = noise(16_384, 11);

    let mut steady = bypassed_processor(sample_rate, block, 1, 400.0, 4000.0)?;
    let expected = run(&mut steady, &[input.clone()], block);

    let store = Arc::new(ParameterStore::new());
    store.set_global_bypass(true);
    store.set(ParamId::LowMidCrossover, 400.0);
    store.set(ParamId::MidHighCrossover, 4000.0);
    let mut moving = Processor::new(Arc::clone(&store));
    moving.prepare(sample_rate, block, 1)?;

    let mut output = Vec::new();
    for (i, chunk) in input.chunks(block).enumerate() {
        for band in Band::ALL {
            store.set(band.keys().threshold, -60.0 + (i % 7) as f32 * 10.0);
            store.set(band.keys().ratio, (i % 15) as f32);
        }
        let mut buffer = AudioBuffer::from_channels(&[chunk]);
        moving.process(&mut buffer);
        output.extend_from_slice(buffer.channel(0));
    }

    assert_eq!(output, expected[0]);
    Ok(())
}

#[test]
fn mid_band_reports_expected_gain_reduction() -> Result<()> {
    let sample_rate = 48_000.0;
    let store = Arc::new(ParameterStore::new());
    store.set(ParamId::LowMidCrossover, 400.0);
    store.set(ParamId::MidHighCrossover, 4000.0);
    let mid = Band::Mid.keys();
    store.set(mid.threshold, -20.0);
    store.set(mid.ratio, 4.0); // 4:1
    store.set(mid.attack, 10.0);
    store.set(mid.release, 100.0);

    let mut processor = Processor::new(Arc::clone(&store));
    processor.prepare(sample_rate, 512, 2)?;
    let meters = processor.meters();

    let input = sine(48_000, 1000.0, 1.0, sample_rate);
    run(&mut processor, &[input.clone(), input], 512);

    let reading = meters.reading(Band::Mid);
    assert!(
        (13.5..16.0).contains(&reading.gain_reduction_db),
        "gain reduction {}",
        reading.gain_reduction_db
    );
    assert!(reading.output_db < reading.input_db);
    assert!(meters.reading(Band::Low).gain_reduction_db < 0.01);
    Ok(())
}

#[test]
fn crossover_points_stay_ordered() -> Result<()> {
    let store = Arc::new(ParameterStore::new());
    store.set(ParamId::LowMidCrossover, 999.0);
    store.set(ParamId::MidHighCrossover, 1000.0);
    let mut processor = Processor::new(Arc::clone(&store));
    processor.prepare(8000.0, 64, 1)?;

    let mut buffer = AudioBuffer::new(1, 64);
    processor.process(&mut buffer);
    let (low_mid, mid_high) = processor.crossover_frequencies().unwrap_or_default();
    assert!(mid_high > low_mid);

    store.set(ParamId::MidHighCrossover, 20_000.0);
    processor.process(&mut buffer);
    let (low_mid, mid_high) = processor.crossover_frequencies().unwrap_or_default();
    assert!(mid_high > low_mid);
    assert!(mid_high <= 8000.0 * 0.49);
    Ok(())
}

#[test]
fn oversized_blocks_match_prepared_size_blocks() -> Result<()> {
    let sample_rate = 44_100.0;
    let input = noise(4000, 3);

    let make = || -> Result<Processor> {
        let store = Arc::new(ParameterStore::new());
        store.set(Band::High.keys().threshold, -30.0);
        store.set(ParamId::InputGain, 6.0);
        let mut processor = Processor::new(store);
        processor.prepare(sample_rate, 64, 1)?;
        Ok(processor)
    };

    let mut chunked = make()?;
    let one_call = run(&mut chunked, &[input.clone()], input.len());
    let mut blocked = make()?;
    let many_calls = run(&mut blocked, &[input], 64);

    assert_eq!(one_call, many_calls);
    Ok(())
}

#[test]
fn prepare_again_starts_from_clean_state() -> Result<()> {
    let sample_rate = 48_000.0;
    let store = Arc::new(ParameterStore::new());
    let mut used = Processor::new(Arc::clone(&store));
    used.prepare(sample_rate, 128, 1)?;
    run(&mut used, &[noise(4096, 5)], 128);
    used.prepare(sample_rate, 128, 1)?;

    let mut fresh = Processor::new(store);
    fresh.prepare(sample_rate, 128, 1)?;

    let impulse: Vec<f32> = (0..512).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect();
    assert_eq!(
        run(&mut used, &[impulse.clone()], 128),
        run(&mut fresh, &[impulse], 128)
    );
    Ok(())
}

#[test]
fn trims_scale_the_output() -> Result<()> {
    let sample_rate = 48_000.0;
    let input = sine(9600, 1000.0, 0.25, sample_rate);

    let mut unity = bypassed_processor(sample_rate, 480, 1, 400.0, 4000.0)?;
    let base = run(&mut unity, &[input.clone()], 480);

    let mut trimmed = bypassed_processor(sample_rate, 480, 1, 400.0, 4000.0)?;
    trimmed.store().set(ParamId::InputGain, 6.0);
    trimmed.store().set(ParamId::OutputGain, -12.0);
    let out = run(&mut trimmed, &[input], 480);

    let diff = lin_to_db(rms(&out[0][4800..])) - lin_to_db(rms(&base[0][4800..]));
    assert!((diff + 6.0).abs() < 0.05, "trim difference {diff} dB");
    Ok(())
}
