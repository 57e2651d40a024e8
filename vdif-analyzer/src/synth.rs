use std::{f64::consts::PI, path::PathBuf};

use log::{debug, info};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use vdif_core::{write_file, WriteSummary};
use vdif_doppler::{RttProfile, TimeWarp};
use vdif_types::SampleBuffer;

use crate::{
    config::BuildConfig,
    error::{AnalyzerError, AnalyzerResult},
};

/// Амплитуда полного сигнала в 8-битных отсчётах.
pub const FULL_SCALE: f64 = 63.0;

/// Параметры последовательности ЛЧМ-импульсов.
#[derive(Debug, Clone, PartialEq)]
pub struct ChirpParams {
    pub bandwidth_hz: f64,
    pub pulse_width_s: f64,
    pub pulse_period_s: f64,
    pub sample_rate_hz: f64,
    pub duration_s: f64,
    /// Доля сигнала в полной шкале, 0..=1
    pub signal_portion: f64,
    pub randomise_phase: bool,
}

/// Доли сигнала и шума для заданного SNR: `(snr/(snr+1), 1/(snr+1))`.
pub fn snr_portions(snr: f64) -> (f64, f64) {
    (snr / (snr + 1.0), 1.0 / (snr + 1.0))
}

/// Число целых выборок в интервале `seconds`.
///
/// Произведение, отличающееся от целого меньше чем на 1e-6, округляется,
/// иначе отбрасывается дробная часть.
pub fn sample_count(
    seconds: f64,
    sample_rate_hz: f64,
) -> usize {
    let exact = seconds * sample_rate_hz;
    if !(exact > 0.0) {
        return 0;
    }
    if (exact - exact.round()).abs() < 1e-6 {
        exact.round() as usize
    } else {
        exact.floor() as usize
    }
}

/// Один импульс `cos(π·(B/T)·t² + φ)` длиной [`sample_count`] для `T`.
pub fn chirp_pulse(
    bandwidth_hz: f64,
    pulse_width_s: f64,
    sample_rate_hz: f64,
    phase: f64,
) -> Vec<f64> {
    let samples = sample_count(pulse_width_s, sample_rate_hz);
    let rate = bandwidth_hz / pulse_width_s;

    (0..samples)
        .map(|k| {
            let t = k as f64 / sample_rate_hz;
            (PI * rate * t * t + phase).cos()
        })
        .collect()
}

/// Импульсы, разделённые паузами: пауза `period - width`, затем импульс.
///
/// Последний импульс, не помещающийся целиком, отбрасывается.
pub fn generate_fm_chirp<R: Rng>(
    params: &ChirpParams,
    rng: &mut R,
) -> AnalyzerResult<Vec<i8>> {
    let total = sample_count(params.duration_s, params.sample_rate_hz);
    let chirp_samples = sample_count(params.pulse_width_s, params.sample_rate_hz);
    if chirp_samples == 0 {
        return Err(AnalyzerError::signal(format!(
            "pulse of {} s is shorter than one sample at {} Hz",
            params.pulse_width_s, params.sample_rate_hz
        )));
    }
    if params.pulse_period_s < params.pulse_width_s {
        return Err(AnalyzerError::signal(format!(
            "pulse period {} s is shorter than the pulse {} s",
            params.pulse_period_s, params.pulse_width_s
        )));
    }

    let gap = sample_count(
        params.pulse_period_s - params.pulse_width_s,
        params.sample_rate_hz,
    );
    let scale = FULL_SCALE * params.signal_portion;
    let fixed = chirp_pulse(
        params.bandwidth_hz,
        params.pulse_width_s,
        params.sample_rate_hz,
        0.0,
    );

    let mut signal = vec![0i8; total];
    let mut current = 0usize;
    let mut chirps = 0usize;

    loop {
        let chirp_start = (current + gap).min(total);
        let chirp_end = chirp_start + chirp_samples;
        if chirp_end > total {
            break;
        }

        let random;
        let pulse = if params.randomise_phase {
            random = chirp_pulse(
                params.bandwidth_hz,
                params.pulse_width_s,
                params.sample_rate_hz,
                rng.gen_range(0.0..2.0 * PI),
            );
            &random
        } else {
            &fixed
        };

        for (dst, v) in signal[chirp_start..chirp_end].iter_mut().zip(pulse) {
            *dst = (v * scale) as i8;
        }

        current = chirp_end;
        chirps += 1;
    }

    debug!("Synth: {chirps} chirps in {total} samples");
    Ok(signal)
}

/// Стандартная нормальная величина (преобразование Бокса-Мюллера).
pub fn gaussian<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Ослабляет сигнал вдвое и добавляет гауссов шум с σ = 63 × noise_portion.
///
/// Шум усекается до целых, сумма ограничивается диапазоном i8.
pub fn add_noise<R: Rng>(
    signal: &[i8],
    noise_portion: f64,
    rng: &mut R,
) -> Vec<i8> {
    let sigma = FULL_SCALE * noise_portion;

    signal
        .iter()
        .map(|&s| {
            let noise = (gaussian(rng) * sigma) as i8;
            (s as f64 / 2.0 + noise as f64).clamp(-128.0, 127.0) as i8
        })
        .collect()
}

/// Синтезирует сигнал записи: импульсы, шум и при наличии таблицы RTT
/// доплеровский сдвиг.
pub fn synthesize(config: &BuildConfig) -> AnalyzerResult<SampleBuffer> {
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let (_, noise_portion) = snr_portions(config.snr);
    let chirps = generate_fm_chirp(&config.chirp_params(), &mut rng)?;
    let mut data = add_noise(&chirps, noise_portion, &mut rng);

    if let Some(table) = &config.rtt_table {
        let sample_rate = config.sample_rate_hz as f64;
        let rtt = RttProfile::from_path(table)?.resample(
            config.start_seconds_from_epoch,
            config.duration_s,
            sample_rate,
        )?;
        let warp = TimeWarp::new(&rtt, sample_rate)?;
        info!(
            "Doppler: up to {:.1} samples of delay over {} samples",
            warp.max_delay_samples(),
            rtt.len()
        );
        data = warp.forward(&data);
    }

    Ok(match config.bits_per_sample {
        16 => SampleBuffer::I16(data.iter().map(|&s| (s as i16) << 8).collect()),
        _ => SampleBuffer::I8(data),
    })
}

/// Синтезирует запись и сохраняет её в VDIF-файл.
pub fn build_recording(config: &BuildConfig) -> AnalyzerResult<(PathBuf, WriteSummary)> {
    let samples = synthesize(config)?;
    let path = config.output_path();
    let summary = write_file(&path, &samples, config.stream_params())?;

    info!(
        "Built {}: {} frames, {} samples",
        path.display(),
        summary.frames_written,
        summary.samples_written
    );

    Ok((path, summary))
}
