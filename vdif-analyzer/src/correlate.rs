use std::sync::Arc;

use log::debug;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::{
    config::AnalyzerConfig,
    error::{AnalyzerError, AnalyzerResult},
    synth::{chirp_pulse, sample_count, FULL_SCALE},
};

/// Прямое и обратное комплексные БПФ фиксированной длины.
pub struct FftHelper {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftHelper {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();

        Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Спектр вещественного сигнала, дополненного нулями до `len`.
    pub fn spectrum(
        &self,
        input: &[f64],
    ) -> AnalyzerResult<Vec<Complex<f64>>> {
        if input.len() > self.len {
            return Err(AnalyzerError::signal(format!(
                "{} samples do not fit a {}-point FFT",
                input.len(),
                self.len
            )));
        }

        let mut buf: Vec<Complex<f64>> = input.iter().map(|&v| Complex::new(v, 0.0)).collect();
        buf.resize(self.len, Complex::new(0.0, 0.0));
        self.forward.process(&mut buf);
        Ok(buf)
    }

    /// Вещественная часть обратного БПФ, нормированного на `1/len`.
    pub fn inverse_real(
        &self,
        mut spectrum: Vec<Complex<f64>>,
    ) -> AnalyzerResult<Vec<f64>> {
        if spectrum.len() != self.len {
            return Err(AnalyzerError::signal(
                "spectrum length does not match FFT configuration",
            ));
        }

        self.inverse.process(&mut spectrum);
        let scale = 1.0 / self.len as f64;
        Ok(spectrum.into_iter().map(|c| c.re * scale).collect())
    }
}

/// Шаблон согласованного фильтра: один импульс в начале, далее нули.
pub fn chirp_template(
    len: usize,
    sample_rate_hz: f64,
    bandwidth_hz: f64,
    pulse_width_s: f64,
    phase: f64,
) -> AnalyzerResult<Vec<f64>> {
    let pulse = chirp_pulse(bandwidth_hz, pulse_width_s, sample_rate_hz, phase);
    if pulse.is_empty() {
        return Err(AnalyzerError::signal(format!(
            "pulse of {pulse_width_s} s is shorter than one sample at {sample_rate_hz} Hz"
        )));
    }

    let mut template = vec![0.0; len];
    for (dst, v) in template.iter_mut().zip(&pulse) {
        *dst = f64::from((v * FULL_SCALE) as i8);
    }
    Ok(template)
}

/// Круговая взаимная корреляция `r[k] = Σ signal[n + k] · template[n]`
/// через БПФ. Короткий вход дополняется нулями до длины длинного.
pub fn correlate(
    signal: &[f64],
    template: &[f64],
) -> AnalyzerResult<Vec<f64>> {
    if signal.is_empty() || template.is_empty() {
        return Err(AnalyzerError::signal("cannot correlate an empty signal"));
    }

    let fft = FftHelper::new(signal.len().max(template.len()));
    let s = fft.spectrum(signal)?;
    let t = fft.spectrum(template)?;

    let product = s.iter().zip(&t).map(|(a, b)| a * b.conj()).collect();
    fft.inverse_real(product)
}

pub fn autocorrelate(signal: &[f64]) -> AnalyzerResult<Vec<f64>> {
    correlate(signal, signal)
}

/// Обнуляет сдвиги `0..width` и `-(width-1)..0` (хвост массива).
pub fn suppress_zero_lag(
    corr: &mut [f64],
    width: usize,
) {
    let len = corr.len();
    let w = width.min(len);
    corr[..w].fill(0.0);
    corr[len - w.saturating_sub(1)..].fill(0.0);
}

/// Раскладывает корреляцию по строкам длиной `fast_time_s`
/// (slow time × fast time). Неполная последняя строка отбрасывается.
pub fn fold_fast_slow(
    corr: &[f64],
    sample_rate_hz: f64,
    fast_time_s: f64,
) -> AnalyzerResult<Vec<Vec<f64>>> {
    let fast = sample_count(fast_time_s, sample_rate_hz);
    if fast == 0 || corr.len() < fast {
        return Err(AnalyzerError::signal(format!(
            "{} correlation samples are fewer than one fast-time row of {fast}",
            corr.len()
        )));
    }

    let rows: Vec<Vec<f64>> = corr.chunks_exact(fast).map(<[f64]>::to_vec).collect();
    debug!("Folded {} samples into {} x {fast}", corr.len(), rows.len());
    Ok(rows)
}

/// Сумма модулей по каждому столбцу fast time.
pub fn fast_time_intensity(rows: &[Vec<f64>]) -> Vec<f64> {
    let width = rows.first().map_or(0, Vec::len);
    let mut intensity = vec![0.0; width];

    for row in rows {
        for (acc, v) in intensity.iter_mut().zip(row) {
            *acc += v.abs();
        }
    }
    intensity
}

/// Индекс и значение максимального по модулю элемента.
pub fn peak(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
}

/// Результат согласованной фильтрации окна.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedFilter {
    /// Корреляция с подавленным нулевым сдвигом
    pub correlation: Vec<f64>,
    /// Строки fast time, начиная со сдвига `lag_offset`
    pub rows: Vec<Vec<f64>>,
    pub intensity: Vec<f64>,
    pub lag_offset: usize,
}

impl MatchedFilter {
    /// Сдвиг (в выборках) и значение пика корреляции.
    pub fn peak_lag(&self) -> Option<(usize, f64)> {
        peak(&self.correlation)
    }

    /// Задержка внутри периода fast time, где интенсивность максимальна.
    pub fn intensity_peak_lag(&self) -> Option<usize> {
        let (column, _) = peak(&self.intensity)?;
        Some((self.lag_offset + column) % self.intensity.len())
    }
}

/// Корреляция окна с ЛЧМ-шаблоном и свёртка в slow/fast time.
pub fn matched_filter(
    signal: &[f64],
    sample_rate_hz: f64,
    config: &AnalyzerConfig,
) -> AnalyzerResult<MatchedFilter> {
    config.validate()?;

    let template = chirp_template(
        signal.len(),
        sample_rate_hz,
        config.bandwidth_hz,
        config.pulse_width_s,
        config.phase_offset,
    )?;
    let mut correlation = correlate(signal, &template)?;
    suppress_zero_lag(&mut correlation, config.zero_lag_width);

    let lag_offset = config.zero_lag_width.min(correlation.len());
    let rows = fold_fast_slow(&correlation[lag_offset..], sample_rate_hz, config.fast_time_s)?;
    let intensity = fast_time_intensity(&rows);

    Ok(MatchedFilter {
        correlation,
        rows,
        intensity,
        lag_offset,
    })
}
