use std::path::PathBuf;

use vdif_core::StreamParams;

use crate::{
    error::{AnalyzerError, AnalyzerResult},
    synth::{snr_portions, ChirpParams},
};

/// Параметры согласованного фильтра для команды `correlate`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Полоса зондирующего ЛЧМ-импульса (Гц)
    pub bandwidth_hz: f64,
    /// Длительность импульса (с)
    pub pulse_width_s: f64,
    /// Начальная фаза шаблона (рад)
    pub phase_offset: f64,
    /// Длина строки fast-time (с)
    pub fast_time_s: f64,
    /// Сколько отсчётов около нулевого сдвига обнулять
    pub zero_lag_width: usize,
    /// Таблица RTT для снятия доплеровского сдвига
    pub rtt_table: Option<PathBuf>,
}

/// Полная конфигурация синтеза тестовой записи.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Частота дискретизации (Гц)
    pub sample_rate_hz: u64,
    /// Полоса ЛЧМ-импульса (Гц)
    pub bandwidth_hz: f64,
    /// Длительность импульса (с)
    pub pulse_width_s: f64,
    /// Период повторения импульсов (с)
    pub pulse_period_s: f64,
    /// Длительность записи (с)
    pub duration_s: f64,
    /// Полугодия от 2000-01-01
    pub reference_epoch: u8,
    /// Время первой выборки (секунды от начала эпохи)
    pub start_seconds_from_epoch: f64,
    /// Отношение сигнал/шум
    pub snr: f64,
    /// Случайная фаза каждого импульса
    pub randomise_phase: bool,
    /// Кадров в секунду
    pub frames_per_second: u32,
    /// 8 или 16
    pub bits_per_sample: u8,
    /// Идентификатор станции
    pub station_id: u16,
    /// Зерно генератора (None = из энтропии ОС)
    pub seed: Option<u64>,
    /// Таблица RTT для имитации доплеровского сдвига
    pub rtt_table: Option<PathBuf>,
    /// Путь к выходному файлу (None = имя из параметров)
    pub output: Option<PathBuf>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl AnalyzerConfig {
    pub fn validate(&self) -> AnalyzerResult<()> {
        if !(self.bandwidth_hz > 0.0) || !(self.pulse_width_s > 0.0) {
            return Err(AnalyzerError::config(
                "bandwidth and pulse width must be positive",
            ));
        }
        if !(self.fast_time_s > 0.0) {
            return Err(AnalyzerError::config("fast time must be positive"));
        }
        Ok(())
    }
}

impl BuildConfig {
    pub fn validate(&self) -> AnalyzerResult<()> {
        if self.sample_rate_hz == 0 {
            return Err(AnalyzerError::config("sample rate must be positive"));
        }
        if !(self.duration_s > 0.0) {
            return Err(AnalyzerError::config("duration must be positive"));
        }
        if !(self.pulse_width_s > 0.0) || self.pulse_period_s < self.pulse_width_s {
            return Err(AnalyzerError::config(format!(
                "pulse width {} s must be positive and not exceed the period {} s",
                self.pulse_width_s, self.pulse_period_s
            )));
        }
        if !(self.snr > 0.0) {
            return Err(AnalyzerError::config(format!("SNR {} must be positive", self.snr)));
        }
        if self.bits_per_sample != 8 && self.bits_per_sample != 16 {
            return Err(AnalyzerError::config(format!(
                "bits per sample {} (use 8 or 16)",
                self.bits_per_sample
            )));
        }
        Ok(())
    }

    /// Параметры кадрирования для [`vdif_core::VdifWriter`].
    pub fn stream_params(&self) -> StreamParams {
        StreamParams {
            sample_rate: self.sample_rate_hz,
            frames_per_second: self.frames_per_second,
            reference_epoch: self.reference_epoch,
            station_id: self.station_id,
            bits_per_sample: self.bits_per_sample,
            start_seconds_from_epoch: self.start_seconds_from_epoch,
        }
    }

    /// Параметры генератора импульсов; амплитуда сигнала из SNR.
    pub fn chirp_params(&self) -> ChirpParams {
        let (signal_portion, _) = snr_portions(self.snr);
        ChirpParams {
            bandwidth_hz: self.bandwidth_hz,
            pulse_width_s: self.pulse_width_s,
            pulse_period_s: self.pulse_period_s,
            sample_rate_hz: self.sample_rate_hz as f64,
            duration_s: self.duration_s,
            signal_portion,
            randomise_phase: self.randomise_phase,
        }
    }

    /// Имя файла, описывающее параметры записи.
    pub fn file_name(&self) -> String {
        format!(
            "vdif_sr{:.1}MHz_bw{:.1}MHz_pw{:.1}us_pp{:.1}us_dur{:.1}s_epoch{}_start{:.0}s_snr{:?}_{}_{}.vdif",
            self.sample_rate_hz as f64 / 1e6,
            self.bandwidth_hz / 1e6,
            self.pulse_width_s * 1e6,
            self.pulse_period_s * 1e6,
            self.duration_s,
            self.reference_epoch,
            self.start_seconds_from_epoch,
            self.snr,
            if self.randomise_phase {
                "randomPhase"
            } else {
                "fixedPhase"
            },
            if self.rtt_table.is_some() {
                "dopplerShift"
            } else {
                "noDoppler"
            },
        )
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.file_name()))
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для AnalyzerConfig, BuildConfig
////////////////////////////////////////////////////////////////////////////////

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bandwidth_hz: 4e6,
            pulse_width_s: 2.5e-6,
            phase_offset: 0.0,
            fast_time_s: 25e-6,
            zero_lag_width: 100,
            rtt_table: None,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 8_000_000,
            bandwidth_hz: 4e6,
            pulse_width_s: 2.5e-6,
            pulse_period_s: 25e-6,
            duration_s: 10.0,
            reference_epoch: 48,
            start_seconds_from_epoch: 15_572_600.0,
            snr: 1.0,
            randomise_phase: true,
            frames_per_second: 1_000,
            bits_per_sample: 8,
            station_id: 0,
            seed: None,
            rtt_table: None,
            output: None,
        }
    }
}

/// Парсит строку частоты в герцы.
///
/// Поддерживает суффиксы: `GHz`, `MHz`, `kHz`, `Hz` (регистронезависимо).
///
/// # Примеры
/// ```
/// use vdif_analyzer::config::parse_freq_hz;
/// assert_eq!(parse_freq_hz("8MHz").unwrap(), 8_000_000);
/// assert_eq!(parse_freq_hz("0.004GHz").unwrap(), 4_000_000);
/// assert_eq!(parse_freq_hz("8000000").unwrap(), 8_000_000);
/// ```
pub fn parse_freq_hz(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let lower = s.to_lowercase();

    let (num_str, mult) = if let Some(v) = lower.strip_suffix("ghz") {
        (v.trim(), 1_000_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("mhz") {
        (v.trim(), 1_000_000_f64)
    } else if let Some(v) = lower.strip_suffix("khz") {
        (v.trim(), 1_000_f64)
    } else if let Some(v) = lower.strip_suffix("hz") {
        (v.trim(), 1_f64)
    } else {
        (lower.as_str(), 1_f64)
    };

    let n: f64 = num_str
        .parse()
        .map_err(|e| format!("Invalid frequency value '{num_str}': {e}"))?;
    if !n.is_finite() || n < 0.0 {
        return Err(format!("Invalid frequency '{s}'"));
    }

    Ok((n * mult).round() as u64)
}

/// Парсит длительность в секунды.
///
/// Поддерживает суффиксы `s`, `ms`, `us` (или `µs`); без суффикса секунды.
///
/// # Примеры
/// ```
/// use vdif_analyzer::config::parse_seconds;
/// assert_eq!(parse_seconds("2.5us").unwrap(), 2.5e-6);
/// assert_eq!(parse_seconds("10").unwrap(), 10.0);
/// ```
pub fn parse_seconds(s: &str) -> Result<f64, String> {
    let s = s.trim();
    let lower = s.to_lowercase();

    let (num_str, mult) = if let Some(v) = lower.strip_suffix("us") {
        (v, 1e-6)
    } else if let Some(v) = lower.strip_suffix("µs") {
        (v, 1e-6)
    } else if let Some(v) = lower.strip_suffix("ms") {
        (v, 1e-3)
    } else if let Some(v) = lower.strip_suffix('s') {
        (v, 1.0)
    } else {
        (lower.as_str(), 1.0)
    };

    let n: f64 = num_str
        .trim()
        .parse()
        .map_err(|e| format!("Invalid duration '{s}': {e}"))?;
    if !n.is_finite() {
        return Err(format!("Invalid duration '{s}'"));
    }

    Ok(n * mult)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
