use log::{debug, warn};
use vdif_types::{SampleBuffer, VdifError, VdifResult};

/// Итог обратного преобразования.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarpStats {
    /// Записей в выходной буфер (включая перезаписанные)
    pub written: usize,
    /// Записей в уже занятый индекс
    pub collisions: usize,
    /// Выборок, время передачи которых вне принятого интервала
    pub dropped: usize,
}

/// Профиль задержки, нормированный к своему минимуму, и частота
/// дискретизации.
///
/// Абсолютная задержка значения не имеет: минимум профиля считается нулём.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeWarp {
    rtt_shifted: Vec<f64>,
    sample_rate: f64,
}

impl TimeWarp {
    /// `rtt` в секундах, по одному значению на выборку.
    pub fn new(
        rtt: &[f64],
        sample_rate: f64,
    ) -> VdifResult<Self> {
        if rtt.is_empty() {
            return Err(VdifError::invalid_parameter("rtt profile is empty"));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(VdifError::invalid_parameter(format!(
                "sample_rate={sample_rate} must be positive"
            )));
        }
        if let Some(i) = rtt.iter().position(|v| !v.is_finite()) {
            return Err(VdifError::invalid_parameter(format!(
                "rtt[{i}]={} is not finite",
                rtt[i]
            )));
        }

        let min = rtt.iter().copied().fold(f64::INFINITY, f64::min);

        Ok(Self {
            rtt_shifted: rtt.iter().map(|v| v - min).collect(),
            sample_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.rtt_shifted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rtt_shifted.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Задержка относительно минимума профиля, секунды.
    pub fn rtt_shifted(&self) -> &[f64] {
        &self.rtt_shifted
    }

    /// Максимальная относительная задержка в выборках.
    pub fn max_delay_samples(&self) -> f64 {
        self.rtt_shifted.iter().copied().fold(0.0, f64::max) * self.sample_rate
    }

    /// Передатчик → приёмник.
    ///
    /// Выход имеет длину профиля. Выборка `i` берётся из
    /// `floor(i - rtt_shifted[i] × sample_rate)`; индексы вне сигнала дают
    /// `T::default()`.
    pub fn forward<T: Copy + Default>(
        &self,
        signal: &[T],
    ) -> Vec<T> {
        let n = signal.len() as f64;
        let mut missed = 0usize;

        let received: Vec<T> = self
            .rtt_shifted
            .iter()
            .enumerate()
            .map(|(i, &delay)| {
                let source = (i as f64 - delay * self.sample_rate).floor();
                if source >= 0.0 && source < n {
                    signal[source as usize]
                } else {
                    missed += 1;
                    T::default()
                }
            })
            .collect();

        debug!(
            "Doppler forward: {} samples out, {missed} outside the transmitted signal",
            self.rtt_shifted.len()
        );

        received
    }

    /// Приёмник → передатчик, см. [`TimeWarp::inverse_with_stats`].
    pub fn inverse<T: Copy + Default>(
        &self,
        received: &[T],
    ) -> VdifResult<Vec<T>> {
        self.inverse_with_stats(received).map(|(out, _)| out)
    }

    /// Приближённое обращение [`TimeWarp::forward`].
    ///
    /// Выборка `i` переносится в `round(i - rtt_shifted[i] × sample_rate)`
    /// (половины округляются к чётному),
    /// если эта позиция лежит в `[0, len)`. При совпадении индексов
    /// остаётся последняя записанная выборка, незаполненные позиции равны
    /// `T::default()`. Длина `received` должна совпадать с длиной профиля.
    pub fn inverse_with_stats<T: Copy + Default>(
        &self,
        received: &[T],
    ) -> VdifResult<(Vec<T>, WarpStats)> {
        if received.len() != self.rtt_shifted.len() {
            return Err(VdifError::invalid_parameter(format!(
                "{} received samples for a {}-sample rtt profile",
                received.len(),
                self.rtt_shifted.len()
            )));
        }

        let len = received.len();
        let mut transmitted = vec![T::default(); len];
        let mut occupied = vec![false; len];
        let mut stats = WarpStats::default();

        for (i, (&sample, &delay)) in received.iter().zip(&self.rtt_shifted).enumerate() {
            let position = i as f64 - delay * self.sample_rate;
            if !(position >= 0.0 && position < len as f64) {
                stats.dropped += 1;
                continue;
            }

            let target = (position.round_ties_even() as usize).min(len - 1);
            if occupied[target] {
                stats.collisions += 1;
            }
            occupied[target] = true;
            transmitted[target] = sample;
            stats.written += 1;
        }

        if stats.collisions > 0 {
            warn!(
                "Doppler inverse: {} of {} samples overwrote an earlier one",
                stats.collisions, stats.written
            );
        }
        debug!(
            "Doppler inverse: written={} collisions={} dropped={}",
            stats.written, stats.collisions, stats.dropped
        );

        Ok((transmitted, stats))
    }

    /// [`TimeWarp::forward`] для буфера VDIF-выборок с сохранением разрядности.
    pub fn forward_buffer(
        &self,
        signal: &SampleBuffer,
    ) -> SampleBuffer {
        match signal {
            SampleBuffer::I8(v) => SampleBuffer::I8(self.forward(v)),
            SampleBuffer::I16(v) => SampleBuffer::I16(self.forward(v)),
        }
    }

    /// [`TimeWarp::inverse`] для буфера VDIF-выборок с сохранением разрядности.
    pub fn inverse_buffer(
        &self,
        received: &SampleBuffer,
    ) -> VdifResult<(SampleBuffer, WarpStats)> {
        Ok(match received {
            SampleBuffer::I8(v) => {
                let (out, stats) = self.inverse_with_stats(v)?;
                (SampleBuffer::I8(out), stats)
            }
            SampleBuffer::I16(v) => {
                let (out, stats) = self.inverse_with_stats(v)?;
                (SampleBuffer::I16(out), stats)
            }
        })
    }
}

/// Применяет задержку `rtt` к сигналу (передатчик → приёмник).
pub fn doppler_shift<T: Copy + Default>(
    signal: &[T],
    rtt: &[f64],
    sample_rate: f64,
) -> VdifResult<Vec<T>> {
    Ok(TimeWarp::new(rtt, sample_rate)?.forward(signal))
}

/// Снимает задержку `rtt` с принятого сигнала (приёмник → передатчик).
pub fn inverse_doppler_shift<T: Copy + Default>(
    received: &[T],
    rtt: &[f64],
    sample_rate: f64,
) -> VdifResult<Vec<T>> {
    TimeWarp::new(rtt, sample_rate)?.inverse(received)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 1_000.0;

    #[test]
    fn test_new_validates() {
        assert!(matches!(
            TimeWarp::new(&[], SR),
            Err(VdifError::InvalidParameter(_))
        ));
        assert!(TimeWarp::new(&[0.0], 0.0).is_err());
        assert!(TimeWarp::new(&[0.0], -5.0).is_err());
        assert!(TimeWarp::new(&[0.0], f64::NAN).is_err());
        assert!(TimeWarp::new(&[0.0, f64::INFINITY], SR).is_err());
    }

    #[test]
    fn test_rtt_normalized_to_minimum() {
        let w = TimeWarp::new(&[5.003, 5.001, 5.002], SR).unwrap();
        let shifted = w.rtt_shifted();
        assert_eq!(shifted[1], 0.0);
        assert!((shifted[0] - 0.002).abs() < 1e-12);
        assert!((w.max_delay_samples() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_forward_delays_by_whole_samples() {
        // задержка 2 выборки во второй половине профиля
        let rtt = [0.0, 0.0, 0.0, 0.002, 0.002, 0.002];
        let out = doppler_shift(&[10i8, 11, 12, 13, 14, 15], &rtt, SR).unwrap();
        assert_eq!(out, vec![10, 11, 12, 11, 12, 13]);
    }

    #[test]
    fn test_forward_output_follows_profile_length() {
        let rtt = [0.0; 5];
        let out = doppler_shift(&[1i16, 2, 3], &rtt, SR).unwrap();
        assert_eq!(out, vec![1, 2, 3, 0, 0]);
    }

    #[test]
    fn test_forward_before_signal_start_is_zero() {
        // источник floor(0 - 1) = -1
        let w = TimeWarp::new(&[0.001, 0.0], SR).unwrap();
        let out = w.forward(&[7i8, 8]);
        assert_eq!(out, vec![0, 8]);
    }

    #[test]
    fn test_inverse_length_mismatch() {
        let w = TimeWarp::new(&[0.0, 0.0], SR).unwrap();
        assert!(matches!(
            w.inverse(&[1i8, 2, 3]),
            Err(VdifError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_inverse_drops_early_samples() {
        let w = TimeWarp::new(&[0.003, 0.003, 0.0, 0.0], SR).unwrap();
        let (out, stats) = w.inverse_with_stats(&[1i8, 2, 3, 4]).unwrap();
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.written, 2);
        assert_eq!(out, vec![0, 0, 3, 4]);
    }

    #[test]
    fn test_inverse_last_writer_wins() {
        // i=1 и i=2 обе попадают в индекс 1
        let rtt = [0.0, 0.0, 0.001, 0.001];
        let w = TimeWarp::new(&rtt, SR).unwrap();
        let (out, stats) = w.inverse_with_stats(&[1i8, 2, 3, 4]).unwrap();
        assert_eq!(out, vec![1, 3, 4, 0]);
        assert_eq!(stats.collisions, 1);
        assert_eq!(stats.written, 4);
    }

    #[test]
    fn test_inverse_rounds_half_to_even() {
        // позиции 0 и 0.5: обе выборки попадают в индекс 0
        let w = TimeWarp::new(&[0.0, 0.25], 2.0).unwrap();
        let (out, stats) = w.inverse_with_stats(&[7i8, 9]).unwrap();
        assert_eq!(out, vec![9, 0]);
        assert_eq!(stats.collisions, 1);

        // 1.5 округляется к 2
        let w = TimeWarp::new(&[0.0, 0.0, 0.0, 1.5], 1.0).unwrap();
        assert_eq!(w.inverse(&[1i8, 2, 3, 4]).unwrap(), vec![1, 2, 4, 0]);
    }

    #[test]
    fn test_buffers_keep_width() {
        let w = TimeWarp::new(&[0.0; 3], SR).unwrap();

        let out = w.forward_buffer(&SampleBuffer::from(vec![1i16, -2, 3]));
        assert_eq!(out, SampleBuffer::I16(vec![1, -2, 3]));

        let (back, stats) = w.inverse_buffer(&SampleBuffer::from(vec![4i8, 5, 6])).unwrap();
        assert_eq!(back, SampleBuffer::I8(vec![4, 5, 6]));
        assert_eq!(stats.collisions, 0);
    }
}
