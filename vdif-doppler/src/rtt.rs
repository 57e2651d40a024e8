use std::path::Path;

use log::debug;
use vdif_types::{VdifError, VdifResult};

/// Табличный профиль задержки: пары (секунды от начала эпохи, RTT в
/// секундах), упорядоченные по времени.
///
/// Между узлами RTT интерполируется линейно, за пределами таблицы
/// экстраполируется по крайнему отрезку.
#[derive(Debug, Clone, PartialEq)]
pub struct RttProfile {
    times: Vec<f64>,
    rtts: Vec<f64>,
}

impl RttProfile {
    /// Строит профиль; время должно строго возрастать, значения конечны.
    pub fn new(points: Vec<(f64, f64)>) -> VdifResult<Self> {
        if points.is_empty() {
            return Err(VdifError::invalid_parameter("rtt profile has no points"));
        }

        for (i, &(t, rtt)) in points.iter().enumerate() {
            if !t.is_finite() || !rtt.is_finite() {
                return Err(VdifError::invalid_parameter(format!(
                    "rtt point {i} ({t}, {rtt}) is not finite"
                )));
            }
        }

        if let Some(w) = points.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(VdifError::invalid_parameter(format!(
                "rtt profile times must increase: {} then {}",
                w[0].0, w[1].0
            )));
        }

        let (times, rtts) = points.into_iter().unzip();
        Ok(Self { times, rtts })
    }

    /// Разбирает текстовую таблицу `секунды rtt`, по паре на строку.
    ///
    /// Пустые строки и всё после `#` пропускаются, лишние столбцы
    /// игнорируются.
    pub fn from_table(text: &str) -> VdifResult<Self> {
        let mut points = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let mut cols = line.split_whitespace();
            let parse = |col: Option<&str>, name: &str| -> VdifResult<f64> {
                col.and_then(|s| s.parse::<f64>().ok()).ok_or_else(|| {
                    VdifError::invalid_parameter(format!(
                        "line {}: missing or invalid {name} in '{line}'",
                        line_no + 1
                    ))
                })
            };

            let t = parse(cols.next(), "time")?;
            let rtt = parse(cols.next(), "rtt")?;
            points.push((t, rtt));
        }

        debug!("RTT table: {} points", points.len());
        Self::new(points)
    }

    /// [`RttProfile::from_table`] для файла на диске.
    pub fn from_path<P: AsRef<Path>>(path: P) -> VdifResult<Self> {
        Self::from_table(&std::fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Время первого и последнего узлов.
    pub fn time_range(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.rtts.iter().copied())
    }

    /// RTT в момент `t`.
    pub fn interpolate(
        &self,
        t: f64,
    ) -> f64 {
        let n = self.times.len();
        if n == 1 {
            return self.rtts[0];
        }

        // отрезок [i0, i1], крайние отрезки продолжаются наружу
        let i1 = self.times.partition_point(|&x| x <= t).clamp(1, n - 1);
        let i0 = i1 - 1;

        let (t0, t1) = (self.times[i0], self.times[i1]);
        let (r0, r1) = (self.rtts[i0], self.rtts[i1]);

        r0 + (r1 - r0) * (t - t0) / (t1 - t0)
    }

    /// Один RTT на выборку для `[start, start + duration)` с шагом
    /// `1 / sample_rate`.
    pub fn resample(
        &self,
        start_seconds_from_epoch: f64,
        duration: f64,
        sample_rate: f64,
    ) -> VdifResult<Vec<f64>> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(VdifError::invalid_parameter(format!(
                "sample_rate={sample_rate} must be positive"
            )));
        }
        if !(duration.is_finite() && duration >= 0.0) || !start_seconds_from_epoch.is_finite() {
            return Err(VdifError::invalid_parameter(format!(
                "cannot resample {duration} s starting at {start_seconds_from_epoch}"
            )));
        }

        let exact = duration * sample_rate;
        let count = if (exact - exact.round()).abs() < 1e-6 {
            exact.round()
        } else {
            exact.ceil()
        };

        let (first, last) = self.time_range();
        if start_seconds_from_epoch < first || start_seconds_from_epoch + duration > last {
            debug!(
                "RTT resample [{start_seconds_from_epoch}, +{duration}) extrapolates beyond \
                 table [{first}, {last}]"
            );
        }

        Ok((0..count as usize)
            .map(|k| self.interpolate(start_seconds_from_epoch + k as f64 / sample_rate))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> RttProfile {
        RttProfile::new(vec![(10.0, 1.0), (20.0, 2.0), (30.0, 4.0)]).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_points() {
        assert!(RttProfile::new(vec![]).is_err());
        assert!(RttProfile::new(vec![(1.0, 0.0), (1.0, 0.0)]).is_err());
        assert!(RttProfile::new(vec![(2.0, 0.0), (1.0, 0.0)]).is_err());
        assert!(RttProfile::new(vec![(1.0, f64::NAN)]).is_err());
    }

    #[test]
    fn test_interpolate_inside() {
        let p = profile();
        assert_eq!(p.interpolate(10.0), 1.0);
        assert_eq!(p.interpolate(15.0), 1.5);
        assert_eq!(p.interpolate(20.0), 2.0);
        assert_eq!(p.interpolate(25.0), 3.0);
        assert_eq!(p.interpolate(30.0), 4.0);
    }

    #[test]
    fn test_interpolate_extrapolates() {
        let p = profile();
        assert_eq!(p.interpolate(0.0), 0.0);
        assert_eq!(p.interpolate(35.0), 5.0);
    }

    #[test]
    fn test_single_point_is_constant() {
        let p = RttProfile::new(vec![(5.0, 0.25)]).unwrap();
        assert_eq!(p.interpolate(-100.0), 0.25);
        assert_eq!(p.resample(0.0, 0.004, 1_000.0).unwrap(), vec![0.25; 4]);
    }

    #[test]
    fn test_resample_count_and_values() {
        let p = profile();
        let v = p.resample(10.0, 1.0, 4.0).unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v[0], 1.0);
        assert!((v[2] - 1.05).abs() < 1e-12);

        // не кратно шагу: округление вверх
        assert_eq!(p.resample(10.0, 1.1, 4.0).unwrap().len(), 5);
        assert!(p.resample(10.0, 1.0, 0.0).is_err());
        assert!(p.resample(10.0, -1.0, 4.0).is_err());
    }

    #[test]
    fn test_from_table() {
        let text = "\
# time   rtt
10.0  1.0

20.0  2.0   extra
30.0  4.0  # trailing comment
";
        let p = RttProfile::from_table(text).unwrap();
        assert_eq!(p, profile());
        assert_eq!(p.time_range(), (10.0, 30.0));
        assert_eq!(p.points().nth(2), Some((30.0, 4.0)));
    }

    #[test]
    fn test_from_table_reports_line() {
        let err = RttProfile::from_table("1.0 2.0\n2.0 abc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
