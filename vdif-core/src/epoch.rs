//! Календарь reference epoch.
//!
//! Эпоха `e` начинается 1 января (чётная `e`) или 1 июля (нечётная `e`) года
//! `2000 + e / 2`, время UTC. Поле заголовка шестибитное, поэтому значения
//! берутся по модулю 64.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use vdif_types::{FileProperties, VdifError, VdifResult};

/// Формат отображения меток времени (миллисекундная точность).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Начало reference epoch.
pub fn epoch_start(reference_epoch: u8) -> VdifResult<NaiveDateTime> {
    let e = (reference_epoch % 64) as i32;
    let month = if e % 2 == 0 { 1 } else { 7 };

    NaiveDate::from_ymd_opt(2000 + e / 2, month, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            VdifError::invalid_parameter(format!("no calendar date for epoch {reference_epoch}"))
        })
}

/// Календарное время для секунд от начала эпохи (с долями секунды).
pub fn to_datetime(
    reference_epoch: u8,
    seconds_from_epoch: f64,
) -> VdifResult<NaiveDateTime> {
    if !seconds_from_epoch.is_finite() {
        return Err(VdifError::invalid_parameter(format!(
            "cannot convert {seconds_from_epoch} seconds to a date"
        )));
    }

    let whole = seconds_from_epoch.floor();
    let nanos = ((seconds_from_epoch - whole) * 1e9).round() as i64;
    let delta = TimeDelta::try_seconds(whole as i64)
        .map(|d| d + TimeDelta::nanoseconds(nanos))
        .ok_or_else(|| {
            VdifError::invalid_parameter(format!("{seconds_from_epoch} seconds is out of range"))
        })?;

    epoch_start(reference_epoch)?
        .checked_add_signed(delta)
        .ok_or_else(|| {
            VdifError::invalid_parameter(format!("{seconds_from_epoch} seconds is out of range"))
        })
}

/// Секунды от начала эпохи для календарного времени.
pub fn seconds_since_epoch(
    reference_epoch: u8,
    datetime: NaiveDateTime,
) -> VdifResult<f64> {
    let delta = datetime - epoch_start(reference_epoch)?;
    Ok(match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    })
}

/// `YYYY-MM-DD HH:MM:SS.mmm`.
pub fn format_timestamp(
    reference_epoch: u8,
    seconds_from_epoch: f64,
) -> VdifResult<String> {
    Ok(to_datetime(reference_epoch, seconds_from_epoch)?
        .format(TIMESTAMP_FORMAT)
        .to_string())
}

/// Разбирает время, введённое пользователем: либо число секунд от начала
/// эпохи, либо `YYYY-MM-DD HH:MM:SS[.fff]`.
pub fn parse_time_input(
    input: &str,
    reference_epoch: u8,
) -> VdifResult<f64> {
    let input = input.trim();

    if let Ok(seconds) = input.parse::<f64>() {
        if seconds.is_finite() {
            return Ok(seconds);
        }
    }

    for fmt in INPUT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return seconds_since_epoch(reference_epoch, dt);
        }
    }

    Err(VdifError::invalid_parameter(format!(
        "'{input}' is neither seconds nor a YYYY-MM-DD HH:MM:SS.fff timestamp"
    )))
}

/// Календарные границы покрытия файла.
pub trait FilePropertiesExt {
    fn start_datetime(&self) -> VdifResult<NaiveDateTime>;
    fn end_datetime(&self) -> VdifResult<NaiveDateTime>;
}

impl FilePropertiesExt for FileProperties {
    fn start_datetime(&self) -> VdifResult<NaiveDateTime> {
        to_datetime(self.reference_epoch, self.start_seconds_from_epoch as f64)
    }

    fn end_datetime(&self) -> VdifResult<NaiveDateTime> {
        to_datetime(self.reference_epoch, self.end_seconds_from_epoch as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_start() {
        assert_eq!(
            epoch_start(0).unwrap().to_string(),
            "2000-01-01 00:00:00"
        );
        assert_eq!(
            epoch_start(1).unwrap().to_string(),
            "2000-07-01 00:00:00"
        );
        assert_eq!(
            epoch_start(48).unwrap().to_string(),
            "2024-01-01 00:00:00"
        );
        assert_eq!(epoch_start(64).unwrap(), epoch_start(0).unwrap());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(48, 0.0).unwrap(),
            "2024-01-01 00:00:00.000"
        );
        // 180 суток (високосный 2024) + 5:43:20
        assert_eq!(
            format_timestamp(48, 15_572_600.25).unwrap(),
            "2024-06-29 05:43:20.250"
        );
    }

    #[test]
    fn test_parse_time_input_seconds() {
        assert_eq!(parse_time_input(" 15572600.5 ", 48).unwrap(), 15_572_600.5);
    }

    #[test]
    fn test_parse_time_input_datetime() {
        let s = parse_time_input("2024-06-29 05:43:20.500", 48).unwrap();
        assert!((s - 15_572_600.5).abs() < 1e-6);

        let s = parse_time_input("2024-06-29 05:43:21", 48).unwrap();
        assert!((s - 15_572_601.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_time_input_garbage() {
        assert!(matches!(
            parse_time_input("yesterday", 48),
            Err(VdifError::InvalidParameter(_))
        ));
        assert!(parse_time_input("NaN", 48).is_err());
    }

    #[test]
    fn test_to_datetime_rejects_non_finite() {
        assert!(to_datetime(0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_properties_datetimes() {
        let props = FileProperties {
            frame_length: 8_032,
            header_size: 32,
            bits_per_sample: 8,
            samples_per_frame: 8_000,
            reference_epoch: 48,
            station_id: 0,
            start_seconds_from_epoch: 15_572_600,
            end_seconds_from_epoch: 15_572_610,
            frames_per_second: 1_000,
            sample_rate: 8_000_000,
            total_frames: 10_000,
            total_samples: 80_000_000,
        };
        assert_eq!(
            props.start_datetime().unwrap().to_string(),
            "2024-06-29 05:43:20"
        );
        assert_eq!(
            props.end_datetime().unwrap().to_string(),
            "2024-06-29 05:43:30"
        );
    }
}
