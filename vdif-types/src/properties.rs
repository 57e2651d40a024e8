use crate::{VdifError, VdifResult};

/// Свойства файла, выведенные из первого и последнего кадров.
///
/// `frames_per_second` и `samples_per_frame` считаются постоянными по всему
/// файлу. Это верно только для "простого" файла: проверка делается полным
/// аудитом, а не здесь.
#[derive(Debug, Clone, PartialEq)]
pub struct FileProperties {
    /// Длина кадра в байтах (по первому кадру)
    pub frame_length: u32,
    /// Размер заголовка (16 или 32 байта)
    pub header_size: usize,
    /// Бит на выборку
    pub bits_per_sample: u8,
    /// Выборок в кадре
    pub samples_per_frame: u64,
    /// Полугодия от 2000-01-01
    pub reference_epoch: u8,
    /// Станция первого кадра
    pub station_id: u16,
    /// Секунда первого кадра
    pub start_seconds_from_epoch: u32,
    /// Секунда последнего кадра + 1
    pub end_seconds_from_epoch: u32,
    /// Номер последнего кадра + 1
    pub frames_per_second: u32,
    /// frames_per_second × samples_per_frame, Гц
    pub sample_rate: u64,
    /// Кадров в файле
    pub total_frames: u64,
    /// Выборок в файле
    pub total_samples: u64,
}

impl FileProperties {
    /// Покрытие файла в секундах.
    pub fn duration_secs(&self) -> u32 {
        self.end_seconds_from_epoch
            .saturating_sub(self.start_seconds_from_epoch)
    }

    /// Период дискретизации в секундах.
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate as f64
    }

    /// Проверка диапазона на стороне вызывающего: оба конца внутри
    /// `[start_seconds_from_epoch, end_seconds_from_epoch]` и `start < end`.
    pub fn validate_range(
        &self,
        start_seconds_from_epoch: f64,
        end_seconds_from_epoch: f64,
    ) -> VdifResult<()> {
        let lo = self.start_seconds_from_epoch as f64;
        let hi = self.end_seconds_from_epoch as f64;

        for (name, t) in [
            ("start", start_seconds_from_epoch),
            ("end", end_seconds_from_epoch),
        ] {
            if !(lo..=hi).contains(&t) {
                return Err(VdifError::out_of_range(format!(
                    "{name} time {t} outside file coverage [{lo}, {hi}]"
                )));
            }
        }

        if start_seconds_from_epoch >= end_seconds_from_epoch {
            return Err(VdifError::out_of_range(format!(
                "start time {start_seconds_from_epoch} must be earlier than end time {end_seconds_from_epoch}"
            )));
        }

        Ok(())
    }
}
