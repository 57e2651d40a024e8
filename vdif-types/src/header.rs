/// Версия формата VDIF, для которой раскладка проверена
pub const VDIF_VERSION: u8 = 1;

/// Размер полного заголовка (слова 0-7)
pub const VDIF_HEADER_SIZE: usize = 32;

/// Размер legacy-заголовка (слова 0-3, без extended user data)
pub const VDIF_LEGACY_HEADER_SIZE: usize = 16;

/// Длина кадра хранится в единицах по 8 байт
pub const VDIF_FRAME_UNIT: u32 = 8;

/// Тип данных выборок (бит 31 слова 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataType {
    /// Вещественные выборки
    Real = 0,
    /// Комплексные выборки
    Complex = 1,
}

impl DataType {
    pub fn from_bit(v: u32) -> Self {
        if v & 0x1 == 0 {
            DataType::Real
        } else {
            DataType::Complex
        }
    }

    pub fn as_bit(&self) -> u32 {
        *self as u32
    }
}

impl std::fmt::Display for DataType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            DataType::Real => write!(f, "Real"),
            DataType::Complex => write!(f, "Complex"),
        }
    }
}

/// Заголовок одного кадра VDIF.
///
/// Создаётся заново при каждом чтении кадра и после декодирования не
/// меняется.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Флаг недостоверных данных в кадре
    pub invalid_data: bool,
    /// Legacy-режим: 16-байтный заголовок без слов 4-7
    pub legacy_mode: bool,
    /// Секунды от начала reference epoch (30 бит)
    pub seconds_from_epoch: u32,
    /// Полугодия от 2000-01-01 (6 бит): 0 = январь 2000, 1 = июль 2000
    pub reference_epoch: u8,
    /// Номер кадра внутри текущей секунды (24 бита, с нуля)
    pub frame_number: u32,
    /// Версия VDIF (3 бита)
    pub vdif_version: u8,
    /// log2 числа каналов (5 бит)
    pub log2_channels: u8,
    /// Длина кадра в байтах, включая заголовок
    pub frame_length: u32,
    /// Вещественные или комплексные выборки
    pub data_type: DataType,
    /// Бит на выборку (1..=32)
    pub bits_per_sample: u8,
    /// Идентификатор потока (10 бит)
    pub thread_id: u16,
    /// Идентификатор станции (16 бит)
    pub station_id: u16,
    /// Слова 4-7; `None` в legacy-режиме
    pub extended_user_data: Option<[u8; 16]>,
}

impl FrameHeader {
    /// Заголовок одноканального 8-битного кадра с нулевым extended-блоком.
    pub fn new(
        seconds_from_epoch: u32,
        reference_epoch: u8,
        frame_number: u32,
        frame_length: u32,
    ) -> Self {
        FrameHeader {
            invalid_data: false,
            legacy_mode: false,
            seconds_from_epoch,
            reference_epoch,
            frame_number,
            vdif_version: VDIF_VERSION,
            log2_channels: 0,
            frame_length,
            data_type: DataType::Real,
            bits_per_sample: 8,
            thread_id: 0,
            station_id: 0,
            extended_user_data: Some([0u8; 16]),
        }
    }

    /// 16 байт в legacy-режиме, иначе 32.
    pub fn header_size(&self) -> usize {
        if self.legacy_mode {
            VDIF_LEGACY_HEADER_SIZE
        } else {
            VDIF_HEADER_SIZE
        }
    }

    pub fn num_channels(&self) -> u32 {
        1u32 << self.log2_channels
    }

    /// Размер полезной нагрузки (0, если frame_length меньше заголовка).
    pub fn payload_len(&self) -> usize {
        (self.frame_length as usize).saturating_sub(self.header_size())
    }

    /// Количество выборок, помещающихся в полезную нагрузку.
    pub fn samples_in_payload(&self) -> usize {
        if self.bits_per_sample == 0 {
            return 0;
        }
        self.payload_len() * 8 / self.bits_per_sample as usize
    }

    /// Версии кроме 1 декодируются той же раскладкой, но не проверены.
    pub fn is_known_version(&self) -> bool {
        self.vdif_version == VDIF_VERSION
    }
}
