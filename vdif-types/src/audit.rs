use std::collections::BTreeMap;

/// Итог полного прохода по заголовкам файла.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Во всех секундах одинаковое число кадров
    pub is_simple: bool,
    /// Секунда между соседними кадрами не пропускается
    pub is_contiguous: bool,
    /// Секунда между соседними кадрами не убывает
    pub is_ordered: bool,
    /// Всего кадров
    pub frame_count: u64,
    /// Всего выборок (по полезной нагрузке каждого кадра)
    pub sample_count: u64,
    /// Кадров с выставленным флагом invalid_data
    pub invalid_frame_count: u64,
    /// Число кадров для каждой секунды
    pub per_second_frame_counts: BTreeMap<u32, u64>,
    /// Reference epoch первого кадра
    pub reference_epoch: u8,
    /// Секунда первого кадра
    pub start_seconds_from_epoch: u32,
    /// Секунда последнего кадра + 1
    pub end_seconds_from_epoch: u32,
}

impl AuditReport {
    /// Общее число кадров в секунду, если файл простой.
    pub fn uniform_frames_per_second(&self) -> Option<u64> {
        if !self.is_simple {
            return None;
        }
        self.per_second_frame_counts.values().next().copied()
    }

    /// Все три свойства выполнены.
    pub fn is_well_formed(&self) -> bool {
        self.is_simple && self.is_contiguous && self.is_ordered
    }
}
