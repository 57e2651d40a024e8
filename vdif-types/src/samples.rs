use std::ops::Range;

use crate::{VdifError, VdifResult};

/// Знаковые выборки одного кадра или окна.
///
/// Разрядность хранится в варианте, поэтому кодек может проверить
/// соответствие типа данных полю `bits_per_sample`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleBuffer {
    /// 8-битные выборки
    I8(Vec<i8>),
    /// 16-битные выборки
    I16(Vec<i16>),
}

impl SampleBuffer {
    /// Пустой буфер для заданной разрядности.
    pub fn with_capacity(
        bits_per_sample: u8,
        capacity: usize,
    ) -> VdifResult<Self> {
        match bits_per_sample {
            8 => Ok(SampleBuffer::I8(Vec::with_capacity(capacity))),
            16 => Ok(SampleBuffer::I16(Vec::with_capacity(capacity))),
            other => Err(VdifError::UnsupportedBitsPerSample(other)),
        }
    }

    pub fn bits_per_sample(&self) -> u8 {
        match self {
            SampleBuffer::I8(_) => 8,
            SampleBuffer::I16(_) => 16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SampleBuffer::I8(v) => v.len(),
            SampleBuffer::I16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(
        &self,
        index: usize,
    ) -> Option<i16> {
        match self {
            SampleBuffer::I8(v) => v.get(index).map(|&s| s as i16),
            SampleBuffer::I16(v) => v.get(index).copied(),
        }
    }

    /// Амплитуды, расширенные до i16.
    pub fn iter(&self) -> impl Iterator<Item = i16> + '_ {
        let (narrow, wide) = match self {
            SampleBuffer::I8(v) => (Some(v.iter().map(|&s| s as i16)), None),
            SampleBuffer::I16(v) => (None, Some(v.iter().copied())),
        };
        narrow
            .into_iter()
            .flatten()
            .chain(wide.into_iter().flatten())
    }

    /// Копия в f64 для спектрального анализа.
    pub fn to_f64(&self) -> Vec<f64> {
        self.iter().map(f64::from).collect()
    }

    /// Копия поддиапазона той же разрядности; `None`, если диапазон
    /// выходит за буфер.
    pub fn slice(
        &self,
        range: Range<usize>,
    ) -> Option<SampleBuffer> {
        match self {
            SampleBuffer::I8(v) => v.get(range).map(|s| SampleBuffer::I8(s.to_vec())),
            SampleBuffer::I16(v) => v.get(range).map(|s| SampleBuffer::I16(s.to_vec())),
        }
    }

    /// Дописывает поддиапазон `other` без копии всего источника.
    pub fn extend_from_range(
        &mut self,
        other: &SampleBuffer,
        range: Range<usize>,
    ) -> VdifResult<()> {
        let bad_range = || {
            VdifError::out_of_range(format!(
                "range {}..{} is outside a buffer of {} samples",
                range.start,
                range.end,
                other.len()
            ))
        };
        match (self, other) {
            (SampleBuffer::I8(a), SampleBuffer::I8(b)) => {
                a.extend_from_slice(b.get(range.clone()).ok_or_else(bad_range)?)
            }
            (SampleBuffer::I16(a), SampleBuffer::I16(b)) => {
                a.extend_from_slice(b.get(range.clone()).ok_or_else(bad_range)?)
            }
            (a, b) => {
                return Err(VdifError::invalid_parameter(format!(
                    "cannot append {}-bit samples to a {}-bit buffer",
                    b.bits_per_sample(),
                    a.bits_per_sample(),
                )))
            }
        }
        Ok(())
    }

    /// Очищает буфер, сохраняя ёмкость.
    pub fn clear(&mut self) {
        match self {
            SampleBuffer::I8(v) => v.clear(),
            SampleBuffer::I16(v) => v.clear(),
        }
    }

    /// Дописывает выборки той же разрядности.
    pub fn append(
        &mut self,
        other: SampleBuffer,
    ) -> VdifResult<()> {
        match (self, other) {
            (SampleBuffer::I8(a), SampleBuffer::I8(b)) => a.extend(b),
            (SampleBuffer::I16(a), SampleBuffer::I16(b)) => a.extend(b),
            (a, b) => {
                return Err(VdifError::invalid_parameter(format!(
                    "cannot append {}-bit samples to a {}-bit buffer",
                    b.bits_per_sample(),
                    a.bits_per_sample(),
                )))
            }
        }
        Ok(())
    }
}

impl From<Vec<i8>> for SampleBuffer {
    fn from(v: Vec<i8>) -> Self {
        SampleBuffer::I8(v)
    }
}

impl From<Vec<i16>> for SampleBuffer {
    fn from(v: Vec<i16>) -> Self {
        SampleBuffer::I16(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_capacity_rejects_other_widths() {
        assert!(SampleBuffer::with_capacity(8, 4).is_ok());
        assert!(SampleBuffer::with_capacity(16, 4).is_ok());
        assert!(matches!(
            SampleBuffer::with_capacity(4, 4),
            Err(VdifError::UnsupportedBitsPerSample(4))
        ));
    }

    #[test]
    fn test_iter_widens() {
        let b = SampleBuffer::from(vec![-128i8, 0, 127]);
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![-128, 0, 127]);

        let b = SampleBuffer::from(vec![-32_768i16, 1]);
        assert_eq!(b.iter().collect::<Vec<_>>(), vec![-32_768, 1]);
        assert_eq!(b.get(1), Some(1));
        assert_eq!(b.get(2), None);
    }

    #[test]
    fn test_append_same_width() {
        let mut a = SampleBuffer::from(vec![1i8, 2]);
        a.append(SampleBuffer::from(vec![3i8])).unwrap();
        assert_eq!(a, SampleBuffer::I8(vec![1, 2, 3]));
    }

    #[test]
    fn test_append_width_mismatch() {
        let mut a = SampleBuffer::from(vec![1i8]);
        let err = a.append(SampleBuffer::from(vec![1i16])).unwrap_err();
        assert!(matches!(err, VdifError::InvalidParameter(_)));
        assert_eq!(a.len(), 1, "буфер не должен меняться при ошибке");
    }

    #[test]
    fn test_slice_and_to_f64() {
        let b = SampleBuffer::from(vec![1i16, -2, 3, -4]);
        assert_eq!(b.slice(1..3), Some(SampleBuffer::I16(vec![-2, 3])));
        assert_eq!(b.to_f64(), vec![1.0, -2.0, 3.0, -4.0]);
    }

    #[test]
    fn test_slice_out_of_bounds_is_none() {
        let b = SampleBuffer::from(vec![1i8, 2, 3]);
        assert_eq!(b.slice(2..9), None);
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 3..1;
        assert_eq!(b.slice(reversed), None);
        assert_eq!(b.slice(3..3), Some(SampleBuffer::I8(vec![])));
    }

    #[test]
    fn test_extend_from_range() {
        let src = SampleBuffer::from(vec![5i16, 6, 7, 8]);
        let mut a = SampleBuffer::from(vec![1i16]);
        a.extend_from_range(&src, 1..3).unwrap();
        assert_eq!(a, SampleBuffer::I16(vec![1, 6, 7]));

        let err = a.extend_from_range(&src, 3..5).unwrap_err();
        assert!(matches!(err, VdifError::OutOfRange(_)));
        let err = a
            .extend_from_range(&SampleBuffer::from(vec![0i8; 4]), 0..1)
            .unwrap_err();
        assert!(matches!(err, VdifError::InvalidParameter(_)));
        assert_eq!(a.len(), 3);

        a.clear();
        assert!(a.is_empty());
        assert_eq!(a.bits_per_sample(), 16);
    }
}
