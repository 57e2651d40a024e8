use crate::{SampleBuffer, VdifError, VdifResult};

/// Непрерывный временной ряд: метка времени (секунды от reference epoch) и
/// амплитуда для каждой выборки.
///
/// Порядок вставки совпадает с порядком времени. Склейка кадров не
/// заполняет пропуски: у нерегулярного файла метки времени прыгают.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    /// Метки времени, по одной на выборку
    pub timestamps: Vec<f64>,
    /// Амплитуды
    pub samples: SampleBuffer,
}

impl SampleWindow {
    /// Пустое окно для заданной разрядности.
    pub fn with_capacity(
        bits_per_sample: u8,
        capacity: usize,
    ) -> VdifResult<Self> {
        Ok(SampleWindow {
            timestamps: Vec::with_capacity(capacity),
            samples: SampleBuffer::with_capacity(bits_per_sample, capacity)?,
        })
    }

    /// Собирает окно, проверяя что на каждую выборку есть метка времени.
    pub fn new(
        timestamps: Vec<f64>,
        samples: SampleBuffer,
    ) -> VdifResult<Self> {
        if timestamps.len() != samples.len() {
            return Err(VdifError::invalid_parameter(format!(
                "{} timestamps for {} samples",
                timestamps.len(),
                samples.len()
            )));
        }

        Ok(SampleWindow {
            timestamps,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.timestamps.last().copied()
    }

    /// Пары (время, амплитуда) в порядке времени.
    pub fn iter(&self) -> impl Iterator<Item = (f64, i16)> + '_ {
        self.timestamps.iter().copied().zip(self.samples.iter())
    }

    /// Дописывает выборки следующего кадра.
    pub fn append(
        &mut self,
        other: SampleWindow,
    ) -> VdifResult<()> {
        self.samples.append(other.samples)?;
        self.timestamps.extend(other.timestamps);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_length_mismatch() {
        let err = SampleWindow::new(vec![0.0, 0.5], SampleBuffer::from(vec![1i8])).unwrap_err();
        assert!(matches!(err, VdifError::InvalidParameter(_)));
    }

    #[test]
    fn test_append_and_iter() {
        let mut w = SampleWindow::with_capacity(8, 4).unwrap();
        assert!(w.is_empty());
        assert_eq!(w.first_timestamp(), None);

        w.append(SampleWindow::new(vec![10.0, 10.25], SampleBuffer::from(vec![1i8, -1])).unwrap())
            .unwrap();
        w.append(SampleWindow::new(vec![10.5, 10.75], SampleBuffer::from(vec![2i8, -2])).unwrap())
            .unwrap();

        assert_eq!(w.len(), 4);
        assert_eq!(w.first_timestamp(), Some(10.0));
        assert_eq!(w.last_timestamp(), Some(10.75));

        let pairs: Vec<_> = w.iter().collect();
        assert_eq!(pairs[2], (10.5, 2));
    }

    #[test]
    fn test_append_rejects_other_width() {
        let mut w = SampleWindow::with_capacity(16, 0).unwrap();
        let other = SampleWindow::new(vec![0.0], SampleBuffer::from(vec![1i8])).unwrap();
        assert!(w.append(other).is_err());
        assert!(w.timestamps.is_empty(), "метки не должны дописываться при ошибке");
    }
}
