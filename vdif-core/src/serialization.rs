use std::{
    fs::File,
    io::{BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use log::debug;
use vdif_types::{
    FrameHeader, FileProperties, SampleBuffer, SampleWindow, VdifError, VdifResult,
    VDIF_HEADER_SIZE,
};

use crate::format::{decode_frame, encode_frame, rebase_offset, FrameHeaderExt};

/// Читатель VDIF файла с произвольным доступом по смещению.
///
/// Каждое чтение начинается с `seek`, поэтому стоимость доступа к кадру не
/// зависит от его положения в файле.
pub struct VdifReader<R: Read + Seek> {
    inner: R,
    len: u64,
    frame_buf: Vec<u8>,
    stats: ReadStats,
}

/// Статистика, накопленная [`VdifReader`] в процессе чтения.
#[derive(Debug, Default, Clone)]
pub struct ReadStats {
    /// Прочитано заголовков (включая заголовки кадров).
    pub headers_read: u64,
    /// Прочитано кадров целиком.
    pub frames_read: u64,
    /// Всего прочитано байт.
    pub bytes_read: u64,
}

impl VdifReader<File> {
    /// Открывает файл на диске.
    pub fn open<P: AsRef<Path>>(path: P) -> VdifResult<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> VdifReader<R> {
    /// Создаёт читатель; длина источника определяется через `seek`.
    pub fn new(mut inner: R) -> VdifResult<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;

        Ok(Self {
            inner,
            len,
            frame_buf: Vec::new(),
            stats: ReadStats::default(),
        })
    }

    /// Размер источника в байтах.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    fn read_into_buf(
        &mut self,
        offset: u64,
        count: usize,
    ) -> VdifResult<()> {
        self.frame_buf.resize(count, 0);
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(&mut self.frame_buf)?;
        self.stats.bytes_read += count as u64;
        Ok(())
    }

    /// Декодирует заголовок кадра, начинающегося в `offset`.
    pub fn read_header_at(
        &mut self,
        offset: u64,
    ) -> VdifResult<FrameHeader> {
        let available = self.len.saturating_sub(offset);
        let count = available.min(VDIF_HEADER_SIZE as u64) as usize;

        self.read_into_buf(offset, count)?;
        let header =
            FrameHeader::deserialize(&self.frame_buf).map_err(|e| rebase_offset(e, offset))?;

        self.stats.headers_read += 1;
        Ok(header)
    }

    /// Читает кадр целиком и декодирует его выборки.
    pub fn read_frame_at(
        &mut self,
        offset: u64,
        properties: &FileProperties,
    ) -> VdifResult<(FrameHeader, SampleWindow)> {
        let header = self.read_header_at(offset)?;
        let frame_length = header.frame_length as u64;

        if offset + frame_length > self.len {
            return Err(VdifError::malformed(format!(
                "frame at offset {offset} declares {frame_length} bytes, {} available",
                self.len - offset
            )));
        }

        self.read_into_buf(offset, frame_length as usize)?;
        let frame = decode_frame(&self.frame_buf, 0, properties)
            .map_err(|e| rebase_offset(e, offset))?;

        self.stats.frames_read += 1;
        Ok(frame)
    }
}

/// Параметры потока, записываемого [`VdifWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct StreamParams {
    /// Частота дискретизации, Гц
    pub sample_rate: u64,
    /// Кадров в секунду
    pub frames_per_second: u32,
    /// Полугодия от 2000-01-01
    pub reference_epoch: u8,
    /// Идентификатор станции
    pub station_id: u16,
    /// 8 или 16
    pub bits_per_sample: u8,
    /// Время первой выборки, секунды от начала эпохи (с долями)
    pub start_seconds_from_epoch: f64,
}

impl Default for StreamParams {
    fn default() -> Self {
        Self {
            sample_rate: 8_000_000,
            frames_per_second: 1_000,
            reference_epoch: 48,
            station_id: 0,
            bits_per_sample: 8,
            start_seconds_from_epoch: 15_572_600.0,
        }
    }
}

impl StreamParams {
    /// `sample_rate / frames_per_second`, если делится без остатка.
    pub fn samples_per_frame(&self) -> VdifResult<usize> {
        if self.frames_per_second == 0 || self.sample_rate % self.frames_per_second as u64 != 0 {
            return Err(VdifError::invalid_parameter(format!(
                "sample_rate={} is not a multiple of frames_per_second={}",
                self.sample_rate, self.frames_per_second
            )));
        }
        let spf = self.sample_rate / self.frames_per_second as u64;
        if spf == 0 {
            return Err(VdifError::invalid_parameter("frames carry no samples"));
        }
        Ok(spf as usize)
    }

    /// Длина кадра в байтах.
    pub fn frame_length(&self) -> VdifResult<usize> {
        Ok(VDIF_HEADER_SIZE + self.samples_per_frame()? * (self.bits_per_sample as usize / 8))
    }
}

/// Итог записи.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Записано кадров
    pub frames_written: u64,
    /// Записано выборок
    pub samples_written: u64,
    /// Выборки хвоста, не заполнившие кадр
    pub samples_dropped: u64,
    /// Длина каждого кадра в байтах
    pub frame_length: u32,
}

/// Потоковый писатель: режет выборки на кадры и нумерует их по секундам.
pub struct VdifWriter<W: Write> {
    writer: BufWriter<W>,
    params: StreamParams,
    samples_per_frame: usize,
    initial_seconds: u32,
    initial_frame: u64,
    pending: SampleBuffer,
    summary: WriteSummary,
}

impl<W: Write> VdifWriter<W> {
    pub fn new(
        inner: W,
        params: StreamParams,
    ) -> VdifResult<Self> {
        if params.bits_per_sample != 8 && params.bits_per_sample != 16 {
            return Err(VdifError::invalid_parameter(format!(
                "bits_per_sample={}, only 8 and 16 can be written",
                params.bits_per_sample
            )));
        }
        let start = params.start_seconds_from_epoch;
        if !start.is_finite() || start < 0.0 || start >= (1u64 << 30) as f64 {
            return Err(VdifError::invalid_parameter(format!(
                "start time {start} does not fit the 30-bit seconds field"
            )));
        }

        let samples_per_frame = params.samples_per_frame()?;
        let frame_length = params.frame_length()?;
        if frame_length % 8 != 0 {
            return Err(VdifError::invalid_parameter(format!(
                "frame length {frame_length} is not a multiple of 8 bytes"
            )));
        }

        let initial_seconds = start.floor() as u32;
        let initial_frame = ((start - start.floor()) * params.frames_per_second as f64).round() as u64;

        debug!(
            "VdifWriter: {samples_per_frame} samples/frame, {frame_length} bytes/frame, \
             first frame {initial_seconds}s #{initial_frame}"
        );

        Ok(Self {
            writer: BufWriter::new(inner),
            pending: SampleBuffer::with_capacity(params.bits_per_sample, samples_per_frame)?,
            summary: WriteSummary {
                frame_length: frame_length as u32,
                ..Default::default()
            },
            params,
            samples_per_frame,
            initial_seconds,
            initial_frame,
        })
    }

    /// Добавляет выборки; полные кадры сразу уходят в поток.
    ///
    /// Во внутренний буфер копируется не больше одного кадра за раз.
    pub fn write_samples(
        &mut self,
        samples: &SampleBuffer,
    ) -> VdifResult<()> {
        let mut offset = 0;
        while offset < samples.len() {
            let take = (self.samples_per_frame - self.pending.len()).min(samples.len() - offset);
            self.pending.extend_from_range(samples, offset..offset + take)?;
            offset += take;

            if self.pending.len() == self.samples_per_frame {
                let chunk = std::mem::replace(&mut self.pending, SampleBuffer::I8(Vec::new()));
                let written = self.write_frame(&chunk);
                self.pending = chunk;
                self.pending.clear();
                written?;
            }
        }

        Ok(())
    }

    fn write_frame(
        &mut self,
        chunk: &SampleBuffer,
    ) -> VdifResult<()> {
        let fps = self.params.frames_per_second as u64;
        let index = self.initial_frame + self.summary.frames_written;
        let seconds = self.initial_seconds as u64 + index / fps;
        let seconds = u32::try_from(seconds).map_err(|_| {
            VdifError::invalid_parameter(format!("second {seconds} overflows the header"))
        })?;

        let frame = encode_frame(
            chunk,
            self.params.sample_rate,
            seconds,
            (index % fps) as u32,
            self.params.reference_epoch,
            self.params.station_id,
            self.params.bits_per_sample,
        )?;
        self.writer.write_all(&frame)?;

        self.summary.frames_written += 1;
        self.summary.samples_written += chunk.len() as u64;
        Ok(())
    }

    /// Кадров записано на текущий момент.
    pub fn frames_written(&self) -> u64 {
        self.summary.frames_written
    }

    /// Сбрасывает буфер; неполный хвост отбрасывается.
    pub fn finish(mut self) -> VdifResult<WriteSummary> {
        self.writer.flush()?;
        self.summary.samples_dropped = self.pending.len() as u64;

        if self.summary.samples_dropped > 0 {
            debug!(
                "VdifWriter: dropped {} trailing samples",
                self.summary.samples_dropped
            );
        }

        Ok(self.summary)
    }
}

/// Записывает весь сигнал в новый файл.
///
/// Файл не создаётся, если сигнал короче одного кадра.
pub fn write_file<P: AsRef<Path>>(
    path: P,
    samples: &SampleBuffer,
    params: StreamParams,
) -> VdifResult<WriteSummary> {
    let samples_per_frame = params.samples_per_frame()?;
    if samples.len() < samples_per_frame {
        return Err(VdifError::invalid_parameter(format!(
            "{} samples do not fill one {samples_per_frame}-sample frame",
            samples.len()
        )));
    }

    let mut writer = VdifWriter::new(File::create(path)?, params)?;
    writer.write_samples(samples)?;
    writer.finish()
}
