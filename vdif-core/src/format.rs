//! Формат кадра VDIF
//!
//! Заголовок состоит из 32-битных слов в порядке little-endian. Слова 0-3
//! есть всегда, слова 4-7 (extended user data) отсутствуют в legacy-режиме.
//!
//! | слово | биты  | поле                              |
//! |-------|-------|-----------------------------------|
//! | 0     | 31    | invalid_data                      |
//! | 0     | 30    | legacy_mode                       |
//! | 0     | 0-29  | seconds_from_epoch                |
//! | 1     | 24-29 | reference_epoch                   |
//! | 1     | 0-23  | frame_number                      |
//! | 2     | 29-31 | vdif_version                      |
//! | 2     | 24-28 | log2_channels                     |
//! | 2     | 0-23  | frame_length (единицы по 8 байт)  |
//! | 3     | 31    | data_type                         |
//! | 3     | 26-30 | bits_per_sample - 1               |
//! | 3     | 16-25 | thread_id                         |
//! | 3     | 0-15  | station_id                        |
//!
//! Выборки полезной нагрузки хранятся в offset-binary: 8 бит как беззнаковый
//! байт минус 128, 16 бит как беззнаковое little-endian слово минус 32768.

use log::warn;
use vdif_types::{
    DataType, FileProperties, FrameHeader, SampleBuffer, SampleWindow, VdifError, VdifResult,
    VDIF_FRAME_UNIT, VDIF_HEADER_SIZE, VDIF_LEGACY_HEADER_SIZE,
};

use crate::binary::{
    bit_field, field_mask, put_bit_field, read_offset_binary_u16, read_offset_binary_u8,
    read_word_le, write_offset_binary_i16, write_offset_binary_i8, write_word_le,
};

/// (сдвиг, ширина) битового поля
type Field = (u32, u32);

// Слово 0
const INVALID_DATA: Field = (31, 1);
const LEGACY_MODE: Field = (30, 1);
const SECONDS_FROM_EPOCH: Field = (0, 30);
// Слово 1
const REFERENCE_EPOCH: Field = (24, 6);
const FRAME_NUMBER: Field = (0, 24);
// Слово 2
const VDIF_VERSION_FIELD: Field = (29, 3);
const LOG2_CHANNELS: Field = (24, 5);
const FRAME_LENGTH_UNITS: Field = (0, 24);
// Слово 3
const DATA_TYPE: Field = (31, 1);
const BITS_PER_SAMPLE_MINUS_ONE: Field = (26, 5);
const THREAD_ID: Field = (16, 10);
const STATION_ID: Field = (0, 16);

fn get(
    word: u32,
    (shift, width): Field,
) -> u32 {
    bit_field(word, shift, width)
}

fn put(
    word: u32,
    (shift, width): Field,
    value: u32,
) -> u32 {
    put_bit_field(word, shift, width, value)
}

fn check_fits(
    name: &str,
    value: u32,
    (_, width): Field,
) -> VdifResult<()> {
    if value > field_mask(width) {
        return Err(VdifError::invalid_parameter(format!(
            "{name}={value} does not fit into {width} bits"
        )));
    }
    Ok(())
}

/// Переносит смещение ошибки усечения из локального буфера в координаты
/// вызывающего.
pub(crate) fn rebase_offset(
    err: VdifError,
    base: u64,
) -> VdifError {
    match err {
        VdifError::TruncatedHeader {
            offset,
            needed,
            available,
        } => VdifError::TruncatedHeader {
            offset: base + offset,
            needed,
            available,
        },
        other => other,
    }
}

/// Сериализация заголовка кадра в раскладку VDIF.
pub trait FrameHeaderExt: Sized {
    /// 16 байт в legacy-режиме, иначе 32.
    fn serialize(&self) -> VdifResult<Vec<u8>>;

    /// Декодирует заголовок с начала `buf`.
    fn deserialize(buf: &[u8]) -> VdifResult<Self>;
}

impl FrameHeaderExt for FrameHeader {
    fn serialize(&self) -> VdifResult<Vec<u8>> {
        check_fits("seconds_from_epoch", self.seconds_from_epoch, SECONDS_FROM_EPOCH)?;
        check_fits("reference_epoch", self.reference_epoch as u32, REFERENCE_EPOCH)?;
        check_fits("frame_number", self.frame_number, FRAME_NUMBER)?;
        check_fits("vdif_version", self.vdif_version as u32, VDIF_VERSION_FIELD)?;
        check_fits("log2_channels", self.log2_channels as u32, LOG2_CHANNELS)?;
        check_fits("thread_id", self.thread_id as u32, THREAD_ID)?;

        if self.frame_length == 0 || self.frame_length % VDIF_FRAME_UNIT != 0 {
            return Err(VdifError::invalid_parameter(format!(
                "frame_length={} must be a positive multiple of {VDIF_FRAME_UNIT}",
                self.frame_length
            )));
        }
        let units = self.frame_length / VDIF_FRAME_UNIT;
        check_fits("frame_length units", units, FRAME_LENGTH_UNITS)?;

        if !(1..=32).contains(&self.bits_per_sample) {
            return Err(VdifError::invalid_parameter(format!(
                "bits_per_sample={} outside 1..=32",
                self.bits_per_sample
            )));
        }

        let w0 = put(0, INVALID_DATA, self.invalid_data as u32);
        let w0 = put(w0, LEGACY_MODE, self.legacy_mode as u32);
        let w0 = put(w0, SECONDS_FROM_EPOCH, self.seconds_from_epoch);

        let w1 = put(0, REFERENCE_EPOCH, self.reference_epoch as u32);
        let w1 = put(w1, FRAME_NUMBER, self.frame_number);

        let w2 = put(0, VDIF_VERSION_FIELD, self.vdif_version as u32);
        let w2 = put(w2, LOG2_CHANNELS, self.log2_channels as u32);
        let w2 = put(w2, FRAME_LENGTH_UNITS, units);

        let w3 = put(0, DATA_TYPE, self.data_type.as_bit());
        let w3 = put(w3, BITS_PER_SAMPLE_MINUS_ONE, self.bits_per_sample as u32 - 1);
        let w3 = put(w3, THREAD_ID, self.thread_id as u32);
        let w3 = put(w3, STATION_ID, self.station_id as u32);

        let mut buf = vec![0u8; self.header_size()];
        let mut off = 0;
        for w in [w0, w1, w2, w3] {
            write_word_le(&mut buf, &mut off, w);
        }

        if !self.legacy_mode {
            buf[VDIF_LEGACY_HEADER_SIZE..VDIF_HEADER_SIZE]
                .copy_from_slice(&self.extended_user_data.unwrap_or([0u8; 16]));
        }

        Ok(buf)
    }

    fn deserialize(buf: &[u8]) -> VdifResult<Self> {
        if buf.len() < VDIF_LEGACY_HEADER_SIZE {
            return Err(VdifError::TruncatedHeader {
                offset: 0,
                needed: VDIF_LEGACY_HEADER_SIZE,
                available: buf.len() as u64,
            });
        }

        let mut off = 0;
        let w0 = read_word_le(buf, &mut off);
        let w1 = read_word_le(buf, &mut off);
        let w2 = read_word_le(buf, &mut off);
        let w3 = read_word_le(buf, &mut off);

        let legacy_mode = get(w0, LEGACY_MODE) == 1;
        let header_size = if legacy_mode {
            VDIF_LEGACY_HEADER_SIZE
        } else {
            VDIF_HEADER_SIZE
        };

        if buf.len() < header_size {
            return Err(VdifError::TruncatedHeader {
                offset: 0,
                needed: header_size,
                available: buf.len() as u64,
            });
        }

        let extended_user_data = if legacy_mode {
            None
        } else {
            let mut ext = [0u8; 16];
            ext.copy_from_slice(&buf[VDIF_LEGACY_HEADER_SIZE..VDIF_HEADER_SIZE]);
            Some(ext)
        };

        let frame_length = get(w2, FRAME_LENGTH_UNITS) * VDIF_FRAME_UNIT;
        if frame_length == 0 {
            return Err(VdifError::malformed("frame_length is zero"));
        }
        if (frame_length as usize) < header_size {
            return Err(VdifError::malformed(format!(
                "frame_length={frame_length} is shorter than the {header_size}-byte header"
            )));
        }

        let header = FrameHeader {
            invalid_data: get(w0, INVALID_DATA) == 1,
            legacy_mode,
            seconds_from_epoch: get(w0, SECONDS_FROM_EPOCH),
            reference_epoch: get(w1, REFERENCE_EPOCH) as u8,
            frame_number: get(w1, FRAME_NUMBER),
            vdif_version: get(w2, VDIF_VERSION_FIELD) as u8,
            log2_channels: get(w2, LOG2_CHANNELS) as u8,
            frame_length,
            data_type: DataType::from_bit(get(w3, DATA_TYPE)),
            bits_per_sample: (get(w3, BITS_PER_SAMPLE_MINUS_ONE) + 1) as u8,
            thread_id: get(w3, THREAD_ID) as u16,
            station_id: get(w3, STATION_ID) as u16,
            extended_user_data,
        };

        if !header.is_known_version() {
            warn!(
                "VDIF version {} is not 1, decoding with the version 1 layout",
                header.vdif_version
            );
        }

        Ok(header)
    }
}

/// Декодирует заголовок, начинающийся в `bytes[offset..]`.
pub fn decode_header(
    bytes: &[u8],
    offset: usize,
) -> VdifResult<FrameHeader> {
    let tail = bytes.get(offset..).unwrap_or(&[]);
    FrameHeader::deserialize(tail).map_err(|e| rebase_offset(e, offset as u64))
}

/// Полезная нагрузка в знаковые выборки.
pub fn decode_payload(
    payload: &[u8],
    bits_per_sample: u8,
) -> VdifResult<SampleBuffer> {
    match bits_per_sample {
        8 => Ok(SampleBuffer::I8(read_offset_binary_u8(payload))),
        16 => {
            if payload.len() % 2 != 0 {
                return Err(VdifError::malformed(format!(
                    "16-bit payload has odd length {}",
                    payload.len()
                )));
            }
            Ok(SampleBuffer::I16(read_offset_binary_u16(payload)))
        }
        other => Err(VdifError::UnsupportedBitsPerSample(other)),
    }
}

/// Знаковые выборки в offset-binary полезную нагрузку.
pub fn encode_payload(samples: &SampleBuffer) -> Vec<u8> {
    let mut buf = Vec::with_capacity(samples.len() * (samples.bits_per_sample() as usize / 8));
    match samples {
        SampleBuffer::I8(v) => write_offset_binary_i8(&mut buf, v),
        SampleBuffer::I16(v) => write_offset_binary_i16(&mut buf, v),
    }
    buf
}

/// Метки времени выборок кадра:
/// `seconds + frame_number / fps + i / (samples_per_frame × fps)`.
pub fn frame_timestamps(
    header: &FrameHeader,
    properties: &FileProperties,
    count: usize,
) -> VdifResult<Vec<f64>> {
    if properties.frames_per_second == 0 || properties.samples_per_frame == 0 {
        return Err(VdifError::invalid_parameter(format!(
            "cannot time samples with frames_per_second={} and samples_per_frame={}",
            properties.frames_per_second, properties.samples_per_frame
        )));
    }

    let fps = properties.frames_per_second as f64;
    let samples_per_second = properties.samples_per_frame as f64 * fps;
    let base = header.seconds_from_epoch as f64 + header.frame_number as f64 / fps;

    Ok((0..count)
        .map(|i| base + i as f64 / samples_per_second)
        .collect())
}

/// Декодирует кадр целиком: заголовок, выборки и их метки времени.
pub fn decode_frame(
    bytes: &[u8],
    offset: usize,
    properties: &FileProperties,
) -> VdifResult<(FrameHeader, SampleWindow)> {
    let header = decode_header(bytes, offset)?;

    let frame_end = offset
        .checked_add(header.frame_length as usize)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            VdifError::malformed(format!(
                "frame at offset {offset} declares {} bytes, {} available",
                header.frame_length,
                bytes.len().saturating_sub(offset)
            ))
        })?;

    let payload = &bytes[offset + header.header_size()..frame_end];
    let samples = decode_payload(payload, header.bits_per_sample)?;
    let timestamps = frame_timestamps(&header, properties, samples.len())?;

    Ok((header, SampleWindow::new(timestamps, samples)?))
}

/// Собирает один кадр с 32-байтным заголовком и нулевым extended-блоком.
///
/// `frames_per_second` выводится как `sample_rate / samples.len()`, поэтому
/// частота должна делиться на число выборок без остатка, а `frame_number`
/// быть меньше результата.
pub fn encode_frame(
    samples: &SampleBuffer,
    sample_rate: u64,
    seconds_from_epoch: u32,
    frame_number: u32,
    reference_epoch: u8,
    station_id: u16,
    bits_per_sample: u8,
) -> VdifResult<Vec<u8>> {
    if bits_per_sample != 8 && bits_per_sample != 16 {
        return Err(VdifError::invalid_parameter(format!(
            "bits_per_sample={bits_per_sample}, only 8 and 16 can be encoded"
        )));
    }
    if samples.bits_per_sample() != bits_per_sample {
        return Err(VdifError::invalid_parameter(format!(
            "{}-bit samples do not match bits_per_sample={bits_per_sample}",
            samples.bits_per_sample()
        )));
    }
    if samples.is_empty() {
        return Err(VdifError::invalid_parameter("frame has no samples"));
    }

    let samples_per_frame = samples.len() as u64;
    if sample_rate == 0 || sample_rate % samples_per_frame != 0 {
        return Err(VdifError::invalid_parameter(format!(
            "sample_rate={sample_rate} is not a multiple of {samples_per_frame} samples per frame"
        )));
    }
    let frames_per_second = sample_rate / samples_per_frame;
    if frame_number as u64 >= frames_per_second {
        return Err(VdifError::invalid_parameter(format!(
            "frame_number={frame_number} is not below {frames_per_second} frames per second"
        )));
    }

    let payload = encode_payload(samples);
    let frame_length = VDIF_HEADER_SIZE + payload.len();
    if frame_length % VDIF_FRAME_UNIT as usize != 0 {
        return Err(VdifError::invalid_parameter(format!(
            "frame length {frame_length} is not a multiple of {VDIF_FRAME_UNIT} bytes"
        )));
    }
    let frame_length = u32::try_from(frame_length).map_err(|_| {
        VdifError::invalid_parameter(format!("frame length {frame_length} is too large"))
    })?;

    let mut header = FrameHeader::new(
        seconds_from_epoch,
        reference_epoch,
        frame_number,
        frame_length,
    );
    header.bits_per_sample = bits_per_sample;
    header.station_id = station_id;

    let mut frame = header.serialize()?;
    frame.extend_from_slice(&payload);

    Ok(frame)
}
