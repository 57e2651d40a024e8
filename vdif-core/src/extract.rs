use std::{
    io::{Read, Seek},
    path::Path,
};

use log::{debug, info};
use vdif_types::{FileProperties, FrameHeader, SampleWindow, VdifError, VdifResult};

use crate::serialization::VdifReader;

/// Смещения `[start, end)` первого и следующего за последним кадров окна.
///
/// Кадр `k` от начала файла лежит в `k × frame_length`, где
/// `k = floor(frames_per_second × (t - start_seconds_from_epoch))`.
pub fn window_offsets(
    properties: &FileProperties,
    file_size: u64,
    start_seconds_from_epoch: f64,
    end_seconds_from_epoch: f64,
) -> VdifResult<(u64, u64)> {
    if !start_seconds_from_epoch.is_finite() || !end_seconds_from_epoch.is_finite() {
        return Err(VdifError::out_of_range(format!(
            "window [{start_seconds_from_epoch}, {end_seconds_from_epoch}) is not finite"
        )));
    }
    if start_seconds_from_epoch > end_seconds_from_epoch {
        return Err(VdifError::out_of_range(format!(
            "start {start_seconds_from_epoch} is after end {end_seconds_from_epoch}"
        )));
    }

    let fps = properties.frames_per_second as f64;
    let origin = properties.start_seconds_from_epoch as f64;
    let frame_length = properties.frame_length as f64;

    let start_offset = (fps * (start_seconds_from_epoch - origin)).floor() * frame_length;
    let end_offset = (fps * (end_seconds_from_epoch - origin)).floor() * frame_length;

    if start_offset < 0.0 || end_offset > file_size as f64 {
        return Err(VdifError::out_of_range(format!(
            "window [{start_seconds_from_epoch}, {end_seconds_from_epoch}) maps to bytes \
             [{start_offset}, {end_offset}) outside the {file_size}-byte file"
        )));
    }

    Ok((start_offset as u64, end_offset as u64))
}

/// Склеивает выборки всех кадров, чьи смещения попадают в
/// `[start_offset, end_offset)`, и возвращает заголовок первого из них.
///
/// Метки времени берутся из заголовков: пропуски в нерегулярном файле не
/// заполняются.
pub fn extract_window<R: Read + Seek>(
    reader: &mut VdifReader<R>,
    properties: &FileProperties,
    start_seconds_from_epoch: f64,
    end_seconds_from_epoch: f64,
) -> VdifResult<(FrameHeader, SampleWindow)> {
    let (start_offset, end_offset) = window_offsets(
        properties,
        reader.len(),
        start_seconds_from_epoch,
        end_seconds_from_epoch,
    )?;

    let frame_length = properties.frame_length as u64;
    let frames = end_offset.saturating_sub(start_offset).div_ceil(frame_length);
    debug!("Extract: bytes [{start_offset}, {end_offset}), {frames} frames");

    let mut first_header = None;
    let mut window = SampleWindow::with_capacity(
        properties.bits_per_sample,
        (frames * properties.samples_per_frame) as usize,
    )?;

    let mut offset = start_offset;
    while offset < end_offset {
        let (header, frame) = reader.read_frame_at(offset, properties)?;
        window.append(frame)?;
        first_header.get_or_insert(header);
        offset += frame_length;
    }

    let header = first_header.ok_or_else(|| {
        VdifError::out_of_range(format!(
            "window [{start_seconds_from_epoch}, {end_seconds_from_epoch}) holds no whole frame"
        ))
    })?;

    info!(
        "Extracted {} samples from {frames} frames starting at {}s #{}",
        window.len(),
        header.seconds_from_epoch,
        header.frame_number
    );

    Ok((header, window))
}

/// [`extract_window`] для файла на диске.
pub fn extract_window_from_path<P: AsRef<Path>>(
    path: P,
    properties: &FileProperties,
    start_seconds_from_epoch: f64,
    end_seconds_from_epoch: f64,
) -> VdifResult<(FrameHeader, SampleWindow)> {
    let mut reader = VdifReader::open(path)?;
    extract_window(
        &mut reader,
        properties,
        start_seconds_from_epoch,
        end_seconds_from_epoch,
    )
}
