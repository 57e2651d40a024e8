use std::{
    io::{Read, Seek},
    path::Path,
};

use log::{debug, warn};
use vdif_types::{FileProperties, FrameHeader, SampleWindow, VdifError, VdifResult};

use crate::serialization::VdifReader;

/// Выводит свойства файла по первому и последнему кадрам.
///
/// Первый кадр лежит в смещении 0, последний в `len - frame_length`.
/// Файл не читается целиком: regularity проверяется отдельно аудитом.
pub fn infer_properties<R: Read + Seek>(reader: &mut VdifReader<R>) -> VdifResult<FileProperties> {
    let file_size = reader.len();
    let first = reader.read_header_at(0)?;
    let frame_length = first.frame_length;

    if file_size % frame_length as u64 != 0 {
        return Err(VdifError::MisalignedFile {
            file_size,
            frame_length,
        });
    }

    let last = reader.read_header_at(file_size - frame_length as u64)?;
    if last.frame_length != frame_length {
        warn!(
            "last frame is {} bytes long, first is {frame_length}",
            last.frame_length
        );
    }

    let samples_per_frame = first.samples_in_payload() as u64;
    if samples_per_frame == 0 {
        return Err(VdifError::malformed(format!(
            "{frame_length}-byte frame carries no samples"
        )));
    }

    let frames_per_second = last.frame_number + 1;
    let total_frames = file_size / frame_length as u64;

    let properties = FileProperties {
        frame_length,
        header_size: first.header_size(),
        bits_per_sample: first.bits_per_sample,
        samples_per_frame,
        reference_epoch: first.reference_epoch,
        station_id: first.station_id,
        start_seconds_from_epoch: first.seconds_from_epoch,
        end_seconds_from_epoch: last.seconds_from_epoch + 1,
        frames_per_second,
        sample_rate: frames_per_second as u64 * samples_per_frame,
        total_frames,
        total_samples: total_frames * samples_per_frame,
    };

    debug!(
        "Properties: {total_frames} frames of {frame_length} bytes, {} Hz, seconds [{}, {})",
        properties.sample_rate,
        properties.start_seconds_from_epoch,
        properties.end_seconds_from_epoch
    );

    Ok(properties)
}

/// [`infer_properties`] для файла на диске.
pub fn infer_properties_from_path<P: AsRef<Path>>(path: P) -> VdifResult<FileProperties> {
    let mut reader = VdifReader::open(path)?;
    infer_properties(&mut reader)
}

/// Заголовок и выборки кадра в смещении 0.
pub fn read_first_frame<R: Read + Seek>(
    reader: &mut VdifReader<R>,
    properties: &FileProperties,
) -> VdifResult<(FrameHeader, SampleWindow)> {
    reader.read_frame_at(0, properties)
}
