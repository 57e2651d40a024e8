use std::{
    io::{Read, Seek},
    path::Path,
};

use log::{debug, info, warn};
use vdif_types::{AuditReport, VdifError, VdifResult};

use crate::serialization::VdifReader;

/// Полный проход по заголовкам: кадры на секунду, непрерывность и порядок
/// секунд.
///
/// Проход не прерывается на первом нарушении, все счётчики собираются до
/// конца файла. Ошибка декодирования любого заголовка прерывает аудит без
/// частичного отчёта.
pub fn audit<R: Read + Seek>(reader: &mut VdifReader<R>) -> VdifResult<AuditReport> {
    let len = reader.len();
    let mut report = AuditReport {
        is_contiguous: true,
        is_ordered: true,
        ..Default::default()
    };

    let mut previous_second: Option<u32> = None;
    let mut offset = 0u64;

    while offset < len {
        let header = reader.read_header_at(offset)?;
        let frame_length = header.frame_length as u64;

        if offset + frame_length > len {
            return Err(VdifError::malformed(format!(
                "frame at offset {offset} declares {frame_length} bytes, {} available",
                len - offset
            )));
        }

        let second = header.seconds_from_epoch;
        match previous_second {
            None => {
                report.reference_epoch = header.reference_epoch;
                report.start_seconds_from_epoch = second;
            }
            Some(prev) => {
                if second < prev {
                    debug!("Audit: second goes back {prev} -> {second} at offset {offset}");
                    report.is_ordered = false;
                }
                if second > prev + 1 {
                    debug!("Audit: second jumps {prev} -> {second} at offset {offset}");
                    report.is_contiguous = false;
                }
            }
        }
        previous_second = Some(second);

        *report.per_second_frame_counts.entry(second).or_insert(0) += 1;
        report.frame_count += 1;
        report.sample_count += header.samples_in_payload() as u64;
        if header.invalid_data {
            report.invalid_frame_count += 1;
        }
        report.end_seconds_from_epoch = second + 1;

        offset += frame_length;
    }

    let mut counts = report.per_second_frame_counts.values();
    report.is_simple = match counts.next() {
        Some(first) => counts.all(|c| c == first),
        None => true,
    };

    if !report.is_simple {
        warn!("Frame count per second is not uniform");
    }
    if report.invalid_frame_count > 0 {
        warn!("{} frames carry the invalid-data flag", report.invalid_frame_count);
    }

    info!(
        "Audit: {} frames, {} samples, simple={} contiguous={} ordered={}",
        report.frame_count,
        report.sample_count,
        report.is_simple,
        report.is_contiguous,
        report.is_ordered
    );

    Ok(report)
}

/// [`audit`] для файла на диске.
pub fn audit_path<P: AsRef<Path>>(path: P) -> VdifResult<AuditReport> {
    let mut reader = VdifReader::open(path)?;
    audit(&mut reader)
}
