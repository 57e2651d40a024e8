use std::io::Cursor;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use tempfile::NamedTempFile;
use vdif_core::{
    audit, audit_path, decode_frame, decode_header, encode_frame, extract_window,
    extract_window_from_path, infer_properties, infer_properties_from_path, read_first_frame,
    write_file, FrameHeaderExt, StreamParams, VdifReader, VdifWriter,
};
use vdif_types::{DataType, FrameHeader, SampleBuffer, VdifError};

// ===========================================================================
// Helpers: детерминированные тест-данные
// ===========================================================================

/// Пилообразный сигнал заданной разрядности.
fn sawtooth(
    bits_per_sample: u8,
    count: usize,
) -> SampleBuffer {
    match bits_per_sample {
        8 => SampleBuffer::from((0..count).map(|i| (i % 256) as u8 as i8).collect::<Vec<i8>>()),
        _ => SampleBuffer::from(
            (0..count)
                .map(|i| ((i * 257) % 65_536) as u16 as i16)
                .collect::<Vec<i16>>(),
        ),
    }
}

/// `seconds` секунд записи по `fps` кадров из `spf` выборок.
fn build_recording(
    fps: u32,
    spf: u64,
    seconds: u64,
    bits_per_sample: u8,
) -> Vec<u8> {
    let params = StreamParams {
        sample_rate: fps as u64 * spf,
        frames_per_second: fps,
        reference_epoch: 48,
        station_id: 0x5354,
        bits_per_sample,
        start_seconds_from_epoch: 15_572_600.0,
    };

    let mut raw = Vec::new();
    let mut writer = VdifWriter::new(&mut raw, params).unwrap();
    writer
        .write_samples(&sawtooth(bits_per_sample, (fps as u64 * spf * seconds) as usize))
        .unwrap();
    writer.finish().unwrap();
    raw
}

/// Кадры с явной последовательностью (секунда, номер кадра).
fn frames_with_sequence(seq: &[(u32, u32)]) -> Vec<u8> {
    let samples = sawtooth(8, 64);
    seq.iter()
        .flat_map(|&(sec, num)| encode_frame(&samples, 64 * 10, sec, num, 48, 0, 8).unwrap())
        .collect()
}

fn random_header(rng: &mut SmallRng) -> FrameHeader {
    let legacy_mode = rng.gen_bool(0.3);
    FrameHeader {
        invalid_data: rng.gen_bool(0.5),
        legacy_mode,
        seconds_from_epoch: rng.gen_range(0..1 << 30),
        reference_epoch: rng.gen_range(0..64),
        frame_number: rng.gen_range(0..1 << 24),
        vdif_version: rng.gen_range(0..8),
        log2_channels: rng.gen_range(0..32),
        frame_length: rng.gen_range(4..1 << 24) * 8,
        data_type: if rng.gen_bool(0.5) {
            DataType::Real
        } else {
            DataType::Complex
        },
        bits_per_sample: rng.gen_range(1..=32),
        thread_id: rng.gen_range(0..1024),
        station_id: rng.gen(),
        extended_user_data: if legacy_mode { None } else { Some(rng.gen()) },
    }
}

// ===========================================================================
// Кодек
// ===========================================================================

#[test]
fn test_frame_round_trip_int8_and_int16() {
    for bits in [8u8, 16] {
        let samples = sawtooth(bits, 800);
        let frame = encode_frame(&samples, 8_000, 15_572_600, 3, 48, 1, bits).unwrap();

        let raw = build_recording(10, 800, 1, bits);
        let mut reader = VdifReader::new(Cursor::new(raw)).unwrap();
        let props = infer_properties(&mut reader).unwrap();

        let (header, window) = decode_frame(&frame, 0, &props).unwrap();
        assert_eq!(header.bits_per_sample, bits);
        assert_eq!(header.frame_number, 3);
        assert_eq!(window.samples, samples, "{bits}-bit samples");
        assert_eq!(window.first_timestamp(), Some(15_572_600.3));
    }
}

#[test]
fn test_decode_header_recovers_random_fields() {
    let mut rng = SmallRng::seed_from_u64(0x5644_4946);

    for _ in 0..500 {
        let h = random_header(&mut rng);
        let mut bytes = h.serialize().unwrap();
        assert_eq!(bytes.len(), h.header_size());

        // заголовок внутри большего буфера, со смещением
        let mut buf = vec![0xAAu8; 24];
        buf.append(&mut bytes);
        buf.extend_from_slice(&[0x55; 8]);

        assert_eq!(decode_header(&buf, 24).unwrap(), h);
    }
}

// ===========================================================================
// Свойства и чтение
// ===========================================================================

#[test]
fn test_infer_properties_ten_frames() {
    let raw = build_recording(10, 800, 1, 8);
    let mut reader = VdifReader::new(Cursor::new(raw)).unwrap();
    let props = infer_properties(&mut reader).unwrap();

    assert_eq!(props.total_frames, 10);
    assert_eq!(props.frames_per_second, 10);
    assert_eq!(props.sample_rate, 10 * props.samples_per_frame);
    assert_eq!(props.sample_rate, 8_000);
    assert_eq!(props.end_seconds_from_epoch - props.start_seconds_from_epoch, 1);
}

#[test]
fn test_on_disk_recording() {
    let tmp = NamedTempFile::new().unwrap();
    let params = StreamParams {
        sample_rate: 8_000,
        frames_per_second: 10,
        ..Default::default()
    };

    let summary = write_file(tmp.path(), &sawtooth(8, 8_000 * 3 + 17), params).unwrap();
    assert_eq!(summary.frames_written, 30);
    assert_eq!(summary.samples_dropped, 17);
    assert_eq!(std::fs::metadata(tmp.path()).unwrap().len(), 30 * 832);

    let props = infer_properties_from_path(tmp.path()).unwrap();
    assert_eq!(props.total_samples, 24_000);

    let report = audit_path(tmp.path()).unwrap();
    assert!(report.is_well_formed());

    let start = props.start_seconds_from_epoch as f64;
    let (header, window) =
        extract_window_from_path(tmp.path(), &props, start + 1.0, start + 2.0).unwrap();
    assert_eq!(header.seconds_from_epoch, props.start_seconds_from_epoch + 1);
    assert_eq!(window.len(), 8_000);

    let mut reader = VdifReader::open(tmp.path()).unwrap();
    let (first, samples) = read_first_frame(&mut reader, &props).unwrap();
    assert_eq!(first.frame_number, 0);
    assert_eq!(samples.len(), 800);
}

// ===========================================================================
// Извлечение окна
// ===========================================================================

#[test]
fn test_full_range_extract() {
    let raw = build_recording(10, 80, 3, 16);
    let mut reader = VdifReader::new(Cursor::new(raw)).unwrap();
    let props = infer_properties(&mut reader).unwrap();

    let start = props.start_seconds_from_epoch as f64;
    let end = props.end_seconds_from_epoch as f64;
    let (header, window) = extract_window(&mut reader, &props, start, end).unwrap();

    assert_eq!(header.frame_number, 0);
    assert_eq!(window.len() as u64, props.total_samples);
    assert!(window.timestamps.iter().all(|&t| t >= start && t < end));
    assert_eq!(window.samples, sawtooth(16, props.total_samples as usize));
}

#[test]
fn test_extract_start_after_end() {
    let raw = build_recording(10, 80, 2, 8);
    let mut reader = VdifReader::new(Cursor::new(raw)).unwrap();
    let props = infer_properties(&mut reader).unwrap();
    let start = props.start_seconds_from_epoch as f64;

    let err = extract_window(&mut reader, &props, start + 1.5, start + 0.5).unwrap_err();
    assert!(matches!(err, VdifError::OutOfRange(_)));
}

#[test]
fn test_extract_across_skipped_second() {
    // секунда 101 отсутствует: кадры 0..10 секунды 100, затем секунды 102
    let seq: Vec<(u32, u32)> = (0..10)
        .map(|n| (100, n))
        .chain((0..10).map(|n| (102, n)))
        .collect();
    let mut reader = VdifReader::new(Cursor::new(frames_with_sequence(&seq))).unwrap();
    let props = infer_properties(&mut reader).unwrap();
    assert_eq!(props.frames_per_second, 10);
    assert_eq!(props.end_seconds_from_epoch, 103);

    // смещения считаются по непрерывной шкале: кадры 5..15 файла
    let (header, window) = extract_window(&mut reader, &props, 100.5, 101.5).unwrap();
    assert_eq!((header.seconds_from_epoch, header.frame_number), (100, 5));
    assert_eq!(window.len(), 10 * 64);

    let ts = &window.timestamps;
    assert_eq!(ts[0], 100.5);
    assert!((ts[5 * 64 - 1] - (100.9 + 63.0 / 640.0)).abs() < 1e-9);
    assert_eq!(ts[5 * 64], 102.0);
    assert!(ts[5 * 64] - ts[5 * 64 - 1] > 1.0);
    let last = window.last_timestamp().unwrap();
    assert!((last - (102.4 + 63.0 / 640.0)).abs() < 1e-9);
}

// ===========================================================================
// Аудит
// ===========================================================================

#[test]
fn test_audit_regular_recording() {
    let raw = build_recording(10, 80, 4, 8);
    let mut reader = VdifReader::new(Cursor::new(raw)).unwrap();
    let report = audit(&mut reader).unwrap();

    assert!(report.is_simple);
    assert!(report.is_contiguous);
    assert!(report.is_ordered);
    assert_eq!(report.per_second_frame_counts.len(), 4);
    assert!(report.per_second_frame_counts.values().all(|&n| n == 10));
    assert_eq!(report.frame_count, 40);
    assert_eq!(report.sample_count, 3_200);
    assert_eq!(report.end_seconds_from_epoch - report.start_seconds_from_epoch, 4);
}

#[test]
fn test_audit_skipped_second() {
    let mut seq: Vec<(u32, u32)> = (0..10).map(|n| (100, n)).collect();
    seq.extend((0..10).map(|n| (102, n)));

    let mut reader = VdifReader::new(Cursor::new(frames_with_sequence(&seq))).unwrap();
    let report = audit(&mut reader).unwrap();

    assert!(!report.is_contiguous);
    assert!(report.is_ordered);
    assert!(report.is_simple);
    assert!(!report.per_second_frame_counts.contains_key(&101));
}

#[test]
fn test_audit_reordered_frames_do_not_short_circuit() {
    let seq = [(100, 0), (102, 0), (101, 0), (101, 1), (103, 0)];
    let mut reader = VdifReader::new(Cursor::new(frames_with_sequence(&seq))).unwrap();
    let report = audit(&mut reader).unwrap();

    assert!(!report.is_ordered);
    assert!(!report.is_contiguous);
    assert!(!report.is_simple);
    assert_eq!(report.frame_count, 5);
    assert_eq!(report.per_second_frame_counts.get(&101), Some(&2));
}
