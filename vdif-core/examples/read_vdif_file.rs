//! Пример: свойства, аудит и первая секунда VDIF-файла

use vdif_core::{audit, extract_window, format_timestamp, infer_properties, VdifReader};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "vdif-core/test_output.vdif".to_string());

    let mut reader = VdifReader::open(&path)?;
    let props = infer_properties(&mut reader)?;

    println!("File       : {path}");
    println!("Frames     : {} × {} bytes", props.total_frames, props.frame_length);
    println!("Sample rate: {} Hz", props.sample_rate);
    println!(
        "Coverage   : {} .. {}",
        format_timestamp(props.reference_epoch, props.start_seconds_from_epoch as f64)?,
        format_timestamp(props.reference_epoch, props.end_seconds_from_epoch as f64)?
    );

    let report = audit(&mut reader)?;
    println!(
        "Audit      : simple={} contiguous={} ordered={}",
        report.is_simple, report.is_contiguous, report.is_ordered
    );

    let start = props.start_seconds_from_epoch as f64;
    let (header, window) = extract_window(&mut reader, &props, start, start + 1.0)?;
    let peak = window.samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);

    println!(
        "First sec  : {} samples from frame #{}, peak |x| = {peak}",
        window.len(),
        header.frame_number
    );

    Ok(())
}
