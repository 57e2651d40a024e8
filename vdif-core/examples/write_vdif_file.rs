//! Пример: запись VDIF-файла через VdifWriter
//!
//! Две секунды синусоиды 1 кГц при 8 МГц, 1000 кадров в секунду.

use std::fs::File;

use vdif_core::{StreamParams, VdifWriter};
use vdif_types::SampleBuffer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_path = "vdif-core/test_output.vdif";

    let params = StreamParams::default();
    let sample_rate = params.sample_rate;
    let mut writer = VdifWriter::new(File::create(output_path)?, params)?;

    // по 10 мс за вызов: границы кадров не обязаны совпадать с вызовами
    let chunk = sample_rate as usize / 100;
    for block_idx in 0..200 {
        let samples: Vec<i8> = (0..chunk)
            .map(|i| {
                let t = (block_idx * chunk + i) as f64 / sample_rate as f64;
                (100.0 * (2.0 * std::f64::consts::PI * 1_000.0 * t).sin()) as i8
            })
            .collect();
        writer.write_samples(&SampleBuffer::from(samples))?;
    }

    let summary = writer.finish()?;

    println!("✓ Записано: {output_path}");
    println!("  Frames   : {}", summary.frames_written);
    println!("  Samples  : {}", summary.samples_written);
    println!("  Frame len: {} bytes", summary.frame_length);

    Ok(())
}
