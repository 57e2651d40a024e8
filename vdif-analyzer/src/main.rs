use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use vdif_analyzer::{
    build_recording, matched_filter, parse_freq_hz, parse_seconds, AnalyzerConfig, AnalyzerError,
    AnalyzerResult, BuildConfig,
};
use vdif_core::{
    audit_path, extract_window, format_timestamp, infer_properties, parse_time_input,
    read_first_frame, FilePropertiesExt, VdifReader,
};
use vdif_doppler::{RttProfile, TimeWarp};
use vdif_types::{FileProperties, FrameHeader, SampleWindow};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Parser, Debug)]
#[command(
    name = "vdif-analyzer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect, synthesize and correlate VDIF recordings",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Тихий режим (только ошибки)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Свойства файла по первому и последнему кадрам
    Props { file: PathBuf },
    /// Проверка порядка, непрерывности и регулярности кадров
    Audit { file: PathBuf },
    /// Заголовок и выборки первого кадра
    Frame {
        file: PathBuf,
        /// Сколько выборок показать
        #[arg(short = 'n', long, default_value = "16")]
        samples: usize,
    },
    /// Выборки в интервале времени
    Extract(WindowArgs),
    /// Синтез записи с ЛЧМ-импульсами
    Build(BuildArgs),
    /// Согласованный фильтр по интервалу записи
    Correlate(CorrelateArgs),
}

#[derive(Args, Debug)]
struct WindowArgs {
    file: PathBuf,
    /// Начало: секунды от эпохи или "YYYY-MM-DD HH:MM:SS.fff". По умолчанию: начало файла
    #[arg(short, long)]
    start: Option<String>,
    /// Конец в том же формате. По умолчанию: конец файла
    #[arg(short, long)]
    end: Option<String>,
    /// Сколько выборок показать
    #[arg(short = 'n', long, default_value = "8")]
    samples: usize,
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Частота дискретизации (8MHz, 8000000)
    #[arg(short = 'r', long, default_value = "8MHz")]
    rate: String,
    /// Полоса ЛЧМ-импульса
    #[arg(short, long, default_value = "4MHz")]
    bandwidth: String,
    /// Длительность импульса (2.5us)
    #[arg(long, default_value = "2.5us")]
    pulse_width: String,
    /// Период повторения импульсов
    #[arg(long, default_value = "25us")]
    pulse_period: String,
    /// Длительность записи
    #[arg(short, long, default_value = "10s")]
    duration: String,
    /// Reference epoch (полугодия от 2000 года)
    #[arg(long, default_value = "48")]
    epoch: u8,
    /// Время первой выборки, секунды от эпохи
    #[arg(long, default_value = "15572600")]
    start: f64,
    /// Отношение сигнал/шум
    #[arg(long, default_value = "1.0")]
    snr: f64,
    /// Одинаковая фаза всех импульсов
    #[arg(long)]
    fixed_phase: bool,
    /// Кадров в секунду
    #[arg(long, default_value = "1000")]
    frames_per_second: u32,
    /// Бит на выборку: 8 или 16
    #[arg(long, default_value = "8")]
    bits: u8,
    #[arg(long, default_value = "0")]
    station: u16,
    /// Зерно генератора шума и фаз
    #[arg(long)]
    seed: Option<u64>,
    /// Таблица RTT (секунды rtt) для доплеровского сдвига
    #[arg(long)]
    rtt: Option<PathBuf>,
    /// Путь к выходному файлу. По умолчанию: имя из параметров
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CorrelateArgs {
    #[command(flatten)]
    window: WindowArgs,
    /// Полоса ЛЧМ-импульса
    #[arg(short, long, default_value = "4MHz")]
    bandwidth: String,
    /// Длительность импульса
    #[arg(long, default_value = "2.5us")]
    pulse_width: String,
    /// Начальная фаза шаблона (рад)
    #[arg(long, default_value = "0.0")]
    phase: f64,
    /// Длина строки fast time
    #[arg(long, default_value = "25us")]
    fast_time: String,
    /// Сколько отсчётов около нулевого сдвига обнулять
    #[arg(long, default_value = "100")]
    zero_lag: usize,
    /// Таблица RTT для снятия доплеровского сдвига
    #[arg(long)]
    rtt: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let result = match cli.command {
        Commands::Props { file } => cmd_props(&file),
        Commands::Audit { file } => cmd_audit(&file),
        Commands::Frame { file, samples } => cmd_frame(&file, samples),
        Commands::Extract(args) => cmd_extract(&args),
        Commands::Build(args) => cmd_build(args),
        Commands::Correlate(args) => cmd_correlate(args),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn open(file: &Path) -> AnalyzerResult<(VdifReader<std::fs::File>, FileProperties)> {
    let mut reader = VdifReader::open(file)?;
    let props = infer_properties(&mut reader)?;
    Ok((reader, props))
}

fn cmd_props(file: &Path) -> AnalyzerResult<()> {
    let (_, props) = open(file)?;
    print_properties(&props)
}

fn cmd_audit(file: &Path) -> AnalyzerResult<()> {
    let report = audit_path(file)?;

    println!("{RULE}");
    println!("  Frames        : {}", report.frame_count);
    println!("  Samples       : {}", report.sample_count);
    println!("  Invalid frames: {}", report.invalid_frame_count);
    println!(
        "  Coverage      : {} .. {} s (epoch {})",
        report.start_seconds_from_epoch, report.end_seconds_from_epoch, report.reference_epoch
    );
    println!("  Ordered       : {}", report.is_ordered);
    println!("  Contiguous    : {}", report.is_contiguous);
    println!("  Simple        : {}", report.is_simple);
    if let Some(fps) = report.uniform_frames_per_second() {
        println!("  Frames/second : {fps}");
    }
    println!("{RULE}");

    if !report.is_well_formed() {
        warn!("{} is not a well-formed recording", file.display());
    }
    Ok(())
}

fn cmd_frame(
    file: &Path,
    samples: usize,
) -> AnalyzerResult<()> {
    let (mut reader, props) = open(file)?;
    let (header, window) = read_first_frame(&mut reader, &props)?;

    print_header(&header)?;
    print_samples(&header, &window, samples)?;
    Ok(())
}

fn cmd_extract(args: &WindowArgs) -> AnalyzerResult<()> {
    let (mut reader, props) = open(&args.file)?;
    let (start, end) = resolve_range(&props, args)?;
    let (header, window) = extract_window(&mut reader, &props, start, end)?;

    print_header(&header)?;
    print_samples(&header, &window, args.samples)?;
    Ok(())
}

fn cmd_build(args: BuildArgs) -> AnalyzerResult<()> {
    let config = build_config(args)?;

    info!("{RULE}");
    info!("  Sample rate   : {:.3} Msps", config.sample_rate_hz as f64 / 1e6);
    info!("  Bandwidth     : {:.3} MHz", config.bandwidth_hz / 1e6);
    info!(
        "  Pulse         : {:.2} us every {:.2} us",
        config.pulse_width_s * 1e6,
        config.pulse_period_s * 1e6
    );
    info!("  Duration      : {} s", config.duration_s);
    info!(
        "  Start         : {} ({})",
        config.start_seconds_from_epoch,
        format_timestamp(config.reference_epoch, config.start_seconds_from_epoch)?
    );
    info!("  SNR           : {}", config.snr);
    info!("  Bits/sample   : {}", config.bits_per_sample);
    if let Some(rtt) = &config.rtt_table {
        info!("  RTT table     : {}", rtt.display());
    }
    info!("  Output        : {}", config.output_path().display());
    info!("{RULE}");

    let (path, summary) = build_recording(&config)?;

    if summary.samples_dropped > 0 {
        warn!(
            "{} trailing samples did not fill a frame and were dropped",
            summary.samples_dropped
        );
    }
    info!(
        "✓ {} frames of {} bytes written to {}",
        summary.frames_written,
        summary.frame_length,
        path.display()
    );
    Ok(())
}

fn cmd_correlate(args: CorrelateArgs) -> AnalyzerResult<()> {
    let config = AnalyzerConfig {
        bandwidth_hz: parse_freq_hz(&args.bandwidth)
            .map_err(|e| AnalyzerError::config(format!("--bandwidth: {e}")))?
            as f64,
        pulse_width_s: parse_seconds(&args.pulse_width)
            .map_err(|e| AnalyzerError::config(format!("--pulse-width: {e}")))?,
        phase_offset: args.phase,
        fast_time_s: parse_seconds(&args.fast_time)
            .map_err(|e| AnalyzerError::config(format!("--fast-time: {e}")))?,
        zero_lag_width: args.zero_lag,
        rtt_table: args.rtt,
    };
    config.validate()?;

    let (mut reader, props) = open(&args.window.file)?;
    let (start, end) = resolve_range(&props, &args.window)?;
    let (_, window) = extract_window(&mut reader, &props, start, end)?;
    let sample_rate = props.sample_rate as f64;

    let samples = match (&config.rtt_table, window.first_timestamp()) {
        (Some(table), Some(first)) => {
            let profile = RttProfile::from_path(table)?;
            let mut rtt = profile.resample(first, window.len() as f64 / sample_rate, sample_rate)?;
            let last = rtt.last().copied().unwrap_or_default();
            rtt.resize(window.len(), last);

            let (compensated, stats) =
                TimeWarp::new(&rtt, sample_rate)?.inverse_buffer(&window.samples)?;
            info!(
                "Doppler compensation: {} written, {} collisions, {} dropped",
                stats.written, stats.collisions, stats.dropped
            );
            compensated
        }
        _ => window.samples,
    };

    let result = matched_filter(&samples.to_f64(), sample_rate, &config)?;

    println!("{RULE}");
    println!("  Window        : {start} .. {end} s, {} samples", samples.len());
    println!(
        "  Slow time     : {} rows x {} samples",
        result.rows.len(),
        result.intensity.len()
    );
    if let Some((lag, value)) = result.peak_lag() {
        println!(
            "  Peak lag      : {lag} samples ({:.3} us), value {value:.1}",
            lag as f64 / sample_rate * 1e6
        );
    }
    if let Some(lag) = result.intensity_peak_lag() {
        println!(
            "  Fast-time peak: {lag} samples ({:.3} us)",
            lag as f64 / sample_rate * 1e6
        );
    }
    println!("{RULE}");
    Ok(())
}

fn build_config(args: BuildArgs) -> AnalyzerResult<BuildConfig> {
    let sample_rate_hz =
        parse_freq_hz(&args.rate).map_err(|e| AnalyzerError::config(format!("--rate: {e}")))?;
    let bandwidth_hz = parse_freq_hz(&args.bandwidth)
        .map_err(|e| AnalyzerError::config(format!("--bandwidth: {e}")))?;
    let pulse_width_s = parse_seconds(&args.pulse_width)
        .map_err(|e| AnalyzerError::config(format!("--pulse-width: {e}")))?;
    let pulse_period_s = parse_seconds(&args.pulse_period)
        .map_err(|e| AnalyzerError::config(format!("--pulse-period: {e}")))?;
    let duration_s = parse_seconds(&args.duration)
        .map_err(|e| AnalyzerError::config(format!("--duration: {e}")))?;

    let config = BuildConfig {
        sample_rate_hz,
        bandwidth_hz: bandwidth_hz as f64,
        pulse_width_s,
        pulse_period_s,
        duration_s,
        reference_epoch: args.epoch,
        start_seconds_from_epoch: args.start,
        snr: args.snr,
        randomise_phase: !args.fixed_phase,
        frames_per_second: args.frames_per_second,
        bits_per_sample: args.bits,
        station_id: args.station,
        seed: args.seed,
        rtt_table: args.rtt,
        output: args.output,
    };
    config.validate()?;
    Ok(config)
}

/// Границы окна из аргументов; отсутствующие берутся из покрытия файла.
fn resolve_range(
    props: &FileProperties,
    args: &WindowArgs,
) -> AnalyzerResult<(f64, f64)> {
    let parse = |value: &Option<String>, default: u32| -> AnalyzerResult<f64> {
        match value {
            Some(s) => Ok(parse_time_input(s, props.reference_epoch)?),
            None => Ok(default as f64),
        }
    };

    let start = parse(&args.start, props.start_seconds_from_epoch)?;
    let end = parse(&args.end, props.end_seconds_from_epoch)?;
    props.validate_range(start, end)?;
    Ok((start, end))
}

fn print_properties(props: &FileProperties) -> AnalyzerResult<()> {
    println!("{RULE}");
    println!("  Frame length  : {} B ({} B header)", props.frame_length, props.header_size);
    println!("  Bits/sample   : {}", props.bits_per_sample);
    println!("  Samples/frame : {}", props.samples_per_frame);
    println!("  Frames/second : {}", props.frames_per_second);
    println!("  Sample rate   : {:.3} Msps", props.sample_rate as f64 / 1e6);
    println!("  Station       : {}", props.station_id);
    println!("  Epoch         : {}", props.reference_epoch);
    println!(
        "  Start         : {} s ({})",
        props.start_seconds_from_epoch,
        props.start_datetime()?
    );
    println!(
        "  End           : {} s ({})",
        props.end_seconds_from_epoch,
        props.end_datetime()?
    );
    println!("  Duration      : {} s", props.duration_secs());
    println!("  Frames        : {}", props.total_frames);
    println!("  Samples       : {}", props.total_samples);
    println!("{RULE}");
    Ok(())
}

fn print_header(header: &FrameHeader) -> AnalyzerResult<()> {
    println!("{RULE}");
    println!(
        "  Time          : {} s #{} ({})",
        header.seconds_from_epoch,
        header.frame_number,
        format_timestamp(header.reference_epoch, header.seconds_from_epoch as f64)?
    );
    println!(
        "  Version       : {}{}",
        header.vdif_version,
        if header.legacy_mode { " (legacy)" } else { "" }
    );
    println!("  Frame length  : {} B", header.frame_length);
    println!(
        "  Data          : {:?}, {} bit, {} channel(s)",
        header.data_type,
        header.bits_per_sample,
        header.num_channels()
    );
    println!("  Station/thread: {} / {}", header.station_id, header.thread_id);
    if header.invalid_data {
        println!("  Invalid data  : yes");
    }
    Ok(())
}

fn print_samples(
    header: &FrameHeader,
    window: &SampleWindow,
    shown: usize,
) -> AnalyzerResult<()> {
    println!("  Samples       : {}", window.len());

    for (label, t) in [("First", window.first_timestamp()), ("Last", window.last_timestamp())] {
        if let Some(t) = t {
            println!(
                "  {label:<14}: {t:.9} s ({})",
                format_timestamp(header.reference_epoch, t)?
            );
        }
    }

    for (t, v) in window.iter().take(shown) {
        println!("    {t:.9}  {v:>6}");
    }
    println!("{RULE}");
    Ok(())
}
