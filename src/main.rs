use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use npx_acquire::core::Frame;
use npx_acquire::engine::{AcquisitionConfig, AcquisitionLoop};
use npx_acquire::hal::mock::SimulatedProbe;
use npx_acquire::hal::{PacketFileSource, ProbeSource};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "npx-acquire", about = "Stream channel-major frames from a neural probe")]
struct Cli {
    #[command(subcommand)]
    source: SourceCommand,
}

#[derive(Subcommand)]
enum SourceCommand {
    /// Acquire from the synthetic probe
    Simulate {
        /// Stop with end of stream after this many packets
        #[arg(long)]
        packets: Option<u64>,

        #[command(flatten)]
        acquisition: AcquisitionArgs,
    },
    /// Replay a packet capture file
    Play {
        file: PathBuf,

        #[command(flatten)]
        acquisition: AcquisitionArgs,
    },
}

#[derive(Args)]
struct AcquisitionArgs {
    /// Target sampling frequency in Hz (0 disables pacing)
    #[arg(long, default_value_t = 30000.0)]
    frequency: f64,

    /// Packets per emitted frame
    #[arg(long, default_value_t = 1)]
    buffer_size: usize,

    /// Cancel after this many frames
    #[arg(long)]
    frames: Option<u64>,
}

impl AcquisitionArgs {
    fn config(&self) -> AcquisitionConfig {
        AcquisitionConfig {
            frequency_hz: self.frequency,
            buffer_size: self.buffer_size,
            ..AcquisitionConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let (source, args): (Box<dyn ProbeSource>, AcquisitionArgs) = match cli.source {
        SourceCommand::Simulate { packets, acquisition } => {
            let mut probe = SimulatedProbe::new();
            if let Some(limit) = packets {
                probe = probe.with_packet_limit(limit);
            }
            (Box::new(probe), acquisition)
        }
        SourceCommand::Play { file, acquisition } => {
            (Box::new(PacketFileSource::new(&file)?), acquisition)
        }
    };

    let mut acquisition = AcquisitionLoop::new(source, args.config())?.start()?;
    let metrics = acquisition.metrics();

    let token = acquisition.cancel_token();

    loop {
        tokio::select! {
            result = acquisition.next_frame() => match result {
                Some(Ok(frame)) => {
                    log_frame(&frame);
                    if args.frames.is_some_and(|limit| frame.sequence_id + 1 >= limit) {
                        token.cancel();
                    }
                }
                Some(Err(e)) => {
                    let e = anyhow::Error::new(e);
                    error!(error = %format!("{e:#}"), "acquisition failed");
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping acquisition");
                token.cancel();
            }
        }
    }

    let report = tokio::task::spawn_blocking(move || acquisition.join()).await?;
    info!(?report, metrics = ?metrics.snapshot(), "done");
    Ok(())
}

fn log_frame(frame: &Frame) {
    let first_channel = frame.ap_data.row(0).unwrap_or(&[]);
    let rms = if first_channel.is_empty() {
        0.0
    } else {
        (first_channel.iter().map(|x| x * x).sum::<f32>() / first_channel.len() as f32).sqrt()
    };

    info!(
        sequence_id = frame.sequence_id,
        packets = frame.packet_count(),
        samples = frame.sample_count(),
        channels = frame.channel_count(),
        buffer_capacity = frame.buffer_capacity,
        ch0_rms = rms,
        "frame"
    );
}
