use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{CompleteEnv, generate};
use std::path::PathBuf;

use ptouch_rs::command;
use ptouch_rs::error::{Error, Result};
use ptouch_rs::job::{JobController, Label, PrintOptions};
use ptouch_rs::media::Media;
use ptouch_rs::model::{profile_for, window_for, PrinterModel};
use ptouch_rs::raster::PngRasterSource;
use ptouch_rs::status::Status;
use ptouch_rs::transport::{TcpTransport, Transport, UsbTransport};
use ptouch_rs::usb_uri::parse_usb_uri;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Model {
    E550W,
    P750W,
    P900,
    P900W,
    P910BT,
    P950NW,
}

impl From<Model> for PrinterModel {
    fn from(model: Model) -> Self {
        match model {
            Model::E550W => PrinterModel::E550W,
            Model::P750W => PrinterModel::P750W,
            Model::P900 => PrinterModel::P900,
            Model::P900W => PrinterModel::P900W,
            Model::P910BT => PrinterModel::P910BT,
            Model::P950NW => PrinterModel::P950NW,
        }
    }
}

#[derive(Parser)]
#[command(name = "ptouch")]
#[command(about = "CLI for Brother P-touch raster-mode label printers")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a raster image to the printer
    Print(PrintArgs),
    /// Query printer status
    Status(StatusArgs),
    /// Generate shell completion scripts
    Completion(CompletionArgs),
}

#[derive(Args)]
struct PrintArgs {
    /// Printer hostname or IP (TCP, port 9100)
    #[arg(long, conflicts_with = "usb")]
    host: Option<String>,

    /// USB device URI: usb://[VVVV]:PPPP[/SERIAL] (defaults to any matching
    /// device for --printer's product ID)
    #[arg(long, conflicts_with = "host", num_args = 0..=1, default_missing_value = "")]
    usb: Option<String>,

    #[arg(long, value_enum)]
    printer: Model,

    /// Grayscale PNG to print
    #[arg(long)]
    image: PathBuf,

    /// Laminated tape width in mm
    #[arg(long, conflicts_with = "tube_width")]
    tape_width: Option<f32>,

    /// Heat-shrink tube diameter in mm
    #[arg(long, conflicts_with = "tape_width")]
    tube_width: Option<f32>,

    /// Label feed margin in mm [default: 1mm]
    #[arg(long)]
    margin: Option<f32>,

    #[arg(long)]
    high_resolution: bool,

    #[arg(long)]
    no_compression: bool,

    /// Number of copies to print in one job
    #[arg(long, default_value_t = 1)]
    copies: u32,

    /// Full cut after every label instead of half-cut between labels
    #[arg(long)]
    full_cut: bool,
}

#[derive(Args)]
struct StatusArgs {
    #[arg(long, conflicts_with = "usb")]
    host: Option<String>,

    #[arg(long, conflicts_with = "host", num_args = 0..=1, default_missing_value = "")]
    usb: Option<String>,

    #[arg(long, value_enum)]
    printer: Model,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(Args)]
struct CompletionArgs {
    #[arg(value_enum)]
    shell: clap_complete::Shell,
}

enum TransportTarget {
    Tcp(String),
    Usb { vendor_id: u16, product_id: u16, serial: Option<String> },
}

fn resolve_transport_target(
    host: Option<String>,
    usb: Option<String>,
    model: PrinterModel,
) -> Result<TransportTarget> {
    match (host, usb) {
        (Some(host), None) => Ok(TransportTarget::Tcp(host)),
        (None, Some(uri)) if uri.is_empty() => Ok(TransportTarget::Usb {
            vendor_id: ptouch_rs::model::USB_VENDOR_ID,
            product_id: model.usb_product_id(),
            serial: None,
        }),
        (None, Some(uri)) => {
            let parsed = parse_usb_uri(&uri)?;
            Ok(TransportTarget::Usb {
                vendor_id: parsed.vendor_id.unwrap_or(ptouch_rs::model::USB_VENDOR_ID),
                product_id: parsed.product_id,
                serial: parsed.serial,
            })
        }
        (None, None) => Ok(TransportTarget::Usb {
            vendor_id: ptouch_rs::model::USB_VENDOR_ID,
            product_id: model.usb_product_id(),
            serial: None,
        }),
        (Some(_), Some(_)) => unreachable!("clap enforces --host/--usb are mutually exclusive"),
    }
}

fn open_transport(target: TransportTarget) -> Result<Box<dyn Transport>> {
    match target {
        TransportTarget::Tcp(host) => Ok(Box::new(TcpTransport::connect(&host)?)),
        TransportTarget::Usb { vendor_id, product_id, serial } => {
            Ok(Box::new(UsbTransport::open(vendor_id, product_id, serial.as_deref())?))
        }
    }
}

fn resolve_media(tape_width: Option<f32>, tube_width: Option<f32>) -> Result<Media> {
    match (tape_width, tube_width) {
        (Some(mm), None) => Media::laminated_tape_mm(mm)
            .ok_or_else(|| Error::ValidationError(format!("no laminated tape of width {mm}mm"))),
        (None, Some(mm)) => Media::heat_shrink_tube_mm(mm)
            .ok_or_else(|| Error::ValidationError(format!("no heat-shrink tube of diameter {mm}mm"))),
        (None, None) => Err(Error::ValidationError("one of --tape-width or --tube-width is required".to_string())),
        (Some(_), Some(_)) => unreachable!("clap enforces --tape-width/--tube-width are mutually exclusive"),
    }
}

fn run_print(args: PrintArgs) -> Result<()> {
    if args.copies == 0 {
        return Err(Error::ValidationError("--copies must be at least 1".to_string()));
    }

    let model: PrinterModel = args.printer.into();
    let profile = profile_for(model);
    let media = resolve_media(args.tape_width, args.tube_width)?;
    let window = window_for(&profile, media)?;

    let png_bytes = std::fs::read(&args.image)
        .map_err(|e| Error::ValidationError(format!("cannot read {}: {e}", args.image.display())))?;

    let target = resolve_transport_target(args.host, args.usb, model)?;
    let transport = open_transport(target)?;
    let mut controller = JobController::new(transport, profile);

    let options = PrintOptions {
        use_compression: !args.no_compression,
        half_cut: !args.full_cut,
    };

    let mut sources = Vec::with_capacity(args.copies as usize);
    for _ in 0..args.copies {
        sources.push(PngRasterSource::from_bytes(&png_bytes, window.printable_pins)?);
    }

    let mut labels: Vec<Label> = sources
        .iter_mut()
        .map(|source| Label {
            source,
            media,
            margin_mm: args.margin,
            high_resolution: args.high_resolution,
        })
        .collect();

    controller.print_multi(&mut labels, &options)?;
    println!("Print job sent successfully");
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<()> {
    let model: PrinterModel = args.printer.into();
    let target = resolve_transport_target(args.host, args.usb, model)?;
    let mut transport = open_transport(target)?;

    let mut frame = command::Frame::new();
    frame.invalidate().initialize().status_request();
    transport.write_all(&frame.build())?;

    match transport.read_status()? {
        Some(raw) => {
            let status = Status::parse(&raw)?;
            status.print_summary(args.verbose);
        }
        None => println!("Printer did not respond to the status request"),
    }

    transport.close()
}

fn run_completion(args: CompletionArgs) -> Result<()> {
    match args.shell {
        clap_complete::Shell::Zsh => {
            unsafe {
                std::env::set_var("COMPLETE", "zsh");
            }
            CompleteEnv::with_factory(Cli::command).complete();
        }
        _ => {
            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "ptouch", &mut std::io::stdout());
        }
    }
    Ok(())
}

fn main() -> std::process::ExitCode {
    env_logger::init();
    CompleteEnv::with_factory(Cli::command).complete();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Print(args) => run_print(args),
        Commands::Status(args) => run_status(args),
        Commands::Completion(args) => run_completion(args),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::ExitCode::FAILURE
        }
    }
}
