use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use upbridge::driver::{DriverError, PackedItem, UpdateDriver};
use upbridge::io_stream::{data_stream, ByteArrayStream, ReaderStream};
use upbridge::property::{self, DESCRIPTORS, FORMAT_LEVEL_IDS};
use upbridge::status;
use upbridge::{
    ArchiveFormat, ManagedFault, OutItemFactory, OutItemRecord, UpdateCallback,
    UpdateCallbackAdapter, UpdateOptions,
};

#[derive(Parser)]
#[command(name = "upbridge", about = "Drive files through the archive update-callback adapter")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run files through the adapter and a reference engine, listing what the engine sees
    Pack {
        /// Format: 7z (default), zip, tar, gzip, bzip2
        #[arg(short, long, default_value = "7z")]
        format: String,
        /// Hand file contents over as sequential-only streams
        #[arg(short, long)]
        sequential: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// List the property table
    Props {
        /// Include every property id the engine defines
        #[arg(short, long)]
        all: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { format, sequential, json, input } => {
            let format = parse_format(&format);
            if format.is_flat() && input.len() > 1 {
                return Err(format!("{} holds a single item, got {} inputs", format.name(), input.len()).into());
            }
            let total = input
                .iter()
                .map(|p| fs::metadata(p).map(|m| m.len()))
                .sum::<std::io::Result<u64>>()?;
            let count = u32::try_from(input.len())?;

            let files = FileListCallback { inputs: input, sequential };
            let mut adapter = UpdateCallbackAdapter::new(files, UpdateOptions::create(format));
            let items = match UpdateDriver::new(format).run(&mut adapter, count, total) {
                Ok(items) => items,
                Err(e) => {
                    if let DriverError::Callback { call, status: code, .. } = &e {
                        eprintln!("{call} returned {} ({code:#x})", status::name(*code));
                    }
                    return Err(e.into());
                }
            };
            adapter.close()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_items(format, &items);
            }
        }

        // ── Props ────────────────────────────────────────────────────────────
        Commands::Props { all } => {
            println!("{:<22} {:>6}  {:<30} Kind", "Property", "Id", "Attribute");
            for d in &DESCRIPTORS {
                println!("{:<22} {:>6}  {:<30} {}",
                    d.id.name().unwrap_or("?"), d.id.0, d.attribute.name(), d.kind.name());
            }
            for id in FORMAT_LEVEL_IDS {
                println!("{:<22} {:>6}  {:<30} format-level", id.name().unwrap_or("?"), id.0, "-");
            }
            if all {
                println!();
                for (id, name) in property::known_ids() {
                    let mark = if property::is_supported(upbridge::PropId(*id)) { "*" } else { " " };
                    println!("{mark} {name:<22} {id:>6}");
                }
            }
        }
    }

    Ok(())
}

// ── File-system callback ─────────────────────────────────────────────────────

struct FileListCallback {
    inputs:     Vec<PathBuf>,
    sequential: bool,
}

impl UpdateCallback for FileListCallback {
    type Item = OutItemRecord;

    fn get_item_information(
        &mut self,
        index:   u32,
        factory: OutItemFactory,
    ) -> Result<Option<OutItemRecord>, ManagedFault> {
        let Some(path) = self.inputs.get(index as usize) else {
            return Ok(None);
        };
        let io_fault = |e: std::io::Error| {
            ManagedFault::with_class("IOException", format!("{}: {e}", path.display()))
        };
        let meta = fs::metadata(path).map_err(io_fault)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut item = factory
            .create_out_item()
            .with_path(name)
            .with_is_dir(meta.is_dir())
            .with_size(if meta.is_dir() { 0 } else { meta.len() })
            .with_attributes(windows_attributes(&meta));
        if let Ok(t) = meta.modified() { item = item.with_modification_time(DateTime::<Utc>::from(t)); }
        if let Ok(t) = meta.accessed() { item = item.with_access_time(DateTime::<Utc>::from(t)); }
        if let Ok(t) = meta.created()  { item = item.with_creation_time(DateTime::<Utc>::from(t)); }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            item = item.with_posix_attributes(meta.permissions().mode());
        }

        if meta.is_file() {
            item = if self.sequential {
                item.with_data_stream(data_stream(ReaderStream::new(File::open(path).map_err(io_fault)?)))
            } else {
                item.with_data_stream(data_stream(ByteArrayStream::new(fs::read(path).map_err(io_fault)?)))
            };
        }
        Ok(Some(item))
    }

    fn set_operation_result(&mut self, ok: bool) -> Result<(), ManagedFault> {
        info!(ok, "item processed");
        Ok(())
    }
}

fn windows_attributes(meta: &fs::Metadata) -> u32 {
    const READONLY:  u32 = 0x01;
    const DIRECTORY: u32 = 0x10;
    const ARCHIVE:   u32 = 0x20;
    let mut attrs = if meta.is_dir() { DIRECTORY } else { ARCHIVE };
    if meta.permissions().readonly() { attrs |= READONLY; }
    attrs
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn print_items(format: ArchiveFormat, items: &[PackedItem]) {
    println!("Format: {}", format.name());
    println!("{:<26} {:>12} {:>10} {:<14} Modified", "Path", "Size", "CRC32", "Stream");
    for item in items {
        let crc = item.crc32.map(|c| format!("{c:08x}")).unwrap_or_else(|| "-".into());
        let mtime = item.mtime
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into());
        println!("{:<26} {:>12} {:>10} {:<14} {}",
            item.path.as_deref().unwrap_or("-"),
            item.data_len,
            crc,
            item.stream.as_deref().unwrap_or(if item.is_dir { "dir" } else { "-" }),
            mtime);
    }
}

fn parse_format(s: &str) -> ArchiveFormat {
    ArchiveFormat::from_name(s).unwrap_or_else(|| {
        eprintln!("Unknown format '{}', defaulting to 7z", s);
        ArchiveFormat::SevenZip
    })
}
