//! Headless host for the SPI controller model.
//!
//! Wires a [`SpiController`] to a configurable downstream device and runs a
//! register-access script against it, printing every read, every interrupt
//! and chip-select level change, and any watchpoint hits.
//!
//! ```text
//! spi-sim script.txt --config host.toml --watch TXDATA -v
//! spi-sim script.txt --save-state run.state
//! spi-sim more.txt --load-state run.state
//! ```

mod host;
mod script;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use spi_core::bus::LevelLog;
use spi_core::debugger::{dump_registers, WatchKind};
use spi_core::regs::register_name;
use spi_core::{savestate, SpiController};

use host::{Device, HostConfig};
use script::{Op, Step};

type Sim = SpiController<Device, LevelLog, LevelLog>;

#[derive(Debug, Parser)]
#[command(name = "spi-sim", version, about = "Run register-access scripts against the SPI controller model")]
struct Cli {
    /// Register-access script
    script: PathBuf,

    /// Host configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of chip-select lines
    #[arg(long)]
    num_cs: Option<u8>,

    /// Watch a register (name or offset) for reads and writes
    #[arg(short, long = "watch")]
    watches: Vec<String>,

    /// Restore controller state before running
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Save controller state after running
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Print a register dump after the script
    #[arg(short, long)]
    dump: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &cli.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    if let Some(n) = cli.num_cs {
        config.spi.num_cs = n;
    }
    log::info!("spi config: {:?}, device: {:?}", config.spi, config.device);

    let text = std::fs::read_to_string(&cli.script)
        .with_context(|| format!("reading {}", cli.script.display()))?;
    let steps = script::parse(&text)?;

    let mut spi = SpiController::new(
        config.spi,
        Device::new(config.device.clone()),
        LevelLog::new(),
        LevelLog::new(),
    )?;

    for w in &cli.watches {
        let offset = script::parse_offset(w)?;
        spi.debugger.add_watchpoint(offset, WatchKind::ReadWrite);
    }

    if let Some(path) = &cli.load_state {
        let state = savestate::load_from_file(path)?;
        spi.load_state(&state)?;
        println!("Loaded state from {}", path.display());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mismatches = run(&mut spi, &steps, &mut out)?;

    if cli.dump {
        write!(out, "{}", dump_registers(spi.registers()))?;
    }
    if !cli.watches.is_empty() {
        write!(out, "{}", spi.debugger.list_watchpoints())?;
    }
    writeln!(out, "{} accesses, {} transfers, irq={}",
        steps.len(), spi.transfers, spi.irq_level() as u8)?;

    if let Some(path) = &cli.save_state {
        savestate::save_to_file(&spi.save_state(), path)?;
        writeln!(out, "Saved state to {}", path.display())?;
    }

    if mismatches > 0 {
        bail!("{} read(s) did not match the expected value", mismatches);
    }
    Ok(())
}

/// Execute `steps`, printing each access and the line changes it caused.
/// Returns the number of reads that did not match their expected value.
fn run<W: Write>(spi: &mut Sim, steps: &[Step], out: &mut W) -> Result<usize> {
    let mut mismatches = 0;
    let mut irq_seen = spi.irq_line().events.len();
    let mut cs_seen = spi.cs_lines().events.len();

    for step in steps {
        match step.op {
            Op::Write { offset, value } => {
                spi.write(offset, value);
                writeln!(out, "{:4}: w 0x{:02X} {:<7} <- 0x{:08X}",
                    step.line, offset, register_name(offset).unwrap_or("-"), value)?;
            }
            Op::Read { offset, expect } => {
                let value = spi.read(offset);
                write!(out, "{:4}: r 0x{:02X} {:<7} -> 0x{:08X}",
                    step.line, offset, register_name(offset).unwrap_or("-"), value)?;
                match expect {
                    Some(e) if e != value => {
                        mismatches += 1;
                        writeln!(out, "  MISMATCH (expected 0x{:08X})", e)?;
                    }
                    _ => writeln!(out)?,
                }
            }
            Op::Reset => {
                spi.reset();
                writeln!(out, "{:4}: reset", step.line)?;
            }
            Op::Dump => {
                writeln!(out, "{:4}: dump", step.line)?;
                write!(out, "{}", dump_registers(spi.registers()))?;
            }
        }

        for &(_, level) in &spi.irq_line().events[irq_seen..] {
            writeln!(out, "      irq -> {}", level as u8)?;
        }
        irq_seen = spi.irq_line().events.len();
        for &(line, level) in &spi.cs_lines().events[cs_seen..] {
            writeln!(out, "      cs{} -> {}", line, level as u8)?;
        }
        cs_seen = spi.cs_lines().events.len();

        if let Some(hit) = spi.debugger.take_hit() {
            writeln!(out, "      watch [{}] {:?} 0x{:02X}: 0x{:08X} -> 0x{:08X}",
                hit.index, hit.access, hit.offset, hit.old_val, hit.new_val)?;
        }
    }
    Ok(mismatches)
}
