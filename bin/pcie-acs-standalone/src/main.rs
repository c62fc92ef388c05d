// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use slog::{o, Drain};

use pcie_acs::checks::pcie_group;
use pcie_acs::cfg::ConfigSpace;
use pcie_acs::platform::mcfg::SYSFS_MCFG_PATH;
use pcie_acs::platform::{McfgPlatform, StaticPlatform};
use pcie_acs::{EcamTable, PcieInfo, Platform, Sequencer, SkipList, Status};
use pcie_acs_config_toml::Config;

mod devmem;

fn build_log() -> (slog::Logger, slog_async::AsyncGuard) {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let (drain, guard) = slog_async::Async::new(drain).build_with_guard();
    (slog::Logger::root(drain.fuse(), o!()), guard)
}

/// Picks the source of ECAM regions: a named MCFG table first, then static
/// regions from the config, then the MCFG table exported by the kernel.
fn build_platform(
    config: &Config,
    log: &slog::Logger,
) -> anyhow::Result<Box<dyn Platform>> {
    if let Some(path) = &config.platform.mcfg {
        slog::info!(log, "Using MCFG table"; "path" => path);
        let platform = McfgPlatform::load(path)
            .with_context(|| format!("Failed to load MCFG table {path}"))?;
        return Ok(Box::new(platform));
    }

    let regions = config.ecam_regions();
    if !regions.is_empty() {
        slog::info!(log, "Using static ECAM regions from config";
            "count" => regions.len());
        return Ok(Box::new(StaticPlatform::new(regions)));
    }

    slog::info!(log, "Using MCFG table"; "path" => SYSFS_MCFG_PATH);
    let platform = McfgPlatform::load(Path::new(SYSFS_MCFG_PATH))
        .context("Failed to load MCFG table from sysfs")?;
    Ok(Box::new(platform))
}

/// Discovers the ECAM regions and runs `group` against physical memory.
fn run_group(
    group: &Sequencer,
    config: &Config,
    level: u32,
    dev_mem: &Path,
    log: &slog::Logger,
) -> anyhow::Result<Status> {
    let platform = build_platform(config, log)?;
    let mut info =
        PcieInfo::new(platform, log.new(o!("component" => "ecam")));
    info.create_info_table(EcamTable::default());

    let mem_log = log.new(o!("component" => "mmio"));
    let mem = devmem::DevMem::open(dev_mem, mem_log)
        .with_context(|| format!("Cannot open {}", dev_mem.display()))?;

    slog::info!(log, "Running PCIe tests"; "count" => group.len());
    let status = {
        let cfg = ConfigSpace::new(&info, &mem);
        group.execute_tests(&cfg, level, config.main.num_pe)
    };
    info.free_info_table();
    Ok(status)
}

#[derive(clap::Parser)]
/// Runs the PCIe compliance tests against the ECAM regions of this host.
struct Args {
    /// Configuration file. Without one, defaults apply and the ECAM layout
    /// is read from the kernel's copy of the MCFG table.
    #[clap(value_name = "CONFIG", action)]
    config: Option<PathBuf>,

    /// Compliance level, overriding the config file.
    #[clap(short, long, action)]
    level: Option<u32>,

    /// Test or group number to skip, overriding the config file. May be
    /// repeated.
    #[clap(short, long)]
    skip: Vec<u32>,

    /// Device providing physical memory access.
    #[clap(long, value_name = "PATH", default_value = "/dev/mem", action)]
    dev_mem: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let Args { config, level, skip, dev_mem } = Args::parse();

    let (log, log_async_guard) = build_log();

    let config = match config {
        Some(path) => pcie_acs_config_toml::parse(&path).with_context(|| {
            format!("Failed to parse config {}", path.display())
        })?,
        None => Config::default(),
    };
    let level = level.unwrap_or(config.main.level);
    let skip = if skip.is_empty() { config.main.skip.clone() } else { skip };
    let skip = SkipList::new(&skip).context("Invalid skip list")?;

    let group = pcie_group(skip, log.new(o!("group" => "pcie")));
    let status = match group.skipped_as_group(level) {
        Some(status) => status,
        None => run_group(&group, &config, level, &dev_mem, &log)?,
    };

    slog::info!(log, "PCIe compliance complete"; "status" => %status);

    // Flush buffered log records before exiting with the status code
    drop(log);
    drop(log_async_guard);
    std::process::exit(status.code());
}
