//! Host identity discovery and OS-level utilization samplers
//!
//! The samplers read Linux `/proc` (CPU, memory) and `statvfs` (disk). On
//! platforms where a reading is unavailable they return a descriptive error
//! so the evaluator logs and skips the cycle instead of alerting on a
//! fabricated value.

use std::time::Duration;

use async_trait::async_trait;

use crate::sampler::{Metric, MetricSampler};

const PROC_STAT: &str = "/proc/stat";
const PROC_MEMINFO: &str = "/proc/meminfo";

/// Interval between the two /proc/stat reads a CPU sample is computed from
const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(250);

/// Hostname and primary IP of the machine being monitored
#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub hostname: String,
    pub ip: String,
}

impl HostIdentity {
    /// Best-effort discovery; falls back to placeholder strings rather than
    /// failing, since alerts are still useful without a resolvable identity.
    pub fn discover() -> Self {
        Self {
            hostname: discover_hostname().unwrap_or_else(|| "Unknown Host".to_string()),
            ip: discover_ip().unwrap_or_else(|| "Unknown IP".to_string()),
        }
    }
}

fn discover_hostname() -> Option<String> {
    if let Ok(name) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty())
}

/// Routing-table trick: connecting a UDP socket sends no traffic but lets
/// the OS pick the outbound interface address.
fn discover_ip() -> Option<String> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

/// Disk utilization of the filesystem holding `path`
#[derive(Debug)]
pub struct DiskSampler {
    path: String,
}

impl DiskSampler {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MetricSampler for DiskSampler {
    fn metric(&self) -> Metric {
        Metric::Disk
    }

    async fn sample(&self) -> crate::Result<f64> {
        statvfs_usage(&self.path)
    }
}

#[cfg(unix)]
fn statvfs_usage(path: &str) -> crate::Result<f64> {
    let c_path = std::ffi::CString::new(path)
        .map_err(|_| crate::HostwatchError::Sampler(format!("invalid path: {}", path)))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    // SAFETY: c_path is a valid NUL-terminated string and stat is a
    // properly sized out-parameter.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(crate::HostwatchError::Sampler(format!(
            "statvfs({}) failed: {}",
            path,
            std::io::Error::last_os_error()
        )));
    }

    if stat.f_blocks == 0 {
        return Err(crate::HostwatchError::Sampler(format!(
            "filesystem at {} reports zero blocks",
            path
        )));
    }

    let total = stat.f_blocks as f64;
    let used = (stat.f_blocks - stat.f_bfree) as f64;
    Ok((used / total * 100.0).clamp(0.0, 100.0))
}

#[cfg(not(unix))]
fn statvfs_usage(path: &str) -> crate::Result<f64> {
    Err(crate::HostwatchError::Sampler(format!(
        "disk sampling for {} is not supported on this platform",
        path
    )))
}

/// CPU utilization computed from two `/proc/stat` reads a short window apart
#[derive(Debug, Default)]
pub struct CpuSampler;

#[async_trait]
impl MetricSampler for CpuSampler {
    fn metric(&self) -> Metric {
        Metric::Cpu
    }

    async fn sample(&self) -> crate::Result<f64> {
        let first = read_cpu_totals()?;
        tokio::time::sleep(CPU_SAMPLE_WINDOW).await;
        let second = read_cpu_totals()?;
        cpu_usage_between(first, second)
    }
}

/// (idle, total) jiffy counters from the aggregate cpu line
fn read_cpu_totals() -> crate::Result<(u64, u64)> {
    let content = std::fs::read_to_string(PROC_STAT).map_err(|e| {
        crate::HostwatchError::Sampler(format!("failed to read {}: {}", PROC_STAT, e))
    })?;
    parse_cpu_totals(&content)
}

fn parse_cpu_totals(proc_stat: &str) -> crate::Result<(u64, u64)> {
    let line = proc_stat
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| {
            crate::HostwatchError::Sampler(format!("no aggregate cpu line in {}", PROC_STAT))
        })?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 5 {
        return Err(crate::HostwatchError::Sampler(format!(
            "malformed cpu line in {}: {}",
            PROC_STAT, line
        )));
    }

    // idle + iowait count as idle time
    let idle = fields[3] + fields[4];
    let total = fields.iter().sum();
    Ok((idle, total))
}

fn cpu_usage_between(first: (u64, u64), second: (u64, u64)) -> crate::Result<f64> {
    let idle_delta = second.0.saturating_sub(first.0) as f64;
    let total_delta = second.1.saturating_sub(first.1) as f64;
    if total_delta <= 0.0 {
        return Err(crate::HostwatchError::Sampler(
            "no CPU time elapsed between samples".to_string(),
        ));
    }
    Ok(((1.0 - idle_delta / total_delta) * 100.0).clamp(0.0, 100.0))
}

/// Memory utilization from `/proc/meminfo`
#[derive(Debug, Default)]
pub struct MemorySampler;

#[async_trait]
impl MetricSampler for MemorySampler {
    fn metric(&self) -> Metric {
        Metric::Memory
    }

    async fn sample(&self) -> crate::Result<f64> {
        let content = std::fs::read_to_string(PROC_MEMINFO).map_err(|e| {
            crate::HostwatchError::Sampler(format!("failed to read {}: {}", PROC_MEMINFO, e))
        })?;
        parse_meminfo(&content)
    }
}

fn parse_meminfo(meminfo: &str) -> crate::Result<f64> {
    let read_kb = |key: &str| -> Option<u64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(key))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };

    let total = read_kb("MemTotal:").ok_or_else(|| {
        crate::HostwatchError::Sampler(format!("MemTotal missing from {}", PROC_MEMINFO))
    })?;
    let available = read_kb("MemAvailable:").ok_or_else(|| {
        crate::HostwatchError::Sampler(format!("MemAvailable missing from {}", PROC_MEMINFO))
    })?;

    if total == 0 {
        return Err(crate::HostwatchError::Sampler(
            "MemTotal is zero".to_string(),
        ));
    }

    let used = total.saturating_sub(available) as f64;
    Ok((used / total as f64 * 100.0).clamp(0.0, 100.0))
}
