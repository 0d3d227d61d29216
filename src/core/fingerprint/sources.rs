/*!
Attribute sources.

Each source reads a handful of attributes from the host. A source that
cannot read something simply omits it; the provider decides whether what
remains is enough. System sources read procfs/sysfs and the process
environment, so they may block briefly and are only used at issuance and
refresh.
*/

use std::fs;
use std::path::Path;

use super::vector::AttributeKind;

/// A producer of raw `(kind, value)` attributes
pub trait AttributeSource: Send + Sync {
    /// Source name, for logs
    fn name(&self) -> &str;

    /// Read whatever attributes are available
    fn collect(&self) -> Vec<(AttributeKind, String)>;
}

fn read_trimmed(path: impl AsRef<Path>) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Fixed attributes, for injection by callers that collect elsewhere
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    attributes: Vec<(AttributeKind, String)>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    pub fn with(mut self, kind: AttributeKind, value: impl Into<String>) -> Self {
        self.attributes.push((kind, value.into()));
        self
    }
}

impl AttributeSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn collect(&self) -> Vec<(AttributeKind, String)> {
        self.attributes.clone()
    }
}

/// Machine identity: machine-id, DMI board serial, TPM endorsement presence
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineSource;

impl AttributeSource for MachineSource {
    fn name(&self) -> &str {
        "machine"
    }

    fn collect(&self) -> Vec<(AttributeKind, String)> {
        let mut out = Vec::new();
        if let Some(id) =
            read_trimmed("/etc/machine-id").or_else(|| read_trimmed("/var/lib/dbus/machine-id"))
        {
            out.push((AttributeKind::MachineId, id));
        }
        if let Some(serial) = read_trimmed("/sys/class/dmi/id/board_serial") {
            out.push((AttributeKind::BoardSerial, serial));
        }
        // The EK certificate itself needs tpm2 tooling; the device node identity is stable enough
        if let Some(tpm) = read_trimmed("/sys/class/tpm/tpm0/device/description")
            .or_else(|| read_trimmed("/sys/class/tpm/tpm0/tpm_version_major"))
        {
            out.push((AttributeKind::TpmEndorsement, tpm));
        }
        out
    }
}

/// CPU model, core count and total memory (bucketed to GiB)
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuMemorySource;

impl CpuMemorySource {
    fn cpu_model() -> Option<String> {
        let cpuinfo = fs::read_to_string("/proc/cpuinfo").ok()?;
        cpuinfo
            .lines()
            .find(|line| line.starts_with("model name") || line.starts_with("Model"))
            .and_then(|line| line.split_once(':'))
            .map(|(_, value)| value.trim().to_string())
    }

    fn memory_gib() -> Option<String> {
        let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
        let kib: u64 = meminfo
            .lines()
            .find(|line| line.starts_with("MemTotal:"))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()?;
        // Round so firmware reservations do not register as drift
        Some(((kib + (1 << 19)) >> 20).to_string())
    }
}

impl AttributeSource for CpuMemorySource {
    fn name(&self) -> &str {
        "cpu-memory"
    }

    fn collect(&self) -> Vec<(AttributeKind, String)> {
        let mut out = Vec::new();
        if let Some(model) = Self::cpu_model() {
            out.push((AttributeKind::CpuModel, model));
        }
        if let Ok(cores) = std::thread::available_parallelism() {
            out.push((AttributeKind::CpuCores, cores.get().to_string()));
        }
        if let Some(memory) = Self::memory_gib() {
            out.push((AttributeKind::MemoryTotal, memory));
        }
        out
    }
}

/// First non-loopback hardware address
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkSource;

impl AttributeSource for NetworkSource {
    fn name(&self) -> &str {
        "network"
    }

    fn collect(&self) -> Vec<(AttributeKind, String)> {
        let Ok(entries) = fs::read_dir("/sys/class/net") else {
            return Vec::new();
        };

        let mut interfaces: Vec<_> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.file_name().is_some_and(|name| name != "lo"))
            .collect();
        interfaces.sort();

        interfaces
            .into_iter()
            .filter_map(|path| read_trimmed(path.join("address")))
            .find(|mac| mac != "00:00:00:00:00:00")
            .map(|mac| vec![(AttributeKind::MacAddress, mac)])
            .unwrap_or_default()
    }
}

/// OS family and version, kernel release, architecture, hostname
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatingSystemSource;

impl OperatingSystemSource {
    fn os_version() -> Option<String> {
        let release = fs::read_to_string("/etc/os-release").ok()?;
        release
            .lines()
            .find_map(|line| line.strip_prefix("VERSION_ID="))
            .map(|value| value.trim_matches('"').to_string())
    }
}

impl AttributeSource for OperatingSystemSource {
    fn name(&self) -> &str {
        "os"
    }

    fn collect(&self) -> Vec<(AttributeKind, String)> {
        let mut out = vec![
            (AttributeKind::OsFamily, std::env::consts::OS.to_string()),
            (AttributeKind::Architecture, std::env::consts::ARCH.to_string()),
        ];
        if let Some(version) = Self::os_version() {
            out.push((AttributeKind::OsVersion, version));
        }
        if let Some(kernel) = read_trimmed("/proc/sys/kernel/osrelease") {
            out.push((AttributeKind::KernelVersion, kernel));
        }
        if let Some(host) = read_trimmed("/etc/hostname").or_else(|| env_var("HOSTNAME")) {
            out.push((AttributeKind::Hostname, host));
        }
        out
    }
}

/// Timezone and locale from the environment
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleSource;

impl AttributeSource for LocaleSource {
    fn name(&self) -> &str {
        "locale"
    }

    fn collect(&self) -> Vec<(AttributeKind, String)> {
        let mut out = Vec::new();
        if let Some(tz) = env_var("TZ").or_else(|| read_trimmed("/etc/timezone")) {
            out.push((AttributeKind::Timezone, tz));
        }
        if let Some(locale) = env_var("LC_ALL").or_else(|| env_var("LANG")) {
            out.push((AttributeKind::Locale, locale));
        }
        out
    }
}
