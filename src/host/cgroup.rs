//! cgroup memory limit probing.
//!
//! Container runtimes expose the process memory ceiling through cgroups
//! rather than the environment. Probing is best-effort: any read failure
//! means "not reported".

#[cfg(target_os = "linux")]
use std::io;
#[cfg(target_os = "linux")]
use std::path::{Path, PathBuf};

/// Values at or above 1 EiB are how cgroup v1 spells "no limit".
const UNLIMITED_THRESHOLD_BYTES: u64 = 1 << 60;

/// cgroup paths parsed from `/proc/self/cgroup`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcSelfCgroup {
    /// Unified hierarchy entry (`0::/path`)
    pub v2_path: Option<String>,
    /// v1 memory controller entry (`5:memory:/path`)
    pub v1_memory_path: Option<String>,
}

/// Parses `/proc/self/cgroup` contents without touching the filesystem.
pub fn parse_proc_self_cgroup(contents: &str) -> ProcSelfCgroup {
    let mut parsed = ProcSelfCgroup::default();

    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut parts = line.splitn(3, ':');
        let (Some(hierarchy_id), Some(controllers), Some(path)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let path = path.trim();

        if parsed.v2_path.is_none()
            && hierarchy_id == "0"
            && controllers.is_empty()
            && !path.is_empty()
        {
            parsed.v2_path = Some(path.to_string());
        }

        if parsed.v1_memory_path.is_none() && controllers.split(',').any(|c| c.trim() == "memory") {
            parsed.v1_memory_path = Some(path.to_string());
        }
    }

    parsed
}

/// Parses a `memory.max` or `memory.limit_in_bytes` value.
///
/// Returns `None` for `max`, empty, unparseable, or effectively unlimited values.
pub fn parse_cgroup_memory_limit_bytes(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "max" {
        return None;
    }

    match raw.parse::<u64>() {
        Ok(value) if value < UNLIMITED_THRESHOLD_BYTES => Some(value),
        Ok(_) => None,
        Err(err) => {
            tracing::debug!(raw, error = %err, "failed to parse cgroup memory limit");
            None
        }
    }
}

#[cfg(target_os = "linux")]
fn read_trimmed(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text.trim().to_string()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "failed to read cgroup file");
            None
        }
    }
}

/// Smallest limit found walking from the process cgroup up to the root.
#[cfg(target_os = "linux")]
fn effective_limit_from_ancestors(
    mount: &Path,
    cgroup_path: &str,
    limit_file: &str,
) -> Option<u64> {
    let mut rel = PathBuf::from(cgroup_path.trim_start_matches('/'));
    let mut best: Option<u64> = None;

    loop {
        let candidate = mount.join(&rel).join(limit_file);
        if let Some(limit) = read_trimmed(&candidate)
            .as_deref()
            .and_then(parse_cgroup_memory_limit_bytes)
        {
            best = Some(best.map_or(limit, |best| best.min(limit)));
        }

        if !rel.pop() {
            break;
        }
    }

    best
}

#[cfg(target_os = "linux")]
pub(crate) fn cgroup_memory_limit_bytes() -> Option<u64> {
    let contents = read_trimmed(Path::new("/proc/self/cgroup"))?;
    let parsed = parse_proc_self_cgroup(&contents);

    parsed
        .v2_path
        .as_deref()
        .and_then(|path| {
            effective_limit_from_ancestors(Path::new("/sys/fs/cgroup"), path, "memory.max")
        })
        .or_else(|| {
            parsed.v1_memory_path.as_deref().and_then(|path| {
                effective_limit_from_ancestors(
                    Path::new("/sys/fs/cgroup/memory"),
                    path,
                    "memory.limit_in_bytes",
                )
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v2_entry() {
        let parsed = parse_proc_self_cgroup("0::/user.slice/session-1.scope\n");
        assert_eq!(parsed.v2_path.as_deref(), Some("/user.slice/session-1.scope"));
        assert_eq!(parsed.v1_memory_path, None);
    }

    #[test]
    fn test_parse_v1_memory_entry() {
        let contents = "12:cpu,cpuacct:/docker/abc\n5:memory:/docker/abc\n";
        let parsed = parse_proc_self_cgroup(contents);
        assert_eq!(parsed.v1_memory_path.as_deref(), Some("/docker/abc"));
        assert_eq!(parsed.v2_path, None);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let parsed = parse_proc_self_cgroup("garbage\n\n0::\n");
        assert_eq!(parsed, ProcSelfCgroup::default());
    }

    #[test]
    fn test_parse_limit_values() {
        assert_eq!(parse_cgroup_memory_limit_bytes("536870912\n"), Some(536870912));
        assert_eq!(parse_cgroup_memory_limit_bytes("max"), None);
        assert_eq!(parse_cgroup_memory_limit_bytes(""), None);
        assert_eq!(parse_cgroup_memory_limit_bytes("9223372036854771712"), None);
        assert_eq!(parse_cgroup_memory_limit_bytes("lots"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_ancestor_walk_takes_smallest_limit() {
        let mount = tempfile::tempdir().unwrap();
        let child = mount.path().join("system.slice/app.service");
        std::fs::create_dir_all(&child).unwrap();

        std::fs::write(mount.path().join("memory.max"), "max\n").unwrap();
        std::fs::write(mount.path().join("system.slice/memory.max"), "268435456\n").unwrap();
        std::fs::write(child.join("memory.max"), "536870912\n").unwrap();

        let limit =
            effective_limit_from_ancestors(mount.path(), "/system.slice/app.service", "memory.max");
        assert_eq!(limit, Some(268435456));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_ancestor_walk_all_unlimited() {
        let mount = tempfile::tempdir().unwrap();
        let child = mount.path().join("user.slice");
        std::fs::create_dir_all(&child).unwrap();

        std::fs::write(mount.path().join("memory.max"), "max\n").unwrap();
        std::fs::write(child.join("memory.max"), "max\n").unwrap();

        assert_eq!(
            effective_limit_from_ancestors(mount.path(), "/user.slice", "memory.max"),
            None
        );
        // Missing limit files are skipped, not errors
        assert_eq!(
            effective_limit_from_ancestors(mount.path(), "/absent/child", "memory.max"),
            None
        );
    }
}
