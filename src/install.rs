use crate::config::ToolkitConfig;
use crate::error::{Error, Result};
use crate::which::which_in;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// A located LIKWID installation.
///
/// The group files live in a fixed layout relative to the directory of the
/// topology binary: `<bindir>/<groups_subdir>/<arch>/<group>.txt`.
#[derive(Debug, Clone)]
pub struct Install {
    groups_root: PathBuf,
}

impl Install {
    /// Find the topology binary on `search_path` and derive the group root from it.
    pub fn locate<S: AsRef<OsStr> + ?Sized>(search_path: &S, toolkit: &ToolkitConfig) -> Result<Self> {
        let binary =
            which_in(&toolkit.topology_command, search_path).ok_or(Error::InstallationNotFound)?;
        tracing::debug!(binary = %binary.display(), "found LIKWID topology binary");
        Self::from_binary(&binary, &toolkit.groups_subdir)
    }

    /// Derive the group root from the path of the topology binary.
    pub fn from_binary(binary: &Path, groups_subdir: &Path) -> Result<Self> {
        let bin_dir = binary.parent().unwrap_or_else(|| Path::new("."));
        let groups_root = normalize(&bin_dir.join(groups_subdir));
        if !groups_root.exists() {
            return Err(Error::GroupsNotFound);
        }
        Ok(Self { groups_root })
    }

    /// The performance group root (e.g. `/usr/share/likwid/perfgroups`).
    pub fn groups_root(&self) -> &Path {
        &self.groups_root
    }

    /// Directory holding the groups of one architecture.
    pub fn arch_dir(&self, arch: &str) -> PathBuf {
        self.groups_root.join(arch)
    }

    /// Path to a group file (e.g. `skylake/FLOPS_DP.txt`).
    pub fn group_file(&self, arch: &str, group: &str) -> PathBuf {
        self.arch_dir(arch).join(format!("{group}.txt"))
    }

    /// Check the architecture directory and then the group file, in that order.
    pub fn resolve_group(&self, arch: &str, group: &str) -> Result<PathBuf> {
        if !self.arch_dir(arch).exists() {
            return Err(Error::ArchNotFound {
                arch: arch.to_string(),
            });
        }
        let path = self.group_file(arch, group);
        if !path.exists() {
            return Err(Error::GroupNotFound {
                arch: arch.to_string(),
                group: group.to_string(),
            });
        }
        tracing::debug!(path = %path.display(), "resolved performance group file");
        Ok(path)
    }
}

/// Lexically collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
