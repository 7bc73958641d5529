use crate::platform::PlatformTarget;

const EXE_SUFFIX: &str = ".exe";

/// Decides which archive entries hold the executable.
///
/// An entry matches when its name equals or ends with the binary name (or
/// `<name>.exe` when `allow_exe` is set). When several entries match, [`Rank`]
/// orders them. Entries of equal rank are told apart by their path, never by
/// their position in the archive.
#[derive(Debug, Clone)]
pub struct BinaryMatcher {
    name: String,
    exe_name: Option<String>,
}

/// Lower is better: exact file-name matches first, then `<name>.exe` when
/// allowed, then shallower paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rank {
    suffix_only: bool,
    not_exe: bool,
    depth: usize,
}

impl BinaryMatcher {
    pub fn new(name: impl Into<String>, allow_exe: bool) -> Self {
        let name = name.into();
        let exe_name = allow_exe.then(|| format!("{}{}", name, EXE_SUFFIX));

        Self { name, exe_name }
    }

    pub fn for_target(name: &str, target: &PlatformTarget) -> Self {
        Self::new(name, target.is_windows())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self, entry_name: &str) -> Option<Rank> {
        if entry_name.is_empty() || entry_name.ends_with(['/', '\\']) {
            return None;
        }

        let file_name = entry_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(entry_name);

        let exact = self.names().any(|name| file_name == name);
        let exe = self.exe_name.as_deref() == Some(file_name);
        let suffix = self.names().any(|name| entry_name.ends_with(name));

        if !exact && !suffix {
            return None;
        }

        let depth = entry_name
            .split(['/', '\\'])
            .filter(|component| !component.is_empty() && *component != ".")
            .count();

        Some(Rank {
            suffix_only: !exact,
            not_exe: !exe,
            depth,
        })
    }

    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.exe_name.as_deref())
    }
}
