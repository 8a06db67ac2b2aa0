use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Supported compiler families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum CompilerKind {
    /// Microsoft Visual C++ (cl.exe + link.exe)
    MSVC,
    /// Clang/LLVM (clang++ or clang)
    Clang,
    /// GNU Compiler Collection (g++ or gcc)
    GCC,
}

impl CompilerKind {
    /// Static OS → compiler table.
    pub fn host_default(os: &str) -> Self {
        match os {
            "windows" => CompilerKind::MSVC,
            "macos" => CompilerKind::Clang,
            _ => CompilerKind::GCC,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "msvc" | "cl" | "cl.exe" => Some(CompilerKind::MSVC),
            "clang" | "clang++" => Some(CompilerKind::Clang),
            "gcc" | "g++" => Some(CompilerKind::GCC),
            _ => None,
        }
    }

    pub fn executable(&self, language: Language) -> &'static str {
        match (self, language) {
            (CompilerKind::MSVC, _) => "cl.exe",
            (CompilerKind::Clang, Language::Cxx) => "clang++",
            (CompilerKind::Clang, Language::C) => "clang",
            (CompilerKind::GCC, Language::Cxx) => "g++",
            (CompilerKind::GCC, Language::C) => "gcc",
        }
    }

    /// Standard-version string used when the config does not pin one.
    pub fn default_standard(&self, language: Language) -> &'static str {
        match (self, language) {
            (CompilerKind::MSVC, Language::Cxx) => "c++latest",
            (CompilerKind::MSVC, Language::C) => "clatest",
            (_, Language::Cxx) => "c++2b",
            (_, Language::C) => "c2x",
        }
    }

    pub fn object_extension(&self) -> &'static str {
        match self {
            CompilerKind::MSVC => "obj",
            _ => "o",
        }
    }

    pub fn executable_suffix(&self) -> &'static str {
        match self {
            CompilerKind::MSVC => ".exe",
            _ => "",
        }
    }
}

impl std::fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompilerKind::MSVC => "msvc",
            CompilerKind::Clang => "clang",
            CompilerKind::GCC => "gcc",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[serde(rename = "c")]
    C,
    #[default]
    #[serde(rename = "c++")]
    Cxx,
}

impl Language {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "c" => Some(Language::C),
            "c++" | "cpp" | "cxx" => Some(Language::Cxx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    pub fn from_release(release: bool) -> Self {
        if release {
            BuildMode::Release
        } else {
            BuildMode::Debug
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

/// A fully resolved compilation target. Immutable once built; every
/// command template is rendered from it.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    pub compiler: CompilerKind,
    pub language: Language,
    /// Resolved compiler executable (absolute when located on PATH)
    pub executable: PathBuf,
    pub mode: BuildMode,
    pub standard: String,
    pub triple: String,
    pub include_paths: Vec<PathBuf>,
}

impl BuildTarget {
    /// Program used for the link step.
    pub fn linker(&self) -> PathBuf {
        match self.compiler {
            CompilerKind::MSVC => self
                .executable
                .parent()
                .map(|dir| dir.join("link.exe"))
                .filter(|p| p.exists())
                .unwrap_or_else(|| PathBuf::from("link.exe")),
            _ => self.executable.clone(),
        }
    }

    /// SHA-256 over everything that shapes the emitted objects and binary.
    /// Two targets with equal fingerprints produce interchangeable outputs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let fields = [
            self.compiler.to_string(),
            format!("{:?}", self.language),
            self.executable.to_string_lossy().to_string(),
            self.mode.as_str().to_string(),
            self.standard.clone(),
            self.triple.clone(),
        ];
        for field in fields
            .iter()
            .map(String::as_str)
            .chain(self.include_paths.iter().map(|p| p.to_str().unwrap_or_default()))
        {
            hasher.update(field.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gcc_target() -> BuildTarget {
        BuildTarget {
            compiler: CompilerKind::GCC,
            language: Language::Cxx,
            executable: PathBuf::from("/usr/bin/g++"),
            mode: BuildMode::Debug,
            standard: "c++2b".into(),
            triple: "x86_64-linux-gnu".into(),
            include_paths: vec![PathBuf::from("include")],
        }
    }

    #[test]
    fn test_fingerprint_tracks_every_output_shaping_field() {
        let base = gcc_target();
        assert_eq!(base.fingerprint(), gcc_target().fingerprint());
        assert_eq!(base.fingerprint().len(), 64);

        let variants = [
            BuildTarget { compiler: CompilerKind::Clang, ..gcc_target() },
            BuildTarget { language: Language::C, ..gcc_target() },
            BuildTarget { executable: PathBuf::from("/opt/gcc-14/bin/g++"), ..gcc_target() },
            BuildTarget { mode: BuildMode::Release, ..gcc_target() },
            BuildTarget { standard: "c++20".into(), ..gcc_target() },
            BuildTarget { triple: "aarch64-linux-gnu".into(), ..gcc_target() },
            BuildTarget { include_paths: vec![], ..gcc_target() },
        ];
        for variant in variants {
            assert_ne!(variant.fingerprint(), base.fingerprint(), "{:?}", variant);
        }
    }

    #[test]
    fn test_fingerprint_separates_adjacent_fields() {
        let a = BuildTarget { standard: "c++2".into(), triple: "bx86".into(), ..gcc_target() };
        let b = BuildTarget { standard: "c++2b".into(), triple: "x86".into(), ..gcc_target() };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_host_table() {
        assert_eq!(CompilerKind::host_default("windows"), CompilerKind::MSVC);
        assert_eq!(CompilerKind::host_default("macos"), CompilerKind::Clang);
        assert_eq!(CompilerKind::host_default("linux"), CompilerKind::GCC);
        assert_eq!(CompilerKind::host_default("freebsd"), CompilerKind::GCC);
    }

    #[test]
    fn test_executables_per_language() {
        assert_eq!(CompilerKind::Clang.executable(Language::Cxx), "clang++");
        assert_eq!(CompilerKind::Clang.executable(Language::C), "clang");
        assert_eq!(CompilerKind::GCC.executable(Language::C), "gcc");
        assert_eq!(CompilerKind::MSVC.executable(Language::C), "cl.exe");
    }

    #[test]
    fn test_default_standards() {
        assert_eq!(CompilerKind::MSVC.default_standard(Language::Cxx), "c++latest");
        assert_eq!(CompilerKind::GCC.default_standard(Language::Cxx), "c++2b");
        assert_eq!(CompilerKind::Clang.default_standard(Language::C), "c2x");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(CompilerKind::parse("CL"), Some(CompilerKind::MSVC));
        assert_eq!(CompilerKind::parse("g++"), Some(CompilerKind::GCC));
        assert_eq!(CompilerKind::parse("tcc"), None);
        assert_eq!(Language::parse("cpp"), Some(Language::Cxx));
        assert_eq!(Language::parse("rust"), None);
    }

    #[test]
    fn test_gcc_links_with_compiler() {
        let target = BuildTarget {
            compiler: CompilerKind::GCC,
            language: Language::Cxx,
            executable: PathBuf::from("/usr/bin/g++"),
            mode: BuildMode::Debug,
            standard: "c++2b".into(),
            triple: "x86_64-linux-gnu".into(),
            include_paths: vec![],
        };
        assert_eq!(target.linker(), PathBuf::from("/usr/bin/g++"));
    }
}
