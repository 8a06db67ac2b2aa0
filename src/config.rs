use crate::toolchain::{CompilerKind, Language};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "kiln.toml";

/// Contents of `kiln.toml`. Every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct KilnConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Deserialize, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Binary name, without platform suffix
    pub name: String,
    pub language: Language,
    /// Entry-point source, relative to the project root
    pub entry: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            language: Language::Cxx,
            entry: None,
        }
    }
}

impl ProjectConfig {
    pub fn entry(&self) -> PathBuf {
        self.entry.clone().unwrap_or_else(|| match self.language {
            Language::Cxx => PathBuf::from("src").join("main.cc"),
            Language::C => PathBuf::from("src").join("main.c"),
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directories walked for sources, relative to the project root
    pub sources: Vec<PathBuf>,
    pub includes: Vec<PathBuf>,
    pub compiler: Option<String>,
    pub standard: Option<String>,
    pub build_dir: PathBuf,
    /// Also hand header files to the compiler (precompiled-header setups)
    pub include_headers: bool,
    pub compile_commands: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            sources: vec![PathBuf::from("src")],
            includes: Vec::new(),
            compiler: None,
            standard: None,
            build_dir: PathBuf::from("build"),
            include_headers: false,
            compile_commands: true,
        }
    }
}

impl BuildConfig {
    pub fn compiler_kind(&self) -> Result<Option<CompilerKind>> {
        match &self.compiler {
            None => Ok(None),
            Some(name) => CompilerKind::parse(name).map(Some).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown compiler '{}' in {} (expected msvc, clang or gcc)",
                    name,
                    CONFIG_FILE
                )
            }),
        }
    }
}

/// Load `kiln.toml` from `root`, falling back to defaults when absent.
pub fn load_config(root: &Path) -> Result<KilnConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(KilnConfig::default());
    }

    let config_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {} - check file permissions", path.display()))?;
    let config: KilnConfig = toml::from_str(&config_str).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            path.display()
        )
    })?;

    // Surface bad compiler names at load time, not mid-build.
    config.build.compiler_kind()?;
    Ok(config)
}
