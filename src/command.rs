//! Compile and link command construction.
//!
//! Flag sets are static per toolchain and mode. A template is an ordered list
//! of literal arguments and placeholders; rendering substitutes the
//! placeholders and drops nothing else.

use crate::toolchain::{BuildMode, BuildTarget, CompilerKind, Language};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arg {
    Lit(&'static str),
    /// Literal prefix glued to a rendered value, e.g. `/Fo:` + object
    Prefixed(&'static str, Slot),
    Slot(Slot),
    /// One argument per include path, with the given prefix
    Includes(&'static str),
    /// Only emitted for C++ sources
    CxxOnly(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Program,
    Standard,
    Triple,
    Object,
    Pdb,
    Source,
    Output,
}

use Arg::{CxxOnly, Includes, Lit, Prefixed};

const MSVC_COMPILE_RELEASE: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Prefixed("/std:", Slot::Standard),
    Lit("/O2"),
    Lit("/GL"),
    CxxOnly("/EHsc"),
    Prefixed("/Fo:", Slot::Object),
    Includes("/I"),
    Lit("/c"),
    Arg::Slot(Slot::Source),
];

const MSVC_COMPILE_DEBUG: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Prefixed("/std:", Slot::Standard),
    Lit("/Od"),
    Lit("/Zi"),
    Prefixed("/Fd:", Slot::Pdb),
    CxxOnly("/EHsc"),
    Prefixed("/Fo:", Slot::Object),
    Includes("/I"),
    Lit("/c"),
    Arg::Slot(Slot::Source),
];

const CLANG_COMPILE_RELEASE: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Prefixed("--target=", Slot::Triple),
    Lit("-O3"),
    Lit("-flto"),
    Prefixed("-std=", Slot::Standard),
    CxxOnly("-fexceptions"),
    Lit("-o"),
    Arg::Slot(Slot::Object),
    Includes("-I"),
    Lit("-c"),
    Arg::Slot(Slot::Source),
];

const CLANG_COMPILE_DEBUG: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Prefixed("--target=", Slot::Triple),
    Lit("-O0"),
    Lit("-g"),
    Prefixed("-std=", Slot::Standard),
    CxxOnly("-fexceptions"),
    Lit("-o"),
    Arg::Slot(Slot::Object),
    Includes("-I"),
    Lit("-c"),
    Arg::Slot(Slot::Source),
];

const GCC_COMPILE_RELEASE: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Lit("-O3"),
    Lit("-flto"),
    Prefixed("-std=", Slot::Standard),
    CxxOnly("-fexceptions"),
    Lit("-o"),
    Arg::Slot(Slot::Object),
    Includes("-I"),
    Lit("-c"),
    Arg::Slot(Slot::Source),
];

const GCC_COMPILE_DEBUG: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Lit("-O0"),
    Lit("-g"),
    Prefixed("-std=", Slot::Standard),
    CxxOnly("-fexceptions"),
    Lit("-o"),
    Arg::Slot(Slot::Object),
    Includes("-I"),
    Lit("-c"),
    Arg::Slot(Slot::Source),
];

const MSVC_LINK_RELEASE: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Lit("/LTCG"),
    Lit("/OPT:REF"),
    Lit("/OPT:ICF"),
    Prefixed("/OUT:", Slot::Output),
];

const MSVC_LINK_DEBUG: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Lit("/DEBUG"),
    Lit("/DEBUGTYPE:cv,fixup"),
    Prefixed("/OUT:", Slot::Output),
];

const CLANG_LINK_RELEASE: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Prefixed("--target=", Slot::Triple),
    Lit("-O3"),
    Lit("-flto"),
    Lit("-o"),
    Arg::Slot(Slot::Output),
];

const CLANG_LINK_DEBUG: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Prefixed("--target=", Slot::Triple),
    Lit("-O0"),
    Lit("-g"),
    Lit("-o"),
    Arg::Slot(Slot::Output),
];

const GCC_LINK_RELEASE: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Lit("-O3"),
    Lit("-flto"),
    Lit("-o"),
    Arg::Slot(Slot::Output),
];

const GCC_LINK_DEBUG: &[Arg] = &[
    Arg::Slot(Slot::Program),
    Lit("-O0"),
    Lit("-g"),
    Lit("-o"),
    Arg::Slot(Slot::Output),
];

fn compile_template(compiler: CompilerKind, mode: BuildMode) -> &'static [Arg] {
    match (compiler, mode) {
        (CompilerKind::MSVC, BuildMode::Release) => MSVC_COMPILE_RELEASE,
        (CompilerKind::MSVC, BuildMode::Debug) => MSVC_COMPILE_DEBUG,
        (CompilerKind::Clang, BuildMode::Release) => CLANG_COMPILE_RELEASE,
        (CompilerKind::Clang, BuildMode::Debug) => CLANG_COMPILE_DEBUG,
        (CompilerKind::GCC, BuildMode::Release) => GCC_COMPILE_RELEASE,
        (CompilerKind::GCC, BuildMode::Debug) => GCC_COMPILE_DEBUG,
    }
}

fn link_template(compiler: CompilerKind, mode: BuildMode) -> &'static [Arg] {
    match (compiler, mode) {
        (CompilerKind::MSVC, BuildMode::Release) => MSVC_LINK_RELEASE,
        (CompilerKind::MSVC, BuildMode::Debug) => MSVC_LINK_DEBUG,
        (CompilerKind::Clang, BuildMode::Release) => CLANG_LINK_RELEASE,
        (CompilerKind::Clang, BuildMode::Debug) => CLANG_LINK_DEBUG,
        (CompilerKind::GCC, BuildMode::Release) => GCC_LINK_RELEASE,
        (CompilerKind::GCC, BuildMode::Debug) => GCC_LINK_DEBUG,
    }
}

/// Values substituted into a template.
#[derive(Default)]
struct Values<'a> {
    program: String,
    object: Option<&'a Path>,
    source: Option<&'a Path>,
    output: Option<&'a Path>,
}

fn path_arg(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    target: BuildTarget,
}

impl CommandBuilder {
    pub fn new(target: BuildTarget) -> Self {
        Self { target }
    }

    /// Argument vector compiling `source` into `object`.
    pub fn compile_command(&self, source: &Path, object: &Path) -> Vec<String> {
        let values = Values {
            program: self.target.executable.to_string_lossy().to_string(),
            object: Some(object),
            source: Some(source),
            output: None,
        };
        self.render(
            compile_template(self.target.compiler, self.target.mode),
            &values,
        )
    }

    /// Argument vector linking `artifacts`, in order, into `output`.
    pub fn link_command(&self, output: &Path, artifacts: &[PathBuf]) -> Vec<String> {
        let values = Values {
            program: self.target.linker().to_string_lossy().to_string(),
            output: Some(output),
            ..Default::default()
        };
        let mut argv = self.render(
            link_template(self.target.compiler, self.target.mode),
            &values,
        );
        argv.extend(artifacts.iter().map(|a| a.to_string_lossy().to_string()));
        argv
    }

    fn render(&self, template: &[Arg], values: &Values<'_>) -> Vec<String> {
        let mut argv = Vec::with_capacity(template.len() + self.target.include_paths.len());
        for arg in template {
            match arg {
                Lit(lit) => argv.push(lit.to_string()),
                Arg::Slot(slot) => argv.push(self.slot(*slot, values)),
                Prefixed(prefix, slot) => {
                    argv.push(format!("{}{}", prefix, self.slot(*slot, values)))
                }
                Includes(prefix) => argv.extend(
                    self.target
                        .include_paths
                        .iter()
                        .map(|p| format!("{}{}", prefix, p.display())),
                ),
                CxxOnly(lit) => {
                    if self.target.language == Language::Cxx {
                        argv.push(lit.to_string());
                    }
                }
            }
        }
        argv
    }

    fn slot(&self, slot: Slot, values: &Values<'_>) -> String {
        match slot {
            Slot::Program => values.program.clone(),
            Slot::Standard => self.target.standard.clone(),
            Slot::Triple => self.target.triple.clone(),
            Slot::Object => path_arg(values.object),
            Slot::Pdb => path_arg(values.object.map(|o| o.with_extension("pdb")).as_deref()),
            Slot::Source => path_arg(values.source),
            Slot::Output => path_arg(values.output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(compiler: CompilerKind, mode: BuildMode) -> BuildTarget {
        BuildTarget {
            compiler,
            language: Language::Cxx,
            executable: PathBuf::from(compiler.executable(Language::Cxx)),
            mode,
            standard: compiler.default_standard(Language::Cxx).to_string(),
            triple: "x86_64-unknown-linux-gnu".to_string(),
            include_paths: vec![PathBuf::from("incl")],
        }
    }

    #[test]
    fn test_clang_debug_compile() {
        let builder = CommandBuilder::new(target(CompilerKind::Clang, BuildMode::Debug));
        let argv = builder.compile_command(Path::new("src/a.cc"), Path::new("gen/a.cc.o"));
        assert_eq!(
            argv,
            vec![
                "clang++",
                "--target=x86_64-unknown-linux-gnu",
                "-O0",
                "-g",
                "-std=c++2b",
                "-fexceptions",
                "-o",
                "gen/a.cc.o",
                "-Iincl",
                "-c",
                "src/a.cc"
            ]
        );
    }

    #[test]
    fn test_gcc_release_has_no_target_flag() {
        let builder = CommandBuilder::new(target(CompilerKind::GCC, BuildMode::Release));
        let argv = builder.compile_command(Path::new("a.cc"), Path::new("a.o"));
        assert_eq!(argv[0], "g++");
        assert!(argv.iter().all(|a| !a.starts_with("--target")));
        assert!(argv.contains(&"-O3".to_string()));
        assert!(argv.contains(&"-flto".to_string()));
    }

    #[test]
    fn test_msvc_debug_compile_uses_pdb() {
        let builder = CommandBuilder::new(target(CompilerKind::MSVC, BuildMode::Debug));
        let argv = builder.compile_command(Path::new("src/a.cc"), Path::new("gen/a.cc.obj"));
        assert_eq!(argv[0], "cl.exe");
        assert_eq!(argv[1], "/std:c++latest");
        assert!(argv.contains(&"/Fd:gen/a.cc.pdb".to_string()));
        assert!(argv.contains(&"/Fo:gen/a.cc.obj".to_string()));
        assert!(argv.contains(&"/Iincl".to_string()));
        assert_eq!(argv.last().unwrap(), "src/a.cc");
    }

    #[test]
    fn test_c_sources_skip_exception_flags() {
        let mut t = target(CompilerKind::GCC, BuildMode::Debug);
        t.language = Language::C;
        t.standard = "c2x".into();
        let argv = CommandBuilder::new(t).compile_command(Path::new("a.c"), Path::new("a.o"));
        assert!(!argv.contains(&"-fexceptions".to_string()));
        assert!(argv.contains(&"-std=c2x".to_string()));
    }

    #[test]
    fn test_no_includes_renders_no_flags() {
        let mut t = target(CompilerKind::Clang, BuildMode::Release);
        t.include_paths.clear();
        let argv = CommandBuilder::new(t).compile_command(Path::new("a.cc"), Path::new("a.o"));
        assert!(argv.iter().all(|a| !a.starts_with("-I")));
    }

    #[test]
    fn test_link_appends_artifacts_in_order() {
        let builder = CommandBuilder::new(target(CompilerKind::Clang, BuildMode::Release));
        let artifacts: Vec<PathBuf> = ["z.o", "a.o", "m.o"].iter().map(PathBuf::from).collect();
        let argv = builder.link_command(Path::new("bin/main"), &artifacts);

        assert_eq!(
            &argv[..6],
            &[
                "clang++",
                "--target=x86_64-unknown-linux-gnu",
                "-O3",
                "-flto",
                "-o",
                "bin/main"
            ]
        );
        assert_eq!(&argv[6..], &["z.o", "a.o", "m.o"]);
    }

    #[test]
    fn test_msvc_link_output_is_one_argument() {
        let builder = CommandBuilder::new(target(CompilerKind::MSVC, BuildMode::Debug));
        let argv = builder.link_command(Path::new("bin/main.exe"), &[PathBuf::from("a.obj")]);
        assert_eq!(
            argv,
            vec![
                "link.exe",
                "/DEBUG",
                "/DEBUGTYPE:cv,fixup",
                "/OUT:bin/main.exe",
                "a.obj"
            ]
        );
    }
}
