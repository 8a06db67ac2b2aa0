use crate::error::FailureKind;
use colored::*;

/// Turns raw compiler/linker output into a one-paragraph remediation hint.
pub struct FeedbackAnalyzer;

impl FeedbackAnalyzer {
    pub fn analyze(output: &str) -> Option<String> {
        // 1. Entry point missing (specific linker error)
        if output.contains("undefined reference to `main'")
            || output.contains("entry point must be defined")
            || output.contains("_main\", referenced from")
        {
            return Some(format!(
                "Your project is missing a {} function.\nCheck that the entry file defines one.",
                "main()".bold().yellow()
            ));
        }

        // 2. Unresolved symbol (linker error)
        if output.contains("LNK2019")
            || output.contains("LNK2001")
            || output.contains("undefined reference to")
            || output.contains("Undefined symbols for architecture")
        {
            return Some(format!(
                "It looks like a {} error.\nA function is declared but its definition is not in any source directory.\nMake sure the file defining it lives under one of the {} roots.",
                "Linker".bold().red(),
                "build.sources".bold().yellow()
            ));
        }

        // 3. Missing header (compiler error)
        if (output.contains("fatal error: ") && output.contains("No such file or directory"))
            || output.contains("file not found")
            || output.contains("cannot open include file")
            || output.contains("C1083")
        {
            return Some(format!(
                "It looks like a {} error.\nAdd the directory holding it to {} in kiln.toml.",
                "Missing Header".bold().red(),
                "build.includes".bold().yellow()
            ));
        }

        None
    }

    /// Hint for a compile failure of the given kind.
    pub fn for_failure(kind: FailureKind, output: &str) -> Option<String> {
        match kind {
            FailureKind::ToolchainMissing => Some(format!(
                "The compiler could not be started.\nRun {} to check the toolchain, or pick another with {}.",
                "kiln doctor".bold().green(),
                "--compiler".bold().green()
            )),
            FailureKind::CompileError => Self::analyze(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linker_error() {
        let err = "error LNK2019: unresolved external symbol foo";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Linker"));
        assert!(msg.contains("build.sources"));
    }

    #[test]
    fn test_include_error() {
        let err = "src/main.cc:1:10: fatal error: foo.hh: No such file or directory";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("Missing Header"));
        assert!(msg.contains("build.includes"));
    }

    #[test]
    fn test_clang_include_error() {
        let err = "src/main.cc:1:10: fatal error: 'foo.hh' file not found";
        assert!(FeedbackAnalyzer::analyze(err).is_some());
    }

    #[test]
    fn test_main_error() {
        let err = "undefined reference to `main'";
        let msg = FeedbackAnalyzer::analyze(err).unwrap();
        assert!(msg.contains("missing a"));
        assert!(msg.contains("main()"));
    }

    #[test]
    fn test_plain_syntax_error_has_no_hint() {
        assert!(FeedbackAnalyzer::analyze("error: expected ';' after expression").is_none());
    }

    #[test]
    fn test_missing_toolchain_always_hints() {
        let msg = FeedbackAnalyzer::for_failure(FailureKind::ToolchainMissing, "").unwrap();
        assert!(msg.contains("kiln doctor"));
    }
}
