//! Command-line translation between compiler dialects.
//!
//! The primary compiler's batch options use a short vocabulary the reference
//! compiler does not understand: bare release selectors (`-8`), severity
//! remapping families (`-err:`, `-warn:`, `-info:`), and the `-classNames`
//! flag. `translate` rewrites or drops those and passes everything else
//! through untouched. Pure and deterministic, no I/O.

use crate::{Error, Result};

/// Lowest release selector recognized as a primary-only version token.
const MIN_RELEASE: u16 = 7;
/// Highest release selector recognized as a primary-only version token.
const MAX_RELEASE: u16 = 25;

/// Severity-remapping flag prefixes in the primary dialect.
const SEVERITY_PREFIXES: &[&str] = &["-err:", "-warn:", "-info:"];

/// An ordered command-line token sequence.
///
/// Mutated only during translation; callers render it to a string afterwards
/// and treat that as immutable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    /// Split a raw option string on whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        Self {
            tokens: raw.split_whitespace().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Render as a single space-joined string.
    #[must_use]
    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }

    fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(token.into());
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Parse a bare release selector (`-8` => 8), if the token is one.
fn release_selector(token: &str) -> Option<u16> {
    let digits = token.strip_prefix('-')?;
    let release = digits.parse::<u16>().ok()?;
    (MIN_RELEASE..=MAX_RELEASE).contains(&release).then_some(release)
}

/// Id list of a severity-remapping token (`-warn:unused,exports` => "unused,exports").
fn severity_ids(token: &str) -> Option<&str> {
    SEVERITY_PREFIXES
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))
}

/// Translate a primary-dialect command line into the reference dialect.
///
/// - Release selectors become `--release <N>`; when `version_override` is
///   given, every selector is removed instead and the override is appended
///   exactly once at the end, even if no selector was present.
/// - Severity families are dropped, except that an id list naming `exports`
///   is rewritten to the reference lint flag `-Xlint:exports`, emitted at
///   most once per command line.
/// - `-classNames <name>` is removed together with its mandatory argument.
/// - Unrecognized tokens pass through unchanged and in order.
pub fn translate(line: &CommandLine, version_override: Option<&str>) -> Result<CommandLine> {
    let mut out = CommandLine::default();
    let mut exports_lint = false;
    let mut tokens = line.tokens().iter();

    while let Some(token) = tokens.next() {
        if let Some(release) = release_selector(token) {
            if version_override.is_none() {
                out.push("--release");
                out.push(release.to_string());
            }
            continue;
        }
        if let Some(ids) = severity_ids(token) {
            if !exports_lint && ids.split(',').any(|id| id == "exports") {
                out.push("-Xlint:exports");
                exports_lint = true;
            }
            continue;
        }
        if token == "-classNames" {
            // Two-token removal: the flag carries a mandatory argument.
            if tokens.next().is_none() {
                return Err(Error::Translation(format!(
                    "-classNames without an argument in '{line}'"
                )));
            }
            continue;
        }
        out.push(token.clone());
    }

    if let Some(version) = version_override {
        for token in version.split_whitespace() {
            out.push(token);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated(raw: &str, version: Option<&str>) -> String {
        translate(&CommandLine::parse(raw), version).unwrap().render()
    }

    #[test]
    fn unrecognized_tokens_pass_through() {
        let raw = "-g -parameters -encoding UTF-8";
        assert_eq!(translated(raw, None), raw);
    }

    #[test]
    fn release_selector_rewritten_to_long_form() {
        assert_eq!(translated("-8 -g", None), "--release 8 -g");
        assert_eq!(translated("-21", None), "--release 21");
    }

    #[test]
    fn non_release_dashes_left_alone() {
        // -6 is below the recognized range, -999 outside it entirely.
        assert_eq!(translated("-6 -999 -d", None), "-6 -999 -d");
    }

    #[test]
    fn override_replaces_selectors_and_appears_once() {
        let out = translated("-8 -g -11", Some("--release 17"));
        assert_eq!(out, "-g --release 17");
        assert_eq!(out.matches("--release").count(), 1);
    }

    #[test]
    fn override_appended_even_without_selector() {
        assert_eq!(translated("-g", Some("--release 17")), "-g --release 17");
    }

    #[test]
    fn severity_flags_dropped() {
        assert_eq!(translated("-err:unused -warn:raw -info:all -g", None), "-g");
    }

    #[test]
    fn exports_severity_becomes_reference_lint() {
        assert_eq!(
            translated("-warn:unused,exports -g", None),
            "-Xlint:exports -g"
        );
        assert_eq!(translated("-err:exports", None), "-Xlint:exports");
    }

    #[test]
    fn exports_lint_emitted_at_most_once() {
        let out = translated("-warn:exports -err:exports -g", None);
        assert_eq!(out, "-Xlint:exports -g");
        assert_eq!(out.matches("-Xlint:exports").count(), 1);
    }

    #[test]
    fn class_names_removed_with_argument() {
        assert_eq!(translated("-classNames p.Main -g", None), "-g");
    }

    #[test]
    fn trailing_class_names_is_an_error() {
        let err = translate(&CommandLine::parse("-g -classNames"), None).unwrap_err();
        assert!(matches!(err, Error::Translation(_)));
    }

    #[test]
    fn token_order_preserved() {
        assert_eq!(
            translated("-a -8 -b -warn:raw -c", None),
            "-a --release 8 -b -c"
        );
    }
}
