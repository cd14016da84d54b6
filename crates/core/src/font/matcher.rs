//! System font matching.
//!
//! When a font carries no embedded program, the core falls back to a
//! system match. The matcher is an opaque name-to-file-listing function
//! so the decoding and metrics logic stays testable without a system
//! dependency; the default implementation queries fontconfig.

use crate::error::{RenderError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

/// One candidate font file with its family and style tag.
#[derive(Debug, Clone)]
pub struct FontFile {
    pub path: PathBuf,
    pub family: String,
    pub style: String,
}

/// Resolves a family name to candidate font files.
pub trait FontMatcher: Send + Sync {
    /// Return the candidate files for the closest installed family.
    fn resolve_family(&self, family: &str) -> Result<Vec<FontFile>>;
}

/// fontconfig-backed matcher shelling out to `fc-match` and `fc-list`.
pub struct FcFontMatcher;

static MATCH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(.*): "(.*)" "(.*)""#).expect("match pattern"));
static LIST_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.*): (.*):style=(\w+)").expect("list pattern"));

impl FcFontMatcher {
    fn run(command: &mut Command, family: &str) -> Result<String> {
        let output = command.output().map_err(|e| RenderError::FontMatcher {
            family: family.to_string(),
            msg: e.to_string(),
        })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl FontMatcher for FcFontMatcher {
    fn resolve_family(&self, family: &str) -> Result<Vec<FontFile>> {
        // fc-match -s lists substitution candidates best first; the first
        // TrueType hit names the concrete family to enumerate.
        let matches = Self::run(Command::new("fc-match").arg("-s").arg(family), family)?;
        let concrete = matches
            .lines()
            .filter_map(|line| {
                let caps = MATCH_LINE.captures(line)?;
                let file = caps.get(1)?.as_str().trim();
                if file.to_ascii_lowercase().ends_with(".ttf") {
                    Some(caps.get(2)?.as_str().to_string())
                } else {
                    None
                }
            })
            .next()
            .ok_or_else(|| RenderError::FontMatcher {
                family: family.to_string(),
                msg: "no TrueType candidate from fc-match".into(),
            })?;

        let listing = Self::run(Command::new("fc-list").arg(&concrete), family)?;
        let files: Vec<FontFile> = listing
            .lines()
            .filter_map(|line| {
                let caps = LIST_LINE.captures(line)?;
                Some(FontFile {
                    path: PathBuf::from(caps.get(1)?.as_str().trim()),
                    family: caps.get(2)?.as_str().trim().to_string(),
                    style: caps.get(3)?.as_str().trim().to_string(),
                })
            })
            .collect();

        if files.is_empty() {
            return Err(RenderError::FontMatcher {
                family: family.to_string(),
                msg: format!("fc-list returned nothing for {concrete}"),
            });
        }
        Ok(files)
    }
}
