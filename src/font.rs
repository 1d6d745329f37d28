//! Label font families and TrueType loading via fontdue
//!
//! Families resolve through fontconfig first, using the names in their CSS
//! stack; well-known file names in common font directories are the fallback.

use crate::error::{Error, Result};
use crate::layout::TextMeasure;
use fontconfig::{Fontconfig, Pattern};
use fontdue::{Font, FontSettings};
use serde::{Deserialize, Serialize};
use std::ffi::CString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Generic CSS family a font stack falls back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericFamily {
    SansSerif,
    Serif,
    Monospace,
}

/// The fixed set of label fonts offered by the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontFamily {
    #[default]
    GeistSans,
    Arial,
    Verdana,
    Georgia,
    TimesNewRoman,
    CourierNew,
    Tahoma,
    TrebuchetMs,
    LucidaSans,
    Impact,
}

impl FontFamily {
    /// Every supported family, in the order the selector lists them
    pub const ALL: [FontFamily; 10] = [
        FontFamily::GeistSans,
        FontFamily::Arial,
        FontFamily::Verdana,
        FontFamily::Georgia,
        FontFamily::TimesNewRoman,
        FontFamily::CourierNew,
        FontFamily::Tahoma,
        FontFamily::TrebuchetMs,
        FontFamily::LucidaSans,
        FontFamily::Impact,
    ];

    /// CSS `font-family` stack
    pub fn css_value(&self) -> &'static str {
        match self {
            FontFamily::GeistSans => "var(--font-geist-sans), Arial, sans-serif",
            FontFamily::Arial => "Arial, Helvetica, sans-serif",
            FontFamily::Verdana => "Verdana, Geneva, sans-serif",
            FontFamily::Georgia => "Georgia, serif",
            FontFamily::TimesNewRoman => "\"Times New Roman\", Times, serif",
            FontFamily::CourierNew => "\"Courier New\", Courier, monospace",
            FontFamily::Tahoma => "Tahoma, Geneva, sans-serif",
            FontFamily::TrebuchetMs => "\"Trebuchet MS\", Helvetica, sans-serif",
            FontFamily::LucidaSans => "\"Lucida Sans Unicode\", \"Lucida Grande\", sans-serif",
            FontFamily::Impact => "Impact, Charcoal, sans-serif",
        }
    }

    /// Human-readable name shown in listings
    pub fn label(&self) -> &'static str {
        match self {
            FontFamily::GeistSans => "Geist Sans (Default)",
            FontFamily::Arial => "Arial",
            FontFamily::Verdana => "Verdana",
            FontFamily::Georgia => "Georgia",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::CourierNew => "Courier New",
            FontFamily::Tahoma => "Tahoma",
            FontFamily::TrebuchetMs => "Trebuchet MS",
            FontFamily::LucidaSans => "Lucida Sans",
            FontFamily::Impact => "Impact",
        }
    }

    /// Stable identifier used by config files and the CLI
    pub fn key(&self) -> &'static str {
        match self {
            FontFamily::GeistSans => "geist-sans",
            FontFamily::Arial => "arial",
            FontFamily::Verdana => "verdana",
            FontFamily::Georgia => "georgia",
            FontFamily::TimesNewRoman => "times-new-roman",
            FontFamily::CourierNew => "courier-new",
            FontFamily::Tahoma => "tahoma",
            FontFamily::TrebuchetMs => "trebuchet-ms",
            FontFamily::LucidaSans => "lucida-sans",
            FontFamily::Impact => "impact",
        }
    }

    /// Family names to ask fontconfig for, most specific first
    ///
    /// Taken from the CSS stack with quotes stripped; `var(...)` entries are
    /// replaced by the family they name.
    pub fn fontconfig_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if *self == FontFamily::GeistSans {
            names.push("Geist");
        }
        for entry in self.css_value().split(',') {
            let entry = entry.trim();
            if entry.starts_with("var(") {
                continue;
            }
            names.push(entry.trim_matches('"'));
        }
        names
    }

    pub fn generic(&self) -> GenericFamily {
        match self {
            FontFamily::Georgia | FontFamily::TimesNewRoman => GenericFamily::Serif,
            FontFamily::CourierNew => GenericFamily::Monospace,
            _ => GenericFamily::SansSerif,
        }
    }

    /// Font files that render this family directly, most specific first
    fn file_names(&self) -> &'static [&'static str] {
        match self {
            FontFamily::GeistSans => &["Geist-Regular.ttf", "Geist-Regular.otf"],
            FontFamily::Arial => &["Arial.ttf", "arial.ttf", "LiberationSans-Regular.ttf"],
            FontFamily::Verdana => &["Verdana.ttf", "verdana.ttf"],
            FontFamily::Georgia => &["Georgia.ttf", "georgia.ttf"],
            FontFamily::TimesNewRoman => &[
                "Times New Roman.ttf",
                "times.ttf",
                "LiberationSerif-Regular.ttf",
            ],
            FontFamily::CourierNew => &["Courier New.ttf", "cour.ttf", "LiberationMono-Regular.ttf"],
            FontFamily::Tahoma => &["Tahoma.ttf", "tahoma.ttf"],
            FontFamily::TrebuchetMs => &["Trebuchet MS.ttf", "trebuc.ttf"],
            FontFamily::LucidaSans => &["LucidaSansUnicode.ttf", "l_10646.ttf"],
            FontFamily::Impact => &["Impact.ttf", "impact.ttf"],
        }
    }
}

impl GenericFamily {
    fn css_name(&self) -> &'static str {
        match self {
            GenericFamily::SansSerif => "sans-serif",
            GenericFamily::Serif => "serif",
            GenericFamily::Monospace => "monospace",
        }
    }

    fn file_names(&self) -> &'static [&'static str] {
        match self {
            GenericFamily::SansSerif => &[
                "DejaVuSans.ttf",
                "LiberationSans-Regular.ttf",
                "NotoSans-Regular.ttf",
                "FreeSans.ttf",
                "Helvetica.ttc",
            ],
            GenericFamily::Serif => &[
                "DejaVuSerif.ttf",
                "LiberationSerif-Regular.ttf",
                "NotoSerif-Regular.ttf",
                "FreeSerif.ttf",
            ],
            GenericFamily::Monospace => &[
                "DejaVuSansMono.ttf",
                "LiberationMono-Regular.ttf",
                "NotoSansMono-Regular.ttf",
                "FreeMono.ttf",
            ],
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FontFamily {
    type Err = String;

    /// Accepts the key (`times-new-roman`), the display label, or the CSS stack.
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let needle = value.trim();
        FontFamily::ALL
            .into_iter()
            .find(|family| {
                family.key().eq_ignore_ascii_case(needle)
                    || family.label().eq_ignore_ascii_case(needle)
                    || family.css_value() == needle
                    || (*family == FontFamily::GeistSans && needle.eq_ignore_ascii_case("geist sans"))
            })
            .ok_or_else(|| {
                let keys: Vec<&str> = FontFamily::ALL.iter().map(|f| f.key()).collect();
                format!("Unknown font family '{value}', expected one of: {}", keys.join(", "))
            })
    }
}

/// Directories searched for font files after any configured ones
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/local/share/fonts",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/truetype/msttcorefonts",
    "/usr/share/fonts/truetype/freefont",
    "/usr/share/fonts/truetype/noto",
    "/usr/share/fonts/noto",
    "/usr/share/fonts/opentype/noto",
    "/usr/share/fonts/opentype/freefont",
    "/run/current-system/sw/share/X11/fonts",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
    "C:\\Windows\\Fonts",
];

/// Resolves a [`FontFamily`] to a TrueType file on disk
#[derive(Debug, Clone)]
pub struct FontResolver {
    explicit: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
    use_fontconfig: bool,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(None, Vec::new())
    }
}

impl FontResolver {
    /// `explicit` wins for every family; `extra_dirs` are searched before the
    /// user and system directories.
    pub fn new(explicit: Option<PathBuf>, extra_dirs: Vec<PathBuf>) -> Self {
        let mut search_dirs = extra_dirs;
        if let Some(home) = std::env::var_os("HOME") {
            let home = PathBuf::from(home);
            search_dirs.push(home.join(".local/share/fonts"));
            search_dirs.push(home.join(".fonts"));
        }
        search_dirs.extend(SYSTEM_FONT_DIRS.iter().map(PathBuf::from));
        Self {
            explicit,
            search_dirs,
            use_fontconfig: true,
        }
    }

    /// Candidate paths for a family, in lookup order.
    ///
    /// Explicit path, then `FONT_PATH`, then fontconfig matches for the
    /// family's CSS stack, then well-known file names in the search dirs.
    pub fn candidates(&self, family: FontFamily) -> Vec<PathBuf> {
        let mut out = Vec::new();

        if let Some(path) = &self.explicit {
            out.push(path.clone());
        }

        // Set at build time by packagers that bundle a font
        const FONT_PATH: Option<&str> = option_env!("FONT_PATH");
        if let Some(path) = FONT_PATH {
            out.push(PathBuf::from(path));
        }

        if self.use_fontconfig {
            match Fontconfig::new() {
                Some(fc) => {
                    for name in family.fontconfig_names() {
                        if let Some(path) = fontconfig_lookup(&fc, name) {
                            if !out.contains(&path) {
                                out.push(path);
                            }
                        }
                    }
                }
                None => warn!("Failed to initialize fontconfig, using known font paths"),
            }
        }

        let names = family
            .file_names()
            .iter()
            .chain(family.generic().file_names())
            .chain(GenericFamily::SansSerif.file_names());

        for name in names {
            for dir in &self.search_dirs {
                let path = dir.join(name);
                if !out.contains(&path) {
                    out.push(path);
                }
            }
        }

        out
    }

    /// Load the first candidate that exists and parses.
    pub fn load(&self, family: FontFamily) -> Result<Font> {
        let candidates = self.candidates(family);
        for path in &candidates {
            if !path.is_file() {
                continue;
            }
            match load_path(path) {
                Ok(font) => {
                    info!(family = %family, path = %path.display(), "Loaded label font");
                    return Ok(font);
                }
                Err(err) => debug!(path = %path.display(), "Skipping unusable font: {err}"),
            }
        }

        Err(Error::Font(format!(
            "No usable font file found for '{}' ({} locations tried); set export.font_path",
            family,
            candidates.len()
        )))
    }
}

/// Ask fontconfig for `name`.
///
/// fontconfig always returns its best match; for a named family anything but
/// that family is rejected so the stack moves on to its next entry.
fn fontconfig_lookup(fc: &Fontconfig, name: &str) -> Option<PathBuf> {
    let family = CString::new(name).ok()?;
    let mut pattern = Pattern::new(fc);
    pattern.add_string(fontconfig::FC_FAMILY, &family);
    let matched = pattern.font_match();

    let generic = [
        GenericFamily::SansSerif,
        GenericFamily::Serif,
        GenericFamily::Monospace,
    ]
    .iter()
    .any(|g| g.css_name() == name);
    if !generic {
        let matched_family = matched.get_string(fontconfig::FC_FAMILY)?;
        if !matched_family.eq_ignore_ascii_case(name) {
            debug!(requested = name, matched = matched_family, "fontconfig fell back to another family");
            return None;
        }
    }

    let path = PathBuf::from(matched.filename()?);
    if !path.is_file() {
        debug!(family = name, path = %path.display(), "fontconfig path does not exist");
        return None;
    }
    debug!(family = name, path = %path.display(), "Resolved font via fontconfig");
    Some(path)
}

fn load_path(path: &Path) -> Result<Font> {
    let data = fs::read(path)
        .map_err(|e| Error::Font(format!("Failed to read {}: {e}", path.display())))?;
    Font::from_bytes(data, FontSettings::default())
        .map_err(|e| Error::Font(format!("Failed to parse {}: {e}", path.display())))
}

impl TextMeasure for Font {
    fn advance(&self, ch: char, font_size: f32) -> f32 {
        self.metrics(ch, font_size).advance_width
    }
}
