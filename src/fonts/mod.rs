//! Font discovery for report rendering.
//!
//! The report uses the Roboto family. It is looked up, in order, in the directory named by
//! `SURVEY_REPORT_FONTS_DIR`, in `assets/fonts` next to the running executable, and in
//! `assets/fonts` of this crate. When none of them holds the complete family, the Windows Arial
//! family is tried (`SURVEY_REPORT_WINDOWS_FONTS_DIR`, then `%WINDIR%\Fonts`).

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable overriding the bundled font directory.
pub const FONTS_DIR_ENV: &str = "SURVEY_REPORT_FONTS_DIR";

/// Environment variable overriding the Windows fallback font directory.
pub const WINDOWS_FONTS_DIR_ENV: &str = "SURVEY_REPORT_WINDOWS_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

const FALLBACK_FAMILY_NAME: &str = "Arial";

/// File names of the fallback family, in regular/bold/italic/bold-italic order.
const FALLBACK_FILES: [(&str, &str); 4] = [
    ("arial.ttf", "regular"),
    ("arialbd.ttf", "bold"),
    ("ariali.ttf", "italic"),
    ("arialbi.ttf", "bold italic"),
];

/// Directory of the fonts shipped with the crate sources.
pub fn bundled_fonts_source_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push_unique = |candidate: PathBuf| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        push_unique(path);
    }
    if let Some(bin_dir) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        push_unique(bin_dir.join("assets/fonts"));
    }
    push_unique(bundled_fonts_source_dir());

    candidates
}

fn missing_font_files(path: &Path) -> Vec<String> {
    FONT_FILES
        .iter()
        .filter(|name| !path.join(name).is_file())
        .map(|name| name.to_string())
        .collect()
}

fn resolve_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }
        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            debug!("Using fonts from {}", candidate.display());
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(Error::new(
        format!(
            "Unable to locate the {} font family. Checked: {}. Set {} to a directory containing {}.",
            DEFAULT_FONT_FAMILY_NAME,
            attempts.join(", "),
            FONTS_DIR_ENV,
            FONT_FILES.join(", ")
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory()?;

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn fallback_font_directory() -> Option<PathBuf> {
    if let Some(path) = env_path(WINDOWS_FONTS_DIR_ENV) {
        return Some(path);
    }

    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env_path(var) {
                let candidate = root.join("Fonts");
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

fn load_fallback_font(directory: &Path, file: &str, style: &str) -> Result<FontData, Error> {
    let path = directory.join(file);
    FontData::load(&path, None).map_err(|err| {
        let kind = if path.is_file() {
            io::ErrorKind::Other
        } else {
            io::ErrorKind::NotFound
        };
        Error::new(
            format!(
                "Failed to load fallback {} font at {}: {}",
                style,
                path.display(),
                err
            ),
            io::Error::new(kind, err.to_string()),
        )
    })
}

fn fallback_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = fallback_font_directory().ok_or_else(|| {
        Error::new(
            "Windows font directory not found for fallback",
            io::Error::new(io::ErrorKind::NotFound, "windows fonts directory not found"),
        )
    })?;

    let [regular, bold, italic, bold_italic] = FALLBACK_FILES;
    Ok(FontFamily {
        regular: load_fallback_font(&directory, regular.0, regular.1)?,
        bold: load_fallback_font(&directory, bold.0, bold.1)?,
        italic: load_fallback_font(&directory, italic.0, italic.1)?,
        bold_italic: load_fallback_font(&directory, bold_italic.0, bold_italic.1)?,
    })
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the Roboto family, falling back to Windows Arial when Roboto cannot be found.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family() {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match fallback_font_family() {
            Ok(fallback) => {
                warn!(
                    "{} fonts unavailable ({}); falling back to '{}'",
                    DEFAULT_FONT_FAMILY_NAME, err, FALLBACK_FAMILY_NAME
                );
                Ok(fallback)
            }
            Err(fallback_err) => Err(Error::new(
                format!(
                    "{}; the '{}' fallback failed as well: {}",
                    err, FALLBACK_FAMILY_NAME, fallback_err
                ),
                io::Error::new(io::ErrorKind::NotFound, "no usable font family"),
            )),
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether the Roboto family can be found without falling back.
pub fn default_fonts_available() -> bool {
    resolve_font_directory().is_ok()
}
