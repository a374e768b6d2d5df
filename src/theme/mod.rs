//! Static theme bundles: LaTeX fragments, embedded images and the variables
//! the fragments expect.

mod substitute;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PaperError, PaperResult};

pub use substitute::substitute;

/// Fragments every theme must ship because the renderer references them by
/// name.
pub const BASE_FILES: [&str; 5] = [
    "basic_headers.tex",
    "header_footer.tex",
    "header_footer_no_first.tex",
    "chapter_break.tex",
    "pygments.theme",
];

#[derive(Debug, Clone, Copy)]
pub struct ThemeFile {
    pub name: &'static str,
    pub content: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ThemeImage {
    pub name: &'static str,
    pub bytes: &'static [u8],
}

#[derive(Debug)]
pub struct Theme {
    pub name: &'static str,
    pub files: &'static [ThemeFile],
    pub images: &'static [ThemeImage],
    /// Fragments passed to the compiler with `--include-in-header` on every
    /// render, in order.
    pub tex_headers: &'static [&'static str],
    pub required_variables: &'static [&'static str],
}

macro_rules! theme_file {
    ($name:literal) => {
        ThemeFile {
            name: $name,
            content: include_str!(concat!("../../assets/themes/default/", $name)),
        }
    };
}

const DEFAULT_FILES: &[ThemeFile] = &[
    theme_file!("basic_headers.tex"),
    theme_file!("header_footer.tex"),
    theme_file!("header_footer_no_first.tex"),
    theme_file!("bullet_style.tex"),
    theme_file!("chapter_break.tex"),
    theme_file!("inline_code.tex"),
    theme_file!("pdf_properties.tex"),
    theme_file!("cover.tex"),
    theme_file!("quote.tex"),
    theme_file!("pygments.theme"),
];

const MINIMAL_FILES: &[ThemeFile] = &[
    theme_file!("basic_headers.tex"),
    theme_file!("header_footer.tex"),
    theme_file!("header_footer_no_first.tex"),
    theme_file!("chapter_break.tex"),
    theme_file!("pdf_properties.tex"),
    theme_file!("pygments.theme"),
];

pub static DEFAULT: Theme = Theme {
    name: "default",
    files: DEFAULT_FILES,
    images: &[],
    tex_headers: &[
        "bullet_style.tex",
        "inline_code.tex",
        "pdf_properties.tex",
        "quote.tex",
    ],
    required_variables: &["company", "title", "author", "subject", "keywords", "date"],
};

pub static MINIMAL: Theme = Theme {
    name: "minimal",
    files: MINIMAL_FILES,
    images: &[],
    tex_headers: &["pdf_properties.tex"],
    required_variables: &["company", "title", "author", "subject", "keywords", "date"],
};

static THEMES: [&Theme; 2] = [&DEFAULT, &MINIMAL];

impl Theme {
    /// Looks a theme up by the report's engine tag.
    pub fn by_name(name: &str) -> PaperResult<&'static Theme> {
        THEMES
            .iter()
            .copied()
            .find(|theme| theme.name == name)
            .ok_or_else(|| PaperError::UnknownTheme(name.to_string()))
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        THEMES.iter().map(|theme| theme.name)
    }

    pub fn file(&self, name: &str) -> Option<&'static str> {
        self.files
            .iter()
            .find(|file| file.name == name)
            .map(|file| file.content)
    }

    pub fn missing_variables(&self, variables: &BTreeMap<String, String>) -> Vec<&'static str> {
        self.required_variables
            .iter()
            .copied()
            .filter(|name| !variables.contains_key(*name))
            .collect()
    }

    /// Writes every fragment (with `$name$` substitution) and image into `dir`.
    pub fn materialize(&self, dir: &Path, variables: &BTreeMap<String, String>) -> PaperResult<()> {
        for file in self.files {
            std::fs::write(dir.join(file.name), substitute(file.content, variables))?;
        }
        for image in self.images {
            std::fs::write(dir.join(image.name), image.bytes)?;
        }
        Ok(())
    }
}
