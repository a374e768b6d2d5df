//! Markdown report assembly: text, tables and figures accumulated in a
//! buffer, then written out next to the theme files and rendered.

pub mod builder;
pub mod figure;
pub mod save;
pub mod snapshot;
pub mod table;

pub use builder::{DEFAULT_ENGINE, DEFAULT_GRAPH_WIDTH, Report, TextStyle};
pub use figure::{Figure, ImageFile, PngBytes};
pub use save::SaveOptions;
pub use snapshot::{CONFIG_FILE, MARKDOWN_FILE, ReportConfig};
pub use table::Table;
