//! Renders canonical blocks into HTML.

pub mod block_converter;
pub mod block_renderer;
pub mod rich_text;
pub mod toc;

pub use block_converter::{convert_block, BlockFragment, RenderEnv};
pub use block_renderer::{render_blocks, render_page, RenderContext, RenderedBlocks};
pub use rich_text::rich_text_to_html;
pub use toc::{build_table_of_contents, TableOfContents, TocEntry};
