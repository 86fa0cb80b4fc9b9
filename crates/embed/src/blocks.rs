use std::ops::Range;

/// Fence tag prefix of an embed block: ```` ```embed-python ````
pub const EMBED_BLOCK_PREFIX: &str = "embed-";

/// Language identifier of an embed fence tag, `None` for ordinary code fences
#[must_use]
pub fn embed_language(tag: &str) -> Option<&str> {
    let word = tag.split_whitespace().next()?;
    word.strip_prefix(EMBED_BLOCK_PREFIX)
        .filter(|language| !language.is_empty())
}

/// One embed block found in a markdown document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedBlock {
    pub language: String,

    /// Text between the fences (the embed configuration)
    pub body: String,

    /// Byte range of the block, from the opening fence to the end of the closing
    /// fence line (line break excluded)
    pub span: Range<usize>,
}

struct Fence {
    marker: char,
    width: usize,
    start: usize,
    body_start: usize,
    language: Option<String>,
}

/// Scan `markdown` for fenced `embed-<lang>` blocks.
///
/// Other fenced blocks are skipped whole, so an embed fence quoted inside one is left
/// alone. An unclosed embed block runs to the end of the document.
#[must_use]
pub fn find_embed_blocks(markdown: &str) -> Vec<EmbedBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<Fence> = None;
    let mut offset = 0;

    for line in markdown.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        let content = line.trim_end_matches(['\n', '\r']);

        match open.take() {
            None => open = opening_fence(content, start, offset),
            Some(fence) => {
                if closes(content, &fence) {
                    if let Some(language) = fence.language {
                        blocks.push(EmbedBlock {
                            language,
                            body: markdown[fence.body_start..start].to_string(),
                            span: fence.start..start + content.len(),
                        });
                    }
                } else {
                    open = Some(fence);
                }
            }
        }
    }

    if let Some(Fence {
        language: Some(language),
        start,
        body_start,
        ..
    }) = open
    {
        log::warn!("unclosed embed-{language} block at byte {start}");
        blocks.push(EmbedBlock {
            language,
            body: markdown[body_start..].to_string(),
            span: start..markdown.len(),
        });
    }

    blocks
}

/// Fences may be indented by at most this many spaces; deeper lines are indented code
const MAX_FENCE_INDENT: usize = 3;

/// `content` without its fence indentation, `None` when indented too deep (or by a tab)
fn strip_fence_indent(content: &str) -> Option<&str> {
    let indent = content.len() - content.trim_start_matches(' ').len();
    let rest = &content[indent..];
    if indent > MAX_FENCE_INDENT || rest.starts_with('\t') {
        return None;
    }
    Some(rest)
}

fn opening_fence(content: &str, start: usize, body_start: usize) -> Option<Fence> {
    let trimmed = strip_fence_indent(content)?;
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let width = trimmed.chars().take_while(|c| *c == marker).count();
    if width < 3 {
        return None;
    }

    let info = &trimmed[width..];
    Some(Fence {
        marker,
        width,
        start,
        body_start,
        language: embed_language(info).map(str::to_string),
    })
}

fn closes(content: &str, fence: &Fence) -> bool {
    let Some(trimmed) = strip_fence_indent(content) else {
        return false;
    };
    let trimmed = trimmed.trim_end();
    trimmed.len() >= fence.width && trimmed.chars().all(|c| c == fence.marker)
}
