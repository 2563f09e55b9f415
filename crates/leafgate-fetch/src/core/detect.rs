/// Number of leading bytes inspected when classifying content.
pub const SNIFF_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Gzip,
    Raw,
}

impl ContentKind {
    /// MIME type a content sniffer reports for this kind.
    pub fn mime(&self) -> &'static str {
        match self {
            ContentKind::Gzip => "application/x-gzip",
            ContentKind::Raw => "application/octet-stream",
        }
    }
}

/// Classify content from its first bytes.
///
/// Only the first [`SNIFF_LEN`] bytes of `prefix` are considered.
pub fn sniff_content(prefix: &[u8]) -> ContentKind {
    let prefix = &prefix[..prefix.len().min(SNIFF_LEN)];
    match prefix {
        // gzip member header: ID1 ID2 CM=deflate
        [0x1F, 0x8B, 0x08, ..] => ContentKind::Gzip,
        _ => ContentKind::Raw,
    }
}
