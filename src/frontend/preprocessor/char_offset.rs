use crate::meta::{LocationMeta, MetaMapper};

/// remembers where comments were erased, to restore original byte offsets later
#[derive(Debug, Default, PartialEq)]
pub struct CharOffset {
    /// (offset in clean code where erased text used to be, total length erased up to this point)
    offsets: Vec<(usize, usize)>,
}

impl CharOffset {
    fn new() -> Self {
        Self { offsets: vec![] }
    }

    fn add_offset(&mut self, clean_pos: usize, erased_len: usize) {
        let total = match self.offsets.last() {
            Some((_, total)) => total + erased_len,
            None => erased_len,
        };
        self.offsets.push((clean_pos, total));
    }

    /// byte offset in the original source of the byte at clean_pos in the clean code
    pub fn get_source_position(&self, clean_pos: usize) -> usize {
        // apply offset of all comments erased before or at clean_pos
        let idx = self.offsets.partition_point(|(pos, _)| *pos <= clean_pos);
        match idx {
            0 => clean_pos,
            n => clean_pos + self.offsets[n - 1].1,
        }
    }
}

impl MetaMapper<LocationMeta, LocationMeta> for CharOffset {
    fn map_meta(&self, from: &LocationMeta) -> LocationMeta {
        LocationMeta::from(self.get_source_position(from.offset))
    }
}

/// removes `// line` and `/* block */` comments, newline ending a line comment is kept
/// and a block comment is replaced by a single space, so tokens around it stay separate
pub fn clean_comments(source_code: &str) -> (String, CharOffset) {
    let mut clean_code = String::with_capacity(source_code.len());
    let mut char_offset = CharOffset::new();
    let mut chars = source_code.char_indices().peekable();

    while let Some((idx, current_char)) = chars.next() {
        let next_char = chars.peek().map(|(_, c)| *c);
        let comment_end = match (current_char, next_char) {
            ('/', Some('/')) => {
                let rest = &source_code[idx..];
                Some((idx + rest.find('\n').unwrap_or_else(|| rest.len()), false))
            }
            ('/', Some('*')) => {
                // unterminated comments run until the end of file
                let rest = &source_code[idx + 2..];
                Some((rest.find("*/").map_or(source_code.len(), |end| idx + 2 + end + 2), true))
            }
            _ => None,
        };
        match comment_end {
            Some((end, true)) => {
                // the space stands at the position of `/`, the rest of the comment is erased
                clean_code.push(' ');
                char_offset.add_offset(clean_code.len(), end - idx - 1);
                while chars.peek().map_or(false, |(next_idx, _)| *next_idx < end) {
                    chars.next();
                }
            }
            Some((end, false)) => {
                char_offset.add_offset(clean_code.len(), end - idx);
                while chars.peek().map_or(false, |(next_idx, _)| *next_idx < end) {
                    chars.next();
                }
            }
            None => clean_code.push(current_char),
        }
    }
    (clean_code, char_offset)
}
