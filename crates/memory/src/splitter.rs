//! Sentence-aware text chunking for semantic ingestion.

/// Splits text into chunks of at most `chunk_size` characters.
///
/// Whole sentences are packed greedily. A sentence longer than a chunk is
/// split on word boundaries, and a single oversized word is cut hard.
/// With `overlap > 0` each chunk starts with up to `overlap` characters of
/// trailing words from the previous chunk.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size / 2),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        for sentence in sentences(text) {
            if char_len(sentence) <= self.chunk_size {
                pieces.push(sentence.to_string());
            } else {
                pieces.extend(self.split_long(sentence));
            }
        }

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        for piece in pieces {
            let joined_len = if current.is_empty() {
                char_len(&piece)
            } else {
                char_len(&current) + 1 + char_len(&piece)
            };
            if joined_len > self.chunk_size && !current.is_empty() {
                let carry = self.carry_over(&current, char_len(&piece));
                chunks.push(std::mem::take(&mut current));
                current = carry;
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&piece);
        }
        if !current.trim().is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Trailing words of `chunk` that fit in the overlap and still leave
    /// room for the next piece.
    fn carry_over(&self, chunk: &str, next_len: usize) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        let budget = self
            .overlap
            .min(self.chunk_size.saturating_sub(next_len + 1));
        let mut taken: Vec<&str> = Vec::new();
        let mut used = 0;
        for word in chunk.split_whitespace().rev() {
            let extra = char_len(word) + usize::from(!taken.is_empty());
            if used + extra > budget {
                break;
            }
            used += extra;
            taken.push(word);
        }
        taken.reverse();
        taken.join(" ")
    }

    fn split_long(&self, sentence: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = String::new();
        for word in sentence.split_whitespace() {
            if char_len(word) > self.chunk_size {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                out.extend(chars.chunks(self.chunk_size).map(|c| c.iter().collect::<String>()));
                continue;
            }
            let joined_len = if current.is_empty() {
                char_len(word)
            } else {
                char_len(&current) + 1 + char_len(word)
            };
            if joined_len > self.chunk_size {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(800, 0)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Sentences end at `.`, `!` or `?` followed by whitespace, or at a blank line.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '.' | '!' | '?' => chars.peek().is_none_or(|(_, next)| next.is_whitespace()),
            '\n' => chars.peek().is_some_and(|(_, next)| *next == '\n'),
            _ => false,
        };
        if boundary {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}
