use crate::error::{Result, StampError};

pub const DEFAULT_OPEN: &str = "{{";
pub const DEFAULT_CLOSE: &str = "}}";

/// The open/close token pair that marks a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiters {
    open: String,
    close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Result<Self> {
        let open = open.into();
        let close = close.into();
        if open.is_empty() || close.is_empty() {
            return Err(StampError::InvalidManifest {
                reason: "placeholder delimiters must not be empty".into(),
            });
        }
        Ok(Self { open, close })
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }

    /// Start a fresh scan of `text`. Each call restarts from offset zero.
    pub fn scan<'a>(&'a self, text: &'a str) -> Scanner<'a> {
        Scanner {
            text,
            delimiters: self,
            pos: 0,
            done: false,
        }
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: DEFAULT_OPEN.to_string(),
            close: DEFAULT_CLOSE.to_string(),
        }
    }
}

/// One placeholder occurrence. `start..end` spans both delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    pub expr: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Placeholder(Placeholder<'a>),
    /// An open token with no close token before end of input.
    Unterminated { offset: usize },
}

/// Lazy iterator over the placeholders of one string.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    delimiters: &'a Delimiters,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let open = self.delimiters.open.as_str();
        let close = self.delimiters.close.as_str();

        let Some(found) = self.text[self.pos..].find(open) else {
            self.done = true;
            return None;
        };
        let start = self.pos + found;
        let inner = start + open.len();

        match self.text[inner..].find(close) {
            Some(len) => {
                let end = inner + len + close.len();
                self.pos = end;
                Some(Token::Placeholder(Placeholder {
                    start,
                    end,
                    expr: &self.text[inner..inner + len],
                }))
            }
            None => {
                // No later open token can be closed either.
                self.done = true;
                Some(Token::Unterminated { offset: start })
            }
        }
    }
}
