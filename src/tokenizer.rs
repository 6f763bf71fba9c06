use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use memchr::{memchr, memchr2};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{instrument, trace};

use crate::metrics;
use crate::Token;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed JSON at byte {offset}: {reason}")]
    MalformedInput { offset: u64, reason: &'static str },
    #[error("Parser is busy with a running fetch")]
    Busy,
}

impl FeedError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, FeedError::MalformedInput { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Bytes reserved per refill of the read buffer.
    pub buffer_size: usize,
    /// Longest string or number accepted as a single token.
    pub max_token_len: usize,
    /// Name objects inside an array after the array's own field, so the
    /// elements of `"situationRecord": [ {..}, {..} ]` open and close
    /// `situationRecord`. Off by default: array elements are unnamed.
    pub name_array_elements: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            buffer_size: 8 * 1024,
            max_token_len: 1024 * 1024,
            name_array_elements: false,
        }
    }
}

/// Pull interface over a token stream with one token of lookahead.
#[async_trait]
pub trait TokenSource: Send {
    /// Consume and return the next token. Returns `EndOfStream` forever once
    /// the document is exhausted.
    async fn next_token(&mut self) -> Result<Token, FeedError>;

    /// Look at the next token without consuming it.
    async fn peek_token(&mut self) -> Result<&Token, FeedError>;

    /// Consume the next token only if it is a scalar, returning its text.
    /// Structural tokens stay in place for the caller to see.
    async fn next_scalar(&mut self) -> Result<Option<String>, FeedError> {
        if !self.peek_token().await?.is_scalar() {
            return Ok(None);
        }
        match self.next_token().await? {
            Token::ScalarValue(text) => Ok(Some(text)),
            _ => Ok(None),
        }
    }
}

/// Replays a prepared list of tokens.
pub struct VecTokenSource {
    tokens: std::vec::IntoIter<Token>,
    peeked: Option<Token>,
}

impl VecTokenSource {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter(),
            peeked: None,
        }
    }
}

#[async_trait]
impl TokenSource for VecTokenSource {
    async fn next_token(&mut self) -> Result<Token, FeedError> {
        Ok(self
            .peeked
            .take()
            .or_else(|| self.tokens.next())
            .unwrap_or(Token::EndOfStream))
    }

    async fn peek_token(&mut self) -> Result<&Token, FeedError> {
        let tokens = &mut self.tokens;
        Ok(self
            .peeked
            .get_or_insert_with(|| tokens.next().unwrap_or(Token::EndOfStream)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Value,
    ValueOrEnd,
    Key,
    KeyOrEnd,
    Colon,
    CommaOrEnd,
}

#[derive(Debug)]
struct Frame {
    is_array: bool,
    name: Option<String>,
}

/// Incremental JSON lexer over an async byte reader.
///
/// Bytes are pulled into a refill buffer only as tokens need them; nothing
/// beyond the current token and the open container stack is retained.
pub struct JsonTokenizer<R> {
    reader: R,
    buffer: BytesMut,
    config: ParserConfig,
    stack: Vec<Frame>,
    expect: Expect,
    pending_name: Option<String>,
    peeked: Option<Token>,
    offset: u64,
    root_done: bool,
    eof: bool,
}

impl<R: AsyncRead + Unpin + Send> JsonTokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ParserConfig::default())
    }

    pub fn with_config(reader: R, config: ParserConfig) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(config.buffer_size),
            config,
            stack: Vec::new(),
            expect: Expect::Value,
            pending_name: None,
            peeked: None,
            offset: 0,
            root_done: false,
            eof: false,
        }
    }

    /// Byte offset of the first unconsumed input byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Current container nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    #[instrument(level = "trace", skip(self))]
    async fn fill_buffer(&mut self) -> Result<bool, FeedError> {
        if self.eof {
            return Ok(false);
        }
        self.buffer.reserve(self.config.buffer_size);
        let bytes_read = self.reader.read_buf(&mut self.buffer).await?;
        if bytes_read == 0 {
            self.eof = true;
        }
        metrics::set_buffer_size(self.buffer.len());
        Ok(bytes_read > 0)
    }

    fn advance(&mut self, count: usize) {
        self.buffer.advance(count);
        self.offset += count as u64;
    }

    fn malformed(&self, reason: &'static str) -> FeedError {
        FeedError::MalformedInput {
            offset: self.offset,
            reason,
        }
    }

    async fn next_significant_byte(&mut self) -> Result<Option<u8>, FeedError> {
        loop {
            let blank = self
                .buffer
                .iter()
                .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
                .count();
            self.advance(blank);
            if let Some(&byte) = self.buffer.first() {
                return Ok(Some(byte));
            }
            if !self.fill_buffer().await? {
                return Ok(None);
            }
        }
    }

    async fn lex(&mut self) -> Result<Token, FeedError> {
        loop {
            let Some(byte) = self.next_significant_byte().await? else {
                if self.stack.is_empty() {
                    return Ok(Token::EndOfStream);
                }
                return Err(self.malformed("unexpected end of input"));
            };
            if self.root_done {
                return Err(self.malformed("trailing characters after document"));
            }

            match (self.expect, byte) {
                (Expect::Colon, b':') => {
                    self.advance(1);
                    self.expect = Expect::Value;
                }
                (Expect::Colon, _) => return Err(self.malformed("expected ':'")),
                (Expect::CommaOrEnd, b',') => {
                    self.advance(1);
                    self.expect = match self.stack.last() {
                        Some(frame) if frame.is_array => Expect::Value,
                        _ => Expect::Key,
                    };
                }
                (Expect::CommaOrEnd | Expect::KeyOrEnd, b'}') if self.in_object() => {
                    return Ok(self.close());
                }
                (Expect::CommaOrEnd | Expect::ValueOrEnd, b']') if self.in_array() => {
                    return Ok(self.close());
                }
                (Expect::CommaOrEnd, _) => {
                    return Err(self.malformed("expected ',' or closing bracket"))
                }
                (Expect::Key | Expect::KeyOrEnd, b'"') => {
                    let key = self.read_string().await?;
                    self.expect = Expect::Colon;
                    self.pending_name = Some(key.clone());
                    return Ok(Token::FieldName(key));
                }
                (Expect::Key | Expect::KeyOrEnd, _) => {
                    return Err(self.malformed("expected field name"))
                }
                (Expect::Value | Expect::ValueOrEnd, _) => return self.value(byte).await,
            }
        }
    }

    fn in_object(&self) -> bool {
        matches!(self.stack.last(), Some(frame) if !frame.is_array)
    }

    fn in_array(&self) -> bool {
        matches!(self.stack.last(), Some(frame) if frame.is_array)
    }

    /// Name for a container opening at the current position.
    fn child_name(&mut self) -> Option<String> {
        match self.stack.last() {
            Some(frame) if frame.is_array => {
                if self.config.name_array_elements {
                    frame.name.clone()
                } else {
                    None
                }
            }
            Some(_) => self.pending_name.take(),
            None => None,
        }
    }

    fn value_done(&mut self) {
        self.pending_name = None;
        if self.stack.is_empty() {
            self.root_done = true;
        } else {
            self.expect = Expect::CommaOrEnd;
        }
    }

    fn close(&mut self) -> Token {
        self.advance(1);
        let frame = self.stack.pop();
        self.value_done();
        match frame {
            Some(Frame {
                is_array: false,
                name,
            }) => Token::ObjectEnd(name),
            _ => Token::ArrayEnd,
        }
    }

    async fn value(&mut self, byte: u8) -> Result<Token, FeedError> {
        match byte {
            b'{' | b'[' => {
                self.advance(1);
                let name = self.child_name();
                let is_array = byte == b'[';
                self.stack.push(Frame {
                    is_array,
                    name: name.clone(),
                });
                if is_array {
                    self.expect = Expect::ValueOrEnd;
                    Ok(Token::ArrayStart)
                } else {
                    self.expect = Expect::KeyOrEnd;
                    Ok(Token::ObjectStart(name))
                }
            }
            b'"' => {
                let text = self.read_string().await?;
                self.value_done();
                Ok(Token::ScalarValue(text))
            }
            b'-' | b'0'..=b'9' => {
                let text = self.read_number().await?;
                self.value_done();
                Ok(Token::ScalarValue(text))
            }
            b't' => self.read_literal("true").await,
            b'f' => self.read_literal("false").await,
            b'n' => self.read_literal("null").await,
            _ => Err(self.malformed("unexpected character")),
        }
    }

    /// Reads a quoted string starting at the current byte.
    async fn read_string(&mut self) -> Result<String, FeedError> {
        let start = self.offset;
        let mut scan = 1;
        let end = loop {
            if scan < self.buffer.len() {
                match memchr2(b'"', b'\\', &self.buffer[scan..]) {
                    Some(i) if self.buffer[scan + i] == b'"' => break scan + i,
                    Some(i) => {
                        scan += i + 2;
                        continue;
                    }
                    None => scan = self.buffer.len(),
                }
            }
            if scan > self.config.max_token_len {
                return Err(self.malformed("token exceeds max_token_len"));
            }
            if !self.fill_buffer().await? {
                return Err(self.malformed("unterminated string"));
            }
        };
        if end - 1 > self.config.max_token_len {
            return Err(self.malformed("token exceeds max_token_len"));
        }

        let raw = self.buffer.split_to(end + 1);
        self.offset += raw.len() as u64;
        unescape(&raw[1..end]).map_err(|reason| FeedError::MalformedInput {
            offset: start,
            reason,
        })
    }

    async fn read_number(&mut self) -> Result<String, FeedError> {
        let mut len = 0;
        loop {
            len += self.buffer[len..]
                .iter()
                .take_while(|b| matches!(b, b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'))
                .count();
            if len > self.config.max_token_len {
                return Err(self.malformed("token exceeds max_token_len"));
            }
            if len < self.buffer.len() || !self.fill_buffer().await? {
                break;
            }
        }

        if !is_valid_number(&self.buffer[..len]) {
            return Err(self.malformed("invalid number"));
        }
        let raw = self.buffer.split_to(len);
        self.offset += len as u64;
        // Validated above as ASCII digits and signs.
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    async fn read_literal(&mut self, literal: &'static str) -> Result<Token, FeedError> {
        while self.buffer.len() < literal.len() {
            if !self.fill_buffer().await? {
                return Err(self.malformed("unexpected end of input"));
            }
        }
        if !self.buffer.starts_with(literal.as_bytes()) {
            return Err(self.malformed("invalid literal"));
        }
        self.advance(literal.len());
        self.value_done();
        Ok(Token::ScalarValue(literal.to_string()))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> TokenSource for JsonTokenizer<R> {
    async fn next_token(&mut self) -> Result<Token, FeedError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex().await?,
        };
        trace!(%token, offset = self.offset, depth = self.depth(), "token");
        metrics::inc_tokens();
        Ok(token)
    }

    async fn peek_token(&mut self) -> Result<&Token, FeedError> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.lex().await?,
        };
        Ok(self.peeked.insert(token))
    }
}

fn is_valid_number(text: &[u8]) -> bool {
    let digits = |from: usize| text[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut i = usize::from(text.first() == Some(&b'-'));
    match text.get(i) {
        Some(b'0') => i += 1,
        Some(b'1'..=b'9') => i += digits(i),
        _ => return false,
    }
    if text.get(i) == Some(&b'.') {
        i += 1;
        let fraction = digits(i);
        if fraction == 0 {
            return false;
        }
        i += fraction;
    }
    if matches!(text.get(i), Some(b'e' | b'E')) {
        i += 1;
        if matches!(text.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exponent = digits(i);
        if exponent == 0 {
            return false;
        }
        i += exponent;
    }
    i == text.len()
}

fn unescape(raw: &[u8]) -> Result<String, &'static str> {
    if raw.iter().any(|&b| b < 0x20) {
        return Err("control character in string");
    }
    if memchr(b'\\', raw).is_none() {
        return std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| "invalid UTF-8 in string");
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        let escaped = *raw.get(i + 1).ok_or("invalid escape")?;
        i += 2;
        match escaped {
            b'"' | b'\\' | b'/' => out.push(escaped),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                let high = hex4(raw.get(i..i + 4))?;
                i += 4;
                let code = match high {
                    0xD800..=0xDBFF => {
                        if raw.get(i..i + 2) != Some(b"\\u".as_slice()) {
                            return Err("unpaired surrogate");
                        }
                        let low = hex4(raw.get(i + 2..i + 6))?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err("unpaired surrogate");
                        }
                        i += 6;
                        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                    }
                    0xDC00..=0xDFFF => return Err("unpaired surrogate"),
                    _ => high,
                };
                let ch = char::from_u32(code).ok_or("invalid unicode escape")?;
                let mut utf8 = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
            }
            _ => return Err("invalid escape"),
        }
    }
    String::from_utf8(out).map_err(|_| "invalid UTF-8 in string")
}

fn hex4(digits: Option<&[u8]>) -> Result<u32, &'static str> {
    let digits = digits.ok_or("truncated unicode escape")?;
    digits.iter().try_fold(0u32, |acc, &d| {
        let value = char::from(d).to_digit(16).ok_or("invalid unicode escape")?;
        Ok(acc * 16 + value)
    })
}
