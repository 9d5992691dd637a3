//! Minimal OSC 1.0 message codec.
//!
//! Only the argument types the cube controller speaks are supported:
//! `i` (int32), `f` (float32), `s` (string) and `b` (blob). All numeric
//! fields are big-endian and every field is padded to a 4-byte boundary.

/// One OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Str(String),
    Blob(Vec<u8>),
}

impl OscArg {
    fn tag(&self) -> u8 {
        match self {
            OscArg::Int(_) => b'i',
            OscArg::Float(_) => b'f',
            OscArg::Str(_) => b's',
            OscArg::Blob(_) => b'b',
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match *self {
            OscArg::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric value of an int or float argument.
    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            OscArg::Int(v) => Some(v as f32),
            OscArg::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscArg::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            OscArg::Blob(b) => Some(b),
            _ => None,
        }
    }
}

/// OSC decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OscError {
    #[error("Packet truncated at byte {0}")]
    Truncated(usize),
    #[error("String at byte {0} is not NUL terminated UTF-8")]
    InvalidString(usize),
    #[error("Address {0:?} must start with '/'")]
    InvalidAddress(String),
    #[error("Type tag string must start with ','")]
    MissingTypeTags,
    #[error("Unsupported type tag {0:?}")]
    UnsupportedTag(char),
    #[error("OSC bundles are not supported")]
    Bundle,
}

/// An OSC message: address pattern plus typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    /// Builder-style argument append.
    pub fn arg(mut self, arg: OscArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Serialize to a single datagram.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        write_padded_str(&mut out, self.address.as_bytes());

        let mut tags = Vec::with_capacity(self.args.len() + 1);
        tags.push(b',');
        tags.extend(self.args.iter().map(OscArg::tag));
        write_padded_str(&mut out, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
                OscArg::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
                OscArg::Str(s) => write_padded_str(&mut out, s.as_bytes()),
                OscArg::Blob(b) => {
                    out.extend_from_slice(&(b.len() as i32).to_be_bytes());
                    out.extend_from_slice(b);
                    out.resize(out.len() + pad(b.len()), 0);
                }
            }
        }
        out
    }

    /// Exact size of [`encode`](Self::encode)'s output.
    pub fn encoded_len(&self) -> usize {
        let str_len = |n: usize| n + 1 + pad(n + 1);
        let args: usize = self
            .args
            .iter()
            .map(|arg| match arg {
                OscArg::Int(_) | OscArg::Float(_) => 4,
                OscArg::Str(s) => str_len(s.len()),
                OscArg::Blob(b) => 4 + b.len() + pad(b.len()),
            })
            .sum();
        str_len(self.address.len()) + str_len(self.args.len() + 1) + args
    }

    /// Parse a datagram.
    pub fn decode(bytes: &[u8]) -> Result<Self, OscError> {
        if bytes.starts_with(b"#bundle") {
            return Err(OscError::Bundle);
        }

        let mut reader = Reader { bytes, pos: 0 };
        let address = reader.padded_str()?;
        if !address.starts_with('/') {
            return Err(OscError::InvalidAddress(address));
        }

        // Messages without a type tag string are allowed by OSC 1.0 and carry
        // no arguments.
        if reader.pos >= bytes.len() {
            return Ok(Self::new(address));
        }

        let tags = reader.padded_str()?;
        let tags = tags.strip_prefix(',').ok_or(OscError::MissingTypeTags)?;

        let mut args = Vec::with_capacity(tags.len());
        for tag in tags.chars() {
            let arg = match tag {
                'i' => OscArg::Int(i32::from_be_bytes(reader.word()?)),
                'f' => OscArg::Float(f32::from_be_bytes(reader.word()?)),
                's' => OscArg::Str(reader.padded_str()?),
                'b' => {
                    let len = i32::from_be_bytes(reader.word()?);
                    let len = usize::try_from(len).map_err(|_| OscError::Truncated(reader.pos))?;
                    let data = reader.take(len)?.to_vec();
                    reader.take(pad(len))?;
                    OscArg::Blob(data)
                }
                other => return Err(OscError::UnsupportedTag(other)),
            };
            args.push(arg);
        }

        Ok(Self { address, args })
    }
}

/// Bytes needed to pad `len` up to a multiple of 4.
#[inline]
fn pad(len: usize) -> usize {
    (4 - len % 4) % 4
}

fn write_padded_str(out: &mut Vec<u8>, s: &[u8]) {
    out.extend_from_slice(s);
    out.push(0);
    out.resize(out.len() + pad(s.len() + 1), 0);
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], OscError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(OscError::Truncated(self.pos))?;
        let out = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn word(&mut self) -> Result<[u8; 4], OscError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    fn padded_str(&mut self) -> Result<String, OscError> {
        let start = self.pos;
        let rest = &self.bytes[start..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(OscError::InvalidString(start))?;
        let s = std::str::from_utf8(&rest[..nul])
            .map_err(|_| OscError::InvalidString(start))?
            .to_owned();
        self.take(nul + 1 + pad(nul + 1))?;
        Ok(s)
    }
}
