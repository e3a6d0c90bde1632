//! Wire encodings for export requests, acknowledgements, and any other
//! serde-described transport message.

use crate::error::CodecError;
use crate::request::{ExportAck, ExportRequest};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Selects how structured messages are laid out on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Length-prefixed little-endian binary layout (bincode).
    #[default]
    Binary,
    /// Human-readable JSON, mostly for debugging captures.
    Json,
}

impl Encoding {
    /// Encodes any serializable message.
    pub fn encode<T: Serialize>(self, message: &T) -> Result<Bytes, CodecError> {
        let bytes = match self {
            Encoding::Binary => bincode::serialize(message)?,
            Encoding::Json => serde_json::to_vec(message)?,
        };
        Ok(Bytes::from(bytes))
    }

    /// Decodes any deserializable message.
    pub fn decode<T: DeserializeOwned>(self, payload: &[u8]) -> Result<T, CodecError> {
        match self {
            Encoding::Binary => Ok(bincode::deserialize(payload)?),
            Encoding::Json => Ok(serde_json::from_slice(payload)?),
        }
    }

    pub fn encode_request(self, request: &ExportRequest) -> Result<Bytes, CodecError> {
        self.encode(request)
    }

    pub fn decode_request(self, payload: &[u8]) -> Result<ExportRequest, CodecError> {
        self.decode(payload)
    }

    pub fn encode_ack(self, ack: &ExportAck) -> Result<Bytes, CodecError> {
        self.encode(ack)
    }

    pub fn decode_ack(self, payload: &[u8]) -> Result<ExportAck, CodecError> {
        self.decode(payload)
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Binary => "binary",
            Encoding::Json => "json",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bincode" => Ok(Encoding::Binary),
            "json" => Ok(Encoding::Json),
            other => Err(format!("unknown encoding '{}' (expected binary or json)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{Generator, GeneratorConfig, MetricShapes};

    #[test]
    fn test_binary_request_leads_with_id() {
        let mut generator = Generator::new(GeneratorConfig::default());
        let request = ExportRequest::new(0x0102_0304, generator.generate_span_batch(1, None, 0));
        let bytes = Encoding::Binary.encode_request(&request).unwrap();
        assert_eq!(&bytes[..8], &0x0102_0304u64.to_le_bytes());
    }

    #[test]
    fn test_ack_encodings() {
        for encoding in [Encoding::Binary, Encoding::Json] {
            let bytes = encoding.encode_ack(&ExportAck { id: 42 }).unwrap();
            assert_eq!(encoding.decode_ack(&bytes).unwrap().id, 42);
        }
        assert_eq!(Encoding::Json.encode_ack(&ExportAck { id: 7 }).unwrap(), &b"{\"id\":7}"[..]);
    }

    #[test]
    fn test_metric_request_json() {
        let generator = Generator::new(GeneratorConfig::default());
        let request = ExportRequest::new(9, generator.generate_metric_batch(2, 2, MetricShapes::ALL));
        let bytes = Encoding::Json.encode_request(&request).unwrap();
        assert_eq!(Encoding::Json.decode_request(&bytes).unwrap(), request);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            Encoding::Binary.decode_request(&[1, 2, 3]),
            Err(CodecError::Binary(_))
        ));
        assert!(matches!(
            Encoding::Json.decode_request(b"not json"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_parse_encoding() {
        assert_eq!("binary".parse::<Encoding>().unwrap(), Encoding::Binary);
        assert_eq!("JSON".parse::<Encoding>().unwrap(), Encoding::Json);
        assert!("protobuf".parse::<Encoding>().is_err());
        assert_eq!(Encoding::default().to_string(), "binary");
    }
}
