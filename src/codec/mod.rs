//! Byte-level reading and writing of individual Avro values
//!
//! Plans compiled by [`resolve`](crate::resolve) are executed against the
//! [`Decoder`] and [`Encoder`] traits. [`BinaryDecoder`] and
//! [`BinaryEncoder`] implement them for the
//! [Avro binary encoding](https://avro.apache.org/docs/current/specification/#binary-encoding).

pub mod de;
pub mod ser;

pub use {
	de::{BinaryDecoder, DeError, DeErrorKind, Decoder},
	ser::{BinaryEncoder, Encoder, SerError, SerErrorKind},
};

pub(crate) use {de::decimal_from_be_bytes, ser::decimal_to_be_bytes};
