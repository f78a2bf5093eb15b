//! Typed request and response bodies.
//!
//! SERP bodies are opaque bytes. Applications that want structured bodies can
//! derive [`Encode`] and [`BorrowDecode`] on their own types and go through
//! [`Request::with_payload`](crate::codec::Request::with_payload) and
//! [`Response::decode_payload`](crate::codec::Response::decode_payload).

use bincode::{
    BorrowDecode,
    Encode,
    borrow_decode_from_slice,
    config,
    encode_to_vec,
    error::{DecodeError, EncodeError},
};

/// Wrapper trait for application payload types.
///
/// Any type deriving [`Encode`] and [`BorrowDecode`] automatically implements
/// this trait via a blanket implementation, using bincode's standard
/// configuration.
///
/// # Examples
///
/// ```
/// use serp::{
///     codec::{Method, Request},
///     payload::Payload,
/// };
///
/// #[derive(bincode::Encode, bincode::BorrowDecode, Debug, PartialEq)]
/// struct Dimmer {
///     level: u8,
/// }
///
/// let request = Request::new(Method::Put, "/lights/hall")
///     .with_payload(&Dimmer { level: 40 })
///     .expect("encodes");
/// let decoded: Dimmer = request.decode_payload().expect("decodes");
/// assert_eq!(decoded, Dimmer { level: 40 });
/// ```
pub trait Payload: Encode + for<'de> BorrowDecode<'de, ()> {
    /// Serialize the payload into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if serialization fails.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> { encode_to_vec(self, config::standard()) }

    /// Deserialize a payload from a byte slice, returning the value and the
    /// number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if deserialization fails.
    fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), DecodeError>
    where
        Self: Sized,
    {
        borrow_decode_from_slice(bytes, config::standard())
    }
}

impl<T> Payload for T where for<'de> T: Encode + BorrowDecode<'de, ()> {}
