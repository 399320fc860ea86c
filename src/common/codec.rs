//! Fixed-size value encoding.

/// A value with a fixed-width little-endian encoding.
///
/// Node records reserve `ENCODED_LEN` bytes per value slot, so every value
/// of a type must encode to exactly that many bytes.
///
/// # Example
/// ```
/// use pagetree::FixedCodec;
///
/// let mut buf = [0u8; 8];
/// 42u64.encode_into(&mut buf);
/// assert_eq!(u64::decode_from(&buf), 42);
/// ```
pub trait FixedCodec: Sized {
    /// Number of bytes produced by [`encode_into`](Self::encode_into).
    const ENCODED_LEN: usize;

    /// Write the value into `buf[..ENCODED_LEN]`.
    ///
    /// # Panics
    /// Panics if `buf` is shorter than `ENCODED_LEN`.
    fn encode_into(&self, buf: &mut [u8]);

    /// Read a value from `buf[..ENCODED_LEN]`.
    ///
    /// # Panics
    /// Panics if `buf` is shorter than `ENCODED_LEN`.
    fn decode_from(buf: &[u8]) -> Self;
}

macro_rules! impl_fixed_codec_num {
    ($($t:ty),*) => {
        $(
            impl FixedCodec for $t {
                const ENCODED_LEN: usize = std::mem::size_of::<$t>();

                #[inline]
                fn encode_into(&self, buf: &mut [u8]) {
                    buf[..Self::ENCODED_LEN].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode_from(buf: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$t>()];
                    bytes.copy_from_slice(&buf[..Self::ENCODED_LEN]);
                    <$t>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_fixed_codec_num!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl FixedCodec for bool {
    const ENCODED_LEN: usize = 1;

    #[inline]
    fn encode_into(&self, buf: &mut [u8]) {
        buf[0] = u8::from(*self);
    }

    #[inline]
    fn decode_from(buf: &[u8]) -> Self {
        buf[0] != 0
    }
}

impl<const N: usize> FixedCodec for [u8; N] {
    const ENCODED_LEN: usize = N;

    #[inline]
    fn encode_into(&self, buf: &mut [u8]) {
        buf[..N].copy_from_slice(self);
    }

    #[inline]
    fn decode_from(buf: &[u8]) -> Self {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&buf[..N]);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: FixedCodec + PartialEq + std::fmt::Debug>(value: T) {
        let mut buf = vec![0u8; T::ENCODED_LEN];
        value.encode_into(&mut buf);
        assert_eq!(T::decode_from(&buf), value);
    }

    #[test]
    fn test_encoded_lengths() {
        assert_eq!(<u8 as FixedCodec>::ENCODED_LEN, 1);
        assert_eq!(<i32 as FixedCodec>::ENCODED_LEN, 4);
        assert_eq!(<f64 as FixedCodec>::ENCODED_LEN, 8);
        assert_eq!(<bool as FixedCodec>::ENCODED_LEN, 1);
        assert_eq!(<[u8; 16] as FixedCodec>::ENCODED_LEN, 16);
    }

    #[test]
    fn test_values_survive_encoding() {
        roundtrip(-7i32);
        roundtrip(u64::MAX);
        roundtrip(1.5f64);
        roundtrip(true);
        roundtrip(*b"fixed-width!");
    }

    #[test]
    fn test_little_endian_layout() {
        let mut buf = [0u8; 4];
        0x0403_0201u32.encode_into(&mut buf);
        assert_eq!(buf, [0x01, 0x02, 0x03, 0x04]);
    }
}
