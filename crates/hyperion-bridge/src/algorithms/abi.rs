//! Minimal Solidity `abi.encode` for static words and dynamic word arrays
//!
//! Only the shapes used by the bridge checkpoints are supported: `bytes32`,
//! `uint256`, `address` and arrays of `uint256` / `address`.

use crate::domain::EthAddress;
use primitive_types::U256;

/// 32-byte ABI word.
pub type Word = [u8; 32];

/// One top-level argument of `abi.encode`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbiToken {
    /// Any static 32-byte value.
    Word(Word),
    /// Dynamic array of static 32-byte values.
    Array(Vec<Word>),
}

pub fn uint_word(value: U256) -> Word {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

pub fn u64_word(value: u64) -> Word {
    uint_word(U256::from(value))
}

/// Addresses are right-aligned.
pub fn address_word(address: &EthAddress) -> Word {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Short ASCII strings cast to `bytes32` are left-aligned.
pub fn bytes32_word(text: &str) -> Word {
    let mut word = [0u8; 32];
    let bytes = text.as_bytes();
    let len = bytes.len().min(32);
    word[..len].copy_from_slice(&bytes[..len]);
    word
}

/// Head/tail encoding: static words inline, arrays as offsets into the tail.
pub fn encode(tokens: &[AbiToken]) -> Vec<u8> {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            AbiToken::Word(word) => head.extend_from_slice(word),
            AbiToken::Array(items) => {
                head.extend_from_slice(&u64_word((head_len + tail.len()) as u64));
                tail.extend_from_slice(&u64_word(items.len() as u64));
                for item in items {
                    tail.extend_from_slice(item);
                }
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_words_inline() {
        let out = encode(&[AbiToken::Word(u64_word(1)), AbiToken::Word(u64_word(2))]);
        assert_eq!(out.len(), 64);
        assert_eq!(out[31], 1);
        assert_eq!(out[63], 2);
    }

    #[test]
    fn test_dynamic_array_offsets() {
        // abi.encode(uint256 7, uint256[] [1, 2], uint256[] [3])
        let out = encode(&[
            AbiToken::Word(u64_word(7)),
            AbiToken::Array(vec![u64_word(1), u64_word(2)]),
            AbiToken::Array(vec![u64_word(3)]),
        ]);
        let word = |i: usize| U256::from_big_endian(&out[i * 32..(i + 1) * 32]);
        assert_eq!(out.len(), 32 * (3 + 3 + 2));
        assert_eq!(word(0), U256::from(7));
        assert_eq!(word(1), U256::from(96));
        assert_eq!(word(2), U256::from(192));
        assert_eq!(word(3), U256::from(2));
        assert_eq!(word(4), U256::from(1));
        assert_eq!(word(5), U256::from(2));
        assert_eq!(word(6), U256::from(1));
        assert_eq!(word(7), U256::from(3));
    }

    #[test]
    fn test_alignment() {
        let addr = address_word(&EthAddress([0xff; 20]));
        assert_eq!(&addr[..12], &[0u8; 12]);
        assert_eq!(&addr[12..], &[0xff; 20]);

        let method = bytes32_word("checkpoint");
        assert_eq!(&method[..10], b"checkpoint");
        assert_eq!(&method[10..], &[0u8; 22]);
    }
}
