//! Calldata encoding for the blog contract
//!
//! Only the two calls the client makes are supported, so the encoder is a
//! handful of fixed layouts rather than a general ABI implementation.

use crate::error::FolioError;
use crate::Result;

/// keccak256("createPost(string,string)")[..4]
pub const CREATE_POST_SELECTOR: [u8; 4] = [0x39, 0x23, 0x38, 0xf5];

/// keccak256("tipPost(uint256)")[..4]
pub const TIP_POST_SELECTOR: [u8; 4] = [0x74, 0xd3, 0xc1, 0xf8];

const WORD: usize = 32;
const ETHER_DECIMALS: usize = 18;

fn word_u128(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn push_dynamic_bytes(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&word_u128(data.len() as u128));
    out.extend_from_slice(data);
    out.resize(out.len() + padded_len(data.len()) - data.len(), 0);
}

/// Calldata for `createPost(title, content)`
pub fn encode_create_post(title: &str, content: &str) -> Vec<u8> {
    let title = title.as_bytes();
    let content = content.as_bytes();

    // two head words, then each string as length word + padded bytes
    let title_offset = 2 * WORD;
    let content_offset = title_offset + WORD + padded_len(title.len());

    let mut out = Vec::with_capacity(4 + content_offset + WORD + padded_len(content.len()));
    out.extend_from_slice(&CREATE_POST_SELECTOR);
    out.extend_from_slice(&word_u128(title_offset as u128));
    out.extend_from_slice(&word_u128(content_offset as u128));
    push_dynamic_bytes(&mut out, title);
    push_dynamic_bytes(&mut out, content);
    out
}

/// Calldata for `tipPost(postId)`
pub fn encode_tip_post(post_id: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + WORD);
    out.extend_from_slice(&TIP_POST_SELECTOR);
    out.extend_from_slice(&word_u128(post_id as u128));
    out
}

/// `0x`-prefixed hex data string
pub fn to_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// JSON-RPC quantity: `0x`-prefixed hex without leading zeros
pub fn to_hex_quantity(value: u128) -> String {
    format!("{:#x}", value)
}

/// Parse a decimal ether amount ("0.01") into wei
pub fn parse_ether(amount: &str) -> Result<u128> {
    let amount = amount.trim();
    let invalid = || FolioError::validation(format!("Invalid ETH amount: '{}'", amount));

    let (whole, frac) = match amount.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (amount, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(FolioError::validation(format!(
            "ETH amount has more than {} decimals: '{}'",
            ETHER_DECIMALS, amount
        )));
    }

    let unit = 10u128.pow(ETHER_DECIMALS as u32);
    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u128>()
            .ok()
            .and_then(|w| w.checked_mul(unit))
            .ok_or_else(invalid)?
    };
    let frac_wei = if frac.is_empty() {
        0
    } else {
        let scale = 10u128.pow((ETHER_DECIMALS - frac.len()) as u32);
        frac.parse::<u128>().map_err(|_| invalid())? * scale
    };

    whole_wei.checked_add(frac_wei).ok_or_else(invalid)
}
