//! LZ-based text compression with a base64 alphabet
//!
//! The power segments of a build code use the dictionary compressor that
//! shared links were produced with. Input is processed as UTF-16 code units,
//! values are packed LSB-first into 6-bit characters, and the output is
//! padded with `=` to a multiple of four.

use std::collections::{HashMap, HashSet};

const KEY: &[u8; 65] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

const BITS_PER_CHAR: u32 = 6;

/// End-of-stream marker in the compressed value stream
const END_OF_STREAM: u32 = 2;

/// Packs values into output characters
#[derive(Default)]
struct BitWriter {
    out: String,
    val: u32,
    pos: u32,
}

impl BitWriter {
    fn bit(&mut self, bit: u32) {
        self.val = (self.val << 1) | bit;
        if self.pos == BITS_PER_CHAR - 1 {
            self.pos = 0;
            self.out.push(KEY[self.val as usize] as char);
            self.val = 0;
        } else {
            self.pos += 1;
        }
    }

    /// Write `n` bits of `value`, least significant first
    fn value(&mut self, mut value: u32, n: u32) {
        for _ in 0..n {
            self.bit(value & 1);
            value >>= 1;
        }
    }

    /// Flush the last partial character and pad
    fn finish(mut self) -> String {
        loop {
            self.val <<= 1;
            if self.pos == BITS_PER_CHAR - 1 {
                self.out.push(KEY[self.val as usize] as char);
                break;
            }
            self.pos += 1;
        }
        let pad = match self.out.len() % 4 {
            1 => "===",
            2 => "==",
            3 => "=",
            _ => "",
        };
        self.out.push_str(pad);
        self.out
    }
}

struct Compressor {
    dictionary: HashMap<Vec<u16>, u32>,
    pending: HashSet<Vec<u16>>,
    enlarge_in: u32,
    dict_size: u32,
    num_bits: u32,
    writer: BitWriter,
}

impl Compressor {
    fn new() -> Self {
        Self {
            dictionary: HashMap::new(),
            pending: HashSet::new(),
            enlarge_in: 2,
            dict_size: 3,
            num_bits: 2,
            writer: BitWriter::default(),
        }
    }

    fn shrink_window(&mut self) {
        self.enlarge_in -= 1;
        if self.enlarge_in == 0 {
            self.enlarge_in = 1 << self.num_bits;
            self.num_bits += 1;
        }
    }

    /// Emit the phrase `w`, introducing its first unit if not yet sent
    fn emit(&mut self, w: &[u16]) {
        if self.pending.remove(w) {
            let first = u32::from(w[0]);
            if first < 256 {
                self.writer.value(0, self.num_bits);
                self.writer.value(first, 8);
            } else {
                self.writer.value(1, self.num_bits);
                self.writer.value(first, 16);
            }
            self.shrink_window();
        } else {
            let code = self.dictionary.get(w).copied().unwrap_or_default();
            self.writer.value(code, self.num_bits);
        }
        self.shrink_window();
    }
}

/// Compress a string to the base64 form used in build codes
pub fn compress_to_base64(input: &str) -> String {
    let mut state = Compressor::new();
    let mut w: Vec<u16> = Vec::new();

    for unit in input.encode_utf16() {
        let single = vec![unit];
        if !state.dictionary.contains_key(&single) {
            state.dictionary.insert(single.clone(), state.dict_size);
            state.dict_size += 1;
            state.pending.insert(single);
        }

        let mut wc = w.clone();
        wc.push(unit);
        if state.dictionary.contains_key(&wc) {
            w = wc;
        } else {
            state.emit(&w);
            state.dictionary.insert(wc, state.dict_size);
            state.dict_size += 1;
            w = vec![unit];
        }
    }

    if !w.is_empty() {
        state.emit(&w);
    }
    state.writer.value(END_OF_STREAM, state.num_bits);
    state.writer.finish()
}

/// Reads values back out of base64 characters
struct BitReader<'a> {
    values: &'a [u32],
    val: u32,
    pos: u32,
    index: usize,
}

impl BitReader<'_> {
    fn bits(&mut self, n: u32) -> u32 {
        let mut bits = 0;
        let mut power = 1u32;
        for _ in 0..n {
            let set = self.val & self.pos;
            self.pos >>= 1;
            if self.pos == 0 {
                self.pos = 1 << (BITS_PER_CHAR - 1);
                self.val = self.values.get(self.index).copied().unwrap_or(0);
                self.index += 1;
            }
            if set != 0 {
                bits |= power;
            }
            power = power.wrapping_shl(1);
        }
        bits
    }
}

fn widen(num_bits: &mut u32, enlarge_in: &mut u32) -> Option<()> {
    if *enlarge_in == 0 {
        *enlarge_in = 1u32.checked_shl(*num_bits)?;
        *num_bits += 1;
    }
    Some(())
}

/// Decompress a base64 power segment.
///
/// Returns `None` for empty or corrupt input.
pub fn decompress_from_base64(input: &str) -> Option<String> {
    let values: Vec<u32> = input
        .bytes()
        .map(|b| KEY.iter().position(|&k| k == b).map(|p| p as u32))
        .collect::<Option<_>>()?;
    let first = *values.first()?;

    let mut reader = BitReader {
        values: &values,
        val: first,
        pos: 1 << (BITS_PER_CHAR - 1),
        index: 1,
    };

    // Codes 0..=2 are control values and never index the dictionary
    let mut dictionary: Vec<Vec<u16>> = vec![Vec::new(), Vec::new(), Vec::new()];
    let mut enlarge_in = 4u32;
    let mut num_bits = 3u32;

    let first_unit = match reader.bits(2) {
        0 => reader.bits(8) as u16,
        1 => reader.bits(16) as u16,
        _ => return Some(String::new()),
    };
    dictionary.push(vec![first_unit]);
    let mut w = vec![first_unit];
    let mut result = w.clone();

    loop {
        if reader.index > values.len() {
            return Some(String::new());
        }

        let mut code = reader.bits(num_bits) as usize;
        match code {
            0 | 1 => {
                let width = if code == 0 { 8 } else { 16 };
                dictionary.push(vec![reader.bits(width) as u16]);
                code = dictionary.len() - 1;
                enlarge_in -= 1;
            }
            2 => return String::from_utf16(&result).ok(),
            _ => {}
        }
        widen(&mut num_bits, &mut enlarge_in)?;

        let entry = if code < dictionary.len() {
            dictionary[code].clone()
        } else if code == dictionary.len() {
            let mut e = w.clone();
            e.push(*w.first()?);
            e
        } else {
            return None;
        };

        result.extend_from_slice(&entry);
        let mut phrase = w;
        phrase.push(*entry.first()?);
        dictionary.push(phrase);
        enlarge_in -= 1;
        w = entry;
        widen(&mut num_bits, &mut enlarge_in)?;
    }
}
