use std::fs;

use crate::error::EmulatorError;
use crate::memory::Memory;

const RECORD_DATA: u8 = 0x00;
const RECORD_EOF: u8 = 0x01;

/// Reads an Intel HEX program file from disk, wrapping the I/O error in the
/// engine's own error type so callers can decide whether to fall back to the
/// built-in demo program rather than matching on `std::io::Error` directly.
pub fn read_program_file(path: &str) -> Result<String, EmulatorError> {
    fs::read_to_string(path).map_err(|source| EmulatorError::FileOpenFailure {
        path: path.to_string(),
        source,
    })
}

/// Parses an Intel HEX image and writes its data records into flash,
/// starting at the target's entry address. Each 16-bit word is stored
/// byte-swapped relative to file order, matching the reference loader.
pub fn load(source: &str, memory: &mut Memory) -> Result<(), EmulatorError> {
    let entry = memory.target().entry_address();
    let mut cursor = entry;

    for (line_number, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !line.starts_with(':') {
            return Err(EmulatorError::MalformedHexRecord {
                line: line_number + 1,
                reason: "record does not start with ':'".to_string(),
            });
        }

        let bytes = decode_hex_bytes(&line[1..], line_number + 1)?;
        if bytes.len() < 5 {
            return Err(EmulatorError::MalformedHexRecord {
                line: line_number + 1,
                reason: "record shorter than header".to_string(),
            });
        }

        let byte_count = bytes[0] as usize;
        let record_type = bytes[3];
        let data = &bytes[4..4 + byte_count];

        match record_type {
            RECORD_DATA => {
                // Byte-swap each word: data[0],data[1] -> data[1],data[0].
                let mut i = 0;
                while i < data.len() {
                    if i + 1 < data.len() {
                        memory.raw_set(cursor, data[i + 1]);
                        memory.raw_set(cursor + 1, data[i]);
                        cursor = cursor.wrapping_add(2);
                        i += 2;
                    } else {
                        memory.raw_set(cursor, data[i]);
                        cursor = cursor.wrapping_add(1);
                        i += 1;
                    }
                }
            }
            RECORD_EOF => break,
            other => {
                return Err(EmulatorError::MalformedHexRecord {
                    line: line_number + 1,
                    reason: format!("unsupported record type {:#04x}", other),
                });
            }
        }
    }

    Ok(())
}

fn decode_hex_bytes(hex: &str, line_number: usize) -> Result<Vec<u8>, EmulatorError> {
    let hex = hex.trim_end();
    if hex.len() % 2 != 0 {
        return Err(EmulatorError::MalformedHexRecord {
            line: line_number,
            reason: "odd number of hex digits".to_string(),
        });
    }
    let mut out = Vec::with_capacity(hex.len() / 2);
    let digits: Vec<char> = hex.chars().collect();
    for pair in digits.chunks(2) {
        let byte_str: String = pair.iter().collect();
        let byte = u8::from_str_radix(&byte_str, 16).map_err(|_| EmulatorError::MalformedHexRecord {
            line: line_number,
            reason: format!("invalid hex digits {:?}", byte_str),
        })?;
        out.push(byte);
    }
    Ok(out)
}

/// The built-in fallback program used when no HEX file is given or it can't
/// be opened: toggles DDRB/PORTB on an ATmega32U4, then halts. Transcribed
/// directly from the reference implementation's demo image (already in its
/// in-memory, byte-swapped representation, so this pokes `Memory` directly
/// rather than going through `load`).
pub fn load_demo_program(memory: &mut Memory) {
    const DEMO: &[(u16, u8)] = &[
        (0xB00, 0x94), (0xB01, 0x0C), (0xB02, 0x00), (0xB03, 0x56),
        (0xBAC, 0x24), (0xBAD, 0x11),
        (0xBAE, 0xBE), (0xBAF, 0x1F),
        (0xBB0, 0xEF), (0xBB1, 0xCF), (0xBB2, 0xE0), (0xBB3, 0xDA),
        (0xBB4, 0xBF), (0xBB5, 0xDE), (0xBB6, 0xBF), (0xBB7, 0xCD),
        (0xBB8, 0x94), (0xBB9, 0x0E), (0xBBA, 0x00), (0xBBB, 0x62),
        (0xBC4, 0x93), (0xBC5, 0xCF), (0xBC6, 0x93), (0xBC7, 0xDF),
        (0xBC8, 0xB7), (0xBC9, 0xCD), (0xBCA, 0xB7), (0xBCB, 0xDE),
        (0xBCC, 0xE2), (0xBCD, 0x84), (0xBCE, 0xE0), (0xBCF, 0x90), (0xBD0, 0xE0), (0xBD1, 0x28),
        (0xBD2, 0x01), (0xBD3, 0xFC),
        (0xBD4, 0x83), (0xBD5, 0x20),
        (0xBD6, 0xE2), (0xBD7, 0x85),
        (0xBD8, 0xE0), (0xBD9, 0x90),
        (0xBDA, 0xE0), (0xBDB, 0x21),
        (0xBDC, 0x01), (0xBDD, 0xFC),
        (0xBDE, 0x83), (0xBDF, 0x20),
        (0xBE0, 0x95), (0xBE1, 0x98),
    ];
    for (addr, byte) in DEMO {
        memory.raw_set(*addr, *byte);
    }
}
