//! Vector file reader.
//!
//! Parses rendered text back into an unshared [`VectorProgram`]. Every `DAT`
//! line is recombined on its own, so the share count must match the one the
//! file was written with.

use super::{Instruction, Opcode, ProtocolError, VectorProgram, DAT_PREFIX, INS_PREFIX, WORD_SIZE};
use crate::shares::{combine, ShareCount};

struct OpenBlock {
    line: usize,
    opcode: Opcode,
    declared: usize,
    payload: Vec<u8>,
}

impl OpenBlock {
    fn close(self) -> Result<Instruction, ProtocolError> {
        if self.payload.len() != self.declared {
            return Err(ProtocolError::PayloadLengthMismatch {
                line: self.line,
                declared: self.declared,
                actual: self.payload.len(),
            });
        }
        let instruction = Instruction {
            opcode: self.opcode,
            payload: self.payload,
        };
        instruction.validate()?;
        Ok(instruction)
    }
}

/// Parse a vector file written with `count` shares per word.
///
/// `#` lines are skipped. A blank line, a new `INS` header or the end of the
/// text closes the open instruction.
pub fn parse_vector_file(text: &str, count: ShareCount) -> Result<VectorProgram, ProtocolError> {
    let mut program = VectorProgram::new();
    let mut open: Option<OpenBlock> = None;
    let dat_len = WORD_SIZE * count.get();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end();

        if line.starts_with('#') {
            continue;
        }

        if line.is_empty() {
            if let Some(block) = open.take() {
                program.push(block.close()?);
            }
            continue;
        }

        if let Some(header) = line.strip_prefix(INS_PREFIX) {
            if let Some(block) = open.take() {
                program.push(block.close()?);
            }
            let (opcode, declared) = parse_header(header, line_no)?;
            open = Some(OpenBlock {
                line: line_no,
                opcode,
                declared,
                payload: Vec::with_capacity(declared),
            });
            continue;
        }

        if let Some(data) = line.strip_prefix(DAT_PREFIX) {
            let block = open
                .as_mut()
                .ok_or(ProtocolError::DataOutsideInstruction { line: line_no })?;
            let shares =
                hex::decode(data.trim()).map_err(|_| ProtocolError::MalformedData { line: line_no })?;
            if shares.len() != dat_len {
                return Err(ProtocolError::MalformedData { line: line_no });
            }
            let word = combine(&shares, count)?;
            block.payload.extend_from_slice(&word);
            continue;
        }

        return Err(ProtocolError::UnrecognizedLine { line: line_no });
    }

    if let Some(block) = open.take() {
        program.push(block.close()?);
    }
    Ok(program)
}

fn parse_header(header: &str, line: usize) -> Result<(Opcode, usize), ProtocolError> {
    let header = header.trim();
    if header.len() != 8 || !header.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ProtocolError::MalformedHeader { line });
    }
    let byte =
        u8::from_str_radix(&header[..2], 16).map_err(|_| ProtocolError::MalformedHeader { line })?;
    let declared = usize::from_str_radix(&header[2..], 16)
        .map_err(|_| ProtocolError::MalformedHeader { line })?;
    let opcode = Opcode::from_byte(byte).ok_or(ProtocolError::UnknownOpcode { line, opcode: byte })?;
    Ok((opcode, declared))
}
