//! The decoding engine: a byte stream wrapper, the bit-field extraction
//! loop, and the format-matching decoder that assembles [`Instruction`]s.

// External imports
use anyhow::{bail, Result};

// Internal imports
use crate::format::{Field, FieldKind, InstFormat, FORMATS};
use crate::instruction::{
    AddressExpr, EffectiveAddress, Immediate, Instruction, Operand, Register, SegmentReg,
};
use crate::settings::DecodeSettings;

/// Input buffer capacity. Bytes past this are not decoded.
pub const MAX_STREAM_BYTES: usize = 256 * 1024;

/// The sparse field-kind -> value map produced by one format attempt.
#[derive(Default)]
struct FieldValues {
    values: [u16; FieldKind::COUNT],
    present: u16,
}

impl FieldValues {
    fn set(&mut self, kind: FieldKind, value: u16) {
        self.values[kind as usize] = value;
        self.present |= 1 << kind as usize;
    }

    /// The field's value, or 0 if the format never populated it.
    fn get(&self, kind: FieldKind) -> u16 {
        self.values[kind as usize]
    }

    fn has(&self, kind: FieldKind) -> bool {
        self.present & (1 << kind as usize) != 0
    }

    fn is_empty(&self) -> bool {
        self.present == 0
    }
}

/// A byte stream being decoded one instruction at a time. The buffer is
/// borrowed and immutable; the read cursor is the only mutable state.
pub struct InstStream<'a> {
    bytes: &'a [u8],
    /// Read cursor into `bytes`.
    read_pos: usize,
    /// Start of the instruction currently being matched. Format attempts
    /// rewind here on an opcode mismatch, and it only advances when an
    /// instruction fully decodes.
    inst_start: usize,
}

impl<'a> InstStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let len = bytes.len().min(MAX_STREAM_BYTES);
        InstStream {
            bytes: &bytes[..len],
            read_pos: 0,
            inst_start: 0,
        }
    }

    fn next_byte(&mut self) -> Result<u8> {
        if self.read_pos >= self.bytes.len() {
            bail!(
                "instruction stream ended mid-instruction at byte {}",
                self.read_pos
            );
        }
        let byte = self.bytes[self.read_pos];
        self.read_pos += 1;
        Ok(byte)
    }

    /// Parse a displacement or immediate. Wide values are two bytes,
    /// little endian. Narrow values are one byte, sign-extended to 16
    /// bits.
    fn parse_data(&mut self, wide: bool) -> Result<u16> {
        if wide {
            let lo = self.next_byte()? as u16;
            let hi = self.next_byte()? as u16;
            Ok((hi << 8) | lo)
        } else {
            Ok(self.next_byte()? as i8 as i16 as u16)
        }
    }

    /// Match one format's fields against the stream, left to right.
    ///
    /// Literal fields must equal their expected bits; on a mismatch the
    /// cursor rewinds to the start of the attempt and an empty map is
    /// returned, so the caller can try the next format with no state
    /// leaked. Zero-width fields inject their stored value without
    /// touching the stream.
    fn read_bit_fields(&mut self, fields: &[Field]) -> Result<FieldValues> {
        let mut field_values = FieldValues::default();
        let mut bits_remaining: u8 = 0;
        let mut current_byte: u8 = 0;

        for field in fields {
            let mut value = field.value as u16;
            if field.bits != 0 {
                if bits_remaining == 0 {
                    current_byte = self.next_byte()?;
                    bits_remaining = 8;
                }
                // The table never splits a field across a byte boundary
                debug_assert!(field.bits <= bits_remaining);

                bits_remaining -= field.bits;
                value = (current_byte >> bits_remaining) as u16;
                // Mark the extracted bits as consumed
                current_byte &= ((1u16 << bits_remaining) - 1) as u8;

                if field.kind == FieldKind::Literal && value != field.value as u16 {
                    // Not this format. Rewind the whole attempt.
                    self.read_pos = self.inst_start;
                    return Ok(FieldValues::default());
                }
            }
            field_values.set(field.kind, value);
        }
        Ok(field_values)
    }

    /// Attempt to decode the instruction at the cursor as `format`.
    /// Returns `None`, with the cursor unmoved, if the opcode bits do
    /// not match.
    fn try_decode(&mut self, format: &InstFormat) -> Result<Option<Instruction>> {
        let mut fields = self.read_bit_fields(format.fields)?;
        if fields.is_empty() {
            return Ok(None);
        }

        let mod_val = fields.get(FieldKind::Mod) as u8;
        let dir = fields.get(FieldKind::Direction) != 0;
        let w = fields.get(FieldKind::Width) != 0;
        let sign_extend = fields.get(FieldKind::SignExtend) != 0;
        let reg_val = fields.get(FieldKind::Reg) as u8;
        let rm_val = fields.get(FieldKind::RegMem) as u8;

        // mod=00 rm=110 means a 16-bit absolute address follows, not [bp]
        let direct_address = mod_val == 0b00 && rm_val == 0b110;
        let has_disp = mod_val == 0b01
            || mod_val == 0b10
            || direct_address
            || fields.get(FieldKind::HasDisp) != 0;
        let disp_is_w = mod_val == 0b10 || direct_address;
        let has_data = fields.get(FieldKind::HasData) != 0;
        let data_is_w = fields.get(FieldKind::WideDataIfW) != 0 && w && !sign_extend;

        // Displacement bytes come before data bytes
        if has_disp {
            let disp = self.parse_data(disp_is_w)?;
            fields.set(FieldKind::Disp, disp);
        }
        if has_data {
            let data = self.parse_data(data_is_w)?;
            fields.set(FieldKind::Data, data);
        }

        let disp = fields.get(FieldKind::Disp) as i16;
        let rm_wide = w || fields.get(FieldKind::RegMemWide) != 0;

        // The direction bit picks which slot holds the reg-like operand
        let mut operands = [Operand::None; 2];
        let (reg_slot, mod_slot) = if dir { (0, 1) } else { (1, 0) };

        if fields.has(FieldKind::SegReg) {
            operands[reg_slot] =
                Operand::SegmentReg(SegmentReg::from_bits(fields.get(FieldKind::SegReg) as u8));
        } else if fields.has(FieldKind::Reg) {
            operands[reg_slot] = Operand::Register(Register::new(reg_val, w));
        }

        if fields.has(FieldKind::RegMem) {
            operands[mod_slot] = if mod_val == 0b11 {
                Operand::Register(Register::new(rm_val, rm_wide))
            } else {
                let expr = if direct_address {
                    AddressExpr::Direct
                } else {
                    AddressExpr::from_rm(rm_val)
                };
                Operand::Memory(EffectiveAddress { expr, disp })
            };
        }

        // Any parsed or injected immediate fills the first empty slot.
        // If both slots are taken it is dropped; no format in the table
        // pairs reg+rm with trailing data.
        if let Some(slot) = operands.iter().position(|op| op.is_none()) {
            if fields.has(FieldKind::Data) {
                operands[slot] = Operand::Immediate(Immediate {
                    value: fields.get(FieldKind::Data),
                    wide: data_is_w,
                });
            }
        }

        Ok(Some(Instruction {
            op: format.op,
            operands,
            wide: rm_wide,
        }))
    }

    /// Decode the next instruction, trying every table format in order.
    ///
    /// Returns `Ok(None)` at a clean end of stream. An unmatched opcode
    /// or a truncated trailing displacement/immediate is an error, and
    /// the cursor stays at the last fully decoded instruction.
    pub fn next_instruction(&mut self) -> Result<Option<Instruction>> {
        if self.read_pos >= self.bytes.len() {
            return Ok(None);
        }
        for format in FORMATS {
            if let Some(inst) = self.try_decode(format)? {
                self.inst_start = self.read_pos;
                return Ok(Some(inst));
            }
        }
        bail!(
            "no instruction format matches byte 0x{:02X} at offset {}",
            self.bytes[self.read_pos],
            self.read_pos
        );
    }

    /// Offset just past the last fully decoded instruction.
    pub fn position(&self) -> usize {
        self.inst_start
    }
}

/// Decode an entire byte buffer into instructions.
pub fn decode(bytes: &[u8], settings: &DecodeSettings) -> Result<Vec<Instruction>> {
    let mut stream = InstStream::new(bytes);
    let mut insts = vec![];
    while let Some(inst) = stream.next_instruction()? {
        if settings.verbose {
            println!("; decoded `{}`, now at offset {}", inst, stream.position());
        }
        insts.push(inst);
    }
    Ok(insts)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A non-matching format attempt must leave the cursor untouched.
    #[test]
    fn mismatch_rewinds_cursor() {
        let bytes = [0x89, 0xD8];
        let mut stream = InstStream::new(&bytes);
        // An immediate-to-rm mov (0b1100011...) cannot match 0x89
        let inst = stream.try_decode(&FORMATS[1]).unwrap();
        assert!(inst.is_none());
        assert_eq!(stream.read_pos, 0);
        // The stream still decodes normally afterwards
        let inst = stream.next_instruction().unwrap().unwrap();
        assert_eq!(inst.op, crate::instruction::Op::Mov);
        assert_eq!(stream.read_pos, 2);
    }

    #[test]
    fn stream_capped_at_max_bytes() {
        let bytes = vec![0x90u8; MAX_STREAM_BYTES + 16];
        let stream = InstStream::new(&bytes);
        assert_eq!(stream.bytes.len(), MAX_STREAM_BYTES);
    }
}
