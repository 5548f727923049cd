// Internal imports
use crate::decode::{decode, InstStream};
use crate::instruction::{AddressExpr, Immediate, Instruction, Op, Operand};
use crate::settings::DecodeSettings;

/// Decode a stream and compare the rendered text of each instruction.
fn check_decode(inst_stream: &[u8], expected_insts: &[&str]) {
    let decode_settings = DecodeSettings {
        verbose: true,
        ..Default::default()
    };
    let insts = decode(inst_stream, &decode_settings).unwrap();
    assert_eq!(insts.len(), expected_insts.len(), "instruction count");
    for (inst_num, (inst, expected_inst)) in std::iter::zip(&insts, expected_insts).enumerate() {
        let actual_inst = inst.to_string();
        println!("-------------------------Inst {inst_num}-------------------------------");
        println!("Expected inst: {}", expected_inst);
        println!("Actual   inst: {}", actual_inst);
        if actual_inst != *expected_inst {
            println!("{:#?}", inst);
        }
        assert_eq!(actual_inst, *expected_inst);
    }
}

/// Decode a stream and compare instructions structurally.
fn check_decode_insts(inst_stream: &[u8], expected_insts: &[Instruction]) {
    let insts = decode(inst_stream, &DecodeSettings::default()).unwrap();
    assert_eq!(insts.len(), expected_insts.len(), "instruction count");
    for (inst_num, (inst, expected_inst)) in std::iter::zip(&insts, expected_insts).enumerate() {
        assert_eq!(inst, expected_inst, "instruction mismatch at index {inst_num}");
    }
}

#[test]
fn test_mov_rm_to_reg() {
    // Assembled from reg-to-reg, no-displacement, displaced, and
    // direct-address movs
    let inst_stream = [
        0x89, 0xd8, 0x89, 0xeb, 0x89, 0xfe, 0x88, 0xe3, //
        0x88, 0xc4, 0x88, 0xd1, 0x8b, 0x00, 0x8b, 0x19, //
        0x89, 0x0a, 0x89, 0x13, 0x89, 0x3d, 0x8b, 0x40, //
        0x64, 0x89, 0x59, 0xf6, 0x8b, 0x99, 0x80, 0x3e, //
        0x89, 0x87, 0x0a, 0xb6, 0x89, 0x2e, 0xb7, 0x34, //
        0x8b, 0x2e, 0x27, 0x00,
    ];
    let expected_insts = [
        // reg to reg
        Instruction::new(Op::Mov, Operand::reg(0, true), Operand::reg(3, true)),
        Instruction::new(Op::Mov, Operand::reg(3, true), Operand::reg(5, true)),
        Instruction::new(Op::Mov, Operand::reg(6, true), Operand::reg(7, true)),
        Instruction::new(Op::Mov, Operand::reg(3, false), Operand::reg(4, false)),
        Instruction::new(Op::Mov, Operand::reg(4, false), Operand::reg(0, false)),
        Instruction::new(Op::Mov, Operand::reg(1, false), Operand::reg(2, false)),
        // address without displacement to/from reg
        Instruction::new(Op::Mov, Operand::reg(0, true), Operand::mem(AddressExpr::BxSi, 0)),
        Instruction::new(Op::Mov, Operand::reg(3, true), Operand::mem(AddressExpr::BxDi, 0)),
        Instruction::new(Op::Mov, Operand::mem(AddressExpr::BpSi, 0), Operand::reg(1, true)),
        Instruction::new(Op::Mov, Operand::mem(AddressExpr::BpDi, 0), Operand::reg(2, true)),
        Instruction::new(Op::Mov, Operand::mem(AddressExpr::Di, 0), Operand::reg(7, true)),
        // address with displacement to/from reg
        Instruction::new(Op::Mov, Operand::reg(0, true), Operand::mem(AddressExpr::BxSi, 100)),
        Instruction::new(Op::Mov, Operand::mem(AddressExpr::BxDi, -10), Operand::reg(3, true)),
        Instruction::new(Op::Mov, Operand::reg(3, true), Operand::mem(AddressExpr::BxDi, 16000)),
        Instruction::new(Op::Mov, Operand::mem(AddressExpr::Bx, -18934), Operand::reg(0, true)),
        // direct address
        Instruction::new(Op::Mov, Operand::mem(AddressExpr::Direct, 13495), Operand::reg(5, true)),
        Instruction::new(Op::Mov, Operand::reg(5, true), Operand::mem(AddressExpr::Direct, 39)),
    ];
    check_decode_insts(&inst_stream, &expected_insts);

    let expected_text = [
        "mov ax, bx",
        "mov bx, bp",
        "mov si, di",
        "mov bl, ah",
        "mov ah, al",
        "mov cl, dl",
        "mov ax, [bx + si]",
        "mov bx, [bx + di]",
        "mov [bp + si], cx",
        "mov [bp + di], dx",
        "mov [di], di",
        "mov ax, [bx + si + 100]",
        "mov [bx + di - 10], bx",
        "mov bx, [bx + di + 16000]",
        "mov [bx - 18934], ax",
        "mov [13495], bp",
        "mov bp, [39]",
    ];
    check_decode(&inst_stream, &expected_text);
}

#[test]
fn test_mov_immediate() {
    let inst_stream = [
        0xb1, 0x0c, // mov cl, 12
        0xb9, 0x0c, 0x00, // mov cx, 12
        0xc6, 0x03, 0x07, // mov [bp + di], byte 7
        0xc7, 0x85, 0xe5, 0x19, 0x5c, 0x0c, // mov [di + 6629], word 3164
    ];
    let expected_insts = [
        "mov cl, byte 12",
        "mov cx, word 12",
        "mov [bp + di], byte 7",
        "mov [di + 6629], word 3164",
    ];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_mov_accumulator() {
    // Accumulator moves carry an implied direct address
    let inst_stream = [
        0xa1, 0xfb, 0x09, // mov ax, [2555]
        0xa3, 0x0f, 0x00, // mov [15], ax
        0xa0, 0x7b, 0x00, // mov al, [123]
    ];
    let expected_insts = ["mov ax, [2555]", "mov [15], ax", "mov al, [123]"];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_mov_segment_reg() {
    let inst_stream = [0x8e, 0xd8, 0x8c, 0xc0];
    let expected_insts = ["mov ds, ax", "mov ax, es"];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_arithmetic() {
    let inst_stream = [
        0x01, 0xd9, // add cx, bx
        0x83, 0xc1, 0x05, // add cx, 5 (sign-extended immediate)
        0x81, 0xc1, 0x39, 0x30, // add cx, 12345
        0x04, 0x09, // add al, 9
        0x05, 0xe8, 0x03, // add ax, 1000
        0x29, 0xd9, // sub cx, bx
        0x83, 0xef, 0x0a, // sub di, 10
        0x3b, 0x4e, 0x02, // cmp cx, [bp + 2]
        0x85, 0xdb, // test bx, bx
        0xa8, 0x01, // test al, 1
    ];
    let expected_insts = [
        "add cx, bx",
        "add cx, byte 5",
        "add cx, word 12345",
        "add al, byte 9",
        "add ax, word 1000",
        "sub cx, bx",
        "sub di, byte 10",
        "cmp cx, [bp + 2]",
        "test bx, bx",
        "test al, byte 1",
    ];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_stack_ops() {
    let inst_stream = [
        0x50, // push ax
        0x5b, // pop bx
        0xff, 0x36, 0x10, 0x00, // push word [16]
        0xff, 0x71, 0x04, // push word [bx + di + 4]
        0x8f, 0x06, 0x20, 0x00, // pop word [32]
        0x1e, // push ds
        0x07, // pop es
    ];
    let expected_insts = [
        "push ax",
        "pop bx",
        "push word [16]",
        "push word [bx + di + 4]",
        "pop word [32]",
        "push ds",
        "pop es",
    ];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_xchg() {
    let inst_stream = [0x87, 0xca, 0x91, 0x93];
    let expected_insts = ["xchg dx, cx", "xchg ax, cx", "xchg ax, bx"];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_in_out() {
    let inst_stream = [
        0xe4, 0x14, // in al, 20
        0xe5, 0x14, // in ax, 20
        0xec, // in al, dx
        0xee, // out dx, al
        0xe6, 0x2c, // out 44, al
    ];
    let expected_insts = [
        "in al, byte 20",
        "in ax, byte 20",
        "in al, dx",
        "out dx, al",
        "out byte 44, al",
    ];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_unary_group() {
    let inst_stream = [
        0x40, // inc ax
        0x4b, // dec bx
        0xfe, 0x06, 0x10, 0x00, // inc byte [16]
        0xf7, 0xdb, // neg bx
        0xf6, 0x26, 0x05, 0x00, // mul byte [5]
        0xf7, 0x66, 0x02, // mul word [bp + 2]
    ];
    let expected_insts = [
        "inc ax",
        "dec bx",
        "inc byte [16]",
        "neg bx",
        "mul byte [5]",
        "mul word [bp + 2]",
    ];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_shifts() {
    // Shift/rotate counts of 1 are implicit in the encoding; the
    // decoder injects them as a byte immediate
    let inst_stream = [
        0xd1, 0xe0, // shl ax, 1
        0xd1, 0x27, // shl word [bx], 1
        0xd0, 0x2e, 0x0a, 0x00, // shr byte [10], 1
    ];
    let expected_insts = [
        "shl ax, byte 1",
        "shl word [bx], byte 1",
        "shr byte [10], byte 1",
    ];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_misc_ops() {
    let inst_stream = [
        0x8d, 0x81, 0x8c, 0x05, // lea ax, [bx + di + 1420]
        0xd7, // xlat
        0x9f, // lahf
        0x9e, // sahf
        0x9c, // pushf
        0x9d, // popf
    ];
    let expected_insts = [
        "lea ax, [bx + di + 1420]",
        "xlat",
        "lahf",
        "sahf",
        "pushf",
        "popf",
    ];
    check_decode(&inst_stream, &expected_insts);
}

#[test]
fn test_direction_bit_symmetry() {
    // Both encodings of `mov ax, bx`: d=0 with reg=bx/rm=ax, and d=1
    // with reg=ax/rm=bx
    let d0 = decode(&[0x89, 0xd8], &DecodeSettings::default()).unwrap();
    let d1 = decode(&[0x8b, 0xc3], &DecodeSettings::default()).unwrap();
    assert_eq!(d0, d1);
    assert_eq!(d0[0].to_string(), "mov ax, bx");
}

#[test]
fn test_displacement_width_policy() {
    // mod=01: 1-byte displacement, sign-extended
    let insts = decode(&[0x8b, 0x40, 0xf6], &DecodeSettings::default()).unwrap();
    assert_eq!(insts[0].operands[1], Operand::mem(AddressExpr::BxSi, -10));
    // mod=10: 2-byte displacement
    let insts = decode(&[0x8b, 0x80, 0x00, 0x01], &DecodeSettings::default()).unwrap();
    assert_eq!(insts[0].operands[1], Operand::mem(AddressExpr::BxSi, 256));
    // mod=00 rm=110: direct address, 2-byte displacement, no expression
    let insts = decode(&[0x8b, 0x2e, 0x27, 0x00], &DecodeSettings::default()).unwrap();
    assert_eq!(insts[0].operands[1], Operand::mem(AddressExpr::Direct, 39));
    // mod=11: never a memory operand
    let insts = decode(&[0x8b, 0xc3], &DecodeSettings::default()).unwrap();
    assert_eq!(insts[0].operands[1], Operand::reg(3, true));
}

#[test]
fn test_immediate_equality() {
    // Byte immediates compare under truncation to the low byte
    let narrow_ff = Immediate {
        value: 0x00ff,
        wide: false,
    };
    let narrow_ffff = Immediate {
        value: 0xffff,
        wide: false,
    };
    assert_eq!(narrow_ff, narrow_ffff);

    // Word immediates compare all 16 bits
    let wide_ff = Immediate {
        value: 0x00ff,
        wide: true,
    };
    let wide_ffff = Immediate {
        value: 0xffff,
        wide: true,
    };
    assert_ne!(wide_ff, wide_ffff);

    // Differing widths never compare equal
    assert_ne!(narrow_ff, wide_ff);
}

#[test]
fn test_end_of_stream() {
    let mut stream = InstStream::new(&[]);
    assert!(stream.next_instruction().unwrap().is_none());

    // A clean end right after a full instruction is not an error
    let insts = decode(&[0x89, 0xd8], &DecodeSettings::default()).unwrap();
    assert_eq!(insts.len(), 1);
}

#[test]
fn test_unmatched_opcode_halts() {
    // 0xf4 (hlt) is not in the format table
    let bytes = [0x89, 0xd8, 0xf4];
    let mut stream = InstStream::new(&bytes);
    let inst = stream.next_instruction().unwrap().unwrap();
    assert_eq!(inst.to_string(), "mov ax, bx");
    assert_eq!(stream.position(), 2);

    // The failure is reported and the cursor does not advance past the
    // last good instruction
    assert!(stream.next_instruction().is_err());
    assert_eq!(stream.position(), 2);
}

#[test]
fn test_truncated_instruction_fails_loudly() {
    // mod=10 promises a 2-byte displacement but only 1 byte remains
    let mut stream = InstStream::new(&[0x8b, 0x86, 0x10]);
    assert!(stream.next_instruction().is_err());
}
