use crate::gpu::planar::VgaMemory;

/// graphics controller and sequencer state used by most tests:
/// write mode 0, all planes enabled, bit mask FF
fn reset_pipeline() -> VgaMemory {
    let mut vga = VgaMemory::default();
    vga.out_u8(0x3CE, 0x05);
    vga.out_u8(0x3CF, 0x00);
    vga.out_u8(0x3C4, 0x02);
    vga.out_u8(0x3C5, 0x0F);
    vga
}

#[test]
fn write_mode_0_defaults_are_identity() {
    let mut vga = reset_pipeline();
    vga.write_aperture(0x0123, 0x5A);
    for plane in 0..4 {
        assert_eq!(0x5A, vga.plane_u8(plane, 0x0123));
    }
}

#[test]
fn plane_write_enable_selects_planes() {
    let mut vga = reset_pipeline();
    vga.out_u8(0x3C4, 0x02);
    vga.out_u8(0x3C5, 0b0000_0101); // planes 0 and 2
    vga.write_aperture(0, 0xFF);
    assert_eq!(0xFF, vga.plane_u8(0, 0));
    assert_eq!(0x00, vga.plane_u8(1, 0));
    assert_eq!(0xFF, vga.plane_u8(2, 0));
    assert_eq!(0x00, vga.plane_u8(3, 0));
}

#[test]
fn set_reset_replaces_enabled_planes() {
    let mut vga = reset_pipeline();
    vga.out_u8(0x3CE, 0x00);
    vga.out_u8(0x3CF, 0x0F); // set/reset value: all ones
    vga.out_u8(0x3CE, 0x01);
    vga.out_u8(0x3CF, 0x0F); // set/reset enabled on all planes
    vga.write_aperture(0x10, 0x00); // the cpu byte is ignored
    for plane in 0..4 {
        assert_eq!(0xFF, vga.plane_u8(plane, 0x10));
    }
}

#[test]
fn rotate_count_rotates_the_cpu_byte() {
    let mut vga = reset_pipeline();
    vga.out_u8(0x3CE, 0x03);
    vga.out_u8(0x3CF, 0x01); // rotate right by 1
    vga.write_aperture(0, 0b0000_0001);
    assert_eq!(0b1000_0000, vga.plane_u8(0, 0));
}

#[test]
fn bit_mask_muxes_against_latch() {
    let mut vga = reset_pipeline();
    vga.write_aperture(0, 0b1111_0000);
    vga.read_aperture(0); // fill the latch

    vga.out_u8(0x3CE, 0x08);
    vga.out_u8(0x3CF, 0b0000_1111); // cpu supplies only the low nibble
    vga.write_aperture(0, 0b0000_1010);
    assert_eq!(0b1111_1010, vga.plane_u8(0, 0));
}

#[test]
fn logic_op_combines_with_latch() {
    let mut vga = reset_pipeline();
    vga.write_aperture(0, 0b1100_1100);
    vga.read_aperture(0);

    vga.out_u8(0x3CE, 0x03);
    vga.out_u8(0x3CF, 0x18); // logic op 3 = xor, rotate 0
    vga.write_aperture(0, 0b1010_1010);
    assert_eq!(0b0110_0110, vga.plane_u8(0, 0));
}

#[test]
fn write_mode_1_copies_the_latch() {
    let mut vga = reset_pipeline();
    // fill planes with distinct values and latch them
    vga.out_u8(0x3C4, 0x02);
    for plane in 0..4u8 {
        vga.out_u8(0x3C5, 1 << plane);
        vga.write_aperture(0, 0x10 + plane);
    }
    vga.out_u8(0x3C5, 0x0F);
    vga.read_aperture(0);

    vga.out_u8(0x3CE, 0x05);
    vga.out_u8(0x3CF, 0x01); // write mode 1
    vga.write_aperture(0x40, 0xEE); // the cpu byte is ignored
    for plane in 0..4 {
        assert_eq!(0x10 + plane as u8, vga.plane_u8(plane, 0x40));
    }
}

#[test]
fn write_mode_2_expands_the_low_nibble() {
    let mut vga = reset_pipeline();
    vga.out_u8(0x3CE, 0x05);
    vga.out_u8(0x3CF, 0x02); // write mode 2
    vga.write_aperture(0, 0b0000_0110); // planes 1 and 2
    assert_eq!(0x00, vga.plane_u8(0, 0));
    assert_eq!(0xFF, vga.plane_u8(1, 0));
    assert_eq!(0xFF, vga.plane_u8(2, 0));
    assert_eq!(0x00, vga.plane_u8(3, 0));
}

#[test]
fn write_mode_3_selects_planes_from_the_low_nibble() {
    let mut vga = reset_pipeline();
    vga.write_aperture(0, 0x33);
    vga.read_aperture(0); // latch holds 0x33 in every lane

    vga.out_u8(0x3CE, 0x00);
    vga.out_u8(0x3CF, 0x0F); // set/reset all ones
    vga.out_u8(0x3CE, 0x05);
    vga.out_u8(0x3CF, 0x03); // write mode 3
    // only the low nibble of the masked cpu byte picks planes, the
    // high bits fall away
    vga.write_aperture(0, 0b1010_0110);
    assert_eq!(0x33, vga.plane_u8(0, 0));
    assert_eq!(0xFF, vga.plane_u8(1, 0));
    assert_eq!(0xFF, vga.plane_u8(2, 0));
    assert_eq!(0x33, vga.plane_u8(3, 0));

    // a selected plane whose set/reset bit is clear is forced to zero,
    // unselected planes are refilled from the latch
    vga.out_u8(0x3CE, 0x00);
    vga.out_u8(0x3CF, 0x0D); // set/reset without plane 1
    vga.write_aperture(0, 0b0000_0010);
    assert_eq!(0x00, vga.plane_u8(1, 0));
    assert_eq!(0x33, vga.plane_u8(2, 0));
    assert_eq!(0x33, vga.plane_u8(3, 0));
}

#[test]
fn read_mode_0_selects_a_plane() {
    let mut vga = reset_pipeline();
    vga.out_u8(0x3C4, 0x02);
    for plane in 0..4u8 {
        vga.out_u8(0x3C5, 1 << plane);
        vga.write_aperture(0, 0xA0 + plane);
    }

    for plane in 0..4u8 {
        vga.out_u8(0x3CE, 0x04);
        vga.out_u8(0x3CF, plane);
        assert_eq!(0xA0 + plane, vga.read_aperture(0));
    }
}

#[test]
fn read_fills_the_latch() {
    let mut vga = reset_pipeline();
    vga.out_u8(0x3C4, 0x02);
    for plane in 0..4u8 {
        vga.out_u8(0x3C5, 1 << plane);
        vga.write_aperture(8, 0x10 + plane);
    }
    vga.out_u8(0x3C5, 0x0F);
    vga.read_aperture(8);
    assert_eq!(0x1312_1110, vga.latch);
}

#[test]
fn read_mode_1_compares_planes() {
    let mut vga = reset_pipeline();
    vga.out_u8(0x3C4, 0x02);
    vga.out_u8(0x3C5, 0x01);
    vga.write_aperture(0, 0b1111_0000); // plane 0
    vga.out_u8(0x3C5, 0x02);
    vga.write_aperture(0, 0b1100_1100); // plane 1
    vga.out_u8(0x3C5, 0x0F);

    vga.out_u8(0x3CE, 0x05);
    vga.out_u8(0x3CF, 0x08); // read mode 1
    vga.out_u8(0x3CE, 0x02);
    vga.out_u8(0x3CF, 0b0000_0011); // color compare: planes 0 and 1 set
    vga.out_u8(0x3CE, 0x07);
    vga.out_u8(0x3CF, 0b0000_0011); // both planes participate
    // a bit matches where plane0 and plane1 both hold a one
    assert_eq!(0b1100_0000, vga.read_aperture(0));

    // excluding plane 1 from the comparison widens the match
    vga.out_u8(0x3CE, 0x07);
    vga.out_u8(0x3CF, 0b0000_0001);
    assert_eq!(0b1111_0000, vga.read_aperture(0));
}
